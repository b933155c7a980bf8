//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::contact::{Contact, ContactId, NewContact, PhoneNumber};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("stored document could not be decoded: {0}")]
    Decode(String),
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn from_decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }
}

/// Result of a targeted single-document update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Result of a single-document delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// Document store holding contacts, keyed by a store-assigned id.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn find_one(&self, id: ContactId) -> Result<Option<Contact>, RepoError>;

    async fn find_all(&self) -> Result<Vec<Contact>, RepoError>;

    async fn insert_one(&self, contact: NewContact) -> Result<ContactId, RepoError>;

    /// Set the phone number of one contact. An id that matches nothing yields
    /// a zero outcome, not an error.
    async fn update_phone(
        &self,
        id: ContactId,
        phone: &PhoneNumber,
    ) -> Result<UpdateOutcome, RepoError>;

    async fn delete_one(&self, id: ContactId) -> Result<DeleteOutcome, RepoError>;

    async fn health_check(&self) -> Result<(), RepoError>;
}

//! Cache key definitions.

use std::fmt;

use crate::domain::contact::ContactId;

const NAMESPACE: &str = "phonebook";

/// Identifies one cache entry.
///
/// The collection entry and per-contact entries render into disjoint
/// namespaces, so no contact id can ever address the collection entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The serialized list of every contact.
    Collection,
    /// One serialized contact.
    Contact(ContactId),
}

impl CacheKey {
    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            CacheKey::Collection => "collection",
            CacheKey::Contact(_) => "contact",
        }
    }

    /// Keys a write to `id` makes stale.
    pub fn affected_by_write(id: ContactId) -> [CacheKey; 2] {
        [CacheKey::Collection, CacheKey::Contact(id)]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Collection => write!(f, "{NAMESPACE}:contacts:all"),
            CacheKey::Contact(id) => write!(f, "{NAMESPACE}:contact:{id}"),
        }
    }
}

//! The contact entity and its field rules.
//!
//! A `name` is 3 to 20 letters, optionally split into words by single
//! interior spaces. A `phone` is exactly 10 ASCII digits. Both rules are
//! checked here, before anything reaches the store.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{DomainError, FieldViolation};

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 20;
pub const PHONE_DIGITS: usize = 10;

/// Store-assigned identifier of a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(Uuid);

impl ContactId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for ContactId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ContactId {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| DomainError::field("id", "is not a valid contact id"))
    }
}

/// A persisted contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub phone: String,
}

/// A validated phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match phone_violation(raw) {
            Some(reason) => Err(DomainError::field("phone", reason)),
            None => Ok(Self(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A contact that passed validation and has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    name: String,
    phone: PhoneNumber,
}

impl NewContact {
    /// Validate both fields, collecting every violation instead of stopping
    /// at the first one.
    pub fn parse(name: &str, phone: &str) -> Result<Self, DomainError> {
        let violations: Vec<FieldViolation> = [
            name_violation(name).map(|reason| FieldViolation {
                field: "name",
                reason,
            }),
            phone_violation(phone).map(|reason| FieldViolation {
                field: "phone",
                reason,
            }),
        ]
        .into_iter()
        .flatten()
        .collect();

        if !violations.is_empty() {
            return Err(DomainError::validation(violations));
        }

        Ok(Self {
            name: name.to_string(),
            phone: PhoneNumber(phone.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &PhoneNumber {
        &self.phone
    }

    pub fn into_contact(self, id: ContactId) -> Contact {
        Contact {
            id,
            name: self.name,
            phone: self.phone.into_inner(),
        }
    }
}

fn name_violation(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("is required");
    }

    let len = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
        return Some("must be between 3 and 20 characters long");
    }

    // Words of ASCII letters joined by exactly one space.
    let well_formed = name
        .split(' ')
        .all(|word| !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic()));
    if !well_formed {
        return Some("must contain only letters separated by single spaces");
    }

    None
}

fn phone_violation(phone: &str) -> Option<&'static str> {
    if phone.is_empty() {
        return Some("is required");
    }
    if !phone.chars().all(|c| c.is_ascii_digit()) {
        return Some("must contain only digits");
    }
    if phone.len() != PHONE_DIGITS {
        return Some("must be exactly 10 digits long");
    }
    None
}

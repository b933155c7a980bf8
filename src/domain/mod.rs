//! Domain layer types and invariants.

pub mod contact;
pub mod error;

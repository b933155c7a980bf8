//! Application services layer.

pub mod contacts;
pub mod error;
pub mod repos;

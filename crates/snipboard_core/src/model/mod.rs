//! Domain model for research projects and their snippet graphs.
//!
//! # Responsibility
//! - Define the records persisted by the repository layer.
//! - Define insert drafts and the validation rules repositories enforce.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Timestamps are Unix epoch milliseconds assigned by storage.
//! - Geometry values are stored as given; no bounds validation applies.

use thiserror::Error;

pub mod annotation;
pub mod edge;
pub mod geometry;
pub mod node;
pub mod project;
pub mod user;

/// Validation failure for drafts and free-text inputs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("invalid zotero item key `{0}`; expected 8 characters of A-Z or 0-9")]
    InvalidZoteroItemKey(String),
}

pub(crate) fn ensure_not_blank(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Blank { field });
    }
    Ok(())
}

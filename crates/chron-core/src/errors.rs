//! Cross-cutting error types for Chronicle.
//!
//! Parse-level problems inside historical audit data never produce errors (they
//! degrade to empty or pass-through values). `CoreError` covers the places where
//! a caller hands us an explicit value that must be valid, such as a record
//! reference typed on the command line. Transport errors are defined in the
//! crates that talk to the host.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation (shape, format, constraints).
    #[error("Validation error: {0}")]
    Validation(String),
}

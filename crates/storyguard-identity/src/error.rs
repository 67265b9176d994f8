//! Error types for identifier allocation.

use thiserror::Error;

/// Errors that can occur during identifier operations.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The requested prefix failed validation.
    #[error("Invalid prefix: {reason}")]
    InvalidPrefix {
        /// Why the prefix was rejected.
        reason: String,
    },

    /// A candidate identifier failed shape validation.
    #[error("Malformed identifier: {reason}")]
    MalformedIdentifier {
        /// Why the identifier was rejected.
        reason: String,
    },

    /// Every allocation attempt collided.
    #[error("Allocation exhausted after {attempts} colliding attempts")]
    ExhaustedRetries {
        /// How many attempts were made.
        attempts: u32,
    },

    /// The uniqueness oracle could not be reached or timed out.
    ///
    /// Retriable, and deliberately distinct from "not found": a failed
    /// existence check must never be read as "safe to allocate".
    #[error("Uniqueness oracle unavailable: {0}")]
    OracleUnavailable(String),
}

/// Result type for identifier operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

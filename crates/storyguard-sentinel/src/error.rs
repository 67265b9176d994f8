//! Error types for threat monitoring.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during threat monitoring operations.
#[derive(Error, Debug)]
pub enum SentinelError {
    /// No event with the given id exists.
    #[error("No threat event with id {id}")]
    EventNotFound {
        /// The unknown event id.
        id: Uuid,
    },
}

/// Result type for threat monitoring operations.
pub type Result<T> = std::result::Result<T, SentinelError>;

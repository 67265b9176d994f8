//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// The platform lacks a required cryptographic capability.
    #[error("Platform crypto unsupported: {reason}")]
    UnsupportedPlatform {
        /// What the platform is missing.
        reason: String,
    },

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (tampered ciphertext or wrong key).
    #[error("Decryption failed: invalid ciphertext or key")]
    Decryption,

    /// Invalid key length.
    #[error("Invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length.
        expected: usize,
        /// Actual key length.
        actual: usize,
    },

    /// Invalid nonce length.
    #[error("Invalid nonce length: expected {expected}, got {actual}")]
    InvalidNonceLength {
        /// Expected nonce length.
        expected: usize,
        /// Actual nonce length.
        actual: usize,
    },
}

/// Result type for cryptographic operations.
pub type Result<T> = std::result::Result<T, CryptoError>;

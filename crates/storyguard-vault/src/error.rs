//! Error types for key lifecycle and envelope operations.

use thiserror::Error;

/// Errors that can occur in the vault.
#[derive(Error, Debug)]
pub enum VaultError {
    /// The encryption service has not been initialized.
    #[error("Encryption service not initialized")]
    NotInitialized,

    /// The platform lacks the required cryptographic capability.
    #[error("Encryption unsupported on this platform: {reason}")]
    Unsupported {
        /// What the platform is missing.
        reason: String,
    },

    /// Encryption failed.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// The envelope references a key version the store no longer retains.
    #[error("Key version {version} is unavailable")]
    KeyUnavailable {
        /// The missing key version.
        version: u32,
    },

    /// Integrity verification failed during decryption.
    #[error("Decryption failed: authentication error")]
    AuthenticationFailed,

    /// The envelope bytes are malformed.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// Attempted to purge the currently active key version.
    #[error("Cannot purge active key version {version}")]
    ActiveKeyPurge {
        /// The active version that was targeted.
        version: u32,
    },

    /// The requested key version does not exist.
    #[error("Unknown key version {version}")]
    UnknownVersion {
        /// The unknown version.
        version: u32,
    },

    /// An underlying cryptographic error.
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] storyguard_crypto::CryptoError),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

//! Error types for high-level client operations.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during high-level client operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Cryptographic primitive error.
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] storyguard_crypto::CryptoError),

    /// Key lifecycle or envelope error.
    #[error("Vault error: {0}")]
    Vault(#[from] storyguard_vault::VaultError),

    /// Identifier allocation error.
    #[error("Identity error: {0}")]
    Identity(#[from] storyguard_identity::IdentityError),

    /// Threat monitoring error.
    #[error("Sentinel error: {0}")]
    Sentinel(#[from] storyguard_sentinel::SentinelError),
}

/// Result type for high-level client operations.
pub type Result<T> = std::result::Result<T, CoreError>;

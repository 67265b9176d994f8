//! # storyguard-vault
//!
//! Versioned key lifecycle and envelope encryption for Storyguard.
//!
//! This crate provides:
//! - **KeyStore**: versioned key material with rotation, usage accounting,
//!   policy checks, and retired-key retention
//! - **EncryptionService**: authenticated envelope encrypt/decrypt with
//!   readiness probing and dashboard status
//! - **Envelope**: the `key_version || nonce || ciphertext` wire format
//!
//! ## Lifecycle
//!
//! Key material is created lazily on first use. Rotation retires the
//! active version and installs its successor; retired versions keep
//! decrypting old envelopes until they are explicitly purged. Callers
//! only ever hold immutable `Arc` snapshots of key records.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod envelope;
pub mod error;
pub mod material;
pub mod service;
pub mod store;

pub use envelope::{Envelope, MAX_ENVELOPE_SIZE};
pub use error::{Result, VaultError};
pub use material::{KeyMaterial, KeyStatus, RotationRecord, RotationTrigger};
pub use service::{EncryptionService, EncryptionStatus, Readiness, SecurityLevel};
pub use store::{
    KeyPolicy, KeyRotationStats, KeyStore, PolicyBreach, DEFAULT_MAX_KEY_AGE_DAYS,
    DEFAULT_MAX_KEY_USAGE_COUNT,
};

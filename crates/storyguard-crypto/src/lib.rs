//! # storyguard-crypto
//!
//! Authenticated symmetric encryption primitives for Storyguard.
//!
//! This crate provides:
//! - **SealingKey**: 256-bit XChaCha20-Poly1305 keys, zeroized on drop
//! - **seal / open**: AEAD encryption with random 192-bit nonces
//! - **probe_platform**: runtime check that the platform can do secure
//!   random generation and authenticated encryption at all
//!
//! ## Security
//!
//! All secret data uses `zeroize` for memory cleanup. Key comparison is
//! constant-time via `subtle`. Nonces are randomly generated per call and
//! must never be reused under the same key.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod probe;
pub mod sealing;

pub use error::{CryptoError, Result};
pub use probe::probe_platform;
pub use sealing::{open, seal, Nonce, SealedBytes, SealingKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};

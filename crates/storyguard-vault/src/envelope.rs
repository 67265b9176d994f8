//! Ciphertext envelope format.
//!
//! Every encrypted payload Storyguard persists is wrapped in an
//! [`Envelope`]: the key version it was sealed under, the nonce, and the
//! tagged ciphertext. The version field is what lets old payloads keep
//! decrypting after a rotation.
//!
//! Byte format: `[key_version (4 bytes LE)][nonce (24 bytes)][ciphertext + tag]`

use serde::{Deserialize, Serialize};

use storyguard_crypto::{Nonce, NONCE_SIZE, TAG_SIZE};

use crate::{Result, VaultError};

/// Size of the key-version prefix in the byte encoding.
pub const VERSION_PREFIX_SIZE: usize = 4;

/// Maximum accepted size of an encoded envelope in bytes.
///
/// Sensitive fields in Storyguard are short (names, ids, comment
/// snippets). The limit is checked before any parsing so crafted input
/// cannot force a large allocation.
pub const MAX_ENVELOPE_SIZE: usize = 64 * 1024;

/// An encrypted payload bound to the key version that produced it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// The key version this payload was sealed under.
    pub key_version: u32,
    /// The nonce used for sealing.
    pub nonce: Nonce,
    /// The ciphertext with authentication tag appended.
    pub payload: Vec<u8>,
}

impl Envelope {
    /// Total size of the byte encoding.
    pub fn len(&self) -> usize {
        VERSION_PREFIX_SIZE + NONCE_SIZE + self.payload.len()
    }

    /// Whether the payload is empty (an empty payload still carries a tag).
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Encode to bytes: `key_version || nonce || ciphertext`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        out.extend_from_slice(&self.key_version.to_le_bytes());
        out.extend_from_slice(self.nonce.as_bytes());
        out.extend_from_slice(&self.payload);
        out
    }

    /// Decode from bytes.
    ///
    /// The input size is validated before any field is read.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::MalformedEnvelope` if the input is too short
    /// to hold a version, nonce, and authentication tag, or exceeds
    /// [`MAX_ENVELOPE_SIZE`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_ENVELOPE_SIZE {
            return Err(VaultError::MalformedEnvelope(format!(
                "envelope too large: {} bytes (max {})",
                bytes.len(),
                MAX_ENVELOPE_SIZE
            )));
        }
        if bytes.len() < VERSION_PREFIX_SIZE + NONCE_SIZE + TAG_SIZE {
            return Err(VaultError::MalformedEnvelope(format!(
                "envelope too short: {} bytes",
                bytes.len()
            )));
        }

        let mut version_bytes = [0u8; VERSION_PREFIX_SIZE];
        version_bytes.copy_from_slice(&bytes[..VERSION_PREFIX_SIZE]);
        let key_version = u32::from_le_bytes(version_bytes);

        let nonce = Nonce::from_bytes(&bytes[VERSION_PREFIX_SIZE..VERSION_PREFIX_SIZE + NONCE_SIZE])
            .map_err(|e| VaultError::MalformedEnvelope(e.to_string()))?;
        let payload = bytes[VERSION_PREFIX_SIZE + NONCE_SIZE..].to_vec();

        Ok(Self {
            key_version,
            nonce,
            payload,
        })
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("key_version", &self.key_version)
            .field("nonce", &self.nonce)
            .field("payload_len", &self.payload.len())
            .finish()
    }
}

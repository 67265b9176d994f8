//! XChaCha20-Poly1305 sealing primitives.
//!
//! A "sealed" payload is ciphertext plus its authentication tag, paired
//! with the random nonce it was produced under. Key versioning and byte
//! framing live one layer up, in the vault.
//!
//! ## Security Notes
//!
//! - Keys are zeroized on drop
//! - Nonces are randomly generated using OsRng
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of a sealing key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (192 bits for XChaCha20).
pub const NONCE_SIZE: usize = 24;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key for XChaCha20-Poly1305.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SealingKey {
    bytes: [u8; KEY_SIZE],
}

impl SealingKey {
    /// Generate a new random sealing key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    ///
    /// # Security
    ///
    /// Avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Constant-time equality check against another key.
    pub fn ct_eq(&self, other: &SealingKey) -> bool {
        bool::from(self.bytes.ct_eq(&other.bytes))
    }
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SealingKey([REDACTED])")
    }
}

/// A 192-bit nonce for XChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 24 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce as a byte slice.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// The output of a sealing operation: nonce plus tagged ciphertext.
#[derive(Clone, Debug)]
pub struct SealedBytes {
    /// The nonce used for this sealing.
    pub nonce: Nonce,
    /// The ciphertext with authentication tag appended.
    pub ciphertext: Vec<u8>,
}

/// Seal plaintext using XChaCha20-Poly1305.
///
/// A fresh random nonce is generated on every call, so sealing the same
/// plaintext twice yields different output.
///
/// # Example
///
/// ```
/// use storyguard_crypto::{seal, open, SealingKey};
///
/// let key = SealingKey::generate();
/// let sealed = seal(&key, b"a bedtime story").unwrap();
/// let plaintext = open(&key, &sealed).unwrap();
///
/// assert_eq!(plaintext.as_slice(), b"a bedtime story");
/// ```
pub fn seal(key: &SealingKey, plaintext: &[u8]) -> Result<SealedBytes> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let nonce = Nonce::generate();
    let xnonce = XNonce::from_slice(nonce.as_bytes());

    let ciphertext = cipher
        .encrypt(xnonce, plaintext)
        .map_err(|_| CryptoError::Encryption("XChaCha20-Poly1305 encryption failed".into()))?;

    Ok(SealedBytes { nonce, ciphertext })
}

/// Open sealed bytes using XChaCha20-Poly1305.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if:
/// - The ciphertext has been tampered with
/// - The wrong key is used
pub fn open(key: &SealingKey, sealed: &SealedBytes) -> Result<Vec<u8>> {
    let cipher = XChaCha20Poly1305::new(key.as_bytes().into());
    let xnonce = XNonce::from_slice(sealed.nonce.as_bytes());

    cipher
        .decrypt(xnonce, sealed.ciphertext.as_ref())
        .map_err(|_| CryptoError::Decryption)
}

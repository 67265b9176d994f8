//! Platform capability probing.
//!
//! Storyguard runs on whatever device a family opens the app on. Before
//! any key material is created, the caller should confirm the platform
//! actually provides a secure random source and a working AEAD cipher.
//! A failed probe is reported as an error, never a panic, so the host
//! application can fall back to a clearly-labeled degraded mode.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::sealing::{open, seal, SealingKey};
use crate::{CryptoError, Result};

/// Check that the platform supports the primitives this crate needs.
///
/// Two checks are performed:
/// 1. The OS entropy source yields bytes without error.
/// 2. A throwaway key seals and opens a payload correctly.
///
/// # Errors
///
/// Returns `CryptoError::UnsupportedPlatform` describing the missing
/// capability. Callers should treat this as fatal for encryption and
/// surface it to the user rather than proceeding silently.
pub fn probe_platform() -> Result<()> {
    // Entropy check. try_fill_bytes reports failure instead of aborting.
    let mut sample = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut sample)
        .map_err(|e| CryptoError::UnsupportedPlatform {
            reason: format!("no secure random source: {}", e),
        })?;

    // Cipher self-check with a throwaway key.
    let key = SealingKey::generate();
    let sealed = seal(&key, b"storyguard-probe").map_err(|_| CryptoError::UnsupportedPlatform {
        reason: "AEAD encryption unavailable".to_string(),
    })?;
    let opened = open(&key, &sealed).map_err(|_| CryptoError::UnsupportedPlatform {
        reason: "AEAD decryption self-check failed".to_string(),
    })?;

    if opened != b"storyguard-probe" {
        return Err(CryptoError::UnsupportedPlatform {
            reason: "AEAD self-check produced wrong plaintext".to_string(),
        });
    }

    Ok(())
}

//! The encryption service: envelope encrypt/decrypt over the key store.
//!
//! The service is the only component that touches raw key bytes. It must
//! be initialized once before use; initialization probes the platform and
//! latches the result, so an unsupported device fails every later call
//! fast, without touching the key store.
//!
//! Fallback behavior is deliberately not implemented here. When
//! encryption fails the caller gets an error, and whatever the caller
//! decides (retry, plaintext fallback, abort) happens in the caller's
//! code where it can be paired with a threat event.

use std::sync::{Arc, RwLock};

use serde::Serialize;
use tracing::{debug, warn};

use storyguard_crypto::{open, probe_platform, seal, SealedBytes};

use crate::envelope::Envelope;
use crate::material::{RotationRecord, RotationTrigger};
use crate::store::{KeyPolicy, KeyRotationStats, KeyStore, PolicyBreach};
use crate::{Result, VaultError};

/// Outcome of service initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Readiness {
    /// The platform supports everything the service needs.
    Ready,
    /// The platform lacks a required primitive. Encryption is
    /// permanently unavailable for this process.
    Unsupported,
}

/// Coarse strength indication shown on the admin dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SecurityLevel {
    /// Not initialized or platform unsupported.
    Basic,
    /// Operational, but the rotation policy is currently breached.
    Standard,
    /// Operational with a healthy rotation posture.
    High,
}

/// Point-in-time service status.
#[derive(Clone, Debug, Serialize)]
pub struct EncryptionStatus {
    /// Whether `initialize` has completed successfully.
    pub initialized: bool,
    /// Whether the platform passed the capability probe. `true` until a
    /// probe actually fails.
    pub platform_support: bool,
    /// Current strength level.
    pub security_level: SecurityLevel,
}

enum ServiceState {
    Uninitialized,
    Ready,
    Unsupported(String),
}

/// Authenticated envelope encryption bound to the versioned key store.
pub struct EncryptionService {
    store: Arc<KeyStore>,
    policy: KeyPolicy,
    state: RwLock<ServiceState>,
}

impl EncryptionService {
    /// Create a service over the given store and rotation policy.
    ///
    /// The service starts uninitialized; call
    /// [`EncryptionService::initialize`] before encrypting.
    pub fn new(store: Arc<KeyStore>, policy: KeyPolicy) -> Self {
        Self {
            store,
            policy,
            state: RwLock::new(ServiceState::Uninitialized),
        }
    }

    /// Probe the platform and latch readiness. Idempotent: once the
    /// probe has run, later calls return the latched outcome.
    pub fn initialize(&self) -> Readiness {
        {
            let state = self.state.read().expect("service state lock poisoned");
            match *state {
                ServiceState::Ready => return Readiness::Ready,
                ServiceState::Unsupported(_) => return Readiness::Unsupported,
                ServiceState::Uninitialized => {}
            }
        }

        let mut state = self.state.write().expect("service state lock poisoned");
        // A racing caller may have finished the probe already.
        match *state {
            ServiceState::Ready => return Readiness::Ready,
            ServiceState::Unsupported(_) => return Readiness::Unsupported,
            ServiceState::Uninitialized => {}
        }

        match probe_platform() {
            Ok(()) => {
                debug!("encryption service ready");
                *state = ServiceState::Ready;
                Readiness::Ready
            }
            Err(e) => {
                warn!(error = %e, "platform cannot support encryption");
                *state = ServiceState::Unsupported(e.to_string());
                Readiness::Unsupported
            }
        }
    }

    fn require_ready(&self) -> Result<()> {
        match *self.state.read().expect("service state lock poisoned") {
            ServiceState::Ready => Ok(()),
            ServiceState::Uninitialized => Err(VaultError::NotInitialized),
            ServiceState::Unsupported(ref reason) => Err(VaultError::Unsupported {
                reason: reason.clone(),
            }),
        }
    }

    /// Encrypt a payload under the active key.
    ///
    /// A fresh random nonce is generated per call. The active key is
    /// captured as a snapshot before sealing, so a concurrent rotation
    /// either misses this call entirely or this call completes on the
    /// old version; key bytes from two versions never mix.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` / `Unsupported` before any key store access
    /// - `EncryptionFailed` if the cipher rejects the operation
    pub fn encrypt(&self, plaintext: &str) -> Result<Envelope> {
        self.require_ready()?;

        if let Some(breach) = self.store.check_policy(&self.policy) {
            warn!(?breach, "encrypting under a key whose rotation is due");
        }

        let key = self.store.active_key();
        let SealedBytes { nonce, ciphertext } = seal(key.secret(), plaintext.as_bytes())
            .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;
        key.mark_used();

        Ok(Envelope {
            key_version: key.version(),
            nonce,
            payload: ciphertext,
        })
    }

    /// Decrypt an envelope, resolving its key version through the store.
    ///
    /// # Errors
    ///
    /// - `KeyUnavailable` if the version was purged or never existed
    /// - `AuthenticationFailed` on tag mismatch or non-UTF-8 plaintext
    pub fn decrypt(&self, envelope: &Envelope) -> Result<String> {
        self.require_ready()?;

        let key = self
            .store
            .key_by_version(envelope.key_version)
            .ok_or(VaultError::KeyUnavailable {
                version: envelope.key_version,
            })?;

        let sealed = SealedBytes {
            nonce: envelope.nonce.clone(),
            ciphertext: envelope.payload.clone(),
        };
        let plaintext_bytes =
            open(key.secret(), &sealed).map_err(|_| VaultError::AuthenticationFailed)?;
        key.mark_used();

        String::from_utf8(plaintext_bytes).map_err(|_| VaultError::AuthenticationFailed)
    }

    /// Check the rotation policy without encrypting.
    pub fn policy_breach(&self) -> Option<PolicyBreach> {
        self.store.check_policy(&self.policy)
    }

    /// Rotate the underlying key store.
    pub fn rotate(&self, trigger: RotationTrigger, reason: &str) -> RotationRecord {
        self.store.rotate(trigger, reason)
    }

    /// Rotation statistics from the underlying store.
    pub fn rotation_stats(&self) -> KeyRotationStats {
        self.store.rotation_stats()
    }

    /// Current service status for the dashboard.
    pub fn status(&self) -> EncryptionStatus {
        let (initialized, supported) =
            match *self.state.read().expect("service state lock poisoned") {
                ServiceState::Ready => (true, true),
                ServiceState::Uninitialized => (false, true),
                ServiceState::Unsupported(_) => (false, false),
            };

        let security_level = if !initialized {
            SecurityLevel::Basic
        } else if self.store.check_policy(&self.policy).is_some() {
            SecurityLevel::Standard
        } else {
            SecurityLevel::High
        };

        EncryptionStatus {
            initialized,
            platform_support: supported,
            security_level,
        }
    }
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ready_service() -> EncryptionService {
        let service = EncryptionService::new(Arc::new(KeyStore::new()), KeyPolicy::default());
        assert_eq!(service.initialize(), Readiness::Ready);
        service
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let service = ready_service();

        let envelope = service.encrypt("Es war einmal... \u{1F4D6}").unwrap();
        let plaintext = service.decrypt(&envelope).unwrap();

        assert_eq!(plaintext, "Es war einmal... \u{1F4D6}");
    }

    #[test]
    fn test_encrypt_before_initialize_fails() {
        let service = EncryptionService::new(Arc::new(KeyStore::new()), KeyPolicy::default());
        let result = service.encrypt("too early");
        assert!(matches!(result, Err(VaultError::NotInitialized)));
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let service = ready_service();
        assert_eq!(service.initialize(), Readiness::Ready);
        assert_eq!(service.initialize(), Readiness::Ready);
    }

    #[test]
    fn test_unsupported_platform_fails_fast_without_key_access() {
        let store = Arc::new(KeyStore::new());
        let service = EncryptionService::new(store.clone(), KeyPolicy::default());
        *service.state.write().expect("service state lock poisoned") =
            ServiceState::Unsupported("no secure random source".into());

        assert_eq!(service.initialize(), Readiness::Unsupported);

        let result = service.encrypt("never encrypted");
        assert!(matches!(result, Err(VaultError::Unsupported { .. })));

        // The failed path created no key material.
        assert!(store.key_by_version(1).is_none());

        let status = service.status();
        assert!(!status.initialized);
        assert!(!status.platform_support);
        assert_eq!(status.security_level, SecurityLevel::Basic);
    }

    #[test]
    fn test_nonces_are_unique_across_many_encrypts() {
        let service = ready_service();

        let mut nonces = HashSet::new();
        for _ in 0..1000 {
            let envelope = service.encrypt("same plaintext").unwrap();
            assert_eq!(envelope.key_version, 1);
            assert!(
                nonces.insert(envelope.nonce.clone()),
                "nonce reused under one key version"
            );
        }
        assert_eq!(nonces.len(), 1000);
    }

    #[test]
    fn test_old_envelopes_decrypt_after_rotation() {
        let service = ready_service();

        let before = service.encrypt("written before rotation").unwrap();
        assert_eq!(before.key_version, 1);

        service.rotate(RotationTrigger::Manual, "test rotation");

        let after = service.encrypt("written after rotation").unwrap();
        assert_eq!(after.key_version, 2);

        assert_eq!(service.decrypt(&before).unwrap(), "written before rotation");
        assert_eq!(service.decrypt(&after).unwrap(), "written after rotation");
    }

    #[test]
    fn test_decrypt_purged_version_is_key_unavailable() {
        let store = Arc::new(KeyStore::new());
        let service = EncryptionService::new(store.clone(), KeyPolicy::default());
        service.initialize();

        let envelope = service.encrypt("soon unreachable").unwrap();
        service.rotate(RotationTrigger::Manual, "test");
        store.purge_retired(1).unwrap();

        let result = service.decrypt(&envelope);
        assert!(matches!(
            result,
            Err(VaultError::KeyUnavailable { version: 1 })
        ));
    }

    #[test]
    fn test_tampered_envelope_fails_authentication() {
        let service = ready_service();

        let mut envelope = service.encrypt("integrity matters").unwrap();
        envelope.payload[0] ^= 0xFF;

        let result = service.decrypt(&envelope);
        assert!(matches!(result, Err(VaultError::AuthenticationFailed)));
    }

    #[test]
    fn test_usage_counted_for_encrypt_and_decrypt() {
        let store = Arc::new(KeyStore::new());
        let service = EncryptionService::new(store.clone(), KeyPolicy::default());
        service.initialize();

        let envelope = service.encrypt("count me").unwrap();
        service.decrypt(&envelope).unwrap();

        assert_eq!(store.active_key().usage_count(), 2);
    }

    #[test]
    fn test_status_levels() {
        let service = EncryptionService::new(Arc::new(KeyStore::new()), KeyPolicy::default());

        let status = service.status();
        assert!(!status.initialized);
        assert_eq!(status.security_level, SecurityLevel::Basic);

        service.initialize();
        let status = service.status();
        assert!(status.initialized);
        assert!(status.platform_support);
        assert_eq!(status.security_level, SecurityLevel::High);
    }

    #[test]
    fn test_status_drops_to_standard_on_policy_breach() {
        let store = Arc::new(KeyStore::new());
        let policy = KeyPolicy {
            max_key_age_days: 3650,
            max_key_usage_count: 1,
        };
        let service = EncryptionService::new(store, policy);
        service.initialize();

        service.encrypt("one use is the limit").unwrap();
        assert_eq!(service.status().security_level, SecurityLevel::Standard);
        assert!(service.policy_breach().is_some());

        service.rotate(RotationTrigger::PolicyOverdue, "usage limit reached");
        assert_eq!(service.status().security_level, SecurityLevel::High);
    }

    #[test]
    fn test_envelope_bytes_roundtrip_through_service() {
        let service = ready_service();

        let envelope = service.encrypt("over the wire").unwrap();
        let restored = Envelope::from_bytes(&envelope.to_bytes()).unwrap();

        assert_eq!(service.decrypt(&restored).unwrap(), "over the wire");
    }
}

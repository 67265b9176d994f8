//! Versioned key material and rotation records.
//!
//! Each key the vault ever creates is a [`KeyMaterial`] record: an
//! immutable secret plus lifecycle metadata. Callers hold records through
//! `Arc` snapshots handed out by the store, so a rotation can never swap
//! key bytes underneath an in-flight encryption. The only mutable fields
//! are the usage counter and the lifecycle status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use storyguard_crypto::SealingKey;

/// Lifecycle status of a key version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyStatus {
    /// The key used for all new encryption.
    Active,
    /// Still active, but a rotation policy threshold has been crossed.
    /// Non-blocking: encryption continues until the key is rotated.
    RotationDue,
    /// Replaced by a newer version. Kept only to decrypt old envelopes.
    Retired,
}

/// What caused a key rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationTrigger {
    /// Usage count or key age crossed the configured policy threshold.
    PolicyOverdue,
    /// Operator-requested rotation.
    Manual,
    /// Emergency rotation after a suspected compromise.
    Emergency,
}

impl std::fmt::Display for RotationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RotationTrigger::PolicyOverdue => write!(f, "PolicyOverdue"),
            RotationTrigger::Manual => write!(f, "Manual"),
            RotationTrigger::Emergency => write!(f, "Emergency"),
        }
    }
}

/// Record of a completed rotation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotationRecord {
    /// What triggered the rotation.
    pub trigger: RotationTrigger,
    /// Free-form operator or policy reason.
    pub reason: String,
    /// When the rotation happened.
    pub rotated_at: DateTime<Utc>,
    /// The version that was retired.
    pub retired_version: u32,
    /// The version that became active.
    pub new_version: u32,
    /// Usage count of the retired key at retirement.
    pub retired_usage: u64,
}

/// A single versioned symmetric key plus its lifecycle metadata.
///
/// The secret itself is immutable for the lifetime of the record and is
/// zeroized when the last `Arc` drops.
pub struct KeyMaterial {
    version: u32,
    secret: SealingKey,
    created_at: DateTime<Utc>,
    usage_count: AtomicU64,
    status: RwLock<KeyStatus>,
}

impl KeyMaterial {
    /// Generate fresh key material for the given version.
    pub(crate) fn generate(version: u32) -> Self {
        Self {
            version,
            secret: SealingKey::generate(),
            created_at: Utc::now(),
            usage_count: AtomicU64::new(0),
            status: RwLock::new(KeyStatus::Active),
        }
    }

    /// The version number of this key.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// When this key was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// How many encrypt/decrypt operations have used this key.
    pub fn usage_count(&self) -> u64 {
        self.usage_count.load(Ordering::Relaxed)
    }

    /// Current lifecycle status.
    pub fn status(&self) -> KeyStatus {
        *self.status.read().expect("key status lock poisoned")
    }

    /// Age of this key relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    /// The secret key bytes. Crate-internal: only the envelope codec
    /// ever touches raw key material.
    pub(crate) fn secret(&self) -> &SealingKey {
        &self.secret
    }

    /// Record one use of this key. The counter belongs to the record, so
    /// an increment always lands on the version that was actually used,
    /// even if a rotation happens mid-operation.
    pub(crate) fn mark_used(&self) -> u64 {
        self.usage_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn set_status(&self, status: KeyStatus) {
        *self.status.write().expect("key status lock poisoned") = status;
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("version", &self.version)
            .field("secret", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("usage_count", &self.usage_count())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_starts_active_and_unused() {
        let key = KeyMaterial::generate(1);
        assert_eq!(key.version(), 1);
        assert_eq!(key.usage_count(), 0);
        assert_eq!(key.status(), KeyStatus::Active);
    }

    #[test]
    fn test_mark_used_increments() {
        let key = KeyMaterial::generate(1);
        assert_eq!(key.mark_used(), 1);
        assert_eq!(key.mark_used(), 2);
        assert_eq!(key.usage_count(), 2);
    }

    #[test]
    fn test_status_transitions() {
        let key = KeyMaterial::generate(1);
        key.set_status(KeyStatus::RotationDue);
        assert_eq!(key.status(), KeyStatus::RotationDue);
        key.set_status(KeyStatus::Retired);
        assert_eq!(key.status(), KeyStatus::Retired);
    }

    #[test]
    fn test_age_is_nonnegative() {
        let key = KeyMaterial::generate(1);
        assert!(key.age(Utc::now()).num_milliseconds() >= 0);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let key = KeyMaterial::generate(3);
        let debug = format!("{:?}", key);
        assert!(debug.contains("REDACTED"));
        assert!(debug.contains("version: 3"));
    }
}

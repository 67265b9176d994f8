//! The key store: versioned key lifecycle management.
//!
//! The store owns every key version the device has ever created. Exactly
//! one version is active at a time; retired versions are kept so old
//! envelopes keep decrypting, and are purged only when the caller knows
//! no ciphertext references them anymore.
//!
//! Callers never hold a mutable key handle. They get `Arc<KeyMaterial>`
//! snapshots, and rotation swaps the active slot under a write lock, so
//! an encryption that already captured its snapshot finishes on that
//! version while new calls pick up the replacement.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::material::{KeyMaterial, KeyStatus, RotationRecord, RotationTrigger};
use crate::{Result, VaultError};

/// Default maximum key age before rotation is due, in days.
pub const DEFAULT_MAX_KEY_AGE_DAYS: i64 = 90;

/// Default maximum uses of one key version before rotation is due.
pub const DEFAULT_MAX_KEY_USAGE_COUNT: u64 = 100_000;

/// Rotation-due policy thresholds.
///
/// Crossing either threshold marks the active key [`KeyStatus::RotationDue`].
/// This never blocks encryption; it is a signal the application surfaces
/// until an operator (or scheduled job) rotates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct KeyPolicy {
    /// Maximum key age in days.
    pub max_key_age_days: i64,
    /// Maximum number of uses of a single key version.
    pub max_key_usage_count: u64,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            max_key_age_days: DEFAULT_MAX_KEY_AGE_DAYS,
            max_key_usage_count: DEFAULT_MAX_KEY_USAGE_COUNT,
        }
    }
}

/// Which policy threshold the active key has crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyBreach {
    /// The key is older than the policy allows.
    AgeExceeded {
        /// Current key age in days.
        age_days: i64,
        /// Configured maximum in days.
        max_days: i64,
    },
    /// The key has been used more times than the policy allows.
    UsageExceeded {
        /// Current usage count.
        used: u64,
        /// Configured maximum.
        max: u64,
    },
}

/// Point-in-time rotation statistics for the dashboard.
#[derive(Clone, Debug, Serialize)]
pub struct KeyRotationStats {
    /// The currently active key version.
    pub current_version: u32,
    /// Lifecycle status of the active key.
    pub active_status: KeyStatus,
    /// Usage count of the active key.
    pub active_usage: u64,
    /// When the active key was created.
    pub active_created_at: DateTime<Utc>,
    /// Retired versions still retained for decryption.
    pub retired_versions: Vec<u32>,
    /// Total rotations performed since startup.
    pub total_rotations: usize,
    /// The most recent rotation, if any.
    pub last_rotation: Option<RotationRecord>,
}

struct StoreInner {
    active: Option<Arc<KeyMaterial>>,
    retired: HashMap<u32, Arc<KeyMaterial>>,
    history: Vec<RotationRecord>,
}

/// Owner of all versioned key material.
pub struct KeyStore {
    inner: RwLock<StoreInner>,
}

impl KeyStore {
    /// Create an empty key store. No key material exists until the first
    /// call to [`KeyStore::active_key`] or [`KeyStore::rotate`].
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                active: None,
                retired: HashMap::new(),
                history: Vec::new(),
            }),
        }
    }

    /// Get the active key, creating version 1 on first use.
    pub fn active_key(&self) -> Arc<KeyMaterial> {
        if let Some(key) = self
            .inner
            .read()
            .expect("key store lock poisoned")
            .active
            .clone()
        {
            return key;
        }

        let mut inner = self.inner.write().expect("key store lock poisoned");
        // Another caller may have initialized between the read and write lock.
        if let Some(key) = inner.active.clone() {
            return key;
        }

        info!("initializing key store with version 1");
        let key = Arc::new(KeyMaterial::generate(1));
        inner.active = Some(key.clone());
        key
    }

    /// Look up a key by version, active or retired.
    pub fn key_by_version(&self, version: u32) -> Option<Arc<KeyMaterial>> {
        let inner = self.inner.read().expect("key store lock poisoned");
        if let Some(active) = &inner.active {
            if active.version() == version {
                return Some(active.clone());
            }
        }
        inner.retired.get(&version).cloned()
    }

    /// Retire the active key and install its successor.
    ///
    /// If no key exists yet, version 1 is created first and immediately
    /// retired so every rotation produces a record with a real
    /// predecessor. In-flight encryptions that captured the old snapshot
    /// complete against it; the retired version stays available for
    /// decryption until purged.
    pub fn rotate(&self, trigger: RotationTrigger, reason: &str) -> RotationRecord {
        let mut inner = self.inner.write().expect("key store lock poisoned");

        let outgoing = inner
            .active
            .take()
            .unwrap_or_else(|| Arc::new(KeyMaterial::generate(1)));
        outgoing.set_status(KeyStatus::Retired);

        let new_version = outgoing.version() + 1;
        let incoming = Arc::new(KeyMaterial::generate(new_version));

        let record = RotationRecord {
            trigger,
            reason: reason.to_string(),
            rotated_at: Utc::now(),
            retired_version: outgoing.version(),
            new_version,
            retired_usage: outgoing.usage_count(),
        };

        info!(
            trigger = %trigger,
            retired = record.retired_version,
            new = record.new_version,
            "rotated encryption key"
        );

        inner.retired.insert(outgoing.version(), outgoing);
        inner.active = Some(incoming);
        inner.history.push(record.clone());

        record
    }

    /// Record one use of the given key version.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::UnknownVersion` if no such version is retained.
    pub fn mark_usage(&self, version: u32) -> Result<u64> {
        let key = self
            .key_by_version(version)
            .ok_or(VaultError::UnknownVersion { version })?;
        Ok(key.mark_used())
    }

    /// Check the active key against the rotation policy.
    ///
    /// When a threshold is crossed the active key is marked
    /// [`KeyStatus::RotationDue`] and the breach is returned. The breach
    /// keeps being reported on every check until the key is rotated.
    pub fn check_policy(&self, policy: &KeyPolicy) -> Option<PolicyBreach> {
        let active = self.inner.read().expect("key store lock poisoned").active.clone()?;

        let age_days = active.age(Utc::now()).num_days();
        let used = active.usage_count();

        let breach = if age_days >= policy.max_key_age_days {
            Some(PolicyBreach::AgeExceeded {
                age_days,
                max_days: policy.max_key_age_days,
            })
        } else if used >= policy.max_key_usage_count {
            Some(PolicyBreach::UsageExceeded {
                used,
                max: policy.max_key_usage_count,
            })
        } else {
            None
        };

        if breach.is_some() && active.status() == KeyStatus::Active {
            debug!(version = active.version(), "key rotation is due");
            active.set_status(KeyStatus::RotationDue);
        }

        breach
    }

    /// Drop a retired key version.
    ///
    /// Envelopes sealed under a purged version become permanently
    /// undecryptable, so callers purge only once they know no persisted
    /// ciphertext still references the version.
    ///
    /// # Errors
    ///
    /// Returns `ActiveKeyPurge` for the active version and
    /// `UnknownVersion` for versions the store does not retain.
    pub fn purge_retired(&self, version: u32) -> Result<()> {
        let mut inner = self.inner.write().expect("key store lock poisoned");

        if let Some(active) = &inner.active {
            if active.version() == version {
                return Err(VaultError::ActiveKeyPurge { version });
            }
        }

        if inner.retired.remove(&version).is_none() {
            return Err(VaultError::UnknownVersion { version });
        }

        info!(version, "purged retired key version");
        Ok(())
    }

    /// Rotation statistics for the admin dashboard.
    ///
    /// Initializes the store on first call, the same as
    /// [`KeyStore::active_key`].
    pub fn rotation_stats(&self) -> KeyRotationStats {
        let active = self.active_key();
        let inner = self.inner.read().expect("key store lock poisoned");

        let mut retired_versions: Vec<u32> = inner.retired.keys().copied().collect();
        retired_versions.sort_unstable();

        KeyRotationStats {
            current_version: active.version(),
            active_status: active.status(),
            active_usage: active.usage_count(),
            active_created_at: active.created_at(),
            retired_versions,
            total_rotations: inner.history.len(),
            last_rotation: inner.history.last().cloned(),
        }
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("key store lock poisoned");
        f.debug_struct("KeyStore")
            .field("active_version", &inner.active.as_ref().map(|k| k.version()))
            .field("retired_count", &inner.retired.len())
            .field("rotations", &inner.history.len())
            .finish()
    }
}

//! Main Storyguard security client.
//!
//! The [`SecurityClient`] is the single entry point the application uses
//! for identity, encryption, and threat monitoring. It wires the three
//! components together and enforces the one rule none of them can
//! enforce alone: every anomaly, fallback, and policy breach lands in
//! the threat monitor, so nothing degrades silently.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storyguard_core::{SecurityClient, SecurityConfig};
//! use storyguard_identity::InMemoryOracle;
//!
//! let client = SecurityClient::new(SecurityConfig::default(), Arc::new(InMemoryOracle::new()))?;
//! client.initialize().await;
//!
//! let identity = client.generate_complete_personal_id("KIDS").await?;
//! let envelope = client.encrypt_sensitive("a comment by a young reader").await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use storyguard_identity::{
    DenylistFn, IdentityAllocator, IdentityError, PersonalId, UniquenessOracle, ValidPrefix,
    VerifyOutcome,
};
use storyguard_sentinel::{
    AuditSink, ResolveOutcome, SecurityPosture, Severity, ThreatAnalytics, ThreatEvent,
    ThreatKind, ThreatMonitor,
};
use storyguard_vault::{
    EncryptionService, EncryptionStatus, Envelope, KeyRotationStats, KeyStore, Readiness,
    RotationRecord, RotationTrigger, VaultError,
};

use crate::config::SecurityConfig;
use crate::error::Result;

/// A freshly allocated identifier together with its sealed form.
///
/// The sealed envelope is what the caller persists on-device; the plain
/// identifier is what the user sees and re-enters on another device.
#[derive(Clone, Debug)]
pub struct AllocatedIdentity {
    /// The allocated personal identifier.
    pub id: PersonalId,
    /// The identifier sealed under the active key.
    pub sealed: Envelope,
}

/// Outcome of an encryption attempt that is allowed to fall back.
///
/// The plaintext variant exists for callers that must not lose user
/// data even on a broken device. Taking it is always recorded as a
/// critical threat event, which is the audit contract that keeps the
/// fallback observable.
#[derive(Clone, Debug)]
pub enum FallbackOutcome {
    /// Encryption succeeded.
    Encrypted(Envelope),
    /// Encryption failed; the caller received its plaintext back and a
    /// critical `encryption_failure` event was recorded.
    Plaintext(String),
}

/// High-level security client for the Storyguard application.
///
/// Thread-safe; share it behind an `Arc` and call from any task.
pub struct SecurityClient {
    encryption: EncryptionService,
    store: Arc<KeyStore>,
    allocator: IdentityAllocator,
    monitor: ThreatMonitor,
    sink: Option<Arc<dyn AuditSink>>,
    reported_unsupported: AtomicBool,
}

impl SecurityClient {
    /// Create a client from a configuration and a uniqueness oracle.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails validation.
    pub fn new(config: SecurityConfig, oracle: Arc<dyn UniquenessOracle>) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(KeyStore::new());
        let encryption = EncryptionService::new(store.clone(), config.key_policy());
        let allocator = IdentityAllocator::new(oracle, config.allocator_config());
        let monitor = ThreatMonitor::with_config(config.monitor_config());

        debug!("created security client");

        Ok(Self {
            encryption,
            store,
            allocator,
            monitor,
            sink: None,
            reported_unsupported: AtomicBool::new(false),
        })
    }

    /// Attach a content-policy predicate for prefix validation.
    pub fn with_denylist(mut self, denylist: DenylistFn) -> Self {
        self.allocator = self.allocator.with_denylist(denylist);
        self
    }

    /// Attach a durable audit sink. Every recorded threat event is
    /// mirrored to it; sink failures are logged, never fatal.
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Initialize the encryption service.
    ///
    /// On an unsupported platform this records a critical threat event
    /// once; the application should show its "enhanced security
    /// unavailable" state and only proceed if it explicitly opts into a
    /// degraded mode.
    pub async fn initialize(&self) -> Readiness {
        let readiness = self.encryption.initialize();
        if readiness == Readiness::Unsupported
            && !self.reported_unsupported.swap(true, Ordering::SeqCst)
        {
            self.report(
                ThreatKind::EncryptionFailure,
                Severity::Critical,
                "platform cannot support encryption; enhanced security unavailable".to_string(),
            )
            .await;
        }
        readiness
    }

    // ========================================================================
    // Encryption
    // ========================================================================

    /// Encrypt a sensitive value under the active key.
    ///
    /// Any real encryption failure is recorded as a threat event before
    /// the error is returned. Calling before `initialize` is a caller
    /// bug and is returned as an error without an event.
    pub async fn encrypt_sensitive(&self, plaintext: &str) -> Result<Envelope> {
        match self.encryption.encrypt(plaintext) {
            Ok(envelope) => {
                self.observe_rotation_policy().await;
                Ok(envelope)
            }
            Err(e) => {
                if !matches!(e, VaultError::NotInitialized) {
                    self.report(
                        ThreatKind::EncryptionFailure,
                        Severity::High,
                        format!("encryption failed: {}", e),
                    )
                    .await;
                }
                Err(e.into())
            }
        }
    }

    /// Encrypt, falling back to plaintext if the device cannot encrypt.
    ///
    /// The fallback is never silent: taking it records a critical
    /// `encryption_failure` event.
    pub async fn encrypt_sensitive_with_fallback(&self, plaintext: &str) -> FallbackOutcome {
        match self.encryption.encrypt(plaintext) {
            Ok(envelope) => {
                self.observe_rotation_policy().await;
                FallbackOutcome::Encrypted(envelope)
            }
            Err(e) => {
                self.report(
                    ThreatKind::EncryptionFailure,
                    Severity::Critical,
                    format!("falling back to plaintext storage: {}", e),
                )
                .await;
                FallbackOutcome::Plaintext(plaintext.to_string())
            }
        }
    }

    /// Seal a personal identifier for at-rest protection.
    pub async fn encrypt_personal_id(&self, id: &PersonalId) -> Result<Envelope> {
        self.encrypt_sensitive(id.as_str()).await
    }

    /// Decrypt a stored envelope.
    ///
    /// A payload under a purged key and a payload failing integrity
    /// verification are both recorded as threat events; neither is
    /// silently dropped.
    pub async fn decrypt_sensitive(&self, envelope: &Envelope) -> Result<String> {
        match self.encryption.decrypt(envelope) {
            Ok(plaintext) => Ok(plaintext),
            Err(e @ VaultError::KeyUnavailable { .. }) => {
                self.report(
                    ThreatKind::KeyUnavailable,
                    Severity::High,
                    format!("stored payload is unrecoverable: {}", e),
                )
                .await;
                Err(e.into())
            }
            Err(e @ VaultError::AuthenticationFailed) => {
                self.report(
                    ThreatKind::SuspiciousInput,
                    Severity::High,
                    "stored payload failed integrity verification".to_string(),
                )
                .await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Current encryption service status.
    pub fn encryption_status(&self) -> EncryptionStatus {
        self.encryption.status()
    }

    /// Current key rotation statistics.
    pub fn key_rotation_stats(&self) -> KeyRotationStats {
        self.store.rotation_stats()
    }

    /// Drop a retired key version.
    ///
    /// Only valid once no persisted ciphertext references the version;
    /// envelopes sealed under it become permanently unrecoverable.
    pub fn purge_retired_key(&self, version: u32) -> Result<()> {
        Ok(self.store.purge_retired(version)?)
    }

    /// Record a manual-rotation event, then rotate the key.
    ///
    /// This is the operator's break-glass path from the admin dashboard.
    pub async fn trigger_emergency_rotation(&self, reason: &str) -> RotationRecord {
        self.report(
            ThreatKind::RotationManual,
            Severity::Medium,
            format!("emergency rotation requested: {}", reason),
        )
        .await;
        self.encryption.rotate(RotationTrigger::Emergency, reason)
    }

    // ========================================================================
    // Identity
    // ========================================================================

    /// Validate a user-chosen prefix without allocating.
    pub fn validate_prefix(&self, raw: &str) -> Result<ValidPrefix> {
        Ok(self.allocator.validate_prefix(raw)?)
    }

    /// Allocate a new identifier and seal it for at-rest storage.
    ///
    /// Oracle failures and exhaustion are recorded as threat events.
    /// On a sealing failure the reservation stands (reservations are
    /// permanent) and the error is surfaced for the caller to retry.
    pub async fn generate_complete_personal_id(&self, prefix: &str) -> Result<AllocatedIdentity> {
        let id = match self.allocator.allocate(prefix).await {
            Ok(id) => id,
            Err(e) => {
                match &e {
                    IdentityError::OracleUnavailable(msg) => {
                        self.report(
                            ThreatKind::OracleFailure,
                            Severity::High,
                            format!("identifier allocation failed: {}", msg),
                        )
                        .await;
                    }
                    IdentityError::ExhaustedRetries { attempts } => {
                        self.report(
                            ThreatKind::SuspiciousInput,
                            Severity::Medium,
                            format!("identifier space exhausted after {} attempts", attempts),
                        )
                        .await;
                    }
                    _ => {}
                }
                return Err(e.into());
            }
        };

        let sealed = match self.encryption.encrypt(id.as_str()) {
            Ok(envelope) => envelope,
            Err(e) => {
                if !matches!(e, VaultError::NotInitialized) {
                    self.report(
                        ThreatKind::EncryptionFailure,
                        Severity::High,
                        format!("failed to seal allocated identifier: {}", e),
                    )
                    .await;
                }
                return Err(e.into());
            }
        };

        Ok(AllocatedIdentity { id, sealed })
    }

    /// Check whether a claimed identifier exists.
    ///
    /// Malformed probes are recorded as suspicious input; oracle
    /// failures are recorded and surfaced as retriable errors, distinct
    /// from "not found".
    pub async fn check_personal_id_exists(&self, candidate: &str) -> Result<VerifyOutcome> {
        match self.allocator.verify(candidate).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                match &e {
                    IdentityError::MalformedIdentifier { reason } => {
                        self.report(
                            ThreatKind::SuspiciousInput,
                            Severity::Low,
                            format!("malformed identifier probe: {}", reason),
                        )
                        .await;
                    }
                    IdentityError::OracleUnavailable(msg) => {
                        self.report(
                            ThreatKind::OracleFailure,
                            Severity::High,
                            format!("identifier verification failed: {}", msg),
                        )
                        .await;
                    }
                    _ => {}
                }
                Err(e.into())
            }
        }
    }

    // ========================================================================
    // Threat monitoring
    // ========================================================================

    /// Current security posture for the dashboard.
    pub fn security_status(&self) -> SecurityPosture {
        self.monitor.posture()
    }

    /// Aggregated threat analytics for the dashboard.
    pub fn threat_analytics(&self) -> ThreatAnalytics {
        self.monitor.analytics()
    }

    /// Snapshot of the threat event log.
    pub fn threat_events(&self) -> Vec<ThreatEvent> {
        self.monitor.events()
    }

    /// Resolve a threat event by id.
    pub fn resolve_threat(&self, id: Uuid, note: &str) -> Result<ResolveOutcome> {
        Ok(self.monitor.resolve(id, note)?)
    }

    /// Record an application-detected threat.
    ///
    /// Surrounding code uses this to honor the audit contract, e.g.
    /// when it falls back to plaintext through its own path.
    pub async fn report_threat(
        &self,
        kind: ThreatKind,
        severity: Severity,
        description: &str,
    ) -> ThreatEvent {
        self.report(kind, severity, description.to_string()).await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Record an event and mirror it to the audit sink, if attached.
    async fn report(&self, kind: ThreatKind, severity: Severity, description: String) -> ThreatEvent {
        let event = self.monitor.record(kind, severity, description);
        if let Some(sink) = &self.sink {
            if let Err(e) = sink.append(&event).await {
                warn!(error = %e, id = %event.id, "audit sink append failed");
            }
        }
        event
    }

    /// Surface a rotation-policy breach as a medium threat event.
    ///
    /// Recorded once per breach: while an unresolved `rotation_overdue`
    /// event is open no duplicate is added, and after rotation the
    /// breach disappears on its own.
    async fn observe_rotation_policy(&self) {
        if self.encryption.policy_breach().is_some() && !self.has_open(ThreatKind::RotationOverdue)
        {
            self.report(
                ThreatKind::RotationOverdue,
                Severity::Medium,
                "key rotation policy threshold crossed".to_string(),
            )
            .await;
        }
    }

    fn has_open(&self, kind: ThreatKind) -> bool {
        self.monitor
            .events()
            .iter()
            .any(|e| e.kind == kind && !e.resolved)
    }
}

impl std::fmt::Debug for SecurityClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityClient")
            .field("encryption", &self.encryption)
            .field("allocator", &self.allocator)
            .field("monitor", &self.monitor)
            .field("sink", &self.sink.as_ref().map(|_| "[sink]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyguard_identity::InMemoryOracle;

    fn test_client() -> SecurityClient {
        SecurityClient::new(SecurityConfig::default(), Arc::new(InMemoryOracle::new())).unwrap()
    }

    #[tokio::test]
    async fn test_rotation_overdue_reported_once_per_breach() {
        let config = SecurityConfig::builder().with_max_key_usage_count(1).build();
        let client =
            SecurityClient::new(config, Arc::new(InMemoryOracle::new())).unwrap();
        client.initialize().await;

        // First encrypt reaches the usage limit; later encrypts observe
        // the breach but must not duplicate the open event.
        client.encrypt_sensitive("one").await.unwrap();
        client.encrypt_sensitive("two").await.unwrap();
        client.encrypt_sensitive("three").await.unwrap();

        let overdue: Vec<_> = client
            .threat_events()
            .into_iter()
            .filter(|e| e.kind == ThreatKind::RotationOverdue)
            .collect();
        assert_eq!(overdue.len(), 1);
    }

    #[tokio::test]
    async fn test_encrypt_before_initialize_records_no_event() {
        let client = test_client();

        let result = client.encrypt_sensitive("too early").await;
        assert!(result.is_err());
        assert!(client.threat_events().is_empty());
    }
}

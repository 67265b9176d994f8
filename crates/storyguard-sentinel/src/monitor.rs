//! The threat monitor: append-only event log with resolution workflow.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::event::{Severity, ThreatEvent, ThreatKind};
use crate::posture::{compute_posture, SecurityPosture, SeverityWeights};
use crate::{Result, SentinelError};

/// Default retention for resolved events, in days.
pub const DEFAULT_EVENT_RETENTION_DAYS: u32 = 30;

/// Monitor configuration.
#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// How long resolved events are retained before pruning. `None`
    /// keeps them forever. Unresolved events are never pruned, so the
    /// posture can never silently improve.
    pub event_retention_days: Option<u32>,
    /// Per-severity posture deductions.
    pub weights: SeverityWeights,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            event_retention_days: Some(DEFAULT_EVENT_RETENTION_DAYS),
            weights: SeverityWeights::default(),
        }
    }
}

/// Outcome of a resolution attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// The event was open and is now resolved.
    Resolved,
    /// The event was already resolved. Nothing changed; reported so
    /// audit tooling can notice double-resolution attempts.
    AlreadyResolved,
}

/// Aggregated counts over the current event log.
#[derive(Clone, Debug, Serialize)]
pub struct ThreatAnalytics {
    /// Event counts keyed by kind name.
    pub by_kind: HashMap<String, usize>,
    /// Event counts keyed by severity name.
    pub by_severity: HashMap<String, usize>,
    /// Total events in the (retention-bounded) log.
    pub total: usize,
    /// Currently unresolved events.
    pub unresolved: usize,
}

/// Central security event log and posture source.
///
/// All mutation goes through `record` and `resolve`; everything else is
/// a pure read. The log lives behind one `RwLock`, so concurrent
/// resolutions of the same event serialize into one `Resolved` and one
/// `AlreadyResolved`.
pub struct ThreatMonitor {
    events: RwLock<Vec<ThreatEvent>>,
    config: MonitorConfig,
}

impl ThreatMonitor {
    /// Create a monitor with default configuration.
    pub fn new() -> Self {
        Self::with_config(MonitorConfig::default())
    }

    /// Create a monitor with explicit configuration.
    pub fn with_config(config: MonitorConfig) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            config,
        }
    }

    /// Record a new threat event.
    ///
    /// Appends to the log, prunes expired resolved events, and returns a
    /// copy of the stored record for mirroring to an audit sink.
    pub fn record(
        &self,
        kind: ThreatKind,
        severity: Severity,
        description: impl Into<String>,
    ) -> ThreatEvent {
        let event = ThreatEvent::new(kind, severity, description);

        match severity {
            Severity::High | Severity::Critical => {
                warn!(id = %event.id, kind = %kind, severity = %severity, "threat recorded");
            }
            _ => {
                info!(id = %event.id, kind = %kind, severity = %severity, "threat recorded");
            }
        }

        let mut events = self.events.write().expect("event log lock poisoned");
        events.push(event.clone());

        if let Some(days) = self.config.event_retention_days {
            let cutoff = Utc::now() - Duration::days(i64::from(days));
            prune_resolved(&mut events, cutoff);
        }

        event
    }

    /// Resolve an event by id.
    ///
    /// Idempotent in effect: the first call flips the resolved flag and
    /// stores the note, any later call reports
    /// [`ResolveOutcome::AlreadyResolved`] and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SentinelError::EventNotFound` for unknown ids.
    pub fn resolve(&self, id: Uuid, note: &str) -> Result<ResolveOutcome> {
        let mut events = self.events.write().expect("event log lock poisoned");

        let event = events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(SentinelError::EventNotFound { id })?;

        if event.resolved {
            return Ok(ResolveOutcome::AlreadyResolved);
        }

        event.resolved = true;
        event.resolution_note = Some(note.to_string());
        event.resolved_at = Some(Utc::now());
        info!(%id, "threat resolved");

        Ok(ResolveOutcome::Resolved)
    }

    /// Aggregate counts over the current log.
    pub fn analytics(&self) -> ThreatAnalytics {
        let events = self.events.read().expect("event log lock poisoned");

        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut by_severity: HashMap<String, usize> = HashMap::new();
        for event in events.iter() {
            *by_kind.entry(event.kind.to_string()).or_default() += 1;
            *by_severity.entry(event.severity.to_string()).or_default() += 1;
        }

        ThreatAnalytics {
            by_kind,
            by_severity,
            total: events.len(),
            unresolved: events.iter().filter(|e| !e.resolved).count(),
        }
    }

    /// Compute the current security posture.
    pub fn posture(&self) -> SecurityPosture {
        let events = self.events.read().expect("event log lock poisoned");
        compute_posture(&events, &self.config.weights)
    }

    /// Snapshot of the current event log, newest last.
    pub fn events(&self) -> Vec<ThreatEvent> {
        self.events.read().expect("event log lock poisoned").clone()
    }

    /// Drop resolved events recorded before `cutoff`.
    ///
    /// Unresolved events are always kept. Returns how many events were
    /// pruned.
    pub fn prune_resolved_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut events = self.events.write().expect("event log lock poisoned");
        prune_resolved(&mut events, cutoff)
    }
}

impl Default for ThreatMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ThreatMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events = self.events.read().expect("event log lock poisoned");
        f.debug_struct("ThreatMonitor")
            .field("events", &events.len())
            .field("unresolved", &events.iter().filter(|e| !e.resolved).count())
            .finish()
    }
}

fn prune_resolved(events: &mut Vec<ThreatEvent>, cutoff: DateTime<Utc>) -> usize {
    let before = events.len();
    events.retain(|e| !e.resolved || e.timestamp >= cutoff);
    before - events.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posture::OverallStatus;

    #[test]
    fn test_record_appends_unresolved_event() {
        let monitor = ThreatMonitor::new();

        let event = monitor.record(
            ThreatKind::EncryptionFailure,
            Severity::High,
            "seal rejected payload",
        );

        assert!(!event.resolved);
        let log = monitor.events();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, event.id);
        assert_eq!(log[0].description, "seal rejected payload");
    }

    #[test]
    fn test_resolve_then_already_resolved() {
        let monitor = ThreatMonitor::new();
        let event = monitor.record(ThreatKind::RotationOverdue, Severity::Medium, "key old");

        let first = monitor.resolve(event.id, "rotated the key").unwrap();
        assert_eq!(first, ResolveOutcome::Resolved);

        let second = monitor.resolve(event.id, "rotated again?").unwrap();
        assert_eq!(second, ResolveOutcome::AlreadyResolved);

        // The first resolution sticks; the second changed nothing.
        let stored = &monitor.events()[0];
        assert!(stored.resolved);
        assert_eq!(stored.resolution_note.as_deref(), Some("rotated the key"));
    }

    #[test]
    fn test_resolve_unknown_id() {
        let monitor = ThreatMonitor::new();
        let result = monitor.resolve(Uuid::new_v4(), "note");
        assert!(matches!(result, Err(SentinelError::EventNotFound { .. })));
    }

    #[test]
    fn test_concurrent_resolution_single_winner() {
        use std::sync::Arc;
        use std::thread;

        let monitor = Arc::new(ThreatMonitor::new());
        let event = monitor.record(ThreatKind::SuspiciousInput, Severity::Low, "probe");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let monitor = monitor.clone();
            let id = event.id;
            handles.push(thread::spawn(move || monitor.resolve(id, "done").unwrap()));
        }

        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let resolved = outcomes
            .iter()
            .filter(|o| **o == ResolveOutcome::Resolved)
            .count();
        assert_eq!(resolved, 1);
        assert_eq!(outcomes.len() - resolved, 7);
    }

    #[test]
    fn test_analytics_aggregation() {
        let monitor = ThreatMonitor::new();
        monitor.record(ThreatKind::EncryptionFailure, Severity::High, "a");
        monitor.record(ThreatKind::EncryptionFailure, Severity::Low, "b");
        let open = monitor.record(ThreatKind::RotationOverdue, Severity::Medium, "c");
        monitor.resolve(open.id, "rotated").unwrap();

        let analytics = monitor.analytics();
        assert_eq!(analytics.total, 3);
        assert_eq!(analytics.unresolved, 2);
        assert_eq!(analytics.by_kind["encryption_failure"], 2);
        assert_eq!(analytics.by_kind["rotation_overdue"], 1);
        assert_eq!(analytics.by_severity["high"], 1);
        assert_eq!(analytics.by_severity["low"], 1);
        assert_eq!(analytics.by_severity["medium"], 1);
    }

    #[test]
    fn test_resolved_events_still_counted_in_analytics() {
        let monitor = ThreatMonitor::new();
        let event = monitor.record(ThreatKind::SuspiciousInput, Severity::Low, "probe");
        monitor.resolve(event.id, "reviewed").unwrap();

        let analytics = monitor.analytics();
        assert_eq!(analytics.total, 1);
        assert_eq!(analytics.unresolved, 0);
    }

    #[test]
    fn test_critical_event_moves_posture() {
        let monitor = ThreatMonitor::new();
        let baseline = monitor.posture();
        assert_eq!(baseline.score, 100);
        assert_eq!(baseline.overall, OverallStatus::Secure);

        let event = monitor.record(
            ThreatKind::EncryptionFailure,
            Severity::Critical,
            "plaintext fallback detected",
        );

        let degraded = monitor.posture();
        assert!(degraded.score < baseline.score);
        assert_eq!(degraded.overall, OverallStatus::Critical);
        assert_eq!(degraded.active_threats, 1);

        monitor.resolve(event.id, "device replaced").unwrap();
        let restored = monitor.posture();
        assert_eq!(restored.score, 100);
        assert_eq!(restored.overall, OverallStatus::Secure);
    }

    #[test]
    fn test_prune_drops_only_old_resolved_events() {
        let monitor = ThreatMonitor::new();
        let resolved_event = monitor.record(ThreatKind::SuspiciousInput, Severity::Low, "old");
        monitor.resolve(resolved_event.id, "done").unwrap();
        monitor.record(ThreatKind::RotationOverdue, Severity::Medium, "still open");

        // Cutoff in the future: everything resolved is older than it.
        let pruned = monitor.prune_resolved_before(Utc::now() + Duration::seconds(1));

        assert_eq!(pruned, 1);
        let log = monitor.events();
        assert_eq!(log.len(), 1);
        assert!(!log[0].resolved);
    }

    #[test]
    fn test_retention_disabled_keeps_everything() {
        let monitor = ThreatMonitor::with_config(MonitorConfig {
            event_retention_days: None,
            weights: SeverityWeights::default(),
        });
        let event = monitor.record(ThreatKind::SuspiciousInput, Severity::Low, "keep me");
        monitor.resolve(event.id, "done").unwrap();
        monitor.record(ThreatKind::SuspiciousInput, Severity::Low, "trigger record path");

        assert_eq!(monitor.events().len(), 2);
    }
}

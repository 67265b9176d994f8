//! Security posture scoring.
//!
//! The posture is a pure function of the currently unresolved event set:
//! recomputed on demand, never stored. Scoring starts from a perfect 100
//! and subtracts a per-severity weight for each unresolved event.

use serde::{Deserialize, Serialize};

use crate::event::{Severity, ThreatEvent, ThreatKind};

/// Score below which the posture is critical.
pub const CRITICAL_THRESHOLD: u8 = 40;

/// Score below which the posture is warning.
pub const WARNING_THRESHOLD: u8 = 70;

/// Score below which the posture is monitoring.
pub const MONITORING_THRESHOLD: u8 = 95;

/// Per-severity score deductions for unresolved events.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SeverityWeights {
    /// Deduction per unresolved low-severity event.
    pub low: u32,
    /// Deduction per unresolved medium-severity event.
    pub medium: u32,
    /// Deduction per unresolved high-severity event.
    pub high: u32,
    /// Deduction per unresolved critical-severity event.
    pub critical: u32,
}

impl Default for SeverityWeights {
    fn default() -> Self {
        Self {
            low: 1,
            medium: 4,
            high: 10,
            critical: 25,
        }
    }
}

impl SeverityWeights {
    /// The deduction for one event of the given severity.
    pub fn weight(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Low => self.low,
            Severity::Medium => self.medium,
            Severity::High => self.high,
            Severity::Critical => self.critical,
        }
    }
}

/// Overall posture classification shown on the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// No meaningful unresolved threats.
    Secure,
    /// Minor unresolved threats; keep watching.
    Monitoring,
    /// Posture is degraded; operator attention needed.
    Warning,
    /// Severe exposure. Forced by any unresolved critical event.
    Critical,
}

/// Derived point-in-time security summary.
#[derive(Clone, Debug, Serialize)]
pub struct SecurityPosture {
    /// Overall classification.
    pub overall: OverallStatus,
    /// Security score, 0 to 100.
    pub score: u8,
    /// Number of unresolved events.
    pub active_threats: usize,
    /// Suggested operator actions derived from unresolved event kinds.
    pub recommendations: Vec<String>,
}

/// Compute the posture from the full event log.
///
/// Only unresolved events contribute. Any unresolved critical event
/// forces [`OverallStatus::Critical`] regardless of the numeric score.
pub fn compute_posture(events: &[ThreatEvent], weights: &SeverityWeights) -> SecurityPosture {
    let unresolved: Vec<&ThreatEvent> = events.iter().filter(|e| !e.resolved).collect();

    let deduction: u32 = unresolved
        .iter()
        .map(|e| weights.weight(e.severity))
        .sum();
    let score = 100u32.saturating_sub(deduction) as u8;

    let has_critical = unresolved.iter().any(|e| e.severity == Severity::Critical);
    let overall = if has_critical || score < CRITICAL_THRESHOLD {
        OverallStatus::Critical
    } else if score < WARNING_THRESHOLD {
        OverallStatus::Warning
    } else if score < MONITORING_THRESHOLD {
        OverallStatus::Monitoring
    } else {
        OverallStatus::Secure
    };

    SecurityPosture {
        overall,
        score,
        active_threats: unresolved.len(),
        recommendations: recommendations_for(&unresolved),
    }
}

/// Derive operator recommendations from unresolved event kinds.
///
/// One recommendation per distinct kind, in a stable order.
fn recommendations_for(unresolved: &[&ThreatEvent]) -> Vec<String> {
    const ORDER: [ThreatKind; 6] = [
        ThreatKind::RotationOverdue,
        ThreatKind::EncryptionFailure,
        ThreatKind::KeyUnavailable,
        ThreatKind::SuspiciousInput,
        ThreatKind::OracleFailure,
        ThreatKind::RotationManual,
    ];

    ORDER
        .iter()
        .filter(|kind| unresolved.iter().any(|e| e.kind == **kind))
        .map(|kind| recommendation_text(*kind).to_string())
        .collect()
}

fn recommendation_text(kind: ThreatKind) -> &'static str {
    match kind {
        ThreatKind::RotationOverdue => "Rotate the encryption key; the rotation policy is overdue",
        ThreatKind::EncryptionFailure => {
            "Investigate encryption failures and check device crypto support"
        }
        ThreatKind::KeyUnavailable => {
            "Audit key purge history; stored data referenced a purged key"
        }
        ThreatKind::SuspiciousInput => "Review suspicious input events for probing activity",
        ThreatKind::OracleFailure => "Check connectivity to the identifier reservation service",
        ThreatKind::RotationManual => "Confirm the recent manual key rotation was expected",
    }
}

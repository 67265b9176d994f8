//! Threat event records.
//!
//! A threat event is a security-relevant occurrence reported by any
//! component: a failed encryption, an overdue rotation, a malformed
//! identifier probe. Events are append-only audit records. The single
//! permitted mutation is resolution, and resolution is one-way.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category of a threat event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    /// An encryption attempt failed, or a caller fell back to plaintext.
    EncryptionFailure,
    /// The key rotation policy is breached and the key has not rotated.
    RotationOverdue,
    /// An operator triggered a manual or emergency rotation.
    RotationManual,
    /// Malformed or probing input was received.
    SuspiciousInput,
    /// A payload referenced a purged key version.
    KeyUnavailable,
    /// The identifier reservation authority failed or timed out.
    OracleFailure,
}

impl std::fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ThreatKind::EncryptionFailure => "encryption_failure",
            ThreatKind::RotationOverdue => "rotation_overdue",
            ThreatKind::RotationManual => "rotation_manual",
            ThreatKind::SuspiciousInput => "suspicious_input",
            ThreatKind::KeyUnavailable => "key_unavailable",
            ThreatKind::OracleFailure => "oracle_failure",
        };
        write!(f, "{}", name)
    }
}

/// Severity of a threat event, ordered from least to most severe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; no immediate risk.
    Low,
    /// Worth attention; degrades posture slightly.
    Medium,
    /// Significant; needs operator review.
    High,
    /// Immediate action required. Any unresolved critical event forces
    /// the overall posture to critical.
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// One recorded security-relevant occurrence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ThreatEvent {
    /// Unique event id.
    pub id: Uuid,
    /// Event category.
    pub kind: ThreatKind,
    /// Severity at detection time.
    pub severity: Severity,
    /// When the event was detected.
    pub timestamp: DateTime<Utc>,
    /// Human-readable description for the dashboard.
    pub description: String,
    /// Whether an operator has resolved this event.
    pub resolved: bool,
    /// Operator note recorded at resolution.
    pub resolution_note: Option<String>,
    /// When the event was resolved.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ThreatEvent {
    /// Create a new unresolved event with a fresh id.
    pub(crate) fn new(kind: ThreatKind, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            severity,
            timestamp: Utc::now(),
            description: description.into(),
            resolved: false,
            resolution_note: None,
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_event_is_unresolved() {
        let event = ThreatEvent::new(ThreatKind::EncryptionFailure, Severity::High, "seal failed");
        assert!(!event.resolved);
        assert!(event.resolution_note.is_none());
        assert!(event.resolved_at.is_none());
        assert_eq!(event.kind, ThreatKind::EncryptionFailure);
        assert_eq!(event.severity, Severity::High);
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = ThreatEvent::new(ThreatKind::SuspiciousInput, Severity::Low, "a");
        let b = ThreatEvent::new(ThreatKind::SuspiciousInput, Severity::Low, "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }

    #[test]
    fn test_kind_display_names() {
        assert_eq!(ThreatKind::RotationOverdue.to_string(), "rotation_overdue");
        assert_eq!(
            ThreatKind::EncryptionFailure.to_string(),
            "encryption_failure"
        );
    }
}

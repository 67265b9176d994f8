//! # storyguard-sentinel
//!
//! Threat event log and security posture scoring for Storyguard.
//!
//! This crate provides:
//! - **ThreatEvent**: append-only security event records with a one-way
//!   resolution workflow
//! - **ThreatMonitor**: the central event log, analytics aggregation,
//!   and retention pruning
//! - **SecurityPosture**: derived, never-stored scoring of the current
//!   unresolved event set
//! - **AuditSink**: the durable mirror the admin dashboard reads
//!
//! ## Audit Rules
//!
//! Events are never silently deleted: resolution only flips a flag, and
//! retention pruning applies to resolved events alone, so the posture
//! can never improve without an operator action.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod event;
pub mod monitor;
pub mod posture;
pub mod sink;

pub use error::{Result, SentinelError};
pub use event::{Severity, ThreatEvent, ThreatKind};
pub use monitor::{
    MonitorConfig, ResolveOutcome, ThreatAnalytics, ThreatMonitor, DEFAULT_EVENT_RETENTION_DAYS,
};
pub use posture::{
    compute_posture, OverallStatus, SecurityPosture, SeverityWeights, CRITICAL_THRESHOLD,
    MONITORING_THRESHOLD, WARNING_THRESHOLD,
};
pub use sink::{AuditSink, MemorySink, SinkError};

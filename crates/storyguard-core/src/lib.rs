//! # storyguard-core
//!
//! High-level security client for the Storyguard storytelling app.
//!
//! The application talks to one type, [`SecurityClient`], which
//! composes:
//! - the **vault** (versioned keys plus envelope encryption),
//! - the **identity allocator** (anonymous 6-character handles), and
//! - the **sentinel** (threat event log and security posture),
//!
//! and enforces the audit contract between them: every encryption
//! fallback, oracle failure, policy breach, and malformed probe becomes
//! a threat event the admin dashboard can see.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{AllocatedIdentity, FallbackOutcome, SecurityClient};
pub use config::{
    AllocationSettings, ConfigError, KeyRotationSettings, MonitorSettings, SecurityConfig,
    SecurityConfigBuilder,
};
pub use error::{CoreError, Result};

// The component vocabulary the application needs alongside the client.
pub use storyguard_identity::{
    InMemoryOracle, PersonalId, UniquenessOracle, ValidPrefix, VerifyOutcome,
};
pub use storyguard_sentinel::{
    AuditSink, OverallStatus, ResolveOutcome, SecurityPosture, Severity, SeverityWeights,
    ThreatAnalytics, ThreatEvent, ThreatKind,
};
pub use storyguard_vault::{
    EncryptionStatus, Envelope, KeyRotationStats, Readiness, RotationRecord, SecurityLevel,
};

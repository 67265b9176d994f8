//! Durable audit sink abstraction.
//!
//! The in-memory event log is authoritative for scoring, but operators
//! review threats through the admin dashboard, which reads a durable
//! append-only mirror. The monitor itself stays synchronous and
//! transport-free; whoever records an event is responsible for
//! mirroring it to the sink.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::event::ThreatEvent;

/// Errors an audit sink can report.
#[derive(Error, Debug)]
pub enum SinkError {
    /// The append could not be written.
    #[error("audit sink write failed: {0}")]
    Write(String),
}

/// Append-only mirror of the threat event log.
///
/// Implementations must be append-only from the caller's perspective:
/// an event, once written, is never rewritten or removed by this
/// interface.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one event to the durable log.
    async fn append(&self, event: &ThreatEvent) -> std::result::Result<(), SinkError>;
}

/// In-memory sink for tests and offline development.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<ThreatEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far.
    pub async fn entries(&self) -> Vec<ThreatEvent> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn append(&self, event: &ThreatEvent) -> std::result::Result<(), SinkError> {
        self.entries.lock().await.push(event.clone());
        Ok(())
    }
}

//! The uniqueness oracle abstraction.
//!
//! Collision-freedom for personal identifiers is ultimately enforced by
//! a remote authority holding a uniqueness constraint. This module only
//! fixes the two semantics the allocator needs: an existence check and
//! an atomic reservation. Transport is the implementor's concern.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::personal_id::PersonalId;

/// Errors an oracle implementation can report.
#[derive(Error, Debug)]
pub enum OracleError {
    /// The authority could not be reached.
    #[error("oracle transport failure: {0}")]
    Transport(String),
}

/// Result type for oracle operations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Outcome of a reservation attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// The candidate is now reserved for this caller.
    Reserved,
    /// Another caller holds the candidate. Treated as a collision.
    Conflict,
}

/// Remote authority guaranteeing identifier uniqueness.
///
/// ## Contract
///
/// - `reserve` MUST be atomic: when two callers race on the same
///   candidate, exactly one sees [`ReserveOutcome::Reserved`].
/// - A reservation either fully happens or not at all. An abandoned
///   call must not leave a half-reserved candidate behind.
/// - Reservations are permanent. Deleting a local copy of an
///   identifier does not release it.
#[async_trait]
pub trait UniquenessOracle: Send + Sync {
    /// Whether the candidate has ever been reserved.
    async fn exists(&self, candidate: &PersonalId) -> OracleResult<bool>;

    /// Atomically reserve the candidate.
    async fn reserve(&self, candidate: &PersonalId) -> OracleResult<ReserveOutcome>;
}

/// In-memory oracle for tests and offline development.
///
/// Holds the reserved set behind a mutex so `reserve` gives the same
/// check-and-insert atomicity a database unique index would.
#[derive(Debug, Default)]
pub struct InMemoryOracle {
    reserved: Mutex<HashSet<PersonalId>>,
}

impl InMemoryOracle {
    /// Create an empty oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a reservation, e.g. to simulate an existing user.
    pub async fn preload(&self, candidate: PersonalId) {
        self.reserved.lock().await.insert(candidate);
    }

    /// Number of reservations held.
    pub async fn len(&self) -> usize {
        self.reserved.lock().await.len()
    }

    /// Whether no reservations are held.
    pub async fn is_empty(&self) -> bool {
        self.reserved.lock().await.is_empty()
    }
}

#[async_trait]
impl UniquenessOracle for InMemoryOracle {
    async fn exists(&self, candidate: &PersonalId) -> OracleResult<bool> {
        Ok(self.reserved.lock().await.contains(candidate))
    }

    async fn reserve(&self, candidate: &PersonalId) -> OracleResult<ReserveOutcome> {
        if self.reserved.lock().await.insert(candidate.clone()) {
            Ok(ReserveOutcome::Reserved)
        } else {
            Ok(ReserveOutcome::Conflict)
        }
    }
}

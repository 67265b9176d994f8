//! Collision-free identifier allocation.
//!
//! Allocation mints a candidate (user prefix plus random suffix), checks
//! it against the uniqueness oracle, and then reserves it. The
//! reservation write is the authority: a rejected write means another
//! device won the race, and the allocator simply tries a new suffix.
//! With 36^2 = 1296 suffixes per prefix, exhaustion is unlikely but
//! handled, not assumed away.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::OsRng;
use rand::Rng;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::oracle::{OracleResult, ReserveOutcome, UniquenessOracle};
use crate::personal_id::{PersonalId, ValidPrefix, SUFFIX_ALPHABET, SUFFIX_LEN};
use crate::{IdentityError, Result};

/// Default number of allocation attempts before giving up.
pub const DEFAULT_RETRY_LIMIT: u32 = 10;

/// Default timeout for one oracle round-trip.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Allocation tuning knobs.
#[derive(Clone, Debug)]
pub struct AllocatorConfig {
    /// Maximum candidate attempts per allocation.
    pub retry_limit: u32,
    /// Timeout for a single oracle call. A timed-out call is a
    /// retriable failure, never "not found".
    pub oracle_timeout: Duration,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            retry_limit: DEFAULT_RETRY_LIMIT,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
        }
    }
}

/// Outcome of verifying a claimed identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The identifier is reserved.
    Found,
    /// No such identifier has been reserved.
    NotFound,
}

/// Predicate rejecting disallowed prefixes (content policy).
pub type DenylistFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Mints and verifies anonymous personal identifiers.
pub struct IdentityAllocator {
    oracle: Arc<dyn UniquenessOracle>,
    config: AllocatorConfig,
    denylist: Option<DenylistFn>,
}

impl IdentityAllocator {
    /// Create an allocator over the given oracle.
    pub fn new(oracle: Arc<dyn UniquenessOracle>, config: AllocatorConfig) -> Self {
        Self {
            oracle,
            config,
            denylist: None,
        }
    }

    /// Attach a content-policy predicate. Prefixes for which the
    /// predicate returns `true` are rejected by `validate_prefix`.
    pub fn with_denylist(mut self, denylist: DenylistFn) -> Self {
        self.denylist = Some(denylist);
        self
    }

    /// Validate and normalize a user-chosen prefix.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidPrefix` when the shape is wrong or
    /// the denylist predicate matches the normalized prefix.
    pub fn validate_prefix(&self, raw: &str) -> Result<ValidPrefix> {
        let prefix = ValidPrefix::new(raw)?;
        if let Some(denylist) = &self.denylist {
            if denylist(prefix.as_str()) {
                return Err(IdentityError::InvalidPrefix {
                    reason: "prefix is not allowed".to_string(),
                });
            }
        }
        Ok(prefix)
    }

    /// Allocate a new identifier for the given prefix.
    ///
    /// Each attempt generates a fresh random suffix, checks existence,
    /// then reserves. Reserved sentinel identifiers and reservation
    /// conflicts both count as collisions and consume an attempt.
    ///
    /// # Errors
    ///
    /// - `InvalidPrefix` for a bad or denylisted prefix
    /// - `ExhaustedRetries` after `retry_limit` colliding attempts
    /// - `OracleUnavailable` on transport failure or timeout
    pub async fn allocate(&self, raw_prefix: &str) -> Result<PersonalId> {
        let prefix = self.validate_prefix(raw_prefix)?;

        for attempt in 1..=self.config.retry_limit {
            let candidate = PersonalId::from_parts(&prefix, &random_suffix());

            if candidate.is_reserved() {
                debug!(%candidate, attempt, "candidate is a reserved identifier, retrying");
                continue;
            }

            if self.checked(self.oracle.exists(&candidate)).await? {
                debug!(%candidate, attempt, "candidate already taken, retrying");
                continue;
            }

            match self.checked(self.oracle.reserve(&candidate)).await? {
                ReserveOutcome::Reserved => {
                    info!(%candidate, attempt, "allocated personal identifier");
                    return Ok(candidate);
                }
                ReserveOutcome::Conflict => {
                    // Another device claimed it between our check and our
                    // write. The write is the authority; just retry.
                    debug!(%candidate, attempt, "reservation lost to a concurrent claim");
                    continue;
                }
            }
        }

        warn!(
            prefix = %prefix,
            attempts = self.config.retry_limit,
            "identifier allocation exhausted"
        );
        Err(IdentityError::ExhaustedRetries {
            attempts: self.config.retry_limit,
        })
    }

    /// Verify a claimed identifier.
    ///
    /// Only whole-identifier existence is reported, never prefix
    /// occupancy, so callers cannot enumerate other users' prefixes.
    /// Reserved sentinel identifiers always report `NotFound`.
    ///
    /// # Errors
    ///
    /// - `MalformedIdentifier` unless the input is 6 alphanumerics
    /// - `OracleUnavailable` on transport failure or timeout
    pub async fn verify(&self, raw: &str) -> Result<VerifyOutcome> {
        let candidate = PersonalId::new(raw)?;

        if candidate.is_reserved() {
            return Ok(VerifyOutcome::NotFound);
        }

        if self.checked(self.oracle.exists(&candidate)).await? {
            Ok(VerifyOutcome::Found)
        } else {
            Ok(VerifyOutcome::NotFound)
        }
    }

    /// Run an oracle call under the configured timeout, folding both
    /// transport failure and timeout into `OracleUnavailable`.
    async fn checked<T>(
        &self,
        call: impl std::future::Future<Output = OracleResult<T>>,
    ) -> Result<T> {
        match timeout(self.config.oracle_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(IdentityError::OracleUnavailable(e.to_string())),
            Err(_) => Err(IdentityError::OracleUnavailable(format!(
                "timed out after {:?}",
                self.config.oracle_timeout
            ))),
        }
    }
}

impl std::fmt::Debug for IdentityAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityAllocator")
            .field("config", &self.config)
            .field("denylist", &self.denylist.as_ref().map(|_| "[predicate]"))
            .finish()
    }
}

/// Draw a random suffix from [`SUFFIX_ALPHABET`].
fn random_suffix() -> String {
    let mut rng = OsRng;
    (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

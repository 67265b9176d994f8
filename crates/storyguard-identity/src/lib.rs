//! # storyguard-identity
//!
//! Anonymous short-identifier allocation for Storyguard.
//!
//! Visitors have no accounts. Instead each device mints one
//! **personal identifier**: a 6-character handle made of a 4-character
//! prefix the user picks and a 2-character suffix the system picks.
//! Global uniqueness is guaranteed by a remote [`UniquenessOracle`]
//! whose reservation write is the single source of truth.
//!
//! This crate provides:
//! - **ValidPrefix / PersonalId**: validated, uppercase-normalized types
//! - **UniquenessOracle**: the async existence/reservation abstraction
//! - **IdentityAllocator**: bounded collision-retry allocation and
//!   whole-identifier verification

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocator;
pub mod error;
pub mod oracle;
pub mod personal_id;

pub use allocator::{
    AllocatorConfig, DenylistFn, IdentityAllocator, VerifyOutcome, DEFAULT_ORACLE_TIMEOUT,
    DEFAULT_RETRY_LIMIT,
};
pub use error::{IdentityError, Result};
pub use oracle::{InMemoryOracle, OracleError, OracleResult, ReserveOutcome, UniquenessOracle};
pub use personal_id::{
    PersonalId, ValidPrefix, ID_LEN, PREFIX_LEN, RESERVED_IDENTIFIERS, SUFFIX_ALPHABET, SUFFIX_LEN,
};

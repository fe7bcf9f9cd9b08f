//! # pse-score
//!
//! Stake-time score accounting.
//!
//! A delegator's score is the integral of delegated tokens over time:
//! `Σ tokens × seconds` across every delegation. Only the part accrued since
//! the last change of a (delegator, validator) pair is computed on demand;
//! everything older is rolled into a per-delegator snapshot when that pair
//! changes.
//!
//! ## Modules
//!
//! - [`ledger`]: Un-rolled score and score queries
//! - [`accumulator`]: Delegation change hook and exclusion handling
//! - [`seed`]: Initial time entries from existing delegations

pub mod accumulator;
pub mod ledger;
pub mod seed;

use pse_db::DbError;
use pse_types::keepers::KeeperError;

/// Error types for score accounting.
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Staking collaborator failure.
    #[error("staking: {0}")]
    Keeper(#[from] KeeperError),

    /// Score arithmetic overflowed `u128`.
    #[error("score overflow for {0}")]
    Overflow(String),
}

/// Convenience result type for score operations.
pub type Result<T> = std::result::Result<T, ScoreError>;

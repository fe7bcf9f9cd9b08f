//! # pse-distribution
//!
//! Scheduled token release from the PSE clearing accounts.
//!
//! Each schedule entry releases one amount per clearing account. The five
//! non-Community accounts are split evenly across their mapped recipients
//! in one step. The Community amount is shared pro rata to score among all
//! delegators and paid out over several blocks by a resumable job.
//!
//! ## Modules
//!
//! - [`scheduler`]: Due-entry lookup, completion and pending view
//! - [`direct`]: Equal split to mapped recipients
//! - [`community`]: Score-weighted Community job

pub mod community;
pub mod direct;
pub mod scheduler;

use pse_db::DbError;
use pse_score::ScoreError;
use pse_types::keepers::KeeperError;

/// Error types for distribution operations.
#[derive(Debug, thiserror::Error)]
pub enum DistributionError {
    /// Storage failure.
    #[error(transparent)]
    Db(#[from] DbError),

    /// Score accounting failure.
    #[error(transparent)]
    Score(#[from] ScoreError),

    /// Staking, bank or community pool failure.
    #[error("collaborator: {0}")]
    Keeper(#[from] KeeperError),

    /// A Community job is already running.
    #[error("community distribution job already in progress (scheduled at {0})")]
    CommunityJobInProgress(u64),

    /// Arithmetic overflow.
    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    /// Stored state contradicts itself.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Convenience result type for distribution operations.
pub type Result<T> = std::result::Result<T, DistributionError>;

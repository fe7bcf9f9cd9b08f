//! # pse-types
//!
//! Shared domain types for the PSE reward distribution module.
//!
//! Everything here is plain data: addresses, fixed-point decimals, clearing
//! accounts, schedule and job records, genesis state, governance messages and
//! the collaborator traits the module consumes from staking and bank.
//!
//! ## Modules
//!
//! - [`address`]: Account and validator addresses
//! - [`math`]: Fixed-point decimals and overflow-safe integer math
//! - [`clearing`]: The six clearing accounts
//! - [`delegation`]: Time entries, validators and delegation events
//! - [`schedule`]: Scheduled distributions, mappings and completion records
//! - [`community`]: Community distribution job state
//! - [`params`]: Module parameters and governance messages
//! - [`genesis`]: Import/export state
//! - [`events`]: Events emitted by the module
//! - [`keepers`]: Collaborator traits (staking, bank, community pool)
//! - `testutil`: In-memory collaborators (feature `testutil`)

pub mod address;
pub mod clearing;
pub mod community;
pub mod delegation;
pub mod events;
pub mod genesis;
pub mod keepers;
pub mod math;
pub mod params;
pub mod schedule;
#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use address::{AccAddress, ValAddress};
pub use clearing::ClearingAccount;
pub use math::{mul_div_floor, Dec};

/// Length in bytes of account and validator addresses.
pub const ADDRESS_LEN: usize = 20;

/// Default number of delegators paid per block while a Community job runs.
pub const DEFAULT_COMMUNITY_BATCH_SIZE: u64 = 1000;

/// Block context handed to every state transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    pub height: u64,
    /// Block time in Unix seconds.
    pub time_unix_secs: i64,
}

impl BlockInfo {
    pub fn new(height: u64, time_unix_secs: i64) -> Self {
        Self {
            height,
            time_unix_secs,
        }
    }

    /// Block time clamped to the unsigned range used by schedule timestamps.
    pub fn unix_secs(&self) -> u64 {
        u64::try_from(self.time_unix_secs).unwrap_or(0)
    }
}

/// Validation errors for parameters, governance messages and genesis state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An address string could not be parsed.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress {
        /// The offending input.
        address: String,
        /// Parser message.
        reason: String,
    },

    /// The same address appears twice in one list.
    #[error("duplicate address: {0}")]
    DuplicateAddress(String),

    /// The same address appears in both the add and remove lists.
    #[error("address {0} is in both the add and remove lists")]
    AddressInBothLists(String),

    /// A request carries nothing to do.
    #[error("empty request: {0}")]
    EmptyRequest(String),

    /// A clearing account name is unknown.
    #[error("unknown clearing account: {0}")]
    UnknownClearingAccount(String),

    /// A clearing account appears more than once.
    #[error("duplicate clearing account: {0}")]
    DuplicateClearingAccount(ClearingAccount),

    /// A required clearing account is missing.
    #[error("missing clearing account: {0}")]
    MissingClearingAccount(ClearingAccount),

    /// The Community account cannot carry a recipient mapping.
    #[error("community clearing account cannot have a recipient mapping")]
    CommunityMapping,

    /// A mapping lists no recipients.
    #[error("mapping for {0} has no recipients")]
    EmptyRecipients(ClearingAccount),

    /// A scheduled account has no recipient mapping.
    #[error("scheduled account {account} at {timestamp} has no recipient mapping")]
    UnmappedAllocation {
        /// Schedule timestamp.
        timestamp: u64,
        /// Account without mapping.
        account: ClearingAccount,
    },

    /// Schedule problem (ordering, empty allocations, zero amounts).
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Genesis state is internally inconsistent.
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),
}

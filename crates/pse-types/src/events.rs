//! Events emitted by the module.
//!
//! Events are collected per state transition and only surfaced once that
//! transition commits.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{AccAddress, ClearingAccount};

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PseEvent {
    /// A Community job was created from a due schedule entry.
    CommunityJobStarted {
        scheduled_at: u64,
        total_amount: u64,
        #[serde_as(as = "DisplayFromStr")]
        total_score: u128,
        total_entries: u64,
    },
    /// One delegator was processed by a Community batch.
    CommunityDistributed {
        delegator: AccAddress,
        #[serde_as(as = "DisplayFromStr")]
        score: u128,
        #[serde_as(as = "DisplayFromStr")]
        total_score: u128,
        /// Pro-rata entitlement.
        amount: u64,
        /// Amount actually credited; zero when the delegator holds no delegations.
        paid: u64,
        scheduled_at: u64,
    },
    /// The Community job finished and its leftover went to the community pool.
    CommunityJobCompleted {
        scheduled_at: u64,
        total_amount: u64,
        leftover: u64,
    },
    /// A non-Community allocation was split across its recipients.
    AllocationDistributed {
        clearing_account: ClearingAccount,
        scheduled_time: u64,
        actual_time: u64,
        block_height: u64,
        amount: u64,
        recipients: Vec<AccAddress>,
        per_recipient: u64,
        remainder: u64,
    },
    /// Every allocation of a schedule entry has been paid.
    ScheduleEntryCompleted { timestamp: u64 },
    /// Governance toggled block-time distribution.
    DistributionsDisabledChanged { disabled: bool },
    /// The exclusion list changed.
    ExcludedAddressesUpdated {
        added: Vec<AccAddress>,
        removed: Vec<AccAddress>,
    },
}

//! Delegation-side records: time entries, validators and change events.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{mul_div_floor, AccAddress, Dec, ValAddress};

/// Shares held in one (delegator, validator) pair and when they last changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationTimeEntry {
    pub shares: Dec,
    pub last_changed_unix_sec: i64,
}

/// A time entry together with its key, as carried in genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationTimeEntryRecord {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    #[serde(flatten)]
    pub entry: DelegationTimeEntry,
}

/// Rolled-up score of one delegator.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountScore {
    pub delegator: AccAddress,
    #[serde_as(as = "DisplayFromStr")]
    pub score: u128,
}

/// Validator view exposed by the staking collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validator {
    pub address: ValAddress,
    /// Bonded tokens in base units.
    pub tokens: u64,
    /// Total shares issued to delegators.
    pub delegator_shares: Dec,
}

impl Validator {
    /// Converts shares to tokens at the current exchange rate, truncated.
    pub fn tokens_from_shares_truncated(&self, shares: Dec) -> u128 {
        if self.delegator_shares.is_zero() {
            return 0;
        }
        mul_div_floor(
            shares.raw(),
            u128::from(self.tokens),
            self.delegator_shares.raw(),
        )
        .unwrap_or(0)
    }
}

/// A delegation as stored by the staking collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delegation {
    pub delegator: AccAddress,
    pub validator: ValAddress,
    pub shares: Dec,
}

/// A delegation with its token balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DelegationResponse {
    pub delegation: Delegation,
    /// Token value of the shares, truncated.
    pub balance: u64,
}

/// Staking-side change notification, delivered after the change is applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DelegationEvent {
    /// A new (delegator, validator) pair appeared.
    Created {
        delegator: AccAddress,
        validator: ValAddress,
    },
    /// Shares of an existing pair changed.
    Modified {
        delegator: AccAddress,
        validator: ValAddress,
    },
    /// The pair was fully unbonded.
    Removed {
        delegator: AccAddress,
        validator: ValAddress,
    },
    /// Shares moved from one validator to another.
    Redelegated {
        delegator: AccAddress,
        src_validator: ValAddress,
        dst_validator: ValAddress,
    },
}

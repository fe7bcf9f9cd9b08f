//! Allocation schedule, recipient mappings and completion records.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{AccAddress, ClearingAccount, ValidationError};

/// Amount one clearing account releases at a scheduled time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingAccountAllocation {
    pub clearing_account: ClearingAccount,
    /// Base units.
    pub amount: u64,
}

/// One entry of the allocation schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledDistribution {
    /// Unix seconds at which the entry becomes due.
    pub timestamp: u64,
    pub allocations: Vec<ClearingAccountAllocation>,
}

impl ScheduledDistribution {
    /// Amount allocated to `account`, zero when absent.
    pub fn amount_for(&self, account: ClearingAccount) -> u64 {
        self.allocations
            .iter()
            .filter(|a| a.clearing_account == account)
            .map(|a| a.amount)
            .sum()
    }

    pub fn total_amount(&self) -> u128 {
        self.allocations.iter().map(|a| u128::from(a.amount)).sum()
    }
}

/// Recipients for a non-Community clearing account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingAccountMapping {
    pub clearing_account: ClearingAccount,
    pub recipient_addresses: Vec<AccAddress>,
}

/// Record of one paid allocation, keyed by (account, scheduled time).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedDistribution {
    pub clearing_account: ClearingAccount,
    pub scheduled_time: u64,
    pub actual_time: u64,
    pub block_height: u64,
    /// Amount that left the clearing account, remainder included.
    pub amount: u64,
    pub recipients: Vec<AccAddress>,
}

/// A schedule entry that has not been fully paid yet.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDistributionInfo {
    pub timestamp: u64,
    /// Seconds until due. Negative once the entry is overdue.
    pub remaining_seconds: i64,
    pub allocations: Vec<ClearingAccountAllocation>,
    /// Sum over all allocations.
    #[serde_as(as = "DisplayFromStr")]
    pub total_amount: u128,
}

/// Current balance of a clearing account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearingAccountBalance {
    pub clearing_account: ClearingAccount,
    pub denom: String,
    pub amount: u64,
}

/// Checks ordering and completeness of a schedule.
///
/// Timestamps must be non-zero and strictly ascending. Every entry carries
/// each of the six clearing accounts exactly once with a non-zero amount.
pub fn validate_schedule(schedule: &[ScheduledDistribution]) -> Result<(), ValidationError> {
    let mut previous: Option<u64> = None;
    for (index, entry) in schedule.iter().enumerate() {
        if entry.timestamp == 0 {
            return Err(ValidationError::InvalidSchedule(format!(
                "entry {index} has zero timestamp"
            )));
        }
        if let Some(prev) = previous {
            if entry.timestamp <= prev {
                return Err(ValidationError::InvalidSchedule(format!(
                    "entry {index} timestamp {} is not after {prev}",
                    entry.timestamp
                )));
            }
        }
        previous = Some(entry.timestamp);

        if entry.allocations.is_empty() {
            return Err(ValidationError::InvalidSchedule(format!(
                "entry at {} has no allocations",
                entry.timestamp
            )));
        }

        let mut seen = BTreeSet::new();
        for allocation in &entry.allocations {
            if !seen.insert(allocation.clearing_account) {
                return Err(ValidationError::DuplicateClearingAccount(
                    allocation.clearing_account,
                ));
            }
            if allocation.amount == 0 {
                return Err(ValidationError::InvalidSchedule(format!(
                    "{} has zero amount at {}",
                    allocation.clearing_account, entry.timestamp
                )));
            }
        }
        if let Some(missing) = ClearingAccount::ALL.iter().find(|a| !seen.contains(a)) {
            return Err(ValidationError::MissingClearingAccount(*missing));
        }
    }
    Ok(())
}

/// Checks a set of mappings in isolation.
///
/// No Community mapping, no account twice, every mapping has at least one
/// recipient and no recipient repeats within a mapping.
pub fn validate_mappings(mappings: &[ClearingAccountMapping]) -> Result<(), ValidationError> {
    let mut accounts = BTreeSet::new();
    for mapping in mappings {
        if mapping.clearing_account.is_community() {
            return Err(ValidationError::CommunityMapping);
        }
        if !accounts.insert(mapping.clearing_account) {
            return Err(ValidationError::DuplicateClearingAccount(
                mapping.clearing_account,
            ));
        }
        if mapping.recipient_addresses.is_empty() {
            return Err(ValidationError::EmptyRecipients(mapping.clearing_account));
        }
        let mut recipients = BTreeSet::new();
        for recipient in &mapping.recipient_addresses {
            if !recipients.insert(recipient) {
                return Err(ValidationError::DuplicateAddress(recipient.to_string()));
            }
        }
    }
    Ok(())
}

/// Every non-Community account named by the schedule must have a mapping.
pub fn validate_schedule_mapping_consistency(
    schedule: &[ScheduledDistribution],
    mappings: &[ClearingAccountMapping],
) -> Result<(), ValidationError> {
    let mapped: BTreeSet<ClearingAccount> =
        mappings.iter().map(|m| m.clearing_account).collect();
    for entry in schedule {
        for allocation in &entry.allocations {
            let account = allocation.clearing_account;
            if !account.is_community() && !mapped.contains(&account) {
                return Err(ValidationError::UnmappedAllocation {
                    timestamp: entry.timestamp,
                    account,
                });
            }
        }
    }
    Ok(())
}

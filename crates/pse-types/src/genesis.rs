//! Genesis import/export state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::community::CommunityDistributionJob;
use crate::delegation::{AccountScore, DelegationTimeEntryRecord};
use crate::params::Params;
use crate::schedule::{
    validate_schedule, validate_schedule_mapping_consistency, CompletedDistribution,
    ScheduledDistribution,
};
use crate::{AccAddress, ValidationError};

/// Full persisted state of the module.
///
/// Lists are exported in storage key order so that export, import and
/// export again yields identical JSON.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub scheduled_distributions: Vec<ScheduledDistribution>,
    #[serde(default)]
    pub delegation_time_entries: Vec<DelegationTimeEntryRecord>,
    #[serde(default)]
    pub account_scores: Vec<AccountScore>,
    #[serde(default)]
    pub community_job: Option<CommunityDistributionJob>,
    #[serde(default)]
    pub community_scores: Vec<AccountScore>,
    #[serde(default)]
    pub completed_distributions: Vec<CompletedDistribution>,
    #[serde(default)]
    pub distributions_disabled: bool,
}

fn invalid(msg: impl Into<String>) -> ValidationError {
    ValidationError::InvalidGenesis(msg.into())
}

impl GenesisState {
    /// Checks everything that can be checked without collaborators.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.params.validate()?;
        validate_schedule(&self.scheduled_distributions)?;
        validate_schedule_mapping_consistency(
            &self.scheduled_distributions,
            &self.params.clearing_account_mappings,
        )?;

        let excluded: BTreeSet<&AccAddress> = self.params.excluded_addresses.iter().collect();

        let mut entry_keys = BTreeSet::new();
        for record in &self.delegation_time_entries {
            if !entry_keys.insert((record.delegator, record.validator)) {
                return Err(invalid(format!(
                    "duplicate time entry {}/{}",
                    record.delegator, record.validator
                )));
            }
            if excluded.contains(&record.delegator) {
                return Err(invalid(format!(
                    "excluded address {} has a time entry",
                    record.delegator
                )));
            }
        }

        let mut score_keys = BTreeSet::new();
        for score in &self.account_scores {
            if !score_keys.insert(score.delegator) {
                return Err(invalid(format!("duplicate score for {}", score.delegator)));
            }
            if excluded.contains(&score.delegator) {
                return Err(invalid(format!(
                    "excluded address {} has a score",
                    score.delegator
                )));
            }
        }

        self.validate_community()?;

        let mut completed = BTreeSet::new();
        for record in &self.completed_distributions {
            if !completed.insert((record.clearing_account, record.scheduled_time)) {
                return Err(invalid(format!(
                    "duplicate completion record {} at {}",
                    record.clearing_account, record.scheduled_time
                )));
            }
        }
        Ok(())
    }

    fn validate_community(&self) -> Result<(), ValidationError> {
        let Some(job) = &self.community_job else {
            if !self.community_scores.is_empty() {
                return Err(invalid("community scores present without a job"));
            }
            return Ok(());
        };

        if job.processed_entries > job.total_entries {
            return Err(invalid("job processed more entries than it has"));
        }
        if job.leftover > job.total_amount {
            return Err(invalid("job leftover exceeds its total amount"));
        }
        if job.total_entries != self.community_scores.len() as u64 {
            return Err(invalid(format!(
                "job expects {} entries, found {} community scores",
                job.total_entries,
                self.community_scores.len()
            )));
        }
        if !self
            .scheduled_distributions
            .iter()
            .any(|e| e.timestamp == job.scheduled_at)
        {
            return Err(invalid(format!(
                "job refers to missing schedule entry {}",
                job.scheduled_at
            )));
        }

        let mut keys = BTreeSet::new();
        let mut sum: u128 = 0;
        for score in &self.community_scores {
            if score.score == 0 {
                return Err(invalid(format!("zero community score for {}", score.delegator)));
            }
            if !keys.insert(score.delegator) {
                return Err(invalid(format!(
                    "duplicate community score for {}",
                    score.delegator
                )));
            }
            sum = sum
                .checked_add(score.score)
                .ok_or_else(|| invalid("community score sum overflows"))?;
        }
        if sum != job.total_score {
            return Err(invalid(format!(
                "community scores sum to {sum}, job total is {}",
                job.total_score
            )));
        }
        if let Some(cursor) = &job.next_address {
            if !keys.contains(cursor) {
                return Err(invalid(format!("job cursor {cursor} is not a community score key")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegation::DelegationTimeEntry;
    use crate::schedule::{ClearingAccountAllocation, ClearingAccountMapping};
    use crate::{ClearingAccount, Dec, ValAddress, ADDRESS_LEN};

    fn addr(b: u8) -> AccAddress {
        AccAddress::new([b; ADDRESS_LEN])
    }

    fn base() -> GenesisState {
        let mappings = ClearingAccount::non_community()
            .map(|account| ClearingAccountMapping {
                clearing_account: account,
                recipient_addresses: vec![addr(200)],
            })
            .collect();
        GenesisState {
            params: Params {
                excluded_addresses: vec![addr(9)],
                clearing_account_mappings: mappings,
            },
            scheduled_distributions: vec![ScheduledDistribution {
                timestamp: 100,
                allocations: ClearingAccount::ALL
                    .iter()
                    .map(|a| ClearingAccountAllocation {
                        clearing_account: *a,
                        amount: 10,
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    fn job() -> CommunityDistributionJob {
        CommunityDistributionJob {
            scheduled_at: 100,
            total_amount: 10,
            total_score: 30,
            leftover: 10,
            next_address: None,
            total_entries: 2,
            processed_entries: 0,
        }
    }

    #[test]
    fn test_default_genesis_is_valid() {
        assert!(GenesisState::default().validate().is_ok());
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_excluded_entry_rejected() {
        let mut g = base();
        g.delegation_time_entries.push(DelegationTimeEntryRecord {
            delegator: addr(9),
            validator: ValAddress::new([1; ADDRESS_LEN]),
            entry: DelegationTimeEntry {
                shares: Dec::from_int(1),
                last_changed_unix_sec: 0,
            },
        });
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_job_must_match_scores() {
        let mut g = base();
        g.community_job = Some(job());
        g.community_scores = vec![
            AccountScore {
                delegator: addr(1),
                score: 10,
            },
            AccountScore {
                delegator: addr(2),
                score: 20,
            },
        ];
        assert!(g.validate().is_ok());

        g.community_scores.pop();
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_job_cursor_must_exist() {
        let mut g = base();
        let mut j = job();
        j.next_address = Some(addr(3));
        j.processed_entries = 1;
        g.community_job = Some(j);
        g.community_scores = vec![
            AccountScore {
                delegator: addr(1),
                score: 10,
            },
            AccountScore {
                delegator: addr(2),
                score: 20,
            },
        ];
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_scores_without_job_rejected() {
        let mut g = base();
        g.community_scores.push(AccountScore {
            delegator: addr(1),
            score: 1,
        });
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut g = base();
        g.community_job = Some(job());
        g.community_scores = vec![
            AccountScore {
                delegator: addr(1),
                score: 10,
            },
            AccountScore {
                delegator: addr(2),
                score: 20,
            },
        ];
        let json = serde_json::to_string(&g).expect("serialize");
        let back: GenesisState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, g);
        assert_eq!(serde_json::to_string(&back).expect("serialize"), json);
    }
}

//! Community distribution job state.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::AccAddress;

/// An in-flight Community distribution.
///
/// At most one job exists. `next_address` is the last delegator paid; the
/// next batch resumes strictly after it.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityDistributionJob {
    /// Timestamp of the schedule entry that started this job.
    pub scheduled_at: u64,
    pub total_amount: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_score: u128,
    /// Amount not yet paid out.
    pub leftover: u64,
    pub next_address: Option<AccAddress>,
    pub total_entries: u64,
    pub processed_entries: u64,
}

impl CommunityDistributionJob {
    pub fn is_finished(&self) -> bool {
        self.processed_entries >= self.total_entries
    }

    pub fn distributed(&self) -> u64 {
        self.total_amount.saturating_sub(self.leftover)
    }
}

/// Query view of the in-flight job.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityJobStatus {
    pub scheduled_at: u64,
    pub total_amount: u64,
    pub distributed: u64,
    pub leftover: u64,
    #[serde_as(as = "DisplayFromStr")]
    pub total_score: u128,
    pub total_entries: u64,
    pub processed_entries: u64,
    pub remaining_entries: u64,
}

impl From<&CommunityDistributionJob> for CommunityJobStatus {
    fn from(job: &CommunityDistributionJob) -> Self {
        Self {
            scheduled_at: job.scheduled_at,
            total_amount: job.total_amount,
            distributed: job.distributed(),
            leftover: job.leftover,
            total_score: job.total_score,
            total_entries: job.total_entries,
            processed_entries: job.processed_entries,
            remaining_entries: job.total_entries.saturating_sub(job.processed_entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_job() {
        let job = CommunityDistributionJob {
            scheduled_at: 100,
            total_amount: 1000,
            total_score: 24_000_000,
            leftover: 634,
            next_address: None,
            total_entries: 3,
            processed_entries: 1,
        };
        let status = CommunityJobStatus::from(&job);
        assert_eq!(status.distributed, 366);
        assert_eq!(status.remaining_entries, 2);
        assert!(!job.is_finished());
    }

    #[test]
    fn test_job_json_score_is_string() {
        let job = CommunityDistributionJob {
            scheduled_at: 1,
            total_amount: 1,
            total_score: u128::MAX,
            leftover: 1,
            next_address: None,
            total_entries: 0,
            processed_entries: 0,
        };
        let value = serde_json::to_value(&job).expect("serialize");
        assert_eq!(value["total_score"], u128::MAX.to_string());
        let back: CommunityDistributionJob = serde_json::from_value(value).expect("deserialize");
        assert_eq!(back, job);
    }
}

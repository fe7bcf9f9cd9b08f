//! Read-only views over module state.

use pse_db::queries::{community, completed, params, schedule, settings};
use pse_distribution::scheduler;
use pse_score::ledger;
use pse_types::community::CommunityJobStatus;
use pse_types::keepers::{BankKeeper, CommunityPool, StakingKeeper};
use pse_types::params::Params;
use pse_types::schedule::{
    ClearingAccountBalance, CompletedDistribution, PendingDistributionInfo, ScheduledDistribution,
};
use pse_types::{AccAddress, ClearingAccount};

use crate::{PseModule, Result};

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    /// Score of `delegator` as of `now`, including the un-rolled part.
    pub fn score(&self, delegator: &AccAddress, now: i64) -> Result<u128> {
        Ok(ledger::delegator_score(&self.conn, &self.staking, delegator, now)?)
    }

    /// Every schedule entry with its distance from `now`.
    pub fn pending_distributions(&self, now: u64) -> Result<Vec<PendingDistributionInfo>> {
        Ok(scheduler::pending(&self.conn, now)?)
    }

    pub fn clearing_account_balances(&self) -> Vec<ClearingAccountBalance> {
        let denom = self.staking.bond_denom();
        ClearingAccount::ALL
            .iter()
            .map(|account| ClearingAccountBalance {
                clearing_account: *account,
                denom: denom.clone(),
                amount: self.bank.clearing_account_balance(*account),
            })
            .collect()
    }

    pub fn params(&self) -> Result<Params> {
        Ok(Params {
            excluded_addresses: params::excluded(&self.conn)?,
            clearing_account_mappings: params::mappings(&self.conn)?,
        })
    }

    /// Completion records, optionally for one account.
    pub fn completed_distributions(
        &self,
        account: Option<ClearingAccount>,
    ) -> Result<Vec<CompletedDistribution>> {
        Ok(completed::list(&self.conn, account)?)
    }

    pub fn community_job_status(&self) -> Result<Option<CommunityJobStatus>> {
        Ok(community::job(&self.conn)?.as_ref().map(CommunityJobStatus::from))
    }

    pub fn allocation_schedule(&self) -> Result<Vec<ScheduledDistribution>> {
        Ok(schedule::all(&self.conn)?)
    }

    pub fn distributions_disabled(&self) -> Result<bool> {
        Ok(settings::distributions_disabled(&self.conn)?)
    }
}

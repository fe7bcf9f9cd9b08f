//! Governance message handlers.
//!
//! Each handler checks the sender against the configured authority and runs
//! stateless validation before touching any state.

use pse_db::queries::{community, params, settings};
use pse_distribution::scheduler;
use pse_score::accumulator;
use pse_types::events::PseEvent;
use pse_types::keepers::{BankKeeper, CommunityPool, StakingKeeper};
use pse_types::params::{
    MsgSetDistributionsDisabled, MsgUpdateAllocationSchedule, MsgUpdateClearingAccountMappings,
    MsgUpdateExcludedAddresses,
};
use pse_types::schedule::validate_schedule_mapping_consistency;
use pse_types::BlockInfo;

use crate::{ModuleError, PseModule, Result};

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    /// Adds and removes excluded delegators.
    ///
    /// A newly excluded delegator loses its accumulated score. A removed one
    /// starts accruing from `block` time on its current delegations.
    /// Addresses already in the requested state are skipped.
    pub fn update_excluded_addresses(
        &mut self,
        msg: &MsgUpdateExcludedAddresses,
        block: &BlockInfo,
    ) -> Result<Vec<PseEvent>> {
        self.check_authority(&msg.authority)?;
        let update = msg.validate_basic()?;
        let now = block.time_unix_secs;

        let events = self.in_transaction(|conn, staking, _, _| {
            let mut removed = Vec::new();
            for address in &update.remove {
                if accumulator::reinstate_delegator(conn, &*staking, address, now)? {
                    removed.push(*address);
                }
            }
            let mut added = Vec::new();
            for address in &update.add {
                if accumulator::exclude_delegator(conn, address)? {
                    added.push(*address);
                }
            }
            if added.is_empty() && removed.is_empty() {
                return Ok(Vec::new());
            }
            Ok(vec![PseEvent::ExcludedAddressesUpdated { added, removed }])
        })?;

        tracing::info!(
            add = update.add.len(),
            remove = update.remove.len(),
            changed = !events.is_empty(),
            "PSE: excluded addresses updated"
        );
        Ok(events)
    }

    /// Replaces every recipient mapping.
    pub fn update_clearing_account_mappings(
        &mut self,
        msg: &MsgUpdateClearingAccountMappings,
    ) -> Result<()> {
        self.check_authority(&msg.authority)?;
        msg.validate_basic()?;
        self.in_transaction(|conn, _, _, _| {
            params::replace_mappings(conn, &msg.mappings)?;
            Ok(())
        })?;
        tracing::info!(mappings = msg.mappings.len(), "PSE: clearing account mappings updated");
        Ok(())
    }

    /// Replaces the allocation schedule.
    ///
    /// Refused while a Community job is running, since the job's entry
    /// must stay in place until it completes.
    pub fn update_allocation_schedule(&mut self, msg: &MsgUpdateAllocationSchedule) -> Result<()> {
        self.check_authority(&msg.authority)?;
        msg.validate_basic()?;
        self.in_transaction(|conn, _, _, _| {
            if let Some(job) = community::job(conn)? {
                return Err(ModuleError::JobInProgress(job.scheduled_at));
            }
            validate_schedule_mapping_consistency(
                &msg.scheduled_distributions,
                &params::mappings(conn)?,
            )?;
            scheduler::replace(conn, &msg.scheduled_distributions)?;
            Ok(())
        })
    }

    /// Pauses or resumes the per-block step.
    pub fn set_distributions_disabled(
        &mut self,
        msg: &MsgSetDistributionsDisabled,
    ) -> Result<Vec<PseEvent>> {
        self.check_authority(&msg.authority)?;
        self.in_transaction(|conn, _, _, _| {
            if settings::distributions_disabled(conn)? == msg.disabled {
                return Ok(Vec::new());
            }
            settings::set_distributions_disabled(conn, msg.disabled)?;
            tracing::warn!(disabled = msg.disabled, "PSE: distributions toggled by governance");
            Ok(vec![PseEvent::DistributionsDisabledChanged {
                disabled: msg.disabled,
            }])
        })
    }
}

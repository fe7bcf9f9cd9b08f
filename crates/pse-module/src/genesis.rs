//! Genesis import and export.
//!
//! Import replaces all module state. Export writes every table back in key
//! order, so importing an export and exporting again is lossless, including
//! a Community job that is halfway through its batches.

use pse_db::queries::{self, community, completed, params, schedule, scores, settings, time_entries};
use pse_types::genesis::GenesisState;
use pse_types::keepers::{BankKeeper, CommunityPool, StakingKeeper};

use crate::{PseModule, Result};

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    /// Validates `state` and replaces the module state with it.
    pub fn init_genesis(&mut self, state: &GenesisState) -> Result<()> {
        state.validate()?;
        self.in_transaction(|conn, _, _, _| {
            queries::clear_all(conn)?;

            for address in &state.params.excluded_addresses {
                params::add_excluded(conn, address)?;
            }
            params::replace_mappings(conn, &state.params.clearing_account_mappings)?;
            for entry in &state.scheduled_distributions {
                schedule::insert(conn, entry)?;
            }
            for record in &state.delegation_time_entries {
                time_entries::set(conn, &record.delegator, &record.validator, &record.entry)?;
            }
            for snapshot in &state.account_scores {
                scores::set(conn, &snapshot.delegator, snapshot.score)?;
            }
            if let Some(job) = &state.community_job {
                community::set_job(conn, job)?;
                for score in &state.community_scores {
                    community::insert_score(conn, &score.delegator, score.score)?;
                }
            }
            for record in &state.completed_distributions {
                completed::insert(conn, record)?;
            }
            settings::set_distributions_disabled(conn, state.distributions_disabled)?;
            Ok(())
        })?;

        tracing::info!(
            schedule = state.scheduled_distributions.len(),
            time_entries = state.delegation_time_entries.len(),
            job = state.community_job.is_some(),
            "PSE: genesis imported"
        );
        Ok(())
    }

    pub fn export_genesis(&self) -> Result<GenesisState> {
        let conn = &self.conn;
        let state = GenesisState {
            params: self.params()?,
            scheduled_distributions: schedule::all(conn)?,
            delegation_time_entries: time_entries::all(conn)?,
            account_scores: scores::all(conn)?,
            community_job: community::job(conn)?,
            community_scores: community::all_scores(conn)?,
            completed_distributions: completed::list(conn, None)?,
            distributions_disabled: settings::distributions_disabled(conn)?,
        };
        tracing::info!(
            schedule = state.scheduled_distributions.len(),
            time_entries = state.delegation_time_entries.len(),
            "PSE: genesis exported"
        );
        Ok(state)
    }

    /// [`Self::init_genesis`] from a JSON document.
    pub fn init_genesis_json(&mut self, json: &str) -> Result<()> {
        let state: GenesisState = serde_json::from_str(json)?;
        self.init_genesis(&state)
    }

    pub fn export_genesis_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_genesis()?)?)
    }
}

//! Per-block distribution step.
//!
//! One call does at most one of:
//!
//! 1. pay the next batch of a running Community job
//! 2. pay the due schedule entry's direct allocations and start its
//!    Community job
//!
//! The schedule entry is removed once every allocation carries a
//! completion marker.

use pse_db::queries::{completed, settings};
use pse_distribution::community::{self, BatchOutcome};
use pse_distribution::{direct, scheduler};
use pse_types::events::PseEvent;
use pse_types::keepers::{BankKeeper, CommunityPool, StakingKeeper};
use pse_types::{BlockInfo, ClearingAccount};
use rusqlite::Connection;

use crate::{PseModule, Result};

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    /// End-of-block hook. Returns the events of the committed step.
    pub fn on_block_finalize(&mut self, block: BlockInfo) -> Result<Vec<PseEvent>> {
        let batch_size = self.batch_size;
        let result = self.in_transaction(|conn, staking, bank, pool| {
            run_block(conn, staking, bank, pool, batch_size, &block)
        });
        match &result {
            Ok(events) if !events.is_empty() => {
                tracing::debug!(height = block.height, events = events.len(), "PSE: block step committed");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(height = block.height, error = %e, "PSE: block step rolled back");
            }
        }
        result
    }
}

fn run_block<S, B, P>(
    conn: &Connection,
    staking: &mut S,
    bank: &mut B,
    pool: &mut P,
    batch_size: u64,
    block: &BlockInfo,
) -> Result<Vec<PseEvent>>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    let mut events = Vec::new();
    if settings::distributions_disabled(conn)? {
        tracing::debug!(height = block.height, "PSE: distributions disabled, skipping");
        return Ok(events);
    }

    match community::process_batch(conn, staking, bank, pool, batch_size, block, &mut events)? {
        BatchOutcome::Completed(job) => {
            scheduler::complete_if_done(conn, job.scheduled_at, &mut events)?;
            return Ok(events);
        }
        BatchOutcome::InProgress { .. } => return Ok(events),
        BatchOutcome::Idle => {}
    }

    let Some(entry) = scheduler::next_due(conn, block.unix_secs())? else {
        return Ok(events);
    };
    tracing::info!(
        timestamp = entry.timestamp,
        height = block.height,
        "PSE: processing scheduled distribution"
    );

    direct::distribute_allocations(conn, bank, pool, &entry, block, &mut events)?;
    if !completed::exists(conn, ClearingAccount::Community, entry.timestamp)? {
        community::start_job(
            conn,
            &*staking,
            &*bank,
            entry.timestamp,
            entry.amount_for(ClearingAccount::Community),
            block,
            &mut events,
        )?;
    }
    scheduler::complete_if_done(conn, entry.timestamp, &mut events)?;
    Ok(events)
}

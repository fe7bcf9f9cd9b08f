//! Score-weighted Community distribution.
//!
//! Starting a job freezes every delegator's score into a table, resets the
//! score ledger and records the amount to share. Each block then pays the
//! next batch of delegators in address order:
//!
//! ```text
//! amount(d) = floor(total_amount * score(d) / total_score)
//! ```
//!
//! The amount is credited to the delegator and immediately re-delegated
//! across its current validators in proportion to their balances. Whatever
//! is not paid out (rounding dust, delegators that unbonded everything or
//! were excluded after the job started) goes to the community pool when the
//! job completes.

use std::collections::{BTreeMap, BTreeSet};

use pse_db::queries::{community, completed, params, scores, time_entries};
use pse_score::accumulator::{before_delegation_change, on_delegation_changed};
use pse_score::ledger::{unrolled_score, ValidatorCache};
use pse_score::ScoreError;
use pse_types::community::CommunityDistributionJob;
use pse_types::delegation::{AccountScore, DelegationEvent};
use pse_types::events::PseEvent;
use pse_types::keepers::{BankKeeper, CommunityPool, KeeperError, StakingKeeper};
use pse_types::schedule::CompletedDistribution;
use pse_types::{mul_div_floor, AccAddress, BlockInfo, ClearingAccount};
use rusqlite::Connection;

use crate::{DistributionError, Result};

/// Result of one [`process_batch`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// No job exists.
    Idle,
    /// The job still has delegators to pay.
    InProgress { processed: u64, remaining: u64 },
    /// The job finished in this call and was removed.
    Completed(CommunityDistributionJob),
}

fn add_score(totals: &mut BTreeMap<AccAddress, u128>, delegator: AccAddress, score: u128) -> Result<()> {
    let slot = totals.entry(delegator).or_default();
    *slot = slot
        .checked_add(score)
        .ok_or_else(|| DistributionError::Overflow(format!("score of {delegator}")))?;
    Ok(())
}

/// Creates the Community job for the schedule entry at `scheduled_at`.
///
/// A zero amount creates no job and marks the Community allocation as paid.
pub fn start_job<S, B>(
    conn: &Connection,
    staking: &S,
    bank: &B,
    scheduled_at: u64,
    total_amount: u64,
    block: &BlockInfo,
    events: &mut Vec<PseEvent>,
) -> Result<Option<CommunityDistributionJob>>
where
    S: StakingKeeper + ?Sized,
    B: BankKeeper + ?Sized,
{
    if let Some(existing) = community::job(conn)? {
        return Err(DistributionError::CommunityJobInProgress(existing.scheduled_at));
    }
    if total_amount == 0 {
        record_completion(conn, scheduled_at, 0, block)?;
        return Ok(None);
    }
    let balance = bank.clearing_account_balance(ClearingAccount::Community);
    if balance < total_amount {
        return Err(DistributionError::Invariant(format!(
            "community clearing account holds {balance}, job needs {total_amount}"
        )));
    }

    let now = block.time_unix_secs;
    let excluded: BTreeSet<AccAddress> = params::excluded(conn)?.into_iter().collect();
    let mut totals = BTreeMap::new();
    let mut cache = ValidatorCache::new();

    for record in time_entries::all(conn)? {
        if excluded.contains(&record.delegator) {
            continue;
        }
        let validator = match cache.get(staking, &record.validator) {
            Ok(v) => v,
            Err(ScoreError::Keeper(KeeperError::NotFound(_))) => {
                tracing::warn!(
                    delegator = %record.delegator,
                    validator = %record.validator,
                    "PSE: time entry for unknown validator ignored"
                );
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let added = unrolled_score(validator, &record.entry, now)
            .ok_or_else(|| DistributionError::Overflow(format!("score of {}", record.delegator)))?;
        add_score(&mut totals, record.delegator, added)?;
    }
    for snapshot in scores::all(conn)? {
        if !excluded.contains(&snapshot.delegator) {
            add_score(&mut totals, snapshot.delegator, snapshot.score)?;
        }
    }

    scores::clear(conn)?;
    time_entries::reset_all_clocks(conn, now)?;
    community::clear_scores(conn)?;

    let mut total_score: u128 = 0;
    let mut total_entries: u64 = 0;
    for (delegator, score) in totals.into_iter().filter(|(_, s)| *s > 0) {
        community::insert_score(conn, &delegator, score)?;
        total_score = total_score
            .checked_add(score)
            .ok_or_else(|| DistributionError::Overflow("total community score".into()))?;
        total_entries += 1;
    }

    let job = CommunityDistributionJob {
        scheduled_at,
        total_amount,
        total_score,
        leftover: total_amount,
        next_address: None,
        total_entries,
        processed_entries: 0,
    };
    community::set_job(conn, &job)?;

    tracing::info!(
        scheduled_at,
        total_amount,
        %total_score,
        total_entries,
        "PSE: community distribution job started"
    );
    events.push(PseEvent::CommunityJobStarted {
        scheduled_at,
        total_amount,
        total_score,
        total_entries,
    });
    Ok(Some(job))
}

/// Pays up to `batch_size` delegators of the running job.
pub fn process_batch<S, B, P>(
    conn: &Connection,
    staking: &mut S,
    bank: &mut B,
    pool: &mut P,
    batch_size: u64,
    block: &BlockInfo,
    events: &mut Vec<PseEvent>,
) -> Result<BatchOutcome>
where
    S: StakingKeeper + ?Sized,
    B: BankKeeper + ?Sized,
    P: CommunityPool + ?Sized,
{
    let Some(mut job) = community::job(conn)? else {
        return Ok(BatchOutcome::Idle);
    };

    if job.total_score == 0 || job.total_entries == 0 {
        complete_job(conn, pool, &job, block, events)?;
        return Ok(BatchOutcome::Completed(job));
    }

    let batch = community::scores_after(conn, job.next_address.as_ref(), batch_size.max(1))?;
    if batch.is_empty() && !job.is_finished() {
        return Err(DistributionError::Invariant(format!(
            "community job processed {} of {} entries but no scores remain",
            job.processed_entries, job.total_entries
        )));
    }

    for AccountScore { delegator, score } in batch {
        let amount = mul_div_floor(u128::from(job.total_amount), score, job.total_score)
            .and_then(|a| u64::try_from(a).ok())
            .ok_or_else(|| DistributionError::Overflow(format!("payout of {delegator}")))?;
        let paid = if params::is_excluded(conn, &delegator)? {
            tracing::debug!(%delegator, amount, "PSE: delegator excluded during job, share kept");
            0
        } else {
            pay_delegator(conn, staking, bank, &delegator, amount, block.time_unix_secs)?
        };

        job.leftover = job.leftover.checked_sub(paid).ok_or_else(|| {
            DistributionError::Invariant(format!(
                "paying {paid} to {delegator} exceeds leftover {}",
                job.leftover
            ))
        })?;
        job.processed_entries += 1;
        job.next_address = Some(delegator);

        events.push(PseEvent::CommunityDistributed {
            delegator,
            score,
            total_score: job.total_score,
            amount,
            paid,
            scheduled_at: job.scheduled_at,
        });
    }

    if job.is_finished() {
        complete_job(conn, pool, &job, block, events)?;
        return Ok(BatchOutcome::Completed(job));
    }

    community::set_job(conn, &job)?;
    tracing::debug!(
        processed = job.processed_entries,
        total = job.total_entries,
        "PSE: community batch processed"
    );
    Ok(BatchOutcome::InProgress {
        processed: job.processed_entries,
        remaining: job.total_entries - job.processed_entries,
    })
}

/// Credits `amount` to the delegator and re-delegates it pro rata.
///
/// Returns the amount credited. A delegator without delegations gets
/// nothing and the amount stays with the job.
fn pay_delegator<S, B>(
    conn: &Connection,
    staking: &mut S,
    bank: &mut B,
    delegator: &AccAddress,
    amount: u64,
    now: i64,
) -> Result<u64>
where
    S: StakingKeeper + ?Sized,
    B: BankKeeper + ?Sized,
{
    if amount == 0 {
        return Ok(0);
    }
    let delegations = staking.delegator_delegations(delegator)?;
    let total_delegated: u128 = delegations.iter().map(|d| u128::from(d.balance)).sum();
    if total_delegated == 0 {
        tracing::debug!(%delegator, amount, "PSE: delegator has no delegations, share kept");
        return Ok(0);
    }

    bank.send_from_clearing_account_to_account(ClearingAccount::Community, delegator, amount)?;

    for response in &delegations {
        let portion = mul_div_floor(u128::from(response.balance), u128::from(amount), total_delegated)
            .and_then(|p| u64::try_from(p).ok())
            .ok_or_else(|| DistributionError::Overflow(format!("re-delegation of {delegator}")))?;
        if portion == 0 {
            continue;
        }
        let validator = response.delegation.validator;
        before_delegation_change(conn, &*staking, delegator, &validator, now)?;
        staking.delegate(delegator, &validator, portion, true)?;
        on_delegation_changed(
            conn,
            &*staking,
            &DelegationEvent::Modified {
                delegator: *delegator,
                validator,
            },
            now,
        )?;
    }
    Ok(amount)
}

fn complete_job<P>(
    conn: &Connection,
    pool: &mut P,
    job: &CommunityDistributionJob,
    block: &BlockInfo,
    events: &mut Vec<PseEvent>,
) -> Result<()>
where
    P: CommunityPool + ?Sized,
{
    if job.leftover > 0 {
        pool.fund_community_pool(ClearingAccount::Community, job.leftover)?;
    }
    community::clear_scores(conn)?;
    community::remove_job(conn)?;
    record_completion(conn, job.scheduled_at, job.total_amount, block)?;

    tracing::info!(
        scheduled_at = job.scheduled_at,
        distributed = job.distributed(),
        leftover = job.leftover,
        "PSE: community distribution job completed"
    );
    events.push(PseEvent::CommunityJobCompleted {
        scheduled_at: job.scheduled_at,
        total_amount: job.total_amount,
        leftover: job.leftover,
    });
    Ok(())
}

fn record_completion(conn: &Connection, scheduled_at: u64, amount: u64, block: &BlockInfo) -> Result<()> {
    completed::insert(
        conn,
        &CompletedDistribution {
            clearing_account: ClearingAccount::Community,
            scheduled_time: scheduled_at,
            actual_time: block.unix_secs(),
            block_height: block.height,
            amount,
            recipients: Vec::new(),
        },
    )?;
    Ok(())
}

//! Direct allocation to mapped recipients.
//!
//! ```text
//! per_recipient = amount / n
//! remainder     = amount - per_recipient * n   -> community pool
//! ```

use pse_db::queries::{completed, params};
use pse_types::events::PseEvent;
use pse_types::keepers::{BankKeeper, CommunityPool};
use pse_types::schedule::{ClearingAccountAllocation, CompletedDistribution, ScheduledDistribution};
use pse_types::{AccAddress, BlockInfo, ClearingAccount};
use rusqlite::Connection;

use crate::{DistributionError, Result};

/// What happened to one allocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocationOutcome {
    Paid { per_recipient: u64, remainder: u64 },
    /// A completion marker already existed.
    AlreadyPaid,
    /// No recipients are mapped. The allocation stays unpaid.
    Unmapped,
}

/// Splits `amount` evenly across `recipients`.
///
/// Returns `(per_recipient, remainder)`.
pub fn equal_split(amount: u64, recipients: usize) -> Result<(u64, u64)> {
    let n = u64::try_from(recipients)
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| DistributionError::Invariant("split across zero recipients".into()))?;
    let per_recipient = amount / n;
    Ok((per_recipient, amount - per_recipient * n))
}

/// Pays every non-Community allocation of `entry` that has no marker yet.
///
/// An unmapped allocation is logged and skipped; the entry then stays in the
/// schedule until governance supplies a mapping. Bank failures abort.
pub fn distribute_allocations<B, P>(
    conn: &Connection,
    bank: &mut B,
    pool: &mut P,
    entry: &ScheduledDistribution,
    block: &BlockInfo,
    events: &mut Vec<PseEvent>,
) -> Result<Vec<(ClearingAccount, AllocationOutcome)>>
where
    B: BankKeeper + ?Sized,
    P: CommunityPool + ?Sized,
{
    let mut outcomes = Vec::new();
    for allocation in &entry.allocations {
        if allocation.clearing_account.is_community() {
            continue;
        }
        let outcome = pay_allocation(conn, bank, pool, allocation, entry.timestamp, block, events)?;
        outcomes.push((allocation.clearing_account, outcome));
    }
    Ok(outcomes)
}

fn pay_allocation<B, P>(
    conn: &Connection,
    bank: &mut B,
    pool: &mut P,
    allocation: &ClearingAccountAllocation,
    scheduled_time: u64,
    block: &BlockInfo,
    events: &mut Vec<PseEvent>,
) -> Result<AllocationOutcome>
where
    B: BankKeeper + ?Sized,
    P: CommunityPool + ?Sized,
{
    let account = allocation.clearing_account;
    if completed::exists(conn, account, scheduled_time)? {
        return Ok(AllocationOutcome::AlreadyPaid);
    }

    let recipients: Vec<AccAddress> = match params::mapping(conn, account)? {
        Some(m) if !m.recipient_addresses.is_empty() => m.recipient_addresses,
        _ => {
            tracing::error!(
                clearing_account = %account,
                scheduled_time,
                "PSE: no recipients mapped, allocation held back"
            );
            return Ok(AllocationOutcome::Unmapped);
        }
    };

    let balance = bank.clearing_account_balance(account);
    if balance < allocation.amount {
        return Err(DistributionError::Invariant(format!(
            "{account} holds {balance}, allocation at {scheduled_time} needs {}",
            allocation.amount
        )));
    }

    let (per_recipient, remainder) = equal_split(allocation.amount, recipients.len())?;
    if per_recipient > 0 {
        for recipient in &recipients {
            bank.send_from_clearing_account_to_account(account, recipient, per_recipient)?;
        }
    }
    if remainder > 0 {
        pool.fund_community_pool(account, remainder)?;
    }

    completed::insert(
        conn,
        &CompletedDistribution {
            clearing_account: account,
            scheduled_time,
            actual_time: block.unix_secs(),
            block_height: block.height,
            amount: allocation.amount,
            recipients: recipients.clone(),
        },
    )?;

    tracing::info!(
        clearing_account = %account,
        amount = allocation.amount,
        recipients = recipients.len(),
        per_recipient,
        remainder,
        "PSE: allocation distributed"
    );
    events.push(PseEvent::AllocationDistributed {
        clearing_account: account,
        scheduled_time,
        actual_time: block.unix_secs(),
        block_height: block.height,
        amount: allocation.amount,
        recipients,
        per_recipient,
        remainder,
    });

    Ok(AllocationOutcome::Paid {
        per_recipient,
        remainder,
    })
}

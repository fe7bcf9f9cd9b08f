//! Schedule traversal.
//!
//! Only the earliest entry is ever considered. An entry stays in the
//! schedule until every one of its allocations has a completion marker, so
//! later entries wait behind an unfinished one.

use pse_db::queries::{completed, schedule};
use pse_types::events::PseEvent;
use pse_types::schedule::{PendingDistributionInfo, ScheduledDistribution};
use rusqlite::Connection;

use crate::Result;

/// Earliest entry if it is due at `now`.
pub fn next_due(conn: &Connection, now: u64) -> Result<Option<ScheduledDistribution>> {
    Ok(schedule::first(conn)?.filter(|entry| entry.timestamp <= now))
}

/// Whether every allocation of `entry` has been paid.
pub fn is_complete(conn: &Connection, entry: &ScheduledDistribution) -> Result<bool> {
    for allocation in &entry.allocations {
        if !completed::exists(conn, allocation.clearing_account, entry.timestamp)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Removes the entry at `timestamp` once all of its allocations are paid.
///
/// Returns `true` if the entry was removed.
pub fn complete_if_done(
    conn: &Connection,
    timestamp: u64,
    events: &mut Vec<PseEvent>,
) -> Result<bool> {
    let Some(entry) = schedule::get(conn, timestamp)? else {
        return Ok(false);
    };
    if !is_complete(conn, &entry)? {
        return Ok(false);
    }
    schedule::remove(conn, timestamp)?;
    events.push(PseEvent::ScheduleEntryCompleted { timestamp });
    tracing::info!(timestamp, "PSE: schedule entry completed");
    Ok(true)
}

/// Every stored entry with its distance from `now`.
pub fn pending(conn: &Connection, now: u64) -> Result<Vec<PendingDistributionInfo>> {
    let now = i128::from(now);
    Ok(schedule::all(conn)?
        .into_iter()
        .map(|entry| {
            let remaining = (i128::from(entry.timestamp) - now)
                .clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64;
            PendingDistributionInfo {
                timestamp: entry.timestamp,
                remaining_seconds: remaining,
                total_amount: entry.total_amount(),
                allocations: entry.allocations,
            }
        })
        .collect())
}

/// Replaces the whole schedule. The caller validates it first.
pub fn replace(conn: &Connection, entries: &[ScheduledDistribution]) -> Result<()> {
    schedule::clear(conn)?;
    for entry in entries {
        schedule::insert(conn, entry)?;
    }
    tracing::info!(entries = entries.len(), "PSE: allocation schedule replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_types::schedule::{ClearingAccountAllocation, CompletedDistribution};
    use pse_types::ClearingAccount;

    fn entry(timestamp: u64) -> ScheduledDistribution {
        ScheduledDistribution {
            timestamp,
            allocations: vec![
                ClearingAccountAllocation {
                    clearing_account: ClearingAccount::Community,
                    amount: 1000,
                },
                ClearingAccountAllocation {
                    clearing_account: ClearingAccount::Team,
                    amount: 300,
                },
            ],
        }
    }

    fn mark(conn: &Connection, account: ClearingAccount, timestamp: u64) {
        completed::insert(
            conn,
            &CompletedDistribution {
                clearing_account: account,
                scheduled_time: timestamp,
                actual_time: timestamp,
                block_height: 1,
                amount: 1,
                recipients: vec![],
            },
        )
        .expect("mark");
    }

    #[test]
    fn test_next_due_only_earliest() {
        let conn = pse_db::open_memory().expect("db");
        replace(&conn, &[entry(100), entry(200)]).expect("replace");
        assert_eq!(next_due(&conn, 99).expect("due"), None);
        assert_eq!(next_due(&conn, 100).expect("due"), Some(entry(100)));
        assert_eq!(next_due(&conn, 500).expect("due"), Some(entry(100)));
    }

    #[test]
    fn test_entry_stays_until_all_marked() {
        let conn = pse_db::open_memory().expect("db");
        replace(&conn, &[entry(100)]).expect("replace");
        let mut events = Vec::new();

        mark(&conn, ClearingAccount::Team, 100);
        assert!(!complete_if_done(&conn, 100, &mut events).expect("complete"));
        assert!(events.is_empty());

        mark(&conn, ClearingAccount::Community, 100);
        assert!(complete_if_done(&conn, 100, &mut events).expect("complete"));
        assert_eq!(events, vec![PseEvent::ScheduleEntryCompleted { timestamp: 100 }]);
        assert_eq!(next_due(&conn, 1000).expect("due"), None);
    }

    #[test]
    fn test_pending_view() {
        let conn = pse_db::open_memory().expect("db");
        replace(&conn, &[entry(100), entry(200)]).expect("replace");
        let view = pending(&conn, 150).expect("pending");
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].remaining_seconds, -50);
        assert_eq!(view[1].remaining_seconds, 50);
        assert_eq!(view[1].total_amount, 1300);
    }
}

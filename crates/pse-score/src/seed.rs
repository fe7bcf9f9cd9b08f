//! Start tracking delegations that predate the module.

use pse_db::queries::{params, time_entries};
use pse_types::delegation::DelegationTimeEntry;
use pse_types::keepers::StakingKeeper;
use rusqlite::Connection;

use crate::Result;

/// Creates a time entry anchored at `now` for every existing delegation of
/// a non-excluded delegator that is not tracked yet.
///
/// Existing entries are left alone, so running it twice is harmless.
/// Returns the number of entries created.
pub fn seed_time_entries<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    now: i64,
) -> Result<usize> {
    let mut seeded = 0;
    for delegation in staking.all_delegations()? {
        if delegation.shares.is_zero() || params::is_excluded(conn, &delegation.delegator)? {
            continue;
        }
        if time_entries::get(conn, &delegation.delegator, &delegation.validator)?.is_some() {
            continue;
        }
        time_entries::set(
            conn,
            &delegation.delegator,
            &delegation.validator,
            &DelegationTimeEntry {
                shares: delegation.shares,
                last_changed_unix_sec: now,
            },
        )?;
        seeded += 1;
    }
    tracing::info!(seeded, now, "PSE: seeded delegation time entries");
    Ok(seeded)
}

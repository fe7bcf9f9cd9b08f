//! Query modules, one per table group.

pub mod community;
pub mod completed;
pub mod params;
pub mod schedule;
pub mod scores;
pub mod settings;
pub mod time_entries;

use rusqlite::Connection;

use crate::Result;

/// Delete all module state except settings. Used before a genesis import.
pub fn clear_all(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "DELETE FROM excluded_addresses;
         DELETE FROM clearing_account_mappings;
         DELETE FROM delegation_time_entries;
         DELETE FROM account_score_snapshots;
         DELETE FROM allocation_schedule;
         DELETE FROM completed_distributions;
         DELETE FROM community_job;
         DELETE FROM community_scores;",
    )?;
    Ok(())
}

//! Allocation schedule storage, keyed by timestamp.

use pse_types::schedule::{ClearingAccountAllocation, ScheduledDistribution};
use rusqlite::{Connection, OptionalExtension};

use crate::{from_json, from_sql_int, to_json, to_sql_int, DbError, Result};

fn decode(timestamp: i64, allocations: &str) -> Result<ScheduledDistribution> {
    Ok(ScheduledDistribution {
        timestamp: from_sql_int(timestamp, "timestamp")?,
        allocations: from_json::<Vec<ClearingAccountAllocation>>(allocations)?,
    })
}

/// Insert a new entry. Fails if the timestamp is taken.
pub fn insert(conn: &Connection, entry: &ScheduledDistribution) -> Result<()> {
    conn.execute(
        "INSERT INTO allocation_schedule (timestamp, allocations) VALUES (?1, ?2)",
        rusqlite::params![
            to_sql_int(entry.timestamp, "timestamp")?,
            to_json(&entry.allocations)?
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!("schedule entry {} exists", entry.timestamp))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// Earliest entry regardless of due time.
pub fn first(conn: &Connection) -> Result<Option<ScheduledDistribution>> {
    let row = conn
        .query_row(
            "SELECT timestamp, allocations FROM allocation_schedule
             ORDER BY timestamp LIMIT 1",
            [],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    row.map(|(ts, json)| decode(ts, &json)).transpose()
}

pub fn get(conn: &Connection, timestamp: u64) -> Result<Option<ScheduledDistribution>> {
    let row = conn
        .query_row(
            "SELECT timestamp, allocations FROM allocation_schedule WHERE timestamp = ?1",
            [to_sql_int(timestamp, "timestamp")?],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;
    row.map(|(ts, json)| decode(ts, &json)).transpose()
}

/// Returns `true` if an entry was removed.
pub fn remove(conn: &Connection, timestamp: u64) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM allocation_schedule WHERE timestamp = ?1",
        [to_sql_int(timestamp, "timestamp")?],
    )?;
    Ok(changed > 0)
}

/// All entries in ascending timestamp order.
pub fn all(conn: &Connection) -> Result<Vec<ScheduledDistribution>> {
    let mut stmt =
        conn.prepare("SELECT timestamp, allocations FROM allocation_schedule ORDER BY timestamp")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|(ts, json)| decode(*ts, json)).collect()
}

pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM allocation_schedule", [])?;
    Ok(())
}

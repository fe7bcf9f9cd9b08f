//! Rolled-up score snapshots per delegator.

use pse_types::delegation::AccountScore;
use pse_types::AccAddress;
use rusqlite::{Connection, OptionalExtension};

use crate::{acc_from_blob, parse_u128, DbError, Result};

/// Snapshot of a delegator, zero when none is stored.
pub fn get(conn: &Connection, delegator: &AccAddress) -> Result<u128> {
    let text: Option<String> = conn
        .query_row(
            "SELECT score FROM account_score_snapshots WHERE delegator = ?1",
            [delegator.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;
    text.map_or(Ok(0), |t| parse_u128(&t))
}

/// Overwrite a snapshot. Zero removes the row.
pub fn set(conn: &Connection, delegator: &AccAddress, score: u128) -> Result<()> {
    if score == 0 {
        return remove(conn, delegator);
    }
    conn.execute(
        "INSERT OR REPLACE INTO account_score_snapshots (delegator, score) VALUES (?1, ?2)",
        rusqlite::params![delegator.as_bytes().as_slice(), score.to_string()],
    )?;
    Ok(())
}

/// Add to a snapshot and return the new value.
pub fn add(conn: &Connection, delegator: &AccAddress, delta: u128) -> Result<u128> {
    let updated = get(conn, delegator)?
        .checked_add(delta)
        .ok_or_else(|| DbError::Constraint(format!("score overflow for {delegator}")))?;
    set(conn, delegator, updated)?;
    Ok(updated)
}

pub fn remove(conn: &Connection, delegator: &AccAddress) -> Result<()> {
    conn.execute(
        "DELETE FROM account_score_snapshots WHERE delegator = ?1",
        [delegator.as_bytes().as_slice()],
    )?;
    Ok(())
}

pub fn clear(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM account_score_snapshots", [])?;
    Ok(())
}

/// Every snapshot in delegator order.
pub fn all(conn: &Connection) -> Result<Vec<AccountScore>> {
    let mut stmt =
        conn.prepare("SELECT delegator, score FROM account_score_snapshots ORDER BY delegator")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(delegator, score)| {
            Ok(AccountScore {
                delegator: acc_from_blob(&delegator)?,
                score: parse_u128(&score)?,
            })
        })
        .collect()
}

//! Delegation time entries, keyed by (delegator, validator).

use pse_types::delegation::{DelegationTimeEntry, DelegationTimeEntryRecord};
use pse_types::{AccAddress, Dec, ValAddress};
use rusqlite::{Connection, OptionalExtension};

use crate::{acc_from_blob, val_from_blob, DbError, Result};

fn parse_shares(text: &str) -> Result<Dec> {
    text.parse()
        .map_err(|e: pse_types::math::DecError| DbError::Serialization(e.to_string()))
}

pub fn get(
    conn: &Connection,
    delegator: &AccAddress,
    validator: &ValAddress,
) -> Result<Option<DelegationTimeEntry>> {
    let row = conn
        .query_row(
            "SELECT shares, last_changed_unix_sec FROM delegation_time_entries
             WHERE delegator = ?1 AND validator = ?2",
            rusqlite::params![delegator.as_bytes().as_slice(), validator.as_bytes().as_slice()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .optional()?;
    row.map(|(shares, last_changed_unix_sec)| {
        Ok(DelegationTimeEntry {
            shares: parse_shares(&shares)?,
            last_changed_unix_sec,
        })
    })
    .transpose()
}

/// Insert or overwrite an entry.
pub fn set(
    conn: &Connection,
    delegator: &AccAddress,
    validator: &ValAddress,
    entry: &DelegationTimeEntry,
) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO delegation_time_entries
         (delegator, validator, shares, last_changed_unix_sec) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            delegator.as_bytes().as_slice(),
            validator.as_bytes().as_slice(),
            entry.shares.to_string(),
            entry.last_changed_unix_sec,
        ],
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, delegator: &AccAddress, validator: &ValAddress) -> Result<()> {
    conn.execute(
        "DELETE FROM delegation_time_entries WHERE delegator = ?1 AND validator = ?2",
        rusqlite::params![delegator.as_bytes().as_slice(), validator.as_bytes().as_slice()],
    )?;
    Ok(())
}

/// Removes every entry of a delegator. Returns how many were removed.
pub fn remove_for_delegator(conn: &Connection, delegator: &AccAddress) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM delegation_time_entries WHERE delegator = ?1",
        [delegator.as_bytes().as_slice()],
    )?)
}

/// Entries of one delegator, ordered by validator.
pub fn for_delegator(
    conn: &Connection,
    delegator: &AccAddress,
) -> Result<Vec<(ValAddress, DelegationTimeEntry)>> {
    let mut stmt = conn.prepare(
        "SELECT validator, shares, last_changed_unix_sec FROM delegation_time_entries
         WHERE delegator = ?1 ORDER BY validator",
    )?;
    let rows = stmt
        .query_map([delegator.as_bytes().as_slice()], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(validator, shares, last_changed_unix_sec)| {
            Ok((
                val_from_blob(&validator)?,
                DelegationTimeEntry {
                    shares: parse_shares(&shares)?,
                    last_changed_unix_sec,
                },
            ))
        })
        .collect()
}

/// Every entry in (delegator, validator) order.
pub fn all(conn: &Connection) -> Result<Vec<DelegationTimeEntryRecord>> {
    let mut stmt = conn.prepare(
        "SELECT delegator, validator, shares, last_changed_unix_sec FROM delegation_time_entries
         ORDER BY delegator, validator",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, Vec<u8>>(0)?,
                row.get::<_, Vec<u8>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(delegator, validator, shares, last_changed_unix_sec)| {
            Ok(DelegationTimeEntryRecord {
                delegator: acc_from_blob(&delegator)?,
                validator: val_from_blob(&validator)?,
                entry: DelegationTimeEntry {
                    shares: parse_shares(&shares)?,
                    last_changed_unix_sec,
                },
            })
        })
        .collect()
}

/// Moves every entry's clock to `now`.
pub fn reset_all_clocks(conn: &Connection, now: i64) -> Result<usize> {
    Ok(conn.execute(
        "UPDATE delegation_time_entries SET last_changed_unix_sec = ?1",
        [now],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_types::ADDRESS_LEN;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn del(b: u8) -> AccAddress {
        AccAddress::new([b; ADDRESS_LEN])
    }

    fn val(b: u8) -> ValAddress {
        ValAddress::new([b; ADDRESS_LEN])
    }

    fn entry(shares: u64, at: i64) -> DelegationTimeEntry {
        DelegationTimeEntry {
            shares: Dec::from_int(shares),
            last_changed_unix_sec: at,
        }
    }

    #[test]
    fn test_set_get_remove() {
        let conn = test_db();
        assert_eq!(get(&conn, &del(1), &val(1)).expect("get"), None);

        set(&conn, &del(1), &val(1), &entry(100, 5)).expect("set");
        assert_eq!(get(&conn, &del(1), &val(1)).expect("get"), Some(entry(100, 5)));

        set(&conn, &del(1), &val(1), &entry(150, 9)).expect("overwrite");
        assert_eq!(get(&conn, &del(1), &val(1)).expect("get"), Some(entry(150, 9)));

        remove(&conn, &del(1), &val(1)).expect("remove");
        assert_eq!(get(&conn, &del(1), &val(1)).expect("get"), None);
    }

    #[test]
    fn test_for_delegator_ordered() {
        let conn = test_db();
        set(&conn, &del(1), &val(3), &entry(3, 0)).expect("set");
        set(&conn, &del(1), &val(1), &entry(1, 0)).expect("set");
        set(&conn, &del(2), &val(2), &entry(2, 0)).expect("set");

        let entries = for_delegator(&conn, &del(1)).expect("list");
        let validators: Vec<_> = entries.iter().map(|(v, _)| *v).collect();
        assert_eq!(validators, vec![val(1), val(3)]);

        assert_eq!(remove_for_delegator(&conn, &del(1)).expect("remove"), 2);
        assert_eq!(all(&conn).expect("all").len(), 1);
    }

    #[test]
    fn test_reset_all_clocks() {
        let conn = test_db();
        set(&conn, &del(1), &val(1), &entry(1, 10)).expect("set");
        set(&conn, &del(2), &val(1), &entry(2, 20)).expect("set");
        assert_eq!(reset_all_clocks(&conn, 99).expect("reset"), 2);
        assert!(all(&conn)
            .expect("all")
            .iter()
            .all(|r| r.entry.last_changed_unix_sec == 99));
    }

    #[test]
    fn test_fractional_shares_preserved() {
        let conn = test_db();
        let e = DelegationTimeEntry {
            shares: "1234.000000000000000007".parse().expect("dec"),
            last_changed_unix_sec: 1,
        };
        set(&conn, &del(4), &val(4), &e).expect("set");
        assert_eq!(get(&conn, &del(4), &val(4)).expect("get"), Some(e));
    }
}

//! Completion markers for paid allocations.

use pse_types::schedule::CompletedDistribution;
use pse_types::ClearingAccount;
use rusqlite::{Connection, OptionalExtension};

use crate::{from_json, to_json, to_sql_int, DbError, Result};

pub fn exists(conn: &Connection, account: ClearingAccount, scheduled_time: u64) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM completed_distributions
             WHERE clearing_account = ?1 AND scheduled_time = ?2",
            rusqlite::params![account.name(), to_sql_int(scheduled_time, "scheduled_time")?],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Record a completion. A second record for the same key is rejected.
pub fn insert(conn: &Connection, record: &CompletedDistribution) -> Result<()> {
    conn.execute(
        "INSERT INTO completed_distributions (clearing_account, scheduled_time, record)
         VALUES (?1, ?2, ?3)",
        rusqlite::params![
            record.clearing_account.name(),
            to_sql_int(record.scheduled_time, "scheduled_time")?,
            to_json(record)?,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(f, _)
            if f.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            DbError::Constraint(format!(
                "{} at {} already completed",
                record.clearing_account, record.scheduled_time
            ))
        }
        other => DbError::Sqlite(other),
    })?;
    Ok(())
}

/// All records, optionally for one account, ordered by (account, time).
pub fn list(
    conn: &Connection,
    account: Option<ClearingAccount>,
) -> Result<Vec<CompletedDistribution>> {
    let mut stmt = conn.prepare(
        "SELECT record FROM completed_distributions
         WHERE ?1 IS NULL OR clearing_account = ?1
         ORDER BY clearing_account, scheduled_time",
    )?;
    let rows = stmt
        .query_map([account.map(|a| a.name())], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|json| from_json(json)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pse_types::{AccAddress, ADDRESS_LEN};

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn record(account: ClearingAccount, scheduled_time: u64) -> CompletedDistribution {
        CompletedDistribution {
            clearing_account: account,
            scheduled_time,
            actual_time: scheduled_time + 3,
            block_height: 7,
            amount: 500,
            recipients: vec![AccAddress::new([1; ADDRESS_LEN])],
        }
    }

    #[test]
    fn test_marker_roundtrip() {
        let conn = test_db();
        assert!(!exists(&conn, ClearingAccount::Team, 100).expect("exists"));
        insert(&conn, &record(ClearingAccount::Team, 100)).expect("insert");
        assert!(exists(&conn, ClearingAccount::Team, 100).expect("exists"));
        assert!(!exists(&conn, ClearingAccount::Team, 200).expect("exists"));
    }

    #[test]
    fn test_double_completion_rejected() {
        let conn = test_db();
        insert(&conn, &record(ClearingAccount::Alliance, 100)).expect("insert");
        assert!(matches!(
            insert(&conn, &record(ClearingAccount::Alliance, 100)),
            Err(DbError::Constraint(_))
        ));
    }

    #[test]
    fn test_list_filters_by_account() {
        let conn = test_db();
        insert(&conn, &record(ClearingAccount::Team, 100)).expect("insert");
        insert(&conn, &record(ClearingAccount::Alliance, 100)).expect("insert");
        insert(&conn, &record(ClearingAccount::Team, 50)).expect("insert");

        assert_eq!(list(&conn, None).expect("list").len(), 3);
        let team = list(&conn, Some(ClearingAccount::Team)).expect("list");
        assert_eq!(
            team,
            vec![
                record(ClearingAccount::Team, 50),
                record(ClearingAccount::Team, 100)
            ]
        );
    }
}

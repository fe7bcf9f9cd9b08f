//! Community job state and its frozen score table.

use pse_types::community::CommunityDistributionJob;
use pse_types::delegation::AccountScore;
use pse_types::AccAddress;
use rusqlite::{Connection, OptionalExtension};

use crate::{acc_from_blob, from_sql_int, parse_u128, to_sql_int, Result};

type JobRow = (i64, i64, String, i64, Option<Vec<u8>>, i64, i64);

/// The in-flight job, if any.
pub fn job(conn: &Connection) -> Result<Option<CommunityDistributionJob>> {
    let row: Option<JobRow> = conn
        .query_row(
            "SELECT scheduled_at, total_amount, total_score, leftover, next_address,
                    total_entries, processed_entries
             FROM community_job WHERE id = 1",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .optional()?;

    let Some((scheduled_at, total_amount, total_score, leftover, next, total, processed)) = row
    else {
        return Ok(None);
    };
    Ok(Some(CommunityDistributionJob {
        scheduled_at: from_sql_int(scheduled_at, "scheduled_at")?,
        total_amount: from_sql_int(total_amount, "total_amount")?,
        total_score: parse_u128(&total_score)?,
        leftover: from_sql_int(leftover, "leftover")?,
        next_address: next.as_deref().map(acc_from_blob).transpose()?,
        total_entries: from_sql_int(total, "total_entries")?,
        processed_entries: from_sql_int(processed, "processed_entries")?,
    }))
}

/// Create or overwrite the job.
pub fn set_job(conn: &Connection, job: &CommunityDistributionJob) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO community_job
         (id, scheduled_at, total_amount, total_score, leftover, next_address,
          total_entries, processed_entries)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            to_sql_int(job.scheduled_at, "scheduled_at")?,
            to_sql_int(job.total_amount, "total_amount")?,
            job.total_score.to_string(),
            to_sql_int(job.leftover, "leftover")?,
            job.next_address.as_ref().map(|a| a.as_bytes().to_vec()),
            to_sql_int(job.total_entries, "total_entries")?,
            to_sql_int(job.processed_entries, "processed_entries")?,
        ],
    )?;
    Ok(())
}

pub fn remove_job(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM community_job", [])?;
    Ok(())
}

pub fn insert_score(conn: &Connection, delegator: &AccAddress, score: u128) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO community_scores (delegator, score) VALUES (?1, ?2)",
        rusqlite::params![delegator.as_bytes().as_slice(), score.to_string()],
    )?;
    Ok(())
}

/// Up to `limit` scores strictly after `cursor`, in delegator order.
pub fn scores_after(
    conn: &Connection,
    cursor: Option<&AccAddress>,
    limit: u64,
) -> Result<Vec<AccountScore>> {
    let mut stmt = conn.prepare(
        "SELECT delegator, score FROM community_scores
         WHERE ?1 IS NULL OR delegator > ?1
         ORDER BY delegator LIMIT ?2",
    )?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(
            rusqlite::params![cursor.map(|a| a.as_bytes().to_vec()), limit],
            |row| Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, String>(1)?)),
        )?
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

pub fn all_scores(conn: &Connection) -> Result<Vec<AccountScore>> {
    scores_after(conn, None, u64::MAX)
}

pub fn score_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM community_scores", [], |row| row.get(0))?;
    from_sql_int(count, "score count")
}

pub fn clear_scores(conn: &Connection) -> Result<()> {
    conn.execute("DELETE FROM community_scores", [])?;
    Ok(())
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

    fn sample_job() -> CommunityDistributionJob {
        CommunityDistributionJob {
            scheduled_at: 1_700_000_000,
            total_amount: 1000,
            total_score: 24_000_000,
            leftover: 1000,
            next_address: None,
            total_entries: 3,
            processed_entries: 0,
        }
    }

    #[test]
    fn test_job_roundtrip() {
        let conn = test_db();
        assert_eq!(job(&conn).expect("job"), None);

        let mut j = sample_job();
        set_job(&conn, &j).expect("set");
        assert_eq!(job(&conn).expect("job"), Some(j.clone()));

        j.next_address = Some(del(4));
        j.processed_entries = 1;
        j.leftover = 634;
        set_job(&conn, &j).expect("update");
        assert_eq!(job(&conn).expect("job"), Some(j));

        remove_job(&conn).expect("remove");
        assert_eq!(job(&conn).expect("job"), None);
    }

    #[test]
    fn test_scores_after_cursor() {
        let conn = test_db();
        for b in [5u8, 1, 3, 4, 2] {
            insert_score(&conn, &del(b), u128::from(b) * 10).expect("insert");
        }
        assert_eq!(score_count(&conn).expect("count"), 5);

        let first = scores_after(&conn, None, 2).expect("page");
        assert_eq!(
            first.iter().map(|s| s.delegator).collect::<Vec<_>>(),
            vec![del(1), del(2)]
        );

        let second = scores_after(&conn, Some(&del(2)), 2).expect("page");
        assert_eq!(
            second.iter().map(|s| s.delegator).collect::<Vec<_>>(),
            vec![del(3), del(4)]
        );

        let rest = scores_after(&conn, Some(&del(4)), 100).expect("page");
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].score, 50);

        assert!(scores_after(&conn, Some(&del(5)), 100).expect("page").is_empty());
    }

    #[test]
    fn test_clear_scores() {
        let conn = test_db();
        insert_score(&conn, &del(1), 1).expect("insert");
        clear_scores(&conn).expect("clear");
        assert_eq!(score_count(&conn).expect("count"), 0);
        assert!(all_scores(&conn).expect("all").is_empty());
    }
}

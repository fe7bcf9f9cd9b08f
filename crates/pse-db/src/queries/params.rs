//! Exclusion list and recipient mapping queries.

use pse_types::schedule::ClearingAccountMapping;
use pse_types::{AccAddress, ClearingAccount};
use rusqlite::{Connection, OptionalExtension};

use crate::{acc_from_blob, DbError, Result};

pub fn is_excluded(conn: &Connection, address: &AccAddress) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM excluded_addresses WHERE address = ?1",
            [address.as_bytes().as_slice()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Returns `true` if the address was newly added.
pub fn add_excluded(conn: &Connection, address: &AccAddress) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO excluded_addresses (address) VALUES (?1)",
        [address.as_bytes().as_slice()],
    )?;
    Ok(changed > 0)
}

/// Returns `true` if the address was present.
pub fn remove_excluded(conn: &Connection, address: &AccAddress) -> Result<bool> {
    let changed = conn.execute(
        "DELETE FROM excluded_addresses WHERE address = ?1",
        [address.as_bytes().as_slice()],
    )?;
    Ok(changed > 0)
}

/// All excluded addresses in byte order.
pub fn excluded(conn: &Connection) -> Result<Vec<AccAddress>> {
    let mut stmt = conn.prepare("SELECT address FROM excluded_addresses ORDER BY address")?;
    let rows = stmt
        .query_map([], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.iter().map(|b| acc_from_blob(b)).collect()
}

/// Replace every mapping.
pub fn replace_mappings(conn: &Connection, mappings: &[ClearingAccountMapping]) -> Result<()> {
    conn.execute("DELETE FROM clearing_account_mappings", [])?;
    let mut stmt = conn.prepare(
        "INSERT INTO clearing_account_mappings (clearing_account, position, recipient)
         VALUES (?1, ?2, ?3)",
    )?;
    for mapping in mappings {
        for (position, recipient) in mapping.recipient_addresses.iter().enumerate() {
            stmt.execute(rusqlite::params![
                mapping.clearing_account.name(),
                position as i64,
                recipient.as_bytes().as_slice(),
            ])
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(f, _)
                    if f.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DbError::Constraint(format!(
                        "duplicate recipient {recipient} for {}",
                        mapping.clearing_account
                    ))
                }
                other => DbError::Sqlite(other),
            })?;
        }
    }
    Ok(())
}

/// Recipients of one account in configured order. `None` when unmapped.
pub fn mapping(conn: &Connection, account: ClearingAccount) -> Result<Option<ClearingAccountMapping>> {
    let mut stmt = conn.prepare(
        "SELECT recipient FROM clearing_account_mappings
         WHERE clearing_account = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([account.name()], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Ok(None);
    }
    let recipient_addresses = rows
        .iter()
        .map(|b| acc_from_blob(b))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(ClearingAccountMapping {
        clearing_account: account,
        recipient_addresses,
    }))
}

/// All mappings in canonical account order.
pub fn mappings(conn: &Connection) -> Result<Vec<ClearingAccountMapping>> {
    let mut out = Vec::new();
    for account in ClearingAccount::ALL {
        if let Some(m) = mapping(conn, account)? {
            out.push(m);
        }
    }
    Ok(out)
}

//! # pse-db
//!
//! SQLite persistence for the PSE module.
//!
//! Holds the score ledger (time entries and rolled-up snapshots), the
//! allocation schedule, recipient mappings, the exclusion list, Community job
//! state and completion markers.
//!
//! ## Storage conventions
//!
//! - Addresses are stored as 20-byte BLOBs, so `ORDER BY` gives byte-wise
//!   order and every node iterates identically
//! - Scores are `u128` and stored as decimal TEXT; shares as [`Dec`] TEXT
//! - Amounts and timestamps are INTEGER, rejected if they exceed `i64`
//! - Schema version stored in `PRAGMA user_version`
//!
//! Every function takes a `&Connection`. Callers pass a
//! `rusqlite::Transaction` (which derefs to `Connection`) to make a group of
//! writes atomic.
//!
//! [`Dec`]: pse_types::Dec

pub mod migrations;
pub mod queries;
pub mod schema;

use std::path::Path;

use pse_types::{AccAddress, ValAddress};
use rusqlite::Connection;

/// Current schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// Database error types.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration failed: {0}")]
    Migration(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Open or create the module database at the given path.
pub fn open(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing and ephemeral nodes).
pub fn open_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    migrations::run(&conn)?;
    Ok(conn)
}

/// Configure SQLite pragmas.
fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;
         PRAGMA synchronous = NORMAL;
         PRAGMA cache_size = -8000;",
    )?;
    Ok(())
}

pub(crate) fn to_sql_int(value: u64, what: &str) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| DbError::Constraint(format!("{what} {value} exceeds storable range")))
}

pub(crate) fn from_sql_int(value: i64, what: &str) -> Result<u64> {
    u64::try_from(value).map_err(|_| DbError::Serialization(format!("negative {what}: {value}")))
}

pub(crate) fn parse_u128(text: &str) -> Result<u128> {
    text.parse()
        .map_err(|e: std::num::ParseIntError| DbError::Serialization(format!("score '{text}': {e}")))
}

pub(crate) fn acc_from_blob(bytes: &[u8]) -> Result<AccAddress> {
    AccAddress::from_slice(bytes).map_err(|e| DbError::Serialization(format!("account address: {e}")))
}

pub(crate) fn val_from_blob(bytes: &[u8]) -> Result<ValAddress> {
    ValAddress::from_slice(bytes)
        .map_err(|e| DbError::Serialization(format!("validator address: {e}")))
}

pub(crate) fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| DbError::Serialization(e.to_string()))
}

pub(crate) fn from_json<T: serde::de::DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| DbError::Serialization(e.to_string()))
}

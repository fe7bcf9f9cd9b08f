//! SQL schema definitions.

/// Complete schema for the v1 database.
pub const SCHEMA_V1: &str = r#"
-- ============================================================
-- Settings and parameters
-- ============================================================

CREATE TABLE IF NOT EXISTS settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS excluded_addresses (
    address BLOB PRIMARY KEY
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS clearing_account_mappings (
    clearing_account TEXT NOT NULL,
    position INTEGER NOT NULL,
    recipient BLOB NOT NULL,
    PRIMARY KEY (clearing_account, position),
    UNIQUE (clearing_account, recipient)
) WITHOUT ROWID;

-- ============================================================
-- Score ledger
-- ============================================================

CREATE TABLE IF NOT EXISTS delegation_time_entries (
    delegator BLOB NOT NULL,
    validator BLOB NOT NULL,
    shares TEXT NOT NULL,
    last_changed_unix_sec INTEGER NOT NULL,
    PRIMARY KEY (delegator, validator)
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS account_score_snapshots (
    delegator BLOB PRIMARY KEY,
    score TEXT NOT NULL
) WITHOUT ROWID;

-- ============================================================
-- Schedule and completion markers
-- ============================================================

CREATE TABLE IF NOT EXISTS allocation_schedule (
    timestamp INTEGER PRIMARY KEY,
    allocations TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS completed_distributions (
    clearing_account TEXT NOT NULL,
    scheduled_time INTEGER NOT NULL,
    record TEXT NOT NULL,
    PRIMARY KEY (clearing_account, scheduled_time)
) WITHOUT ROWID;

-- ============================================================
-- Community distribution job
-- ============================================================

CREATE TABLE IF NOT EXISTS community_job (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    scheduled_at INTEGER NOT NULL,
    total_amount INTEGER NOT NULL,
    total_score TEXT NOT NULL,
    leftover INTEGER NOT NULL,
    next_address BLOB,
    total_entries INTEGER NOT NULL,
    processed_entries INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS community_scores (
    delegator BLOB PRIMARY KEY,
    score TEXT NOT NULL
) WITHOUT ROWID;
"#;

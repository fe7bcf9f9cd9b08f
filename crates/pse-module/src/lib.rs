//! # pse-module
//!
//! Host-facing facade of the PSE module.
//!
//! [`PseModule`] owns the module database and the three collaborators
//! (staking, bank, community pool). Every state transition runs in one
//! SQLite transaction: it commits and returns its events on success, or
//! rolls back and returns the error.
//!
//! ## Modules
//!
//! - [`config`]: TOML configuration
//! - [`block`]: Per-block distribution step
//! - [`hooks`]: Staking change notifications and snapshot seeding
//! - [`governance`]: Authority-gated messages
//! - [`query`]: Read-only views
//! - [`genesis`]: State import and export

pub mod block;
pub mod config;
pub mod genesis;
pub mod governance;
pub mod hooks;
pub mod query;

use pse_db::DbError;
use pse_distribution::DistributionError;
use pse_score::ScoreError;
use pse_types::keepers::{BankKeeper, CommunityPool, KeeperError, StakingKeeper};
use pse_types::{AccAddress, ValidationError};
use rusqlite::Connection;

pub use config::ModuleConfig;

/// Error types for module operations.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// Rejected governance input or genesis state.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("collaborator: {0}")]
    Keeper(#[from] KeeperError),

    /// A governance message came from someone other than the authority.
    #[error("unauthorized: expected {expected}, got {got}")]
    Unauthorized { expected: String, got: String },

    /// The request cannot be applied while a Community job runs.
    #[error("community distribution job in progress (scheduled at {0})")]
    JobInProgress(u64),

    #[error("config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience result type for module operations.
pub type Result<T> = std::result::Result<T, ModuleError>;

/// The PSE module bound to its database and collaborators.
pub struct PseModule<S, B, P> {
    conn: Connection,
    authority: AccAddress,
    batch_size: u64,
    staking: S,
    bank: B,
    pool: P,
}

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    /// Wraps an already opened and migrated database.
    pub fn new(
        conn: Connection,
        config: &ModuleConfig,
        staking: S,
        bank: B,
        pool: P,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            conn,
            authority: config.authority_address()?,
            batch_size: config.community_batch_size,
            staking,
            bank,
            pool,
        })
    }

    /// Opens the database named by `config` (in-memory when unset).
    pub fn open(config: &ModuleConfig, staking: S, bank: B, pool: P) -> Result<Self> {
        let conn = match config.database_path() {
            Some(path) => pse_db::open(&path)?,
            None => pse_db::open_memory()?,
        };
        tracing::info!(
            authority = %config.authority,
            batch_size = config.community_batch_size,
            "PSE: module opened"
        );
        Self::new(conn, config, staking, bank, pool)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn authority(&self) -> AccAddress {
        self.authority
    }

    pub fn batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn staking(&self) -> &S {
        &self.staking
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn pool(&self) -> &P {
        &self.pool
    }

    fn check_authority(&self, sender: &str) -> Result<()> {
        match AccAddress::parse(sender) {
            Ok(address) if address == self.authority => Ok(()),
            _ => Err(ModuleError::Unauthorized {
                expected: self.authority.to_string(),
                got: sender.to_string(),
            }),
        }
    }

    /// Runs `f` in one transaction. Dropping the transaction on error rolls
    /// every write back.
    fn in_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection, &mut S, &mut B, &mut P) -> Result<T>,
    {
        let tx = self.conn.transaction()?;
        let value = f(&tx, &mut self.staking, &mut self.bank, &mut self.pool)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use pse_types::testutil::MockChain;
    use pse_types::ADDRESS_LEN;

    pub type TestModule = PseModule<MockChain, MockChain, MockChain>;

    pub fn authority() -> AccAddress {
        AccAddress::new([0xaa; ADDRESS_LEN])
    }

    pub fn module(chain: &MockChain) -> TestModule {
        let config = ModuleConfig {
            authority: authority().to_string(),
            ..ModuleConfig::default()
        };
        PseModule::open(&config, chain.clone(), chain.clone(), chain.clone()).expect("module")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pse_types::testutil::MockChain;

    #[test]
    fn test_open_rejects_invalid_config() {
        let chain = MockChain::new();
        let config = ModuleConfig::default();
        let result = PseModule::open(&config, chain.clone(), chain.clone(), chain);
        assert!(matches!(result, Err(ModuleError::Config(_))));
    }

    #[test]
    fn test_authority_check() {
        let m = module(&MockChain::new());
        assert!(m.check_authority(&authority().to_string()).is_ok());
        assert!(m.check_authority(&authority().to_string().to_uppercase()).is_ok());
        assert!(matches!(
            m.check_authority("bb".repeat(20).as_str()),
            Err(ModuleError::Unauthorized { .. })
        ));
        assert!(matches!(
            m.check_authority("garbage"),
            Err(ModuleError::Unauthorized { .. })
        ));
    }
}

//! Module configuration (TOML).

use std::path::{Path, PathBuf};

use pse_types::{AccAddress, DEFAULT_COMMUNITY_BATCH_SIZE};
use serde::{Deserialize, Serialize};

use crate::{ModuleError, Result};

/// Complete module configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Hex address allowed to send governance messages.
    #[serde(default)]
    pub authority: String,
    /// Delegators paid per block while a Community job runs.
    #[serde(default = "default_batch_size")]
    pub community_batch_size: u64,
    /// Storage settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Database configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Empty = in-memory.
    #[serde(default)]
    pub path: String,
}

fn default_batch_size() -> u64 {
    DEFAULT_COMMUNITY_BATCH_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            authority: String::new(),
            community_batch_size: default_batch_size(),
            database: DatabaseConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl ModuleConfig {
    /// Load configuration from `path`.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "PSE: no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ModuleError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ModuleError::Config(e.to_string()))
    }

    /// Rejects a zero batch size and a malformed authority.
    pub fn validate(&self) -> Result<()> {
        if self.community_batch_size == 0 {
            return Err(ModuleError::Config(
                "community_batch_size must be positive".into(),
            ));
        }
        self.authority_address()?;
        Ok(())
    }

    pub fn authority_address(&self) -> Result<AccAddress> {
        AccAddress::parse(&self.authority)
            .map_err(|e| ModuleError::Config(format!("authority: {e}")))
    }

    /// Database file, `None` for in-memory.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.database.path.is_empty() {
            None
        } else {
            Some(PathBuf::from(&self.database.path))
        }
    }
}

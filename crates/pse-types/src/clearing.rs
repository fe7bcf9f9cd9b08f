//! The six module-controlled clearing accounts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A module-controlled account that holds tokens awaiting distribution.
///
/// Variant order is the canonical order used for iteration and storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClearingAccount {
    #[serde(rename = "pse_community")]
    Community,
    #[serde(rename = "pse_foundation")]
    Foundation,
    #[serde(rename = "pse_alliance")]
    Alliance,
    #[serde(rename = "pse_partnership")]
    Partnership,
    #[serde(rename = "pse_investors")]
    Investors,
    #[serde(rename = "pse_team")]
    Team,
}

impl ClearingAccount {
    pub const ALL: [ClearingAccount; 6] = [
        ClearingAccount::Community,
        ClearingAccount::Foundation,
        ClearingAccount::Alliance,
        ClearingAccount::Partnership,
        ClearingAccount::Investors,
        ClearingAccount::Team,
    ];

    /// Accounts paid through recipient mappings.
    pub fn non_community() -> impl Iterator<Item = ClearingAccount> {
        Self::ALL.into_iter().filter(|a| !a.is_community())
    }

    pub fn is_community(&self) -> bool {
        matches!(self, ClearingAccount::Community)
    }

    /// Module account name.
    pub fn name(&self) -> &'static str {
        match self {
            ClearingAccount::Community => "pse_community",
            ClearingAccount::Foundation => "pse_foundation",
            ClearingAccount::Alliance => "pse_alliance",
            ClearingAccount::Partnership => "pse_partnership",
            ClearingAccount::Investors => "pse_investors",
            ClearingAccount::Team => "pse_team",
        }
    }
}

impl fmt::Display for ClearingAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClearingAccount {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| ValidationError::UnknownClearingAccount(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for account in ClearingAccount::ALL {
            assert_eq!(account.name().parse::<ClearingAccount>(), Ok(account));
            let json = serde_json::to_string(&account).expect("serialize");
            assert_eq!(json, format!("\"{}\"", account.name()));
        }
    }

    #[test]
    fn test_non_community_excludes_community() {
        let accounts: Vec<_> = ClearingAccount::non_community().collect();
        assert_eq!(accounts.len(), 5);
        assert!(!accounts.contains(&ClearingAccount::Community));
    }

    #[test]
    fn test_unknown_name() {
        assert!("pse_treasury".parse::<ClearingAccount>().is_err());
    }
}

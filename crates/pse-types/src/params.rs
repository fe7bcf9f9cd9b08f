//! Module parameters and governance messages.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::schedule::{
    validate_mappings, validate_schedule, ClearingAccountMapping, ScheduledDistribution,
};
use crate::{AccAddress, ClearingAccount, ValidationError};

/// Governance-controlled parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    /// Delegators that never accumulate score.
    pub excluded_addresses: Vec<AccAddress>,
    pub clearing_account_mappings: Vec<ClearingAccountMapping>,
}

impl Params {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = BTreeSet::new();
        for address in &self.excluded_addresses {
            if !seen.insert(address) {
                return Err(ValidationError::DuplicateAddress(address.to_string()));
            }
        }
        validate_mappings(&self.clearing_account_mappings)
    }
}

fn parse_unique(list: &[String]) -> Result<Vec<AccAddress>, ValidationError> {
    let mut seen = BTreeSet::new();
    let mut parsed = Vec::with_capacity(list.len());
    for raw in list {
        let address = AccAddress::parse(raw)?;
        if !seen.insert(address) {
            return Err(ValidationError::DuplicateAddress(raw.clone()));
        }
        parsed.push(address);
    }
    Ok(parsed)
}

/// Adds and removes addresses from the exclusion list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateExcludedAddresses {
    pub authority: String,
    #[serde(default)]
    pub addresses_to_add: Vec<String>,
    #[serde(default)]
    pub addresses_to_remove: Vec<String>,
}

/// Parsed form of [`MsgUpdateExcludedAddresses`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExclusionUpdate {
    pub add: Vec<AccAddress>,
    pub remove: Vec<AccAddress>,
}

impl MsgUpdateExcludedAddresses {
    /// Stateless checks. Returns the parsed address lists.
    pub fn validate_basic(&self) -> Result<ExclusionUpdate, ValidationError> {
        if self.addresses_to_add.is_empty() && self.addresses_to_remove.is_empty() {
            return Err(ValidationError::EmptyRequest(
                "no addresses to add or remove".into(),
            ));
        }
        let add = parse_unique(&self.addresses_to_add)?;
        let remove = parse_unique(&self.addresses_to_remove)?;
        let add_set: BTreeSet<_> = add.iter().collect();
        if let Some(both) = remove.iter().find(|a| add_set.contains(a)) {
            return Err(ValidationError::AddressInBothLists(both.to_string()));
        }
        Ok(ExclusionUpdate { add, remove })
    }
}

/// Replaces all recipient mappings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateClearingAccountMappings {
    pub authority: String,
    pub mappings: Vec<ClearingAccountMapping>,
}

impl MsgUpdateClearingAccountMappings {
    /// Requires exactly one mapping per non-Community account.
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        validate_mappings(&self.mappings)?;
        let present: BTreeSet<ClearingAccount> =
            self.mappings.iter().map(|m| m.clearing_account).collect();
        if let Some(missing) = ClearingAccount::non_community().find(|a| !present.contains(a)) {
            return Err(ValidationError::MissingClearingAccount(missing));
        }
        Ok(())
    }
}

/// Replaces the allocation schedule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgUpdateAllocationSchedule {
    pub authority: String,
    pub scheduled_distributions: Vec<ScheduledDistribution>,
}

impl MsgUpdateAllocationSchedule {
    pub fn validate_basic(&self) -> Result<(), ValidationError> {
        validate_schedule(&self.scheduled_distributions)
    }
}

/// Pauses or resumes block-time distribution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgSetDistributionsDisabled {
    pub authority: String,
    pub disabled: bool,
}

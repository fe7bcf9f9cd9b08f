//! Score ledger reads.
//!
//! ```text
//! score(d) = snapshot(d) + Σ_v tokens(shares(d,v)) × (now - last_changed(d,v))
//! ```
//!
//! Token conversion truncates at the current validator exchange rate.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use pse_db::queries::{params, scores, time_entries};
use pse_types::delegation::{DelegationTimeEntry, Validator};
use pse_types::keepers::{KeeperError, StakingKeeper};
use pse_types::{AccAddress, ValAddress};
use rusqlite::Connection;

use crate::{Result, ScoreError};

/// Score accrued by one entry since its last change.
///
/// A clock that is ahead of `now` contributes nothing.
pub fn unrolled_score(
    validator: &Validator,
    entry: &DelegationTimeEntry,
    now: i64,
) -> Option<u128> {
    let elapsed = now.saturating_sub(entry.last_changed_unix_sec).max(0);
    let tokens = validator.tokens_from_shares_truncated(entry.shares);
    tokens.checked_mul(u128::try_from(elapsed).ok()?)
}

/// Validators fetched once per pass over many entries.
#[derive(Debug, Default)]
pub struct ValidatorCache {
    validators: BTreeMap<ValAddress, Validator>,
}

impl ValidatorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<S: StakingKeeper + ?Sized>(
        &mut self,
        staking: &S,
        address: &ValAddress,
    ) -> Result<&Validator> {
        match self.validators.entry(*address) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => Ok(e.insert(staking.get_validator(address)?)),
        }
    }
}

/// Current score of a delegator without mutating anything.
///
/// Excluded delegators always score zero. Entries whose validator the
/// staking collaborator no longer knows contribute nothing.
pub fn delegator_score<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    now: i64,
) -> Result<u128> {
    if params::is_excluded(conn, delegator)? {
        return Ok(0);
    }

    let overflow = || ScoreError::Overflow(delegator.to_string());
    let mut total = scores::get(conn, delegator)?;
    let mut cache = ValidatorCache::new();
    for (validator, entry) in time_entries::for_delegator(conn, delegator)? {
        let v = match cache.get(staking, &validator) {
            Ok(v) => v,
            Err(ScoreError::Keeper(KeeperError::NotFound(_))) => {
                tracing::warn!(%delegator, %validator, "PSE: time entry for unknown validator ignored");
                continue;
            }
            Err(e) => return Err(e),
        };
        let added = unrolled_score(v, &entry, now).ok_or_else(overflow)?;
        total = total.checked_add(added).ok_or_else(overflow)?;
    }
    Ok(total)
}

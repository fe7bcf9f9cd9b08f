//! Delegation change hooks.
//!
//! [`before_delegation_change`] runs while staking still reflects the old
//! shares. It values the elapsed interval at the current exchange rate,
//! rolls it into the snapshot and restarts the entry clock.
//!
//! [`on_delegation_changed`] runs after staking has applied the change. It
//! rolls whatever accrued since the last roll (nothing, when the before hook
//! ran in the same block) and rewrites the entry from the delegation staking
//! now reports, with its clock set to `now`.
//!
//! Excluded delegators never get entries or snapshots.

use pse_db::queries::{params, scores, time_entries};
use pse_types::delegation::{DelegationEvent, DelegationTimeEntry};
use pse_types::keepers::StakingKeeper;
use pse_types::{AccAddress, ValAddress};
use rusqlite::Connection;

use crate::ledger::unrolled_score;
use crate::{Result, ScoreError};

/// Roll an existing pair before its shares change or it is removed.
pub fn before_delegation_change<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    validator: &ValAddress,
    now: i64,
) -> Result<()> {
    if params::is_excluded(conn, delegator)? {
        return Ok(());
    }
    let Some(mut entry) = time_entries::get(conn, delegator, validator)? else {
        return Ok(());
    };
    let added = roll(conn, staking, delegator, validator, &entry, now)?;
    entry.last_changed_unix_sec = now;
    time_entries::set(conn, delegator, validator, &entry)?;
    tracing::trace!(%delegator, %validator, added, "PSE: rolled before change");
    Ok(())
}

/// Apply one staking change notification.
pub fn on_delegation_changed<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    event: &DelegationEvent,
    now: i64,
) -> Result<()> {
    match event {
        DelegationEvent::Created {
            delegator,
            validator,
        }
        | DelegationEvent::Modified {
            delegator,
            validator,
        } => track(conn, staking, delegator, validator, now, false),
        DelegationEvent::Removed {
            delegator,
            validator,
        } => track(conn, staking, delegator, validator, now, true),
        DelegationEvent::Redelegated {
            delegator,
            src_validator,
            dst_validator,
        } => {
            track(conn, staking, delegator, src_validator, now, false)?;
            track(conn, staking, delegator, dst_validator, now, false)
        }
    }
}

fn track<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    validator: &ValAddress,
    now: i64,
    removed: bool,
) -> Result<()> {
    if params::is_excluded(conn, delegator)? {
        time_entries::remove(conn, delegator, validator)?;
        tracing::trace!(%delegator, %validator, "PSE: skipping excluded delegator");
        return Ok(());
    }

    let added = roll_entry(conn, staking, delegator, validator, now)?;

    let current = if removed {
        None
    } else {
        staking.get_delegation(delegator, validator)?
    };
    match current {
        Some(delegation) if !delegation.shares.is_zero() => {
            time_entries::set(
                conn,
                delegator,
                validator,
                &DelegationTimeEntry {
                    shares: delegation.shares,
                    last_changed_unix_sec: now,
                },
            )?;
        }
        _ => time_entries::remove(conn, delegator, validator)?,
    }

    tracing::trace!(%delegator, %validator, added, removed, "PSE: delegation change tracked");
    Ok(())
}

/// Moves an entry's un-rolled score into the delegator's snapshot.
fn roll_entry<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    validator: &ValAddress,
    now: i64,
) -> Result<u128> {
    match time_entries::get(conn, delegator, validator)? {
        Some(entry) => roll(conn, staking, delegator, validator, &entry, now),
        None => Ok(0),
    }
}

fn roll<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    validator: &ValAddress,
    entry: &DelegationTimeEntry,
    now: i64,
) -> Result<u128> {
    if now <= entry.last_changed_unix_sec {
        return Ok(0);
    }
    let v = staking.get_validator(validator)?;
    let added = unrolled_score(&v, entry, now)
        .ok_or_else(|| ScoreError::Overflow(delegator.to_string()))?;
    if added > 0 {
        scores::add(conn, delegator, added)?;
    }
    Ok(added)
}

/// Adds a delegator to the exclusion list and forgets its score.
///
/// Returns `false` if it was already excluded.
pub fn exclude_delegator(conn: &Connection, delegator: &AccAddress) -> Result<bool> {
    if !params::add_excluded(conn, delegator)? {
        return Ok(false);
    }
    scores::remove(conn, delegator)?;
    let dropped = time_entries::remove_for_delegator(conn, delegator)?;
    tracing::debug!(%delegator, dropped, "PSE: delegator excluded");
    Ok(true)
}

/// Removes a delegator from the exclusion list and starts tracking its
/// current delegations from `now`.
///
/// Returns `false` if it was not excluded.
pub fn reinstate_delegator<S: StakingKeeper + ?Sized>(
    conn: &Connection,
    staking: &S,
    delegator: &AccAddress,
    now: i64,
) -> Result<bool> {
    if !params::remove_excluded(conn, delegator)? {
        return Ok(false);
    }
    let delegations = staking.delegator_delegations(delegator)?;
    for response in &delegations {
        let d = &response.delegation;
        if d.shares.is_zero() {
            continue;
        }
        time_entries::set(
            conn,
            delegator,
            &d.validator,
            &DelegationTimeEntry {
                shares: d.shares,
                last_changed_unix_sec: now,
            },
        )?;
    }
    tracing::debug!(%delegator, tracked = delegations.len(), "PSE: delegator reinstated");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::delegator_score;
    use pse_types::testutil::MockChain;
    use pse_types::ADDRESS_LEN;

    fn del(b: u8) -> AccAddress {
        AccAddress::new([b; ADDRESS_LEN])
    }

    fn val(b: u8) -> ValAddress {
        ValAddress::new([b; ADDRESS_LEN])
    }

    struct Harness {
        conn: Connection,
        chain: MockChain,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                conn: pse_db::open_memory().expect("db"),
                chain: MockChain::new(),
            }
        }

        fn delegate(&self, d: u8, v: u8, amount: u64, now: i64) {
            before_delegation_change(&self.conn, &self.chain, &del(d), &val(v), now)
                .expect("before hook");
            let event = self.chain.delegate_tokens(del(d), val(v), amount);
            on_delegation_changed(&self.conn, &self.chain, &event, now).expect("hook");
        }

        fn undelegate(&self, d: u8, v: u8, amount: u64, now: i64) {
            before_delegation_change(&self.conn, &self.chain, &del(d), &val(v), now)
                .expect("before hook");
            let event = self
                .chain
                .undelegate_tokens(del(d), val(v), amount)
                .expect("undelegate");
            on_delegation_changed(&self.conn, &self.chain, &event, now).expect("hook");
        }

        fn redelegate(&self, d: u8, src: u8, dst: u8, amount: u64, now: i64) {
            for v in [src, dst] {
                before_delegation_change(&self.conn, &self.chain, &del(d), &val(v), now)
                    .expect("before hook");
            }
            let event = self
                .chain
                .redelegate_tokens(del(d), val(src), val(dst), amount)
                .expect("redelegate");
            on_delegation_changed(&self.conn, &self.chain, &event, now).expect("hook");
        }

        fn score(&self, d: u8, now: i64) -> u128 {
            delegator_score(&self.conn, &self.chain, &del(d), now).expect("score")
        }
    }

    #[test]
    fn test_new_delegation_starts_at_zero() {
        let h = Harness::new();
        h.delegate(1, 1, 100, 10);
        assert_eq!(h.score(1, 10), 0);
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 0);
        let entry = time_entries::get(&h.conn, &del(1), &val(1))
            .expect("get")
            .expect("entry");
        assert_eq!(entry.last_changed_unix_sec, 10);
    }

    #[test]
    fn test_modify_rolls_previous_shares() {
        let h = Harness::new();
        h.delegate(1, 1, 12, 0);
        h.delegate(1, 1, 11, 8);
        // 12 tokens for 8 seconds rolled, then 23 tokens accruing.
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 96);
        assert_eq!(h.score(1, 13), 96 + 23 * 5);
    }

    #[test]
    fn test_undelegate_and_remove() {
        let h = Harness::new();
        h.delegate(1, 1, 12, 0);
        h.undelegate(1, 1, 4, 8);
        assert_eq!(h.score(1, 8), 96);
        h.undelegate(1, 1, 8, 10);
        assert_eq!(h.score(1, 10), 96 + 8 * 2);
        assert!(time_entries::for_delegator(&h.conn, &del(1))
            .expect("entries")
            .is_empty());
        // No further accrual once fully unbonded.
        assert_eq!(h.score(1, 100), 112);
    }

    #[test]
    fn test_redelegate_moves_accrual() {
        let h = Harness::new();
        h.delegate(1, 1, 12, 0);
        h.delegate(1, 2, 9, 0);
        h.redelegate(1, 1, 2, 5, 8);
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 12 * 8 + 9 * 8);
        assert_eq!(h.score(1, 13), 12 * 8 + 9 * 8 + 7 * 5 + 14 * 5);
    }

    #[test]
    fn test_score_is_linear_in_tokens_and_time() {
        let h = Harness::new();
        h.delegate(1, 1, 1_100_000, 1000);
        h.delegate(2, 1, 900_000, 1000);
        assert_eq!(h.score(1, 1008), 8_800_000);
        assert_eq!(h.score(2, 1008), 7_200_000);
    }

    #[test]
    fn test_excluded_delegator_is_ignored() {
        let h = Harness::new();
        params::add_excluded(&h.conn, &del(1)).expect("exclude");
        h.delegate(1, 1, 100, 0);
        assert!(time_entries::get(&h.conn, &del(1), &val(1))
            .expect("get")
            .is_none());
        assert_eq!(h.score(1, 50), 0);
    }

    #[test]
    fn test_exclude_then_reinstate() {
        let h = Harness::new();
        h.delegate(1, 1, 10, 0);
        h.delegate(1, 1, 10, 5);
        assert!(exclude_delegator(&h.conn, &del(1)).expect("exclude"));
        assert!(!exclude_delegator(&h.conn, &del(1)).expect("exclude twice"));
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 0);
        assert!(time_entries::for_delegator(&h.conn, &del(1))
            .expect("entries")
            .is_empty());

        assert!(reinstate_delegator(&h.conn, &h.chain, &del(1), 100).expect("reinstate"));
        assert!(!reinstate_delegator(&h.conn, &h.chain, &del(1), 100).expect("again"));
        assert_eq!(h.score(1, 110), 20 * 10);
    }

    #[test]
    fn test_after_hook_alone_rolls_at_preserved_rate() {
        let h = Harness::new();
        h.delegate(2, 1, 100, 0);
        h.delegate(1, 1, 12, 0);
        // No before hook: the validator keeps other stake, so its rate holds.
        let event = h.chain.undelegate_tokens(del(1), val(1), 2).expect("undelegate");
        on_delegation_changed(&h.conn, &h.chain, &event, 8).expect("hook");
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 96);
    }

    #[test]
    fn test_before_hook_values_full_unbond() {
        let h = Harness::new();
        h.delegate(1, 1, 12, 0);
        h.undelegate(1, 1, 12, 8);
        assert_eq!(scores::get(&h.conn, &del(1)).expect("snapshot"), 96);
    }

    #[test]
    fn test_removed_for_unknown_entry_is_noop() {
        let h = Harness::new();
        h.chain.delegate_tokens(del(3), val(1), 10);
        let event = DelegationEvent::Removed {
            delegator: del(3),
            validator: val(1),
        };
        on_delegation_changed(&h.conn, &h.chain, &event, 10).expect("hook");
        assert_eq!(h.score(3, 20), 0);
    }
}

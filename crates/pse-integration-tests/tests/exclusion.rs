//! Integration test: excluded delegators neither accrue nor receive, and
//! re-inclusion starts them from zero at the moment of re-inclusion.

use pse_integration_tests::{addr, authority, community_payouts, entry, val, Sim};
use pse_types::params::MsgUpdateExcludedAddresses;
use pse_types::BlockInfo;

fn exclusion(add: &[u32], remove: &[u32]) -> MsgUpdateExcludedAddresses {
    MsgUpdateExcludedAddresses {
        authority: authority().to_string(),
        addresses_to_add: add.iter().map(|d| addr(*d).to_string()).collect(),
        addresses_to_remove: remove.iter().map(|d| addr(*d).to_string()).collect(),
    }
}

#[test]
fn test_exclusion_window_is_not_rewarded() {
    let mut sim = Sim::new(100);
    sim.install_schedule(vec![entry(100, 1000, 10)]);
    sim.delegate(addr(1), val(1), 100, 0);
    sim.delegate(addr(2), val(1), 100, 0);

    sim.module
        .update_excluded_addresses(&exclusion(&[1], &[]), &BlockInfo::new(1, 40))
        .expect("exclude");
    assert_eq!(sim.score(&addr(1), 50), 0);

    sim.module
        .update_excluded_addresses(&exclusion(&[], &[1]), &BlockInfo::new(2, 60))
        .expect("reinstate");
    assert_eq!(sim.score(&addr(1), 60), 0);

    let events = sim.run_due(100);
    // 4000 vs 10000 score.
    assert_eq!(
        community_payouts(&events),
        vec![(addr(1), 285), (addr(2), 714)]
    );
}

#[test]
fn test_excluded_delegator_changes_are_ignored() {
    let mut sim = Sim::new(100);
    sim.install_schedule(vec![entry(100, 1000, 10)]);
    sim.module
        .update_excluded_addresses(&exclusion(&[1], &[]), &BlockInfo::new(1, 0))
        .expect("exclude");

    sim.delegate(addr(1), val(1), 1_000_000, 0);
    sim.delegate(addr(2), val(1), 1, 0);
    sim.delegate(addr(1), val(1), 1_000_000, 50);

    let events = sim.run_due(100);
    assert_eq!(community_payouts(&events), vec![(addr(2), 1000)]);
    assert_eq!(sim.chain.delegated_tokens(&addr(1), &val(1)), 2_000_000);
    assert!(sim
        .module
        .export_genesis()
        .expect("export")
        .delegation_time_entries
        .iter()
        .all(|r| r.delegator != addr(1)));
}

#[test]
fn test_exclusion_after_job_start_forfeits_frozen_score() {
    let mut sim = Sim::new(1);
    sim.install_schedule(vec![entry(100, 1000, 10)]);
    sim.delegate(addr(1), val(1), 100, 0);
    sim.delegate(addr(2), val(1), 100, 0);

    sim.finalize(100);
    let pool_before = sim.chain.community_pool_balance();
    sim.module
        .update_excluded_addresses(&exclusion(&[2], &[]), &BlockInfo::new(2, 100))
        .expect("exclude");
    let events = sim.run_due(100);
    assert_eq!(
        community_payouts(&events),
        vec![(addr(1), 500), (addr(2), 0)]
    );
    assert_eq!(sim.chain.delegated_tokens(&addr(2), &val(1)), 100);
    assert_eq!(sim.chain.community_pool_balance(), pool_before + 500);
}

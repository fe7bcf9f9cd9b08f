//! Integration test: no token is created or lost by a distribution.
//!
//! Everything that leaves a clearing account ends up either with a
//! recipient, re-delegated for a staker, or in the community pool.

use pse_integration_tests::{addr, entry, recipient, val, Sim};
use pse_types::events::PseEvent;
use pse_types::keepers::BankKeeper;
use pse_types::ClearingAccount;

#[test]
fn test_community_amount_fully_accounted() {
    let mut sim = Sim::new(2);
    sim.install_schedule(vec![entry(100, 1_000_003, 1000)]);
    sim.delegate(addr(1), val(1), 1_000_000, 0);
    sim.delegate(addr(2), val(1), 333_333, 10);
    sim.delegate(addr(3), val(2), 777, 20);
    sim.delegate(addr(4), val(2), 5_000_000, 99);
    sim.undelegate(addr(4), val(2), 5_000_000, 100);

    let staked_before: u64 = (1..=4).map(|d| sim.chain.total_delegated(&addr(d))).sum();
    let events = sim.run_due(100);

    let staked_after: u64 = (1..=4).map(|d| sim.chain.total_delegated(&addr(d))).sum();
    let paid: u64 = events
        .iter()
        .filter_map(|e| match e {
            PseEvent::CommunityDistributed { paid, .. } => Some(*paid),
            _ => None,
        })
        .sum();
    let leftover = events
        .iter()
        .find_map(|e| match e {
            PseEvent::CommunityJobCompleted { leftover, .. } => Some(*leftover),
            _ => None,
        })
        .expect("job completed");

    assert_eq!(paid + leftover, 1_000_003);
    assert_eq!(staked_after - staked_before, paid);
    assert_eq!(sim.chain.clearing_account_balance(ClearingAccount::Community), 0);
    // Delegator 4 unbonded everything: its share stays in the pool.
    assert!(leftover > 0);
    assert_eq!(sim.chain.balance(&addr(4)), 0);
}

#[test]
fn test_direct_remainder_goes_to_pool() {
    let mut sim = Sim::new(10);
    sim.install_schedule(vec![entry(100, 10, 1000)]);
    sim.delegate(addr(1), val(1), 10, 0);
    sim.run_due(100);

    for account in ClearingAccount::non_community() {
        assert_eq!(sim.chain.balance(&recipient(account)), 1000);
        assert_eq!(sim.chain.clearing_account_balance(account), 0);
    }
    assert_eq!(sim.chain.community_pool_balance(), 0);
}

#[test]
fn test_every_clearing_account_drained_after_schedule() {
    let mut sim = Sim::new(3);
    sim.install_schedule(vec![entry(100, 999, 7), entry(200, 1001, 9), entry(300, 5, 11)]);
    for d in 1..=5 {
        sim.delegate(addr(d), val(d % 2), u64::from(d) * 1000, 0);
    }
    let mut events = sim.run_due(100);
    events.extend(sim.run_due(250));
    events.extend(sim.run_due(300));

    for account in ClearingAccount::ALL {
        assert_eq!(sim.chain.clearing_account_balance(account), 0, "{account}");
    }
    let completed = events
        .iter()
        .filter(|e| matches!(e, PseEvent::ScheduleEntryCompleted { .. }))
        .count();
    assert_eq!(completed, 3);
    assert!(sim.module.allocation_schedule().expect("schedule").is_empty());
}

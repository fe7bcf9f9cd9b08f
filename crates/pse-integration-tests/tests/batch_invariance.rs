//! Integration test: the Community payout does not depend on batch size.
//!
//! The same randomly generated delegator set is distributed once with one
//! delegator per block and once in a single block. Balances, delegations,
//! the pool and the score ledger must come out identical.

use pse_integration_tests::{addr, community_payouts, entry, val, Sim};
use pse_types::events::PseEvent;
use pse_types::keepers::BankKeeper;
use pse_types::ClearingAccount;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const DELEGATORS: u32 = 150;
const VALIDATORS: u32 = 4;
const DUE: u64 = 10_000;

fn populate(sim: &mut Sim, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut actions = Vec::new();
    for d in 0..DELEGATORS {
        for _ in 0..rng.gen_range(1..=3) {
            let v = rng.gen_range(0..VALIDATORS);
            let amount = rng.gen_range(1..5_000_000u64);
            let at = rng.gen_range(0..DUE as i64 - 100);
            actions.push((at, d, v, amount));
        }
    }
    actions.sort();
    for (at, d, v, amount) in &actions {
        sim.delegate(addr(*d), val(*v), *amount, *at);
    }

    // A few delegators leave one validator entirely shortly before the due time.
    for (_, d, v, _) in actions.iter().filter(|(_, d, _, _)| d % 10 == 3) {
        let held = sim.chain.delegated_tokens(&addr(*d), &val(*v));
        if held > 0 {
            sim.undelegate(addr(*d), val(*v), held, DUE as i64 - 50);
        }
    }
    sim.chain.slash(&val(1), 500);
}

fn run(batch_size: u64) -> (Sim, Vec<PseEvent>) {
    let mut sim = Sim::new(batch_size);
    sim.install_schedule(vec![entry(DUE, 7_777_777, 100)]);
    populate(&mut sim, 42);
    let events = sim.run_due(DUE as i64);
    (sim, events)
}

#[test]
fn test_batch_size_one_matches_single_batch() {
    let (small, small_events) = run(1);
    let (large, large_events) = run(1_000_000);

    let payouts = community_payouts(&small_events);
    assert!(payouts.len() > 100);
    assert_eq!(payouts, community_payouts(&large_events));
    assert_eq!(small.chain.snapshot(), large.chain.snapshot());

    let small_state = small.module.export_genesis().expect("export");
    let large_state = large.module.export_genesis().expect("export");
    assert_eq!(small_state.delegation_time_entries, large_state.delegation_time_entries);
    assert_eq!(small_state.account_scores, large_state.account_scores);
    assert!(small_state.scheduled_distributions.is_empty());
    assert!(large_state.scheduled_distributions.is_empty());

    assert_eq!(small.chain.clearing_account_balance(ClearingAccount::Community), 0);
}

#[test]
fn test_small_batches_span_many_blocks() {
    let mut sim = Sim::new(7);
    sim.install_schedule(vec![entry(DUE, 1_000_000, 100)]);
    populate(&mut sim, 7);

    let mut blocks = 0;
    let mut paid = 0;
    loop {
        let events = sim.finalize(DUE as i64);
        if events.is_empty() {
            break;
        }
        blocks += 1;
        let in_block = community_payouts(&events).len();
        assert!(in_block <= 7);
        paid += in_block;
    }
    assert_eq!(blocks, 1 + paid.div_ceil(7));
}

//! Integration test: export in the middle of a Community job, import into a
//! fresh module over a copy of the chain, and finish the job there.

use pse_integration_tests::{addr, community_payouts, entry, val, Sim};
use pse_types::genesis::GenesisState;
use pse_types::testutil::MockChain;

fn scenario() -> Sim {
    let mut sim = Sim::new(2);
    sim.install_schedule(vec![entry(100, 10_000, 50), entry(200, 10_000, 50)]);
    for d in 1..=7 {
        sim.delegate(addr(d), val(d % 3), u64::from(d) * 10_000, i64::from(d));
    }
    sim.undelegate(addr(7), val(1), 20_000, 80);
    sim
}

#[test]
fn test_mid_job_export_resumes_identically() {
    let mut original = scenario();
    original.finalize(100);
    original.finalize(100);
    let status = original
        .module
        .community_job_status()
        .expect("status")
        .expect("job running");
    assert_eq!(status.processed_entries, 2);

    let exported = original.module.export_genesis().expect("export");
    let json = serde_json::to_string(&exported).expect("json");
    let mut restored = Sim::with_chain(MockChain::from_state(original.chain.snapshot()), 2);
    restored
        .module
        .init_genesis(&serde_json::from_str::<GenesisState>(&json).expect("parse"))
        .expect("import");
    assert_eq!(restored.module.export_genesis().expect("re-export"), exported);

    let rest_original = original.run_due(100);
    let rest_restored = restored.run_due(100);
    assert_eq!(community_payouts(&rest_original), community_payouts(&rest_restored));
    assert_eq!(community_payouts(&rest_original).len(), 5);
    assert_eq!(original.chain.snapshot(), restored.chain.snapshot());

    // Both keep accruing identically towards the next entry.
    for d in 1..=7 {
        assert_eq!(original.score(&addr(d), 150), restored.score(&addr(d), 150));
    }
}

#[test]
fn test_json_export_is_stable() {
    let sim = scenario();
    let json = sim.module.export_genesis_json().expect("export");
    let mut other = Sim::with_chain(MockChain::from_state(sim.chain.snapshot()), 2);
    other.module.init_genesis_json(&json).expect("import");
    assert_eq!(other.module.export_genesis_json().expect("export"), json);
}

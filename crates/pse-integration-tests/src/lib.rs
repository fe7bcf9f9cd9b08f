//! Integration test crate for the PSE module.
//!
//! [`Sim`] drives a [`PseModule`] over an in-memory chain the way a host
//! would: hooks around every staking change and one finalize call per block.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p pse-integration-tests
//! ```

use pse_module::{ModuleConfig, PseModule};
use pse_types::events::PseEvent;
use pse_types::params::{MsgUpdateAllocationSchedule, MsgUpdateClearingAccountMappings};
use pse_types::schedule::{ClearingAccountAllocation, ClearingAccountMapping, ScheduledDistribution};
use pse_types::testutil::MockChain;
use pse_types::{AccAddress, BlockInfo, ClearingAccount, ValAddress, ADDRESS_LEN};

pub type Module = PseModule<MockChain, MockChain, MockChain>;

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn authority() -> AccAddress {
    AccAddress::new([0xaa; ADDRESS_LEN])
}

/// Distinct account address; byte order follows `n`.
pub fn addr(n: u32) -> AccAddress {
    let mut bytes = [0x11; ADDRESS_LEN];
    bytes[ADDRESS_LEN - 4..].copy_from_slice(&n.to_be_bytes());
    AccAddress::new(bytes)
}

pub fn val(n: u32) -> ValAddress {
    let mut bytes = [0x77; ADDRESS_LEN];
    bytes[ADDRESS_LEN - 4..].copy_from_slice(&n.to_be_bytes());
    ValAddress::new(bytes)
}

/// Recipient of the direct allocation of `account`.
pub fn recipient(account: ClearingAccount) -> AccAddress {
    let index = ClearingAccount::ALL
        .iter()
        .position(|a| *a == account)
        .unwrap_or_default();
    AccAddress::new([0xc0 + index as u8; ADDRESS_LEN])
}

/// Schedule entry paying `community` to stakers and `direct` to every
/// other account.
pub fn entry(timestamp: u64, community: u64, direct: u64) -> ScheduledDistribution {
    ScheduledDistribution {
        timestamp,
        allocations: ClearingAccount::ALL
            .iter()
            .map(|account| ClearingAccountAllocation {
                clearing_account: *account,
                amount: if account.is_community() { community } else { direct },
            })
            .collect(),
    }
}

pub fn community_payouts(events: &[PseEvent]) -> Vec<(AccAddress, u64)> {
    events
        .iter()
        .filter_map(|e| match e {
            PseEvent::CommunityDistributed { delegator, paid, .. } => Some((*delegator, *paid)),
            _ => None,
        })
        .collect()
}

pub struct Sim {
    pub chain: MockChain,
    pub module: Module,
    height: u64,
}

impl Sim {
    pub fn new(batch_size: u64) -> Self {
        Self::with_chain(MockChain::new(), batch_size)
    }

    pub fn with_chain(chain: MockChain, batch_size: u64) -> Self {
        init_tracing();
        let config = ModuleConfig {
            authority: authority().to_string(),
            community_batch_size: batch_size,
            ..ModuleConfig::default()
        };
        let module = PseModule::open(&config, chain.clone(), chain.clone(), chain.clone())
            .expect("open module");
        Self {
            chain,
            module,
            height: 0,
        }
    }

    /// Maps one recipient per direct account, installs `entries` and funds
    /// the clearing accounts to cover them.
    pub fn install_schedule(&mut self, entries: Vec<ScheduledDistribution>) {
        let mappings = ClearingAccount::non_community()
            .map(|account| ClearingAccountMapping {
                clearing_account: account,
                recipient_addresses: vec![recipient(account)],
            })
            .collect();
        self.module
            .update_clearing_account_mappings(&MsgUpdateClearingAccountMappings {
                authority: authority().to_string(),
                mappings,
            })
            .expect("mappings");
        for e in &entries {
            for account in ClearingAccount::ALL {
                self.chain.fund_clearing(account, e.amount_for(account));
            }
        }
        self.module
            .update_allocation_schedule(&MsgUpdateAllocationSchedule {
                authority: authority().to_string(),
                scheduled_distributions: entries,
            })
            .expect("schedule");
    }

    pub fn delegate(&mut self, delegator: AccAddress, validator: ValAddress, amount: u64, now: i64) {
        self.module
            .before_delegation_change(&delegator, &validator, now)
            .expect("before hook");
        let event = self.chain.delegate_tokens(delegator, validator, amount);
        self.module
            .on_delegation_changed(&event, now)
            .expect("after hook");
    }

    pub fn undelegate(&mut self, delegator: AccAddress, validator: ValAddress, amount: u64, now: i64) {
        self.module
            .before_delegation_change(&delegator, &validator, now)
            .expect("before hook");
        let event = self
            .chain
            .undelegate_tokens(delegator, validator, amount)
            .expect("undelegate");
        self.module
            .on_delegation_changed(&event, now)
            .expect("after hook");
    }

    pub fn redelegate(
        &mut self,
        delegator: AccAddress,
        src: ValAddress,
        dst: ValAddress,
        amount: u64,
        now: i64,
    ) {
        for validator in [&src, &dst] {
            self.module
                .before_delegation_change(&delegator, validator, now)
                .expect("before hook");
        }
        let event = self
            .chain
            .redelegate_tokens(delegator, src, dst, amount)
            .expect("redelegate");
        self.module
            .on_delegation_changed(&event, now)
            .expect("after hook");
    }

    /// Finalizes one block at `now`.
    pub fn finalize(&mut self, now: i64) -> Vec<PseEvent> {
        self.height += 1;
        self.module
            .on_block_finalize(BlockInfo::new(self.height, now))
            .expect("finalize")
    }

    /// Finalizes blocks at `now` until the running job and every due entry
    /// are done. Returns all events in order.
    pub fn run_due(&mut self, now: i64) -> Vec<PseEvent> {
        let mut events = Vec::new();
        loop {
            let step = self.finalize(now);
            let idle = step.is_empty();
            events.extend(step);
            if idle {
                return events;
            }
        }
    }

    pub fn score(&self, delegator: &AccAddress, now: i64) -> u128 {
        self.module.score(delegator, now).expect("score")
    }
}

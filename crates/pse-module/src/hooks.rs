//! Staking change notifications.
//!
//! The host calls [`PseModule::before_delegation_change`] before it changes
//! or removes an existing delegation and [`PseModule::on_delegation_changed`]
//! after every change. Scores keep accruing while distributions are
//! disabled.

use pse_score::{accumulator, seed};
use pse_types::delegation::DelegationEvent;
use pse_types::keepers::{BankKeeper, CommunityPool, StakingKeeper};
use pse_types::{AccAddress, ValAddress};

use crate::{PseModule, Result};

impl<S, B, P> PseModule<S, B, P>
where
    S: StakingKeeper,
    B: BankKeeper,
    P: CommunityPool,
{
    pub fn before_delegation_change(
        &mut self,
        delegator: &AccAddress,
        validator: &ValAddress,
        block_time: i64,
    ) -> Result<()> {
        self.in_transaction(|conn, staking, _, _| {
            accumulator::before_delegation_change(conn, &*staking, delegator, validator, block_time)?;
            Ok(())
        })
    }

    pub fn on_delegation_changed(&mut self, event: &DelegationEvent, block_time: i64) -> Result<()> {
        self.in_transaction(|conn, staking, _, _| {
            accumulator::on_delegation_changed(conn, &*staking, event, block_time)?;
            Ok(())
        })
    }

    /// Starts tracking every delegation that exists on chain but has no
    /// time entry yet. Returns the number of entries created.
    pub fn seed_time_entries(&mut self, block_time: i64) -> Result<usize> {
        self.in_transaction(|conn, staking, _, _| {
            Ok(seed::seed_time_entries(conn, &*staking, block_time)?)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::*;
    use pse_types::testutil::MockChain;
    use pse_types::{AccAddress, ValAddress, ADDRESS_LEN};

    fn addr(b: u8) -> AccAddress {
        AccAddress::new([b; ADDRESS_LEN])
    }

    fn val(b: u8) -> ValAddress {
        ValAddress::new([b; ADDRESS_LEN])
    }

    #[test]
    fn test_hooks_accrue_score() {
        let chain = MockChain::new();
        let mut m = module(&chain);

        m.before_delegation_change(&addr(1), &val(1), 0).expect("before");
        let created = chain.delegate_tokens(addr(1), val(1), 100);
        m.on_delegation_changed(&created, 0).expect("after");
        assert_eq!(m.score(&addr(1), 10).expect("score"), 1000);

        m.before_delegation_change(&addr(1), &val(1), 10).expect("before");
        let removed = chain
            .undelegate_tokens(addr(1), val(1), 100)
            .expect("undelegate");
        m.on_delegation_changed(&removed, 10).expect("after");
        assert_eq!(m.score(&addr(1), 50).expect("score"), 1000);
    }

    #[test]
    fn test_seed_through_module() {
        let chain = MockChain::new();
        chain.delegate_tokens(addr(1), val(1), 100);
        chain.delegate_tokens(addr(2), val(1), 100);
        let mut m = module(&chain);
        assert_eq!(m.seed_time_entries(5).expect("seed"), 2);
        assert_eq!(m.score(&addr(2), 15).expect("score"), 1000);
    }
}

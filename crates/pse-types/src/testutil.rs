//! In-memory staking, bank and community pool for tests.
//!
//! [`MockChain`] implements all three collaborator traits over one shared
//! state, so a clone can be handed to the module as staking, bank and pool at
//! once while the test keeps another clone to drive and inspect the chain.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use crate::delegation::{Delegation, DelegationEvent, DelegationResponse, Validator};
use crate::keepers::{BankKeeper, CommunityPool, KeeperError, KeeperResult, StakingKeeper};
use crate::{mul_div_floor, AccAddress, ClearingAccount, Dec, ValAddress};

/// Plain state behind a [`MockChain`]. Cloneable for snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MockChainState {
    pub validators: BTreeMap<ValAddress, Validator>,
    pub delegations: BTreeMap<(AccAddress, ValAddress), Dec>,
    pub balances: BTreeMap<AccAddress, u64>,
    pub clearing: BTreeMap<ClearingAccount, u64>,
    pub community_pool: u64,
    pub failing_recipients: BTreeSet<AccAddress>,
}

#[derive(Clone, Debug, Default)]
pub struct MockChain {
    state: Rc<RefCell<MockChainState>>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: MockChainState) -> Self {
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> MockChainState {
        self.state.borrow().clone()
    }

    /// Puts back a state taken with [`MockChain::snapshot`].
    pub fn restore(&self, state: MockChainState) {
        *self.state.borrow_mut() = state;
    }

    pub fn add_validator(&self, validator: ValAddress) {
        self.state
            .borrow_mut()
            .validators
            .entry(validator)
            .or_insert_with(|| Validator {
                address: validator,
                tokens: 0,
                delegator_shares: Dec::ZERO,
            });
    }

    /// Bonds tokens without touching spendable balances.
    pub fn delegate_tokens(
        &self,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u64,
    ) -> DelegationEvent {
        self.add_validator(validator);
        let existed = self
            .state
            .borrow()
            .delegations
            .contains_key(&(delegator, validator));
        self.state.borrow_mut().bond(delegator, validator, amount);
        if existed {
            DelegationEvent::Modified {
                delegator,
                validator,
            }
        } else {
            DelegationEvent::Created {
                delegator,
                validator,
            }
        }
    }

    /// Unbonds tokens. Fully unbonded pairs are removed.
    pub fn undelegate_tokens(
        &self,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u64,
    ) -> KeeperResult<DelegationEvent> {
        let removed = self.state.borrow_mut().unbond(delegator, validator, amount)?;
        Ok(if removed {
            DelegationEvent::Removed {
                delegator,
                validator,
            }
        } else {
            DelegationEvent::Modified {
                delegator,
                validator,
            }
        })
    }

    pub fn redelegate_tokens(
        &self,
        delegator: AccAddress,
        src_validator: ValAddress,
        dst_validator: ValAddress,
        amount: u64,
    ) -> KeeperResult<DelegationEvent> {
        self.add_validator(dst_validator);
        let mut state = self.state.borrow_mut();
        state.unbond(delegator, src_validator, amount)?;
        state.bond(delegator, dst_validator, amount);
        Ok(DelegationEvent::Redelegated {
            delegator,
            src_validator,
            dst_validator,
        })
    }

    /// Burns `bps` basis points of a validator's tokens.
    pub fn slash(&self, validator: &ValAddress, bps: u64) {
        if let Some(v) = self.state.borrow_mut().validators.get_mut(validator) {
            v.tokens -= v.tokens * bps / 10_000;
        }
    }

    pub fn fund_clearing(&self, account: ClearingAccount, amount: u64) {
        *self.state.borrow_mut().clearing.entry(account).or_default() += amount;
    }

    pub fn set_balance(&self, address: AccAddress, amount: u64) {
        self.state.borrow_mut().balances.insert(address, amount);
    }

    /// Makes every transfer to `address` fail until cleared.
    pub fn fail_sends_to(&self, address: AccAddress, fail: bool) {
        let mut state = self.state.borrow_mut();
        if fail {
            state.failing_recipients.insert(address);
        } else {
            state.failing_recipients.remove(&address);
        }
    }

    pub fn balance(&self, address: &AccAddress) -> u64 {
        self.state.borrow().balances.get(address).copied().unwrap_or(0)
    }

    pub fn community_pool_balance(&self) -> u64 {
        self.state.borrow().community_pool
    }

    /// Token value of one delegation.
    pub fn delegated_tokens(&self, delegator: &AccAddress, validator: &ValAddress) -> u64 {
        self.state.borrow().tokens_of(delegator, validator)
    }

    /// Token value of all delegations of one delegator.
    pub fn total_delegated(&self, delegator: &AccAddress) -> u64 {
        let state = self.state.borrow();
        state
            .delegations
            .keys()
            .filter(|(d, _)| d == delegator)
            .map(|(d, v)| state.tokens_of(d, v))
            .sum()
    }
}

impl MockChainState {
    fn tokens_of(&self, delegator: &AccAddress, validator: &ValAddress) -> u64 {
        let (Some(shares), Some(v)) = (
            self.delegations.get(&(*delegator, *validator)),
            self.validators.get(validator),
        ) else {
            return 0;
        };
        u64::try_from(v.tokens_from_shares_truncated(*shares)).unwrap_or(u64::MAX)
    }

    fn bond(&mut self, delegator: AccAddress, validator: ValAddress, amount: u64) -> Dec {
        let v = self
            .validators
            .entry(validator)
            .or_insert_with(|| Validator {
                address: validator,
                tokens: 0,
                delegator_shares: Dec::ZERO,
            });
        let issued = if v.tokens == 0 {
            Dec::from_int(amount)
        } else {
            Dec::from_raw(
                mul_div_floor(
                    u128::from(amount),
                    v.delegator_shares.raw(),
                    u128::from(v.tokens),
                )
                .unwrap_or(0),
            )
        };
        v.tokens += amount;
        v.delegator_shares = Dec::from_raw(v.delegator_shares.raw() + issued.raw());
        let shares = self.delegations.entry((delegator, validator)).or_default();
        *shares = Dec::from_raw(shares.raw() + issued.raw());
        issued
    }

    fn unbond(
        &mut self,
        delegator: AccAddress,
        validator: ValAddress,
        amount: u64,
    ) -> KeeperResult<bool> {
        let key = (delegator, validator);
        let held = self
            .delegations
            .get(&key)
            .copied()
            .ok_or_else(|| KeeperError::NotFound(format!("delegation {delegator}/{validator}")))?;
        let available = self.tokens_of(&delegator, &validator);
        if amount > available {
            return Err(KeeperError::InsufficientFunds {
                account: delegator.to_string(),
                available,
                required: amount,
            });
        }
        let v = self
            .validators
            .get_mut(&validator)
            .ok_or_else(|| KeeperError::NotFound(format!("validator {validator}")))?;
        let burned = if amount == available {
            held
        } else {
            Dec::from_raw(
                mul_div_floor(
                    u128::from(amount),
                    v.delegator_shares.raw(),
                    u128::from(v.tokens),
                )
                .unwrap_or(0)
                .min(held.raw()),
            )
        };
        v.tokens -= amount;
        v.delegator_shares = Dec::from_raw(v.delegator_shares.raw() - burned.raw());
        let remaining = held.raw() - burned.raw();
        if remaining == 0 {
            self.delegations.remove(&key);
            Ok(true)
        } else {
            self.delegations.insert(key, Dec::from_raw(remaining));
            Ok(false)
        }
    }

    fn debit_clearing(&mut self, account: ClearingAccount, amount: u64) -> KeeperResult<()> {
        let balance = self.clearing.entry(account).or_default();
        if *balance < amount {
            return Err(KeeperError::InsufficientFunds {
                account: account.name().to_string(),
                available: *balance,
                required: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }
}

impl StakingKeeper for MockChain {
    fn bond_denom(&self) -> String {
        "upse".to_string()
    }

    fn get_validator(&self, validator: &ValAddress) -> KeeperResult<Validator> {
        self.state
            .borrow()
            .validators
            .get(validator)
            .cloned()
            .ok_or_else(|| KeeperError::NotFound(format!("validator {validator}")))
    }

    fn get_delegation(
        &self,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> KeeperResult<Option<Delegation>> {
        Ok(self
            .state
            .borrow()
            .delegations
            .get(&(*delegator, *validator))
            .map(|shares| Delegation {
                delegator: *delegator,
                validator: *validator,
                shares: *shares,
            }))
    }

    fn delegator_delegations(&self, delegator: &AccAddress) -> KeeperResult<Vec<DelegationResponse>> {
        let state = self.state.borrow();
        Ok(state
            .delegations
            .iter()
            .filter(|((d, _), _)| d == delegator)
            .map(|((d, v), shares)| DelegationResponse {
                delegation: Delegation {
                    delegator: *d,
                    validator: *v,
                    shares: *shares,
                },
                balance: state.tokens_of(d, v),
            })
            .collect())
    }

    fn all_delegations(&self) -> KeeperResult<Vec<Delegation>> {
        Ok(self
            .state
            .borrow()
            .delegations
            .iter()
            .map(|((d, v), shares)| Delegation {
                delegator: *d,
                validator: *v,
                shares: *shares,
            })
            .collect())
    }

    fn delegate(
        &mut self,
        delegator: &AccAddress,
        validator: &ValAddress,
        amount: u64,
        subtract_from_account: bool,
    ) -> KeeperResult<Dec> {
        let mut state = self.state.borrow_mut();
        if !state.validators.contains_key(validator) {
            return Err(KeeperError::NotFound(format!("validator {validator}")));
        }
        if subtract_from_account {
            let balance = state.balances.entry(*delegator).or_default();
            if *balance < amount {
                return Err(KeeperError::InsufficientFunds {
                    account: delegator.to_string(),
                    available: *balance,
                    required: amount,
                });
            }
            *balance -= amount;
        }
        Ok(state.bond(*delegator, *validator, amount))
    }
}

impl BankKeeper for MockChain {
    fn send_from_clearing_account_to_account(
        &mut self,
        from: ClearingAccount,
        recipient: &AccAddress,
        amount: u64,
    ) -> KeeperResult<()> {
        let mut state = self.state.borrow_mut();
        if state.failing_recipients.contains(recipient) {
            return Err(KeeperError::Other(format!("send to {recipient} refused")));
        }
        state.debit_clearing(from, amount)?;
        *state.balances.entry(*recipient).or_default() += amount;
        Ok(())
    }

    fn clearing_account_balance(&self, account: ClearingAccount) -> u64 {
        self.state
            .borrow()
            .clearing
            .get(&account)
            .copied()
            .unwrap_or(0)
    }
}

impl CommunityPool for MockChain {
    fn fund_community_pool(&mut self, from: ClearingAccount, amount: u64) -> KeeperResult<()> {
        let mut state = self.state.borrow_mut();
        state.debit_clearing(from, amount)?;
        state.community_pool += amount;
        Ok(())
    }
}

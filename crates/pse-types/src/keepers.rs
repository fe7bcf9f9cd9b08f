//! Collaborator interfaces consumed by the module.
//!
//! The host chain supplies implementations. All amounts are base units of
//! the bond denomination.

use crate::delegation::{Delegation, DelegationResponse, Validator};
use crate::{AccAddress, ClearingAccount, Dec, ValAddress};

/// Failure reported by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeeperError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An account cannot cover a transfer.
    #[error("insufficient funds in {account}: have {available}, need {required}")]
    InsufficientFunds {
        account: String,
        available: u64,
        required: u64,
    },

    /// Any other collaborator failure.
    #[error("{0}")]
    Other(String),
}

pub type KeeperResult<T> = std::result::Result<T, KeeperError>;

/// Read and delegate access to the staking subsystem.
pub trait StakingKeeper {
    fn bond_denom(&self) -> String;

    fn get_validator(&self, validator: &ValAddress) -> KeeperResult<Validator>;

    fn get_delegation(
        &self,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> KeeperResult<Option<Delegation>>;

    /// All delegations of one delegator, ordered by validator address.
    fn delegator_delegations(&self, delegator: &AccAddress) -> KeeperResult<Vec<DelegationResponse>>;

    /// Every delegation on chain, ordered by (delegator, validator).
    fn all_delegations(&self) -> KeeperResult<Vec<Delegation>>;

    /// Bonds `amount` from the delegator to `validator` and returns the new
    /// shares. With `subtract_from_account` the tokens come out of the
    /// delegator's spendable balance.
    fn delegate(
        &mut self,
        delegator: &AccAddress,
        validator: &ValAddress,
        amount: u64,
        subtract_from_account: bool,
    ) -> KeeperResult<Dec>;
}

/// Transfers out of the module's clearing accounts.
pub trait BankKeeper {
    fn send_from_clearing_account_to_account(
        &mut self,
        from: ClearingAccount,
        recipient: &AccAddress,
        amount: u64,
    ) -> KeeperResult<()>;

    fn clearing_account_balance(&self, account: ClearingAccount) -> u64;
}

/// The chain's community pool.
pub trait CommunityPool {
    fn fund_community_pool(&mut self, from: ClearingAccount, amount: u64) -> KeeperResult<()>;
}

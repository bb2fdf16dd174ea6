//! The yield-source capability.
//!
//! One implementation exists per supported external protocol. The vault is
//! the only staker of a source instance, so a source tracks a single staked
//! balance rather than per-account positions.

use lpvault_types::{AccountId, RewardAmounts};

use crate::{AdapterError, TokenBank};

/// External staking protocol that generates the two reward tokens.
pub trait YieldSource: Send {
    /// Protocol name, for logs and diagnostics.
    fn name(&self) -> &str;

    /// Stake `amount` pooled tokens taken from `from`.
    ///
    /// # Errors
    ///
    /// Any [`AdapterError`]; the vault treats all of them as fatal.
    fn stake(
        &mut self,
        bank: &mut dyn TokenBank,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError>;

    /// Unstake `amount` pooled tokens and deliver them to `to`.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::InsufficientStaked`] if more than the staked balance is requested
    fn unstake(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError>;

    /// Deliver every reward accrued since the last harvest to `to`.
    ///
    /// Returns the amounts delivered; zero amounts are valid.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::RewardsDepleted`] if the source cannot pay
    fn harvest(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
    ) -> Result<RewardAmounts, AdapterError>;

    /// Rewards a harvest would deliver right now, without delivering them.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::Math`] if the accrual overflows
    fn pending_at_source(&self) -> Result<RewardAmounts, AdapterError>;

    /// Pooled tokens currently staked.
    fn staked_balance(&self) -> u128;

    /// Clone into a box, so boxed sources can be checkpointed.
    fn boxed_clone(&self) -> Box<dyn YieldSource>;
}

impl Clone for Box<dyn YieldSource> {
    fn clone(&self) -> Self {
        (**self).boxed_clone()
    }
}

impl YieldSource for Box<dyn YieldSource> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn stake(
        &mut self,
        bank: &mut dyn TokenBank,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        (**self).stake(bank, from, amount)
    }

    fn unstake(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        (**self).unstake(bank, to, amount)
    }

    fn harvest(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
    ) -> Result<RewardAmounts, AdapterError> {
        (**self).harvest(bank, to)
    }

    fn pending_at_source(&self) -> Result<RewardAmounts, AdapterError> {
        (**self).pending_at_source()
    }

    fn staked_balance(&self) -> u128 {
        (**self).staked_balance()
    }

    fn boxed_clone(&self) -> Box<dyn YieldSource> {
        (**self).boxed_clone()
    }
}

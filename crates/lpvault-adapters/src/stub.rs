//! Scripted yield source.
//!
//! Rewards are queued explicitly rather than accrued over time, and any
//! operation can be made to fail. Used to exercise the vault's rollback
//! and orphaned-reward paths.

use lpvault_types::{AccountId, RewardAmounts, RewardToken, Token};

use crate::{AdapterError, TokenBank, YieldSource};

/// Operation a [`StubYieldSource`] can be told to reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubFailure {
    /// Reject `stake`.
    Stake,
    /// Reject `unstake`.
    Unstake,
    /// Reject `harvest`.
    Harvest,
}

/// A yield source whose rewards and failures are set by the caller.
#[derive(Debug, Clone)]
pub struct StubYieldSource {
    account: AccountId,
    treasury: AccountId,
    staked: u128,
    queued: RewardAmounts,
    failure: Option<StubFailure>,
}

impl StubYieldSource {
    /// Create a stub holding stake at `account` and paying from `treasury`.
    pub fn new(account: AccountId, treasury: AccountId) -> Self {
        Self {
            account,
            treasury,
            staked: 0,
            queued: RewardAmounts::ZERO,
            failure: None,
        }
    }

    /// Queue rewards for the next harvest.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::Math`] if the queued amount overflows
    pub fn queue_rewards(&mut self, amounts: RewardAmounts) -> Result<(), AdapterError> {
        self.queued = self
            .queued
            .checked_add(amounts)
            .ok_or(lpvault_math::MathError::Overflow)?;
        Ok(())
    }

    /// Make one operation fail until cleared with `None`.
    pub fn set_failure(&mut self, failure: Option<StubFailure>) {
        if let Some(op) = failure {
            tracing::warn!(?op, "stub source: failure injected (dev only)");
        }
        self.failure = failure;
    }

    fn check(&self, op: StubFailure) -> Result<(), AdapterError> {
        if self.failure == Some(op) {
            return Err(AdapterError::Unavailable(format!("{op:?} rejected")));
        }
        Ok(())
    }
}

impl YieldSource for StubYieldSource {
    fn name(&self) -> &str {
        "stub"
    }

    fn stake(
        &mut self,
        bank: &mut dyn TokenBank,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        self.check(StubFailure::Stake)?;
        bank.transfer(&Token::Lp, from, &self.account, amount)?;
        self.staked = self
            .staked
            .checked_add(amount)
            .ok_or(lpvault_math::MathError::Overflow)?;
        Ok(())
    }

    fn unstake(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        self.check(StubFailure::Unstake)?;
        if amount > self.staked {
            return Err(AdapterError::InsufficientStaked {
                requested: amount,
                staked: self.staked,
            });
        }
        bank.transfer(&Token::Lp, &self.account, to, amount)?;
        self.staked -= amount;
        Ok(())
    }

    fn harvest(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
    ) -> Result<RewardAmounts, AdapterError> {
        self.check(StubFailure::Harvest)?;
        let payout = self.queued;
        for token in RewardToken::ALL {
            bank.transfer(&token.token(), &self.treasury, to, payout.get(token))
                .map_err(AdapterError::RewardsDepleted)?;
        }
        self.queued = RewardAmounts::ZERO;
        Ok(payout)
    }

    fn pending_at_source(&self) -> Result<RewardAmounts, AdapterError> {
        Ok(self.queued)
    }

    fn staked_balance(&self) -> u128 {
        self.staked
    }

    fn boxed_clone(&self) -> Box<dyn YieldSource> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryBank;

    const POOL: AccountId = AccountId::repeat(0xd0);
    const TREASURY: AccountId = AccountId::repeat(0xd1);
    const VAULT: AccountId = AccountId::repeat(0x5a);

    fn setup() -> (StubYieldSource, InMemoryBank) {
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Lp, &VAULT, 1_000).expect("mint lp");
        bank.mint(&Token::Crv, &TREASURY, 1_000).expect("mint crv");
        bank.mint(&Token::Cvx, &TREASURY, 1_000).expect("mint cvx");
        (StubYieldSource::new(POOL, TREASURY), bank)
    }

    #[test]
    fn test_queued_rewards_harvested_once() {
        let (mut source, mut bank) = setup();
        source
            .queue_rewards(RewardAmounts::new(30, 10))
            .expect("queue");
        assert_eq!(
            source.pending_at_source().expect("pending"),
            RewardAmounts::new(30, 10)
        );

        let paid = source.harvest(&mut bank, &VAULT).expect("harvest");
        assert_eq!(paid, RewardAmounts::new(30, 10));
        assert_eq!(bank.balance_of(&Token::Crv, &VAULT), 30);
        assert_eq!(bank.balance_of(&Token::Cvx, &VAULT), 10);
        assert!(source.harvest(&mut bank, &VAULT).expect("again").is_zero());
    }

    #[test]
    fn test_injected_failure() {
        let (mut source, mut bank) = setup();
        source.set_failure(Some(StubFailure::Stake));
        let err = source.stake(&mut bank, &VAULT, 10).expect_err("should fail");
        assert!(matches!(err, AdapterError::Unavailable(_)));
        assert_eq!(bank.balance_of(&Token::Lp, &VAULT), 1_000);

        source.set_failure(None);
        source.stake(&mut bank, &VAULT, 10).expect("stake");
        assert_eq!(source.staked_balance(), 10);
        assert_eq!(bank.balance_of(&Token::Lp, &POOL), 10);
    }

    #[test]
    fn test_treasury_shortfall() {
        let (mut source, mut bank) = setup();
        source
            .queue_rewards(RewardAmounts::new(0, 5_000))
            .expect("queue");
        let err = source.harvest(&mut bank, &VAULT).expect_err("should fail");
        assert!(matches!(err, AdapterError::RewardsDepleted(_)));
    }
}

//! Time-based staking simulation.
//!
//! Models an external booster/reward-pool: while pooled tokens are staked,
//! each reward token accrues linearly per staked unit per second.
//!
//! ## Formula
//!
//! ```text
//! earned[R] = staked * rate_per_unit_per_sec[R] * elapsed_secs / RATE_SCALE
//! ```
//!
//! Accrued rewards are checkpointed on every stake, unstake and harvest, so
//! a change in stake never re-prices time that has already elapsed.

use lpvault_math::mul_div;
use lpvault_types::{AccountId, RewardAmounts, RewardToken, Token, RATE_SCALE};

use crate::{AdapterError, SimClock, TokenBank, YieldSource};

/// A simulated reward-generating staking pool.
#[derive(Clone, Debug)]
pub struct SimulatedBooster {
    clock: SimClock,
    /// Account holding staked pooled tokens.
    account: AccountId,
    /// Account paying out rewards.
    treasury: AccountId,
    /// Emission per staked unit per second, scaled by `RATE_SCALE`.
    rate_per_unit_per_sec: RewardAmounts,
    staked: u128,
    accrued: RewardAmounts,
    last_update: u64,
}

impl SimulatedBooster {
    /// Create a booster reading time from `clock`.
    ///
    /// # Arguments
    ///
    /// * `account` - Where staked pooled tokens are held
    /// * `treasury` - Where harvested rewards are paid from
    /// * `rate_per_unit_per_sec` - Emission rates, scaled by `RATE_SCALE`
    pub fn new(
        clock: SimClock,
        account: AccountId,
        treasury: AccountId,
        rate_per_unit_per_sec: RewardAmounts,
    ) -> Self {
        let last_update = clock.now();
        Self {
            clock,
            account,
            treasury,
            rate_per_unit_per_sec,
            staked: 0,
            accrued: RewardAmounts::ZERO,
            last_update,
        }
    }

    /// The configured emission rates.
    pub fn rates(&self) -> RewardAmounts {
        self.rate_per_unit_per_sec
    }

    /// Credit rewards not tied to elapsed time (extra incentives, donations).
    ///
    /// They are delivered by the next harvest even if nothing is staked.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::Math`] if the accrued balance overflows
    pub fn inject_rewards(&mut self, amounts: RewardAmounts) -> Result<(), AdapterError> {
        self.accrued = self
            .accrued
            .checked_add(amounts)
            .ok_or(lpvault_math::MathError::Overflow)?;
        tracing::debug!(crv = amounts.crv, cvx = amounts.cvx, "booster: rewards injected");
        Ok(())
    }

    fn earned(&self) -> Result<RewardAmounts, AdapterError> {
        let elapsed = u128::from(self.clock.now().saturating_sub(self.last_update));
        if elapsed == 0 || self.staked == 0 {
            return Ok(self.accrued);
        }

        let mut earned = self.accrued;
        for token in RewardToken::ALL {
            let rate_time = self
                .rate_per_unit_per_sec
                .get(token)
                .checked_mul(elapsed)
                .ok_or(lpvault_math::MathError::Overflow)?;
            let fresh = mul_div(self.staked, rate_time, RATE_SCALE)?;
            let total = earned
                .get(token)
                .checked_add(fresh)
                .ok_or(lpvault_math::MathError::Overflow)?;
            earned.set(token, total);
        }
        Ok(earned)
    }

    fn checkpoint(&mut self) -> Result<(), AdapterError> {
        self.accrued = self.earned()?;
        self.last_update = self.clock.now();
        Ok(())
    }
}

impl YieldSource for SimulatedBooster {
    fn name(&self) -> &str {
        "booster"
    }

    fn stake(
        &mut self,
        bank: &mut dyn TokenBank,
        from: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        self.checkpoint()?;
        bank.transfer(&Token::Lp, from, &self.account, amount)?;
        self.staked = self
            .staked
            .checked_add(amount)
            .ok_or(lpvault_math::MathError::Overflow)?;
        tracing::debug!(amount, staked = self.staked, "booster: staked");
        Ok(())
    }

    fn unstake(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), AdapterError> {
        if amount > self.staked {
            return Err(AdapterError::InsufficientStaked {
                requested: amount,
                staked: self.staked,
            });
        }
        self.checkpoint()?;
        bank.transfer(&Token::Lp, &self.account, to, amount)?;
        self.staked -= amount;
        tracing::debug!(amount, staked = self.staked, "booster: unstaked");
        Ok(())
    }

    fn harvest(
        &mut self,
        bank: &mut dyn TokenBank,
        to: &AccountId,
    ) -> Result<RewardAmounts, AdapterError> {
        self.checkpoint()?;
        let payout = self.accrued;
        for token in RewardToken::ALL {
            bank.transfer(&token.token(), &self.treasury, to, payout.get(token))
                .map_err(AdapterError::RewardsDepleted)?;
        }
        self.accrued = RewardAmounts::ZERO;

        if !payout.is_zero() {
            tracing::debug!(crv = payout.crv, cvx = payout.cvx, "booster: harvested");
        }
        Ok(payout)
    }

    fn pending_at_source(&self) -> Result<RewardAmounts, AdapterError> {
        self.earned()
    }

    fn staked_balance(&self) -> u128 {
        self.staked
    }

    fn boxed_clone(&self) -> Box<dyn YieldSource> {
        Box::new(self.clone())
    }
}

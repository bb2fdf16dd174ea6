//! Fixed-point accumulator.
//!
//! ## Formula
//!
//! ```text
//! numerator = reward * PRECISION + carry
//! value    += numerator / total_stake
//! carry     = numerator % total_stake
//! ```
//!
//! The carry holds the part of past rewards that truncation would otherwise
//! drop. It is folded into the next accrual, so the sum of all increments
//! times the stake never drifts from the sum of all rewards by more than one
//! stake's worth of scaled dust.
//!
//! Intermediate products are taken in 256 bits; only results must fit a `u128`.

use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::{MathError, Result};

/// Scale factor for reward-per-share values (1e12).
pub const PRECISION: u128 = 1_000_000_000_000;

/// Compute `floor(a * b / denominator)`.
///
/// The product is taken in 256 bits, so only the quotient has to fit.
///
/// # Errors
///
/// - [`MathError::DivisionByZero`] if `denominator` is zero
/// - [`MathError::Overflow`] if the quotient does not fit in a `u128`
pub fn mul_div(a: u128, b: u128, denominator: u128) -> Result<u128> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or(MathError::Overflow)?;
    let quotient = product / U256::from(denominator);
    narrow(quotient)
}

fn narrow(value: U256) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(MathError::Overflow);
    }
    Ok(value.low_u128())
}

/// Cumulative reward-per-unit-stake, scaled by [`PRECISION`].
///
/// The value never decreases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPointAccumulator {
    value: u128,
    carry: u128,
}

impl FixedPointAccumulator {
    /// A zero accumulator.
    pub const fn new() -> Self {
        Self { value: 0, carry: 0 }
    }

    /// Current scaled reward-per-share.
    pub fn value(&self) -> u128 {
        self.value
    }

    /// Scaled remainder not yet attributed.
    pub fn carry(&self) -> u128 {
        self.carry
    }

    /// Attribute `reward` across `total_stake` units.
    ///
    /// Returns the increment applied to [`value`](Self::value). A zero
    /// reward leaves the accumulator untouched.
    ///
    /// # Errors
    ///
    /// - [`MathError::DivisionByZero`] if `total_stake` is zero
    /// - [`MathError::Overflow`] if the increment or the new value overflows
    pub fn accrue(&mut self, reward: u128, total_stake: u128) -> Result<u128> {
        if total_stake == 0 {
            return Err(MathError::DivisionByZero);
        }
        if reward == 0 {
            return Ok(0);
        }

        let (delta, carry) = self.step(reward, total_stake)?;
        self.value = self.value.checked_add(delta).ok_or(MathError::Overflow)?;
        self.carry = carry;

        tracing::trace!(
            reward,
            total_stake,
            delta,
            carry,
            value = self.value,
            "accumulator: accrued"
        );

        Ok(delta)
    }

    /// The value this accumulator would hold after accruing `extra_reward`.
    ///
    /// Does not mutate. Returns the current value when there is nothing to
    /// accrue or no stake to accrue over.
    ///
    /// # Errors
    ///
    /// - [`MathError::Overflow`] if the projected value overflows
    pub fn projected(&self, extra_reward: u128, total_stake: u128) -> Result<u128> {
        if extra_reward == 0 || total_stake == 0 {
            return Ok(self.value);
        }
        let (delta, _) = self.step(extra_reward, total_stake)?;
        self.value.checked_add(delta).ok_or(MathError::Overflow)
    }

    /// Reward owed to `amount` units of stake at the current value.
    ///
    /// # Errors
    ///
    /// - [`MathError::Overflow`] if the entitlement does not fit in a `u128`
    pub fn entitlement(&self, amount: u128) -> Result<u128> {
        mul_div(amount, self.value, PRECISION)
    }

    fn step(&self, reward: u128, total_stake: u128) -> Result<(u128, u128)> {
        let numerator = U256::from(reward)
            .checked_mul(U256::from(PRECISION))
            .and_then(|scaled| scaled.checked_add(U256::from(self.carry)))
            .ok_or(MathError::Overflow)?;
        let (delta, carry) = numerator.div_mod(U256::from(total_stake));
        // carry < total_stake, so only delta can overflow
        Ok((narrow(delta)?, carry.low_u128()))
    }
}

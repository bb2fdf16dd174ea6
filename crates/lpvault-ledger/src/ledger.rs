//! Per-user share bookkeeping.
//!
//! ## Formula
//!
//! ```text
//! pending[R]     = amount * acc[R] / PRECISION - reward_debt[R]
//! reward_debt[R] = amount * acc[R] / PRECISION   (after every settlement)
//! ```
//!
//! A user must be settled against the current accumulators before their
//! `amount` changes; otherwise the new amount would be credited with
//! rewards earned before it was staked.

use std::collections::BTreeMap;

use lpvault_math::{mul_div, MathError, PRECISION};
use lpvault_types::{AccountId, RewardAmounts, RewardToken};

use crate::{LedgerError, PoolState, Result, UserInfo};

/// Direction of a stake adjustment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StakeChange {
    /// Add to the user's stake.
    Increase,
    /// Remove from the user's stake.
    Decrease,
}

/// The table of user positions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShareLedger {
    users: BTreeMap<AccountId, UserInfo>,
}

impl ShareLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// A user's position, if they ever deposited.
    pub fn user_info(&self, user: &AccountId) -> Option<&UserInfo> {
        self.users.get(user)
    }

    /// All positions, in account order.
    pub fn users(&self) -> impl Iterator<Item = (&AccountId, &UserInfo)> {
        self.users.iter()
    }

    /// Number of positions ever opened.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no position was ever opened.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Rewards owed to `user` against the pool's stored accumulators.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] on overflow
    pub fn pending_reward(&self, pool: &PoolState, user: &AccountId) -> Result<RewardAmounts> {
        self.pending_reward_at(user, pool.acc_per_share())
    }

    /// Rewards owed to `user` against the supplied accumulator values.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] on overflow
    pub fn pending_reward_at(&self, user: &AccountId, acc: RewardAmounts) -> Result<RewardAmounts> {
        let Some(info) = self.users.get(user) else {
            return Ok(RewardAmounts::ZERO);
        };
        let entitled = entitlement(info.amount, acc)?;
        Ok(entitled.saturating_sub(info.reward_debt))
    }

    /// Settle `user` against the current accumulators.
    ///
    /// Returns the rewards owed and re-bases the user's debt so that nothing
    /// is owed afterwards. Unknown users owe nothing and are not inserted.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] on overflow
    pub fn settle(&mut self, pool: &PoolState, user: &AccountId) -> Result<RewardAmounts> {
        let acc = pool.acc_per_share();
        let Some(info) = self.users.get_mut(user) else {
            return Ok(RewardAmounts::ZERO);
        };

        let entitled = entitlement(info.amount, acc)?;
        let owed = entitled.saturating_sub(info.reward_debt);
        info.reward_debt = entitled;

        tracing::trace!(
            user = %user,
            owed_crv = owed.crv,
            owed_cvx = owed.cvx,
            "ledger: settled"
        );
        Ok(owed)
    }

    /// Change `user`'s stake by `delta` and re-base their debt.
    ///
    /// Returns the user's new stake. Must follow [`settle`](Self::settle):
    /// any reward pending before the call is forfeited.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientStake`] if a decrease exceeds the stake
    /// - [`LedgerError::Math`] on overflow
    pub fn adjust_stake(
        &mut self,
        pool: &mut PoolState,
        user: &AccountId,
        delta: u128,
        change: StakeChange,
    ) -> Result<u128> {
        let current = self.users.get(user).map_or(0, |info| info.amount);

        let (amount, total_staked) = match change {
            StakeChange::Increase => (
                current.checked_add(delta).ok_or(MathError::Overflow)?,
                pool.total_staked
                    .checked_add(delta)
                    .ok_or(MathError::Overflow)?,
            ),
            StakeChange::Decrease => {
                if delta > current {
                    return Err(LedgerError::InsufficientStake {
                        requested: delta,
                        available: current,
                    });
                }
                (
                    current - delta,
                    pool.total_staked
                        .checked_sub(delta)
                        .ok_or(MathError::Overflow)?,
                )
            }
        };
        let reward_debt = entitlement(amount, pool.acc_per_share())?;

        let info = self.users.entry(*user).or_default();
        info.amount = amount;
        info.reward_debt = reward_debt;
        pool.total_staked = total_staked;

        tracing::trace!(
            user = %user,
            ?change,
            delta,
            amount,
            total_staked,
            "ledger: stake adjusted"
        );
        Ok(amount)
    }

    /// Sum of all user stakes.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Math`] on overflow
    pub fn total_of_users(&self) -> Result<u128> {
        self.users.values().try_fold(0u128, |acc, info| {
            acc.checked_add(info.amount)
                .ok_or(LedgerError::Math(MathError::Overflow))
        })
    }

    /// Whether user stakes sum to the pool total.
    pub fn is_conserved(&self, pool: &PoolState) -> bool {
        self.total_of_users()
            .map(|total| total == pool.total_staked)
            .unwrap_or(false)
    }
}

fn entitlement(amount: u128, acc: RewardAmounts) -> Result<RewardAmounts> {
    let mut entitled = RewardAmounts::ZERO;
    for token in RewardToken::ALL {
        entitled.set(token, mul_div(amount, acc.get(token), PRECISION)?);
    }
    Ok(entitled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold_harvest;

    const ALICE: AccountId = AccountId::repeat(0xa1);
    const BOB: AccountId = AccountId::repeat(0xb0);

    fn deposit(ledger: &mut ShareLedger, pool: &mut PoolState, user: &AccountId, amount: u128) {
        ledger.settle(pool, user).expect("settle");
        ledger
            .adjust_stake(pool, user, amount, StakeChange::Increase)
            .expect("increase");
    }

    #[test]
    fn test_unknown_user_owes_nothing() {
        let mut ledger = ShareLedger::new();
        let pool = PoolState::new();
        assert!(ledger.pending_reward(&pool, &ALICE).expect("pending").is_zero());
        assert!(ledger.settle(&pool, &ALICE).expect("settle").is_zero());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_proportional_pending() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 100);
        deposit(&mut ledger, &mut pool, &BOB, 300);

        fold_harvest(&mut pool, RewardAmounts::new(400, 40)).expect("fold");
        assert_eq!(
            ledger.pending_reward(&pool, &ALICE).expect("alice"),
            RewardAmounts::new(100, 10)
        );
        assert_eq!(
            ledger.pending_reward(&pool, &BOB).expect("bob"),
            RewardAmounts::new(300, 30)
        );
    }

    #[test]
    fn test_late_depositor_not_credited_with_earlier_rewards() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 100);
        fold_harvest(&mut pool, RewardAmounts::new(100, 0)).expect("fold");
        deposit(&mut ledger, &mut pool, &BOB, 100);

        assert!(ledger.pending_reward(&pool, &BOB).expect("bob").is_zero());
        assert_eq!(ledger.pending_reward(&pool, &ALICE).expect("alice").crv, 100);
    }

    #[test]
    fn test_settle_is_idempotent() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 10);
        fold_harvest(&mut pool, RewardAmounts::new(55, 5)).expect("fold");

        let first = ledger.settle(&pool, &ALICE).expect("settle");
        assert_eq!(first, RewardAmounts::new(55, 5));
        let second = ledger.settle(&pool, &ALICE).expect("settle again");
        assert!(second.is_zero());
        assert!(ledger.pending_reward(&pool, &ALICE).expect("pending").is_zero());
    }

    #[test]
    fn test_decrease_beyond_stake_rejected() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 10);

        let err = ledger
            .adjust_stake(&mut pool, &ALICE, 11, StakeChange::Decrease)
            .expect_err("should fail");
        assert_eq!(
            err,
            LedgerError::InsufficientStake {
                requested: 11,
                available: 10
            }
        );
        assert_eq!(pool.total_staked, 10);
    }

    #[test]
    fn test_decrease_rebases_debt() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 10);
        fold_harvest(&mut pool, RewardAmounts::new(100, 0)).expect("fold");

        ledger.settle(&pool, &ALICE).expect("settle");
        let remaining = ledger
            .adjust_stake(&mut pool, &ALICE, 4, StakeChange::Decrease)
            .expect("decrease");
        assert_eq!(remaining, 6);

        let info = ledger.user_info(&ALICE).expect("info");
        assert_eq!(info.reward_debt.crv, 60);
        assert!(ledger.pending_reward(&pool, &ALICE).expect("pending").is_zero());
    }

    #[test]
    fn test_conservation() {
        let mut ledger = ShareLedger::new();
        let mut pool = PoolState::new();
        deposit(&mut ledger, &mut pool, &ALICE, 10);
        deposit(&mut ledger, &mut pool, &BOB, 25);
        ledger
            .adjust_stake(&mut pool, &BOB, 25, StakeChange::Decrease)
            .expect("decrease");

        assert_eq!(ledger.total_of_users().expect("total"), 10);
        assert!(ledger.is_conserved(&pool));
        assert!(ledger.user_info(&BOB).expect("bob").is_inert());
    }
}

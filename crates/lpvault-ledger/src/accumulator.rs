//! Harvesting rewards into the pool.
//!
//! ## Formula
//!
//! ```text
//! reserve[R]  += harvested[R]
//! if total_staked > 0:
//!     acc[R]      += (orphaned[R] + harvested[R]) * PRECISION / total_staked
//!     orphaned[R]  = 0
//! else:
//!     orphaned[R] += harvested[R]
//! ```
//!
//! Harvest touches no user state. It must run before any user is settled,
//! so that settlement sees every reward earned up to now.

use lpvault_adapters::{TokenBank, YieldSource};
use lpvault_math::MathError;
use lpvault_types::{AccountId, RewardAmounts, RewardToken};

use crate::{PoolState, Result};

/// What a harvest collected and where it went.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HarvestOutcome {
    /// Rewards newly delivered by the source.
    pub harvested: RewardAmounts,
    /// Rewards folded into the accumulators, including released orphans.
    pub distributed: RewardAmounts,
    /// Orphaned rewards outstanding after the harvest.
    pub orphaned: RewardAmounts,
}

impl HarvestOutcome {
    /// Whether the harvest changed nothing.
    pub fn is_empty(&self) -> bool {
        self.harvested.is_zero() && self.distributed.is_zero()
    }
}

/// Pull rewards from `source` into `vault` and fold them into `pool`.
///
/// # Errors
///
/// - [`LedgerError::Adapter`](crate::LedgerError::Adapter) if the source fails
/// - [`LedgerError::Math`](crate::LedgerError::Math) if folding overflows
pub fn harvest<S: YieldSource + ?Sized>(
    pool: &mut PoolState,
    source: &mut S,
    bank: &mut dyn TokenBank,
    vault: &AccountId,
) -> Result<HarvestOutcome> {
    let harvested = source.harvest(bank, vault)?;
    fold_harvest(pool, harvested)
}

/// Fold `harvested` rewards into `pool`.
///
/// Leaves `pool` untouched on error.
///
/// # Errors
///
/// - [`LedgerError::Math`](crate::LedgerError::Math) on overflow
pub fn fold_harvest(pool: &mut PoolState, harvested: RewardAmounts) -> Result<HarvestOutcome> {
    let mut next = pool.clone();
    let mut distributed = RewardAmounts::ZERO;

    for token in RewardToken::ALL {
        let amount = harvested.get(token);
        let reserve = next
            .reserve
            .get(token)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;
        next.reserve.set(token, reserve);

        let unattributed = next
            .orphaned
            .get(token)
            .checked_add(amount)
            .ok_or(MathError::Overflow)?;

        if next.total_staked > 0 {
            let total_staked = next.total_staked;
            next.accumulator_mut(token)
                .accrue(unattributed, total_staked)?;
            next.orphaned.set(token, 0);
            distributed.set(token, unattributed);
        } else {
            next.orphaned.set(token, unattributed);
        }
    }

    if next.total_staked == 0 && !harvested.is_zero() {
        tracing::warn!(
            crv = harvested.crv,
            cvx = harvested.cvx,
            "harvest: nothing staked, rewards held as orphaned"
        );
    }
    if !distributed.is_zero() {
        tracing::trace!(
            crv = distributed.crv,
            cvx = distributed.cvx,
            total_staked = next.total_staked,
            acc_crv = next.acc_crv.value(),
            acc_cvx = next.acc_cvx.value(),
            "harvest: folded"
        );
    }

    *pool = next;
    Ok(HarvestOutcome {
        harvested,
        distributed,
        orphaned: pool.orphaned,
    })
}

/// Accumulator values after folding `extra` plus outstanding orphans.
///
/// Does not mutate. With nothing staked the current values are returned.
///
/// # Errors
///
/// - [`LedgerError::Math`](crate::LedgerError::Math) on overflow
pub fn projected_acc(pool: &PoolState, extra: RewardAmounts) -> Result<RewardAmounts> {
    let mut acc = RewardAmounts::ZERO;
    for token in RewardToken::ALL {
        let unattributed = pool
            .orphaned
            .get(token)
            .checked_add(extra.get(token))
            .ok_or(MathError::Overflow)?;
        let value = pool
            .accumulator(token)
            .projected(unattributed, pool.total_staked)?;
        acc.set(token, value);
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpvault_adapters::{InMemoryBank, StubFailure, StubYieldSource};
    use lpvault_math::PRECISION;
    use lpvault_types::Token;

    fn staked_pool(total: u128) -> PoolState {
        PoolState {
            total_staked: total,
            ..PoolState::default()
        }
    }

    #[test]
    fn test_fold_distributes_over_stake() {
        let mut pool = staked_pool(200);
        let outcome = fold_harvest(&mut pool, RewardAmounts::new(100, 50)).expect("fold");
        assert_eq!(outcome.distributed, RewardAmounts::new(100, 50));
        assert_eq!(pool.acc_crv.value(), 100 * PRECISION / 200);
        assert_eq!(pool.acc_cvx.value(), 50 * PRECISION / 200);
        assert_eq!(pool.reserve, RewardAmounts::new(100, 50));
    }

    #[test]
    fn test_zero_stake_orphans_then_folds() {
        let mut pool = staked_pool(0);
        let outcome = fold_harvest(&mut pool, RewardAmounts::new(30, 0)).expect("fold");
        assert!(outcome.distributed.is_zero());
        assert_eq!(outcome.orphaned, RewardAmounts::new(30, 0));
        assert!(pool.acc_per_share().is_zero());
        assert_eq!(pool.reserve.crv, 30);

        pool.total_staked = 10;
        let outcome = fold_harvest(&mut pool, RewardAmounts::new(20, 0)).expect("fold");
        assert_eq!(outcome.distributed, RewardAmounts::new(50, 0));
        assert!(pool.orphaned.is_zero());
        assert_eq!(pool.acc_crv.value(), 50 * PRECISION / 10);
    }

    #[test]
    fn test_empty_harvest_is_noop() {
        let mut pool = staked_pool(10);
        fold_harvest(&mut pool, RewardAmounts::new(7, 7)).expect("fold");
        let before = pool.clone();
        let outcome = fold_harvest(&mut pool, RewardAmounts::ZERO).expect("fold");
        assert!(outcome.is_empty());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_overflow_leaves_pool_untouched() {
        let mut pool = staked_pool(1);
        pool.reserve = RewardAmounts::new(u128::MAX, 0);
        let before = pool.clone();
        let err = fold_harvest(&mut pool, RewardAmounts::new(1, 1)).expect_err("overflow");
        assert_eq!(err, crate::LedgerError::Math(MathError::Overflow));
        assert_eq!(pool, before);
    }

    #[test]
    fn test_projected_matches_fold() {
        let mut pool = staked_pool(3);
        fold_harvest(&mut pool, RewardAmounts::new(10, 1)).expect("fold");
        let projected = projected_acc(&pool, RewardAmounts::new(5, 5)).expect("project");
        fold_harvest(&mut pool, RewardAmounts::new(5, 5)).expect("fold");
        assert_eq!(projected, pool.acc_per_share());
    }

    #[test]
    fn test_harvest_from_source() {
        let vault = AccountId::repeat(0x5a);
        let treasury = AccountId::repeat(0x7e);
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Crv, &treasury, 1_000).expect("mint");
        bank.mint(&Token::Cvx, &treasury, 1_000).expect("mint");

        let mut source = StubYieldSource::new(AccountId::repeat(0x01), treasury);
        source
            .queue_rewards(RewardAmounts::new(40, 20))
            .expect("queue");

        let mut pool = staked_pool(4);
        let outcome = harvest(&mut pool, &mut source, &mut bank, &vault).expect("harvest");
        assert_eq!(outcome.harvested, RewardAmounts::new(40, 20));
        assert_eq!(bank.balance_of(&Token::Crv, &vault), 40);
        assert_eq!(pool.acc_crv.value(), 10 * PRECISION);
    }

    #[test]
    fn test_harvest_failure_propagates() {
        let vault = AccountId::repeat(0x5a);
        let mut bank = InMemoryBank::new();
        let mut source = StubYieldSource::new(AccountId::repeat(0x01), AccountId::repeat(0x02));
        source.set_failure(Some(StubFailure::Harvest));

        let mut pool = staked_pool(4);
        let err = harvest(&mut pool, &mut source, &mut bank, &vault).expect_err("should fail");
        assert!(matches!(err, crate::LedgerError::Adapter(_)));
        assert_eq!(pool, staked_pool(4));
    }
}

//! Pool and user state.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use lpvault_math::FixedPointAccumulator;
use lpvault_types::{RewardAmounts, RewardToken};

/// Vault-wide reward accounting.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Pooled tokens deposited by all users.
    #[serde_as(as = "DisplayFromStr")]
    pub total_staked: u128,
    /// Reward-per-share for reward token A.
    pub acc_crv: FixedPointAccumulator,
    /// Reward-per-share for reward token B.
    pub acc_cvx: FixedPointAccumulator,
    /// Harvested rewards held by the vault and not yet paid out.
    pub reserve: RewardAmounts,
    /// Harvested rewards received while nothing was staked.
    pub orphaned: RewardAmounts,
}

impl PoolState {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulator for one reward token.
    pub fn accumulator(&self, token: RewardToken) -> &FixedPointAccumulator {
        match token {
            RewardToken::Crv => &self.acc_crv,
            RewardToken::Cvx => &self.acc_cvx,
        }
    }

    /// Mutable accumulator for one reward token.
    pub fn accumulator_mut(&mut self, token: RewardToken) -> &mut FixedPointAccumulator {
        match token {
            RewardToken::Crv => &mut self.acc_crv,
            RewardToken::Cvx => &mut self.acc_cvx,
        }
    }

    /// Current reward-per-share values, scaled by `PRECISION`.
    pub fn acc_per_share(&self) -> RewardAmounts {
        RewardAmounts::new(self.acc_crv.value(), self.acc_cvx.value())
    }

    /// Reserve that is owed to stakers, excluding orphaned rewards.
    pub fn distributable(&self) -> RewardAmounts {
        self.reserve.saturating_sub(self.orphaned)
    }
}

/// A user's position.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// The user's share of `total_staked`.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
    /// `amount * acc_per_share / PRECISION` as of the last settlement.
    pub reward_debt: RewardAmounts,
}

impl UserInfo {
    /// Whether the position holds no stake and carries no debt.
    pub fn is_inert(&self) -> bool {
        self.amount == 0 && self.reward_debt.is_zero()
    }
}

/// Serializable snapshot of a user's position.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfoView {
    /// Staked amount.
    #[serde_as(as = "DisplayFromStr")]
    pub amount: u128,
    /// CRV reward debt.
    #[serde_as(as = "DisplayFromStr")]
    pub reward_debt_crv: u128,
    /// CVX reward debt.
    #[serde_as(as = "DisplayFromStr")]
    pub reward_debt_cvx: u128,
}

impl From<&UserInfo> for UserInfoView {
    fn from(info: &UserInfo) -> Self {
        Self {
            amount: info.amount,
            reward_debt_crv: info.reward_debt.crv,
            reward_debt_cvx: info.reward_debt.cvx,
        }
    }
}

/// Serializable snapshot of the pool.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolView {
    /// Pooled tokens deposited by all users.
    #[serde_as(as = "DisplayFromStr")]
    pub total_staked: u128,
    /// Reward-per-share values, scaled by `PRECISION`.
    pub acc_per_share: RewardAmounts,
    /// Rewards held awaiting payout.
    pub reserve: RewardAmounts,
    /// Rewards harvested while nothing was staked.
    pub orphaned: RewardAmounts,
}

impl From<&PoolState> for PoolView {
    fn from(pool: &PoolState) -> Self {
        Self {
            total_staked: pool.total_staked,
            acc_per_share: pool.acc_per_share(),
            reserve: pool.reserve,
            orphaned: pool.orphaned,
        }
    }
}

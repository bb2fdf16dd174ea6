//! Reward tokens and per-token amounts.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::Token;

/// One of the two reward tokens distributed to stakers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardToken {
    /// Reward token A.
    Crv,
    /// Reward token B.
    Cvx,
}

impl RewardToken {
    /// Both reward tokens, in settlement order.
    pub const ALL: [RewardToken; 2] = [RewardToken::Crv, RewardToken::Cvx];

    /// The transferable token for this reward.
    pub fn token(self) -> Token {
        match self {
            RewardToken::Crv => Token::Crv,
            RewardToken::Cvx => Token::Cvx,
        }
    }
}

/// An amount for each reward token, in base units.
///
/// Amounts serialize as decimal strings so that full `u128` values survive
/// JSON consumers.
#[serde_as]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAmounts {
    /// Reward token A amount.
    #[serde_as(as = "DisplayFromStr")]
    pub crv: u128,
    /// Reward token B amount.
    #[serde_as(as = "DisplayFromStr")]
    pub cvx: u128,
}

impl RewardAmounts {
    /// Zero of both tokens.
    pub const ZERO: RewardAmounts = RewardAmounts { crv: 0, cvx: 0 };

    /// Create a pair of amounts.
    pub const fn new(crv: u128, cvx: u128) -> Self {
        Self { crv, cvx }
    }

    /// Amount for one token.
    pub fn get(&self, token: RewardToken) -> u128 {
        match token {
            RewardToken::Crv => self.crv,
            RewardToken::Cvx => self.cvx,
        }
    }

    /// Overwrite the amount for one token.
    pub fn set(&mut self, token: RewardToken, amount: u128) {
        match token {
            RewardToken::Crv => self.crv = amount,
            RewardToken::Cvx => self.cvx = amount,
        }
    }

    /// Whether both amounts are zero.
    pub fn is_zero(&self) -> bool {
        self.crv == 0 && self.cvx == 0
    }

    /// Component-wise checked addition.
    pub fn checked_add(self, other: RewardAmounts) -> Option<RewardAmounts> {
        Some(RewardAmounts {
            crv: self.crv.checked_add(other.crv)?,
            cvx: self.cvx.checked_add(other.cvx)?,
        })
    }

    /// Component-wise subtraction, clamped at zero.
    pub fn saturating_sub(self, other: RewardAmounts) -> RewardAmounts {
        RewardAmounts {
            crv: self.crv.saturating_sub(other.crv),
            cvx: self.cvx.saturating_sub(other.cvx),
        }
    }

    /// Component-wise minimum.
    pub fn min(self, other: RewardAmounts) -> RewardAmounts {
        RewardAmounts {
            crv: self.crv.min(other.crv),
            cvx: self.cvx.min(other.cvx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set() {
        let mut amounts = RewardAmounts::ZERO;
        assert!(amounts.is_zero());
        amounts.set(RewardToken::Cvx, 7);
        assert_eq!(amounts.get(RewardToken::Crv), 0);
        assert_eq!(amounts.get(RewardToken::Cvx), 7);
        assert!(!amounts.is_zero());
    }

    #[test]
    fn test_checked_add_overflow() {
        let a = RewardAmounts::new(u128::MAX, 0);
        assert!(a.checked_add(RewardAmounts::new(1, 0)).is_none());
        assert_eq!(
            a.checked_add(RewardAmounts::new(0, 3)),
            Some(RewardAmounts::new(u128::MAX, 3))
        );
    }

    #[test]
    fn test_saturating_sub_and_min() {
        let a = RewardAmounts::new(10, 3);
        let b = RewardAmounts::new(4, 5);
        assert_eq!(a.saturating_sub(b), RewardAmounts::new(6, 0));
        assert_eq!(a.min(b), RewardAmounts::new(4, 3));
    }

    #[test]
    fn test_reward_token_mapping() {
        assert_eq!(RewardToken::Crv.token(), Token::Crv);
        assert_eq!(RewardToken::Cvx.token(), Token::Cvx);
        assert_eq!(RewardToken::ALL.len(), 2);
    }

    #[test]
    fn test_amounts_serialize_as_strings() {
        let amounts = RewardAmounts::new(u128::MAX, 5);
        let json = serde_json::to_value(amounts).expect("serialize");
        assert_eq!(json["crv"], u128::MAX.to_string());
        assert_eq!(json["cvx"], "5");
    }
}

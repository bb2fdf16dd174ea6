//! Observable vault events.
//!
//! Every successful state-changing operation appends one event to the
//! vault's event log; the daemon forwards them to subscribers.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::{AccountId, RewardAmounts, Token};

/// An event emitted by the vault.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum VaultEvent {
    /// A user staked `amount` pooled tokens.
    Deposit {
        user: AccountId,
        #[serde_as(as = "DisplayFromStr")]
        amount: u128,
    },
    /// A user unstaked `amount` pooled tokens (the clamped amount).
    Withdraw {
        user: AccountId,
        #[serde_as(as = "DisplayFromStr")]
        amount: u128,
    },
    /// A user received settled rewards; amounts are what was paid.
    Claim {
        user: AccountId,
        #[serde_as(as = "DisplayFromStr")]
        crv_reward: u128,
        #[serde_as(as = "DisplayFromStr")]
        cvx_reward: u128,
    },
    /// Rewards were collected from the yield source.
    Harvest {
        harvested: RewardAmounts,
        orphaned: RewardAmounts,
    },
    /// The owner changed the conversion allow-list.
    AssetAllowListUpdated { asset: Token, allowed: bool },
}

impl VaultEvent {
    /// Event name, matching the serialized `event_type` tag in CamelCase.
    pub fn name(&self) -> &'static str {
        match self {
            VaultEvent::Deposit { .. } => "Deposit",
            VaultEvent::Withdraw { .. } => "Withdraw",
            VaultEvent::Claim { .. } => "Claim",
            VaultEvent::Harvest { .. } => "Harvest",
            VaultEvent::AssetAllowListUpdated { .. } => "AssetAllowListUpdated",
        }
    }

    /// The user this event concerns, if any.
    pub fn user(&self) -> Option<&AccountId> {
        match self {
            VaultEvent::Deposit { user, .. }
            | VaultEvent::Withdraw { user, .. }
            | VaultEvent::Claim { user, .. } => Some(user),
            VaultEvent::Harvest { .. } | VaultEvent::AssetAllowListUpdated { .. } => None,
        }
    }
}

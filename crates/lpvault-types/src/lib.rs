//! # lpvault-types
//!
//! Shared domain types used across the lpvault workspace.
//!
//! ## Modules
//!
//! - [`account`] — 32-byte account identifiers
//! - [`token`] — Token identities (pooled LP, rewards, convertible assets)
//! - [`rewards`] — The two reward tokens and per-token amount pairs
//! - [`events`] — Observable vault events

pub mod account;
pub mod events;
pub mod rewards;
pub mod token;

pub use account::AccountId;
pub use events::VaultEvent;
pub use rewards::{RewardAmounts, RewardToken};
pub use token::Token;

/// Withdraw amount meaning "the caller's entire remaining stake".
pub const WITHDRAW_ALL: u128 = u128::MAX;

/// Fixed-point scale for exchange rates and emission rates (1e18).
pub const RATE_SCALE: u128 = 1_000_000_000_000_000_000;

/// Base units per whole token (18 decimals).
pub const UNIT: u128 = 1_000_000_000_000_000_000;

/// One day in seconds.
pub const DAY_SECS: u64 = 24 * 60 * 60;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_withdraw_all_is_max() {
        assert_eq!(WITHDRAW_ALL, u128::MAX);
    }

    #[test]
    fn test_unit_matches_rate_scale() {
        assert_eq!(UNIT, RATE_SCALE);
        assert_eq!(DAY_SECS, 86_400);
    }
}

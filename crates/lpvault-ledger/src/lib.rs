//! # lpvault-ledger
//!
//! Pool-wide reward accounting and per-user share bookkeeping.
//!
//! Rewards arrive from the yield source in irregular lumps. The pool folds
//! each lump into a cumulative reward-per-share value, and each user's
//! entitlement is the growth of that value over their stake since their
//! last settlement. This keeps every claim O(1) in the number of stakers.
//!
//! ## Modules
//!
//! - [`state`] — Pool and per-user state, plus their serializable views
//! - [`accumulator`] — Harvesting and folding rewards into the pool
//! - [`ledger`] — Per-user settlement and stake adjustment

pub mod accumulator;
pub mod ledger;
pub mod state;

pub use accumulator::{fold_harvest, harvest, projected_acc, HarvestOutcome};
pub use ledger::{ShareLedger, StakeChange};
pub use state::{PoolState, PoolView, UserInfo, UserInfoView};

use lpvault_adapters::AdapterError;
use lpvault_math::MathError;

/// Error types for ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A decrease larger than the user's stake.
    #[error("insufficient stake: requested {requested}, available {available}")]
    InsufficientStake {
        /// Amount requested.
        requested: u128,
        /// Amount staked by the user.
        available: u128,
    },

    /// Accumulator arithmetic failed.
    #[error("arithmetic error: {0}")]
    Math(#[from] MathError),

    /// The yield source failed during harvest.
    #[error("yield source error: {0}")]
    Adapter(#[from] AdapterError),
}

/// Convenience result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

//! # lpvault-adapters
//!
//! Collaborators the vault core talks to, each behind a capability trait.
//!
//! The core never reaches past these traits: token movement goes through
//! [`TokenBank`], staking and reward collection through [`YieldSource`], and
//! asset conversion through [`ConversionRouter`]. In-process implementations
//! back the tests and the simulation daemon.
//!
//! ## Modules
//!
//! - [`bank`] — Token balances and transfers
//! - [`clock`] — Shared simulated clock
//! - [`source`] — The yield-source capability trait
//! - [`booster`] — Time-based staking/reward simulation
//! - [`stub`] — Scripted yield source with failure injection
//! - [`router`] — Conversion router trait and fixed-rate stub

pub mod bank;
pub mod booster;
pub mod clock;
pub mod router;
pub mod source;
pub mod stub;

pub use bank::{InMemoryBank, TokenBank};
pub use booster::SimulatedBooster;
pub use clock::SimClock;
pub use router::{ConversionRouter, StubRouter};
pub use source::YieldSource;
pub use stub::{StubFailure, StubYieldSource};

use lpvault_math::MathError;
use lpvault_types::{AccountId, Token};

/// Error types for token movement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BankError {
    /// The sender does not hold enough of the token.
    #[error("insufficient {token} balance for {account}: need {required}, have {available}")]
    InsufficientBalance {
        /// Token being moved.
        token: Token,
        /// Account being debited.
        account: AccountId,
        /// Amount requested.
        required: u128,
        /// Amount held.
        available: u128,
    },

    /// A credit would overflow the recipient's balance.
    #[error("balance overflow")]
    Overflow,
}

/// Error types for yield-source operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Unstake requested more than is staked at the source.
    #[error("insufficient staked balance: requested {requested}, staked {staked}")]
    InsufficientStaked {
        /// Amount requested.
        requested: u128,
        /// Amount staked.
        staked: u128,
    },

    /// The source's reward treasury cannot cover a harvest.
    #[error("reward treasury depleted: {0}")]
    RewardsDepleted(BankError),

    /// Moving the pooled token failed.
    #[error("token movement failed: {0}")]
    Bank(#[from] BankError),

    /// Reward arithmetic overflowed.
    #[error("arithmetic error: {0}")]
    Math(#[from] MathError),

    /// The source rejected the call.
    #[error("yield source unavailable: {0}")]
    Unavailable(String),
}

/// Error types for conversion routing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// No rate is configured for the token.
    #[error("unsupported asset: {0}")]
    UnsupportedAsset(Token),

    /// The router cannot deliver the output amount.
    #[error("insufficient liquidity: need {required} {token}, have {available}")]
    InsufficientLiquidity {
        /// Token that would be delivered.
        token: Token,
        /// Amount required.
        required: u128,
        /// Amount available.
        available: u128,
    },

    /// The conversion would yield nothing.
    #[error("conversion yields zero output")]
    ZeroOutput,

    /// Moving the input token failed.
    #[error("token movement failed: {0}")]
    Bank(#[from] BankError),

    /// Rate arithmetic overflowed.
    #[error("arithmetic error: {0}")]
    Math(#[from] MathError),

    /// The router rejected the call.
    #[error("router unavailable")]
    Unavailable,
}

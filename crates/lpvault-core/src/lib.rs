//! # lpvault-core
//!
//! The vault controller: deposit, withdraw and claim against a share-based
//! dual-reward ledger.
//!
//! Every state-changing operation follows the same order:
//!
//! 1. harvest the yield source into the pool accumulators
//! 2. settle the caller against the updated accumulators
//! 3. adjust the caller's stake
//! 4. talk to the yield source, router and bank
//!
//! Each operation is atomic: on any error the vault and its collaborators
//! are restored to the state they had before the call.
//!
//! ## Modules
//!
//! - [`config`] — Vault configuration and the asset allow-list
//! - [`vault`] — The vault controller

pub mod config;
pub mod vault;

pub use config::VaultConfig;
pub use vault::VaultController;

use lpvault_adapters::{AdapterError, BankError, RouterError};
use lpvault_ledger::LedgerError;
use lpvault_math::MathError;
use lpvault_types::{AccountId, Token};

/// Error types for vault operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VaultError {
    /// Deposit or withdraw of zero.
    #[error("amount must be non-zero")]
    ZeroAmount,

    /// Withdraw from an empty position, or a decrease beyond the stake.
    #[error("insufficient stake: requested {requested}, available {available}")]
    InsufficientStake {
        /// Amount requested.
        requested: u128,
        /// Amount staked by the caller.
        available: u128,
    },

    /// The yield source failed.
    #[error("yield source failure: {0}")]
    AdapterFailure(AdapterError),

    /// Converting an asset failed.
    #[error("conversion failure: {0}")]
    ConversionFailure(RouterError),

    /// Moving tokens failed.
    #[error("transfer failure: {0}")]
    TransferFailure(BankError),

    /// The asset cannot be deposited, withdrawn to, or allow-listed.
    #[error("asset not allowed: {0}")]
    AssetNotAllowed(Token),

    /// The caller is not the vault owner.
    #[error("unauthorized caller: {0}")]
    Unauthorized(AccountId),

    /// Reward arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(MathError),
}

impl From<LedgerError> for VaultError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStake {
                requested,
                available,
            } => VaultError::InsufficientStake {
                requested,
                available,
            },
            LedgerError::Math(e) => VaultError::Arithmetic(e),
            LedgerError::Adapter(e) => VaultError::AdapterFailure(e),
        }
    }
}

impl From<MathError> for VaultError {
    fn from(err: MathError) -> Self {
        VaultError::Arithmetic(err)
    }
}

/// Convenience result type for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

//! Vault configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use lpvault_types::{AccountId, Token};

use crate::{Result, VaultError};

/// Static vault parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Account allowed to administer the vault.
    pub owner: AccountId,
    /// Account holding the vault's tokens.
    pub account: AccountId,
    /// Assets accepted for conversion on deposit, withdraw and claim.
    pub allowed_assets: BTreeSet<Token>,
}

impl VaultConfig {
    /// Create a configuration accepting the native asset plus `allowed_assets`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AssetNotAllowed`] if an asset is the pooled token or a reward token
    pub fn new(
        owner: AccountId,
        account: AccountId,
        allowed_assets: impl IntoIterator<Item = Token>,
    ) -> Result<Self> {
        let mut assets = BTreeSet::from([Token::Native]);
        for asset in allowed_assets {
            if !asset.is_convertible() {
                return Err(VaultError::AssetNotAllowed(asset));
            }
            assets.insert(asset);
        }
        Ok(Self {
            owner,
            account,
            allowed_assets: assets,
        })
    }

    /// Whether `asset` may be converted through the router.
    pub fn accepts(&self, asset: &Token) -> bool {
        asset.is_convertible() && self.allowed_assets.contains(asset)
    }
}

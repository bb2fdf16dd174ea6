//! Account identifiers.
//!
//! Every participant (depositor, vault, yield source, router) is addressed by
//! a 32-byte identifier. It serializes as a lowercase hex string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;
use serde_with::serde_as;

/// A 32-byte account identifier.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(#[serde_as(as = "Hex")] pub [u8; 32]);

/// Errors returned when parsing an [`AccountId`] from text.
#[derive(Debug, thiserror::Error)]
pub enum ParseAccountIdError {
    /// The input was not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    /// The decoded input was not exactly 32 bytes.
    #[error("account id must be 32 bytes, got {0}")]
    Length(usize),
}

impl AccountId {
    /// The all-zero account, never a valid participant.
    pub const ZERO: AccountId = AccountId([0u8; 32]);

    /// Create an account id from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create an account id with every byte set to `byte`.
    pub const fn repeat(byte: u8) -> Self {
        Self([byte; 32])
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether this is the all-zero account.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 4 bytes are enough to tell accounts apart in logs.
        write!(f, "AccountId({}..)", hex::encode(&self.0[..4]))
    }
}

impl FromStr for AccountId {
    type Err = ParseAccountIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)?;
        let len = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseAccountIdError::Length(len))?;
        Ok(Self(array))
    }
}

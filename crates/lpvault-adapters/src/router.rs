//! Asset conversion.
//!
//! The vault accepts deposits in, and pays withdrawals and claims out as,
//! assets other than the pooled token. A [`ConversionRouter`] turns one
//! token into another at the router's price.
//!
//! [`StubRouter`] prices every token against a common unit: a rate of
//! `RATE_SCALE` means one token is worth one unit. The pooled token is
//! priced at `RATE_SCALE` unless configured otherwise.

use std::collections::BTreeMap;

use lpvault_math::mul_div;
use lpvault_types::{AccountId, Token, RATE_SCALE};

use crate::{RouterError, TokenBank};

/// Converts between tokens held in a [`TokenBank`].
pub trait ConversionRouter: Send {
    /// Swap `amount` of `from` held by `holder` into `to`, credited to `holder`.
    ///
    /// Returns the amount of `to` delivered.
    ///
    /// # Errors
    ///
    /// - [`RouterError::UnsupportedAsset`] if either token has no route
    /// - [`RouterError::ZeroOutput`] if the conversion rounds to nothing
    /// - [`RouterError::InsufficientLiquidity`] if the router cannot pay out
    fn swap(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: &AccountId,
        from: &Token,
        to: &Token,
        amount: u128,
    ) -> Result<u128, RouterError>;

    /// Convert `amount` of `asset` into the pooled token.
    fn convert_in(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: &AccountId,
        asset: &Token,
        amount: u128,
    ) -> Result<u128, RouterError> {
        self.swap(bank, holder, asset, &Token::Lp, amount)
    }

    /// Convert `pooled` units of the pooled token into `asset`.
    fn convert_out(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: &AccountId,
        pooled: u128,
        asset: &Token,
    ) -> Result<u128, RouterError> {
        self.swap(bank, holder, &Token::Lp, asset, pooled)
    }
}

/// A fixed-rate router with its own liquidity account.
#[derive(Debug, Clone)]
pub struct StubRouter {
    account: AccountId,
    rates: BTreeMap<Token, u128>,
    available: bool,
}

impl StubRouter {
    /// Create a router paying out of `account`, with only the pooled token priced.
    pub fn new(account: AccountId) -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(Token::Lp, RATE_SCALE);
        Self {
            account,
            rates,
            available: true,
        }
    }

    /// Add a price for `token`, scaled by `RATE_SCALE`.
    pub fn with_rate(mut self, token: Token, rate: u128) -> Self {
        self.rates.insert(token, rate);
        self
    }

    /// The router's liquidity account.
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Current price of `token`, if routed.
    pub fn rate(&self, token: &Token) -> Option<u128> {
        self.rates.get(token).copied()
    }

    /// Change a price (development/testing only).
    ///
    /// A zero rate removes the route.
    pub fn dev_set_rate(&mut self, token: Token, rate: u128) {
        tracing::warn!(%token, new_rate = rate, "stub router: rate changed (dev only)");
        if rate == 0 {
            self.rates.remove(&token);
        } else {
            self.rates.insert(token, rate);
        }
    }

    /// Take the router offline or bring it back.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Output of swapping `amount` of `from` into `to`, without executing.
    ///
    /// # Errors
    ///
    /// - [`RouterError::UnsupportedAsset`] if either token has no rate
    /// - [`RouterError::Math`] if the conversion overflows
    pub fn quote(&self, from: &Token, to: &Token, amount: u128) -> Result<u128, RouterError> {
        let rate_from = self
            .rate(from)
            .ok_or_else(|| RouterError::UnsupportedAsset(from.clone()))?;
        let rate_to = self
            .rate(to)
            .ok_or_else(|| RouterError::UnsupportedAsset(to.clone()))?;
        Ok(mul_div(amount, rate_from, rate_to)?)
    }
}

impl ConversionRouter for StubRouter {
    fn swap(
        &mut self,
        bank: &mut dyn TokenBank,
        holder: &AccountId,
        from: &Token,
        to: &Token,
        amount: u128,
    ) -> Result<u128, RouterError> {
        if !self.available {
            return Err(RouterError::Unavailable);
        }
        if from == to {
            return Ok(amount);
        }

        let out = self.quote(from, to, amount)?;
        if out == 0 {
            return Err(RouterError::ZeroOutput);
        }
        let liquidity = bank.balance_of(to, &self.account);
        if liquidity < out {
            return Err(RouterError::InsufficientLiquidity {
                token: to.clone(),
                required: out,
                available: liquidity,
            });
        }

        bank.transfer(from, holder, &self.account, amount)?;
        bank.transfer(to, &self.account, holder, out)?;

        tracing::debug!(%from, %to, amount_in = amount, amount_out = out, "router: swapped");
        Ok(out)
    }
}

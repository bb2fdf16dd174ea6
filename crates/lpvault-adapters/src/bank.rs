//! Token balances and transfers.
//!
//! The vault treats token transport as an external concern with standard
//! transfer semantics: a transfer either moves the full amount or fails
//! without effect.

use std::collections::BTreeMap;

use lpvault_types::{AccountId, Token};

use crate::BankError;

/// Capability to read balances and move tokens.
pub trait TokenBank: Send {
    /// Balance of `token` held by `account`.
    fn balance_of(&self, token: &Token, account: &AccountId) -> u128;

    /// Move `amount` of `token` from `from` to `to`.
    ///
    /// A zero amount or a self-transfer succeeds without effect.
    ///
    /// # Errors
    ///
    /// - [`BankError::InsufficientBalance`] if `from` holds less than `amount`
    /// - [`BankError::Overflow`] if the credit overflows `to`'s balance
    fn transfer(
        &mut self,
        token: &Token,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), BankError>;
}

/// An in-memory ledger of token balances.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBank {
    balances: BTreeMap<(Token, AccountId), u128>,
}

impl InMemoryBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new units of `token` in `to`'s balance.
    ///
    /// # Errors
    ///
    /// - [`BankError::Overflow`] if the balance would overflow
    pub fn mint(&mut self, token: &Token, to: &AccountId, amount: u128) -> Result<(), BankError> {
        let balance = self.balances.entry((token.clone(), *to)).or_insert(0);
        *balance = balance.checked_add(amount).ok_or(BankError::Overflow)?;
        tracing::debug!(%token, account = %to, amount, "bank: minted");
        Ok(())
    }

    /// Sum of all balances of `token`.
    pub fn total_supply(&self, token: &Token) -> u128 {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .fold(0u128, |acc, (_, amount)| acc.saturating_add(*amount))
    }
}

impl TokenBank for InMemoryBank {
    fn balance_of(&self, token: &Token, account: &AccountId) -> u128 {
        self.balances
            .get(&(token.clone(), *account))
            .copied()
            .unwrap_or(0)
    }

    fn transfer(
        &mut self,
        token: &Token,
        from: &AccountId,
        to: &AccountId,
        amount: u128,
    ) -> Result<(), BankError> {
        if amount == 0 || from == to {
            return Ok(());
        }

        let available = self.balance_of(token, from);
        if available < amount {
            return Err(BankError::InsufficientBalance {
                token: token.clone(),
                account: *from,
                required: amount,
                available,
            });
        }
        let credited = self
            .balance_of(token, to)
            .checked_add(amount)
            .ok_or(BankError::Overflow)?;

        self.balances
            .insert((token.clone(), *from), available - amount);
        self.balances.insert((token.clone(), *to), credited);

        tracing::trace!(%token, from = %from, to = %to, amount, "bank: transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: AccountId = AccountId::repeat(0xa1);
    const BOB: AccountId = AccountId::repeat(0xb0);

    #[test]
    fn test_mint_and_balance() {
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Lp, &ALICE, 500).expect("mint");
        assert_eq!(bank.balance_of(&Token::Lp, &ALICE), 500);
        assert_eq!(bank.balance_of(&Token::Crv, &ALICE), 0);
        assert_eq!(bank.total_supply(&Token::Lp), 500);
    }

    #[test]
    fn test_transfer_moves_exact_amount() {
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Lp, &ALICE, 500).expect("mint");
        bank.transfer(&Token::Lp, &ALICE, &BOB, 200).expect("transfer");
        assert_eq!(bank.balance_of(&Token::Lp, &ALICE), 300);
        assert_eq!(bank.balance_of(&Token::Lp, &BOB), 200);
        assert_eq!(bank.total_supply(&Token::Lp), 500);
    }

    #[test]
    fn test_transfer_insufficient_has_no_effect() {
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Lp, &ALICE, 10).expect("mint");
        let err = bank
            .transfer(&Token::Lp, &ALICE, &BOB, 11)
            .expect_err("should fail");
        assert_eq!(
            err,
            BankError::InsufficientBalance {
                token: Token::Lp,
                account: ALICE,
                required: 11,
                available: 10,
            }
        );
        assert_eq!(bank.balance_of(&Token::Lp, &ALICE), 10);
        assert_eq!(bank.balance_of(&Token::Lp, &BOB), 0);
    }

    #[test]
    fn test_zero_and_self_transfer() {
        let mut bank = InMemoryBank::new();
        bank.transfer(&Token::Lp, &ALICE, &BOB, 0).expect("zero");
        bank.mint(&Token::Lp, &ALICE, 5).expect("mint");
        bank.transfer(&Token::Lp, &ALICE, &ALICE, 5).expect("self");
        assert_eq!(bank.balance_of(&Token::Lp, &ALICE), 5);
    }

    #[test]
    fn test_mint_overflow() {
        let mut bank = InMemoryBank::new();
        bank.mint(&Token::Crv, &ALICE, u128::MAX).expect("mint");
        assert_eq!(bank.mint(&Token::Crv, &ALICE, 1), Err(BankError::Overflow));
    }
}

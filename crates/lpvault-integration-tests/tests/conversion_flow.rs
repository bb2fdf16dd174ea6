//! Integration test: depositing, withdrawing and claiming in other assets.
//!
//! Exercises the conversion paths end to end:
//! 1. Native deposits are swapped into LP before staking
//! 2. Withdrawals and claims can be delivered in an accepted asset
//! 3. The allow-list is owner-controlled and excludes LP and reward tokens
//! 4. A failed swap leaves every balance untouched

use lpvault_adapters::{InMemoryBank, RouterError, StubRouter, StubYieldSource, TokenBank};
use lpvault_core::{VaultConfig, VaultController, VaultError};
use lpvault_types::{AccountId, RewardAmounts, Token, VaultEvent, RATE_SCALE, UNIT};

const OWNER: AccountId = AccountId::repeat(0x0a);
const VAULT: AccountId = AccountId::repeat(0x5a);
const POOL: AccountId = AccountId::repeat(0xc0);
const TREASURY: AccountId = AccountId::repeat(0xc1);
const ROUTER: AccountId = AccountId::repeat(0xe0);
const ALICE: AccountId = AccountId::repeat(0xa1);
const BOB: AccountId = AccountId::repeat(0xb0);

type Vault = VaultController<StubYieldSource, StubRouter, InMemoryBank>;

fn usdc() -> Token {
    Token::Erc20("USDC".to_string())
}

/// Helper: one LP is worth two native units; USDC and both rewards trade 1:1 with LP.
fn setup() -> Vault {
    let mut bank = InMemoryBank::new();
    for user in [ALICE, BOB] {
        bank.mint(&Token::Native, &user, 500 * UNIT).expect("mint native");
        bank.mint(&usdc(), &user, 500 * UNIT).expect("mint usdc");
    }
    bank.mint(&Token::Crv, &TREASURY, 1_000 * UNIT).expect("mint crv");
    bank.mint(&Token::Cvx, &TREASURY, 1_000 * UNIT).expect("mint cvx");
    for token in [Token::Lp, Token::Native, usdc()] {
        bank.mint(&token, &ROUTER, 10_000 * UNIT).expect("mint router");
    }

    let router = StubRouter::new(ROUTER)
        .with_rate(Token::Native, RATE_SCALE / 2)
        .with_rate(Token::Crv, RATE_SCALE)
        .with_rate(Token::Cvx, RATE_SCALE)
        .with_rate(usdc(), RATE_SCALE);
    let config = VaultConfig::new(OWNER, VAULT, [Token::Native]).expect("config");
    VaultController::new(config, StubYieldSource::new(POOL, TREASURY), router, bank)
}

fn held(vault: &Vault, token: &Token, user: &AccountId) -> u128 {
    vault.bank().balance_of(token, user)
}

#[test]
fn native_round_trip_through_the_pool() {
    let mut vault = setup();

    // =========================================================
    // 200 native buys 100 LP of stake
    // =========================================================
    let pooled = vault
        .deposit(&ALICE, 200 * UNIT, &Token::Native)
        .expect("deposit native");
    assert_eq!(pooled, 100 * UNIT);
    assert_eq!(vault.user_info(&ALICE).amount, 100 * UNIT);
    assert_eq!(held(&vault, &Token::Native, &ALICE), 300 * UNIT);
    assert_eq!(held(&vault, &Token::Lp, &POOL), 100 * UNIT);
    assert_eq!(held(&vault, &Token::Native, &VAULT), 0);
    assert!(vault.take_events().contains(&VaultEvent::Deposit {
        user: ALICE,
        amount: 100 * UNIT,
    }));

    // =========================================================
    // Half the stake comes back as native
    // =========================================================
    let withdrawn = vault
        .withdraw(&ALICE, 50 * UNIT, &Token::Native)
        .expect("withdraw native");
    assert_eq!(withdrawn, 50 * UNIT);
    assert_eq!(held(&vault, &Token::Native, &ALICE), 400 * UNIT);
    assert_eq!(held(&vault, &Token::Lp, &ALICE), 0);
    assert_eq!(vault.pool_info().total_staked, 50 * UNIT);

    // =========================================================
    // Rewards are delivered as native when asked
    // =========================================================
    vault
        .source_mut()
        .queue_rewards(RewardAmounts::new(10 * UNIT, 20 * UNIT))
        .expect("queue");
    let paid = vault.claim(&ALICE, Some(&Token::Native)).expect("claim");
    assert_eq!(paid, RewardAmounts::new(10 * UNIT, 20 * UNIT));
    // 10 CRV and 20 CVX, each at two native per unit.
    assert_eq!(held(&vault, &Token::Native, &ALICE), 460 * UNIT);
    assert_eq!(held(&vault, &Token::Crv, &ALICE), 0);
    assert_eq!(held(&vault, &Token::Cvx, &ALICE), 0);
    assert!(vault.pool_info().reserve.is_zero());
}

#[test]
fn allow_list_is_owner_controlled() {
    let mut vault = setup();
    assert!(vault.is_asset_allowed(&Token::Native));
    assert!(!vault.is_asset_allowed(&usdc()));

    assert_eq!(
        vault.deposit(&ALICE, 10 * UNIT, &usdc()),
        Err(VaultError::AssetNotAllowed(usdc()))
    );
    assert_eq!(
        vault.set_asset_allowed(&BOB, &usdc(), true),
        Err(VaultError::Unauthorized(BOB))
    );

    vault
        .set_asset_allowed(&OWNER, &usdc(), true)
        .expect("allow usdc");
    assert!(vault.take_events().contains(&VaultEvent::AssetAllowListUpdated {
        asset: usdc(),
        allowed: true,
    }));

    let pooled = vault.deposit(&ALICE, 10 * UNIT, &usdc()).expect("deposit usdc");
    assert_eq!(pooled, 10 * UNIT);

    vault
        .set_asset_allowed(&OWNER, &usdc(), false)
        .expect("disallow usdc");
    assert_eq!(
        vault.withdraw(&ALICE, 10 * UNIT, &usdc()),
        Err(VaultError::AssetNotAllowed(usdc()))
    );
    assert_eq!(vault.user_info(&ALICE).amount, 10 * UNIT);
}

#[test]
fn pooled_and_reward_tokens_cannot_be_allow_listed() {
    let mut vault = setup();
    for token in [Token::Lp, Token::Crv, Token::Cvx] {
        assert_eq!(
            vault.set_asset_allowed(&OWNER, &token, true),
            Err(VaultError::AssetNotAllowed(token.clone()))
        );
    }

    vault.deposit(&ALICE, 20 * UNIT, &Token::Native).expect("deposit");
    assert_eq!(
        vault.claim(&ALICE, Some(&Token::Lp)),
        Err(VaultError::AssetNotAllowed(Token::Lp))
    );
}

#[test]
fn router_outage_leaves_balances_untouched() {
    let mut vault = setup();
    vault.deposit(&ALICE, 100 * UNIT, &Token::Native).expect("deposit");
    vault.take_events();

    vault.router_mut().set_available(false);
    let pool_before = vault.pool_info();
    let native_before = held(&vault, &Token::Native, &ALICE);

    assert_eq!(
        vault.deposit(&ALICE, 100 * UNIT, &Token::Native),
        Err(VaultError::ConversionFailure(RouterError::Unavailable))
    );
    assert_eq!(
        vault.withdraw(&ALICE, 10 * UNIT, &Token::Native),
        Err(VaultError::ConversionFailure(RouterError::Unavailable))
    );

    assert_eq!(vault.pool_info(), pool_before);
    assert_eq!(held(&vault, &Token::Native, &ALICE), native_before);
    assert!(vault.events().is_empty());

    vault.router_mut().set_available(true);
    let withdrawn = vault
        .withdraw(&ALICE, 10 * UNIT, &Token::Native)
        .expect("withdraw after recovery");
    assert_eq!(withdrawn, 10 * UNIT);
    assert_eq!(held(&vault, &Token::Native, &ALICE), native_before + 20 * UNIT);
}

//! The vault controller.
//!
//! Owns the pool state, the user ledger and the three collaborators. All
//! mutating operations take `&mut self`, so a call can never observe another
//! call's half-applied state.

use lpvault_adapters::{ConversionRouter, RouterError, TokenBank, YieldSource};
use lpvault_ledger::{
    accumulator, projected_acc, HarvestOutcome, PoolState, PoolView, ShareLedger, StakeChange,
    UserInfoView,
};
use lpvault_math::MathError;
use lpvault_types::{AccountId, RewardAmounts, RewardToken, Token, VaultEvent};

use crate::{Result, VaultConfig, VaultError};

/// Everything an operation may change, captured before it runs.
struct Checkpoint<S, R, B> {
    config: VaultConfig,
    pool: PoolState,
    ledger: ShareLedger,
    source: S,
    router: R,
    bank: B,
    events_len: usize,
}

/// A yield-aggregating vault over one pooled token and two reward tokens.
pub struct VaultController<S, R, B> {
    config: VaultConfig,
    pool: PoolState,
    ledger: ShareLedger,
    source: S,
    router: R,
    bank: B,
    events: Vec<VaultEvent>,
}

impl<S, R, B> VaultController<S, R, B>
where
    S: YieldSource + Clone,
    R: ConversionRouter + Clone,
    B: TokenBank + Clone,
{
    /// Create an empty vault.
    pub fn new(config: VaultConfig, source: S, router: R, bank: B) -> Self {
        tracing::info!(
            owner = %config.owner,
            account = %config.account,
            source = source.name(),
            "vault: created"
        );
        Self {
            config,
            pool: PoolState::new(),
            ledger: ShareLedger::new(),
            source,
            router,
            bank,
            events: Vec::new(),
        }
    }

    /// Deposit `amount` of `input` on behalf of `user`.
    ///
    /// `input` is either the pooled token or an accepted asset, which is
    /// converted into the pooled token first. Rewards owed to `user` before
    /// the deposit are paid out. Returns the pooled amount staked.
    ///
    /// # Errors
    ///
    /// - [`VaultError::ZeroAmount`] if `amount` is zero
    /// - [`VaultError::AssetNotAllowed`] if `input` is not accepted
    /// - [`VaultError::TransferFailure`] if `user` cannot pay
    /// - [`VaultError::ConversionFailure`] if the router fails
    /// - [`VaultError::AdapterFailure`] if the yield source fails
    pub fn deposit(&mut self, user: &AccountId, amount: u128, input: &Token) -> Result<u128> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if !input.is_pooled() && !self.config.accepts(input) {
            return Err(VaultError::AssetNotAllowed(input.clone()));
        }

        self.atomically(|vault| {
            let pooled = vault.pull_deposit(user, amount, input)?;

            vault.harvest_pool()?;
            let owed = vault.ledger.settle(&vault.pool, user)?;
            vault
                .ledger
                .adjust_stake(&mut vault.pool, user, pooled, StakeChange::Increase)?;

            vault.pay_rewards(user, owed, None)?;
            vault
                .source
                .stake(&mut vault.bank, &vault.config.account, pooled)
                .map_err(VaultError::AdapterFailure)?;

            vault.emit(VaultEvent::Deposit {
                user: *user,
                amount: pooled,
            });
            tracing::info!(user = %user, %input, amount, pooled, "vault: deposit");
            Ok(pooled)
        })
    }

    /// Withdraw up to `amount` of `user`'s stake, delivered as `output`.
    ///
    /// The amount is clamped to the user's stake, so
    /// [`WITHDRAW_ALL`](lpvault_types::WITHDRAW_ALL) empties the position.
    /// Rewards owed are paid out. Returns the pooled amount withdrawn.
    ///
    /// # Errors
    ///
    /// - [`VaultError::ZeroAmount`] if `amount` is zero
    /// - [`VaultError::InsufficientStake`] if `user` has nothing staked
    /// - [`VaultError::AssetNotAllowed`] if `output` is not accepted
    /// - [`VaultError::AdapterFailure`] if the yield source fails
    /// - [`VaultError::ConversionFailure`] if the router fails
    pub fn withdraw(&mut self, user: &AccountId, amount: u128, output: &Token) -> Result<u128> {
        if amount == 0 {
            return Err(VaultError::ZeroAmount);
        }
        if !output.is_pooled() && !self.config.accepts(output) {
            return Err(VaultError::AssetNotAllowed(output.clone()));
        }
        let staked = self.ledger.user_info(user).map_or(0, |info| info.amount);
        if staked == 0 {
            return Err(VaultError::InsufficientStake {
                requested: amount,
                available: 0,
            });
        }

        self.atomically(|vault| {
            vault.harvest_pool()?;
            let owed = vault.ledger.settle(&vault.pool, user)?;
            let withdrawn = amount.min(staked);
            vault
                .ledger
                .adjust_stake(&mut vault.pool, user, withdrawn, StakeChange::Decrease)?;

            vault.pay_rewards(user, owed, None)?;
            vault
                .source
                .unstake(&mut vault.bank, &vault.config.account, withdrawn)
                .map_err(VaultError::AdapterFailure)?;
            let delivered = vault.deliver(user, &Token::Lp, withdrawn, output)?;

            vault.emit(VaultEvent::Withdraw {
                user: *user,
                amount: withdrawn,
            });
            tracing::info!(user = %user, %output, withdrawn, delivered, "vault: withdraw");
            Ok(withdrawn)
        })
    }

    /// Pay out everything owed to `user`.
    ///
    /// With `receive_as` set, each reward is converted into that asset
    /// before delivery; a reward too small to convert is paid as the reward
    /// token itself. A claim with nothing owed succeeds and still emits a
    /// zero-valued event. Returns the reward amounts paid, which the event
    /// also carries.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AssetNotAllowed`] if `receive_as` is not accepted
    /// - [`VaultError::AdapterFailure`] if the harvest fails
    /// - [`VaultError::ConversionFailure`] if the router fails
    pub fn claim(&mut self, user: &AccountId, receive_as: Option<&Token>) -> Result<RewardAmounts> {
        if let Some(asset) = receive_as {
            if !self.config.accepts(asset) {
                return Err(VaultError::AssetNotAllowed(asset.clone()));
            }
        }

        self.atomically(|vault| {
            vault.harvest_pool()?;
            let owed = vault.ledger.settle(&vault.pool, user)?;
            let paid = vault.pay_rewards(user, owed, receive_as)?;

            vault.emit(VaultEvent::Claim {
                user: *user,
                crv_reward: paid.crv,
                cvx_reward: paid.cvx,
            });
            tracing::info!(
                user = %user,
                crv = paid.crv,
                cvx = paid.cvx,
                receive_as = ?receive_as,
                "vault: claim"
            );
            Ok(paid)
        })
    }

    /// Harvest the yield source without settling any user.
    ///
    /// Anyone may call this; `caller` is only recorded in logs.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AdapterFailure`] if the yield source fails
    pub fn harvest(&mut self, caller: &AccountId) -> Result<HarvestOutcome> {
        self.atomically(|vault| {
            let outcome = vault.harvest_pool()?;
            tracing::debug!(
                caller = %caller,
                crv = outcome.harvested.crv,
                cvx = outcome.harvested.cvx,
                "vault: keeper harvest"
            );
            Ok(outcome)
        })
    }

    /// Add or remove `asset` from the allow-list.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Unauthorized`] if `caller` is not the owner
    /// - [`VaultError::AssetNotAllowed`] if `asset` is the pooled token or a reward token
    pub fn set_asset_allowed(
        &mut self,
        caller: &AccountId,
        asset: &Token,
        allowed: bool,
    ) -> Result<()> {
        if *caller != self.config.owner {
            return Err(VaultError::Unauthorized(*caller));
        }
        if !asset.is_convertible() {
            return Err(VaultError::AssetNotAllowed(asset.clone()));
        }

        if allowed {
            self.config.allowed_assets.insert(asset.clone());
        } else {
            self.config.allowed_assets.remove(asset);
        }
        self.emit(VaultEvent::AssetAllowListUpdated {
            asset: asset.clone(),
            allowed,
        });
        tracing::info!(%asset, allowed, "vault: allow-list updated");
        Ok(())
    }

    /// Rewards `user` would receive if they claimed now.
    ///
    /// Includes rewards accrued at the yield source and outstanding
    /// orphaned rewards, as if a harvest ran first.
    ///
    /// # Errors
    ///
    /// - [`VaultError::AdapterFailure`] if the source cannot report pending rewards
    /// - [`VaultError::Arithmetic`] on overflow
    pub fn pending_reward(&self, user: &AccountId) -> Result<RewardAmounts> {
        let at_source = self
            .source
            .pending_at_source()
            .map_err(VaultError::AdapterFailure)?;
        let acc = projected_acc(&self.pool, at_source)?;
        Ok(self.ledger.pending_reward_at(user, acc)?)
    }

    /// Rewards owed to `user` as of the last harvest.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Arithmetic`] on overflow
    pub fn pending_reward_settled(&self, user: &AccountId) -> Result<RewardAmounts> {
        Ok(self.ledger.pending_reward(&self.pool, user)?)
    }

    /// `user`'s position. Zero-valued if they never deposited.
    pub fn user_info(&self, user: &AccountId) -> UserInfoView {
        self.ledger
            .user_info(user)
            .map(UserInfoView::from)
            .unwrap_or_default()
    }

    /// Snapshot of the pool.
    pub fn pool_info(&self) -> PoolView {
        PoolView::from(&self.pool)
    }

    /// Whether `asset` is currently accepted for conversion.
    pub fn is_asset_allowed(&self, asset: &Token) -> bool {
        self.config.accepts(asset)
    }

    /// Drain the event log.
    pub fn take_events(&mut self) -> Vec<VaultEvent> {
        std::mem::take(&mut self.events)
    }

    /// Events emitted and not yet drained.
    pub fn events(&self) -> &[VaultEvent] {
        &self.events
    }

    /// The vault configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// The pool state.
    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    /// The user ledger.
    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    /// The yield source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the yield source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The conversion router.
    pub fn router(&self) -> &R {
        &self.router
    }

    /// Mutable access to the conversion router.
    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    /// The token bank.
    pub fn bank(&self) -> &B {
        &self.bank
    }

    /// Mutable access to the token bank.
    pub fn bank_mut(&mut self) -> &mut B {
        &mut self.bank
    }

    fn atomically<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = self.checkpoint();
        match op(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.restore(checkpoint);
                tracing::warn!(error = %err, "vault: operation rolled back");
                Err(err)
            }
        }
    }

    fn checkpoint(&self) -> Checkpoint<S, R, B> {
        Checkpoint {
            config: self.config.clone(),
            pool: self.pool.clone(),
            ledger: self.ledger.clone(),
            source: self.source.clone(),
            router: self.router.clone(),
            bank: self.bank.clone(),
            events_len: self.events.len(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint<S, R, B>) {
        self.config = checkpoint.config;
        self.pool = checkpoint.pool;
        self.ledger = checkpoint.ledger;
        self.source = checkpoint.source;
        self.router = checkpoint.router;
        self.bank = checkpoint.bank;
        self.events.truncate(checkpoint.events_len);
    }

    fn emit(&mut self, event: VaultEvent) {
        tracing::debug!(event = event.name(), "vault: event");
        self.events.push(event);
    }

    fn harvest_pool(&mut self) -> Result<HarvestOutcome> {
        let outcome = accumulator::harvest(
            &mut self.pool,
            &mut self.source,
            &mut self.bank,
            &self.config.account,
        )?;
        if !outcome.harvested.is_zero() {
            self.emit(VaultEvent::Harvest {
                harvested: outcome.harvested,
                orphaned: outcome.orphaned,
            });
        }
        Ok(outcome)
    }

    /// Take `amount` of `input` from `user` and return the pooled amount received.
    fn pull_deposit(&mut self, user: &AccountId, amount: u128, input: &Token) -> Result<u128> {
        let vault = self.config.account;
        self.bank
            .transfer(input, user, &vault, amount)
            .map_err(VaultError::TransferFailure)?;
        if input.is_pooled() {
            return Ok(amount);
        }
        self.router
            .convert_in(&mut self.bank, &vault, input, amount)
            .map_err(VaultError::ConversionFailure)
    }

    /// Send `amount` of `held` from the vault to `user` as `output`.
    fn deliver(
        &mut self,
        user: &AccountId,
        held: &Token,
        amount: u128,
        output: &Token,
    ) -> Result<u128> {
        let vault = self.config.account;
        let delivered = if held == output {
            amount
        } else {
            self.router
                .swap(&mut self.bank, &vault, held, output, amount)
                .map_err(VaultError::ConversionFailure)?
        };
        self.bank
            .transfer(output, &vault, user, delivered)
            .map_err(VaultError::TransferFailure)?;
        Ok(delivered)
    }

    /// Pay `owed` rewards to `user`, capped by the distributable reserve.
    fn pay_rewards(
        &mut self,
        user: &AccountId,
        owed: RewardAmounts,
        receive_as: Option<&Token>,
    ) -> Result<RewardAmounts> {
        let payable = owed.min(self.pool.distributable());
        if payable != owed {
            tracing::warn!(
                user = %user,
                owed_crv = owed.crv,
                owed_cvx = owed.cvx,
                paid_crv = payable.crv,
                paid_cvx = payable.cvx,
                "vault: payout capped by reserve"
            );
        }

        for token in RewardToken::ALL {
            let amount = payable.get(token);
            if amount == 0 {
                continue;
            }
            let reserve = self
                .pool
                .reserve
                .get(token)
                .checked_sub(amount)
                .ok_or(MathError::Overflow)?;
            self.pool.reserve.set(token, reserve);

            let held = token.token();
            let output = receive_as.cloned().unwrap_or_else(|| held.clone());
            match self.deliver(user, &held, amount, &output) {
                // Too little to convert: pay the reward token itself.
                Err(VaultError::ConversionFailure(RouterError::ZeroOutput)) => {
                    tracing::debug!(
                        user = %user,
                        token = %held,
                        amount,
                        "vault: reward too small to convert, paid in kind"
                    );
                    self.deliver(user, &held, amount, &held)?;
                }
                delivered => {
                    delivered?;
                }
            }
        }
        Ok(payable)
    }
}

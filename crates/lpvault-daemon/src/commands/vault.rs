//! Vault command handlers.

use std::sync::Arc;

use serde_json::Value;

use lpvault_adapters::TokenBank;
use lpvault_types::{RewardAmounts, Token};

use super::{account_param, amount_param, str_param, token_param};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn rewards_json(amounts: RewardAmounts) -> Value {
    serde_json::json!({
        "crv_reward": amounts.crv.to_string(),
        "cvx_reward": amounts.cvx.to_string(),
    })
}

/// Deposit the pooled token, or an accepted asset converted into it.
pub async fn deposit(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = account_param(params, "user")?;
    let amount = amount_param(params, "amount", false)?;
    let input = token_param(params, "input")?.unwrap_or(Token::Lp);

    let pooled = state
        .with_vault(|vault| vault.deposit(&user, amount, &input))
        .await?;

    Ok(serde_json::json!({
        "user": user.to_string(),
        "amount": pooled.to_string(),
    }))
}

/// Withdraw up to `amount` ("max" for everything).
pub async fn withdraw(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = account_param(params, "user")?;
    let amount = amount_param(params, "amount", true)?;
    let output = token_param(params, "output")?.unwrap_or(Token::Lp);

    let withdrawn = state
        .with_vault(|vault| vault.withdraw(&user, amount, &output))
        .await?;

    Ok(serde_json::json!({
        "user": user.to_string(),
        "amount": withdrawn.to_string(),
    }))
}

/// Claim owed rewards, optionally converted into `receive_as`.
pub async fn claim(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = account_param(params, "user")?;
    let receive_as = token_param(params, "receive_as")?;

    let paid = state
        .with_vault(|vault| vault.claim(&user, receive_as.as_ref()))
        .await?;

    Ok(rewards_json(paid))
}

/// Harvest the yield source on behalf of `caller` (the keeper by default).
pub async fn harvest(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = match params.get("caller") {
        Some(v) if !v.is_null() => account_param(params, "caller")?,
        _ => state.keeper_account,
    };
    let outcome = state.with_vault(|vault| vault.harvest(&caller)).await?;

    Ok(serde_json::json!({
        "harvested": outcome.harvested,
        "distributed": outcome.distributed,
        "orphaned": outcome.orphaned,
    }))
}

/// Add or remove an asset from the allow-list (owner only).
pub async fn set_asset_allowed(state: &Arc<DaemonState>, params: &Value) -> Result {
    let caller = account_param(params, "caller")?;
    let asset: Token = str_param(params, "asset")?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("asset: {e}")))?;
    let allowed = params
        .get("allowed")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| RpcError::invalid_params("allowed required"))?;

    state
        .with_vault(|vault| vault.set_asset_allowed(&caller, &asset, allowed))
        .await?;

    Ok(serde_json::json!({
        "asset": asset.to_string(),
        "allowed": allowed,
    }))
}

/// Rewards a user would receive if they claimed now.
pub async fn pending_reward(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = account_param(params, "user")?;
    let vault = state.vault.lock().await;
    let pending = vault.pending_reward(&user)?;
    Ok(rewards_json(pending))
}

/// A user's staked amount and reward debts.
pub async fn user_info(state: &Arc<DaemonState>, params: &Value) -> Result {
    let user = account_param(params, "user")?;
    let vault = state.vault.lock().await;
    serde_json::to_value(vault.user_info(&user))
        .map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}

/// Pool totals, accumulators, reserves and orphaned rewards.
pub async fn pool_info(state: &Arc<DaemonState>) -> Result {
    let vault = state.vault.lock().await;
    serde_json::to_value(vault.pool_info())
        .map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}

/// Balance of `token` held by `account`.
pub async fn balance(state: &Arc<DaemonState>, params: &Value) -> Result {
    let account = account_param(params, "account")?;
    let token = token_param(params, "token")?.unwrap_or(Token::Lp);
    let vault = state.vault.lock().await;
    let balance = vault.bank().balance_of(&token, &account);

    Ok(serde_json::json!({
        "account": account.to_string(),
        "token": token.to_string(),
        "balance": balance.to_string(),
    }))
}

//! Dev-only command handlers.
//!
//! Only dispatched when `rpc.dev_methods` is enabled.

use std::sync::Arc;

use serde_json::Value;

use lpvault_adapters::TokenBank;
use lpvault_types::Token;

use super::{account_param, amount_param, str_param};
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

fn required_token(params: &Value) -> std::result::Result<Token, RpcError> {
    str_param(params, "token")?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("token: {e}")))
}

/// Create tokens in an account's balance.
pub async fn mint(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = required_token(params)?;
    let account = account_param(params, "account")?;
    let amount = amount_param(params, "amount", false)?;

    let mut vault = state.vault.lock().await;
    vault
        .bank_mut()
        .mint(&token, &account, amount)
        .map_err(|e| RpcError::internal_error(&e.to_string()))?;
    let balance = vault.bank().balance_of(&token, &account);
    tracing::warn!(%token, %account, amount, "dev: minted");

    Ok(serde_json::json!({"balance": balance.to_string()}))
}

/// Move the simulated clock forward.
pub async fn advance_time(state: &Arc<DaemonState>, params: &Value) -> Result {
    let secs = params
        .get("secs")
        .and_then(|v| v.as_u64())
        .ok_or_else(|| RpcError::invalid_params("secs required"))?;
    let now = state.clock.advance(secs);
    tracing::warn!(secs, now, "dev: clock advanced");
    Ok(serde_json::json!({"now": now}))
}

/// Change a router price; "0" removes the route.
pub async fn set_router_rate(state: &Arc<DaemonState>, params: &Value) -> Result {
    let token = required_token(params)?;
    let rate = amount_param(params, "rate", false)?;

    let mut vault = state.vault.lock().await;
    vault.router_mut().dev_set_rate(token.clone(), rate);
    Ok(serde_json::json!({"token": token.to_string(), "rate": rate.to_string()}))
}

/// Take the router offline or bring it back.
pub async fn set_router_available(state: &Arc<DaemonState>, params: &Value) -> Result {
    let available = params
        .get("available")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| RpcError::invalid_params("available required"))?;

    let mut vault = state.vault.lock().await;
    vault.router_mut().set_available(available);
    tracing::warn!(available, "dev: router availability changed");
    Ok(serde_json::json!({"available": available}))
}

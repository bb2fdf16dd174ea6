//! IPC command handlers.
//!
//! Each submodule implements the commands for one IPC category. Accounts
//! are hex strings, tokens use their display names ("lp", "native",
//! "erc20:USDC") and amounts are decimal strings so that full `u128`
//! values survive JSON.

pub mod dev;
pub mod diagnostics;
pub mod vault;

use serde_json::Value;

use lpvault_types::{AccountId, Token, WITHDRAW_ALL};

use crate::rpc::RpcError;

/// A required string parameter.
fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, RpcError> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(&format!("{name} required")))
}

/// A required account parameter.
fn account_param(params: &Value, name: &str) -> Result<AccountId, RpcError> {
    str_param(params, name)?
        .parse()
        .map_err(|e| RpcError::invalid_params(&format!("{name}: {e}")))
}

/// An optional token parameter.
fn token_param(params: &Value, name: &str) -> Result<Option<Token>, RpcError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s
            .parse()
            .map(Some)
            .map_err(|e| RpcError::invalid_params(&format!("{name}: {e}"))),
        Some(_) => Err(RpcError::invalid_params(&format!("{name} must be a string"))),
    }
}

/// A required amount: a decimal string or a JSON integer.
///
/// With `allow_max`, the string "max" selects the whole position.
fn amount_param(params: &Value, name: &str, allow_max: bool) -> Result<u128, RpcError> {
    match params.get(name) {
        Some(Value::String(s)) if allow_max && s == "max" => Ok(WITHDRAW_ALL),
        Some(Value::String(s)) => s
            .parse()
            .map_err(|_| RpcError::invalid_params(&format!("{name} must be a decimal integer"))),
        Some(Value::Number(n)) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| RpcError::invalid_params(&format!("{name} must be non-negative"))),
        _ => Err(RpcError::invalid_params(&format!("{name} required"))),
    }
}

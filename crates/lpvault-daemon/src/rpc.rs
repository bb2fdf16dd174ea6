//! JSON-RPC server over Unix socket.
//!
//! Listens on a Unix domain socket, accepts connections, and dispatches
//! newline-delimited JSON-RPC method calls to the command handlers.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;
use tracing::{debug, error, info, warn};

use lpvault_core::VaultError;

use crate::commands;
use crate::DaemonState;

/// JSON-RPC request.
#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Method name.
    pub method: String,
    /// Parameters.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// JSON-RPC response.
#[derive(Debug, Serialize)]
pub struct RpcResponse {
    /// JSON-RPC version.
    pub jsonrpc: String,
    /// Request ID.
    pub id: serde_json::Value,
    /// Result or error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RpcError {
    /// Error code.
    pub code: i32,
    /// Error name.
    pub message: String,
    /// Optional structured data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcResponse {
    /// Create a success response.
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: serde_json::Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl RpcError {
    fn new(code: i32, message: &str, data: Option<serde_json::Value>) -> Self {
        Self {
            code,
            message: message.to_string(),
            data,
        }
    }

    // Standard JSON-RPC errors

    /// Parse error (-32700).
    pub fn parse_error() -> Self {
        Self::new(-32700, "PARSE_ERROR", None)
    }

    /// Invalid request (-32600).
    pub fn invalid_request() -> Self {
        Self::new(-32600, "INVALID_REQUEST", None)
    }

    /// Method not found (-32601).
    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            -32601,
            "METHOD_NOT_FOUND",
            Some(serde_json::json!({"method": method})),
        )
    }

    /// Invalid params (-32602).
    pub fn invalid_params(detail: &str) -> Self {
        Self::new(
            -32602,
            "INVALID_PARAMS",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Internal error (-32603).
    pub fn internal_error(detail: &str) -> Self {
        Self::new(
            -32603,
            "INTERNAL_ERROR",
            Some(serde_json::json!({"detail": detail})),
        )
    }

    /// Dev methods disabled (-32020).
    pub fn dev_methods_disabled() -> Self {
        Self::new(-32020, "DEV_METHODS_DISABLED", None)
    }
}

impl From<VaultError> for RpcError {
    fn from(err: VaultError) -> Self {
        let detail = err.to_string();
        match err {
            VaultError::ZeroAmount => Self::new(-32100, "ZERO_AMOUNT", None),
            VaultError::InsufficientStake {
                requested,
                available,
            } => Self::new(
                -32101,
                "INSUFFICIENT_STAKE",
                Some(serde_json::json!({
                    "requested": requested.to_string(),
                    "available": available.to_string(),
                })),
            ),
            VaultError::AdapterFailure(_) => Self::new(
                -32102,
                "ADAPTER_FAILURE",
                Some(serde_json::json!({"detail": detail})),
            ),
            VaultError::ConversionFailure(_) => Self::new(
                -32103,
                "CONVERSION_FAILURE",
                Some(serde_json::json!({"detail": detail})),
            ),
            VaultError::TransferFailure(_) => Self::new(
                -32104,
                "TRANSFER_FAILURE",
                Some(serde_json::json!({"detail": detail})),
            ),
            VaultError::AssetNotAllowed(asset) => Self::new(
                -32105,
                "ASSET_NOT_ALLOWED",
                Some(serde_json::json!({"asset": asset.to_string()})),
            ),
            VaultError::Unauthorized(caller) => Self::new(
                -32106,
                "UNAUTHORIZED",
                Some(serde_json::json!({"caller": caller.to_string()})),
            ),
            VaultError::Arithmetic(_) => Self::new(
                -32107,
                "ARITHMETIC",
                Some(serde_json::json!({"detail": detail})),
            ),
        }
    }
}

/// The RPC server.
pub struct RpcServer {
    state: Arc<DaemonState>,
    socket_path: PathBuf,
}

impl RpcServer {
    /// Create a new RPC server.
    pub fn new(state: Arc<DaemonState>, socket_path: PathBuf) -> Self {
        Self { state, socket_path }
    }

    /// Run the server, accepting connections.
    pub async fn run(&self) -> anyhow::Result<()> {
        // Remove stale socket file
        let _ = std::fs::remove_file(&self.socket_path);

        let listener = UnixListener::bind(&self.socket_path)?;
        info!("IPC server listening on {:?}", self.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let state = self.state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(state, stream).await {
                            warn!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

/// Handle a single client connection.
async fn handle_connection(
    state: Arc<DaemonState>,
    stream: tokio::net::UnixStream,
) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break; // EOF
        }
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(request) => dispatch_request(state.clone(), request).await,
            Err(_) => RpcResponse::error(serde_json::Value::Null, RpcError::parse_error()),
        };

        let mut response_json = serde_json::to_string(&response)?;
        response_json.push('\n');
        writer.write_all(response_json.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Dispatch a JSON-RPC request to the appropriate command handler.
pub async fn dispatch_request(state: Arc<DaemonState>, request: RpcRequest) -> RpcResponse {
    let id = request.id.clone();
    let method = request.method.as_str();

    debug!("Dispatching RPC method: {}", method);

    if request.jsonrpc != "2.0" {
        return RpcResponse::error(id, RpcError::invalid_request());
    }
    if method.starts_with("dev_") && !state.config.rpc.dev_methods {
        return RpcResponse::error(id, RpcError::dev_methods_disabled());
    }

    let params = &request.params;
    let result = match method {
        // Vault operations
        "vault_deposit" => commands::vault::deposit(&state, params).await,
        "vault_withdraw" => commands::vault::withdraw(&state, params).await,
        "vault_claim" => commands::vault::claim(&state, params).await,
        "vault_harvest" => commands::vault::harvest(&state, params).await,
        "vault_set_asset_allowed" => commands::vault::set_asset_allowed(&state, params).await,

        // Vault views
        "vault_pending_reward" => commands::vault::pending_reward(&state, params).await,
        "vault_user_info" => commands::vault::user_info(&state, params).await,
        "vault_pool_info" => commands::vault::pool_info(&state).await,
        "vault_balance" => commands::vault::balance(&state, params).await,

        // Diagnostics
        "get_daemon_info" => commands::diagnostics::get_daemon_info(&state).await,
        "get_recent_events" => commands::diagnostics::get_recent_events(&state, params).await,
        "export_diagnostics" => commands::diagnostics::export_diagnostics(&state).await,
        "shutdown" => commands::diagnostics::shutdown(&state).await,

        // Dev-only commands
        "dev_mint" => commands::dev::mint(&state, params).await,
        "dev_advance_time" => commands::dev::advance_time(&state, params).await,
        "dev_set_router_rate" => commands::dev::set_router_rate(&state, params).await,
        "dev_set_router_available" => commands::dev::set_router_available(&state, params).await,

        _ => Err(RpcError::method_not_found(method)),
    };

    match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(err) => RpcResponse::error(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DaemonConfig;
    use lpvault_types::{AccountId, Token};
    use tokio::sync::broadcast;

    fn test_state(config: DaemonConfig) -> Arc<DaemonState> {
        let (shutdown_tx, _) = broadcast::channel(1);
        Arc::new(DaemonState::new(config, shutdown_tx).expect("state"))
    }

    fn request(method: &str, params: serde_json::Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: serde_json::json!(1),
            method: method.to_string(),
            params,
        }
    }

    async fn call(
        state: &Arc<DaemonState>,
        method: &str,
        params: serde_json::Value,
    ) -> RpcResponse {
        dispatch_request(state.clone(), request(method, params)).await
    }

    #[test]
    fn test_rpc_error_codes() {
        let err = RpcError::method_not_found("unknown");
        assert_eq!(err.code, -32601);

        let err = RpcError::from(VaultError::ZeroAmount);
        assert_eq!(err.code, -32100);
        assert_eq!(err.message, "ZERO_AMOUNT");

        let err = RpcError::from(VaultError::Unauthorized(AccountId::repeat(1)));
        assert_eq!(err.code, -32106);

        let err = RpcError::from(VaultError::AssetNotAllowed(Token::Crv));
        assert_eq!(
            err.data.expect("data")["asset"],
            serde_json::json!("crv")
        );
    }

    #[test]
    fn test_rpc_response_shapes() {
        let resp = RpcResponse::success(serde_json::json!(1), serde_json::json!({"ok": true}));
        assert!(resp.result.is_some());
        assert!(resp.error.is_none());

        let resp = RpcResponse::error(serde_json::json!(1), RpcError::internal_error("test"));
        assert!(resp.result.is_none());
        assert!(resp.error.is_some());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state(DaemonConfig::default());
        let resp = call(&state, "vault_explode", serde_json::json!({})).await;
        assert_eq!(resp.error.expect("error").code, -32601);
    }

    #[tokio::test]
    async fn test_dev_methods_can_be_disabled() {
        let mut config = DaemonConfig::default();
        config.rpc.dev_methods = false;
        let state = test_state(config);
        let resp = call(&state, "dev_advance_time", serde_json::json!({"secs": 10})).await;
        assert_eq!(resp.error.expect("error").code, -32020);
    }

    #[tokio::test]
    async fn test_deposit_and_claim_round() {
        let state = test_state(DaemonConfig::default());
        let alice = AccountId::repeat(0xa1).to_string();
        let unit = "1000000000000000000";

        let resp = call(
            &state,
            "dev_mint",
            serde_json::json!({"token": "lp", "account": alice, "amount": format!("{unit}00")}),
        )
        .await;
        assert!(resp.error.is_none());

        let resp = call(
            &state,
            "vault_deposit",
            serde_json::json!({"user": alice, "amount": format!("{unit}00")}),
        )
        .await;
        let result = resp.result.expect("deposit result");
        assert_eq!(result["amount"], format!("{unit}00"));

        let resp = call(&state, "dev_advance_time", serde_json::json!({"secs": 86_400})).await;
        assert!(resp.error.is_none());

        let resp = call(&state, "vault_pending_reward", serde_json::json!({"user": alice})).await;
        let pending = resp.result.expect("pending result");
        assert_ne!(pending["crv_reward"], "0");

        let resp = call(&state, "vault_claim", serde_json::json!({"user": alice})).await;
        let claimed = resp.result.expect("claim result");
        assert_eq!(claimed["crv_reward"], pending["crv_reward"]);

        let resp = call(
            &state,
            "vault_withdraw",
            serde_json::json!({"user": alice, "amount": "max"}),
        )
        .await;
        assert_eq!(resp.result.expect("withdraw")["amount"], format!("{unit}00"));

        let resp = call(&state, "vault_user_info", serde_json::json!({"user": alice})).await;
        assert_eq!(resp.result.expect("info")["amount"], "0");
    }

    #[tokio::test]
    async fn test_vault_error_mapped() {
        let state = test_state(DaemonConfig::default());
        let alice = AccountId::repeat(0xa1).to_string();
        let resp = call(
            &state,
            "vault_deposit",
            serde_json::json!({"user": alice, "amount": "0"}),
        )
        .await;
        assert_eq!(resp.error.expect("error").message, "ZERO_AMOUNT");

        let resp = call(
            &state,
            "vault_set_asset_allowed",
            serde_json::json!({"caller": alice, "asset": "erc20:USDC", "allowed": true}),
        )
        .await;
        assert_eq!(resp.error.expect("error").message, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_invalid_params() {
        let state = test_state(DaemonConfig::default());
        let resp = call(&state, "vault_deposit", serde_json::json!({"amount": "1"})).await;
        assert_eq!(resp.error.expect("error").code, -32602);
    }
}

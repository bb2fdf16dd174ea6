//! Diagnostics command handlers.

use std::sync::Arc;

use serde_json::Value;

use lpvault_adapters::{TokenBank, YieldSource};
use lpvault_types::Token;

use crate::events::EventFilter;
use crate::rpc::RpcError;
use crate::DaemonState;

type Result = std::result::Result<Value, RpcError>;

/// Default and maximum page size for event history.
const MAX_EVENTS: usize = 500;

/// Version, source kind, clock and event counters.
pub async fn get_daemon_info(state: &Arc<DaemonState>) -> Result {
    let vault = state.vault.lock().await;
    Ok(serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "source": vault.source().name(),
        "clock": state.clock.now(),
        "event_sequence": state.event_bus.sequence(),
        "positions": vault.ledger().len(),
    }))
}

/// Retained events, oldest first.
pub async fn get_recent_events(state: &Arc<DaemonState>, params: &Value) -> Result {
    let filter: EventFilter = match params.get("filter") {
        Some(raw) if !raw.is_null() => serde_json::from_value(raw.clone())
            .map_err(|e| RpcError::invalid_params(&format!("filter: {e}")))?,
        _ => EventFilter::default(),
    };
    let limit = params
        .get("limit")
        .and_then(|v| v.as_u64())
        .map_or(MAX_EVENTS, |l| (l as usize).min(MAX_EVENTS));

    serde_json::to_value(state.event_bus.history(&filter, limit))
        .map_err(|e| RpcError::internal_error(&format!("serialize: {e}")))
}

/// Consistency checks between the ledger, the pool and the bank.
pub async fn export_diagnostics(state: &Arc<DaemonState>) -> Result {
    let vault = state.vault.lock().await;
    let pool = vault.pool_info();
    let account = vault.config().account;
    let staked_at_source = vault.source().staked_balance();

    Ok(serde_json::json!({
        "diagnostics": {
            "version": env!("CARGO_PKG_VERSION"),
            "stake_conserved": vault.ledger().is_conserved(vault.pool()),
            "source_matches_pool": staked_at_source == pool.total_staked,
            "reserve_crv": pool.reserve.crv.to_string(),
            "reserve_cvx": pool.reserve.cvx.to_string(),
            "held_crv": vault.bank().balance_of(&Token::Crv, &account).to_string(),
            "held_cvx": vault.bank().balance_of(&Token::Cvx, &account).to_string(),
            "orphaned": pool.orphaned,
        }
    }))
}

/// Ask the daemon to stop.
pub async fn shutdown(state: &Arc<DaemonState>) -> Result {
    let _ = state.shutdown_tx.send(());
    Ok(serde_json::json!({"shutting_down": true}))
}

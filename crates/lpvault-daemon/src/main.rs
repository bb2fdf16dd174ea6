//! lpvault-daemon: runs a simulated vault behind a JSON-RPC socket.
//!
//! Single OS process running a Tokio async runtime. Clients talk to the
//! daemon via newline-delimited JSON-RPC over a Unix socket. A keeper task
//! advances the simulated clock and harvests the yield source periodically.

mod commands;
mod config;
mod events;
mod keeper;
mod rpc;

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{error, info};

use lpvault_adapters::{
    InMemoryBank, SimClock, SimulatedBooster, StubRouter, StubYieldSource, TokenBank, YieldSource,
};
use lpvault_core::{VaultController, VaultError};
use lpvault_types::{AccountId, Token};

use crate::config::{parse_account, parse_amount, ConfigError, DaemonConfig};
use crate::events::EventBus;
use crate::rpc::RpcServer;

/// The vault as run by the daemon; the yield source is chosen by config.
pub type Vault = VaultController<Box<dyn YieldSource>, StubRouter, InMemoryBank>;

/// Daemon-wide shared state.
pub struct DaemonState {
    /// The vault. Holding the lock serializes operations.
    pub vault: Arc<Mutex<Vault>>,
    /// Configuration.
    pub config: DaemonConfig,
    /// Simulated clock shared with the yield source.
    pub clock: SimClock,
    /// Account recorded as the keeper's harvest caller.
    pub keeper_account: AccountId,
    /// Event bus for pushing events to subscribers.
    pub event_bus: EventBus,
    /// Shutdown signal sender.
    pub shutdown_tx: broadcast::Sender<()>,
}

impl DaemonState {
    /// Build the vault and its collaborators from `config`.
    pub fn new(config: DaemonConfig, shutdown_tx: broadcast::Sender<()>) -> anyhow::Result<Self> {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let clock = SimClock::new(now);
        let vault = build_vault(&config, &clock)?;
        let keeper_account = parse_account("keeper.account", &config.keeper.account)?;

        Ok(Self {
            vault: Arc::new(Mutex::new(vault)),
            config,
            clock,
            keeper_account,
            event_bus: EventBus::new(1000),
            shutdown_tx,
        })
    }

    /// Run a vault operation under the lock and publish the events it emitted.
    pub async fn with_vault<T>(
        &self,
        op: impl FnOnce(&mut Vault) -> Result<T, VaultError>,
    ) -> Result<T, VaultError> {
        let mut vault = self.vault.lock().await;
        let result = op(&mut *vault);
        let events = vault.take_events();
        drop(vault);

        self.event_bus.publish_vault(events, self.clock.now());
        result
    }
}

/// Assemble the bank, router, yield source and vault.
fn build_vault(config: &DaemonConfig, clock: &SimClock) -> Result<Vault, ConfigError> {
    let vault_config = config.vault_config()?;
    let source_account = parse_account("source.account", &config.source.account)?;
    let treasury = parse_account("source.treasury", &config.source.treasury)?;
    let router_account = parse_account("router.account", &config.router.account)?;
    let funding = parse_amount("source.treasury_funding", &config.source.treasury_funding)?;
    let liquidity = parse_amount("router.liquidity", &config.router.liquidity)?;

    let mut bank = InMemoryBank::new();
    bank.mint(&Token::Crv, &treasury, funding)?;
    bank.mint(&Token::Cvx, &treasury, funding)?;

    let mut router = StubRouter::new(router_account);
    bank.mint(&Token::Lp, &router_account, liquidity)?;
    for (token, rate) in config.router_rates()? {
        if !token.is_pooled() {
            bank.mint(&token, &router_account, liquidity)?;
        }
        router = router.with_rate(token, rate);
    }

    let source: Box<dyn YieldSource> = match config.source.kind.as_str() {
        "booster" => Box::new(SimulatedBooster::new(
            clock.clone(),
            source_account,
            treasury,
            config.source_rates()?,
        )),
        "stub" => Box::new(StubYieldSource::new(source_account, treasury)),
        other => return Err(ConfigError::UnknownSourceKind(other.to_string())),
    };

    info!(
        source = source.name(),
        treasury_crv = bank.balance_of(&Token::Crv, &treasury),
        "Vault collaborators ready"
    );
    Ok(VaultController::new(vault_config, source, router, bank))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load config
    let config = DaemonConfig::load()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("lpvault={}", config.advanced.log_level).parse()?),
        )
        .init();

    info!("lpvault daemon starting");

    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;

    // 2. Create shutdown channel
    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    // 3. Build daemon state
    let state = Arc::new(DaemonState::new(config, shutdown_tx.clone())?);

    // 4. Start IPC server
    let socket_path = data_dir.join(&state.config.rpc.socket_name);
    let rpc_server = RpcServer::new(state.clone(), socket_path.clone());

    info!("Starting JSON-RPC server on {:?}", socket_path);

    // 5. Start keeper
    let keeper = tokio::spawn(keeper::run(state.clone(), shutdown_tx.subscribe()));

    // 6. Emit DaemonStarted event
    state.event_bus.emit(events::Event::new(
        "DaemonStarted",
        state.clock.now(),
        serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "source": state.config.source.kind,
        }),
    ));

    // 7. Run the RPC server until shutdown
    let mut shutdown_rx = shutdown_tx.subscribe();
    tokio::select! {
        result = rpc_server.run() => {
            if let Err(e) = result {
                error!("RPC server error: {}", e);
            }
        }
        _ = shutdown_rx.recv() => {
            info!("Shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
    }

    // Graceful shutdown
    info!("Daemon shutting down gracefully");
    let _ = shutdown_tx.send(());
    let _ = keeper.await;

    // Clean up socket file
    let _ = std::fs::remove_file(&socket_path);

    info!("Daemon stopped");
    Ok(())
}

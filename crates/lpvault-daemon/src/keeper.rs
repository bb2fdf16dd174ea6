//! Simulated clock and periodic harvest.
//!
//! Every tick advances the simulated clock by `tick_secs * time_scale`
//! seconds. Once `harvest_interval_secs` of simulated time have passed since
//! the last harvest, the keeper harvests the yield source so rewards are
//! folded into the pool even when no user transacts.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use lpvault_core::VaultError;
use lpvault_ledger::HarvestOutcome;

use crate::DaemonState;

/// When the next keeper harvest is due, in simulated seconds.
#[derive(Debug, Clone, Copy)]
pub struct KeeperSchedule {
    interval_secs: u64,
    last_harvest: u64,
}

impl KeeperSchedule {
    /// A schedule whose first harvest is due `interval_secs` after `start`.
    pub fn new(interval_secs: u64, start: u64) -> Self {
        Self {
            interval_secs,
            last_harvest: start,
        }
    }

    /// Whether a harvest is due at `now`. A zero interval never fires.
    pub fn is_due(&self, now: u64) -> bool {
        self.interval_secs > 0 && now.saturating_sub(self.last_harvest) >= self.interval_secs
    }

    /// Seconds until the next harvest is due.
    pub fn seconds_until_next(&self, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.last_harvest);
        self.interval_secs.saturating_sub(elapsed)
    }

    /// Record a harvest at `now`.
    pub fn mark(&mut self, now: u64) {
        self.last_harvest = now;
    }
}

/// Run the clock and keeper until shutdown.
pub async fn run(state: Arc<DaemonState>, mut shutdown_rx: broadcast::Receiver<()>) {
    let config = state.config.keeper.clone();
    let step = config.tick_secs.saturating_mul(config.time_scale);
    let mut ticker = tokio::time::interval(Duration::from_secs(config.tick_secs.max(1)));
    let mut schedule = KeeperSchedule::new(config.harvest_interval_secs, state.clock.now());

    info!(
        step_secs = step,
        harvest_interval_secs = config.harvest_interval_secs,
        enabled = config.enabled,
        "Keeper started"
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown_rx.recv() => break,
        }

        let now = state.clock.advance(step);
        if config.enabled && schedule.is_due(now) {
            // Failures are logged and retried at the next interval.
            let _ = harvest_once(&state).await;
            schedule.mark(now);
        } else {
            debug!(now, next_in = schedule.seconds_until_next(now), "Keeper tick");
        }
    }

    info!("Keeper stopped");
}

/// Harvest the yield source once on behalf of the keeper account.
pub async fn harvest_once(state: &DaemonState) -> Result<HarvestOutcome, VaultError> {
    let caller = state.keeper_account;
    let result = state.with_vault(|vault| vault.harvest(&caller)).await;
    match &result {
        Ok(outcome) => info!(
            crv = outcome.harvested.crv,
            cvx = outcome.harvested.cvx,
            orphaned_crv = outcome.orphaned.crv,
            orphaned_cvx = outcome.orphaned.cvx,
            "Keeper harvest complete"
        ),
        Err(e) => warn!(error = %e, "Keeper harvest failed"),
    }
    result
}

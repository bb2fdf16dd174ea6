//! Configuration file management.
//!
//! The daemon reads `config.toml` from its data directory. Every field has a
//! default, so a missing file or a partial file is valid. Amounts and rates
//! are decimal strings because TOML integers stop at 64 bits.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use lpvault_adapters::BankError;
use lpvault_core::{VaultConfig, VaultError};
use lpvault_types::account::ParseAccountIdError;
use lpvault_types::token::ParseTokenError;
use lpvault_types::{AccountId, RewardAmounts, Token, RATE_SCALE, UNIT};

/// Errors found while turning the file into runtime parameters.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An account field is not a 32-byte hex string.
    #[error("invalid account in {field}: {source}")]
    Account {
        /// Offending field.
        field: &'static str,
        /// Parse failure.
        #[source]
        source: ParseAccountIdError,
    },

    /// A token name is not recognized.
    #[error("invalid token: {0}")]
    Token(#[from] ParseTokenError),

    /// An amount or rate is not a decimal integer.
    #[error("invalid amount in {field}: {value:?}")]
    Amount {
        /// Offending field.
        field: String,
        /// Value as written.
        value: String,
    },

    /// `source.kind` names no known yield source.
    #[error("unknown yield source kind: {0}")]
    UnknownSourceKind(String),

    /// Initial balances could not be minted.
    #[error("initial funding failed: {0}")]
    Funding(#[from] BankError),

    /// The vault rejected the configuration.
    #[error("vault configuration rejected: {0}")]
    Vault(#[from] VaultError),
}

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Vault settings.
    #[serde(default)]
    pub vault: VaultSection,
    /// Yield source settings.
    #[serde(default)]
    pub source: SourceConfig,
    /// Conversion router settings.
    #[serde(default)]
    pub router: RouterConfig,
    /// JSON-RPC settings.
    #[serde(default)]
    pub rpc: RpcConfig,
    /// Keeper and simulated clock settings.
    #[serde(default)]
    pub keeper: KeeperConfig,
    /// Advanced settings.
    #[serde(default)]
    pub advanced: AdvancedConfig,
}

/// Vault configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    /// Owner account, hex.
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Account holding the vault's tokens, hex.
    #[serde(default = "default_vault_account")]
    pub account: String,
    /// Assets accepted for conversion besides the native coin.
    #[serde(default)]
    pub allowed_assets: Vec<String>,
}

/// Yield source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// "booster" (time-based accrual) | "stub" (scripted).
    #[serde(default = "default_source_kind")]
    pub kind: String,
    /// Account holding staked pooled tokens, hex.
    #[serde(default = "default_source_account")]
    pub account: String,
    /// Account paying out rewards, hex.
    #[serde(default = "default_treasury")]
    pub treasury: String,
    /// Reward token A emission per staked unit per second, scaled by 1e18.
    #[serde(default = "default_crv_rate")]
    pub crv_rate: String,
    /// Reward token B emission per staked unit per second, scaled by 1e18.
    #[serde(default = "default_cvx_rate")]
    pub cvx_rate: String,
    /// Reward tokens minted into the treasury at startup, per token.
    #[serde(default = "default_treasury_funding")]
    pub treasury_funding: String,
}

/// Conversion router configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Router liquidity account, hex.
    #[serde(default = "default_router_account")]
    pub account: String,
    /// Liquidity minted to the router at startup, per priced token.
    #[serde(default = "default_router_liquidity")]
    pub liquidity: String,
    /// Price per token, scaled by 1e18. The pooled token defaults to 1e18.
    #[serde(default = "default_router_rates")]
    pub rates: BTreeMap<String, String>,
}

/// JSON-RPC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Socket file name inside the data directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
    /// Expose `dev_*` methods.
    #[serde(default = "default_true")]
    pub dev_methods: bool,
}

/// Keeper configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeeperConfig {
    /// Run the periodic harvest.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Real seconds between clock ticks.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    /// Simulated seconds per real second.
    #[serde(default = "default_time_scale")]
    pub time_scale: u64,
    /// Simulated seconds between keeper harvests.
    #[serde(default = "default_harvest_interval")]
    pub harvest_interval_secs: u64,
    /// Account recorded as the harvest caller, hex.
    #[serde(default = "default_keeper_account")]
    pub account: String,
}

/// Advanced configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvancedConfig {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

// Default value functions

fn default_account(byte: u8) -> String {
    AccountId::repeat(byte).to_string()
}

fn default_owner() -> String {
    default_account(0x0a)
}

fn default_vault_account() -> String {
    default_account(0x5a)
}

fn default_source_account() -> String {
    default_account(0xc0)
}

fn default_treasury() -> String {
    default_account(0xc1)
}

fn default_router_account() -> String {
    default_account(0xe0)
}

fn default_keeper_account() -> String {
    default_account(0x4b)
}

fn default_source_kind() -> String {
    "booster".to_string()
}

fn default_crv_rate() -> String {
    // 1e-6 per staked unit per second.
    (RATE_SCALE / 1_000_000).to_string()
}

fn default_cvx_rate() -> String {
    (RATE_SCALE / 4_000_000).to_string()
}

fn default_treasury_funding() -> String {
    (1_000_000_000 * UNIT).to_string()
}

fn default_router_rates() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("native".to_string(), (RATE_SCALE / 2).to_string()),
        ("crv".to_string(), RATE_SCALE.to_string()),
        ("cvx".to_string(), RATE_SCALE.to_string()),
    ])
}

fn default_router_liquidity() -> String {
    (1_000_000_000 * UNIT).to_string()
}

fn default_socket_name() -> String {
    "lpvault.sock".to_string()
}

fn default_true() -> bool {
    true
}

fn default_tick_secs() -> u64 {
    1
}

fn default_time_scale() -> u64 {
    60
}

fn default_harvest_interval() -> u64 {
    3_600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VaultSection {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            account: default_vault_account(),
            allowed_assets: Vec::new(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            account: default_source_account(),
            treasury: default_treasury(),
            crv_rate: default_crv_rate(),
            cvx_rate: default_cvx_rate(),
            treasury_funding: default_treasury_funding(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            account: default_router_account(),
            liquidity: default_router_liquidity(),
            rates: default_router_rates(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            socket_name: default_socket_name(),
            dev_methods: true,
        }
    }
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_secs: default_tick_secs(),
            time_scale: default_time_scale(),
            harvest_interval_secs: default_harvest_interval(),
            account: default_keeper_account(),
        }
    }
}

impl Default for AdvancedConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: String::new(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: DaemonConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.advanced.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.advanced.data_dir)
        }
    }

    /// The vault's static parameters.
    pub fn vault_config(&self) -> Result<VaultConfig, ConfigError> {
        let assets = self
            .vault
            .allowed_assets
            .iter()
            .map(|name| name.parse::<Token>())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(VaultConfig::new(
            parse_account("vault.owner", &self.vault.owner)?,
            parse_account("vault.account", &self.vault.account)?,
            assets,
        )?)
    }

    /// Per-second emission rates for the booster.
    pub fn source_rates(&self) -> Result<RewardAmounts, ConfigError> {
        Ok(RewardAmounts::new(
            parse_amount("source.crv_rate", &self.source.crv_rate)?,
            parse_amount("source.cvx_rate", &self.source.cvx_rate)?,
        ))
    }

    /// Router prices by token.
    pub fn router_rates(&self) -> Result<Vec<(Token, u128)>, ConfigError> {
        self.router
            .rates
            .iter()
            .map(|(name, rate)| -> Result<(Token, u128), ConfigError> {
                let token = name.parse::<Token>()?;
                let rate = parse_amount(&format!("router.rates.{name}"), rate)?;
                Ok((token, rate))
            })
            .collect()
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var("LPVAULT_DATA_DIR") {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/lpvault")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".lpvault")
        }
    }
}

/// Parse a hex account id, naming the field on failure.
pub fn parse_account(field: &'static str, value: &str) -> Result<AccountId, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::Account { field, source })
}

/// Parse a decimal amount, naming the field on failure.
pub fn parse_amount(field: &str, value: &str) -> Result<u128, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Amount {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/lpvault"))
}

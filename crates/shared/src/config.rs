//! Application configuration management.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// Ledger-level settlement defaults.
    #[serde(default)]
    pub settlement: SettlementConfig,
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_filter() -> String {
    "tally_settle=info,tally_core=info".to_string()
}

/// Raw settlement settings as written in config files.
///
/// Validation into the typed ledger settings happens in the core crate.
#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    /// Currency all balances are expressed in.
    #[serde(default = "default_ledger_currency")]
    pub ledger_currency: String,
    /// Number of decimal places of one minor unit (2 for cents).
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Whether the payer joins the equal-split pool unless an expense says otherwise.
    #[serde(default = "default_include_payer")]
    pub include_payer: bool,
    /// Tolerance when comparing custom share totals against the expense total.
    #[serde(default = "default_custom_share_epsilon")]
    pub custom_share_epsilon: Decimal,
    /// Cross-currency policy.
    #[serde(default)]
    pub cross_currency: CrossCurrencyConfig,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            ledger_currency: default_ledger_currency(),
            scale: default_scale(),
            include_payer: default_include_payer(),
            custom_share_epsilon: default_custom_share_epsilon(),
            cross_currency: CrossCurrencyConfig::default(),
        }
    }
}

fn default_ledger_currency() -> String {
    "EUR".to_string()
}

fn default_scale() -> u32 {
    2
}

fn default_include_payer() -> bool {
    true
}

fn default_custom_share_epsilon() -> Decimal {
    Decimal::new(1, 4) // 0.0001
}

/// Cross-currency mode names accepted in config files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossCurrencyMode {
    /// Expenses must be in the ledger currency.
    #[default]
    Forbid,
    /// Expenses are converted with a static rate table.
    FixedRate,
}

/// Cross-currency configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrossCurrencyConfig {
    /// Policy to apply.
    #[serde(default)]
    pub mode: CrossCurrencyMode,
    /// Rates keyed by source currency code (1 source unit = rate ledger units).
    #[serde(default)]
    pub rates: BTreeMap<String, Decimal>,
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Loads configuration from a single file, still honouring environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or malformed.
    pub fn load_from(path: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("TALLY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

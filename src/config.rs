//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API key, secret, passphrase) are referenced by env-var name in
//! the config and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;

use crate::engine::buyer::DEFAULT_MINIMUM_AVAILABLE;
use crate::engine::RunConfig;
use crate::exchange::auth::Credentials;
use crate::exchange::coinbase::PRODUCTION_URL;
use crate::strategy::allocation::AllocationTable;
use crate::strategy::deposit::{DEFAULT_DEPOSIT_INTERVAL_DAYS, MAX_DEPOSIT_INTERVAL_DAYS};
use crate::strategy::orders::FUNDS_DP;
use crate::types::AutodcaError;

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// When true, nothing that moves money is sent.
    #[serde(default = "default_true")]
    pub dry_run: bool,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    pub deposit: DepositConfig,
    pub allocation: AllocationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,
    #[serde(default = "default_passphrase_env")]
    pub passphrase_env: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
            passphrase_env: default_passphrase_env(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DepositConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Substring of the bank payment method name. Empty matches any bank.
    #[serde(default)]
    pub account_name: String,
    pub amount: Decimal,
    #[serde(default = "default_interval_days")]
    pub interval_days: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AllocationConfig {
    #[serde(default = "default_minimum_available")]
    pub minimum_available: Decimal,
    /// Use maker limit orders under the ticker instead of market orders.
    #[serde(default)]
    pub no_fee: bool,
    #[serde(default)]
    pub post_only: bool,
    /// Asset symbol → weight.
    pub assets: AllocationTable,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    PRODUCTION_URL.to_string()
}

fn default_api_key_env() -> String {
    "COINBASE_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "COINBASE_API_SECRET".to_string()
}

fn default_passphrase_env() -> String {
    "COINBASE_PASSPHRASE".to_string()
}

fn default_interval_days() -> i64 {
    DEFAULT_DEPOSIT_INTERVAL_DAYS
}

fn default_minimum_available() -> Decimal {
    DEFAULT_MINIMUM_AVAILABLE
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AutodcaError> {
        if self.deposit.amount <= dec!(0) {
            return Err(AutodcaError::Config(format!(
                "deposit.amount must be positive, got {}",
                self.deposit.amount
            )));
        }
        if self.deposit.amount.normalize().scale() > FUNDS_DP {
            return Err(AutodcaError::Config(format!(
                "deposit.amount must have at most {FUNDS_DP} decimal places, got {}",
                self.deposit.amount
            )));
        }
        if !(0..=MAX_DEPOSIT_INTERVAL_DAYS).contains(&self.deposit.interval_days) {
            return Err(AutodcaError::Config(format!(
                "deposit.interval_days must be between 0 and {MAX_DEPOSIT_INTERVAL_DAYS}, got {}",
                self.deposit.interval_days
            )));
        }
        if self.allocation.minimum_available < dec!(0) {
            return Err(AutodcaError::Config(
                "allocation.minimum_available must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// Apply `AUTODCA_DRY_RUN` on top of the file setting.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("AUTODCA_DRY_RUN") {
            if let Some(flag) = parse_flag(&raw) {
                self.dry_run = flag;
            }
        }
    }

    /// Read the exchange credentials named in `[exchange]`.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials::new(
            Self::resolve_env(&self.exchange.api_key_env)?,
            Self::resolve_env(&self.exchange.api_secret_env)?,
            Self::resolve_env(&self.exchange.passphrase_env)?,
        ))
    }

    /// The orchestrator's view of this configuration.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            deposit_enabled: self.deposit.enabled,
            deposit_account: self.deposit.account_name.clone(),
            deposit_amount: self.deposit.amount,
            deposit_interval: Duration::try_days(self.deposit.interval_days)
                .unwrap_or(Duration::MAX),
            min_available_to_trade: self.allocation.minimum_available,
            asset_allocation: self.allocation.assets.clone(),
            no_fee: self.allocation.no_fee,
            post_only: self.allocation.post_only,
            dry_run: self.dry_run,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

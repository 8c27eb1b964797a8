//! AUTODCA: scheduled USD deposits and fixed-weight crypto allocation.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! connects to the exchange, performs one deposit-then-allocate run and
//! exits. Meant to be driven by cron or a systemd timer.

use anyhow::Result;
use tracing::{error, info, warn};

use autodca::config::{self, AppConfig};
use autodca::engine;
use autodca::exchange::coinbase::CoinbaseExchange;
use autodca::exchange::Exchange;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let path =
        std::env::var("AUTODCA_CONFIG").unwrap_or_else(|_| config::DEFAULT_CONFIG_PATH.into());
    let mut cfg = AppConfig::load(&path)?;
    cfg.apply_env_overrides();

    init_logging();

    info!(
        config = %path,
        base_url = %cfg.exchange.base_url,
        dry_run = cfg.dry_run,
        deposit_amount = %cfg.deposit.amount,
        interval_days = cfg.deposit.interval_days,
        assets = cfg.allocation.assets.len(),
        no_fee = cfg.allocation.no_fee,
        "AUTODCA starting up"
    );
    if !cfg.dry_run {
        warn!("Live mode: deposits and orders will be submitted");
    }

    let exchange = CoinbaseExchange::new(&cfg.exchange.base_url, cfg.credentials()?)?;
    info!(exchange = exchange.name(), "Exchange client ready");

    let run_config = cfg.run_config();
    let mut print = |line: &str| println!("{line}");

    match engine::run(&exchange, &run_config, &mut print).await {
        Ok(report) => {
            info!(
                deposit = ?report.deposit,
                orders = report.orders.len(),
                "AUTODCA finished"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Run aborted");
            Err(e)
        }
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("autodca=info"));

    let json_logging = std::env::var("AUTODCA_LOG_JSON").is_ok();

    // Logs go to stderr; stdout carries the run report.
    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}

//! One full run: maybe deposit, then allocate.
//!
//! Progress goes to an injected reporter so the binary can print it and
//! tests can capture it. Logging happens independently through `tracing`.

use anyhow::Result;
use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::buyer::allocate_usd;
use super::deposits::{all_deposits, deposit};
use crate::exchange::Exchange;
use crate::strategy::allocation::AllocationTable;
use crate::strategy::deposit::should_create_deposit;
use crate::strategy::orders::BuyStrategy;
use crate::types::{DepositOutcome, RunReport};

/// Everything a run needs besides the exchange session.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub deposit_enabled: bool,
    /// Substring of the bank payment method name; empty matches any bank.
    pub deposit_account: String,
    pub deposit_amount: Decimal,
    pub deposit_interval: Duration,
    pub min_available_to_trade: Decimal,
    pub asset_allocation: AllocationTable,
    pub no_fee: bool,
    pub post_only: bool,
    pub dry_run: bool,
}

impl RunConfig {
    pub fn buy_strategy(&self) -> BuyStrategy {
        BuyStrategy::from_no_fee(self.no_fee, self.post_only)
    }
}

/// Deposit if none happened recently, then allocate available USD.
///
/// A deposit made here is not reflected in this run's allocation; the
/// balance settles later and is picked up by a future run.
pub async fn run(
    exchange: &dyn Exchange,
    config: &RunConfig,
    report: &mut dyn FnMut(&str),
) -> Result<RunReport> {
    info!(dry_run = config.dry_run, "Run starting");

    let deposit_outcome = if config.deposit_enabled {
        let previous = all_deposits(exchange).await?;
        report("Checking whether to deposit...");

        if should_create_deposit(&previous, config.deposit_interval) {
            report(&format!(
                "No deposit in {} days. Creating deposit for ${}.",
                config.deposit_interval.num_days(),
                config.deposit_amount
            ));
            let outcome = deposit(
                exchange,
                config.deposit_amount,
                &config.deposit_account,
                config.dry_run,
            )
            .await?;
            report(&pretty(&outcome));
            outcome
        } else {
            report("Skipped deposit.");
            DepositOutcome::Skipped
        }
    } else {
        report("Deposits disabled. Skipped deposit.");
        DepositOutcome::Skipped
    };

    report("Checking whether to allocate...");
    let orders = allocate_usd(
        exchange,
        &config.asset_allocation,
        config.min_available_to_trade,
        config.buy_strategy(),
        config.dry_run,
    )
    .await?;

    if orders.is_empty() {
        report("Skipped allocations.");
    } else {
        report(&pretty(&orders));
    }

    report("Done.");
    info!(orders = orders.len(), "Run complete");

    Ok(RunReport {
        deposit: deposit_outcome,
        orders,
    })
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

//! Trade executor.
//!
//! Turns per-asset USD amounts into orders and submits them, one asset at
//! a time, in allocation-table order. In dry-run mode the would-be orders
//! are logged and returned; nothing is submitted.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::account::available_to_trade;
use crate::exchange::Exchange;
use crate::strategy::allocation::{allocation_amounts, check_table, AllocationTable};
use crate::strategy::orders::{limit_buy_params, market_buy_params, product_id, BuyStrategy};
use crate::types::OrderOutcome;

/// Balance below which allocation is skipped.
pub const DEFAULT_MINIMUM_AVAILABLE: Decimal = rust_decimal_macros::dec!(100);

/// Buy `amount_in_usd` worth of `asset` against USD.
pub async fn buy(
    exchange: &dyn Exchange,
    asset: &str,
    amount_in_usd: Decimal,
    strategy: BuyStrategy,
    dry_run: bool,
) -> Result<OrderOutcome> {
    let pair = product_id(asset);

    let mut params = match strategy {
        BuyStrategy::Market => market_buy_params(&pair, amount_in_usd),
        BuyStrategy::Limit { post_only } => {
            let ticker = exchange
                .product_ticker(&pair)
                .await
                .with_context(|| format!("Failed to fetch ticker for {pair}"))?;
            limit_buy_params(&pair, amount_in_usd, ticker.price, post_only)?
        }
    };
    params.client_oid = Some(Uuid::new_v4().to_string());

    if dry_run {
        info!(asset, order = %params, "[DRY RUN] Would place order");
        return Ok(OrderOutcome::DryRun(params));
    }

    info!(asset, order = %params, "Placing order");
    let receipt = exchange
        .place_order(&params)
        .await
        .with_context(|| format!("Order for {pair} failed"))?;
    Ok(OrderOutcome::Placed(receipt))
}

/// Spend the available USD balance according to `table`.
///
/// The balance is read once; every order is sized from that snapshot.
/// Below `minimum_available` nothing is bought and an empty list comes back.
pub async fn allocate_usd(
    exchange: &dyn Exchange,
    table: &AllocationTable,
    minimum_available: Decimal,
    strategy: BuyStrategy,
    dry_run: bool,
) -> Result<Vec<OrderOutcome>> {
    let available = available_to_trade(exchange).await?;

    if available < minimum_available {
        info!(
            available = %available,
            minimum = %minimum_available,
            "Available USD below minimum, skipping allocation"
        );
        return Ok(Vec::new());
    }

    check_table(table);
    let amounts = allocation_amounts(available, table);
    info!(available = %available, assets = amounts.len(), "Allocating USD");

    let mut outcomes = Vec::with_capacity(amounts.len());
    for (asset, amount) in &amounts {
        outcomes.push(buy(exchange, asset, *amount, strategy, dry_run).await?);
    }

    Ok(outcomes)
}

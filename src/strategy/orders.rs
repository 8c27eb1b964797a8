//! Order construction.
//!
//! Two ways to turn a USD amount into a buy:
//! - market: spend the amount (truncated to cents) at market
//! - limit ("no-fee"): rest just under the last trade so the order adds
//!   liquidity instead of taking it, sized in asset units
//!
//! All quantisation truncates toward zero so an order never spends more
//! than it was given.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::types::{AutodcaError, OrderParams, OrderSide, OrderType, USD};

/// Decimal places the exchange accepts for USD funds.
pub const FUNDS_DP: u32 = 2;

/// Decimal places the exchange accepts for crypto size.
pub const SIZE_DP: u32 = 9;

/// How far under the last trade a maker limit order is placed.
pub const LIMIT_OFFSET: Decimal = dec!(0.50);

/// Order construction strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuyStrategy {
    #[default]
    Market,
    /// Maker-only limit order under the ticker.
    Limit { post_only: bool },
}

impl BuyStrategy {
    /// Pick the strategy from the `no_fee` flag.
    pub fn from_no_fee(no_fee: bool, post_only: bool) -> Self {
        if no_fee {
            BuyStrategy::Limit { post_only }
        } else {
            BuyStrategy::Market
        }
    }
}

/// Truncate toward zero to `dp` places and pad to exactly `dp` places.
pub fn truncate(value: Decimal, dp: u32) -> Decimal {
    let mut out = value.round_dp_with_strategy(dp, RoundingStrategy::ToZero);
    out.rescale(dp);
    out
}

/// `{ASSET}-USD`.
pub fn product_id(asset: &str) -> String {
    format!("{}-{USD}", asset.to_uppercase())
}

/// Market buy spending `amount_in_usd`, truncated to cents.
pub fn market_buy_params(product_id: &str, amount_in_usd: Decimal) -> OrderParams {
    OrderParams {
        product_id: product_id.to_string(),
        side: OrderSide::Buy,
        order: OrderType::Market {
            funds: truncate(amount_in_usd, FUNDS_DP),
        },
        client_oid: None,
    }
}

/// Limit buy at `ticker_price - LIMIT_OFFSET`, size = amount / price
/// truncated to [`SIZE_DP`] places.
pub fn limit_buy_params(
    product_id: &str,
    amount_in_usd: Decimal,
    ticker_price: Decimal,
    post_only: bool,
) -> Result<OrderParams, AutodcaError> {
    let price = ticker_price - LIMIT_OFFSET;
    if price <= Decimal::ZERO {
        return Err(AutodcaError::InvalidLimitPrice {
            product_id: product_id.to_string(),
            price,
        });
    }

    let size = amount_in_usd
        .checked_div(price)
        .map(|s| truncate(s, SIZE_DP))
        .ok_or_else(|| AutodcaError::InvalidLimitPrice {
            product_id: product_id.to_string(),
            price,
        })?;

    Ok(OrderParams {
        product_id: product_id.to_string(),
        side: OrderSide::Buy,
        order: OrderType::Limit {
            price,
            size,
            post_only,
        },
        client_oid: None,
    })
}

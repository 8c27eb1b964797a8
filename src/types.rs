//! Shared types for the AUTODCA agent.
//!
//! These types form the data model used across all modules: what the
//! exchange returns (accounts, payment methods, transfers, ledger entries,
//! tickers), what we send back (deposit and order requests) and the
//! outcome records the orchestrator reports.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Currency code of the fiat account all deposits and buys go through.
pub const USD: &str = "USD";

/// Payment method type eligible for deposits.
pub const BANK_ACCOUNT_TYPE: &str = "ach_bank_account";

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// A currency account on the exchange. Fetched fresh each run, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub currency: String,
    #[serde(default)]
    pub balance: Decimal,
    /// Balance not held by open orders or pending withdrawals.
    pub available: Decimal,
    #[serde(default)]
    pub hold: Decimal,
}

/// A linked funding source (bank account, card, wallet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    pub name: String,
    /// Exchange type tag, e.g. `ach_bank_account`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub currency: Option<String>,
}

impl PaymentMethod {
    pub fn is_bank_account(&self) -> bool {
        self.kind == BANK_ACCOUNT_TYPE
    }
}

// ---------------------------------------------------------------------------
// Deposit history
// ---------------------------------------------------------------------------

/// A transfer into or out of an account, as listed by
/// `/accounts/{id}/transfers`. This is the deposit record consulted by the
/// recency check; completion and cancellation are carried but unused there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

impl Transfer {
    pub fn is_canceled(&self) -> bool {
        self.canceled_at.is_some()
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Details attached to a ledger entry. Only transfers carry `transfer_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerDetails {
    #[serde(default)]
    pub transfer_id: Option<String>,
    #[serde(default)]
    pub transfer_type: Option<String>,
}

/// One row of an account's history (`/accounts/{id}/ledger`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: DateTime<Utc>,
    pub amount: Decimal,
    #[serde(default)]
    pub balance: Decimal,
    /// `transfer`, `match`, `fee`, `rebate`, ...
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub details: LedgerDetails,
}

impl LedgerEntry {
    /// Whether this entry is a completed bank deposit into the account.
    pub fn is_deposit(&self) -> bool {
        self.kind == "transfer" && self.details.transfer_type.as_deref() == Some("deposit")
    }
}

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the next (older) page; `None` when this was the last one.
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

/// Snapshot of the last trade for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub price: Decimal,
    #[serde(default)]
    pub bid: Option<Decimal>,
    #[serde(default)]
    pub ask: Option<Decimal>,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Deposit from a linked payment method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub amount: Decimal,
    pub currency: String,
    pub payment_method_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "buy"),
        }
    }
}

/// How an order is sized and priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OrderType {
    /// Spend `funds` USD at whatever the book gives.
    Market { funds: Decimal },
    /// Rest `size` units at `price`.
    Limit {
        price: Decimal,
        size: Decimal,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        post_only: bool,
    },
}

/// Fully built order, ready for `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderParams {
    pub product_id: String,
    pub side: OrderSide,
    #[serde(flatten)]
    pub order: OrderType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_oid: Option<String>,
}

impl fmt::Display for OrderParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.order {
            OrderType::Market { funds } => {
                write!(f, "market {} {} funds=${}", self.side, self.product_id, funds)
            }
            OrderType::Limit { price, size, .. } => write!(
                f,
                "limit {} {} size={} @ {}",
                self.side, self.product_id, size, price
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Receipts and outcomes
// ---------------------------------------------------------------------------

/// Exchange confirmation of a deposit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositReceipt {
    pub id: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default)]
    pub payout_at: Option<String>,
}

/// Exchange acknowledgment of an accepted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub id: String,
    pub product_id: String,
    pub side: OrderSide,
    #[serde(rename = "type", default)]
    pub order_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub funds: Option<Decimal>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub size: Option<Decimal>,
    #[serde(default)]
    pub post_only: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// What happened in the deposit step of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum DepositOutcome {
    /// A recent deposit exists or deposits are disabled.
    Skipped,
    /// Would have deposited; nothing was sent.
    DryRun(DepositRequest),
    Submitted(DepositReceipt),
}

/// What happened to one per-asset buy.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum OrderOutcome {
    DryRun(OrderParams),
    Placed(OrderReceipt),
}

/// Summary of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub deposit: DepositOutcome,
    pub orders: Vec<OrderOutcome>,
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Parse an exchange timestamp.
///
/// Most endpoints return RFC 3339 (`2017-12-01T18:51:12.162516Z`), the
/// transfers listing returns `2017-12-05 19:09:01.962394+00`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.with_timezone(&Utc));
    }
    // No offset at all: the exchange only ever speaks UTC.
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn de_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for AUTODCA.
#[derive(Debug, thiserror::Error)]
pub enum AutodcaError {
    #[error("No USD account found on the exchange")]
    NoUsdAccount,

    #[error("No bank payment method matching {pattern:?}")]
    NoPaymentMethod { pattern: String },

    #[error("Limit price {price} for {product_id} is not positive")]
    InvalidLimitPrice { product_id: String, price: Decimal },

    #[error("Exchange error ({status}): {message}")]
    Exchange { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

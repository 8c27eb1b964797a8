//! Exchange integration.
//!
//! Defines the `Exchange` trait, the brokerage surface the engine needs,
//! and provides an implementation for:
//! - Coinbase Exchange (formerly GDAX): REST with HMAC-signed requests

pub mod auth;
pub mod coinbase;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{
    Account, DepositReceipt, DepositRequest, LedgerEntry, OrderParams, OrderReceipt, Page,
    PaymentMethod, Ticker, Transfer,
};

/// Abstraction over the exchange account the agent operates on.
///
/// Read operations are always safe to call. `deposit` and `place_order`
/// move money and are never called in dry-run mode.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Exchange: Send + Sync {
    /// All currency accounts of the authenticated profile.
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// All linked payment methods.
    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>>;

    /// One page of an account's history. `after` is the cursor returned
    /// with the previous page; `None` fetches the newest page.
    async fn account_history(
        &self,
        account_id: &str,
        after: Option<String>,
    ) -> Result<Page<LedgerEntry>>;

    /// Every transfer on an account, pending, completed or canceled.
    async fn list_transfers(&self, account_id: &str) -> Result<Vec<Transfer>>;

    /// Last trade for a product such as `BTC-USD`.
    async fn product_ticker(&self, product_id: &str) -> Result<Ticker>;

    /// Pull funds from a linked payment method.
    async fn deposit(&self, request: &DepositRequest) -> Result<DepositReceipt>;

    /// Submit an order.
    async fn place_order(&self, params: &OrderParams) -> Result<OrderReceipt>;

    /// Exchange name for logging.
    fn name(&self) -> &str;
}

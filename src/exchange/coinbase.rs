//! Coinbase Exchange (formerly GDAX) integration.
//!
//! API docs: https://docs.cdp.coinbase.com/exchange/reference
//! Base URL: https://api.exchange.coinbase.com
//! Sandbox: https://api-public.sandbox.exchange.coinbase.com
//! Auth: HMAC-signed `CB-ACCESS-*` headers on every private request.
//! Pagination: cursor in the `CB-AFTER` response header, sent back as `?after=`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::auth::Credentials;
use super::Exchange;
use crate::types::{
    Account, AutodcaError, DepositReceipt, DepositRequest, LedgerEntry, OrderParams,
    OrderReceipt, Page, PaymentMethod, Ticker, Transfer,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const PRODUCTION_URL: &str = "https://api.exchange.coinbase.com";
pub const SANDBOX_URL: &str = "https://api-public.sandbox.exchange.coinbase.com";
const EXCHANGE_NAME: &str = "coinbase";

/// Response header carrying the cursor for the next (older) page.
const CURSOR_HEADER: &str = "cb-after";

/// Maximum page size the exchange accepts.
const PAGE_LIMIT: u32 = 100;

// ---------------------------------------------------------------------------
// API error body
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Coinbase Exchange client bound to one API key.
pub struct CoinbaseExchange {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl CoinbaseExchange {
    /// Create a client against `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("AUTODCA/0.1.0 (deposit-and-allocate)")
            .build()
            .context("Failed to build HTTP client for Coinbase")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- Internal helpers ------------------------------------------------

    /// Send a signed request and return the raw response after status checks.
    ///
    /// `path` includes any query string; it is signed exactly as sent.
    async fn send(&self, method: Method, path: &str, body: Option<String>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, path);
        let timestamp = Utc::now().timestamp().to_string();
        let payload = body.unwrap_or_default();
        let headers = self
            .credentials
            .sign(&timestamp, method.as_str(), path, &payload)?;

        debug!(method = %method, url = %url, "Coinbase API request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header("CB-ACCESS-KEY", headers.key)
            .header("CB-ACCESS-SIGN", headers.sign)
            .header("CB-ACCESS-TIMESTAMP", headers.timestamp)
            .header("CB-ACCESS-PASSPHRASE", headers.passphrase)
            .header("Accept", "application/json");
        if !payload.is_empty() {
            req = req
                .header("Content-Type", "application/json")
                .body(payload);
        }

        let resp = req
            .send()
            .await
            .with_context(|| format!("Coinbase {method} {path} request failed"))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(Self::api_error(status.as_u16(), &text).into());
        }

        Ok(resp)
    }

    /// Turn a non-2xx body into a typed error, preferring the exchange's
    /// own `message` field.
    fn api_error(status: u16, body: &str) -> AutodcaError {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| body.to_string());
        AutodcaError::Exchange { status, message }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(Method::GET, path, None)
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse Coinbase GET {path} response"))
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let payload = serde_json::to_string(body)
            .with_context(|| format!("Failed to serialise Coinbase POST {path} body"))?;
        self.send(Method::POST, path, Some(payload))
            .await?
            .json()
            .await
            .with_context(|| format!("Failed to parse Coinbase POST {path} response"))
    }

    /// Untyped GET for resources without a dedicated helper. Returns the
    /// decoded JSON as-is.
    pub async fn raw_get(&self, path: &str) -> Result<serde_json::Value> {
        let resp = self.send(Method::GET, path, None).await?;
        resp.json()
            .await
            .with_context(|| format!("Failed to parse Coinbase GET {path} response"))
    }

    /// Cursor for the following page. A missing or empty header, or an
    /// empty page, ends the walk.
    fn next_cursor(header: Option<&HeaderValue>, page_empty: bool) -> Option<String> {
        if page_empty {
            return None;
        }
        header
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn history_path(account_id: &str, after: Option<&str>) -> String {
        let mut path = format!(
            "/accounts/{}/ledger?limit={PAGE_LIMIT}",
            urlencoding::encode(account_id)
        );
        if let Some(cursor) = after {
            path.push_str("&after=");
            path.push_str(&urlencoding::encode(cursor));
        }
        path
    }
}

#[async_trait]
impl Exchange for CoinbaseExchange {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let accounts: Vec<Account> = self.get("/accounts").await?;
        debug!(count = accounts.len(), "Coinbase accounts fetched");
        Ok(accounts)
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>> {
        self.get("/payment-methods").await
    }

    async fn account_history(
        &self,
        account_id: &str,
        after: Option<String>,
    ) -> Result<Page<LedgerEntry>> {
        let path = Self::history_path(account_id, after.as_deref());
        let resp = self.send(Method::GET, &path, None).await?;

        let header = resp.headers().get(CURSOR_HEADER).cloned();

        let items: Vec<LedgerEntry> = resp
            .json()
            .await
            .context("Failed to parse Coinbase ledger response")?;

        let next_cursor = Self::next_cursor(header.as_ref(), items.is_empty());
        Ok(Page { items, next_cursor })
    }

    async fn list_transfers(&self, account_id: &str) -> Result<Vec<Transfer>> {
        // The transfers resource has no typed helper; it goes through the
        // raw call path and is decoded here.
        let path = format!("/accounts/{}/transfers", urlencoding::encode(account_id));
        let value = self.raw_get(&path).await?;
        serde_json::from_value(value).context("Failed to parse Coinbase transfers response")
    }

    async fn product_ticker(&self, product_id: &str) -> Result<Ticker> {
        let path = format!("/products/{}/ticker", urlencoding::encode(product_id));
        self.get(&path).await
    }

    async fn deposit(&self, request: &DepositRequest) -> Result<DepositReceipt> {
        let receipt: DepositReceipt = self.post("/deposits/payment-method", request).await?;
        info!(
            deposit_id = %receipt.id,
            amount = %receipt.amount,
            currency = %receipt.currency,
            "Coinbase deposit accepted"
        );
        Ok(receipt)
    }

    async fn place_order(&self, params: &OrderParams) -> Result<OrderReceipt> {
        let receipt: OrderReceipt = self.post("/orders", params).await?;
        info!(
            order_id = %receipt.id,
            product_id = %receipt.product_id,
            status = %receipt.status,
            "Coinbase order accepted"
        );
        Ok(receipt)
    }

    fn name(&self) -> &str {
        EXCHANGE_NAME
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! USD account lookup.

use anyhow::Result;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::exchange::Exchange;
use crate::types::{Account, AutodcaError, USD};

/// The profile's USD account. First match wins if the exchange ever
/// returns more than one.
pub async fn usd_account(exchange: &dyn Exchange) -> Result<Account> {
    let accounts = exchange.list_accounts().await?;
    let mut usd = accounts.into_iter().filter(|a| a.currency == USD);

    let account = usd.next().ok_or(AutodcaError::NoUsdAccount)?;
    let extra = usd.count();
    if extra > 0 {
        warn!(
            account_id = %account.id,
            ignored = extra,
            "Multiple USD accounts, using the first"
        );
    }

    debug!(account_id = %account.id, available = %account.available, "USD account");
    Ok(account)
}

/// USD available to trade right now.
pub async fn available_to_trade(exchange: &dyn Exchange) -> Result<Decimal> {
    Ok(usd_account(exchange).await?.available)
}

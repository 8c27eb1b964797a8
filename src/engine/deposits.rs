//! Deposit history and deposit submission.
//!
//! Two history views exist:
//! - [`completed_deposits`]: transfer-type ledger entries, i.e. deposits
//!   that have settled into the account, walked page by page
//! - [`all_deposits`]: the account's transfer list, pending and canceled
//!   included; this is what the recency check looks at

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::account::usd_account;
use crate::exchange::Exchange;
use crate::types::{
    AutodcaError, DepositOutcome, DepositRequest, LedgerEntry, PaymentMethod, Transfer, USD,
};

/// Every settled deposit on the USD account, newest first, across all
/// history pages.
pub async fn completed_deposits(exchange: &dyn Exchange) -> Result<Vec<LedgerEntry>> {
    let account = usd_account(exchange).await?;

    let mut deposits = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = exchange
            .account_history(&account.id, cursor.clone())
            .await
            .with_context(|| format!("Failed to fetch history page {}", pages + 1))?;
        pages += 1;

        deposits.extend(page.items.into_iter().filter(LedgerEntry::is_deposit));

        match page.next_cursor {
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                warn!(cursor = %next, "History cursor did not advance, stopping");
                break;
            }
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!(pages, count = deposits.len(), "Completed deposits collected");
    Ok(deposits)
}

/// Every transfer on the USD account regardless of state.
pub async fn all_deposits(exchange: &dyn Exchange) -> Result<Vec<Transfer>> {
    let account = usd_account(exchange).await?;
    let transfers = exchange.list_transfers(&account.id).await?;
    debug!(count = transfers.len(), "Transfers fetched");
    Ok(transfers)
}

/// First bank payment method whose name contains `match_substring`
/// (empty matches any bank account), in the order the exchange lists them.
pub async fn find_bank_payment_method(
    exchange: &dyn Exchange,
    match_substring: &str,
) -> Result<PaymentMethod> {
    let method = exchange
        .list_payment_methods()
        .await?
        .into_iter()
        .find(|p| p.is_bank_account() && p.name.contains(match_substring))
        .ok_or_else(|| AutodcaError::NoPaymentMethod {
            pattern: match_substring.to_string(),
        })?;

    info!(payment_method = %method.name, "Using bank payment method");
    Ok(method)
}

/// Deposit `amount` USD from the matching bank account.
///
/// The payment method is resolved even in dry-run mode so a bad
/// `account_name` fails before any money would move.
pub async fn deposit(
    exchange: &dyn Exchange,
    amount: Decimal,
    account_name: &str,
    dry_run: bool,
) -> Result<DepositOutcome> {
    let method = find_bank_payment_method(exchange, account_name).await?;
    let request = DepositRequest {
        amount,
        currency: USD.to_string(),
        payment_method_id: method.id,
    };

    if dry_run {
        info!(amount = %amount, "[DRY RUN] Would deposit");
        return Ok(DepositOutcome::DryRun(request));
    }

    let receipt = exchange
        .deposit(&request)
        .await
        .context("Deposit request failed")?;
    Ok(DepositOutcome::Submitted(receipt))
}

//! End-to-end runs of the deposit-then-allocate sequence against the
//! in-memory exchange.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use autodca::engine::deposits::completed_deposits;
use autodca::engine::{run, RunConfig};
use autodca::strategy::allocation::AllocationTable;
use autodca::types::*;

use crate::mock_exchange::{ledger_entry, Call, MockExchange};

fn config(dry_run: bool, no_fee: bool) -> RunConfig {
    let allocation: AllocationTable = [
        ("BTC".to_string(), dec!(0.6)),
        ("ETH".to_string(), dec!(0.4)),
    ]
    .into_iter()
    .collect();

    RunConfig {
        deposit_enabled: true,
        deposit_account: "Chase".to_string(),
        deposit_amount: dec!(250),
        deposit_interval: Duration::days(15),
        min_available_to_trade: dec!(100),
        asset_allocation: allocation,
        no_fee,
        post_only: false,
        dry_run,
    }
}

async fn run_capturing(
    exchange: &MockExchange,
    cfg: &RunConfig,
) -> (anyhow::Result<RunReport>, Vec<String>) {
    let mut lines = Vec::new();
    let mut report = |line: &str| lines.push(line.to_string());
    let result = run(exchange, cfg, &mut report).await;
    (result, lines)
}

fn funds_of(outcome: &OrderOutcome) -> (String, Decimal) {
    match outcome {
        OrderOutcome::Placed(r) => (r.product_id.clone(), r.funds.unwrap_or_default()),
        OrderOutcome::DryRun(p) => match &p.order {
            OrderType::Market { funds } => (p.product_id.clone(), *funds),
            OrderType::Limit { .. } => panic!("expected market order"),
        },
    }
}

#[tokio::test]
async fn test_live_run_deposits_and_buys_market() {
    let exchange = MockExchange::new(dec!(1000.00)).with_transfer(20, false);
    let (result, lines) = run_capturing(&exchange, &config(false, false)).await;
    let report = result.unwrap();

    match &report.deposit {
        DepositOutcome::Submitted(r) => {
            assert_eq!(r.amount, dec!(250));
            assert_eq!(r.currency, "USD");
        }
        other => panic!("expected submitted deposit, got {other:?}"),
    }

    let funds: Vec<_> = report.orders.iter().map(funds_of).collect();
    assert_eq!(
        funds,
        vec![
            ("BTC-USD".to_string(), dec!(600.00)),
            ("ETH-USD".to_string(), dec!(400.00)),
        ]
    );

    let mutating = exchange.mutating_calls();
    assert_eq!(mutating.len(), 3);
    match &mutating[0] {
        Call::Deposit(req) => assert_eq!(req.payment_method_id, "pm-chase"),
        other => panic!("deposit should come first, got {other:?}"),
    }
    for call in &mutating[1..] {
        let Call::PlaceOrder(p) = call else {
            panic!("expected order, got {call:?}");
        };
        let OrderType::Market { funds } = &p.order else {
            panic!("expected market order");
        };
        assert_eq!(funds.scale(), 2);
    }

    assert_eq!(lines.first().map(String::as_str), Some("Checking whether to deposit..."));
    assert!(lines.contains(&"No deposit in 15 days. Creating deposit for $250.".to_string()));
    assert!(lines.contains(&"Checking whether to allocate...".to_string()));
    assert_eq!(lines.last().map(String::as_str), Some("Done."));
}

#[tokio::test]
async fn test_transfer_listing_queried_for_usd_account() {
    let exchange = MockExchange::new(dec!(0));
    let (result, _) = run_capturing(&exchange, &config(true, false)).await;
    result.unwrap();

    assert!(exchange
        .calls()
        .contains(&Call::ListTransfers("usd-acct".to_string())));
}

#[tokio::test]
async fn test_recent_deposit_skips_deposit() {
    let exchange = MockExchange::new(dec!(1000)).with_transfer(5, false);
    let (result, lines) = run_capturing(&exchange, &config(false, false)).await;
    let report = result.unwrap();

    assert_eq!(report.deposit, DepositOutcome::Skipped);
    assert!(lines.contains(&"Skipped deposit.".to_string()));
    assert!(!exchange
        .calls()
        .iter()
        .any(|c| matches!(c, Call::Deposit(_) | Call::ListPaymentMethods)));
}

#[tokio::test]
async fn test_recent_canceled_deposit_still_skips() {
    let exchange = MockExchange::new(dec!(1000)).with_transfer(3, true);
    let (result, _) = run_capturing(&exchange, &config(false, false)).await;
    assert_eq!(result.unwrap().deposit, DepositOutcome::Skipped);
}

#[tokio::test]
async fn test_below_minimum_skips_allocation() {
    let exchange = MockExchange::new(dec!(99.99)).with_transfer(1, false);
    let (result, lines) = run_capturing(&exchange, &config(false, true)).await;
    let report = result.unwrap();

    assert!(report.orders.is_empty());
    assert!(lines.contains(&"Skipped allocations.".to_string()));
    assert!(exchange.mutating_calls().is_empty());
    assert!(!exchange.calls().iter().any(|c| matches!(c, Call::Ticker(_))));
}

#[tokio::test]
async fn test_dry_run_never_mutates() {
    for no_fee in [false, true] {
        let exchange = MockExchange::new(dec!(5000));
        let (result, lines) = run_capturing(&exchange, &config(true, no_fee)).await;
        let report = result.unwrap();

        assert!(exchange.mutating_calls().is_empty());
        assert!(matches!(report.deposit, DepositOutcome::DryRun(_)));
        assert_eq!(report.orders.len(), 2);
        assert!(report
            .orders
            .iter()
            .all(|o| matches!(o, OrderOutcome::DryRun(_))));
        // Reads still happen.
        assert!(exchange.calls().contains(&Call::ListPaymentMethods));
        assert_eq!(lines.last().map(String::as_str), Some("Done."));
    }
}

#[tokio::test]
async fn test_no_fee_places_limit_orders_under_ticker() {
    let exchange = MockExchange::new(dec!(1000.00)).with_transfer(1, false);
    let (result, _) = run_capturing(&exchange, &config(false, true)).await;
    let report = result.unwrap();

    assert_eq!(report.orders.len(), 2);
    let orders: Vec<OrderParams> = exchange
        .mutating_calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::PlaceOrder(p) => Some(p),
            _ => None,
        })
        .collect();

    let OrderType::Limit { price, size, .. } = &orders[0].order else {
        panic!("expected limit order");
    };
    assert_eq!(orders[0].product_id, "BTC-USD");
    assert_eq!(price.to_string(), "49999.73");
    assert_eq!(size.to_string(), "0.012000064");

    let OrderType::Limit { price, size, .. } = &orders[1].order else {
        panic!("expected limit order");
    };
    assert_eq!(orders[1].product_id, "ETH-USD");
    assert_eq!(*price, dec!(1999.50));
    assert_eq!(size.to_string(), "0.200050012");
}

#[tokio::test]
async fn test_missing_bank_account_aborts_before_allocation() {
    let exchange = MockExchange::new(dec!(1000));
    let mut cfg = config(false, false);
    cfg.deposit_account = "Wells Fargo".to_string();

    let (result, lines) = run_capturing(&exchange, &cfg).await;
    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AutodcaError>(),
        Some(AutodcaError::NoPaymentMethod { .. })
    ));
    assert!(exchange.mutating_calls().is_empty());
    assert!(!lines.contains(&"Done.".to_string()));
}

#[tokio::test]
async fn test_missing_usd_account_is_fatal() {
    let exchange = MockExchange::new(dec!(1000)).without_usd_account();
    let (result, lines) = run_capturing(&exchange, &config(true, false)).await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AutodcaError>(),
        Some(AutodcaError::NoUsdAccount)
    ));
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_order_failure_aborts_run() {
    let exchange = MockExchange::new(dec!(1000)).with_transfer(1, false);
    exchange.fail_orders("Insufficient funds");

    let (result, lines) = run_capturing(&exchange, &config(false, false)).await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("Insufficient funds"));
    // First order failed, second never attempted.
    assert_eq!(exchange.mutating_calls().len(), 1);
    assert!(!lines.contains(&"Done.".to_string()));
}

#[tokio::test]
async fn test_deposits_disabled() {
    let exchange = MockExchange::new(dec!(0));
    let mut cfg = config(false, false);
    cfg.deposit_enabled = false;

    let (result, lines) = run_capturing(&exchange, &cfg).await;
    assert_eq!(result.unwrap().deposit, DepositOutcome::Skipped);
    assert!(!exchange
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ListTransfers(_))));
    assert_eq!(lines[0], "Deposits disabled. Skipped deposit.");
}

#[tokio::test]
async fn test_completed_deposits_across_pages() {
    let exchange = MockExchange::new(dec!(0)).with_history_pages(vec![
        vec![ledger_entry("a", true), ledger_entry("b", false)],
        vec![ledger_entry("c", false)],
        vec![ledger_entry("d", true)],
    ]);

    let deposits = completed_deposits(&exchange).await.unwrap();
    let ids: Vec<_> = deposits.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "d"]);

    let cursors: Vec<_> = exchange
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::AccountHistory(after) => Some(after),
            _ => None,
        })
        .collect();
    assert_eq!(
        cursors,
        vec![None, Some("1".to_string()), Some("2".to_string())]
    );
}

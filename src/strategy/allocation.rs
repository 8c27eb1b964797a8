//! Fixed-weight allocation of available USD across assets.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

/// Asset symbol → weight (0.6 = 60% of available USD).
pub type AllocationTable = BTreeMap<String, Decimal>;

/// Split `amount` across assets: `amount × weight` per entry, exact decimal.
///
/// Weights are not required to sum to 1; any shortfall stays as USD and
/// any excess is the caller's problem (see [`check_table`]).
pub fn allocation_amounts(amount: Decimal, table: &AllocationTable) -> BTreeMap<String, Decimal> {
    table
        .iter()
        .map(|(asset, weight)| (asset.clone(), amount * *weight))
        .collect()
}

/// Sum of all weights.
pub fn total_weight(table: &AllocationTable) -> Decimal {
    table.values().copied().sum()
}

/// Log what looks wrong with a table without rejecting it.
///
/// Returns the number of problems found.
pub fn check_table(table: &AllocationTable) -> usize {
    let mut problems = 0;

    if table.is_empty() {
        warn!("Allocation table is empty, nothing will be bought");
        problems += 1;
    }

    for (asset, weight) in table {
        if weight.is_sign_negative() && !weight.is_zero() {
            warn!(asset = %asset, weight = %weight, "Negative allocation weight");
            problems += 1;
        }
    }

    let total = total_weight(table);
    if total > Decimal::ONE {
        warn!(total = %total, "Allocation weights sum above 1, orders may exceed available USD");
        problems += 1;
    }

    problems
}

//! Decision logic: when to deposit, how to split USD, how to shape orders.
//!
//! Everything here is pure. The engine fetches state from the exchange and
//! feeds it through these functions.

pub mod allocation;
pub mod deposit;
pub mod orders;

pub use allocation::{allocation_amounts, AllocationTable};
pub use deposit::should_create_deposit;
pub use orders::{limit_buy_params, market_buy_params, BuyStrategy};

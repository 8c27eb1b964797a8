//! Core engine: account and history queries, deposits, buys, and the
//! run sequence that ties them together.

pub mod account;
pub mod buyer;
pub mod deposits;
pub mod runner;

pub use runner::{run, RunConfig};

//! Integration test harness.

mod run_flow;

//! Integration test crate for the LP vault.
//!
//! This crate has no library code. It only contains integration tests
//! that drive the vault end to end across the workspace crates, using the
//! simulated booster, the stub router and the in-memory bank.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p lpvault-integration-tests
//! ```

//! HTTP server for the tournament tracker.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the router can be exercised in integration tests.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

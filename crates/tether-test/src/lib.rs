//! Tether Test Harness - fixtures and end-to-end scenarios
//!
//! This crate provides:
//! - Recording sinks for both callback shapes
//! - A sample domain value used by the scenarios
//! - Tracing initialization for test and bench runs
//! - End-to-end scenarios across core, reactor and bridge

pub mod fixtures;
pub mod integration;

pub use fixtures::*;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a test-friendly tracing subscriber.
///
/// Honors `RUST_LOG`, falling back to `warn`. Safe to call more than once.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_test_writer())
        .with(env_filter)
        .try_init();
}

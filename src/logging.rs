//! Diagnostic logging.
//!
//! User-facing output goes through the crate's terminal macros. This module
//! only wires up `tracing` for the request, refresh and storage internals,
//! which stay silent unless a filter asks for them.

use std::env;

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "warn";

/// Resolves the filter directive: `SORTURL_LOG`, then `RUST_LOG`, then `warn`.
pub fn filter_directive() -> String {
    env::var("SORTURL_LOG")
        .or_else(|_| env::var("RUST_LOG"))
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Installs the global subscriber writing to stderr.
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init() {
    let filter =
        EnvFilter::try_new(filter_directive()).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

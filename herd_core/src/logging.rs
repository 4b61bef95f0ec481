//! Log output for herdbook.
//!
//! Recomputed dates and batch decisions are logged at DEBUG, herd changes
//! and file loads at INFO. Everything goes to stderr, leaving stdout to the
//! job list and `--json` output.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Start logging for the `herdbook` binary; `verbose` shows per-calf detail.
///
/// `RUST_LOG=herd_core::batching=debug` shows only how calves were grouped
/// for deworming.
pub fn init(verbose: bool) {
    init_with_level(if verbose { "debug" } else { "warn" })
}

/// Start logging at `default_level` unless RUST_LOG is set
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().without_time().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("herd_core=debug"))
        .try_init();
}

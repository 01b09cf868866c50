//! Diagnostic logging for the command-line runner.
//!
//! Program output (tapes, traces, JSON) goes to stdout. Engine diagnostics go through
//! `tracing` to stderr and are controlled by `RUST_LOG`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the stderr subscriber.
///
/// Reads `RUST_LOG`, defaulting to `warn`. `--verbose` raises the default to `debug`.
///
/// ```bash
/// RUST_LOG=turing_engine=trace turing-cli -e "Binary Increment"
/// ```
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

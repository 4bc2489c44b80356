//! Diagnostic tracing for SaveWarden
//!
//! Diagnostics go to stderr and are controlled by `RUST_LOG`. Command output
//! (event lines, listings) is printed to stdout by the CLI handlers and is
//! not affected by the filter.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Reads `RUST_LOG`; defaults to `warn`, or `savewarden=debug` when `verbose`.
///
/// # Example
/// ```bash
/// RUST_LOG=savewarden=trace savewarden watch
/// ```
pub fn init(verbose: bool) {
    let fallback = if verbose { "savewarden=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}

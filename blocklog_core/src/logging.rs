//! Diagnostic tracing for blocklog itself.
//!
//! This is separate from the `Logger`: it reports what the library and the
//! CLI are doing (config loaded, files opened) and never carries user lines.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize diagnostics at `warn`, overridable with RUST_LOG.
pub fn init() {
    init_with_level("warn")
}

/// Initialize diagnostics with a specific default level
///
/// Output goes to stderr so it never mixes into the normal channel.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize diagnostics for testing (captures output for test runs)
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}

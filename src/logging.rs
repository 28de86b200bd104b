//! Logging Initialisation
//!
//! Structured logging via `tracing`, with a default level overridable through
//! the standard `RUST_LOG` environment variable.

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialises the global `tracing` subscriber.
///
/// `default_level` is used when `RUST_LOG` is unset or invalid (e.g. `"info"`,
/// `"debug"`). Call once, near the top of `main`.
pub fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .compact()
        .init();
}

//! Logging utilities for redline-wide output to stdout.
//!

// Re-exports for convenience
pub use tracing::metadata::LevelFilter;
pub use tracing::{debug, error, info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{util::SubscriberInitExt, Layer};

/// Set up basic logging
pub fn setup(level: Option<LevelFilter>) {
    let level = level.unwrap_or(LevelFilter::INFO);
    // The user can specify a log level via an env var
    // (such as for testing). The driver is noisy below warn.
    let env = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("{level},tokio_postgres=warn"));
    let logging_layers = vec![
        tracing_subscriber::EnvFilter::new(env).boxed(),
        // The input level overrides any env vars.
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(level)
            .boxed(),
    ];

    // Actually initialize all logging layers
    tracing_subscriber::registry().with(logging_layers).init();

    debug!("logging set up");
}

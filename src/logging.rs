//! Logging setup for hosts embedding griddle.
//!
//! The crate itself only emits `tracing` events; a host application that
//! wants to see them calls [`init`] once at startup. Output goes to the
//! console, filtered by `RUST_LOG` (default `info`).
//!
//! ```no_run
//! griddle::logging::init().expect("Failed to initialize logging");
//! tracing::info!("host started");
//! ```

use anyhow::{Context as _, Result};
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Installs a console `tracing` subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed or the
/// `RUST_LOG` filter cannot be parsed.
pub fn init() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

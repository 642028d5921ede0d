//! Logger Module
//!
//! Console logging based on `tracing-subscriber`, with the filter directive
//! taken from configuration. Delivery logging is an observability side effect
//! only; nothing in the engine's contract depends on it.

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize console logging with the given filter directive
///
/// Falls back to `info` if the directive cannot be parsed.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let is_tty = std::io::stdout().is_terminal();

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(is_tty)
                .with_target(true)
                .with_level(true),
        )
        .try_init()?;

    Ok(())
}

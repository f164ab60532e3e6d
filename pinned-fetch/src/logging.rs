use crate::config::Config;
use anyhow::{anyhow, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// Filter precedence: `RUST_LOG` if set and valid, then `FETCH_LOG_LEVEL`,
/// then `info`. Fails if a subscriber is already installed.
pub fn setup_logging(cfg: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_directive(cfg)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("install tracing subscriber: {e}"))?;

    debug!(fallback = fallback_directive(cfg), "logging initialized");
    Ok(())
}

fn fallback_directive(cfg: &Config) -> &str {
    cfg.log_level
        .as_deref()
        .map(str::trim)
        .filter(|level| !level.is_empty())
        .unwrap_or("info")
}

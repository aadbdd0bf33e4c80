//! Tracing subscriber setup
//!
//! The subscriber is installed before the TOML config is read so config
//! loading is logged too. The config's `[logging] level` is applied afterwards
//! unless `RUST_LOG` already chose a filter.

use anyhow::{Context, Result};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

const DEFAULT_LEVEL: &str = "info";

/// Handle to the live log filter
pub struct LogFilter {
    handle: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogFilter {
    /// Switch to the configured level unless `RUST_LOG` was set; returns the active filter
    pub fn apply_config_level(&self, level: &str) -> Result<String> {
        if !self.from_env {
            let filter = EnvFilter::try_new(level)
                .with_context(|| format!("Invalid log level '{}'", level))?;
            self.handle.reload(filter)?;
        }
        Ok(self.handle.with_current(|filter| filter.to_string())?)
    }
}

/// fmt subscriber behind a reloadable filter; `env_filter` wins over any later config level
pub fn subscriber(
    env_filter: Option<EnvFilter>,
) -> (impl tracing::Subscriber + Send + Sync, LogFilter) {
    let from_env = env_filter.is_some();
    let (filter, handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL)));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());

    (subscriber, LogFilter { handle, from_env })
}

/// Install the global subscriber, reading `RUST_LOG` when set
pub fn init() -> LogFilter {
    let (subscriber, filter) = subscriber(EnvFilter::try_from_default_env().ok());
    subscriber.init();
    filter
}

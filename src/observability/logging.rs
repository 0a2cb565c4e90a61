//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the `tracing` subscriber from `LoggingConfig`
//! - Per-target levels (`loggers` map) on top of the root level
//!
//! # Design Decisions
//! - Components log under their module path, which doubles as the
//!   channel name for filtering (e.g. `mainspring::http::server`)
//! - JSON format for production, text format for development
//! - `RUST_LOG` overrides the configured filter when set
//! - Initialization is idempotent: later calls are no-ops

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Filter directives for the configuration, e.g. `info,mainspring::http=debug`.
pub fn directives(config: &LoggingConfig) -> String {
    let mut directives = vec![config.level.clone()];
    directives.extend(
        config
            .loggers
            .iter()
            .map(|(target, level)| format!("{}={}", target, level)),
    );
    directives.join(",")
}

/// Install the global subscriber. Returns false if one was already set.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(config)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    match result {
        Ok(()) => {
            tracing::debug!(filter = %directives(config), format = ?config.format, "Logging initialized");
            true
        }
        Err(_) => false,
    }
}

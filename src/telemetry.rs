use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;

/// Install the global subscriber. `RUST_LOG` in the environment wins over
/// the configured directive.
pub fn init_telemetry(config: &LogConfig) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config)))
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Crate-scoped filter built from the configured level
fn default_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::try_new(format!("arena_streams={}", config.rust_log))
        .unwrap_or_else(|_| EnvFilter::new("arena_streams=info"))
}

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AppConfig, Env};

pub const DEFAULT_LOG_FILTER: &str = "lavlus_shell=debug,reqwest=info";

/// init
///
/// Installs the global tracing subscriber. `RUST_LOG` wins over the default filter.
/// Local runs get human-readable output, production emits JSON lines for the log
/// aggregator. Calling it twice is harmless: the second call is ignored.
pub fn init(config: &AppConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let result = match config.env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

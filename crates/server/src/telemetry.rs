//! Tracing subscriber setup.
//!
//! Stdout carries the plugin protocol, so every layer writes to stderr.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LoggingConfig;
use crate::error::ServerError;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `config.level`.
///
/// # Errors
///
/// Returns [`ServerError::Config`] if the level is not a valid filter or a
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), ServerError> {
    let env_filter = filter(config)?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if config.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    installed.map_err(|e| ServerError::Config(e.to_string()))
}

fn filter(config: &LoggingConfig) -> Result<EnvFilter, ServerError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ServerError::Config(format!("invalid log level '{}': {e}", config.level)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_is_a_valid_filter() {
        let config = LoggingConfig {
            level: "tfredis_provider=debug,warn".to_owned(),
            json: false,
        };
        assert!(filter(&config).is_ok());
    }
}

//! Wiring for the `terraform-provider-redis` binary: file configuration,
//! logging and the stdio serve loop.

pub mod config;
pub mod error;
pub mod telemetry;

use std::sync::Arc;

use tfredis_plugin::Provider;
use tfredis_provider::ProviderConfig;
use tracing::info;

use crate::config::ServeConfig;
use crate::error::ServerError;

/// Build the Redis provider with the pool and deadline settings from
/// `config`.
pub fn build_provider(config: &ServeConfig) -> Provider<ProviderConfig> {
    tfredis_provider::provider_with(config.redis.to_redis_config())
        .with_operation_timeout(config.plugin.operation_timeout())
}

/// Serve the provider on stdin/stdout until the host stops it.
///
/// # Errors
///
/// Returns [`ServerError::Plugin`] if the serve loop fails.
pub async fn run(config: &ServeConfig) -> Result<(), ServerError> {
    let provider = build_provider(config);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        operation_timeout = ?provider.operation_timeout(),
        "serving redis provider"
    );
    tfredis_plugin::serve(Arc::new(provider)).await?;
    info!("plugin stopped");
    Ok(())
}

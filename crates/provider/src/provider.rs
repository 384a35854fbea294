use std::sync::Arc;

use tfredis_plugin::{Attribute, Diagnostics, Provider, ResourceData, Schema};
use tfredis_store::{KvStore, RedisConfig};

use crate::attrs;
use crate::config::ProviderConfig;
use crate::data_key::{DATA_SOURCE_KEY, RedisKeyDataSource};
use crate::resource_string::{RESOURCE_STRING, RedisStringResource};

pub const REDIS_URL: &str = "redis_url";

/// Provider-level settings.
pub fn schema() -> Schema {
    Schema::new().with_attribute(
        REDIS_URL,
        Attribute::required_string()
            .with_description("Redis server URL, e.g. redis://localhost:6379/0"),
    )
}

/// The Redis provider with default pool tuning.
pub fn provider() -> Provider<ProviderConfig> {
    provider_with(RedisConfig::default())
}

/// The Redis provider. `redis` tunes the connection pool; the server URL
/// always comes from the `redis_url` setting.
pub fn provider_with(redis: RedisConfig) -> Provider<ProviderConfig> {
    register(move |config: ResourceData| {
        let redis = redis.clone();
        async move {
            let url = attrs::required_str(&config, REDIS_URL).map_err(Diagnostics::from)?;
            ProviderConfig::connect(url, &redis)
                .await
                .map_err(Diagnostics::from)
        }
    })
}

/// The Redis provider over an already constructed store. `redis_url` is
/// still required but only the store's liveness is checked.
pub fn provider_with_store(store: Arc<dyn KvStore>) -> Provider<ProviderConfig> {
    register(move |_config: ResourceData| {
        let store = Arc::clone(&store);
        async move {
            ProviderConfig::verified(store)
                .await
                .map_err(Diagnostics::from)
        }
    })
}

fn register<F, Fut>(configure: F) -> Provider<ProviderConfig>
where
    F: Fn(ResourceData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ProviderConfig, Diagnostics>> + Send + 'static,
{
    Provider::new(schema(), configure)
        .with_resource(RESOURCE_STRING, RedisStringResource)
        .with_data_source(DATA_SOURCE_KEY, RedisKeyDataSource)
}

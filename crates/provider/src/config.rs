use std::sync::Arc;

use tfredis_store::{KvStore, RedisConfig, RedisKvStore, StoreError};
use tracing::info;

use crate::error::ProviderError;

/// The configured provider: a shared, read-only handle to the key-value
/// store, handed to every resource and data source invocation.
#[derive(Clone)]
pub struct ProviderConfig {
    store: Arc<dyn KvStore>,
}

impl ProviderConfig {
    /// Wrap an existing store without checking it.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn KvStore {
        self.store.as_ref()
    }

    /// Parse `url`, build a pooled Redis client and verify it with one PING.
    ///
    /// Pool tuning comes from `redis`; its `url` field is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the URL does not parse or
    /// the server does not answer.
    pub async fn connect(url: &str, redis: &RedisConfig) -> Result<Self, ProviderError> {
        let config = RedisConfig {
            url: url.to_owned(),
            ..redis.clone()
        };
        let store = RedisKvStore::new(&config).map_err(|e| match e {
            StoreError::InvalidUrl(msg) => {
                ProviderError::Configuration(format!("Failed to parse redis_url: {msg}"))
            }
            other => connect_failed(&other),
        })?;
        Self::verified(Arc::new(store)).await
    }

    /// Wrap `store` after a successful liveness check.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] if the PING fails.
    pub async fn verified(store: Arc<dyn KvStore>) -> Result<Self, ProviderError> {
        store.ping().await.map_err(|e| connect_failed(&e))?;
        info!("redis connection verified");
        Ok(Self::new(store))
    }
}

fn connect_failed(err: &StoreError) -> ProviderError {
    ProviderError::Configuration(format!("Failed to connect to Redis: {err}"))
}

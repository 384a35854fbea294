use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::{AsyncCommands, IntoConnectionInfo};
use tracing::debug;

use crate::config::RedisConfig;
use crate::error::StoreError;
use crate::store::KvStore;

/// Redis-backed implementation of [`KvStore`].
///
/// Uses a `deadpool-redis` connection pool. Values are plain Redis strings
/// written without expiry.
pub struct RedisKvStore {
    pool: Pool,
}

impl RedisKvStore {
    /// Create a new `RedisKvStore` from the provided configuration.
    ///
    /// No connection is opened here; call [`KvStore::ping`] to verify the
    /// server is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidUrl`] if the URL does not parse and
    /// [`StoreError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StoreError> {
        config
            .url
            .as_str()
            .into_connection_info()
            .map_err(|e| StoreError::InvalidUrl(e.to_string()))?;

        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .create_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        debug!(pool_size = config.pool_size, "redis pool created");
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))
    }
}

#[async_trait]
impl KvStore for RedisKvStore {
    async fn exists(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let count: u64 = conn
            .exists(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(count)
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        let val: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(val)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let () = conn
            .set(key, value)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn
            .del(key)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}

use std::time::Duration;

use serde::Deserialize;
use tfredis_store::RedisConfig;

/// Connection pool tuning for the Redis backend.
#[derive(Debug, Deserialize)]
pub struct RedisPoolConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
    /// Timeout for opening or acquiring a pooled connection.
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
}

impl RedisPoolConfig {
    /// Pool settings for the store; the URL is filled in at configure time.
    pub fn to_redis_config(&self) -> RedisConfig {
        RedisConfig {
            pool_size: self.pool_size,
            connection_timeout: Duration::from_secs(self.connection_timeout_seconds),
            ..RedisConfig::default()
        }
    }
}

impl Default for RedisPoolConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            connection_timeout_seconds: default_connection_timeout(),
        }
    }
}

fn default_pool_size() -> usize {
    10
}

fn default_connection_timeout() -> u64 {
    5
}

use async_trait::async_trait;

use crate::error::StoreError;

/// A string key-value store.
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
/// None of the methods apply their own deadline; callers wrap them in
/// `tokio::time::timeout` when they need one.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Number of the given key that exist (0 or 1).
    async fn exists(&self, key: &str) -> Result<u64, StoreError>;

    /// Get the value for a key. Returns `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Set a value with no expiry, overwriting any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a key. Returns the number of keys removed.
    async fn delete(&self, key: &str) -> Result<u64, StoreError>;

    /// Liveness check against the backend.
    async fn ping(&self) -> Result<(), StoreError>;
}

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::StoreError;
use crate::store::KvStore;

/// In-memory [`KvStore`] backed by a [`DashMap`].
///
/// Fully synchronous internally; the async trait methods return
/// immediately. Used for tests and local runs without a Redis server.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: DashMap<String, String>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with the given entries.
    pub fn seeded<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn exists(&self, key: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.data.contains_key(key)))
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.data.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        Ok(u64::from(self.data.remove(key).is_some()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

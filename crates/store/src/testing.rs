//! Test doubles and a conformance suite for [`KvStore`] implementations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::memory::MemoryKvStore;
use crate::store::KvStore;

/// Run the full store conformance test suite.
///
/// Every key used is namespaced under `prefix` and removed again, so the
/// suite can run against a shared Redis instance.
///
/// # Errors
///
/// Returns an error if the backend fails a call.
pub async fn run_store_conformance_tests(
    store: &dyn KvStore,
    prefix: &str,
) -> Result<(), StoreError> {
    test_get_missing(store, prefix).await?;
    test_set_and_get(store, prefix).await?;
    test_set_overwrites(store, prefix).await?;
    test_exists(store, prefix).await?;
    test_delete(store, prefix).await?;
    store.ping().await?;
    Ok(())
}

async fn test_get_missing(store: &dyn KvStore, prefix: &str) -> Result<(), StoreError> {
    let key = format!("{prefix}:missing");
    store.delete(&key).await?;
    let val = store.get(&key).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_set_and_get(store: &dyn KvStore, prefix: &str) -> Result<(), StoreError> {
    let key = format!("{prefix}:set-get");
    store.set(&key, "hello").await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("hello"));
    store.delete(&key).await?;
    Ok(())
}

async fn test_set_overwrites(store: &dyn KvStore, prefix: &str) -> Result<(), StoreError> {
    let key = format!("{prefix}:overwrite");
    store.set(&key, "v1").await?;
    store.set(&key, "v2").await?;
    let val = store.get(&key).await?;
    assert_eq!(val.as_deref(), Some("v2"), "set should overwrite");
    store.delete(&key).await?;
    Ok(())
}

async fn test_exists(store: &dyn KvStore, prefix: &str) -> Result<(), StoreError> {
    let key = format!("{prefix}:exists");
    store.delete(&key).await?;
    assert_eq!(store.exists(&key).await?, 0);
    store.set(&key, "").await?;
    assert_eq!(store.exists(&key).await?, 1, "empty values still exist");
    store.delete(&key).await?;
    Ok(())
}

async fn test_delete(store: &dyn KvStore, prefix: &str) -> Result<(), StoreError> {
    let key = format!("{prefix}:to-delete");
    store.set(&key, "bye").await?;
    assert_eq!(store.delete(&key).await?, 1);
    assert!(store.get(&key).await?.is_none(), "get after delete should return None");
    assert_eq!(store.delete(&key).await?, 0, "delete on missing key removes nothing");
    Ok(())
}

/// A store whose calls fail, optionally only for the first N calls.
///
/// Once the failure budget set by [`FailingStore::fail_until`] is spent,
/// calls are served by an inner [`MemoryKvStore`]. Every call, failed or
/// not, is counted.
#[derive(Debug)]
pub struct FailingStore {
    error: StoreError,
    inner: MemoryKvStore,
    call_count: AtomicUsize,
    fail_until: Option<usize>,
    delay: Option<Duration>,
}

impl FailingStore {
    pub fn new(error: StoreError) -> Self {
        Self {
            error,
            inner: MemoryKvStore::new(),
            call_count: AtomicUsize::new(0),
            fail_until: None,
            delay: None,
        }
    }

    /// Fail every call with a backend error carrying `message`.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(StoreError::Backend(message.into()))
    }

    /// Fail every call with a connection error carrying `message`.
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::new(StoreError::Connection(message.into()))
    }

    /// Fail only until N calls have been made, then succeed afterwards.
    #[must_use]
    pub fn fail_until(mut self, n: usize) -> Self {
        self.fail_until = Some(n);
        self
    }

    /// Sleep for `delay` at the start of every call.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Entries served once the failure budget is spent.
    #[must_use]
    pub fn with_inner(mut self, inner: MemoryKvStore) -> Self {
        self.inner = inner;
        self
    }

    /// Get the number of calls made to this store.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Count the call, wait out the delay and decide whether it fails.
    async fn enter(&self) -> Result<(), StoreError> {
        let call_number = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.fail_until {
            Some(fail_until) if call_number > fail_until => Ok(()),
            _ => Err(self.error.clone()),
        }
    }
}

#[async_trait]
impl KvStore for FailingStore {
    async fn exists(&self, key: &str) -> Result<u64, StoreError> {
        self.enter().await?;
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.enter().await?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.enter().await?;
        self.inner.set(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<u64, StoreError> {
        self.enter().await?;
        self.inner.delete(key).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.enter().await
    }
}

//! The `redis_key` data source: a read-only lookup of one Redis string key,
//! retried on transient failures.

use std::time::Duration;

use tfredis_plugin::{Attribute, AttributeType, DataSource, Diagnostics, ResourceData, Schema};
use tfredis_store::KvStore;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::attrs;
use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub const DATA_SOURCE_KEY: &str = "redis_key";

/// Pause between failed GET attempts.
pub const RETRY_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 3;
pub const DEFAULT_MAX_RETRIES: u64 = 10;

const KEY: &str = "key";
const VALUE: &str = "value";
const TIMEOUT: &str = "timeout";
const MAX_RETRIES: &str = "max_retries";

pub fn schema() -> Schema {
    Schema::new()
        .with_attribute(
            KEY,
            Attribute::required_string().with_description("The Redis key to read."),
        )
        .with_attribute(
            VALUE,
            Attribute::computed(AttributeType::String)
                .with_description("The value stored at the Redis key."),
        )
        .with_attribute(
            TIMEOUT,
            Attribute::optional(AttributeType::Int)
                .with_default(DEFAULT_TIMEOUT_SECONDS)
                .with_description("Timeout for the Redis GET operation in seconds."),
        )
        .with_attribute(
            MAX_RETRIES,
            Attribute::optional(AttributeType::Int)
                .with_default(DEFAULT_MAX_RETRIES)
                .with_description("Maximum number of retries for Redis GET operation."),
        )
}

/// Look up `key` with retries. An absent key clears the identity.
#[instrument(skip_all, fields(key))]
pub async fn read(store: &dyn KvStore, data: &mut ResourceData) -> Result<(), ProviderError> {
    let key = attrs::required_key(data, KEY)?.to_owned();
    let timeout = Duration::from_secs(attrs::positive_int(data, TIMEOUT, DEFAULT_TIMEOUT_SECONDS)?);
    let max_retries = attrs::positive_int(data, MAX_RETRIES, DEFAULT_MAX_RETRIES)?;
    tracing::Span::current().record("key", key.as_str());

    match get_with_retry(store, &key, timeout, max_retries).await? {
        Some(value) => {
            data.set_id(key.clone());
            data.set(KEY, key);
            data.set(VALUE, value);
        }
        None => {
            debug!("key not found");
            data.clear_id();
        }
    }
    Ok(())
}

/// GET `key`, retrying failed attempts.
///
/// Makes at most `max_retries` attempts, all inside one deadline of
/// `timeout` from the call. Success and absence both end the loop at once.
/// Any other failure waits [`RETRY_DELAY`] and tries again, unless the
/// attempts are used up or the deadline has passed, in which case the last
/// error is returned. A GET still running at the deadline fails with
/// [`ProviderError::Timeout`]. A `timeout` too large to represent as an
/// instant leaves the loop bounded by attempts alone.
pub async fn get_with_retry(
    store: &dyn KvStore,
    key: &str,
    timeout: Duration,
    max_retries: u64,
) -> Result<Option<String>, ProviderError> {
    let deadline = Instant::now().checked_add(timeout);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, store.get(key)).await,
            None => Ok(store.get(key).await),
        };
        let error = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => ProviderError::Store(e),
            Err(_) => ProviderError::Timeout(timeout),
        };

        let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if attempt >= max_retries || expired {
            warn!(attempt, max_retries, error = %error, "giving up on GET");
            return Err(error);
        }

        debug!(attempt, max_retries, error = %error, "GET failed, retrying");
        tokio::time::sleep(RETRY_DELAY).await;
    }
}

/// Handler registered under [`DATA_SOURCE_KEY`].
pub struct RedisKeyDataSource;

impl DataSource<ProviderConfig> for RedisKeyDataSource {
    fn schema(&self) -> Schema {
        schema()
    }

    async fn read(&self, meta: &ProviderConfig, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Ok(read(meta.store(), data).await?)
    }
}

#[cfg(test)]
mod tests {
    use tfredis_store::testing::FailingStore;
    use tfredis_store::{MemoryKvStore, StoreError};

    use super::*;

    fn lookup(key: &str, timeout: i64, max_retries: i64) -> ResourceData {
        let mut data = ResourceData::new();
        data.set(KEY, key);
        data.set(TIMEOUT, timeout);
        data.set(MAX_RETRIES, max_retries);
        data
    }

    #[tokio::test]
    async fn present_key_sets_identity_and_value() {
        let store = MemoryKvStore::seeded([("k", "v")]);
        let mut data = lookup("k", 3, 10);
        read(&store, &mut data).await.unwrap();

        assert_eq!(data.id(), Some("k"));
        assert_eq!(data.get_str(VALUE), Some("v"));
    }

    #[tokio::test]
    async fn absent_key_clears_identity_without_error() {
        let store = MemoryKvStore::new();
        let mut data = lookup("k", 3, 10);
        read(&store, &mut data).await.unwrap();
        assert!(!data.is_present());
        assert!(store.is_empty(), "lookups never write");
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let store = FailingStore::connection_error("connection reset")
            .fail_until(3)
            .with_inner(MemoryKvStore::seeded([("k", "v")]));
        let mut data = lookup("k", 3, 10);
        read(&store, &mut data).await.unwrap();

        assert_eq!(data.get_str(VALUE), Some("v"));
        assert_eq!(store.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_budget_bounds_the_loop() {
        let store = FailingStore::backend("boom");
        let start = Instant::now();
        let err = get_with_retry(&store, "k", Duration::from_secs(30), 10)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "backend error: boom");
        assert_eq!(store.call_count(), 10);
        assert_eq!(start.elapsed(), RETRY_DELAY * 9);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_bounds_the_loop() {
        let store = FailingStore::backend("boom");
        let start = Instant::now();
        let err = get_with_retry(&store, "k", Duration::from_secs(3), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Store(StoreError::Backend(_))));
        assert!(store.call_count() < 10, "calls: {}", store.call_count());
        assert!(start.elapsed() <= Duration::from_secs(3) + RETRY_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_get_is_cut_off_by_the_deadline() {
        let store = FailingStore::backend("unused")
            .fail_until(0)
            .with_delay(Duration::from_secs(60));
        let err = get_with_retry(&store, "k", Duration::from_secs(3), 10)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(d) if d == Duration::from_secs(3)));
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn huge_timeout_is_bounded_by_attempts() {
        let store = MemoryKvStore::seeded([("k", "v")]);
        let value = get_with_retry(&store, "k", Duration::from_secs(u64::MAX), 1)
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("v"));

        let mut data = lookup("k", 3, 10);
        data.set(TIMEOUT, u64::MAX);
        read(&store, &mut data).await.unwrap();
        assert_eq!(data.get_str(VALUE), Some("v"));
    }

    #[tokio::test(start_paused = true)]
    async fn huge_timeout_still_gives_up_after_the_attempts() {
        let store = FailingStore::backend("MASTERDOWN");
        let err = get_with_retry(&store, "k", Duration::from_secs(u64::MAX), 3)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "backend error: MASTERDOWN");
        assert_eq!(store.call_count(), 3);
    }

    #[tokio::test]
    async fn single_attempt_does_not_sleep() {
        let store = FailingStore::backend("boom");
        let err = get_with_retry(&store, "k", Duration::from_secs(3), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Store(_)));
        assert_eq!(store.call_count(), 1);
    }

    #[tokio::test]
    async fn bounds_below_one_are_rejected() {
        let store = MemoryKvStore::seeded([("k", "v")]);

        let err = read(&store, &mut lookup("k", 0, 10)).await.unwrap_err();
        assert_eq!(err.to_string(), "timeout: must be at least 1");

        let err = read(&store, &mut lookup("k", 3, 0)).await.unwrap_err();
        assert_eq!(err.to_string(), "max_retries: must be at least 1");
    }

    #[test]
    fn defaults_match_the_schema() {
        let schema = schema();
        assert_eq!(
            schema.attribute(TIMEOUT).unwrap().default,
            Some(DEFAULT_TIMEOUT_SECONDS.into())
        );
        assert_eq!(
            schema.attribute(MAX_RETRIES).unwrap().default,
            Some(DEFAULT_MAX_RETRIES.into())
        );
        assert!(schema.attribute(VALUE).unwrap().computed);
    }
}

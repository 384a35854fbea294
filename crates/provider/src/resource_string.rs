//! The `redis_string` managed resource: one Redis string key and its value.
//!
//! The tracked identity is the key itself. A key missing from Redis is the
//! same as the resource missing from state.

use tfredis_plugin::{Attribute, AttributeType, Diagnostics, Resource, ResourceData, Schema};
use tfredis_store::KvStore;
use tracing::{debug, info, instrument};

use crate::attrs;
use crate::config::ProviderConfig;
use crate::error::ProviderError;

pub const RESOURCE_STRING: &str = "redis_string";

const KEY: &str = "key";
const VALUE: &str = "value";
const OVERRIDABLE: &str = "overridable";

pub fn schema() -> Schema {
    Schema::new()
        .with_attribute(
            KEY,
            Attribute::required_string()
                .force_new()
                .with_description("The Redis key."),
        )
        .with_attribute(
            VALUE,
            Attribute::required_string().with_description("The value to store at the Redis key."),
        )
        .with_attribute(
            OVERRIDABLE,
            Attribute::optional(AttributeType::Bool)
                .with_default(false)
                .with_description(
                    "If true, allows overriding existing Redis keys. If false, creation will fail if the key already exists.",
                ),
        )
}

/// EXISTS, then SET without expiry, then refresh.
///
/// The existence check and the write are separate round trips, so a key
/// created by another writer in between is overwritten.
#[instrument(skip_all, fields(key))]
pub async fn create(store: &dyn KvStore, data: &mut ResourceData) -> Result<(), ProviderError> {
    let key = attrs::required_key(data, KEY)?.to_owned();
    let value = attrs::required_str(data, VALUE)?.to_owned();
    let overridable = data.get_bool(OVERRIDABLE).unwrap_or(false);
    tracing::Span::current().record("key", key.as_str());

    if store.exists(&key).await? > 0 {
        if !overridable {
            return Err(ProviderError::AlreadyExists { key });
        }
        debug!("overriding existing key");
    }

    store.set(&key, &value).await?;
    info!("key created");
    data.set_id(key);
    read(store, data).await
}

/// GET the tracked key. An absent key clears the identity.
#[instrument(skip_all, fields(key = data.id()))]
pub async fn read(store: &dyn KvStore, data: &mut ResourceData) -> Result<(), ProviderError> {
    let Some(key) = data.id().map(str::to_owned) else {
        return Ok(());
    };

    match store.get(&key).await? {
        Some(value) => {
            data.set(KEY, key);
            data.set(VALUE, value);
        }
        None => {
            debug!("key no longer exists");
            data.clear_id();
        }
    }
    Ok(())
}

/// SET unconditionally, then refresh.
#[instrument(skip_all, fields(key = data.id()))]
pub async fn update(store: &dyn KvStore, data: &mut ResourceData) -> Result<(), ProviderError> {
    let key = attrs::required_key(data, KEY)?.to_owned();
    let value = attrs::required_str(data, VALUE)?.to_owned();

    store.set(&key, &value).await?;
    debug!("key updated");
    data.set_id(key);
    read(store, data).await
}

#[instrument(skip_all, fields(key = data.id()))]
pub async fn delete(store: &dyn KvStore, data: &mut ResourceData) -> Result<(), ProviderError> {
    if let Some(key) = data.id() {
        let removed = store.delete(key).await?;
        debug!(removed, "key deleted");
    }
    data.clear_id();
    Ok(())
}

/// Adopt an existing key. Unlike [`read`], a missing key is an error.
#[instrument(skip_all, fields(key = data.id()))]
pub async fn import(
    store: &dyn KvStore,
    mut data: ResourceData,
) -> Result<Vec<ResourceData>, ProviderError> {
    let key = data
        .id()
        .map(str::to_owned)
        .ok_or_else(|| ProviderError::invalid_input(KEY, "import id must not be empty"))?;

    let value = store
        .get(&key)
        .await?
        .ok_or_else(|| ProviderError::NotFound { key: key.clone() })?;

    data.set(KEY, key);
    data.set(VALUE, value);
    info!("key imported");
    Ok(vec![data])
}

/// Handler registered under [`RESOURCE_STRING`].
pub struct RedisStringResource;

impl Resource<ProviderConfig> for RedisStringResource {
    fn schema(&self) -> Schema {
        schema()
    }

    async fn create(
        &self,
        meta: &ProviderConfig,
        data: &mut ResourceData,
    ) -> Result<(), Diagnostics> {
        Ok(create(meta.store(), data).await?)
    }

    async fn read(&self, meta: &ProviderConfig, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Ok(read(meta.store(), data).await?)
    }

    async fn update(
        &self,
        meta: &ProviderConfig,
        data: &mut ResourceData,
    ) -> Result<(), Diagnostics> {
        Ok(update(meta.store(), data).await?)
    }

    async fn delete(
        &self,
        meta: &ProviderConfig,
        data: &mut ResourceData,
    ) -> Result<(), Diagnostics> {
        Ok(delete(meta.store(), data).await?)
    }

    async fn import(
        &self,
        meta: &ProviderConfig,
        data: ResourceData,
    ) -> Result<Vec<ResourceData>, Diagnostics> {
        Ok(import(meta.store(), data).await?)
    }
}

#[cfg(test)]
mod tests {
    use tfredis_store::MemoryKvStore;
    use tfredis_store::testing::FailingStore;

    use super::*;

    fn planned(key: &str, value: &str, overridable: bool) -> ResourceData {
        let mut data = ResourceData::new();
        data.set(KEY, key);
        data.set(VALUE, value);
        data.set(OVERRIDABLE, overridable);
        data
    }

    #[tokio::test]
    async fn create_on_absent_key() {
        let store = MemoryKvStore::new();
        let mut data = planned("a", "1", false);
        create(&store, &mut data).await.unwrap();

        assert_eq!(data.id(), Some("a"));
        assert_eq!(data.get_str(VALUE), Some("1"));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn create_conflict_leaves_value_untouched() {
        let store = MemoryKvStore::seeded([("a", "old")]);
        let mut data = planned("a", "new", false);
        let err = create(&store, &mut data).await.unwrap_err();

        assert!(matches!(err, ProviderError::AlreadyExists { ref key } if key == "a"));
        assert!(!data.is_present());
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn create_overrides_when_allowed() {
        let store = MemoryKvStore::seeded([("a", "old")]);
        let mut data = planned("a", "new", true);
        create(&store, &mut data).await.unwrap();

        assert_eq!(data.get_str(VALUE), Some("new"));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn create_rejects_empty_key() {
        let store = MemoryKvStore::new();
        let mut data = planned("", "v", false);
        let err = create(&store, &mut data).await.unwrap_err();
        assert!(matches!(err, ProviderError::InvalidInput { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn read_absent_key_clears_identity() {
        let store = MemoryKvStore::new();
        let mut data = ResourceData::with_id("gone");
        read(&store, &mut data).await.unwrap();
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn read_surfaces_backend_errors() {
        let store = FailingStore::backend("LOADING dataset in memory");
        let mut data = ResourceData::with_id("a");
        let err = read(&store, &mut data).await.unwrap_err();
        assert_eq!(err.to_string(), "backend error: LOADING dataset in memory");
        assert!(data.is_present(), "failed reads keep the identity");
    }

    #[tokio::test]
    async fn update_skips_the_existence_check() {
        let store = MemoryKvStore::seeded([("a", "1")]);
        let mut data = planned("a", "2", false);
        data.set_id("a");
        update(&store, &mut data).await.unwrap();
        assert_eq!(data.get_str(VALUE), Some("2"));
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryKvStore::seeded([("a", "1")]);
        let mut data = ResourceData::with_id("a");
        delete(&store, &mut data).await.unwrap();
        assert!(!data.is_present());
        assert!(store.is_empty());

        let mut data = ResourceData::with_id("a");
        delete(&store, &mut data).await.unwrap();
        assert!(!data.is_present());
    }

    #[tokio::test]
    async fn import_existing_key() {
        let store = MemoryKvStore::seeded([("a", "1")]);
        let imported = import(&store, schema().new_tracked("a")).await.unwrap();

        assert_eq!(imported.len(), 1);
        let data = &imported[0];
        assert_eq!(data.id(), Some("a"));
        assert_eq!(data.get_str(KEY), Some("a"));
        assert_eq!(data.get_str(VALUE), Some("1"));
        assert_eq!(data.get_bool(OVERRIDABLE), Some(false));
    }

    #[tokio::test]
    async fn import_missing_key_names_it() {
        let store = MemoryKvStore::new();
        let err = import(&store, ResourceData::with_id("nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "redis key 'nope' not found");
    }

    #[tokio::test]
    async fn import_passes_backend_errors_through() {
        let store = FailingStore::connection_error("broken pipe");
        let err = import(&store, ResourceData::with_id("a"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection error: broken pipe");
    }

    #[test]
    fn key_forces_replacement() {
        let schema = schema();
        assert!(schema.attribute(KEY).unwrap().force_new);
        assert!(!schema.attribute(VALUE).unwrap().force_new);
        assert_eq!(
            schema.attribute(OVERRIDABLE).unwrap().default,
            Some(false.into())
        );
    }
}

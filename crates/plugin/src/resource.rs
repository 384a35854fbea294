use std::future::Future;

use async_trait::async_trait;

use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::schema::Schema;

/// Lifecycle handler for one managed resource type.
///
/// `M` is the configured provider value handed to every invocation. The
/// trait uses native `async fn` and is therefore not object-safe; the
/// dispatch table stores [`DynResource`] instead, which every `Resource`
/// implements through a blanket implementation.
pub trait Resource<M: Send + Sync>: Send + Sync {
    /// Attribute declarations for this resource type.
    fn schema(&self) -> Schema;

    /// Create the instance described by `data`. On success the handler must
    /// set the tracked identity.
    fn create(
        &self,
        meta: &M,
        data: &mut ResourceData,
    ) -> impl Future<Output = Result<(), Diagnostics>> + Send;

    /// Refresh `data` from the backend. Clearing the identity reports that
    /// the instance no longer exists.
    fn read(
        &self,
        meta: &M,
        data: &mut ResourceData,
    ) -> impl Future<Output = Result<(), Diagnostics>> + Send;

    /// Apply the planned values in `data` to an existing instance.
    fn update(
        &self,
        meta: &M,
        data: &mut ResourceData,
    ) -> impl Future<Output = Result<(), Diagnostics>> + Send;

    /// Destroy the instance.
    fn delete(
        &self,
        meta: &M,
        data: &mut ResourceData,
    ) -> impl Future<Output = Result<(), Diagnostics>> + Send;

    /// Adopt an existing backend object whose identity is `data.id()`.
    ///
    /// Defaults to rejecting the import.
    fn import(
        &self,
        _meta: &M,
        _data: ResourceData,
    ) -> impl Future<Output = Result<Vec<ResourceData>, Diagnostics>> + Send {
        std::future::ready(Err(Diagnostics::error(
            "resource does not support import",
        )))
    }
}

/// Read-only handler for one data source type.
pub trait DataSource<M: Send + Sync>: Send + Sync {
    fn schema(&self) -> Schema;

    /// Look up the object described by `data`. Clearing the identity reports
    /// that nothing was found.
    fn read(
        &self,
        meta: &M,
        data: &mut ResourceData,
    ) -> impl Future<Output = Result<(), Diagnostics>> + Send;
}

/// Object-safe counterpart of [`Resource`] for use behind `Arc<dyn _>`.
///
/// Implement [`Resource`] and rely on the blanket implementation rather than
/// implementing this trait directly.
#[async_trait]
pub trait DynResource<M: Send + Sync>: Send + Sync {
    fn schema(&self) -> Schema;

    async fn create(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics>;

    async fn read(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics>;

    async fn update(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics>;

    async fn delete(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics>;

    async fn import(&self, meta: &M, data: ResourceData)
    -> Result<Vec<ResourceData>, Diagnostics>;
}

#[async_trait]
impl<M, T> DynResource<M> for T
where
    M: Send + Sync,
    T: Resource<M> + Sync,
{
    fn schema(&self) -> Schema {
        Resource::schema(self)
    }

    async fn create(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Resource::create(self, meta, data).await
    }

    async fn read(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Resource::read(self, meta, data).await
    }

    async fn update(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Resource::update(self, meta, data).await
    }

    async fn delete(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics> {
        Resource::delete(self, meta, data).await
    }

    async fn import(
        &self,
        meta: &M,
        data: ResourceData,
    ) -> Result<Vec<ResourceData>, Diagnostics> {
        Resource::import(self, meta, data).await
    }
}

/// Object-safe counterpart of [`DataSource`].
#[async_trait]
pub trait DynDataSource<M: Send + Sync>: Send + Sync {
    fn schema(&self) -> Schema;

    async fn read(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics>;
}

#[async_trait]
impl<M, T> DynDataSource<M> for T
where
    M: Send + Sync,
    T: DataSource<M> + Sync,
{
    fn schema(&self) -> Schema {
        DataSource::schema(self)
    }

    async fn read(&self, meta: &M, data: &mut ResourceData) -> Result<(), Diagnostics> {
        DataSource::read(self, meta, data).await
    }
}

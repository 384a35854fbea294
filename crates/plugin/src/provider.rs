use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument};

use crate::data::ResourceData;
use crate::diag::Diagnostics;
use crate::resource::{DynDataSource, DynResource};
use crate::schema::{ProviderSchema, Schema};

/// Default ambient deadline applied around every resource handler invocation.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

type ConfigureFn<M> =
    Box<dyn Fn(ResourceData) -> BoxFuture<'static, Result<M, Diagnostics>> + Send + Sync>;

/// The dispatch table of a provider: its own schema, the configure step that
/// produces the shared meta value, and the handlers keyed by type name.
///
/// Built once at startup and then shared; call [`Provider::configure`] to
/// obtain a [`ConfiguredProvider`] that can run operations.
pub struct Provider<M: Send + Sync> {
    schema: Schema,
    configure: ConfigureFn<M>,
    resources: HashMap<String, Arc<dyn DynResource<M>>>,
    data_sources: HashMap<String, Arc<dyn DynDataSource<M>>>,
    operation_timeout: Duration,
}

impl<M: Send + Sync + 'static> Provider<M> {
    /// Create a provider with the given configuration schema and configure
    /// function. The function receives the decoded provider configuration
    /// and returns the meta value shared by every handler invocation.
    pub fn new<F, Fut>(schema: Schema, configure: F) -> Self
    where
        F: Fn(ResourceData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M, Diagnostics>> + Send + 'static,
    {
        Self {
            schema,
            configure: Box::new(move |config| Box::pin(configure(config))),
            resources: HashMap::new(),
            data_sources: HashMap::new(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Register a resource type. An existing registration with the same name
    /// is replaced.
    #[must_use]
    pub fn with_resource(
        mut self,
        type_name: impl Into<String>,
        resource: impl DynResource<M> + 'static,
    ) -> Self {
        self.resources.insert(type_name.into(), Arc::new(resource));
        self
    }

    /// Register a data source type. An existing registration with the same
    /// name is replaced.
    #[must_use]
    pub fn with_data_source(
        mut self,
        type_name: impl Into<String>,
        data_source: impl DynDataSource<M> + 'static,
    ) -> Self {
        self.data_sources
            .insert(type_name.into(), Arc::new(data_source));
        self
    }

    #[must_use]
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub fn operation_timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Sorted names of the registered resource types.
    pub fn resource_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Sorted names of the registered data source types.
    pub fn data_source_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.data_sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The full schema surface reported to the host.
    pub fn schema(&self) -> ProviderSchema {
        ProviderSchema {
            provider: self.schema.clone(),
            resources: self
                .resources
                .iter()
                .map(|(name, r)| (name.clone(), r.schema()))
                .collect(),
            data_sources: self
                .data_sources
                .iter()
                .map(|(name, d)| (name.clone(), d.schema()))
                .collect(),
        }
    }

    fn resource(&self, type_name: &str) -> Result<Arc<dyn DynResource<M>>, Diagnostics> {
        self.resources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Diagnostics::error(format!("unknown resource type: {type_name}")))
    }

    fn data_source(&self, type_name: &str) -> Result<Arc<dyn DynDataSource<M>>, Diagnostics> {
        self.data_sources
            .get(type_name)
            .cloned()
            .ok_or_else(|| Diagnostics::error(format!("unknown data source type: {type_name}")))
    }

    /// Decode the provider configuration and run the configure function.
    ///
    /// No handler can be invoked until this succeeds.
    #[instrument(skip_all)]
    pub async fn configure(
        self: Arc<Self>,
        config: &Map<String, Value>,
    ) -> Result<ConfiguredProvider<M>, Diagnostics> {
        let data = self.schema.decode_config(config)?;
        let meta = (self.configure)(data).await?;
        info!(
            resources = ?self.resource_types(),
            data_sources = ?self.data_source_types(),
            "provider configured"
        );
        Ok(ConfiguredProvider {
            provider: self,
            meta: Arc::new(meta),
        })
    }
}

/// A provider together with its configured meta value.
///
/// Cheap to clone; clones share the same meta value, so independent
/// operations can run concurrently.
pub struct ConfiguredProvider<M: Send + Sync> {
    provider: Arc<Provider<M>>,
    meta: Arc<M>,
}

impl<M: Send + Sync> Clone for ConfiguredProvider<M> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            meta: Arc::clone(&self.meta),
        }
    }
}

impl<M: Send + Sync + 'static> ConfiguredProvider<M> {
    pub fn meta(&self) -> &M {
        &self.meta
    }

    pub fn provider(&self) -> &Provider<M> {
        &self.provider
    }

    /// Run a handler future under the ambient operation deadline.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, Diagnostics>>,
    ) -> Result<T, Diagnostics> {
        let timeout = self.provider.operation_timeout;
        tokio::time::timeout(timeout, operation)
            .await
            .map_err(|_| Diagnostics::error(format!("operation timed out after {timeout:?}")))?
    }

    /// Create a resource instance from user configuration.
    #[instrument(skip(self, config))]
    pub async fn create(
        &self,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> Result<ResourceData, Diagnostics> {
        let resource = self.provider.resource(type_name)?;
        let mut data = resource.schema().decode_config(config)?;
        self.bounded(resource.create(&self.meta, &mut data)).await?;
        Ok(data)
    }

    /// Refresh a resource instance from persisted state.
    #[instrument(skip(self, state))]
    pub async fn read(
        &self,
        type_name: &str,
        state: &Map<String, Value>,
    ) -> Result<ResourceData, Diagnostics> {
        let resource = self.provider.resource(type_name)?;
        let mut data = resource.schema().decode_state(state)?;
        self.bounded(resource.read(&self.meta, &mut data)).await?;
        Ok(data)
    }

    /// Move an instance from `prior` state to the `planned` configuration.
    ///
    /// A change to a force-new attribute replaces the instance: the prior
    /// instance is deleted and the planned one created.
    #[instrument(skip(self, prior, planned))]
    pub async fn update(
        &self,
        type_name: &str,
        prior: &Map<String, Value>,
        planned: &Map<String, Value>,
    ) -> Result<ResourceData, Diagnostics> {
        let resource = self.provider.resource(type_name)?;
        let schema = resource.schema();
        let mut prior = schema.decode_state(prior)?;
        let mut data = schema.decode_config(planned)?;

        if schema.requires_replacement(&prior, &data) {
            debug!("force-new attribute changed, replacing instance");
            self.bounded(resource.delete(&self.meta, &mut prior)).await?;
            self.bounded(resource.create(&self.meta, &mut data)).await?;
            return Ok(data);
        }

        if let Some(id) = prior.id() {
            data.set_id(id);
        }
        self.bounded(resource.update(&self.meta, &mut data)).await?;
        Ok(data)
    }

    /// Destroy a resource instance described by persisted state.
    #[instrument(skip(self, state))]
    pub async fn delete(
        &self,
        type_name: &str,
        state: &Map<String, Value>,
    ) -> Result<ResourceData, Diagnostics> {
        let resource = self.provider.resource(type_name)?;
        let mut data = resource.schema().decode_state(state)?;
        self.bounded(resource.delete(&self.meta, &mut data)).await?;
        Ok(data)
    }

    /// Import an existing backend object by its identity.
    #[instrument(skip(self))]
    pub async fn import(&self, type_name: &str, id: &str) -> Result<Vec<ResourceData>, Diagnostics> {
        if id.is_empty() {
            return Err(Diagnostics::error("import id must not be empty"));
        }
        let resource = self.provider.resource(type_name)?;
        let data = resource.schema().new_tracked(id);
        self.bounded(resource.import(&self.meta, data)).await
    }

    /// Run a data source lookup.
    ///
    /// Not wrapped in the operation deadline: data sources bound their own
    /// lookups, and an outer deadline would replace their error with a
    /// timeout.
    #[instrument(skip(self, config))]
    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: &Map<String, Value>,
    ) -> Result<ResourceData, Diagnostics> {
        let data_source = self.provider.data_source(type_name)?;
        let mut data = data_source.schema().decode_config(config)?;
        data_source.read(&self.meta, &mut data).await?;
        Ok(data)
    }
}

//! Terraform-style provider for Redis string keys.
//!
//! Exposes one managed resource, `redis_string`, and one data source,
//! `redis_key`, over a single provider setting, `redis_url`. Build the
//! dispatch table with [`provider`] and serve it with
//! [`tfredis_plugin::serve`].

mod attrs;
pub mod config;
pub mod data_key;
pub mod error;
pub mod provider;
pub mod resource_string;

pub use config::ProviderConfig;
pub use data_key::{DATA_SOURCE_KEY, RedisKeyDataSource};
pub use error::ProviderError;
pub use provider::{REDIS_URL, provider, provider_with, provider_with_store};
pub use resource_string::{RESOURCE_STRING, RedisStringResource};

//! Host-facing plugin surface for the Redis provider.
//!
//! A [`Provider`] is a dispatch table of [`Resource`] and [`DataSource`]
//! handlers plus a configure step. [`serve`] speaks the line-delimited JSON
//! protocol on stdio and routes each request to the matching handler.

pub mod data;
pub mod diag;
pub mod error;
pub mod protocol;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod server;

pub use data::{ID_ATTRIBUTE, ResourceData};
pub use diag::{Diagnostic, Diagnostics, Severity};
pub use error::PluginError;
pub use protocol::{Operation, Request, Response};
pub use provider::{ConfiguredProvider, DEFAULT_OPERATION_TIMEOUT, Provider};
pub use resource::{DataSource, DynDataSource, DynResource, Resource};
pub use schema::{Attribute, AttributeType, ProviderSchema, Schema};
pub use server::{serve, serve_io};

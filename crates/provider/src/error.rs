use std::time::Duration;

use tfredis_plugin::{Diagnostic, Diagnostics};
use tfredis_store::StoreError;
use thiserror::Error;

/// Errors produced by the Redis provider handlers.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider could not be configured. Fatal for the provider instance.
    #[error("{0}")]
    Configuration(String),

    /// Create found the key already present and overriding was not allowed.
    #[error(
        "redis key '{key}' already exists. Set overridable = true to allow overriding existing keys"
    )]
    AlreadyExists { key: String },

    /// Import found no value under the key.
    #[error("redis key '{key}' not found")]
    NotFound { key: String },

    /// The backend failed; its message is kept verbatim.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A deadline cut a store call short.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// An attribute is missing, mistyped or out of range.
    #[error("{attribute}: {message}")]
    InvalidInput { attribute: String, message: String },
}

impl ProviderError {
    pub(crate) fn invalid_input(attribute: &str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            attribute: attribute.to_owned(),
            message: message.into(),
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidInput { attribute, message } => {
                Diagnostic::error(message).with_attribute(attribute)
            }
            other => Diagnostic::error(other.to_string()),
        }
    }
}

impl From<ProviderError> for Diagnostics {
    fn from(err: ProviderError) -> Self {
        Diagnostic::from(err).into()
    }
}

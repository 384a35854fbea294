use thiserror::Error;

/// Errors that can occur when running the provider binary.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. reading the configuration file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The plugin serve loop failed.
    #[error("plugin error: {0}")]
    Plugin(#[from] tfredis_plugin::PluginError),
}

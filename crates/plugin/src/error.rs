use thiserror::Error;

/// Errors that stop the serve loop itself.
///
/// Handler failures never surface here; they travel back to the host as
/// diagnostics inside a response.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Reading requests or writing responses failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A response could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The response writer stopped before all responses were delivered.
    #[error("response channel closed")]
    Closed,

    /// A spawned operation task panicked or was cancelled.
    #[error("operation task failed: {0}")]
    Task(String),
}

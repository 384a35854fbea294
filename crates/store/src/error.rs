use thiserror::Error;

/// Errors from key-value store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The connection URL could not be parsed. Carries the parser's message
    /// verbatim.
    #[error("{0}")]
    InvalidUrl(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("backend error: {0}")]
    Backend(String),
}

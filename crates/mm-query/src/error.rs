//! Error types for the query layer.

use thiserror::Error;

/// Result type for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors that can occur while resolving windows or querying backends.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The duration expression does not match `<integer><unit>` with a
    /// positive integer and unit `d` or `h`.
    #[error("invalid duration expression '{expr}': expected <n>d or <n>h with n > 0")]
    InvalidDuration { expr: String },

    /// Bad caller input detected before any I/O (e.g. a non-positive limit).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The metrics backend rejected the request or was unreachable.
    #[error("metric query failed: {0}")]
    Metric(String),

    /// An instant query expected to yield a single scalar returned zero or
    /// multiple series.
    #[error("metric query '{query}' returned {count} series, expected exactly one")]
    ScalarShape { query: String, count: usize },

    /// The log backend rejected the request or was unreachable.
    #[error("log query failed: {0}")]
    Log(String),
}

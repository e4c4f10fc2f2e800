//! Error types for topology and trajectory loading.

/// Errors that can occur while loading or querying topology data.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    /// Filesystem I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse/deserialization error.
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Structural problem (duplicate ids, dangling edges, bad weights).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lookup of an id that does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Result alias for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

//! Error types for loopkit
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// Boxed error produced by a unit of work.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// All error types that can occur in loopkit
#[derive(Debug, Error)]
pub enum LoopError {
    /// A unit of work failed and the handle was told to propagate it
    #[error("Unit of work failed: {0}")]
    Work(#[source] BoxError),

    /// Configuration value rejected during validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for loopkit operations
pub type Result<T> = std::result::Result<T, LoopError>;

//! Error types for the subscription engine

use thiserror::Error;

/// Errors that can occur while managing a subscription
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid configuration provided
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Convenience type alias for Results with EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

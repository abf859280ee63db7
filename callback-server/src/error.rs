//! Error types for the callback server

use thiserror::Error;

/// Errors that can occur while running the callback server
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound
    #[error("failed to bind callback server: {0}")]
    Bind(String),
}

/// Errors raised by request brokers while serving a claimed route
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker error: {0}")]
    Internal(String),
}

/// Convenience type alias for Results with ServerError
pub type Result<T> = std::result::Result<T, ServerError>;

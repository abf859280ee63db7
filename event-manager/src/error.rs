//! Error types for the event handler

use thiserror::Error;

/// Errors that can occur in the event handler
#[derive(Debug, Error)]
pub enum EventError {
    /// The callback server could not be started
    #[error("callback server error")]
    Server(#[from] callback_server::ServerError),

    /// A notification body could not be decoded
    #[error("propertyset parse error: {0}")]
    Parse(String),

    /// Invalid configuration provided
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The handler has been stopped
    #[error("event handler is not running")]
    Stopped,
}

/// Convenience type alias for Results with EventError
pub type Result<T> = std::result::Result<T, EventError>;

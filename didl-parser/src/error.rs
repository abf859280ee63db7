//! Error types for DIDL-Lite parsing

use thiserror::Error;

/// Errors that can occur while decoding a DIDL-Lite document
#[derive(Debug, Error)]
pub enum DidlError {
    /// Malformed XML
    #[error("XML parsing error: {0}")]
    Xml(String),

    /// The document root is not `DIDL-Lite`
    #[error("unexpected root element: {0}")]
    UnexpectedRoot(String),
}

/// Convenience type alias for Results with DidlError
pub type Result<T> = std::result::Result<T, DidlError>;

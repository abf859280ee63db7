//! Error types for the SOAP client

use thiserror::Error;

/// Errors that can occur during SOAP/GENA communication
#[derive(Debug, Error)]
pub enum SoapError {
    /// Network or transport-level communication error
    #[error("network error: {0}")]
    Network(String),

    /// TLS configuration or handshake error
    #[error("TLS error: {0}")]
    Tls(String),

    /// Non-2xx HTTP status without a decodable SOAP fault body
    #[error("HTTP status {0}")]
    Http(u16),

    /// Malformed XML or unexpected envelope shape
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// GENA subscription rejected or missing the SID header
    #[error("subscription error: {0}")]
    Subscription(String),

    /// GENA renewal rejected with 412 Precondition Failed; the SID is stale
    /// and a fresh subscribe is required
    #[error("subscription precondition failed")]
    Precondition,
}

/// Convenience type alias for Results with SoapError
pub type Result<T> = std::result::Result<T, SoapError>;

//! Error types for ContentDirectory operations

use thiserror::Error;

/// Errors that can occur while talking to a ContentDirectory service
#[derive(Debug, Error)]
pub enum ContentError {
    /// The SOAP round-trip failed (network, HTTP or parse level). SOAP
    /// faults are not errors here: they come back as element lists.
    #[error("SOAP communication error: {0}")]
    Soap(#[from] soap_client::SoapError),
}

/// Convenience type alias for Results with ContentError
pub type Result<T> = std::result::Result<T, ContentError>;

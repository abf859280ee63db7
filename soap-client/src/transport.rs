//! HTTP transport configuration.
//!
//! One blocking agent is shared by all clients built from the same
//! configuration. HTTPS uses a `native-tls` connector: devices routinely
//! present self-signed certificates, so peer verification is off unless
//! explicitly enabled.

use std::sync::Arc;
use std::time::Duration;

use native_tls::{Protocol, TlsConnector};

use crate::error::SoapError;

/// Transport options for the SOAP/GENA client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// TCP connect timeout
    /// Default: 5 seconds
    pub connect_timeout: Duration,

    /// Socket read timeout
    /// Default: 10 seconds
    pub read_timeout: Duration,

    /// Number of attempts for a request that fails at the transport level
    /// Default: 1 (no retry)
    pub retry_attempts: u32,

    /// Verify the device certificate on HTTPS connections
    /// Default: false
    pub tls_verify_peer: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(10),
            retry_attempts: 1,
            tls_verify_peer: false,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_tls_verify_peer(mut self, verify: bool) -> Self {
        self.tls_verify_peer = verify;
        self
    }

    pub fn validate(&self) -> Result<(), SoapError> {
        if self.retry_attempts == 0 {
            return Err(SoapError::Network(
                "retry attempts must be at least 1".to_string(),
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(SoapError::Network(
                "read timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the shared blocking agent for this configuration.
    pub(crate) fn build_agent(&self) -> Result<ureq::Agent, SoapError> {
        self.validate()?;
        let mut tls = TlsConnector::builder();
        tls.min_protocol_version(Some(Protocol::Tlsv10));
        if !self.tls_verify_peer {
            tls.danger_accept_invalid_certs(true);
            tls.danger_accept_invalid_hostnames(true);
        }
        let connector = tls.build().map_err(|e| SoapError::Tls(e.to_string()))?;

        Ok(ureq::AgentBuilder::new()
            .timeout_connect(self.connect_timeout)
            .timeout_read(self.read_timeout)
            .tls_connector(Arc::new(connector))
            .build())
    }
}

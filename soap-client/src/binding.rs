//! Device endpoints and service bindings.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::SoapError;

/// URL scheme used to reach a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Network location of a device. Immutable for the lifetime of a binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub scheme: Scheme,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: Scheme::Http,
        }
    }

    pub fn https(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: Scheme::Https,
        }
    }

    /// Parse an endpoint from a device-advertised URL such as a discovery
    /// location (`http://192.168.1.100:1400/xml/device_description.xml`).
    pub fn parse(location: &str) -> Result<Self, SoapError> {
        let url = Url::parse(location).map_err(|e| SoapError::Parse(e.to_string()))?;
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(SoapError::Parse(format!("unsupported scheme: {other}"))),
        };
        let host = url
            .host_str()
            .ok_or_else(|| SoapError::Parse("no host in URL".to_string()))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SoapError::Parse("no port in URL".to_string()))?;
        Ok(Self { host, port, scheme })
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme.as_str(), self.host, self.port)
    }

    pub fn host_header(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One UPnP service on one device: endpoint plus the service's control,
/// event and description paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBinding {
    pub endpoint: Endpoint,
    pub control_path: String,
    pub event_path: String,
    pub scpd_path: String,
    pub service_type: String,
}

impl ServiceBinding {
    pub fn new(
        endpoint: Endpoint,
        control_path: impl Into<String>,
        event_path: impl Into<String>,
        scpd_path: impl Into<String>,
        service_type: impl Into<String>,
    ) -> Self {
        Self {
            endpoint,
            control_path: control_path.into(),
            event_path: event_path.into(),
            scpd_path: scpd_path.into(),
            service_type: service_type.into(),
        }
    }

    pub fn control_url(&self) -> String {
        format!("{}{}", self.endpoint.base_url(), self.control_path)
    }

    pub fn event_url(&self) -> String {
        format!("{}{}", self.endpoint.base_url(), self.event_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_urls() {
        let endpoint = Endpoint::new("192.168.1.100", 1400);
        assert_eq!(endpoint.base_url(), "http://192.168.1.100:1400");
        assert_eq!(endpoint.host_header(), "192.168.1.100:1400");

        let secure = Endpoint::https("192.168.1.100", 1443);
        assert_eq!(secure.base_url(), "https://192.168.1.100:1443");
    }

    #[test]
    fn endpoint_from_location() {
        let endpoint = Endpoint::parse("http://192.168.1.100:1400/xml/device_description.xml")
            .expect("valid location");
        assert_eq!(endpoint.host, "192.168.1.100");
        assert_eq!(endpoint.port, 1400);
        assert_eq!(endpoint.scheme, Scheme::Http);

        assert!(Endpoint::parse("ftp://192.168.1.100/").is_err());
        assert!(Endpoint::parse("not a url").is_err());
    }

    #[test]
    fn binding_urls() {
        let binding = ServiceBinding::new(
            Endpoint::new("192.168.1.100", 1400),
            "/MediaServer/ContentDirectory/Control",
            "/MediaServer/ContentDirectory/Event",
            "/xml/ContentDirectory1.xml",
            "urn:schemas-upnp-org:service:ContentDirectory:1",
        );
        assert_eq!(
            binding.control_url(),
            "http://192.168.1.100:1400/MediaServer/ContentDirectory/Control"
        );
        assert_eq!(
            binding.event_url(),
            "http://192.168.1.100:1400/MediaServer/ContentDirectory/Event"
        );
    }
}

//! Pluggable handlers for non-UPnP routes on the callback port.
//!
//! External components (image servers, file streamers, ...) register a
//! [`RequestBroker`] by common name. When a request is neither GENA traffic
//! nor a notification, brokers are offered the URI in registration order
//! and the first one to claim it produces the response.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::BrokerError;

/// An HTTP request offered to brokers.
#[derive(Debug, Clone)]
pub struct BrokerRequest {
    pub method: String,
    pub uri: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// A response produced by a broker that claimed a request.
#[derive(Debug, Clone)]
pub struct BrokerResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl BrokerResponse {
    pub fn ok(content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: content_type.into(),
            body,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            content_type: "text/plain".to_string(),
            body: b"not found".to_vec(),
        }
    }
}

/// A streamable resource a broker exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub title: String,
    pub description: String,
    pub path: String,
    pub content_type: String,
}

/// Capability of a pluggable route handler.
///
/// `handle_request` returns `Ok(None)` when the broker does not claim the
/// URI, `Ok(Some(response))` when it served it, and `Err` for an internal
/// failure the server reports as `500`.
#[async_trait]
pub trait RequestBroker: Send + Sync {
    /// Stable name the broker is registered and addressed by.
    fn common_name(&self) -> &str;

    async fn handle_request(
        &self,
        request: &BrokerRequest,
    ) -> std::result::Result<Option<BrokerResponse>, BrokerError>;

    fn resource(&self, _title: &str) -> Option<Resource> {
        None
    }

    fn resource_list(&self) -> Vec<Resource> {
        Vec::new()
    }

    /// Register a streamable resource, returning its URI when supported.
    fn register_resource(&self, _resource: Resource) -> Option<String> {
        None
    }

    fn unregister_resource(&self, _uri: &str) {}
}

/// Brokers in registration order.
#[derive(Default)]
pub struct BrokerRegistry {
    brokers: RwLock<Vec<Arc<dyn RequestBroker>>>,
}

impl BrokerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, broker: Arc<dyn RequestBroker>) {
        debug!(name = broker.common_name(), "registering request broker");
        self.brokers.write().await.push(broker);
    }

    pub async fn unregister(&self, name: &str) {
        self.brokers
            .write()
            .await
            .retain(|b| b.common_name() != name);
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn RequestBroker>> {
        self.brokers
            .read()
            .await
            .iter()
            .find(|b| b.common_name() == name)
            .cloned()
    }

    pub async fn all(&self) -> Vec<Arc<dyn RequestBroker>> {
        self.brokers.read().await.clone()
    }

    /// Offer a request to brokers in registration order; the first claim
    /// wins. Broker failures surface as a 500 response.
    pub async fn dispatch(&self, request: &BrokerRequest) -> Option<BrokerResponse> {
        let brokers = self.all().await;
        for broker in brokers {
            match broker.handle_request(request).await {
                Ok(Some(response)) => return Some(response),
                Ok(None) => continue,
                Err(e) => {
                    error!(name = broker.common_name(), uri = %request.uri, "broker failed: {e}");
                    return Some(BrokerResponse {
                        status: 500,
                        content_type: "text/plain".to_string(),
                        body: b"internal server error".to_vec(),
                    });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PrefixBroker {
        name: &'static str,
        prefix: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl RequestBroker for PrefixBroker {
        fn common_name(&self) -> &str {
            self.name
        }

        async fn handle_request(
            &self,
            request: &BrokerRequest,
        ) -> std::result::Result<Option<BrokerResponse>, BrokerError> {
            if !request.uri.starts_with(self.prefix) {
                return Ok(None);
            }
            if self.fail {
                return Err(BrokerError::Internal("boom".to_string()));
            }
            Ok(Some(BrokerResponse::ok(
                "text/plain",
                self.name.as_bytes().to_vec(),
            )))
        }
    }

    fn request(uri: &str) -> BrokerRequest {
        BrokerRequest {
            method: "GET".to_string(),
            uri: uri.to_string(),
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn first_registered_claim_wins() {
        let registry = BrokerRegistry::new();
        registry
            .register(Arc::new(PrefixBroker {
                name: "images",
                prefix: "/images/",
                fail: false,
            }))
            .await;
        registry
            .register(Arc::new(PrefixBroker {
                name: "catch-all",
                prefix: "/",
                fail: false,
            }))
            .await;

        let response = registry.dispatch(&request("/images/cover.jpg")).await.unwrap();
        assert_eq!(response.body, b"images");

        let response = registry.dispatch(&request("/files/a.mp3")).await.unwrap();
        assert_eq!(response.body, b"catch-all");
    }

    #[tokio::test]
    async fn unclaimed_requests_return_none() {
        let registry = BrokerRegistry::new();
        registry
            .register(Arc::new(PrefixBroker {
                name: "images",
                prefix: "/images/",
                fail: false,
            }))
            .await;

        assert!(registry.dispatch(&request("/other")).await.is_none());
    }

    #[tokio::test]
    async fn broker_failure_maps_to_500() {
        let registry = BrokerRegistry::new();
        registry
            .register(Arc::new(PrefixBroker {
                name: "broken",
                prefix: "/",
                fail: true,
            }))
            .await;

        let response = registry.dispatch(&request("/anything")).await.unwrap();
        assert_eq!(response.status, 500);
    }

    #[tokio::test]
    async fn unregister_by_name() {
        let registry = BrokerRegistry::new();
        registry
            .register(Arc::new(PrefixBroker {
                name: "images",
                prefix: "/images/",
                fail: false,
            }))
            .await;
        assert!(registry.get("images").await.is_some());

        registry.unregister("images").await;
        assert!(registry.get("images").await.is_none());
        assert!(registry.all().await.is_empty());
    }
}

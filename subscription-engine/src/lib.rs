//! Background GENA subscription management.
//!
//! One [`SubscriptionEngine`] per (service binding, event path). The engine
//! runs a single renewal task: it probes which local address the device
//! can call back, subscribes with `CALLBACK`/`NT` headers, then renews with
//! the issued `SID` at 0.9 of the granted timeout. An IP change between
//! cycles invalidates the lease and forces a fresh subscribe; stopping
//! sends one best-effort `UNSUBSCRIBE`.
//!
//! ```no_run
//! use soap_client::{Endpoint, ServiceBinding, SoapClient};
//! use subscription_engine::{EngineConfig, SubscriptionEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let binding = ServiceBinding::new(
//!         Endpoint::new("192.168.1.100", 1400),
//!         "/MediaServer/ContentDirectory/Control",
//!         "/MediaServer/ContentDirectory/Event",
//!         "/xml/ContentDirectory1.xml",
//!         "urn:schemas-upnp-org:service:ContentDirectory:1",
//!     );
//!     let mut engine = SubscriptionEngine::start(
//!         SoapClient::new(),
//!         binding,
//!         3400,
//!         EngineConfig::default(),
//!     )
//!     .expect("valid config");
//!
//!     // ... events arrive for engine.sid() ...
//!     engine.stop().await;
//! }
//! ```

mod engine;
mod error;

pub use engine::{EngineConfig, SubscriptionEngine, TIMEOUT_RETRY};
pub use error::{EngineError, Result};

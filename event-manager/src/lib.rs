//! UPnP event handler and dispatcher.
//!
//! One [`EventHandler`] serves any number of service façades: it owns the
//! callback HTTP server, keeps a registry of subscriber registrations with
//! per-kind masks, and drains accepted notifications on a single dispatch
//! task so each subscriber sees events in acceptance order.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use event_manager::{EventHandler, EventKind, EventMessage, EventSubscriber, HandlerConfig};
//!
//! struct Printer;
//!
//! impl EventSubscriber for Printer {
//!     fn on_event(&self, message: &EventMessage) {
//!         println!("{:?}: {:?}", message.kind, message.subject);
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
//!     let printer: Arc<dyn EventSubscriber> = Arc::new(Printer);
//!     let sub_id = handler.create_subscription(&printer).await;
//!     handler.subscribe_for_event(sub_id, EventKind::UpnpPropChange).await;
//!     // ... subscribe a device at handler.base_url() ...
//!     handler.revoke_all_subscriptions(&printer).await;
//!     handler.stop().await;
//! }
//! ```

mod error;
mod handler;
mod message;
mod propertyset;

pub use error::{EventError, Result};
pub use handler::{EventHandler, HandlerConfig, HANDLER_TIMER_INTERVAL};
pub use message::{
    EventKind, EventMessage, EventSubscriber, HANDLER_FAILED, HANDLER_STARTED, HANDLER_STOPPED,
};
pub use propertyset::parse_propertyset;

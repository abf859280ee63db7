//! HTTP callback server for UPnP eventing.
//!
//! This crate is the server half of the eventing plane: a single HTTP/1.1
//! listener that receives GENA `NOTIFY` requests from devices and forwards
//! them, unparsed, to the event handler through a channel. Requests that
//! are not UPnP traffic are offered to registered [`RequestBroker`]s in
//! registration order, so arbitrary resources (cover art, file streams)
//! can be served from the same port a device already knows about.
//!
//! # Example
//!
//! ```no_run
//! use callback_server::{CallbackServer, NotificationPayload};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (tx, mut rx) = mpsc::unbounded_channel::<NotificationPayload>();
//!     let mut server = CallbackServer::bind(0, tx).await.expect("bind");
//!     println!("callbacks at {}", server.base_url());
//!
//!     while let Some(notification) = rx.recv().await {
//!         println!("SID {} SEQ {}", notification.sid, notification.seq);
//!     }
//!     server.stop().await;
//! }
//! ```

pub mod broker;
mod error;
pub mod router;
mod server;

pub use broker::{BrokerRegistry, BrokerRequest, BrokerResponse, RequestBroker, Resource};
pub use error::{BrokerError, Result, ServerError};
pub use router::{NotificationPayload, NotifyRouter};
pub use server::CallbackServer;

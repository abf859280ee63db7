//! Print every property-change notification delivered to the handler.
//!
//! Subscribe a device to the printed callback URL (e.g. with the
//! subscription engine) and watch events arrive.

use std::sync::Arc;
use std::time::Duration;

use event_manager::{EventHandler, EventKind, EventMessage, EventSubscriber, HandlerConfig};

struct Printer;

impl EventSubscriber for Printer {
    fn on_event(&self, message: &EventMessage) {
        match message.kind {
            EventKind::UpnpPropChange => {
                println!("SID {} SEQ {}", message.sid().unwrap_or("?"), message.seq().unwrap_or("?"));
                for (name, value) in message.properties() {
                    println!("  {name} = {value}");
                }
            }
            _ => println!("{:?}: {:?}", message.kind, message.subject),
        }
    }
}

#[tokio::main]
async fn main() {
    let mut handler = EventHandler::start(HandlerConfig::default())
        .await
        .expect("start event handler");
    println!("callback URL: {}", handler.base_url());

    let printer: Arc<dyn EventSubscriber> = Arc::new(Printer);
    let sub_id = handler.create_subscription(&printer).await;
    handler
        .subscribe_for_event(sub_id, EventKind::UpnpPropChange)
        .await;

    tokio::time::sleep(Duration::from_secs(300)).await;

    handler.revoke_all_subscriptions(&printer).await;
    handler.stop().await;
}

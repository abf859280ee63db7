//! Property-change eventing: a NOTIFY against the event handler updates
//! the façade's ContentProperty snapshot and fires the consumer callback
//! exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use content_directory::ContentDirectory;
use event_manager::{EventHandler, HandlerConfig};
use soap_client::SoapClient;

async fn notify(port: u16, sid: &str, seq: u32, body: &str) -> u16 {
    let url = format!("http://127.0.0.1:{port}/");
    let sid = sid.to_string();
    let body = body.to_string();
    tokio::task::spawn_blocking(move || {
        ureq::request("NOTIFY", &url)
            .set("NT", "upnp:event")
            .set("NTS", "upnp:propchange")
            .set("SID", &sid)
            .set("SEQ", &seq.to_string())
            .set("Content-Type", "text/xml")
            .send_string(&body)
            .map(|r| r.status())
            .expect("notify request")
    })
    .await
    .expect("request task")
}

#[tokio::test]
async fn content_directory_folds_property_changes() {
    let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();

    let directory = Arc::new(ContentDirectory::new(
        SoapClient::new(),
        "192.168.1.100",
        1400,
    ));
    let callbacks = Arc::new(AtomicUsize::new(0));
    let counter = callbacks.clone();
    directory.set_on_change(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let sub_id = directory.clone().register(&handler).await;
    assert_ne!(sub_id, 0);

    let body = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
        <e:property><SystemUpdateID>42</SystemUpdateID></e:property>
        <e:property><ContainerUpdateIDs>A:ALBUM,7</ContainerUpdateIDs></e:property>
    </e:propertyset>"#;
    assert_eq!(notify(handler.port(), "uuid:sub-1", 0, body).await, 200);
    tokio::time::sleep(Duration::from_millis(100)).await;

    let property = directory.property();
    assert_eq!(property.system_update_id, "42");
    assert_eq!(property.container_root, "A:ALBUM");
    assert_eq!(property.container_update_id, 7);
    assert_eq!(callbacks.load(Ordering::SeqCst), 1, "one callback per event");

    directory.clone().unregister(&handler).await;
    handler.stop().await;
}

#[tokio::test]
async fn unregistered_facade_sees_no_changes() {
    let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();

    let directory = Arc::new(ContentDirectory::new(
        SoapClient::new(),
        "192.168.1.100",
        1400,
    ));
    let sub_id = directory.clone().register(&handler).await;
    assert_ne!(sub_id, 0);
    directory.clone().unregister(&handler).await;

    let body = r#"<e:propertyset xmlns:e="urn:schemas-upnp-org:event-1-0">
        <e:property><SystemUpdateID>99</SystemUpdateID></e:property>
    </e:propertyset>"#;
    notify(handler.port(), "uuid:sub-1", 0, body).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(directory.property().system_update_id, "");

    handler.stop().await;
}

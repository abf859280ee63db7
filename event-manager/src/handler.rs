//! The event handler: callback server ownership, subscriber registry and
//! the dispatch task.

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use callback_server::{CallbackServer, NotificationPayload, RequestBroker};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{EventError, Result};
use crate::message::{
    EventKind, EventMessage, EventSubscriber, HANDLER_FAILED, HANDLER_STARTED, HANDLER_STOPPED,
};
use crate::propertyset::parse_propertyset;

/// Housekeeping interval: a timer event is posted whenever this long
/// passes without an external event.
pub const HANDLER_TIMER_INTERVAL: Duration = Duration::from_secs(1);

const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for the event handler.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Port the callback server binds (0 = ephemeral)
    /// Default: 0
    pub binding_port: u16,

    /// Housekeeping timer interval
    /// Default: 1 second
    pub timer_interval: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            binding_port: 0,
            timer_interval: HANDLER_TIMER_INTERVAL,
        }
    }
}

impl HandlerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_binding_port(mut self, port: u16) -> Self {
        self.binding_port = port;
        self
    }

    pub fn with_timer_interval(mut self, interval: Duration) -> Self {
        self.timer_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timer_interval.is_zero() {
            return Err(EventError::Configuration(
                "timer interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

struct Registration {
    subscriber: Weak<dyn EventSubscriber>,
    mask: HashSet<EventKind>,
}

struct Shared {
    registry: RwLock<BTreeMap<u32, Registration>>,
    next_id: AtomicU32,
}

/// Owns the callback HTTP server and fans incoming events out to
/// registered subscribers on a single dispatch task.
///
/// Subscribers are held as non-owning references: revoke registrations
/// before dropping the subscriber. Revocation waits for an in-flight
/// dispatch to complete, so after [`EventHandler::revoke_subscription`]
/// returns no further `on_event` call targets that registration.
pub struct EventHandler {
    server: CallbackServer,
    shared: Arc<Shared>,
    stop_requested: Arc<AtomicBool>,
    dispatch: Option<JoinHandle<()>>,
}

impl EventHandler {
    /// Start the callback server and the dispatch task.
    pub async fn start(config: HandlerConfig) -> Result<Self> {
        config.validate()?;
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let server = CallbackServer::bind(config.binding_port, notify_tx).await?;

        let shared = Arc::new(Shared {
            registry: RwLock::new(BTreeMap::new()),
            next_id: AtomicU32::new(1),
        });
        let stop_requested = Arc::new(AtomicBool::new(false));
        let dispatch = tokio::spawn(dispatch_loop(
            shared.clone(),
            notify_rx,
            stop_requested.clone(),
            config.timer_interval,
        ));

        info!(port = server.port(), "event handler started");
        Ok(Self {
            server,
            shared,
            stop_requested,
            dispatch: Some(dispatch),
        })
    }

    /// Local address of the callback server.
    pub fn local_ip(&self) -> IpAddr {
        self.server.local_ip()
    }

    /// Port of the callback server, for GENA `CALLBACK` URLs.
    pub fn port(&self) -> u16 {
        self.server.port()
    }

    pub fn base_url(&self) -> &str {
        self.server.base_url()
    }

    pub fn is_running(&self) -> bool {
        self.dispatch.is_some()
    }

    /// Register a subscriber and return its id.
    ///
    /// Ids increase monotonically and are never reused within a process
    /// run. Returns 0 when the handler has been stopped.
    pub async fn create_subscription(&self, subscriber: &Arc<dyn EventSubscriber>) -> u32 {
        if !self.is_running() {
            return 0;
        }
        let sub_id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        self.shared.registry.write().await.insert(
            sub_id,
            Registration {
                subscriber: Arc::downgrade(subscriber),
                mask: HashSet::new(),
            },
        );
        debug!(sub_id, "subscription created");
        sub_id
    }

    /// Add an event kind to a subscription's mask.
    pub async fn subscribe_for_event(&self, sub_id: u32, kind: EventKind) -> bool {
        if !self.is_running() {
            return false;
        }
        match self.shared.registry.write().await.get_mut(&sub_id) {
            Some(registration) => {
                registration.mask.insert(kind);
                true
            }
            None => false,
        }
    }

    /// Remove one registration. Waits for an in-flight dispatch to the
    /// subscriber to complete.
    pub async fn revoke_subscription(&self, sub_id: u32) {
        if self.shared.registry.write().await.remove(&sub_id).is_some() {
            debug!(sub_id, "subscription revoked");
        }
    }

    /// Remove every registration held for `subscriber`.
    pub async fn revoke_all_subscriptions(&self, subscriber: &Arc<dyn EventSubscriber>) {
        // compare allocation addresses: vtable identity is not reliable
        let target = Arc::as_ptr(subscriber) as *const u8;
        self.shared
            .registry
            .write()
            .await
            .retain(|_, registration| registration.subscriber.as_ptr() as *const u8 != target);
    }

    pub async fn register_request_broker(&self, broker: Arc<dyn RequestBroker>) {
        self.server.brokers().register(broker).await;
    }

    pub async fn unregister_request_broker(&self, name: &str) {
        self.server.brokers().unregister(name).await;
    }

    pub async fn request_broker(&self, name: &str) -> Option<Arc<dyn RequestBroker>> {
        self.server.brokers().get(name).await
    }

    pub async fn all_request_brokers(&self) -> Vec<Arc<dyn RequestBroker>> {
        self.server.brokers().all().await
    }

    /// Stop the handler: the server stops accepting, queued notifications
    /// are drained to subscribers, a `STOPPED` status is posted, and the
    /// dispatch task is joined. Idempotent.
    pub async fn stop(&mut self) {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.server.stop().await;
        if let Some(task) = self.dispatch.take() {
            match timeout(SHUTDOWN_JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => info!("event handler stopped"),
                Ok(Err(e)) => warn!("dispatch task panicked: {e}"),
                Err(_) => warn!("dispatch task did not stop in time"),
            }
        }
    }
}

async fn dispatch_loop(
    shared: Arc<Shared>,
    mut notify_rx: mpsc::UnboundedReceiver<NotificationPayload>,
    stop_requested: Arc<AtomicBool>,
    timer_interval: Duration,
) {
    dispatch(&shared, &EventMessage::status(HANDLER_STARTED)).await;
    loop {
        match timeout(timer_interval, notify_rx.recv()).await {
            Ok(Some(payload)) => match decode_notification(&payload) {
                Ok(message) => dispatch(&shared, &message).await,
                Err(e) => warn!(sid = %payload.sid, "dropping undecodable notification: {e}"),
            },
            // Channel closed: the server is gone, drain is complete.
            Ok(None) => break,
            Err(_) => dispatch(&shared, &EventMessage::timer()).await,
        }
    }
    let status = if stop_requested.load(Ordering::SeqCst) {
        HANDLER_STOPPED
    } else {
        HANDLER_FAILED
    };
    dispatch(&shared, &EventMessage::status(status)).await;
}

/// Deliver one message to every registration whose mask holds its kind.
///
/// Runs under a shared registry reference so registry mutations wait for
/// the delivery round to finish.
async fn dispatch(shared: &Shared, message: &EventMessage) {
    let registry = shared.registry.read().await;
    for (sub_id, registration) in registry.iter() {
        if !registration.mask.contains(&message.kind) {
            continue;
        }
        match registration.subscriber.upgrade() {
            Some(subscriber) => subscriber.on_event(message),
            None => debug!(sub_id, "skipping dropped subscriber"),
        }
    }
}

fn decode_notification(payload: &NotificationPayload) -> Result<EventMessage> {
    let properties = parse_propertyset(&payload.body)?;
    Ok(EventMessage::propchange(
        payload.sid.clone(),
        payload.seq.clone(),
        properties,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSubscriber {
        received: Mutex<Vec<EventMessage>>,
    }

    impl RecordingSubscriber {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                received: Mutex::new(Vec::new()),
            })
        }

        fn messages(&self) -> Vec<EventMessage> {
            self.received.lock().unwrap().clone()
        }
    }

    impl EventSubscriber for RecordingSubscriber {
        fn on_event(&self, message: &EventMessage) {
            self.received.lock().unwrap().push(message.clone());
        }
    }

    #[tokio::test]
    async fn subscription_ids_are_monotonic_and_never_reused() {
        let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
        let subscriber = RecordingSubscriber::new();
        let handle: Arc<dyn EventSubscriber> = subscriber;

        let first = handler.create_subscription(&handle).await;
        let second = handler.create_subscription(&handle).await;
        assert!(second > first);

        handler.revoke_subscription(second).await;
        let third = handler.create_subscription(&handle).await;
        assert!(third > second);

        handler.revoke_all_subscriptions(&handle).await;
        handler.stop().await;
    }

    #[tokio::test]
    async fn subscribing_unknown_id_fails() {
        let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
        assert!(!handler.subscribe_for_event(999, EventKind::UpnpPropChange).await);
        handler.stop().await;
    }

    #[tokio::test]
    async fn stopped_handler_refuses_registrations() {
        let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
        handler.stop().await;
        assert!(!handler.is_running());

        let subscriber = RecordingSubscriber::new();
        let handle: Arc<dyn EventSubscriber> = subscriber;
        assert_eq!(handler.create_subscription(&handle).await, 0);
        assert!(!handler.subscribe_for_event(1, EventKind::HandlerTimer).await);

        // stop is idempotent
        handler.stop().await;
    }

    #[tokio::test]
    async fn stop_posts_stopped_status_to_subscribers() {
        let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
        let subscriber = RecordingSubscriber::new();
        let handle: Arc<dyn EventSubscriber> = subscriber.clone();

        let sub_id = handler.create_subscription(&handle).await;
        assert!(handler.subscribe_for_event(sub_id, EventKind::HandlerStatus).await);

        handler.stop().await;

        let statuses = subscriber.messages();
        assert!(statuses
            .iter()
            .any(|m| m.kind == EventKind::HandlerStatus && m.subject == vec![HANDLER_STOPPED]));
    }

    #[tokio::test]
    async fn timer_events_fire_without_external_traffic() {
        let config = HandlerConfig::default().with_timer_interval(Duration::from_millis(20));
        let mut handler = EventHandler::start(config).await.unwrap();
        let subscriber = RecordingSubscriber::new();
        let handle: Arc<dyn EventSubscriber> = subscriber.clone();

        let sub_id = handler.create_subscription(&handle).await;
        handler.subscribe_for_event(sub_id, EventKind::HandlerTimer).await;

        tokio::time::sleep(Duration::from_millis(120)).await;
        handler.stop().await;

        let timers = subscriber
            .messages()
            .into_iter()
            .filter(|m| m.kind == EventKind::HandlerTimer)
            .count();
        assert!(timers >= 2, "expected housekeeping timers, got {timers}");
    }

    #[tokio::test]
    async fn masks_filter_delivery() {
        let mut handler = EventHandler::start(HandlerConfig::default()).await.unwrap();
        let subscriber = RecordingSubscriber::new();
        let handle: Arc<dyn EventSubscriber> = subscriber.clone();

        // registered but with an empty mask: nothing must arrive
        handler.create_subscription(&handle).await;
        handler.stop().await;

        assert!(subscriber.messages().is_empty());
    }

    #[test]
    fn zero_timer_interval_is_rejected() {
        let config = HandlerConfig::default().with_timer_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}

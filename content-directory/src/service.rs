//! The ContentDirectory service façade.

use std::sync::{Arc, Mutex};

use didl_parser::DigitalItem;
use event_manager::{EventHandler, EventKind, EventMessage, EventSubscriber};
use soap_client::{ElementList, Endpoint, ServiceBinding, SoapClient};
use subscription_engine::SubscriptionEngine;
use tracing::debug;

use crate::error::Result;

pub const SERVICE_NAME: &str = "ContentDirectory";
pub const SERVICE_TYPE: &str = "urn:schemas-upnp-org:service:ContentDirectory:1";
pub const CONTROL_PATH: &str = "/MediaServer/ContentDirectory/Control";
pub const EVENT_PATH: &str = "/MediaServer/ContentDirectory/Event";
pub const SCPD_PATH: &str = "/xml/ContentDirectory1.xml";

/// Upper bound on the page size of one Browse call.
pub const BROWSE_COUNT: u32 = 100;

/// Snapshot of the evented ContentDirectory state variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentProperty {
    pub system_update_id: String,
    pub container_root: String,
    pub container_update_id: u32,
    pub user_radio_update_id: String,
    pub saved_queues_update_id: String,
    pub share_list_update_id: String,
    pub recently_played_update_id: String,
    pub radio_favorites_update_id: String,
    pub radio_location_update_id: String,
    pub favorites_update_id: String,
    pub favorite_presets_update_id: String,
}

/// Capability of anything that can issue a paged Browse.
///
/// The paging views ([`crate::ContentList`], [`crate::ContentBrowser`])
/// are written against this seam so they can run against a fake source.
pub trait Browse {
    /// Issue `Browse(BrowseDirectChildren)` on `object_id` for the page
    /// `[starting_index, starting_index + requested_count)`.
    fn browse(
        &self,
        object_id: &str,
        starting_index: u32,
        requested_count: u32,
    ) -> Result<ElementList>;
}

/// A fetched Browse page: the decoded items plus the authoritative total
/// when the device reported one.
pub(crate) struct BrowsePage {
    pub items: Vec<DigitalItem>,
    pub total: Option<u32>,
}

/// Perform one Browse round-trip and decode the DIDL payload.
///
/// Returns `None` on any failure: transport error, fault response,
/// missing `Result` argument or unparsable DIDL.
pub(crate) fn browse_page<B: Browse + ?Sized>(
    service: &B,
    root: &str,
    index: u32,
    count: u32,
) -> Option<BrowsePage> {
    debug!(root, index, count, "browsing");
    let vars = service.browse(root, index, count).ok()?;
    if !vars.is_response("Browse") {
        debug!(root, code = ?vars.error_code(), "browse rejected");
        return None;
    }
    let result = vars.value_of("Result")?;
    let items = didl_parser::parse(result).ok()?;
    let total = vars.value_of("TotalMatches").and_then(|v| v.parse().ok());
    Some(BrowsePage { items, total })
}

/// One ContentDirectory service on one device.
///
/// The façade issues synchronous SOAP calls through the shared
/// [`SoapClient`] and, when registered with an [`EventHandler`], folds
/// `upnp:propchange` notifications into a [`ContentProperty`] snapshot.
pub struct ContentDirectory {
    client: SoapClient,
    binding: ServiceBinding,
    subscription: Mutex<Option<Arc<SubscriptionEngine>>>,
    property: Mutex<ContentProperty>,
    on_change: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl ContentDirectory {
    /// Façade for the device at `host:port` with the standard paths.
    pub fn new(client: SoapClient, host: impl Into<String>, port: u16) -> Self {
        Self::with_binding(client, Self::binding_for(Endpoint::new(host, port)))
    }

    pub fn with_binding(client: SoapClient, binding: ServiceBinding) -> Self {
        Self {
            client,
            binding,
            subscription: Mutex::new(None),
            property: Mutex::new(ContentProperty::default()),
            on_change: Mutex::new(None),
        }
    }

    /// The standard ContentDirectory binding for an endpoint.
    pub fn binding_for(endpoint: Endpoint) -> ServiceBinding {
        ServiceBinding::new(endpoint, CONTROL_PATH, EVENT_PATH, SCPD_PATH, SERVICE_TYPE)
    }

    pub fn binding(&self) -> &ServiceBinding {
        &self.binding
    }

    /// Browse direct children of `object_id`.
    ///
    /// The returned list's first element is `u:BrowseResponse` on success;
    /// a device-side fault comes back as a fault element list.
    pub fn browse(
        &self,
        object_id: &str,
        starting_index: u32,
        requested_count: u32,
    ) -> Result<ElementList> {
        let index = starting_index.to_string();
        let count = requested_count.to_string();
        let args = [
            ("ObjectID", object_id),
            ("BrowseFlag", "BrowseDirectChildren"),
            ("Filter", "*"),
            ("StartingIndex", index.as_str()),
            ("RequestedCount", count.as_str()),
            ("SortCriteria", ""),
        ];
        Ok(self.client.invoke(&self.binding, "Browse", &args)?)
    }

    /// Ask the device to rebuild its music index.
    pub fn refresh_share_index(&self) -> Result<bool> {
        let vars = self.client.invoke(
            &self.binding,
            "RefreshShareIndex",
            &[("AlbumArtistDisplayOption", "")],
        )?;
        Ok(vars.is_response("RefreshShareIndex"))
    }

    /// Attach the subscription engine whose SID incoming notifications
    /// must match. Without one, every propchange is accepted.
    pub fn attach_subscription(&self, engine: Arc<SubscriptionEngine>) {
        *self.subscription.lock().unwrap() = Some(engine);
    }

    /// Set the callback invoked once per applied property-change event.
    pub fn set_on_change(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_change.lock().unwrap() = Some(Box::new(callback));
    }

    /// Current snapshot of the evented state variables.
    pub fn property(&self) -> ContentProperty {
        self.property.lock().unwrap().clone()
    }

    /// Register with an event handler for property-change events. The
    /// handler keeps only a non-owning reference to the passed handle.
    /// Returns the subscription id (0 when the handler is stopped).
    pub async fn register(self: Arc<Self>, handler: &EventHandler) -> u32 {
        let subscriber: Arc<dyn EventSubscriber> = self;
        let sub_id = handler.create_subscription(&subscriber).await;
        if sub_id != 0 {
            handler
                .subscribe_for_event(sub_id, EventKind::UpnpPropChange)
                .await;
        }
        sub_id
    }

    /// Remove every registration this façade holds on `handler`. Call
    /// before dropping the façade.
    pub async fn unregister(self: Arc<Self>, handler: &EventHandler) {
        let subscriber: Arc<dyn EventSubscriber> = self;
        handler.revoke_all_subscriptions(&subscriber).await;
    }

    fn accepts(&self, message_sid: Option<&str>) -> bool {
        match self.subscription.lock().unwrap().as_ref() {
            Some(engine) => message_sid == Some(engine.sid().as_str()),
            None => true,
        }
    }
}

impl EventSubscriber for ContentDirectory {
    fn on_event(&self, message: &EventMessage) {
        if message.kind != EventKind::UpnpPropChange {
            return;
        }
        if !self.accepts(message.sid()) {
            return;
        }
        if message.subject.get(2).map(String::as_str) != Some("PROPERTY") {
            return;
        }
        debug!(sid = ?message.sid(), seq = ?message.seq(), "content property change");
        {
            let mut property = self.property.lock().unwrap();
            apply_propchange(&mut property, message.properties());
        }
        if let Some(callback) = self.on_change.lock().unwrap().as_ref() {
            callback();
        }
    }
}

impl Browse for ContentDirectory {
    fn browse(
        &self,
        object_id: &str,
        starting_index: u32,
        requested_count: u32,
    ) -> Result<ElementList> {
        ContentDirectory::browse(self, object_id, starting_index, requested_count)
    }
}

/// Fold property-change pairs into the snapshot.
fn apply_propchange<'p>(
    property: &mut ContentProperty,
    pairs: impl Iterator<Item = (&'p str, &'p str)>,
) {
    for (name, value) in pairs {
        match name {
            "SystemUpdateID" => property.system_update_id = value.to_string(),
            "ContainerUpdateIDs" => {
                // "<root>,<updateId>" token pair
                let tokens: Vec<&str> = value.split(',').collect();
                if tokens.len() >= 2 {
                    if let Ok(update_id) = tokens[1].parse() {
                        property.container_root = tokens[0].to_string();
                        property.container_update_id = update_id;
                    }
                }
            }
            "UserRadioUpdateID" => property.user_radio_update_id = value.to_string(),
            "SavedQueuesUpdateID" => property.saved_queues_update_id = value.to_string(),
            "ShareListUpdateID" => property.share_list_update_id = value.to_string(),
            "RecentlyPlayedUpdateID" => property.recently_played_update_id = value.to_string(),
            "RadioFavoritesUpdateID" => property.radio_favorites_update_id = value.to_string(),
            "RadioLocationUpdateID" => property.radio_location_update_id = value.to_string(),
            "FavoritesUpdateID" => property.favorites_update_id = value.to_string(),
            "FavoritePresetsUpdateID" => property.favorite_presets_update_id = value.to_string(),
            _ => {}
        }
    }
}

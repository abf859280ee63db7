//! Media object records decoded from DIDL-Lite.

use serde::{Deserialize, Serialize};
use soap_client::ElementList;

/// Whether a DIDL object is a leaf item or a browsable container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Item,
    Container,
}

impl ItemKind {
    pub(crate) fn tag_name(&self) -> &'static str {
        match self {
            ItemKind::Item => "item",
            ItemKind::Container => "container",
        }
    }
}

/// One media object: identity attributes plus its property elements keyed
/// by canonical qualified name (`dc:title`, `upnp:album`, `res`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalItem {
    pub object_id: String,
    pub parent_id: String,
    pub restricted: bool,
    pub kind: ItemKind,
    pub properties: ElementList,
}

/// Sentinel object id for "unknown".
pub const UNKNOWN_OBJECT_ID: &str = "-1";

impl DigitalItem {
    pub fn new(
        object_id: impl Into<String>,
        parent_id: impl Into<String>,
        restricted: bool,
        kind: ItemKind,
        properties: ElementList,
    ) -> Self {
        Self {
            object_id: object_id.into(),
            parent_id: parent_id.into(),
            restricted,
            kind,
            properties,
        }
    }

    pub fn is_container(&self) -> bool {
        self.kind == ItemKind::Container
    }

    /// `dc:title` property.
    pub fn title(&self) -> Option<&str> {
        self.properties.value_of("dc:title")
    }

    /// `upnp:class` property (e.g. `object.item.audioItem.musicTrack`).
    pub fn upnp_class(&self) -> Option<&str> {
        self.properties.value_of("upnp:class")
    }

    /// URI of the first `res` resource.
    pub fn resource_uri(&self) -> Option<&str> {
        self.properties.value_of("res")
    }
}

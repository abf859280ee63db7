//! Canonical namespace dictionary for DIDL-Lite documents.
//!
//! Serializers are free to pick any prefix for a namespace; downstream code
//! is not. The dictionary maps each known namespace URI to one canonical
//! prefix so that property keys stay stable (`dc:title` is `dc:title` even
//! when the wire document declared `xmlns:ns1`).

pub const XMLNS_DIDL: &str = "urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/";
pub const XMLNS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub const XMLNS_UPNP: &str = "urn:schemas-upnp-org:metadata-1-0/upnp/";
pub const XMLNS_RINC: &str = "urn:schemas-rinconnetworks-com:metadata-1-0/";

/// Maps namespace URIs to canonical prefixes. The empty prefix is the
/// document default (DIDL-Lite itself).
#[derive(Debug, Clone)]
pub struct NamespaceDict {
    entries: Vec<(&'static str, &'static str)>,
}

impl NamespaceDict {
    /// The fixed DIDL-Lite dictionary.
    pub fn didl() -> Self {
        Self {
            entries: vec![
                ("", XMLNS_DIDL),
                ("dc", XMLNS_DC),
                ("upnp", XMLNS_UPNP),
                ("r", XMLNS_RINC),
            ],
        }
    }

    /// Canonical prefix for a namespace URI, when the URI is known.
    pub fn prefix_for(&self, uri: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, u)| *u == uri)
            .map(|(p, _)| *p)
    }

    /// Translate an element name into canonical qualified form.
    ///
    /// `namespace` is the resolved namespace URI of the element and
    /// `prefix` the prefix the document happened to use. Unknown namespaces
    /// keep their original prefix form.
    pub fn qualify(&self, namespace: Option<&str>, prefix: Option<&str>, local: &str) -> String {
        match namespace.and_then(|uri| self.prefix_for(uri)) {
            Some("") => local.to_string(),
            Some(canonical) => format!("{canonical}:{local}"),
            None => match prefix {
                Some(p) => format!("{p}:{local}"),
                None => local.to_string(),
            },
        }
    }

    /// The `xmlns` declarations of the dictionary, ready to splice into a
    /// root element.
    pub fn xmlns_attrs(&self) -> String {
        let mut out = String::new();
        for (prefix, uri) in &self.entries {
            if prefix.is_empty() {
                out.push_str(&format!(r#" xmlns="{uri}""#));
            } else {
                out.push_str(&format!(r#" xmlns:{prefix}="{uri}""#));
            }
        }
        out
    }
}

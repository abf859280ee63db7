//! DIDL-Lite parser for UPnP ContentDirectory metadata.
//!
//! Turns a DIDL-Lite XML document into an ordered sequence of
//! [`DigitalItem`] records. Element names are translated through a fixed
//! [`NamespaceDict`] so property keys are stable regardless of the prefixes
//! the serializing device chose.
//!
//! ```
//! let didl = r#"<DIDL-Lite xmlns="urn:schemas-upnp-org:metadata-1-0/DIDL-Lite/"
//!                xmlns:dc="http://purl.org/dc/elements/1.1/">
//!     <item id="Q:0/1" parentID="Q:0" restricted="true">
//!         <dc:title>Blue Train</dc:title>
//!     </item>
//! </DIDL-Lite>"#;
//!
//! let items = didl_parser::parse(didl).unwrap();
//! assert_eq!(items[0].title(), Some("Blue Train"));
//! ```

mod dict;
mod error;
mod item;

pub use dict::{NamespaceDict, XMLNS_DC, XMLNS_DIDL, XMLNS_RINC, XMLNS_UPNP};
pub use error::{DidlError, Result};
pub use item::{DigitalItem, ItemKind, UNKNOWN_OBJECT_ID};

use soap_client::{Element, ElementList};
use xmltree::XMLNode;

/// Parse a DIDL-Lite document into its media objects.
///
/// Direct `item` and `container` children of the root are decoded; other
/// children are skipped. Missing `id`/`parentID` attributes default to
/// `"-1"`, `restricted` defaults to false and matches any value beginning
/// with `true`. A grandchild element contributes a property only when it
/// carries text.
pub fn parse(document: &str) -> Result<Vec<DigitalItem>> {
    let root = xmltree::Element::parse(document.as_bytes())
        .map_err(|e| DidlError::Xml(e.to_string()))?;
    if root.name != "DIDL-Lite" {
        return Err(DidlError::UnexpectedRoot(root.name));
    }

    let dict = NamespaceDict::didl();
    let mut items = Vec::new();
    for object in root.children.iter().filter_map(XMLNode::as_element) {
        let kind = match object.name.as_str() {
            "item" => ItemKind::Item,
            "container" => ItemKind::Container,
            _ => continue,
        };
        let object_id = attr_or(object, "id", UNKNOWN_OBJECT_ID);
        let parent_id = attr_or(object, "parentID", UNKNOWN_OBJECT_ID);
        let restricted = object
            .attributes
            .get("restricted")
            .is_some_and(|v| v.starts_with("true"));

        let mut properties = ElementList::new();
        for property in object.children.iter().filter_map(XMLNode::as_element) {
            let Some(text) = property.get_text() else {
                continue;
            };
            let key = dict.qualify(
                property.namespace.as_deref(),
                property.prefix.as_deref(),
                &property.name,
            );
            let mut element = Element::new(key, text.into_owned());
            for (name, value) in &property.attributes {
                element.set_attribute(name.clone(), value.clone());
            }
            properties.push(element);
        }
        items.push(DigitalItem::new(
            object_id, parent_id, restricted, kind, properties,
        ));
    }
    Ok(items)
}

/// Serialize media objects into a canonical DIDL-Lite document.
///
/// The root declares the full dictionary so that canonical property keys
/// (`dc:title`, `upnp:album`, ...) resolve on re-parse.
pub fn to_didl(items: &[DigitalItem]) -> String {
    let dict = NamespaceDict::didl();
    let mut out = String::from("<DIDL-Lite");
    out.push_str(&dict.xmlns_attrs());
    out.push('>');
    for item in items {
        let tag = item.kind.tag_name();
        out.push_str(&format!(
            r#"<{tag} id="{}" parentID="{}" restricted="{}">"#,
            escape_xml(&item.object_id),
            escape_xml(&item.parent_id),
            item.restricted
        ));
        for property in &item.properties {
            out.push('<');
            out.push_str(property.name());
            for (name, value) in property.attributes() {
                out.push_str(&format!(r#" {name}="{}""#, escape_xml(value)));
            }
            out.push('>');
            out.push_str(&escape_xml(property.text()));
            out.push_str("</");
            out.push_str(property.name());
            out.push('>');
        }
        out.push_str(&format!("</{tag}>"));
    }
    out.push_str("</DIDL-Lite>");
    out
}

fn attr_or(element: &xmltree::Element, name: &str, default: &str) -> String {
    element
        .attributes
        .get(name)
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}


#[cfg(test)]
mod round_trip_properties {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_text()(text in r#"[A-Za-z0-9&<>"'_.:-]{1,24}"#) -> String { text }
    }

    prop_compose! {
        fn arb_key()(index in 0..4usize) -> &'static str {
            ["dc:title", "dc:creator", "upnp:album", "res"][index]
        }
    }

    prop_compose! {
        fn arb_item()(
            object_id in "[A-Za-z0-9:/%]{1,12}",
            parent_id in "[A-Za-z0-9:/%]{1,12}",
            restricted in any::<bool>(),
            container in any::<bool>(),
            keys in prop::collection::vec(arb_key(), 0..4),
            texts in prop::collection::vec(arb_text(), 4),
        ) -> DigitalItem {
            let mut properties = ElementList::new();
            for (i, key) in keys.iter().enumerate() {
                properties.push(Element::new(*key, texts[i].clone()));
            }
            let kind = if container { ItemKind::Container } else { ItemKind::Item };
            DigitalItem::new(object_id, parent_id, restricted, kind, properties)
        }
    }

    proptest! {
        /// Serializing a DigitalItem list and parsing it back preserves
        /// ids, parent ids, restricted flags and property keys/values.
        #[test]
        fn serializer_parser_round_trip(items in prop::collection::vec(arb_item(), 0..5)) {
            let reparsed = parse(&to_didl(&items)).unwrap();
            prop_assert_eq!(reparsed.len(), items.len());
            for (original, parsed) in items.iter().zip(&reparsed) {
                prop_assert_eq!(&parsed.object_id, &original.object_id);
                prop_assert_eq!(&parsed.parent_id, &original.parent_id);
                prop_assert_eq!(parsed.restricted, original.restricted);
                prop_assert_eq!(parsed.kind, original.kind);
                prop_assert_eq!(&parsed.properties, &original.properties);
            }
        }
    }
}

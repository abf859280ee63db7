//! GENA `propertyset` body decoding.

use xmltree::{EmitterConfig, XMLNode};

use crate::error::EventError;

/// Decode a `NOTIFY` body into ordered property name/value pairs.
///
/// The body is an `e:propertyset` with one or more `e:property` children,
/// each holding a single named node. Devices usually escape nested XML so
/// the value arrives as text; some send real nested elements instead, in
/// which case the subtree is re-serialized so the consumer always sees the
/// inner document as a string.
pub fn parse_propertyset(body: &str) -> Result<Vec<(String, String)>, EventError> {
    let root =
        xmltree::Element::parse(body.as_bytes()).map_err(|e| EventError::Parse(e.to_string()))?;
    if root.name != "propertyset" {
        return Err(EventError::Parse(format!(
            "unexpected root element: {}",
            root.name
        )));
    }

    let mut properties = Vec::new();
    for property in root.children.iter().filter_map(XMLNode::as_element) {
        if property.name != "property" {
            continue;
        }
        for value in property.children.iter().filter_map(XMLNode::as_element) {
            properties.push((value.name.clone(), element_value(value)?));
        }
    }
    Ok(properties)
}

fn element_value(element: &xmltree::Element) -> Result<String, EventError> {
    if let Some(text) = element.get_text() {
        return Ok(text.into_owned());
    }
    // Double-encoded payload sent unescaped: flatten the subtree back to
    // its document form.
    let mut value = String::new();
    for child in element.children.iter().filter_map(XMLNode::as_element) {
        let mut buf = Vec::new();
        child
            .write_with_config(
                &mut buf,
                EmitterConfig::new().write_document_declaration(false),
            )
            .map_err(|e| EventError::Parse(e.to_string()))?;
        value.push_str(&String::from_utf8_lossy(&buf));
    }
    Ok(value)
}

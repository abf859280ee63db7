//! Decoded SOAP response units.
//!
//! Every SOAP response is flattened into an [`ElementList`]: the first
//! element carries the response tag (`u:BrowseResponse`, `s:Fault`, ...)
//! and the remaining elements are the ordered out-arguments.

use serde::{Deserialize, Serialize};

/// A named text value with optional attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    name: String,
    text: String,
    attributes: Vec<(String, String)>,
}

/// Attribute insertion order is not significant: two elements are equal
/// when their attributes agree as a set.
impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.text == other.text
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(n, v)| other.attribute(n) == Some(v.as_str()))
    }
}

impl Eq for Element {}

impl Element {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            attributes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Set an attribute. Attribute names are unique: the first write for a
    /// name wins, later writes for the same name are dropped.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if self.attributes.iter().any(|(n, _)| *n == name) {
            return;
        }
        self.attributes.push((name, value.into()));
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// Ordered sequence of [`Element`]s with first-match lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementList(Vec<Element>);

impl std::ops::Index<usize> for ElementList {
    type Output = Element;

    fn index(&self, index: usize) -> &Element {
        &self.0[index]
    }
}

impl ElementList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) {
        self.0.push(element);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Element> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.0.iter()
    }

    /// First element whose name equals `key`.
    pub fn find(&self, key: &str) -> Option<&Element> {
        self.0.iter().find(|e| e.name() == key)
    }

    /// Text of the first element whose name equals `key`.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.find(key).map(Element::text)
    }

    /// Name of the first element, i.e. the SOAP response tag.
    pub fn response_name(&self) -> Option<&str> {
        self.0.first().map(Element::name)
    }

    /// Whether the list decodes a SOAP fault envelope.
    pub fn is_fault(&self) -> bool {
        self.response_name().is_some_and(|n| n.contains("Fault"))
    }

    /// Whether the list decodes a successful `<action>Response`, with any
    /// namespace prefix.
    pub fn is_response(&self, action: &str) -> bool {
        let expected = format!("{action}Response");
        self.response_name()
            .is_some_and(|n| n.rsplit(':').next() == Some(expected.as_str()))
    }

    /// UPnP error code of a decoded fault, when present.
    pub fn error_code(&self) -> Option<u16> {
        self.value_of("errorCode").and_then(|v| v.parse().ok())
    }
}

impl FromIterator<Element> for ElementList {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ElementList {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ElementList {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

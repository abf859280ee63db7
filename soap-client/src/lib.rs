//! Blocking SOAP and GENA client for UPnP AV devices.
//!
//! This crate carries the control plane of the library: it composes SOAP
//! envelopes around an action and an ordered argument list, posts them to a
//! device's control URL, and flattens the response envelope (or fault) into
//! an [`ElementList`]. It also speaks the GENA subscription verbs
//! (`SUBSCRIBE`, `UNSUBSCRIBE`) used by the eventing layer.
//!
//! # Overview
//!
//! - [`SoapClient`]: shared blocking HTTP agent with transport/TLS policy.
//! - [`ServiceBinding`]: one UPnP service on one device.
//! - [`ElementList`]: ordered decoded response; the first element's name is
//!   the response tag and discriminates success (`u:<Action>Response`) from
//!   fault (`s:Fault`).
//!
//! SOAP faults are decoded, not raised: a fault response is returned as an
//! `Ok` element list whose first element name contains `Fault`, so callers
//! keep the same non-typed surface for both outcomes. Transport and HTTP
//! errors are raised as [`SoapError`].

mod binding;
mod element;
mod error;
mod gena;
mod transport;

pub use binding::{Endpoint, Scheme, ServiceBinding};
pub use element::{Element, ElementList};
pub use error::{Result, SoapError};
pub use gena::SubscriptionResponse;
pub use transport::TransportConfig;

use std::sync::Arc;

use tracing::{debug, warn};
use xmltree::XMLNode;

/// A minimal SOAP client for UPnP device communication.
///
/// Uses `Arc` internally so clones share the underlying HTTP agent and
/// connection pool.
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: Arc<ureq::Agent>,
    retry_attempts: u32,
}

impl SoapClient {
    /// Create a client with the default transport configuration.
    pub fn new() -> Self {
        Self::with_config(&TransportConfig::default())
            .expect("default transport configuration is valid")
    }

    /// Create a client with a custom transport configuration.
    pub fn with_config(config: &TransportConfig) -> Result<Self> {
        Ok(Self {
            agent: Arc::new(config.build_agent()?),
            retry_attempts: config.retry_attempts,
        })
    }

    /// Invoke a SOAP action and return the decoded response element list.
    ///
    /// Argument order is preserved in the request body to match device
    /// expectations. The first element of the returned list is the response
    /// tag; callers discriminate success with
    /// [`ElementList::is_response`] or [`ElementList::is_fault`].
    pub fn invoke(
        &self,
        binding: &ServiceBinding,
        action: &str,
        args: &[(&str, &str)],
    ) -> Result<ElementList> {
        let body = compose_envelope(&binding.service_type, action, args);
        let url = binding.control_url();
        let soap_action = format!("\"{}#{}\"", binding.service_type, action);

        let mut last_error = None;
        for attempt in 1..=self.retry_attempts {
            let request = self
                .agent
                .post(&url)
                .set("HOST", &binding.endpoint.host_header())
                .set("Content-Type", "text/xml; charset=\"utf-8\"")
                .set("SOAPACTION", &soap_action);

            match request.send_string(&body) {
                Ok(response) => {
                    let xml = response
                        .into_string()
                        .map_err(|e| SoapError::Network(e.to_string()))?;
                    return decode_envelope(&xml);
                }
                // UPnP devices report SOAP faults as HTTP 500; the body is
                // still a well-formed fault envelope.
                Err(ureq::Error::Status(code, response)) => {
                    let xml = response
                        .into_string()
                        .map_err(|e| SoapError::Network(e.to_string()))?;
                    return match decode_envelope(&xml) {
                        Ok(vars) if vars.is_fault() => Ok(vars),
                        _ => Err(SoapError::Http(code)),
                    };
                }
                Err(ureq::Error::Transport(transport)) => {
                    debug!(%url, action, attempt, "SOAP transport failure: {transport}");
                    last_error = Some(SoapError::Network(transport.to_string()));
                }
            }
        }
        warn!(%url, action, "SOAP call failed after {} attempt(s)", self.retry_attempts);
        Err(last_error.unwrap_or_else(|| SoapError::Network("no attempt made".into())))
    }

    pub(crate) fn retrying_call(
        &self,
        build: impl Fn(&ureq::Agent) -> ureq::Request,
    ) -> std::result::Result<ureq::Response, ureq::Error> {
        let mut last = None;
        for _ in 1..=self.retry_attempts {
            match build(&self.agent).call() {
                Err(ureq::Error::Transport(t)) => last = Some(ureq::Error::Transport(t)),
                other => return other,
            }
        }
        Err(last.expect("at least one attempt"))
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Compose the SOAP envelope for `action` with ordered arguments.
fn compose_envelope(service_type: &str, action: &str, args: &[(&str, &str)]) -> String {
    let mut payload = String::new();
    for (name, value) in args {
        payload.push('<');
        payload.push_str(name);
        payload.push('>');
        payload.push_str(&escape_xml(value));
        payload.push_str("</");
        payload.push_str(name);
        payload.push('>');
    }
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{action} xmlns:u="{service_type}">{payload}</u:{action}></s:Body></s:Envelope>"#
    )
}

/// Flatten a response envelope into an element list.
///
/// The first element carries the qualified response tag; fault envelopes
/// additionally contribute `faultcode`, `faultstring`, `errorCode` and
/// `errorDescription` elements when present.
fn decode_envelope(xml: &str) -> Result<ElementList> {
    let root = xmltree::Element::parse(xml.as_bytes())
        .map_err(|e| SoapError::Parse(e.to_string()))?;
    let body = root
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("missing SOAP Body".to_string()))?;
    let response = body
        .children
        .iter()
        .find_map(XMLNode::as_element)
        .ok_or_else(|| SoapError::Parse("empty SOAP Body".to_string()))?;

    let mut vars = ElementList::new();
    vars.push(Element::new(qualified_name(response), ""));

    if response.name == "Fault" {
        decode_fault(response, &mut vars);
    } else {
        for child in response.children.iter().filter_map(XMLNode::as_element) {
            let text = child.get_text().unwrap_or_default().into_owned();
            let mut element = Element::new(child.name.clone(), text);
            for (name, value) in &child.attributes {
                element.set_attribute(name.clone(), value.clone());
            }
            vars.push(element);
        }
    }
    Ok(vars)
}

fn decode_fault(fault: &xmltree::Element, vars: &mut ElementList) {
    for key in ["faultcode", "faultstring"] {
        if let Some(text) = fault.get_child(key).and_then(|e| e.get_text()) {
            vars.push(Element::new(key, text.into_owned()));
        }
    }
    let upnp_error = fault
        .get_child("detail")
        .and_then(|d| d.get_child("UPnPError"));
    if let Some(upnp_error) = upnp_error {
        for key in ["errorCode", "errorDescription"] {
            if let Some(text) = upnp_error.get_child(key).and_then(|e| e.get_text()) {
                vars.push(Element::new(key, text.into_owned()));
            }
        }
    }
}

fn qualified_name(element: &xmltree::Element) -> String {
    match &element.prefix {
        Some(prefix) => format!("{prefix}:{}", element.name),
        None => element.name.clone(),
    }
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

//! Event messages delivered to subscribers.

use serde::{Deserialize, Serialize};

/// Subject text of the status message posted when the handler starts.
pub const HANDLER_STARTED: &str = "STARTED";
/// Subject text of the status message posted when the handler stops.
pub const HANDLER_STOPPED: &str = "STOPPED";
/// Subject text of the status message posted when the handler dies
/// without being asked to stop.
pub const HANDLER_FAILED: &str = "FAILED";

/// Kinds of events a subscriber can register for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Internal: handler lifecycle change (`STARTED`/`STOPPED`/`FAILED`)
    HandlerStatus,
    /// Internal: posted every timer interval without external events
    HandlerTimer,
    /// GENA `upnp:propchange` notification
    UpnpPropChange,
    Unknown,
}

/// One event delivered to subscribers.
///
/// For [`EventKind::UpnpPropChange`] the subject layout is
/// `[SID, SEQ, "PROPERTY", name1, value1, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub kind: EventKind,
    pub subject: Vec<String>,
}

impl EventMessage {
    pub fn status(text: &str) -> Self {
        Self {
            kind: EventKind::HandlerStatus,
            subject: vec![text.to_string()],
        }
    }

    pub fn timer() -> Self {
        Self {
            kind: EventKind::HandlerTimer,
            subject: Vec::new(),
        }
    }

    pub fn propchange(
        sid: impl Into<String>,
        seq: impl Into<String>,
        properties: Vec<(String, String)>,
    ) -> Self {
        let mut subject = vec![sid.into(), seq.into(), "PROPERTY".to_string()];
        for (name, value) in properties {
            subject.push(name);
            subject.push(value);
        }
        Self {
            kind: EventKind::UpnpPropChange,
            subject,
        }
    }

    /// SID of a propchange message.
    pub fn sid(&self) -> Option<&str> {
        match self.kind {
            EventKind::UpnpPropChange => self.subject.first().map(String::as_str),
            _ => None,
        }
    }

    /// SEQ of a propchange message.
    pub fn seq(&self) -> Option<&str> {
        match self.kind {
            EventKind::UpnpPropChange => self.subject.get(1).map(String::as_str),
            _ => None,
        }
    }

    /// Property name/value pairs of a propchange message.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        let pairs = match self.kind {
            EventKind::UpnpPropChange if self.subject.get(2).map(String::as_str) == Some("PROPERTY") => {
                &self.subject[3..]
            }
            _ => &[] as &[String],
        };
        pairs
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| (c[0].as_str(), c[1].as_str()))
    }
}

/// Capability implemented by event consumers.
///
/// The handler holds subscribers as non-owning references; consumers must
/// revoke their registrations before dropping the subscriber.
pub trait EventSubscriber: Send + Sync {
    fn on_event(&self, message: &EventMessage);
}

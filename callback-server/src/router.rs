//! Forwarding of incoming NOTIFY requests.
//!
//! The router is the thin seam between the HTTP layer and the event
//! handler: it validates GENA headers and pushes the raw notification onto
//! a channel. Parsing of the propertyset body happens downstream, after
//! the server has already acknowledged the device.

use tokio::sync::mpsc;
use tracing::warn;

/// One accepted `NOTIFY` request, unparsed.
#[derive(Debug, Clone)]
pub struct NotificationPayload {
    /// Value of the `SID` header
    pub sid: String,
    /// Value of the `SEQ` header, empty when absent
    pub seq: String,
    /// Raw XML event body
    pub body: String,
}

/// Routes accepted notifications to the dispatch channel.
#[derive(Debug, Clone)]
pub struct NotifyRouter {
    notify_tx: mpsc::UnboundedSender<NotificationPayload>,
}

impl NotifyRouter {
    pub fn new(notify_tx: mpsc::UnboundedSender<NotificationPayload>) -> Self {
        Self { notify_tx }
    }

    /// Forward a notification. Returns false when the receiving side is
    /// gone; the device still gets its 200 either way.
    pub fn forward(&self, payload: NotificationPayload) -> bool {
        if self.notify_tx.send(payload).is_err() {
            warn!("notification receiver dropped, discarding event");
            return false;
        }
        true
    }
}

/// Validate GENA notification headers.
///
/// `SID` is required. `NT`/`NTS` are optional on event delivery, but when
/// present they must carry the propchange values.
pub(crate) fn validate_gena_headers(
    sid: Option<&str>,
    nt: Option<&str>,
    nts: Option<&str>,
) -> bool {
    if sid.is_none() {
        return false;
    }
    if let Some(nt) = nt {
        if nt != "upnp:event" {
            return false;
        }
    }
    if let Some(nts) = nts {
        if nts != "upnp:propchange" {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_payloads_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let router = NotifyRouter::new(tx);

        for seq in 0..3 {
            assert!(router.forward(NotificationPayload {
                sid: "uuid:sub-1".to_string(),
                seq: seq.to_string(),
                body: "<e:propertyset/>".to_string(),
            }));
        }

        for seq in 0..3 {
            let payload = rx.recv().await.unwrap();
            assert_eq!(payload.seq, seq.to_string());
        }
    }

    #[tokio::test]
    async fn forward_reports_dropped_receiver() {
        let (tx, rx) = mpsc::unbounded_channel();
        let router = NotifyRouter::new(tx);
        drop(rx);

        assert!(!router.forward(NotificationPayload {
            sid: "uuid:sub-1".to_string(),
            seq: "0".to_string(),
            body: String::new(),
        }));
    }

    #[test]
    fn header_validation() {
        assert!(validate_gena_headers(
            Some("uuid:1"),
            Some("upnp:event"),
            Some("upnp:propchange")
        ));
        assert!(validate_gena_headers(Some("uuid:1"), None, None));
        assert!(!validate_gena_headers(None, None, None));
        assert!(!validate_gena_headers(Some("uuid:1"), Some("wrong"), None));
        assert!(!validate_gena_headers(
            Some("uuid:1"),
            Some("upnp:event"),
            Some("wrong")
        ));
    }
}

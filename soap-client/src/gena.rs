//! GENA subscription verbs.
//!
//! These are plain HTTP requests with the `SUBSCRIBE`/`UNSUBSCRIBE` methods
//! against a service's event URL. A fresh subscribe carries `CALLBACK` and
//! `NT: upnp:event`; a renewal carries only the `SID` issued by the device.

use tracing::debug;

use crate::binding::ServiceBinding;
use crate::error::{Result, SoapError};
use crate::SoapClient;

/// Response from a UPnP subscription request.
#[derive(Debug, Clone)]
pub struct SubscriptionResponse {
    /// Subscription ID returned by the device
    pub sid: String,
    /// Actual timeout granted by the device (in seconds)
    pub timeout_secs: u32,
}

impl SoapClient {
    /// Subscribe to UPnP events on a service.
    ///
    /// `callback_url` is where the device will deliver `NOTIFY` requests,
    /// e.g. `http://192.168.1.10:3400`.
    pub fn subscribe(
        &self,
        binding: &ServiceBinding,
        callback_url: &str,
        timeout_secs: u32,
    ) -> Result<SubscriptionResponse> {
        let url = binding.event_url();
        let host = binding.endpoint.host_header();
        let callback = format!("<{callback_url}>");
        let timeout = format!("Second-{timeout_secs}");

        let response = self
            .retrying_call(|agent| {
                agent
                    .request("SUBSCRIBE", &url)
                    .set("HOST", &host)
                    .set("CALLBACK", &callback)
                    .set("NT", "upnp:event")
                    .set("TIMEOUT", &timeout)
            })
            .map_err(subscription_error)?;

        let granted = decode_subscription(&response, timeout_secs)?;
        debug!(%url, sid = %granted.sid, timeout = granted.timeout_secs, "subscribed");
        Ok(granted)
    }

    /// Renew an existing subscription.
    ///
    /// A `412 Precondition Failed` means the device no longer knows the SID;
    /// the caller must fall back to a fresh [`SoapClient::subscribe`].
    pub fn renew(
        &self,
        binding: &ServiceBinding,
        sid: &str,
        timeout_secs: u32,
    ) -> Result<SubscriptionResponse> {
        let url = binding.event_url();
        let host = binding.endpoint.host_header();
        let timeout = format!("Second-{timeout_secs}");

        let response = self
            .retrying_call(|agent| {
                agent
                    .request("SUBSCRIBE", &url)
                    .set("HOST", &host)
                    .set("SID", sid)
                    .set("TIMEOUT", &timeout)
            })
            .map_err(subscription_error)?;

        // Devices are not required to echo the SID on renewal.
        let granted_timeout = parse_timeout(response.header("TIMEOUT")).unwrap_or(timeout_secs);
        let granted_sid = response.header("SID").unwrap_or(sid).to_string();
        debug!(%url, sid = %granted_sid, timeout = granted_timeout, "subscription renewed");
        Ok(SubscriptionResponse {
            sid: granted_sid,
            timeout_secs: granted_timeout,
        })
    }

    /// Cancel a subscription.
    pub fn unsubscribe(&self, binding: &ServiceBinding, sid: &str) -> Result<()> {
        let url = binding.event_url();
        let host = binding.endpoint.host_header();

        self.retrying_call(|agent| {
            agent
                .request("UNSUBSCRIBE", &url)
                .set("HOST", &host)
                .set("SID", sid)
        })
        .map_err(subscription_error)?;

        debug!(%url, %sid, "unsubscribed");
        Ok(())
    }
}

fn decode_subscription(
    response: &ureq::Response,
    requested_timeout: u32,
) -> Result<SubscriptionResponse> {
    let sid = response
        .header("SID")
        .ok_or_else(|| SoapError::Subscription("missing SID header".to_string()))?
        .to_string();
    let timeout_secs = parse_timeout(response.header("TIMEOUT")).unwrap_or(requested_timeout);
    Ok(SubscriptionResponse { sid, timeout_secs })
}

/// Parse a GENA `TIMEOUT` header of the form `Second-1800`.
fn parse_timeout(header: Option<&str>) -> Option<u32> {
    header?.strip_prefix("Second-")?.parse().ok()
}

fn subscription_error(error: ureq::Error) -> SoapError {
    match error {
        ureq::Error::Status(412, _) => SoapError::Precondition,
        ureq::Error::Status(code, _) => {
            SoapError::Subscription(format!("device answered HTTP {code}"))
        }
        ureq::Error::Transport(transport) => SoapError::Network(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_timeout_header() {
        assert_eq!(parse_timeout(Some("Second-1800")), Some(1800));
        assert_eq!(parse_timeout(Some("Second-90")), Some(90));
        assert_eq!(parse_timeout(Some("infinite")), None);
        assert_eq!(parse_timeout(Some("Second-abc")), None);
        assert_eq!(parse_timeout(None), None);
    }
}

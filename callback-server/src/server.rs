//! HTTP server for receiving UPnP event notifications.
//!
//! A single listener accepts every request on the callback port. Routing is
//! by method: `NOTIFY` is validated and forwarded to the notification
//! channel, `SUBSCRIBE`/`UNSUBSCRIBE` are acknowledged, and anything else
//! is offered to the registered request brokers. Unclaimed routes get a
//! `404`.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use warp::http::{HeaderMap, Method, Response, StatusCode};
use warp::path::FullPath;
use warp::Filter;

use crate::broker::{BrokerRegistry, BrokerRequest};
use crate::error::{Result, ServerError};
use crate::router::{validate_gena_headers, NotificationPayload, NotifyRouter};

/// HTTP callback server for GENA notifications and broker routes.
pub struct CallbackServer {
    port: u16,
    local_ip: IpAddr,
    base_url: String,
    brokers: Arc<BrokerRegistry>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    server_handle: Option<JoinHandle<()>>,
}

impl CallbackServer {
    /// Bind the server and start serving.
    ///
    /// `binding_port` 0 binds an ephemeral port; the actual port is
    /// reported by [`CallbackServer::port`]. Accepted notifications are
    /// pushed onto `notify_tx` in acceptance order.
    pub async fn bind(
        binding_port: u16,
        notify_tx: mpsc::UnboundedSender<NotificationPayload>,
    ) -> Result<Self> {
        let brokers = Arc::new(BrokerRegistry::new());
        let router = NotifyRouter::new(notify_tx);

        let route_brokers = brokers.clone();
        let routes = warp::filters::method::method()
            .and(warp::path::full())
            .and(warp::header::headers_cloned())
            .and(warp::body::bytes())
            .and_then(move |method, path, headers, body| {
                let router = router.clone();
                let brokers = route_brokers.clone();
                async move {
                    Ok::<_, warp::Rejection>(
                        handle_request(method, path, headers, body, router, brokers).await,
                    )
                }
            });

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), binding_port);
        let (bound, server) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(addr, async move {
                shutdown_rx.recv().await;
            })
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        let server_handle = tokio::spawn(server);
        let local_ip = detect_local_ip().unwrap_or_else(|| {
            warn!("could not detect a routable local IP, falling back to loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        });
        let base_url = format!("http://{}:{}", local_ip, bound.port());
        info!(%base_url, "callback server listening");

        Ok(Self {
            port: bound.port(),
            local_ip,
            base_url,
            brokers,
            shutdown_tx: Some(shutdown_tx),
            server_handle: Some(server_handle),
        })
    }

    /// The base URL devices should deliver callbacks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Local IP address reachable from the network.
    pub fn local_ip(&self) -> IpAddr {
        self.local_ip
    }

    /// Registry of pluggable request brokers.
    pub fn brokers(&self) -> &Arc<BrokerRegistry> {
        &self.brokers
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }

    /// Stop serving. Idempotent; waits for in-flight requests to finish.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.server_handle.take() {
            let _ = handle.await;
            info!(port = self.port, "callback server stopped");
        }
    }
}

async fn handle_request(
    method: Method,
    path: FullPath,
    headers: HeaderMap,
    body: Bytes,
    router: NotifyRouter,
    brokers: Arc<BrokerRegistry>,
) -> Response<Vec<u8>> {
    match method.as_str() {
        "NOTIFY" => handle_notify(path, headers, body, router),
        // The handler side owns GENA semantics; the server only
        // acknowledges subscription management traffic aimed at it.
        "SUBSCRIBE" | "UNSUBSCRIBE" => plain_response(StatusCode::OK, Vec::new()),
        _ => {
            let request = BrokerRequest {
                method: method.as_str().to_string(),
                uri: path.as_str().to_string(),
                headers: headers
                    .iter()
                    .map(|(n, v)| {
                        (
                            n.as_str().to_string(),
                            String::from_utf8_lossy(v.as_bytes()).into_owned(),
                        )
                    })
                    .collect(),
                body,
            };
            match brokers.dispatch(&request).await {
                Some(reply) => {
                    let status = StatusCode::from_u16(reply.status)
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    let mut response = plain_response(status, reply.body);
                    if let Ok(value) = reply.content_type.parse() {
                        response.headers_mut().insert("Content-Type", value);
                    }
                    response
                }
                None => plain_response(StatusCode::NOT_FOUND, b"not found".to_vec()),
            }
        }
    }
}

fn handle_notify(
    path: FullPath,
    headers: HeaderMap,
    body: Bytes,
    router: NotifyRouter,
) -> Response<Vec<u8>> {
    let sid = header_str(&headers, "SID");
    let nt = header_str(&headers, "NT");
    let nts = header_str(&headers, "NTS");

    if !validate_gena_headers(sid, nt, nts) {
        debug!(path = path.as_str(), "rejecting NOTIFY with invalid headers");
        return plain_response(StatusCode::BAD_REQUEST, b"invalid GENA headers".to_vec());
    }

    let payload = NotificationPayload {
        sid: sid.unwrap_or_default().to_string(),
        seq: header_str(&headers, "SEQ").unwrap_or_default().to_string(),
        body: String::from_utf8_lossy(&body).into_owned(),
    };
    debug!(sid = %payload.sid, seq = %payload.seq, "accepted NOTIFY");
    router.forward(payload);

    // 200 goes out as soon as this returns; dispatch happens on the
    // handler's own task.
    plain_response(StatusCode::OK, Vec::new())
}

fn header_str<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn plain_response(status: StatusCode, body: Vec<u8>) -> Response<Vec<u8>> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    response
}

/// Detect the local IP address used for outbound traffic.
///
/// Connects a UDP socket towards a public address to read the kernel's
/// route choice. No packet is sent.
fn detect_local_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}

//! The per-service subscription loop.

use std::net::{IpAddr, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use soap_client::{ServiceBinding, SoapClient};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};

/// Backoff between attempts after a failed configure/subscribe cycle.
pub const TIMEOUT_RETRY: Duration = Duration::from_secs(1);

/// A renewal is scheduled at 0.9 of the granted timeout.
const RENEWAL_RATIO_MILLIS: u64 = 900;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const SHUTDOWN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a subscription engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Subscription timeout requested from the device (seconds)
    /// Default: 1800
    pub timeout_secs: u32,

    /// Wait between retries after a failed cycle
    /// Default: 1 second
    pub retry_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 1800,
            retry_interval: TIMEOUT_RETRY,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u32) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(EngineError::Configuration(
                "subscription timeout must be greater than 0".to_string(),
            ));
        }
        if self.retry_interval.is_zero() {
            return Err(EngineError::Configuration(
                "retry interval must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct EngineState {
    sid: String,
    local_ip: Option<IpAddr>,
    renewable: bool,
    configured: bool,
}

#[derive(Debug)]
enum Control {
    Renew,
    Stop,
}

#[derive(Debug, PartialEq, Eq)]
enum SubscribeMode {
    Renew,
    Fresh,
}

/// Keeps one GENA subscription alive for one (service, event path).
///
/// The engine owns a background task that configures the local callback
/// address, subscribes, renews at 0.9 of the granted timeout, and backs
/// off one [`TIMEOUT_RETRY`] on failure. When the local IP changes between
/// cycles the device's stored callback URL is stale, so the engine
/// subscribes from scratch instead of renewing. Stopping attempts one
/// best-effort `UNSUBSCRIBE`.
pub struct SubscriptionEngine {
    state: Arc<Mutex<EngineState>>,
    control_tx: mpsc::Sender<Control>,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionEngine {
    /// Spawn the renewal task.
    ///
    /// `binding_port` is the local callback server port announced to the
    /// device in the `CALLBACK` header.
    pub fn start(
        client: SoapClient,
        binding: ServiceBinding,
        binding_port: u16,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(Mutex::new(EngineState::default()));
        let (control_tx, control_rx) = mpsc::channel(4);
        let task = tokio::spawn(run(
            client,
            binding,
            binding_port,
            config,
            state.clone(),
            control_rx,
        ));
        Ok(Self {
            state,
            control_tx,
            task: Some(task),
        })
    }

    /// Current SID, empty while not subscribed.
    pub fn sid(&self) -> String {
        self.state.lock().unwrap().sid.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        !self.state.lock().unwrap().sid.is_empty()
    }

    /// Whether the local callback address has been resolved.
    pub fn is_configured(&self) -> bool {
        self.state.lock().unwrap().configured
    }

    /// Local IP the device can reach us on.
    pub fn local_ip(&self) -> Option<IpAddr> {
        self.state.lock().unwrap().local_ip
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Drop the current subscription and subscribe from scratch on the
    /// next cycle.
    pub async fn ask_renewal(&self) {
        let _ = self.control_tx.send(Control::Renew).await;
    }

    /// Stop the renewal task, unsubscribing best-effort. Idempotent; joins
    /// the task with a bounded wait.
    pub async fn stop(&mut self) {
        let _ = self.control_tx.send(Control::Stop).await;
        if let Some(task) = self.task.take() {
            match timeout(SHUTDOWN_JOIN_TIMEOUT, task).await {
                Ok(Ok(())) => info!("subscription engine stopped"),
                Ok(Err(e)) => warn!("subscription task panicked: {e}"),
                Err(_) => warn!("subscription task did not stop in time"),
            }
        }
    }
}

async fn run(
    client: SoapClient,
    binding: ServiceBinding,
    binding_port: u16,
    config: EngineConfig,
    state: Arc<Mutex<EngineState>>,
    mut control_rx: mpsc::Receiver<Control>,
) {
    let mut subscribed = false;
    loop {
        // Reconfigure every cycle: the local IP may be leased for a time.
        let granted = if configure(&binding, &state).await {
            subscribe(&client, &binding, binding_port, &config, &state, subscribed).await
        } else {
            None
        };
        subscribed = granted.is_some();

        let wait = match granted {
            Some(timeout_secs) => Duration::from_millis(u64::from(timeout_secs) * RENEWAL_RATIO_MILLIS),
            None => config.retry_interval,
        };
        tokio::select! {
            command = control_rx.recv() => match command {
                Some(Control::Renew) => {
                    // drop the SID so the next cycle subscribes fresh
                    unsubscribe(&client, &binding, &state).await;
                    subscribed = false;
                }
                Some(Control::Stop) | None => break,
            },
            _ = tokio::time::sleep(wait) => {}
        }
    }
    if subscribed {
        unsubscribe(&client, &binding, &state).await;
    }
}

/// Resolve the local IP the device reaches us on by opening a TCP
/// connection to it and reading the bound local address.
///
/// Renewal only stays valid while that address is unchanged; a changed
/// address invalidates the callback URL stored on the device.
async fn configure(binding: &ServiceBinding, state: &Arc<Mutex<EngineState>>) -> bool {
    let host = binding.endpoint.host.clone();
    let port = binding.endpoint.port;
    let probed = tokio::task::spawn_blocking(move || probe_local_ip(&host, port))
        .await
        .ok()
        .flatten();

    let mut st = state.lock().unwrap();
    match probed {
        Some(ip) => {
            st.renewable = st.local_ip == Some(ip);
            st.local_ip = Some(ip);
            st.configured = true;
            true
        }
        None => {
            st.local_ip = None;
            st.renewable = false;
            st.configured = false;
            false
        }
    }
}

fn probe_local_ip(host: &str, port: u16) -> Option<IpAddr> {
    let addrs = (host, port).to_socket_addrs().ok()?;
    for addr in addrs {
        if let Ok(stream) = TcpStream::connect_timeout(&addr, PROBE_TIMEOUT) {
            return stream.local_addr().ok().map(|a| a.ip());
        }
    }
    None
}

fn subscribe_mode(renew: bool, renewable: bool, sid: &str) -> SubscribeMode {
    if renew && renewable && !sid.is_empty() {
        SubscribeMode::Renew
    } else {
        SubscribeMode::Fresh
    }
}

/// One subscribe attempt. Returns the granted timeout on success.
async fn subscribe(
    client: &SoapClient,
    binding: &ServiceBinding,
    binding_port: u16,
    config: &EngineConfig,
    state: &Arc<Mutex<EngineState>>,
    renew: bool,
) -> Option<u32> {
    let (renewable, sid, local_ip) = {
        let st = state.lock().unwrap();
        (st.renewable, st.sid.clone(), st.local_ip)
    };
    let timeout_secs = config.timeout_secs;
    let client = client.clone();
    let binding_clone = binding.clone();

    let outcome = match subscribe_mode(renew, renewable, &sid) {
        SubscribeMode::Renew => {
            debug!(%sid, "renewing subscription");
            tokio::task::spawn_blocking(move || {
                client.renew(&binding_clone, &sid, timeout_secs)
            })
            .await
        }
        SubscribeMode::Fresh => {
            let callback_url = format!("http://{}:{}", local_ip?, binding_port);
            debug!(%callback_url, "subscribing");
            tokio::task::spawn_blocking(move || {
                client.subscribe(&binding_clone, &callback_url, timeout_secs)
            })
            .await
        }
    };

    match outcome {
        Ok(Ok(response)) => {
            let mut st = state.lock().unwrap();
            st.sid = response.sid;
            Some(response.timeout_secs)
        }
        Ok(Err(e)) => {
            warn!(event_url = %binding.event_url(), "subscription attempt failed: {e}");
            None
        }
        Err(e) => {
            warn!("subscription task failed to run: {e}");
            None
        }
    }
}

/// Best-effort UNSUBSCRIBE; always clears the stored SID.
async fn unsubscribe(client: &SoapClient, binding: &ServiceBinding, state: &Arc<Mutex<EngineState>>) {
    let sid = {
        let mut st = state.lock().unwrap();
        std::mem::take(&mut st.sid)
    };
    if sid.is_empty() {
        return;
    }
    let client = client.clone();
    let binding = binding.clone();
    let result = tokio::task::spawn_blocking(move || client.unsubscribe(&binding, &sid)).await;
    if let Ok(Err(e)) = result {
        debug!("unsubscribe failed: {e}");
    }
}

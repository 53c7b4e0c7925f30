use tracing::{debug, info, trace, warn};

use super::link::BrokerLink;

/// Connection lifecycle, owned exclusively by the manager and mutated only
/// from the single run-loop task.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Running totals for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConnectivityStatus {
    pub messages_received: usize,
    pub messages_sent: usize,
}

/// Owns the broker session lifecycle on top of a [`BrokerLink`].
///
/// State machine: `Disconnected → (attempt) → Connecting → (success) →
/// Connected → (session error) → Disconnected`. The manager never paces its
/// own reconnects; the scheduler holds the retry timer and calls
/// [`attempt_connect`](Self::attempt_connect) when one is due.
pub struct ConnectivityManager {
    state: ConnectionState,
    link: Box<dyn BrokerLink>,
    status: ConnectivityStatus,
}

impl ConnectivityManager {
    pub fn new(link: Box<dyn BrokerLink>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            link,
            status: ConnectivityStatus::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn status(&self) -> ConnectivityStatus {
        self.status
    }

    /// One bounded connect attempt. Failure leaves the state `Disconnected`;
    /// pacing between attempts is the caller's concern.
    pub async fn attempt_connect(&mut self) -> bool {
        self.state = ConnectionState::Connecting;
        match self.link.connect().await {
            Ok(()) => {
                info!("broker connected");
                self.state = ConnectionState::Connected;
                true
            }
            Err(e) => {
                warn!("broker connect failed: {}", e);
                self.state = ConnectionState::Disconnected;
                false
            }
        }
    }

    /// Services the session once and returns the inbound payloads it
    /// delivered. The only path by which messages enter the bridge. A
    /// session error drops back to `Disconnected`; the loop retries later.
    pub async fn tick(&mut self) -> Vec<Vec<u8>> {
        if !self.is_connected() {
            return Vec::new();
        }
        match self.link.drive().await {
            Ok(inbound) => {
                self.status.messages_received += inbound.len();
                inbound
            }
            Err(e) => {
                warn!(
                    "broker connection lost ({} in / {} out this session): {}",
                    self.status.messages_received, self.status.messages_sent, e
                );
                self.link.disconnect();
                self.state = ConnectionState::Disconnected;
                Vec::new()
            }
        }
    }

    /// Best-effort, at-most-once publish. A silent no-op while disconnected:
    /// received codes are never queued for later.
    pub fn publish(&mut self, topic: &str, payload: Vec<u8>) {
        if !self.is_connected() {
            trace!("not connected, dropping outbound message");
            return;
        }
        match self.link.publish(topic, payload) {
            Ok(()) => {
                self.status.messages_sent += 1;
                debug!("published to {}", topic);
            }
            Err(e) => warn!("publish to {} failed: {}", topic, e),
        }
    }
}

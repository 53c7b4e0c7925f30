use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::config::MqttConfig;

/// Per-iteration budget for servicing the session. Keeps one loop iteration
/// short enough that IR capture polling never starves.
const DRAIN_BUDGET: Duration = Duration::from_millis(5);

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("connect attempt timed out")]
    Timeout,

    #[error("broker refused connection: {0}")]
    Refused(String),

    #[error("connection error: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("not connected")]
    NotConnected,
}

/// Raw broker session primitives, one implementation per transport.
///
/// The trait exists so the connection state machine and the run loop can be
/// exercised against an in-memory link; the bridge itself runs
/// [`MqttBrokerLink`].
#[async_trait]
pub trait BrokerLink: Send {
    /// Establishes a fresh session and subscribes to the command topic.
    /// Bounded: returns within the configured connect window.
    async fn connect(&mut self) -> Result<(), ConnectivityError>;

    /// Services keep-alive and returns the payloads the broker delivered
    /// since the last call. An error here means the session is gone.
    async fn drive(&mut self) -> Result<Vec<Vec<u8>>, ConnectivityError>;

    /// Non-blocking, at-most-once publish.
    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectivityError>;

    /// Drops any session state.
    fn disconnect(&mut self);
}

/// rumqttc-backed broker session.
///
/// Every connect attempt builds a fresh client and event loop; rumqttc's own
/// reconnect behavior stays out of the picture so the state machine above is
/// the single owner of connection state.
pub struct MqttBrokerLink {
    config: MqttConfig,
    session: Option<(AsyncClient, EventLoop)>,
}

impl MqttBrokerLink {
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }
}

#[async_trait]
impl BrokerLink for MqttBrokerLink {
    async fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.session = None;

        let mut options = MqttOptions::new(
            self.config.client_id.clone(),
            self.config.host.clone(),
            self.config.port,
        );
        options.set_keep_alive(Duration::from_secs(self.config.keep_alive_secs));
        if !self.config.username.is_empty() {
            options.set_credentials(self.config.username.clone(), self.config.password.clone());
        }

        let (client, mut eventloop) = AsyncClient::new(options, 100);

        let deadline = Instant::now() + Duration::from_millis(self.config.connect_timeout_ms);
        loop {
            let event = tokio::time::timeout_at(deadline, eventloop.poll())
                .await
                .map_err(|_| ConnectivityError::Timeout)??;
            match event {
                Event::Incoming(Packet::ConnAck(ack)) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    return Err(ConnectivityError::Refused(format!("{:?}", ack.code)));
                }
                other => trace!("ignoring {:?} while connecting", other),
            }
        }

        client
            .subscribe(self.config.command_topic.clone(), QoS::AtMostOnce)
            .await?;
        debug!(
            "session established with {}:{}, subscribed to {}",
            self.config.host, self.config.port, self.config.command_topic
        );
        self.session = Some((client, eventloop));
        Ok(())
    }

    async fn drive(&mut self) -> Result<Vec<Vec<u8>>, ConnectivityError> {
        let Some((_, eventloop)) = self.session.as_mut() else {
            return Ok(Vec::new());
        };

        let mut inbound = Vec::new();
        let mut session_error = None;
        let deadline = Instant::now() + DRAIN_BUDGET;
        loop {
            match tokio::time::timeout_at(deadline, eventloop.poll()).await {
                Err(_) => break,
                Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => {
                    inbound.push(publish.payload.to_vec());
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    session_error = Some(e);
                    break;
                }
            }
        }

        if let Some(e) = session_error {
            self.session = None;
            return Err(e.into());
        }
        Ok(inbound)
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), ConnectivityError> {
        let Some((client, _)) = self.session.as_ref() else {
            return Err(ConnectivityError::NotConnected);
        };
        client.try_publish(topic, QoS::AtMostOnce, false, payload)?;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.session = None;
    }
}

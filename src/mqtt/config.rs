use serde::{Deserialize, Serialize};

/// Broker endpoint, credentials and the two bridge topics.
///
/// `command_topic` carries inbound transmit requests, `event_topic` the
/// codes received over the air.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub command_topic: String,
    pub event_topic: String,
    pub keep_alive_secs: u64,
    /// Window granted to one connect attempt before it counts as failed.
    pub connect_timeout_ms: u64,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            username: String::new(),
            password: String::new(),
            client_id: "irblaster".to_string(),
            command_topic: "irblaster/tx".to_string(),
            event_topic: "irblaster/rx".to_string(),
            keep_alive_secs: 5,
            connect_timeout_ms: 3000,
        }
    }
}

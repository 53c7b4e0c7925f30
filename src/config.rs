use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::mqtt::MqttConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("parsing {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// How dispatch-level drops (unrecognized protocol, non-hex code, malformed
/// payload) are reported.
///
/// `Silent` preserves the quiet behavior the bridge has always had; `Log`
/// surfaces every drop at warn level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    Silent,
    #[default]
    Log,
}

/// IR hardware assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IrConfig {
    /// BCM pin the demodulator output is wired to.
    pub rx_pin: u8,
    /// PWM channel driving the transmit LED (0 or 1).
    pub tx_pwm_channel: u8,
    pub carrier_hz: u32,
    pub duty_cycle: f64,
    /// Silence that ends a capture, in milliseconds.
    pub frame_gap_ms: u64,
}

impl Default for IrConfig {
    fn default() -> Self {
        Self {
            rx_pin: 23,
            tx_pwm_channel: 0,
            carrier_hz: 38_000,
            duty_cycle: 0.33,
            frame_gap_ms: 20,
        }
    }
}

/// Loop timing and policy knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub loop_interval_ms: u64,
    pub reconnect_interval_secs: u64,
    pub max_payload_len: usize,
    pub error_policy: ErrorPolicy,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            loop_interval_ms: 10,
            reconnect_interval_secs: 5,
            max_payload_len: 200,
            error_policy: ErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub mqtt: MqttConfig,
    pub ir: IrConfig,
    pub runtime: RuntimeConfig,
    /// Marker file the deployment tooling creates while updating.
    pub update_marker: Option<PathBuf>,
}

impl BridgeConfig {
    /// Loads configuration from `path`, or from the default location when
    /// none is given. A missing default file means defaults; a missing
    /// explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    info!(
                        "no configuration file at {}, using defaults",
                        path.display()
                    );
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("irbridge")
            .join("config.toml")
    }

    pub fn marker_path(&self) -> PathBuf {
        self.update_marker
            .clone()
            .unwrap_or_else(|| PathBuf::from("/run/irbridge/update"))
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_the_deployed_bridge() {
        let config = BridgeConfig::default();
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.mqtt.command_topic, "irblaster/tx");
        assert_eq!(config.mqtt.event_topic, "irblaster/rx");
        assert_eq!(config.mqtt.keep_alive_secs, 5);
        assert_eq!(config.runtime.reconnect_interval_secs, 5);
        assert_eq!(config.runtime.max_payload_len, 200);
        assert_eq!(config.runtime.error_policy, ErrorPolicy::Log);
        assert_eq!(config.ir.carrier_hz, 38_000);
        assert_eq!(config.marker_path(), PathBuf::from("/run/irbridge/update"));
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                [mqtt]
                host = "10.0.0.2"
                username = "homeassistant"
                password = "hunter2"

                [runtime]
                error_policy = "silent"

                [ir]
                rx_pin = 17
            "#,
        )
        .unwrap();

        let config = BridgeConfig::load(Some(&path)).unwrap();
        assert_eq!(config.mqtt.host, "10.0.0.2");
        assert_eq!(config.mqtt.username, "homeassistant");
        // untouched sections keep their defaults
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.runtime.error_policy, ErrorPolicy::Silent);
        assert_eq!(config.ir.rx_pin, 17);
        assert_eq!(config.ir.tx_pwm_channel, 0);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let result = BridgeConfig::load(Some(Path::new("/nonexistent/irbridge.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mqtt = \"not a table\"").unwrap();
        assert!(matches!(
            BridgeConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}

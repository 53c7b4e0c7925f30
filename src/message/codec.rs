use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on inbound payload size, in bytes. Command messages are tiny;
/// anything larger is not one of ours.
pub const DEFAULT_MAX_PAYLOAD: usize = 200;

/// The two-field command payload exchanged over both topics.
///
/// Both fields default to empty when absent: a missing field is not a parse
/// error, it just makes the message a no-op downstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type", default)]
    pub protocol: String,

    #[serde(default)]
    pub code: String,
}

impl CommandMessage {
    pub fn new(protocol: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            code: code.into(),
        }
    }

    /// A message is actionable only when both fields are present.
    pub fn is_complete(&self) -> bool {
        !self.protocol.is_empty() && !self.code.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload of {len} bytes exceeds the {limit} byte limit")]
    Oversized { len: usize, limit: usize },

    #[error("malformed command payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parses and renders command messages with a hard input-size bound.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    max_payload: usize,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self {
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl MessageCodec {
    pub fn new(max_payload: usize) -> Self {
        Self { max_payload }
    }

    /// Parses one complete inbound payload. Oversized or malformed input is
    /// an error for the caller to log and drop, never a panic.
    pub fn parse(&self, payload: &[u8]) -> Result<CommandMessage, CodecError> {
        if payload.len() > self.max_payload {
            return Err(CodecError::Oversized {
                len: payload.len(),
                limit: self.max_payload,
            });
        }
        Ok(serde_json::from_slice(payload)?)
    }

    /// Renders an outbound message. Succeeds for any structurally valid
    /// message.
    pub fn serialize(&self, message: &CommandMessage) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(message)?)
    }
}

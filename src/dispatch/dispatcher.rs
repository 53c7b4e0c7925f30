use thiserror::Error;
use tracing::debug;

use crate::ir::{DecodedIrEvent, IrError, IrProtocol, IrTransmitter, PulseTrain};
use crate::message::CommandMessage;

use super::registry::{parse_hex, ProtocolLabel, ProtocolRegistry};

/// What became of one inbound command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Recognized and sent out over IR.
    Transmitted { protocol: IrProtocol, value: u32 },
    /// Missing `type` or `code`; not an error, just nothing to do.
    Incomplete,
    /// The `type` names no registered protocol.
    UnknownProtocol,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid hex code {code:?} for {protocol}")]
    InvalidCode { protocol: IrProtocol, code: String },

    #[error("transmit failed: {0}")]
    Transmit(#[from] IrError),
}

/// Maps inbound command messages to transmit calls and decoded IR events to
/// outbound command messages.
pub struct CommandDispatcher {
    registry: ProtocolRegistry,
    transmitter: Box<dyn IrTransmitter>,
}

impl CommandDispatcher {
    pub fn new(registry: ProtocolRegistry, transmitter: Box<dyn IrTransmitter>) -> Self {
        Self {
            registry,
            transmitter,
        }
    }

    /// Handles one inbound command message.
    ///
    /// A recognized protocol with a valid hex code produces exactly one
    /// transmit call; everything else is a structured no-op the caller
    /// reports according to its error policy.
    pub fn dispatch(&mut self, message: &CommandMessage) -> Result<Dispatch, DispatchError> {
        if !message.is_complete() {
            return Ok(Dispatch::Incomplete);
        }

        let codec = match IrProtocol::from_name(&message.protocol)
            .and_then(|protocol| self.registry.codec_for(protocol))
        {
            Some(codec) => codec,
            None => return Ok(Dispatch::UnknownProtocol),
        };
        let protocol = codec.protocol();

        let Some(value) = parse_hex(&message.code) else {
            return Err(DispatchError::InvalidCode {
                protocol,
                code: message.code.clone(),
            });
        };
        let train = codec.encode(value);
        debug!("transmitting {} 0x{:X}", protocol, value);
        self.transmitter.transmit(&train)?;
        Ok(Dispatch::Transmitted { protocol, value })
    }

    /// Decodes a captured pulse train against the registry.
    pub fn decode(&self, train: &PulseTrain) -> Option<DecodedIrEvent> {
        self.registry.decode(train)
    }

    /// Formats a decoded IR event as the outbound command message.
    pub fn describe(&self, event: &DecodedIrEvent) -> CommandMessage {
        CommandMessage::new(
            ProtocolLabel::from(event).to_string(),
            format!("{:X}", event.value),
        )
    }
}

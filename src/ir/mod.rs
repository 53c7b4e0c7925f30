//! Infrared signaling layer: pulse trains, protocol codecs and the
//! hardware seams for receiving and transmitting them.
//!
//! ```text
//! ir/
//! ├── nec.rs     - NEC 32-bit pulse-distance codec
//! ├── capture.rs - edge accumulation and capture hand-off to the run loop
//! └── gpio.rs    - rppal-backed receiver and transmitter drivers
//! ```
//!
//! A [`PulseTrain`] is the physical-layer representation of one IR frame:
//! alternating mark/space durations in microseconds, starting with a mark.
//! Protocol codecs translate between pulse trains and numeric command values;
//! everything above this module works with [`IrProtocol`] tags and `u32`
//! values only.

pub mod capture;
pub mod gpio;
pub mod nec;

use std::fmt;

use thiserror::Error;

/// Errors from the IR hardware drivers.
#[derive(Debug, Error)]
pub enum IrError {
    #[error("gpio: {0}")]
    Gpio(#[from] rppal::gpio::Error),

    #[error("pwm: {0}")]
    Pwm(#[from] rppal::pwm::Error),

    #[error("unsupported pwm channel {0}, expected 0 or 1")]
    PwmChannel(u8),

    #[error("receiver: {0}")]
    Receiver(String),
}

/// Identifier for a supported IR protocol family.
///
/// Closed set by design: adding a protocol means adding a variant here and a
/// codec for it in the dispatch registry, not extending a string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrProtocol {
    /// The 32-bit NEC pulse-distance format.
    Nec,
}

impl IrProtocol {
    /// Resolves the wire-level protocol name used in command messages.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("nec") {
            Some(IrProtocol::Nec)
        } else {
            None
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            IrProtocol::Nec => "NEC",
        }
    }
}

impl fmt::Display for IrProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One IR frame at the physical layer: alternating mark/space durations in
/// microseconds, starting with a mark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PulseTrain {
    durations: Vec<u32>,
}

impl PulseTrain {
    pub fn new(durations: Vec<u32>) -> Self {
        Self { durations }
    }

    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }
}

/// A command decoded from a received pulse train.
///
/// Created once per successful capture decode, serialized into an outbound
/// message right away and then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedIrEvent {
    pub protocol: IrProtocol,
    pub repeat: bool,
    pub value: u32,
}

/// Codec for one protocol family: numeric command value to pulse train and
/// back.
pub trait ProtocolCodec: Send {
    fn protocol(&self) -> IrProtocol;

    /// Encodes a command value into the pulse train that transmits it.
    fn encode(&self, value: u32) -> PulseTrain;

    /// Attempts to decode a captured pulse train. Returns the command value
    /// and whether the frame was a repeat marker.
    fn decode(&self, train: &PulseTrain) -> Option<(u32, bool)>;
}

/// Source of completed IR captures, polled once per loop iteration.
///
/// A receiver hands out at most one capture per arm cycle: after `poll`
/// returns a capture, nothing further is delivered until `rearm` is called.
pub trait IrReceiver: Send {
    fn poll(&mut self) -> Option<capture::Capture>;

    fn rearm(&mut self);
}

/// Sink for pulse trains on the transmit path.
pub trait IrTransmitter: Send {
    fn transmit(&mut self, train: &PulseTrain) -> Result<(), IrError>;
}

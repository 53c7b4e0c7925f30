use std::fmt;
use std::str::FromStr;

use crate::ir::nec::NecCodec;
use crate::ir::{DecodedIrEvent, IrProtocol, ProtocolCodec, PulseTrain};

/// Registry of the protocol codecs the bridge speaks.
///
/// Lookup goes through [`IrProtocol`] tags; the set of protocols is closed at
/// compile time and this is the single place a new codec gets registered.
pub struct ProtocolRegistry {
    codecs: Vec<Box<dyn ProtocolCodec>>,
}

impl ProtocolRegistry {
    /// The standard registry: NEC only.
    pub fn standard() -> Self {
        Self {
            codecs: vec![Box::new(NecCodec)],
        }
    }

    pub fn codec_for(&self, protocol: IrProtocol) -> Option<&dyn ProtocolCodec> {
        self.codecs
            .iter()
            .find(|c| c.protocol() == protocol)
            .map(|c| c.as_ref())
    }

    /// Tries every registered codec against a captured pulse train.
    pub fn decode(&self, train: &PulseTrain) -> Option<DecodedIrEvent> {
        self.codecs.iter().find_map(|codec| {
            codec.decode(train).map(|(value, repeat)| DecodedIrEvent {
                protocol: codec.protocol(),
                repeat,
                value,
            })
        })
    }
}

/// Human-readable protocol name with the repeat flag folded in, as carried
/// in the `type` field of outbound messages: `NEC` or `NEC (repeat)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolLabel {
    pub protocol: IrProtocol,
    pub repeat: bool,
}

impl From<&DecodedIrEvent> for ProtocolLabel {
    fn from(event: &DecodedIrEvent) -> Self {
        Self {
            protocol: event.protocol,
            repeat: event.repeat,
        }
    }
}

impl fmt::Display for ProtocolLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.repeat {
            write!(f, "{} (repeat)", self.protocol)
        } else {
            write!(f, "{}", self.protocol)
        }
    }
}

impl FromStr for ProtocolLabel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, repeat) = match s.strip_suffix(" (repeat)") {
            Some(name) => (name, true),
            None => (s, false),
        };
        IrProtocol::from_name(name)
            .map(|protocol| Self { protocol, repeat })
            .ok_or(())
    }
}

/// Parses the `code` field as an unsigned hexadecimal value, tolerating an
/// optional `0x` prefix.
pub fn parse_hex(code: &str) -> Option<u32> {
    let digits = code
        .trim()
        .strip_prefix("0x")
        .or_else(|| code.trim().strip_prefix("0X"))
        .unwrap_or_else(|| code.trim());
    u32::from_str_radix(digits, 16).ok()
}

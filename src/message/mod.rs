//! Wire format of the bridge's command messages.
//!
//! Inbound and outbound payloads share one shape: a two-field JSON object
//! `{"type": "...", "code": "..."}`. Parsing and rendering live in
//! [`codec`]; nothing here knows about topics or transports.

pub mod codec;

#[cfg(test)]
mod tests;

pub use codec::{CodecError, CommandMessage, MessageCodec};

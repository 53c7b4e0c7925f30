//! Broker connectivity for the bridge.
//!
//! ```text
//! mqtt/
//! ├── config.rs     - broker endpoint, credentials and topics
//! ├── link.rs       - BrokerLink trait and the rumqttc session behind it
//! └── connection.rs - connection state machine driven by the run loop
//! ```
//!
//! The [`connection::ConnectivityManager`] owns the
//! `Disconnected → Connecting → Connected` lifecycle and is the only entry
//! path for inbound messages: the loop calls `tick()` once per iteration,
//! which services keep-alive and drains whatever the broker buffered.
//! Outbound publishes are QoS 0 fire-and-forget and silently skipped while
//! disconnected. Reconnect pacing is the scheduler's job; this module only
//! exposes the raw connect primitive.

pub mod config;
pub mod connection;
pub mod link;

#[cfg(test)]
mod tests;

pub use config::MqttConfig;
pub use connection::{ConnectionState, ConnectivityManager};
pub use link::{BrokerLink, ConnectivityError, MqttBrokerLink};

//! The bridge run loop, as a statum state machine over its lifecycle.
//!
//! # State Machine
//!
//! ```text
//! Initializing ──► Active ──► Updating
//!                    │            │
//!              (run loop)   (update hold until restart)
//! ```
//!
//! # Iteration Order
//!
//! One cooperative task, one fixed sequence per tick:
//!
//! 1. update housekeeping (always, and first)
//! 2. reconnect, when disconnected and the retry interval has elapsed;
//!    a failed attempt ends the iteration early
//! 3. connectivity tick, feeding drained payloads through the dispatcher
//! 4. IR receiver poll, feeding completed captures out as published events
//!
//! Nothing escapes an iteration: malformed input and failed I/O are absorbed
//! where they happen and the next tick starts clean.

use std::fmt;
use std::time::Duration;

use statum::{machine, state};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::config::ErrorPolicy;
use crate::dispatch::{CommandDispatcher, Dispatch, DispatchError};
use crate::ir::IrReceiver;
use crate::message::MessageCodec;
use crate::mqtt::ConnectivityManager;
use crate::update::UpdateService;

/// Enforces the minimum spacing between reconnect attempts.
///
/// Stamped unconditionally on every attempt, successful or not, so a flaky
/// broker is never hammered by a busy loop.
#[derive(Debug, Clone)]
pub struct RetryTimer {
    last_attempt: Option<Instant>,
    min_interval: Duration,
}

impl RetryTimer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_attempt: None,
            min_interval,
        }
    }

    pub fn ready(&self) -> bool {
        self.last_attempt
            .map_or(true, |at| at.elapsed() >= self.min_interval)
    }

    pub fn stamp(&mut self) {
        self.last_attempt = Some(Instant::now());
    }
}

/// Loop timing and policy knobs.
#[derive(Clone, Debug)]
pub struct BridgeSettings {
    pub loop_interval: Duration,
    pub reconnect_interval: Duration,
    pub event_topic: String,
    pub error_policy: ErrorPolicy,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            loop_interval: Duration::from_millis(10),
            reconnect_interval: Duration::from_secs(5),
            event_topic: "irblaster/rx".to_string(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

/// Bridge lifecycle states using statum
#[state]
#[derive(Debug, Clone)]
pub enum BridgeState {
    Initializing, // Wiring components together
    Active,       // Running the scheduling loop
    Updating,     // Update in progress, bridge logic suspended
}

/// The bridge runtime with compile-time state safety via statum
///
/// Owns every piece of mutable bridge state; there are no process-wide
/// singletons behind it.
#[machine]
pub struct Bridge<S: BridgeState> {
    connectivity: ConnectivityManager,
    dispatcher: CommandDispatcher,
    codec: MessageCodec,
    receiver: Box<dyn IrReceiver>,
    updater: Box<dyn UpdateService>,
    retry: RetryTimer,
    settings: BridgeSettings,
}

impl Bridge<Initializing> {
    pub fn create(
        connectivity: ConnectivityManager,
        dispatcher: CommandDispatcher,
        codec: MessageCodec,
        receiver: Box<dyn IrReceiver>,
        updater: Box<dyn UpdateService>,
        settings: BridgeSettings,
    ) -> Self {
        let retry = RetryTimer::new(settings.reconnect_interval);
        Self::new(
            connectivity,
            dispatcher,
            codec,
            receiver,
            updater,
            retry,
            settings,
        )
    }

    pub fn activate(self) -> Bridge<Active> {
        info!("bridge active");
        self.transition()
    }
}

impl Bridge<Active> {
    /// Runs the scheduling loop until an update begins.
    pub async fn run(mut self) -> Bridge<Updating> {
        let mut ticker = interval(self.settings.loop_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.updater.service() {
                info!("update in progress, suspending bridge");
                return self.transition();
            }

            if !self.connectivity.is_connected() && self.retry.ready() {
                self.retry.stamp();
                debug!("reconnecting to broker");
                if !self.connectivity.attempt_connect().await {
                    // back to the top; IR polling resumes next iteration
                    continue;
                }
            }

            for payload in self.connectivity.tick().await {
                self.handle_command(&payload);
            }

            self.poll_receiver();
        }
    }

    /// Runs one inbound payload through codec and dispatcher.
    fn handle_command(&mut self, payload: &[u8]) {
        let message = match self.codec.parse(payload) {
            Ok(message) => message,
            Err(e) => {
                self.report_drop(&e);
                return;
            }
        };

        match self.dispatcher.dispatch(&message) {
            Ok(Dispatch::Transmitted { protocol, value }) => {
                trace!("command transmitted: {} 0x{:X}", protocol, value)
            }
            Ok(Dispatch::Incomplete) => trace!("incomplete command message, nothing to do"),
            Ok(Dispatch::UnknownProtocol) => {
                self.report_drop(&format!("unrecognized protocol {:?}", message.protocol))
            }
            Err(e @ DispatchError::InvalidCode { .. }) => self.report_drop(&e),
            Err(DispatchError::Transmit(e)) => warn!("IR transmit failed: {}", e),
        }
    }

    /// Polls for a completed capture and publishes the decoded event.
    fn poll_receiver(&mut self) {
        let Some(capture) = self.receiver.poll() else {
            return;
        };

        if capture.overflowed {
            warn!("IR capture overflowed, discarding {} edges", capture.train.len());
        } else if let Some(event) = self.dispatcher.decode(&capture.train) {
            debug!(
                "received {} 0x{:X} (repeat: {})",
                event.protocol, event.value, event.repeat
            );
            let message = self.dispatcher.describe(&event);
            match self.codec.serialize(&message) {
                Ok(payload) => self.connectivity.publish(&self.settings.event_topic, payload),
                Err(e) => warn!("failed to render IR event: {}", e),
            }
        } else {
            debug!("unrecognized capture ({} edges)", capture.train.len());
        }

        self.receiver.rearm();
    }

    fn report_drop(&self, reason: &dyn fmt::Display) {
        match self.settings.error_policy {
            ErrorPolicy::Silent => trace!("command dropped: {}", reason),
            ErrorPolicy::Log => warn!("command dropped: {}", reason),
        }
    }
}

impl Bridge<Updating> {
    /// Services only the updater until the process is restarted.
    pub async fn hold(mut self) {
        let mut ticker = interval(self.settings.loop_interval);
        loop {
            ticker.tick().await;
            self.updater.service();
        }
    }
}

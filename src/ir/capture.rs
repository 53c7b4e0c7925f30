//! Capture hand-off between the edge-interrupt path and the run loop.
//!
//! The receive pin toggles on every IR edge while the scheduler loop only
//! looks once per iteration, so captures cross threads exactly once, through
//! a single-producer/single-consumer slot:
//!
//! ```text
//! edge interrupts ──► PulseAccumulator ──► CaptureProducer ═╡slot╞═ CaptureSlot ──► loop
//! ```
//!
//! A capture moves through three stages: *armed* (accumulator waiting for a
//! first edge), *capturing* (edges folding into durations), *ready* (complete
//! frame parked in the slot until the loop takes it). The slot holds one
//! capture; frames completing while it is occupied are dropped, which is the
//! "receiver not re-armed" case of the hardware this models.

use std::mem;
use std::time::Duration;

use tokio::sync::mpsc;

use super::PulseTrain;

/// Longest buffer a single capture may occupy, in edges. Frames that keep
/// toggling past this are marked overflowed and discarded by the loop.
pub const MAX_EDGES: usize = 128;

/// One complete received frame awaiting decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub train: PulseTrain,
    pub overflowed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccumulatorState {
    /// Waiting for the first edge of a frame.
    Armed,
    /// Folding edges into durations.
    Capturing,
}

/// Folds edge timestamps into mark/space durations and detects frame
/// boundaries by silence.
///
/// Owned by the interrupt-side thread; the loop never touches it directly.
#[derive(Debug)]
pub struct PulseAccumulator {
    state: AccumulatorState,
    durations: Vec<u32>,
    last_edge_us: u64,
    frame_gap_us: u64,
    overflowed: bool,
}

impl PulseAccumulator {
    pub fn new(frame_gap: Duration) -> Self {
        Self {
            state: AccumulatorState::Armed,
            durations: Vec::with_capacity(MAX_EDGES),
            last_edge_us: 0,
            frame_gap_us: frame_gap.as_micros() as u64,
            overflowed: false,
        }
    }

    /// Feeds one edge, timestamped on the monotonic clock. Returns the
    /// previous frame when this edge arrived after a frame gap of silence.
    pub fn edge(&mut self, timestamp: Duration) -> Option<Capture> {
        let now_us = timestamp.as_micros() as u64;
        match self.state {
            AccumulatorState::Armed => {
                self.state = AccumulatorState::Capturing;
                self.last_edge_us = now_us;
                None
            }
            AccumulatorState::Capturing => {
                let duration = now_us.saturating_sub(self.last_edge_us);
                self.last_edge_us = now_us;

                if duration >= self.frame_gap_us {
                    // This edge starts the next frame; ship the finished one.
                    return self.take_frame();
                }

                if self.durations.len() == MAX_EDGES {
                    self.overflowed = true;
                } else {
                    self.durations.push(duration as u32);
                }
                None
            }
        }
    }

    /// Closes out the current frame after the line has been silent for a
    /// frame gap. Called by the interrupt thread on poll timeout.
    pub fn timeout(&mut self) -> Option<Capture> {
        let capture = self.take_frame();
        self.state = AccumulatorState::Armed;
        capture
    }

    fn take_frame(&mut self) -> Option<Capture> {
        if self.durations.is_empty() {
            return None;
        }
        let train = PulseTrain::new(mem::take(&mut self.durations));
        let overflowed = mem::replace(&mut self.overflowed, false);
        Some(Capture { train, overflowed })
    }
}

/// Creates the single-capture hand-off pair.
pub fn capture_channel() -> (CaptureProducer, CaptureSlot) {
    let (tx, rx) = mpsc::channel(1);
    (CaptureProducer { tx }, CaptureSlot { rx })
}

/// Interrupt-side handle: parks a completed capture in the slot.
#[derive(Debug, Clone)]
pub struct CaptureProducer {
    tx: mpsc::Sender<Capture>,
}

impl CaptureProducer {
    /// Offers a capture to the loop. Returns false when the slot still holds
    /// an unconsumed capture, in which case the frame is dropped.
    pub fn offer(&self, capture: Capture) -> bool {
        self.tx.try_send(capture).is_ok()
    }
}

/// Loop-side handle: takes the parked capture, if any.
#[derive(Debug)]
pub struct CaptureSlot {
    rx: mpsc::Receiver<Capture>,
}

impl CaptureSlot {
    pub fn try_take(&mut self) -> Option<Capture> {
        self.rx.try_recv().ok()
    }
}

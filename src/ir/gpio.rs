//! Raspberry Pi GPIO drivers for the IR receiver and transmitter.
//!
//! The receiver watches the demodulator output pin from a dedicated thread
//! (the interrupt path) and hands completed frames to the loop through the
//! capture slot. The transmitter gates a PWM carrier on and off per
//! mark/space duration; the exact carrier timing belongs to the PWM
//! peripheral, not to this crate.

use std::thread;
use std::time::Duration;

use rppal::gpio::{Gpio, Trigger};
use rppal::pwm::{Channel, Polarity, Pwm};
use tracing::{debug, trace, warn};

use super::capture::{capture_channel, Capture, CaptureSlot, PulseAccumulator};
use super::{IrError, IrReceiver, IrTransmitter, PulseTrain};

/// IR receiver driven by edge interrupts on a GPIO pin.
pub struct GpioIrReceiver {
    slot: CaptureSlot,
    armed: bool,
    _reader: thread::JoinHandle<()>,
}

impl GpioIrReceiver {
    /// Claims the pin and starts the capture thread.
    pub fn new(pin: u8, frame_gap: Duration) -> Result<Self, IrError> {
        let gpio = Gpio::new()?;
        let mut rx_pin = gpio.get(pin)?.into_input();
        rx_pin.set_interrupt(Trigger::Both, None)?;

        let (producer, slot) = capture_channel();
        let reader = thread::Builder::new()
            .name("ir-capture".into())
            .spawn(move || {
                let mut accumulator = PulseAccumulator::new(frame_gap);
                loop {
                    match rx_pin.poll_interrupt(false, Some(frame_gap)) {
                        Ok(Some(event)) => {
                            if let Some(capture) = accumulator.edge(event.timestamp) {
                                if !producer.offer(capture) {
                                    trace!("capture slot occupied, frame dropped");
                                }
                            }
                        }
                        Ok(None) => {
                            if let Some(capture) = accumulator.timeout() {
                                if !producer.offer(capture) {
                                    trace!("capture slot occupied, frame dropped");
                                }
                            }
                        }
                        Err(e) => {
                            warn!("IR receive pin failed: {}", e);
                            break;
                        }
                    }
                }
            })
            .map_err(|e| IrError::Receiver(e.to_string()))?;

        debug!("IR receiver listening on GPIO {}", pin);
        Ok(Self {
            slot,
            armed: true,
            _reader: reader,
        })
    }
}

impl IrReceiver for GpioIrReceiver {
    fn poll(&mut self) -> Option<Capture> {
        if !self.armed {
            return None;
        }
        let capture = self.slot.try_take();
        if capture.is_some() {
            self.armed = false;
        }
        capture
    }

    fn rearm(&mut self) {
        self.armed = true;
    }
}

/// IR transmitter gating a PWM carrier per mark/space duration.
pub struct PwmIrTransmitter {
    pwm: Pwm,
}

impl PwmIrTransmitter {
    pub fn new(channel: u8, carrier_hz: u32, duty_cycle: f64) -> Result<Self, IrError> {
        let channel = match channel {
            0 => Channel::Pwm0,
            1 => Channel::Pwm1,
            other => return Err(IrError::PwmChannel(other)),
        };
        let pwm = Pwm::with_frequency(
            channel,
            carrier_hz as f64,
            duty_cycle,
            Polarity::Normal,
            false,
        )?;
        debug!("IR transmitter carrier at {} Hz", carrier_hz);
        Ok(Self { pwm })
    }
}

impl IrTransmitter for PwmIrTransmitter {
    fn transmit(&mut self, train: &PulseTrain) -> Result<(), IrError> {
        for (i, &duration) in train.durations().iter().enumerate() {
            if i % 2 == 0 {
                self.pwm.enable()?;
            } else {
                self.pwm.disable()?;
            }
            thread::sleep(Duration::from_micros(duration as u64));
        }
        self.pwm.disable()?;
        Ok(())
    }
}

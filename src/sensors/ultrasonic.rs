//! HC-SR04 ultrasonic ranger driver.
//!
//! A 10 µs HIGH on the trigger pin starts a ranging cycle. The sensor
//! answers by holding its echo pin HIGH for the acoustic round-trip time;
//! half of that, times the speed of sound, is the distance to the target.
//!
//! ## Timing
//!
//! Both echo edges are captured by busy-polling a microsecond clock with
//! the FreeRTOS scheduler suspended ([`SchedulerLock`]). A context switch
//! in the middle of a pulse would stretch the measured width by a whole
//! tick, so nothing here may block, log, or allocate while the lock is held.

use core::time::Duration;

use embedded_hal::delay::DelayNs;

use crate::app::ports::{DigitalIo, GpioNum, MonotonicClock};
use crate::drivers::task_pin::SchedulerLock;
use crate::error::SensorError;

/// Speed of sound in air at ~20 °C.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

/// Trigger LOW settle time before the pulse.
const TRIGGER_SETTLE_US: u32 = 2;
/// Trigger HIGH width required by the sensor.
const TRIGGER_PULSE_US: u32 = 10;

/// The trigger/echo GPIOs of one physical sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPair {
    /// Digital output.
    pub trigger: GpioNum,
    /// Digital input.
    pub echo: GpioNum,
}

impl PinPair {
    pub const fn new(trigger: GpioNum, echo: GpioNum) -> Self {
        Self { trigger, echo }
    }
}

/// Distance in centimetres, or the edge that never arrived.
pub type DistanceReading = Result<f32, SensorError>;

/// Convert an echo pulse width to a one-way distance.
pub fn pulse_to_cm(pulse_us: u64) -> f32 {
    (pulse_us as f32 * SPEED_OF_SOUND_CM_PER_US) / 2.0
}

/// Drives one trigger/echo pair at a time over a shared GPIO bank.
///
/// `T` supplies both the monotonic timestamps for edge capture and the
/// short busy-wait delays that shape the trigger pulse.
pub struct DistanceSensor<IO, T> {
    io: IO,
    timer: T,
}

impl<IO, T> DistanceSensor<IO, T>
where
    IO: DigitalIo,
    T: MonotonicClock + DelayNs,
{
    pub fn new(io: IO, timer: T) -> Self {
        Self { io, timer }
    }

    /// Run one ranging cycle on `pins`.
    ///
    /// Each echo edge gets its own `timeout` window. The rise may land on
    /// the last microsecond of its window; a pulse as long as the window
    /// is reported as [`SensorError::EchoEndTimeout`], never as
    /// a distance. No retries happen here.
    pub fn measure(&mut self, pins: PinPair, timeout: Duration) -> DistanceReading {
        self.fire_trigger(pins.trigger);

        let limit_us = u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX);
        let pulse_us = {
            let _lock = SchedulerLock::acquire();
            self.capture_pulse(pins.echo, limit_us)?
        };

        if pulse_us >= limit_us {
            return Err(SensorError::EchoEndTimeout);
        }
        Ok(pulse_to_cm(pulse_us))
    }

    fn fire_trigger(&mut self, trigger: GpioNum) {
        self.io.set_output_level(trigger, false);
        self.timer.delay_us(TRIGGER_SETTLE_US);
        self.io.set_output_level(trigger, true);
        self.timer.delay_us(TRIGGER_PULSE_US);
        self.io.set_output_level(trigger, false);
    }

    /// Width of the next HIGH pulse on `echo`, in µs.
    fn capture_pulse(&mut self, echo: GpioNum, limit_us: u64) -> Result<u64, SensorError> {
        let armed = self.timer.now_us();
        let rise = loop {
            if self.io.read_input_level(echo) {
                break self.timer.now_us();
            }
            if self.timer.now_us().saturating_sub(armed) > limit_us {
                return Err(SensorError::EchoStartTimeout);
            }
        };

        let fall = loop {
            if !self.io.read_input_level(echo) {
                break self.timer.now_us();
            }
            if self.timer.now_us().saturating_sub(rise) >= limit_us {
                return Err(SensorError::EchoEndTimeout);
            }
        };

        Ok(fall.saturating_sub(rise))
    }
}

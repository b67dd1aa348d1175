//! Host-side echo bench for the ultrasonic driver.
//!
//! Simulates a GPIO bank wired to HC-SR04 sensors on a virtual microsecond
//! clock. Every echo sample advances the clock by 1 µs, so a busy-polling
//! driver sees pulse edges with exact timing. Delays advance the clock
//! instantly and are recorded for inspection.
//!
//! Clones share one bench: pass one clone as the GPIO bank and another as
//! the timer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use embedded_hal::delay::DelayNs;

use crate::app::ports::{DigitalIo, GpioNum, MonotonicClock};

use super::ultrasonic::PinPair;

/// How a simulated sensor answers each trigger pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoPlan {
    /// Echo rises `latency_us` after the trigger falls and stays HIGH for
    /// `width_us`.
    Pulse { latency_us: u64, width_us: u64 },
    /// Echo never rises.
    Silent,
    /// Echo rises and never falls.
    Stuck { latency_us: u64 },
}

/// One recorded output write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    pub pin: GpioNum,
    pub high: bool,
    pub at_us: u64,
}

struct Channel {
    pins: PinPair,
    plan: EchoPlan,
    trigger_high: bool,
    /// Rise time and, if it ever falls, fall time of the pending echo.
    window: Option<(u64, Option<u64>)>,
}

impl Channel {
    fn arm(&mut self, now: u64) {
        self.window = match self.plan {
            EchoPlan::Pulse {
                latency_us,
                width_us,
            } => {
                let rise = now + latency_us;
                Some((rise, Some(rise + width_us)))
            }
            EchoPlan::Silent => None,
            EchoPlan::Stuck { latency_us } => Some((now + latency_us, None)),
        };
    }

    fn echo_level(&self, now: u64) -> bool {
        match self.window {
            Some((rise, fall)) => now >= rise && fall.is_none_or(|f| now < f),
            None => false,
        }
    }
}

#[derive(Default)]
struct BenchState {
    now_us: u64,
    channels: Vec<Channel>,
    writes: Vec<PinWrite>,
    pauses_ms: Vec<u32>,
}

/// Shared simulated GPIO bank + clock.
#[derive(Clone, Default)]
pub struct EchoBench {
    state: Arc<Mutex<BenchState>>,
}

impl EchoBench {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BenchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wire a sensor to `pins`, or change how an attached one answers.
    /// Takes effect from the next trigger pulse.
    pub fn attach(&self, pins: PinPair, plan: EchoPlan) {
        let mut st = self.state();
        if let Some(ch) = st.channels.iter_mut().find(|c| c.pins == pins) {
            ch.plan = plan;
            return;
        }
        st.channels.push(Channel {
            pins,
            plan,
            trigger_high: false,
            window: None,
        });
    }

    pub fn now_us(&self) -> u64 {
        self.state().now_us
    }

    pub fn writes(&self) -> Vec<PinWrite> {
        self.state().writes.clone()
    }

    /// Millisecond pauses taken so far, in order.
    pub fn pauses_ms(&self) -> Vec<u32> {
        self.state().pauses_ms.clone()
    }

    fn advance(&self, us: u64) {
        self.state().now_us += us;
    }
}

impl DigitalIo for EchoBench {
    fn set_output_level(&mut self, pin: GpioNum, high: bool) {
        let mut st = self.state();
        let now = st.now_us;
        st.writes.push(PinWrite {
            pin,
            high,
            at_us: now,
        });
        for ch in st.channels.iter_mut().filter(|c| c.pins.trigger == pin) {
            if ch.trigger_high && !high {
                ch.arm(now);
            }
            ch.trigger_high = high;
        }
    }

    fn read_input_level(&mut self, pin: GpioNum) -> bool {
        let mut st = self.state();
        let now = st.now_us;
        let level = st
            .channels
            .iter()
            .find(|c| c.pins.echo == pin)
            .is_some_and(|c| c.echo_level(now));
        st.now_us += 1;
        level
    }
}

impl MonotonicClock for EchoBench {
    fn now_us(&self) -> u64 {
        EchoBench::now_us(self)
    }
}

impl DelayNs for EchoBench {
    fn delay_ns(&mut self, ns: u32) {
        self.advance(u64::from(ns.div_ceil(1_000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.advance(u64::from(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        let mut st = self.state();
        st.pauses_ms.push(ms);
        st.now_us += u64::from(ms) * 1_000;
    }
}

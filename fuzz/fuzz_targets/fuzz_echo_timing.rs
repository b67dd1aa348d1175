//! Fuzz target: `DistanceSensor::measure` against arbitrary echo timing.
//!
//! Invariants checked:
//! - No panics for any latency/width
//! - A result is a distance iff the echo rose and fell inside the window
//! - Distances are finite and non-negative
//!
//! cargo fuzz run fuzz_echo_timing

#![no_main]

use libfuzzer_sys::fuzz_target;
use smartpark::config::ECHO_TIMEOUT;
use smartpark::error::SensorError;
use smartpark::sensors::sim::{EchoBench, EchoPlan};
use smartpark::sensors::ultrasonic::{DistanceSensor, PinPair};

const PINS: PinPair = PinPair::new(0, 1);

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let latency = u64::from(u16::from_le_bytes([data[0], data[1]]));
    let width = u64::from(u16::from_le_bytes([data[2], data[3]]));
    let plan = match data[4] % 3 {
        0 => EchoPlan::Pulse { latency_us: latency, width_us: width },
        1 => EchoPlan::Stuck { latency_us: latency },
        _ => EchoPlan::Silent,
    };

    let bench = EchoBench::new();
    bench.attach(PINS, plan);
    let result = DistanceSensor::new(bench.clone(), bench).measure(PINS, ECHO_TIMEOUT);

    match (plan, result) {
        (EchoPlan::Pulse { .. }, Ok(cm)) => {
            assert!(cm.is_finite() && cm >= 0.0);
            assert!(latency <= 30_000 && width < 30_000);
        }
        (EchoPlan::Pulse { .. }, Err(SensorError::EchoStartTimeout)) => {
            assert!(latency > 30_000 || width == 0);
        }
        (EchoPlan::Pulse { .. }, Err(SensorError::EchoEndTimeout)) => assert!(width >= 30_000),
        (EchoPlan::Stuck { .. }, r) => assert!(r.is_err()),
        (EchoPlan::Silent, r) => assert_eq!(r, Err(SensorError::EchoStartTimeout)),
    }
});

//! GPIO pin assignments for the SmartParking node.
//!
//! The sampling loop, `hw_init` and the config defaults reference this
//! module rather than hard-coding pin numbers.

use crate::sensors::ultrasonic::PinPair;

// ---------------------------------------------------------------------------
// Spot 1: HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a ranging cycle.
pub const TRIG_SENSOR_1_GPIO: i32 = 0;
/// Digital input: HIGH for the round-trip time of the acoustic burst.
pub const ECHO_SENSOR_1_GPIO: i32 = 1;

// ---------------------------------------------------------------------------
// Spot 2: HC-SR04 ultrasonic ranger
// ---------------------------------------------------------------------------

pub const TRIG_SENSOR_2_GPIO: i32 = 2;
pub const ECHO_SENSOR_2_GPIO: i32 = 3;

// ---------------------------------------------------------------------------
// Pairs
// ---------------------------------------------------------------------------

pub const SPOT_1_PINS: PinPair = PinPair::new(TRIG_SENSOR_1_GPIO, ECHO_SENSOR_1_GPIO);
pub const SPOT_2_PINS: PinPair = PinPair::new(TRIG_SENSOR_2_GPIO, ECHO_SENSOR_2_GPIO);

//! Sensor subsystem: the ultrasonic ranger driver and occupancy logic.
//!
//! [`ultrasonic::DistanceSensor`] turns an echo pulse into centimetres;
//! [`occupancy::evaluate`] turns centimetres into a parking state.

pub mod occupancy;
pub mod ultrasonic;

#[cfg(not(target_os = "espidf"))]
pub mod sim;

/// The two monitored spots, in publish order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkingSpot {
    One,
    Two,
}

impl ParkingSpot {
    pub const ALL: [Self; 2] = [Self::One, Self::Two];

    /// Position in [`NodeConfig::spots`](crate::config::NodeConfig::spots).
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Key used for this spot in the status message.
    pub const fn label(self) -> &'static str {
        match self {
            Self::One => "Estacionamiento1",
            Self::Two => "Estacionamiento2",
        }
    }
}

impl core::fmt::Display for ParkingSpot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

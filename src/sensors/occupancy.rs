//! Distance → occupancy classification.

use crate::error::SensorError;

use super::ultrasonic::DistanceReading;

/// Whether a car is parked over the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyState {
    Occupied,
    Free,
}

impl OccupancyState {
    /// Value carried in the status message: `0` occupied, `1` free.
    pub const fn wire_flag(self) -> u8 {
        match self {
            Self::Occupied => 0,
            Self::Free => 1,
        }
    }
}

/// Classify a reading against `threshold_cm`.
///
/// Strictly below the threshold is [`OccupancyState::Occupied`]. A timed-out
/// reading is passed through as its error, never mapped to a state.
pub fn evaluate(reading: DistanceReading, threshold_cm: f32) -> Result<OccupancyState, SensorError> {
    let cm = reading?;
    if cm < threshold_cm {
        Ok(OccupancyState::Occupied)
    } else {
        Ok(OccupancyState::Free)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OCCUPANCY_THRESHOLD_CM;

    #[test]
    fn threshold_boundary() {
        assert_eq!(evaluate(Ok(9.99), OCCUPANCY_THRESHOLD_CM), Ok(OccupancyState::Occupied));
        assert_eq!(evaluate(Ok(10.0), OCCUPANCY_THRESHOLD_CM), Ok(OccupancyState::Free));
        assert_eq!(evaluate(Ok(250.0), OCCUPANCY_THRESHOLD_CM), Ok(OccupancyState::Free));
        assert_eq!(evaluate(Ok(0.0), OCCUPANCY_THRESHOLD_CM), Ok(OccupancyState::Occupied));
    }

    #[test]
    fn timeouts_propagate() {
        for e in [SensorError::EchoStartTimeout, SensorError::EchoEndTimeout] {
            assert_eq!(evaluate(Err(e), OCCUPANCY_THRESHOLD_CM), Err(e));
        }
    }

    #[test]
    fn wire_flags() {
        assert_eq!(OccupancyState::Occupied.wire_flag(), 0);
        assert_eq!(OccupancyState::Free.wire_flag(), 1);
    }
}

//! The status message published once per sampling cycle.
//!
//! Wire format is a compact JSON object keyed by spot label, `0` for
//! occupied and `1` for free:
//!
//! ```text
//! {"Estacionamiento1":0,"Estacionamiento2":1}
//! ```
//!
//! A spot whose sensor timed out this cycle is left out of the object.

use serde::{Serialize, Serializer};

use crate::error::PublishError;
use crate::sensors::ParkingSpot;
use crate::sensors::occupancy::OccupancyState;

/// Longest payload the node will publish.
pub const MAX_PAYLOAD_LEN: usize = 64;

/// Encoded status message.
pub type Payload = heapless::String<MAX_PAYLOAD_LEN>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    #[serde(
        rename = "Estacionamiento1",
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire_flag"
    )]
    pub spot1: Option<OccupancyState>,
    #[serde(
        rename = "Estacionamiento2",
        skip_serializing_if = "Option::is_none",
        serialize_with = "wire_flag"
    )]
    pub spot2: Option<OccupancyState>,
}

fn wire_flag<S: Serializer>(state: &Option<OccupancyState>, s: S) -> Result<S::Ok, S::Error> {
    match state {
        Some(st) => s.serialize_u8(st.wire_flag()),
        None => s.serialize_none(),
    }
}

impl StatusMessage {
    pub fn set(&mut self, spot: ParkingSpot, state: OccupancyState) {
        match spot {
            ParkingSpot::One => self.spot1 = Some(state),
            ParkingSpot::Two => self.spot2 = Some(state),
        }
    }

    pub fn get(&self, spot: ParkingSpot) -> Option<OccupancyState> {
        match spot {
            ParkingSpot::One => self.spot1,
            ParkingSpot::Two => self.spot2,
        }
    }

    /// Serialise to the compact JSON payload.
    pub fn to_payload(&self) -> Result<Payload, PublishError> {
        let json = serde_json::to_string(self).map_err(|_| PublishError::Encoding)?;
        Payload::try_from(json.as_str()).map_err(|_| PublishError::Encoding)
    }
}

//! Outbound application events.
//!
//! The [`SamplingPublisher`](super::publisher::SamplingPublisher) emits these
//! through the [`EventSink`](super::ports::EventSink) port.

use crate::error::{PublishError, SensorError};
use crate::sensors::ParkingSpot;
use crate::sensors::occupancy::OccupancyState;

use super::ports::MessageId;
use super::status::Payload;

/// Structured events emitted by the sampling loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The sampling task started.
    Started,

    /// A spot was measured and classified.
    Sampled {
        spot: ParkingSpot,
        distance_cm: f32,
        state: OccupancyState,
    },

    /// A spot produced no reading this cycle.
    SensorTimeout { spot: ParkingSpot, error: SensorError },

    /// The status message was accepted by the transport.
    Published { msg_id: MessageId, payload: Payload },

    /// The status message was not published this cycle.
    PublishFailed(PublishError),
}

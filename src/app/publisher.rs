//! Sampling publisher: the node's only long-running task.
//!
//! Each cycle measures spot 1, pauses so the two sensors' bursts don't
//! cross-talk, measures spot 2, and publishes one [`StatusMessage`].
//! Nothing in a cycle is fatal: timeouts drop a spot from the message and
//! publish failures are reported, then the loop carries on.
//!
//! ```text
//!  DigitalIo ──▶ ┌───────────────────────┐ ──▶ StatusPublisher
//!  Clock+Delay ─▶│   SamplingPublisher   │ ──▶ EventSink
//!                └───────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use crate::config::NodeConfig;
use crate::error::PublishError;
use crate::sensors::ParkingSpot;
use crate::sensors::occupancy::{self, OccupancyState};
use crate::sensors::ultrasonic::DistanceSensor;

use super::events::AppEvent;
use super::ports::{DigitalIo, EventSink, MessageId, MonotonicClock, StatusPublisher};
use super::status::StatusMessage;

/// What one cycle produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub message: StatusMessage,
    pub outcome: Result<MessageId, PublishError>,
}

/// Samples both spots and publishes their state on a fixed cadence.
///
/// `D` provides the millisecond pauses and should yield to other tasks;
/// the sensor's own timer `T` busy-waits.
pub struct SamplingPublisher<IO, T, D, S> {
    sensor: DistanceSensor<IO, T>,
    pause: D,
    sink: S,
    config: NodeConfig,
    cycles: u64,
}

impl<IO, T, D, S> SamplingPublisher<IO, T, D, S>
where
    IO: DigitalIo,
    T: MonotonicClock + DelayNs,
    D: DelayNs,
    S: EventSink,
{
    pub fn new(sensor: DistanceSensor<IO, T>, pause: D, sink: S, config: NodeConfig) -> Self {
        Self {
            sensor,
            pause,
            sink,
            config,
            cycles: 0,
        }
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Announce the task. Call once before the first cycle.
    pub fn start(&mut self) {
        info!(
            "sampling publisher started (topic={}, every {} ms)",
            self.config.status_topic, self.config.publish_interval_ms
        );
        self.sink.emit(&AppEvent::Started);
    }

    /// Measure both spots and publish one status message.
    pub fn run_cycle(&mut self, publisher: &impl StatusPublisher) -> CycleReport {
        self.cycles += 1;

        let mut message = StatusMessage::default();
        for spot in ParkingSpot::ALL {
            if spot != ParkingSpot::One {
                self.pause.delay_ms(self.config.inter_sensor_delay_ms);
            }
            if let Some(state) = self.sample(spot) {
                message.set(spot, state);
            }
        }

        let outcome = message.to_payload().and_then(|payload| {
            publisher
                .publish(
                    self.config.status_topic,
                    payload.as_bytes(),
                    self.config.publish_timeout,
                )
                .map(|msg_id| (msg_id, payload))
        });

        let outcome = match outcome {
            Ok((msg_id, payload)) => {
                self.sink.emit(&AppEvent::Published { msg_id, payload });
                Ok(msg_id)
            }
            Err(e) => {
                self.sink.emit(&AppEvent::PublishFailed(e));
                Err(e)
            }
        };

        CycleReport { message, outcome }
    }

    /// One loop iteration: a cycle, then the publish-interval pause. The
    /// pause is taken whatever the publish outcome was.
    pub fn tick(&mut self, publisher: &impl StatusPublisher) -> CycleReport {
        let report = self.run_cycle(publisher);
        debug!("cycle {} -> {:?}", self.cycles, report.outcome);
        self.pause.delay_ms(self.config.publish_interval_ms);
        report
    }

    /// Cycle forever at the configured cadence.
    pub fn run(mut self, publisher: &impl StatusPublisher) -> ! {
        self.start();
        loop {
            self.tick(publisher);
        }
    }

    fn sample(&mut self, spot: ParkingSpot) -> Option<OccupancyState> {
        let pins = self.config.spots[spot.index()];
        let reading = self.sensor.measure(pins, self.config.echo_timeout);

        match occupancy::evaluate(reading, self.config.occupancy_threshold_cm) {
            Ok(state) => {
                let distance_cm = reading.unwrap_or_default();
                self.sink.emit(&AppEvent::Sampled {
                    spot,
                    distance_cm,
                    state,
                });
                Some(state)
            }
            Err(error) => {
                self.sink.emit(&AppEvent::SensorTimeout { spot, error });
                None
            }
        }
    }
}

//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | sampling"),
            AppEvent::Sampled {
                spot,
                distance_cm,
                state,
            } => debug!("Sensor: {} {:.2} cm -> {:?}", spot, distance_cm, state),
            AppEvent::SensorTimeout { spot, error } => warn!("Sensor: {} no reading ({})", spot, error),
            AppEvent::Published { msg_id, payload } => info!("MQTT: published #{} {}", msg_id, payload),
            AppEvent::PublishFailed(e) => warn!("MQTT: publish skipped ({})", e),
        }
    }
}

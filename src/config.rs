//! Node configuration.
//!
//! Every parameter is a compile-time constant: thresholds, topics and
//! timings are not tunable at runtime. Wi-Fi credentials come from the
//! build environment (`SMARTPARK_WIFI_SSID`, `SMARTPARK_WIFI_PASS`).

use core::time::Duration;

use crate::pins;
use crate::sensors::ultrasonic::PinPair;

// ── Sensing ──────────────────────────────────────────────────

/// Readings strictly below this distance mean a car is parked.
pub const OCCUPANCY_THRESHOLD_CM: f32 = 10.0;
/// Maximum wait for each echo edge.
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(30);
/// Pause between the two sensors so their bursts don't cross-talk.
pub const INTER_SENSOR_DELAY_MS: u32 = 500;

// ── Publishing ───────────────────────────────────────────────

pub const PUBLISH_INTERVAL_MS: u32 = 5_000;
pub const PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);
pub const STATUS_TOPIC: &str = "smartparking/nodo1";

pub const BROKER_URI: &str = "mqtts://a1uud8twxwkyab-ats.iot.us-east-1.amazonaws.com";
pub const BROKER_PORT: u16 = 8883;
pub const MQTT_CLIENT_ID: &str = "smartparking-nodo1";

// ── Link ─────────────────────────────────────────────────────

/// Consecutive disconnects tolerated before the link gives up.
pub const MAX_LINK_RETRIES: u8 = 5;

pub const WIFI_SSID: &str = match option_env!("SMARTPARK_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};
pub const WIFI_PASS: &str = match option_env!("SMARTPARK_WIFI_PASS") {
    Some(pass) => pass,
    None => "",
};

/// Where and as whom the node connects to the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    /// Scheme + host, e.g. `mqtts://broker.example`.
    pub uri: &'static str,
    pub port: u16,
    pub client_id: &'static str,
    /// Applied by the client to every network operation, publishes included.
    pub network_timeout: Duration,
}

impl BrokerEndpoint {
    /// Full broker URL with explicit port.
    pub fn url(&self) -> String {
        format!("{}:{}", self.uri, self.port)
    }
}

impl Default for BrokerEndpoint {
    fn default() -> Self {
        Self {
            uri: BROKER_URI,
            port: BROKER_PORT,
            client_id: MQTT_CLIENT_ID,
            network_timeout: PUBLISH_TIMEOUT,
        }
    }
}

/// Core node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Pin pairs for spot 1 and spot 2, in publish order.
    pub spots: [PinPair; 2],
    pub occupancy_threshold_cm: f32,
    pub echo_timeout: Duration,
    pub inter_sensor_delay_ms: u32,
    pub publish_interval_ms: u32,
    pub publish_timeout: Duration,
    pub status_topic: &'static str,
    pub max_link_retries: u8,
    pub broker: BrokerEndpoint,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            spots: [pins::SPOT_1_PINS, pins::SPOT_2_PINS],
            occupancy_threshold_cm: OCCUPANCY_THRESHOLD_CM,
            echo_timeout: ECHO_TIMEOUT,
            inter_sensor_delay_ms: INTER_SENSOR_DELAY_MS,
            publish_interval_ms: PUBLISH_INTERVAL_MS,
            publish_timeout: PUBLISH_TIMEOUT,
            status_topic: STATUS_TOPIC,
            max_link_retries: MAX_LINK_RETRIES,
            broker: BrokerEndpoint::default(),
        }
    }
}

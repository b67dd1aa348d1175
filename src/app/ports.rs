//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ DistanceSensor / ConnectivityManager /
//!                              TransportSession / SamplingPublisher
//! ```
//!
//! Driven adapters (GPIO, clocks, Wi-Fi driver, MQTT client, log output)
//! implement these traits. The domain consumes them via generics, so none
//! of it touches ESP-IDF directly and all of it runs under host tests.
//! Microsecond busy-wait delays use `embedded_hal::delay::DelayNs` rather
//! than a port of our own.

use core::time::Duration;

use crate::config::BrokerEndpoint;
use crate::error::{ConnectivityError, PublishError, SessionError};
use crate::net::channels::SessionEventChannel;
use crate::net::credentials::Credentials;

/// GPIO number as used by the ESP-IDF driver.
pub type GpioNum = i32;

/// Identifier the MQTT client assigns to an accepted publish.
pub type MessageId = u32;

// ───────────────────────────────────────────────────────────────
// Digital I/O + time (driven adapter: hardware ↔ sensor driver)
// ───────────────────────────────────────────────────────────────

/// Raw digital pin access. Both calls are synchronous and take
/// microseconds at most.
pub trait DigitalIo {
    /// Drive an output pin HIGH (`true`) or LOW (`false`).
    fn set_output_level(&mut self, pin: GpioNum, high: bool);

    /// Sample an input pin.
    fn read_input_level(&mut self, pin: GpioNum) -> bool;
}

/// Monotonic microsecond clock.
pub trait MonotonicClock {
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Network stack (driven adapter: link manager → Wi-Fi driver)
// ───────────────────────────────────────────────────────────────

/// The only call the link state machine makes into the network stack.
/// Outcomes come back asynchronously as link events.
pub trait NetworkStack {
    fn initiate_association(&mut self) -> Result<(), ConnectivityError>;
}

// ───────────────────────────────────────────────────────────────
// Pub/sub client (driven adapter: session → MQTT library)
// ───────────────────────────────────────────────────────────────

/// MQTT delivery guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QoS {
    AtMostOnce,
    AtLeastOnce,
    ExactlyOnce,
}

/// A live pub/sub client. Both calls take `&self`: implementations must be
/// safe to call from several tasks at once.
pub trait PubSubClient: Send + Sync {
    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        qos: QoS,
        retain: bool,
        timeout: Duration,
    ) -> Result<MessageId, PublishError>;

    /// Close the broker connection and stop reconnecting. Publishes after
    /// this fail with [`PublishError::ClientUnavailable`].
    fn disconnect(&self);
}

/// Builds a [`PubSubClient`] for an endpoint.
///
/// The client's connection callbacks must post
/// [`SessionEvent`](crate::net::session::SessionEvent)s into `events`
/// without blocking.
pub trait SessionConnector {
    type Client: PubSubClient;

    fn connect(
        &mut self,
        endpoint: &BrokerEndpoint,
        credentials: &Credentials,
        events: &'static SessionEventChannel,
    ) -> Result<Self::Client, SessionError>;
}

// ───────────────────────────────────────────────────────────────
// Status publisher (domain → transport session)
// ───────────────────────────────────────────────────────────────

/// What the sampling loop needs from the transport: at-least-once,
/// non-retained publishes to a topic.
pub trait StatusPublisher {
    fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        timeout: Duration,
    ) -> Result<MessageId, PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The sampling loop emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

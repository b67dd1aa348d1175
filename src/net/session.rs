//! Broker session.
//!
//! [`TransportSession`] owns the pub/sub client and tracks whether the
//! broker connection is up. The client library handles reconnection; this
//! side only reacts to its Connected/Disconnected notifications, which
//! arrive through [`SESSION_EVENTS`](super::channels::SESSION_EVENTS).
//!
//! The first `Connected` runs the ready hook (in the firmware: spawn the
//! sampling publisher). Later reconnects never run it again.
//!
//! [`TransportSession::disconnect`] is final: the client is shut down and
//! any `Connected` still queued behind it is ignored.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use core::time::Duration;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::app::ports::{MessageId, PubSubClient, QoS, SessionConnector, StatusPublisher};
use crate::config::BrokerEndpoint;
use crate::error::{PublishError, SessionError};

use super::channels::SessionEventChannel;
use super::credentials::Credentials;

/// Connection notifications from the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// Transport or protocol error (library-specific code).
    Error(i32),
}

/// Shared, immutable view of a session.
pub type TransportHandle<C> = Arc<TransportSession<C>>;

/// Runs once, on the first `Connected`.
pub type ReadyHook<C> = Box<dyn FnOnce(TransportHandle<C>) + Send>;

pub struct TransportSession<C> {
    client: C,
    connected: AtomicBool,
    closed: AtomicBool,
    connects: AtomicU32,
    ready_hook: Mutex<Option<ReadyHook<C>>>,
}

impl<C: PubSubClient + 'static> TransportSession<C> {
    /// Validate `credentials` and create the client. Returns as soon as the
    /// client exists; the connection itself is reported later as a
    /// [`SessionEvent::Connected`] on `events`.
    pub fn start<K>(
        connector: &mut K,
        endpoint: &BrokerEndpoint,
        credentials: &Credentials,
        events: &'static SessionEventChannel,
        on_ready: impl FnOnce(TransportHandle<C>) + Send + 'static,
    ) -> Result<TransportHandle<C>, SessionError>
    where
        K: SessionConnector<Client = C>,
    {
        credentials.validate()?;
        info!("MQTT: starting session to {} as {}", endpoint.url(), endpoint.client_id);
        let client = connector.connect(endpoint, credentials, events)?;

        Ok(Arc::new(Self {
            client,
            connected: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            connects: AtomicU32::new(0),
            ready_hook: Mutex::new(Some(Box::new(on_ready))),
        }))
    }

    /// Apply a notification. Call from the session dispatch task only.
    pub fn handle_event(self: &Arc<Self>, event: SessionEvent) {
        match event {
            SessionEvent::Connected if self.is_closed() => {
                warn!("MQTT: connected after disconnect, ignoring");
            }
            SessionEvent::Connected => {
                self.connected.store(true, Ordering::Release);
                let n = self.connects.fetch_add(1, Ordering::Relaxed) + 1;
                info!("MQTT: connected (#{})", n);

                let hook = self
                    .ready_hook
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();
                if let Some(hook) = hook {
                    hook(Arc::clone(self));
                }
            }
            SessionEvent::Disconnected => {
                self.connected.store(false, Ordering::Release);
                warn!("MQTT: disconnected");
            }
            SessionEvent::Error(code) => warn!("MQTT: error (code={})", code),
        }
    }
}

impl<C: PubSubClient> TransportSession<C> {
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Whether [`disconnect`](Self::disconnect) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Number of `Connected` notifications seen.
    pub fn connect_count(&self) -> u32 {
        self.connects.load(Ordering::Relaxed)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Queue `payload` for at-least-once, non-retained delivery.
    pub fn publish(&self, topic: &str, payload: &[u8], timeout: Duration) -> Result<MessageId, PublishError> {
        if !self.is_connected() {
            return Err(PublishError::ClientUnavailable);
        }
        self.client.publish(topic, payload, QoS::AtLeastOnce, false, timeout)
    }

    /// Close the session. Publishes fail with `ClientUnavailable` from here
    /// on. Calling it again does nothing.
    pub fn disconnect(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.connected.store(false, Ordering::Release);
        self.client.disconnect();
        info!("MQTT: session closed");
    }
}

impl<C: PubSubClient> StatusPublisher for TransportSession<C> {
    fn publish(&self, topic: &str, payload: &[u8], timeout: Duration) -> Result<MessageId, PublishError> {
        TransportSession::publish(self, topic, payload, timeout)
    }
}

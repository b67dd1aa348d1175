//! MQTT client adapter.
//!
//! [`SessionConnector`] builds a mutual-TLS MQTT client and wires its
//! connection callback into a session event channel; the resulting
//! client implements [`PubSubClient`].
//!
//! - **`target_os = "espidf"`**: `EspMqttClient` (esp-mqtt + mbedTLS).
//! - **all other targets**: an in-memory client that records publishes and
//!   reports `Connected` as soon as it is created.

#[cfg(target_os = "espidf")]
mod esp {
    use core::time::Duration;
    use std::sync::{Mutex, PoisonError};

    use esp_idf_svc::mqtt::client::{EspMqttClient, EventPayload, MqttClientConfiguration};
    use esp_idf_svc::sys::ESP_FAIL;
    use esp_idf_svc::tls::X509;
    use log::{debug, warn};

    use crate::app::ports::{MessageId, PubSubClient, QoS, SessionConnector};
    use crate::config::BrokerEndpoint;
    use crate::error::{PublishError, SessionError};
    use crate::net::channels::{SessionEventChannel, post};
    use crate::net::credentials::Credentials;
    use crate::net::session::SessionEvent;

    fn to_esp_qos(qos: QoS) -> esp_idf_svc::mqtt::client::QoS {
        use esp_idf_svc::mqtt::client::QoS as Esp;
        match qos {
            QoS::AtMostOnce => Esp::AtMostOnce,
            QoS::AtLeastOnce => Esp::AtLeastOnce,
            QoS::ExactlyOnce => Esp::ExactlyOnce,
        }
    }

    /// The esp-mqtt client. Its own task handles reconnects until
    /// `disconnect` drops it.
    pub struct EspBrokerClient {
        inner: Mutex<Option<EspMqttClient<'static>>>,
    }

    impl PubSubClient for EspBrokerClient {
        /// Blocks until the message is in the outbox; the configured
        /// network timeout bounds the wait.
        fn publish(
            &self,
            topic: &str,
            payload: &[u8],
            qos: QoS,
            retain: bool,
            timeout: Duration,
        ) -> Result<MessageId, PublishError> {
            debug!("MQTT: publish {}B to {} (timeout {:?})", payload.len(), topic, timeout);
            let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            let client = inner.as_mut().ok_or(PublishError::ClientUnavailable)?;
            client
                .publish(topic, to_esp_qos(qos), retain, payload)
                .map_err(|e| PublishError::Rejected(e.code()))
        }

        /// Dropping the client stops its task and destroys the handle.
        fn disconnect(&self) {
            let client = self.inner.lock().unwrap_or_else(PoisonError::into_inner).take();
            if client.is_some() {
                debug!("MQTT: stopping client");
            }
            drop(client);
        }
    }

    #[derive(Default)]
    pub struct EspMqttConnector;

    impl SessionConnector for EspMqttConnector {
        type Client = EspBrokerClient;

        fn connect(
            &mut self,
            endpoint: &BrokerEndpoint,
            credentials: &Credentials,
            events: &'static SessionEventChannel,
        ) -> Result<EspBrokerClient, SessionError> {
            let conf = MqttClientConfiguration {
                client_id: Some(endpoint.client_id),
                network_timeout: endpoint.network_timeout,
                server_certificate: Some(X509::pem_until_nul(credentials.root_ca)),
                client_certificate: Some(X509::pem_until_nul(credentials.client_cert)),
                private_key: Some(X509::pem_until_nul(credentials.client_key)),
                ..Default::default()
            };

            let client = EspMqttClient::new_cb(&endpoint.url(), &conf, move |event| {
                match event.payload() {
                    EventPayload::Connected(_) => {
                        post(events, SessionEvent::Connected);
                    }
                    EventPayload::Disconnected => {
                        post(events, SessionEvent::Disconnected);
                    }
                    EventPayload::Error(e) => {
                        warn!("MQTT: transport error {:?}", e);
                        post(events, SessionEvent::Error(ESP_FAIL));
                    }
                    _ => {}
                }
            })
            .map_err(|e| SessionError::InitFailed(e.code()))?;

            Ok(EspBrokerClient {
                inner: Mutex::new(Some(client)),
            })
        }
    }
}

#[cfg(target_os = "espidf")]
pub use esp::{EspBrokerClient, EspMqttConnector};

#[cfg(not(target_os = "espidf"))]
mod sim {
    use core::sync::atomic::{AtomicU32, Ordering};
    use core::time::Duration;
    use std::sync::{Arc, Mutex, PoisonError};

    use log::info;

    use crate::app::ports::{MessageId, PubSubClient, QoS, SessionConnector};
    use crate::config::BrokerEndpoint;
    use crate::error::{PublishError, SessionError};
    use crate::net::channels::{SessionEventChannel, post};
    use crate::net::credentials::Credentials;
    use crate::net::session::SessionEvent;

    /// One accepted publish.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SimPublish {
        pub msg_id: MessageId,
        pub topic: String,
        pub payload: Vec<u8>,
        pub qos: QoS,
        pub retain: bool,
    }

    /// In-memory client. Clones share the same log.
    #[derive(Clone, Default)]
    pub struct SimBrokerClient {
        log: Arc<Mutex<Vec<SimPublish>>>,
        next_id: Arc<AtomicU32>,
        disconnects: Arc<AtomicU32>,
    }

    impl SimBrokerClient {
        pub fn published(&self) -> Vec<SimPublish> {
            self.log.lock().unwrap_or_else(PoisonError::into_inner).clone()
        }

        /// How many times `disconnect` was called.
        pub fn disconnects(&self) -> u32 {
            self.disconnects.load(Ordering::Relaxed)
        }
    }

    impl PubSubClient for SimBrokerClient {
        fn publish(
            &self,
            topic: &str,
            payload: &[u8],
            qos: QoS,
            retain: bool,
            _timeout: Duration,
        ) -> Result<MessageId, PublishError> {
            let msg_id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            self.log
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(SimPublish {
                    msg_id,
                    topic: topic.to_owned(),
                    payload: payload.to_vec(),
                    qos,
                    retain,
                });
            Ok(msg_id)
        }

        fn disconnect(&self) {
            self.disconnects.fetch_add(1, Ordering::Relaxed);
            info!("MQTT(sim): disconnected");
        }
    }

    /// Hands out clones of one [`SimBrokerClient`] and reports `Connected`
    /// on every connect.
    #[derive(Default)]
    pub struct SimMqttConnector {
        client: SimBrokerClient,
    }

    impl SimMqttConnector {
        pub fn client(&self) -> SimBrokerClient {
            self.client.clone()
        }
    }

    impl SessionConnector for SimMqttConnector {
        type Client = SimBrokerClient;

        fn connect(
            &mut self,
            endpoint: &BrokerEndpoint,
            _credentials: &Credentials,
            events: &'static SessionEventChannel,
        ) -> Result<SimBrokerClient, SessionError> {
            info!("MQTT(sim): client for {}", endpoint.url());
            post(events, SessionEvent::Connected);
            Ok(self.client.clone())
        }
    }
}

#[cfg(not(target_os = "espidf"))]
pub use sim::{SimBrokerClient, SimMqttConnector, SimPublish};

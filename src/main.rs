//! SmartParking node: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │  EspGpio  Esp32TimeAdapter  TaskDelay  LogEventSink          │
//! │  WifiStation + LinkEventBridge        EspMqttConnector       │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │  ConnectivityManager   TransportSession   SamplingPublisher  │
//! └──────────────────────────────────────────────────────────────┘
//!
//!  link dispatch ─▶ ConnectivityManager ─▶ (Connected) ─▶ main
//!  session dispatch ─▶ TransportSession ─▶ (first Connected) ─▶ publisher task
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{error, info};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::prelude::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use smartpark::adapters::hardware::EspGpio;
use smartpark::adapters::log_sink::LogEventSink;
use smartpark::adapters::mqtt::{EspBrokerClient, EspMqttConnector};
use smartpark::adapters::time::{Esp32TimeAdapter, TaskDelay};
use smartpark::adapters::wifi::{LinkEventBridge, WifiStation};
use smartpark::app::publisher::SamplingPublisher;
use smartpark::config::{self, NodeConfig};
use smartpark::drivers::hw_init;
use smartpark::drivers::task_pin::{Core, spawn_on_core};
use smartpark::error::ConnectivityError;
use smartpark::net::channels::{LINK_EVENTS, SESSION_EVENTS};
use smartpark::net::connectivity::{ConnectivityManager, LinkState};
use smartpark::net::credentials::Credentials;
use smartpark::net::dispatch::spawn_dispatch;
use smartpark::net::session::{TransportHandle, TransportSession};
use smartpark::sensors::ultrasonic::DistanceSensor;

const PUBLISHER_PRIORITY: u8 = 5;
const PUBLISHER_STACK_KB: usize = 4;

static CREDENTIALS: Credentials = Credentials {
    root_ca: concat!(include_str!("../certs/AmazonRootCA1.pem"), "\0").as_bytes(),
    client_cert: concat!(include_str!("../certs/Node1certificate.crt"), "\0").as_bytes(),
    client_key: concat!(include_str!("../certs/Node1private.key"), "\0").as_bytes(),
};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("SmartParking node v{}", env!("CARGO_PKG_VERSION"));

    let node = NodeConfig::default();

    // ── 2. Peripherals, event loop, NVS ───────────────────────
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. Ultrasonic GPIOs ───────────────────────────────────
    hw_init::init_ultrasonic_pins(&node.spots)?;

    // ── 4. Wi-Fi link ─────────────────────────────────────────
    let mut station = WifiStation::new(
        peripherals.modem,
        sysloop.clone(),
        Some(nvs),
        config::WIFI_SSID,
        config::WIFI_PASS,
    )?;
    let _bridge = LinkEventBridge::register(&LINK_EVENTS)?;

    station.start()?;
    let mut manager = ConnectivityManager::new(station, node.max_link_retries);
    let link = manager.handle();
    spawn_dispatch("link-events\0", &LINK_EVENTS, move |event| {
        manager.handle_event(event);
    })?;

    match link.connect_and_wait(None)? {
        LinkState::Connected => info!("Link: up"),
        state => {
            error!("Link: {} ({:?}), not starting MQTT", ConnectivityError::RetriesExhausted, state);
            park();
        }
    }

    // ── 5. MQTT session + sampling publisher ──────────────────
    let sensor = DistanceSensor::new(EspGpio::new(), Esp32TimeAdapter::new());
    let publisher = SamplingPublisher::new(sensor, TaskDelay, LogEventSink::new(), node.clone());

    let on_ready = move |transport: TransportHandle<EspBrokerClient>| {
        let spawned = spawn_on_core(
            Core::Pro,
            PUBLISHER_PRIORITY,
            PUBLISHER_STACK_KB,
            "publisher\0",
            move || publisher.run(&*transport),
        );
        if let Err(e) = spawned {
            error!("publisher task not started: {}", e);
        }
    };

    let mut connector = EspMqttConnector;
    match TransportSession::start(&mut connector, &node.broker, &CREDENTIALS, &SESSION_EVENTS, on_ready) {
        Ok(session) => {
            spawn_dispatch("session-events\0", &SESSION_EVENTS, move |event| {
                session.handle_event(event);
            })?;
        }
        Err(e) => error!("MQTT: {}; publishing disabled", e),
    }

    // ── 6. Keep driver handles alive ──────────────────────────
    park();
}

fn park() -> ! {
    loop {
        FreeRtos::delay_ms(60_000);
    }
}

//! Integration tests for the bring-up sequence: link events → wait →
//! session start → single publisher spawn.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embassy_sync::channel::Channel;

use smartpark::adapters::mqtt::{SimBrokerClient, SimMqttConnector};
use smartpark::adapters::wifi::WifiStation;
use smartpark::config::{BrokerEndpoint, MAX_LINK_RETRIES};
use smartpark::error::SessionError;
use smartpark::net::channels::{LinkEventChannel, SessionEventChannel};
use smartpark::net::connectivity::{ConnectivityManager, LinkState};
use smartpark::net::credentials::Credentials;
use smartpark::net::dispatch::{drain, spawn_dispatch};
use smartpark::net::session::{SessionEvent, TransportHandle, TransportSession};
use smartpark::pins::{SPOT_1_PINS, SPOT_2_PINS};
use smartpark::sensors::sim::{EchoBench, EchoPlan};

use super::mock_hw::{TEST_CREDENTIALS, bench_publisher};

// One pair of channels per test: tests run in parallel.
static LINK_FLOW: LinkEventChannel = Channel::new();
static SESSION_FLOW: SessionEventChannel = Channel::new();
static LINK_FAIL: LinkEventChannel = Channel::new();
static LINK_THREADED: LinkEventChannel = Channel::new();
static SESSION_BAD: SessionEventChannel = Channel::new();

fn station(events: &'static LinkEventChannel, drops: u32) -> WifiStation {
    let mut sta = WifiStation::new("Parking-Lot", "s3cretpass", events).unwrap();
    sta.fail_next(drops);
    sta.start().unwrap();
    sta
}

// ── Happy path with flaky association ─────────────────────────

#[test]
fn link_settles_then_session_spawns_publisher_once() {
    let mut manager = ConnectivityManager::new(station(&LINK_FLOW, 2), MAX_LINK_RETRIES);
    let link = manager.handle();

    let mut settled = Vec::new();
    drain(&LINK_FLOW, |e| settled.extend(manager.handle_event(e)));

    assert_eq!(settled, [LinkState::Connected]);
    assert_eq!(link.connect_and_wait(Some(Duration::ZERO)), Ok(LinkState::Connected));
    assert_eq!(manager.status().retries, 0);
    assert_eq!(manager.network().associations(), 3);

    // Session: the ready hook stands in for the publisher task spawn.
    let spawns = Arc::new(AtomicUsize::new(0));
    let ready: Arc<Mutex<Option<TransportHandle<SimBrokerClient>>>> = Arc::default();
    let mut connector = SimMqttConnector::default();
    let session = {
        let spawns = Arc::clone(&spawns);
        let ready = Arc::clone(&ready);
        TransportSession::start(
            &mut connector,
            &BrokerEndpoint::default(),
            &TEST_CREDENTIALS,
            &SESSION_FLOW,
            move |handle| {
                spawns.fetch_add(1, Ordering::SeqCst);
                *ready.lock().unwrap() = Some(handle);
            },
        )
        .unwrap()
    };

    assert_eq!(drain(&SESSION_FLOW, |e| session.handle_event(e)), 1);
    assert!(session.is_connected());
    assert_eq!(spawns.load(Ordering::SeqCst), 1);

    // Broker flaps: no second publisher.
    for _ in 0..3 {
        session.handle_event(SessionEvent::Disconnected);
        session.handle_event(SessionEvent::Connected);
    }
    assert_eq!(spawns.load(Ordering::SeqCst), 1);

    // The handle given to the hook publishes through the same client.
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, EchoPlan::Silent);
    bench.attach(SPOT_2_PINS, EchoPlan::Pulse { latency_us: 200, width_us: 350 });
    let handle = ready.lock().unwrap().take().unwrap();
    let report = bench_publisher(&bench).run_cycle(&*handle);
    assert!(report.outcome.is_ok());
    assert_eq!(connector.client().published()[0].payload, br#"{"Estacionamiento2":0}"#);
}

// ── Retry budget ──────────────────────────────────────────────

#[test]
fn exhausted_retries_settle_in_failed() {
    let mut manager = ConnectivityManager::new(station(&LINK_FAIL, u32::MAX), MAX_LINK_RETRIES);
    let link = manager.handle();

    let mut settled = Vec::new();
    drain(&LINK_FAIL, |e| settled.extend(manager.handle_event(e)));

    assert_eq!(settled, [LinkState::Failed], "Failed is signalled exactly once");
    assert_eq!(link.connect_and_wait(None), Ok(LinkState::Failed));
    assert_eq!(manager.status().retries, MAX_LINK_RETRIES);
    assert_eq!(manager.network().associations(), 1 + u32::from(MAX_LINK_RETRIES));
}

// ── Dispatch on its own task ──────────────────────────────────

#[test]
fn bootstrap_wait_returns_once_dispatch_connects() {
    let mut manager = ConnectivityManager::new(station(&LINK_THREADED, 1), MAX_LINK_RETRIES);
    let link = manager.handle();
    spawn_dispatch("link-test\0", &LINK_THREADED, move |e| {
        manager.handle_event(e);
    })
    .unwrap();

    assert_eq!(
        link.connect_and_wait(Some(Duration::from_secs(5))),
        Ok(LinkState::Connected)
    );
}

// ── Transport init failure ────────────────────────────────────

#[test]
fn invalid_credentials_disable_publishing() {
    let bad = Credentials {
        root_ca: b"",
        ..TEST_CREDENTIALS
    };
    let spawns = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&spawns);
    let mut connector = SimMqttConnector::default();

    let result = TransportSession::start(
        &mut connector,
        &BrokerEndpoint::default(),
        &bad,
        &SESSION_BAD,
        move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        },
    );

    assert_eq!(result.err(), Some(SessionError::InvalidCredentials("root_ca")));
    assert!(SESSION_BAD.try_receive().is_err(), "no client, no events");
    assert_eq!(spawns.load(Ordering::SeqCst), 0);
}

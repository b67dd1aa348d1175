//! Integration tests for the sampling cycle: echo bench → distance →
//! occupancy → status message → publish.

use smartpark::adapters::mqtt::{SimBrokerClient, SimMqttConnector};
use smartpark::app::events::AppEvent;
use smartpark::app::ports::QoS;
use smartpark::config::{
    BrokerEndpoint, INTER_SENSOR_DELAY_MS, PUBLISH_INTERVAL_MS, PUBLISH_TIMEOUT, STATUS_TOPIC,
};
use smartpark::error::{PublishError, SensorError};
use smartpark::net::channels::SessionEventChannel;
use smartpark::net::session::{SessionEvent, TransportSession};
use smartpark::pins::{SPOT_1_PINS, SPOT_2_PINS};
use smartpark::sensors::ParkingSpot;
use smartpark::sensors::occupancy::OccupancyState;
use smartpark::sensors::sim::{EchoBench, EchoPlan};

use embassy_sync::channel::Channel;

use super::mock_hw::{ScriptedPublisher, TEST_CREDENTIALS, bench_publisher};

static SESSION: SessionEventChannel = Channel::new();

fn pulse(width_us: u64) -> EchoPlan {
    EchoPlan::Pulse {
        latency_us: 400,
        width_us,
    }
}

// ── One car parked, one spot free ─────────────────────────────

#[test]
fn occupied_and_free_spots_publish_expected_json() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    let report = publisher.run_cycle(&broker);

    assert_eq!(report.outcome, Ok(1));
    assert_eq!(report.message.spot1, Some(OccupancyState::Occupied));
    assert_eq!(report.message.spot2, Some(OccupancyState::Free));

    let sent = broker.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].topic, STATUS_TOPIC);
    assert_eq!(sent[0].payload, r#"{"Estacionamiento1":0,"Estacionamiento2":1}"#);
    assert_eq!(sent[0].timeout, PUBLISH_TIMEOUT);
}

#[test]
fn spot_one_distance_matches_580us_echo() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(580));

    let mut publisher = bench_publisher(&bench);
    publisher.run_cycle(&ScriptedPublisher::default());

    let AppEvent::Sampled { spot, distance_cm, state } = publisher.sink().events[0] else {
        panic!("first event should be a sample, got {:?}", publisher.sink().events[0]);
    };
    assert_eq!(spot, ParkingSpot::One);
    assert!((distance_cm - 9.947).abs() < 1e-3);
    assert_eq!(state, OccupancyState::Occupied);
}

// ── Event ordering + pacing ───────────────────────────────────

#[test]
fn cycle_samples_in_order_with_one_inter_sensor_pause() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(3_000));
    bench.attach(SPOT_2_PINS, pulse(300));

    let mut publisher = bench_publisher(&bench);
    publisher.run_cycle(&ScriptedPublisher::default());

    let spots: Vec<ParkingSpot> = publisher
        .sink()
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Sampled { spot, .. } => Some(*spot),
            _ => None,
        })
        .collect();
    assert_eq!(spots, [ParkingSpot::One, ParkingSpot::Two]);
    assert!(matches!(publisher.sink().events[2], AppEvent::Published { .. }));
    assert_eq!(bench.pauses_ms(), [INTER_SENSOR_DELAY_MS]);

    // Spot 2's trigger fires only after the pause.
    let spot2_trigger = bench
        .writes()
        .into_iter()
        .find(|w| w.pin == SPOT_2_PINS.trigger && w.high)
        .unwrap();
    assert!(spot2_trigger.at_us >= u64::from(INTER_SENSOR_DELAY_MS) * 1_000);
}

// ── Sensor timeouts ───────────────────────────────────────────

#[test]
fn silent_sensor_is_omitted_from_payload() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, EchoPlan::Silent);
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    let report = publisher.run_cycle(&broker);

    assert_eq!(report.message.spot1, None);
    assert_eq!(broker.sent()[0].payload, r#"{"Estacionamiento2":1}"#);
    assert!(publisher.sink().events.contains(&AppEvent::SensorTimeout {
        spot: ParkingSpot::One,
        error: SensorError::EchoStartTimeout,
    }));
}

#[test]
fn both_sensors_timing_out_still_publishes_empty_object() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, EchoPlan::Stuck { latency_us: 100 });
    bench.attach(SPOT_2_PINS, EchoPlan::Silent);

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    let report = publisher.run_cycle(&broker);

    assert!(report.outcome.is_ok());
    assert_eq!(broker.sent()[0].payload, "{}");
    assert_eq!(publisher.sink().published_payloads(), ["{}"]);
}

#[test]
fn sensor_recovers_on_the_next_cycle() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, EchoPlan::Silent);
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    publisher.run_cycle(&broker);

    bench.attach(SPOT_1_PINS, pulse(400));
    publisher.run_cycle(&broker);

    let payloads: Vec<String> = broker.sent().into_iter().map(|s| s.payload).collect();
    assert_eq!(
        payloads,
        [
            r#"{"Estacionamiento2":1}"#,
            r#"{"Estacionamiento1":0,"Estacionamiento2":1}"#
        ]
    );
    assert_eq!(publisher.cycles(), 2);
}

// ── Publish failures ──────────────────────────────────────────

#[test]
fn publish_failure_is_reported_and_loop_continues() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(580));

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    broker.fail_next(PublishError::Rejected(-1));

    let first = publisher.run_cycle(&broker);
    let second = publisher.run_cycle(&broker);

    assert_eq!(first.outcome, Err(PublishError::Rejected(-1)));
    assert_eq!(second.outcome, Ok(1));
    assert!(
        publisher
            .sink()
            .events
            .contains(&AppEvent::PublishFailed(PublishError::Rejected(-1)))
    );
}

#[test]
fn publish_before_session_connects_is_unavailable() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut connector = SimMqttConnector::default();
    let session = TransportSession::start(
        &mut connector,
        &BrokerEndpoint::default(),
        &TEST_CREDENTIALS,
        &SESSION,
        |_| {},
    )
    .unwrap();
    let client: SimBrokerClient = connector.client();

    let mut publisher = bench_publisher(&bench);
    let report = publisher.run_cycle(&*session);
    assert_eq!(report.outcome, Err(PublishError::ClientUnavailable));
    assert!(client.published().is_empty());

    session.handle_event(SessionEvent::Connected);
    let report = publisher.run_cycle(&*session);
    assert!(report.outcome.is_ok());

    let published = client.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].qos, QoS::AtLeastOnce);
    assert!(!published[0].retain);
    assert_eq!(published[0].payload, br#"{"Estacionamiento1":0,"Estacionamiento2":1}"#);
}

// ── Loop cadence ──────────────────────────────────────────────

#[test]
fn every_tick_waits_the_publish_interval_even_after_a_failure() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut publisher = bench_publisher(&bench);
    let broker = ScriptedPublisher::default();
    broker.fail_next(PublishError::ClientUnavailable);

    let first = publisher.tick(&broker);
    let second = publisher.tick(&broker);

    assert_eq!(first.outcome, Err(PublishError::ClientUnavailable));
    assert_eq!(second.outcome, Ok(1));
    assert_eq!(publisher.cycles(), 2);
    assert_eq!(
        bench.pauses_ms(),
        [
            INTER_SENSOR_DELAY_MS,
            PUBLISH_INTERVAL_MS,
            INTER_SENSOR_DELAY_MS,
            PUBLISH_INTERVAL_MS
        ]
    );
    assert_eq!(broker.sent().len(), 1);
}

#[test]
fn closed_session_stops_publishing() {
    let bench = EchoBench::new();
    bench.attach(SPOT_1_PINS, pulse(580));
    bench.attach(SPOT_2_PINS, pulse(2_000));

    let mut connector = SimMqttConnector::default();
    let session = TransportSession::start(
        &mut connector,
        &BrokerEndpoint::default(),
        &TEST_CREDENTIALS,
        &SESSION,
        |_| {},
    )
    .unwrap();
    let client = connector.client();
    session.handle_event(SessionEvent::Connected);

    let mut publisher = bench_publisher(&bench);
    assert!(publisher.tick(&*session).outcome.is_ok());

    session.disconnect();
    let report = publisher.tick(&*session);
    assert_eq!(report.outcome, Err(PublishError::ClientUnavailable));
    assert_eq!(client.disconnects(), 1);
    assert_eq!(client.published().len(), 1);
}

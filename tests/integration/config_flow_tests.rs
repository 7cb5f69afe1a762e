//! Inbound configuration path without the runtime: session handler →
//! staging buffer → dispatcher → publisher queue.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use radarbridge::adapters::loopback::LoopbackSession;
use radarbridge::adapters::sim_radar::{SimRadarHandle, SimulatedRadar};
use radarbridge::app::commands::{PublisherCommand, SessionCommand};
use radarbridge::app::ports::{MessageSession, SensingEngine};
use radarbridge::config::Topic;
use radarbridge::locks::{PayloadLock, SharedEngine};
use radarbridge::mode::OperatingMode;
use radarbridge::payload::PAYLOAD_CAPACITY;
use radarbridge::pins::HardwareConfig;
use radarbridge::queue::WakeSignal;
use radarbridge::shutdown::{HaltReason, Shutdown};
use radarbridge::tasks::config_dispatcher::ConfigDispatcher;
use radarbridge::tasks::subscriber::{PayloadStager, session_event_handler};
use radarbridge::tasks::{PublisherQueue, SessionQueue};
use radarbridge::telemetry::SensingCounters;

use crate::mock_hw::wait_until;

const TOPIC: &str = "radar/config";

struct Flow {
    session: Arc<LoopbackSession>,
    radar: SimRadarHandle,
    publisher: Arc<PublisherQueue>,
    coordinator: Arc<SessionQueue>,
    counters: Arc<SensingCounters>,
    wake: Arc<WakeSignal>,
    shutdown: Shutdown,
    dispatcher: thread::JoinHandle<()>,
}

fn flow(mode: OperatingMode) -> Flow {
    let mut radar = SimulatedRadar::new();
    radar.init(&HardwareConfig::board(), mode.event_mask()).unwrap();
    radar.enable().unwrap();
    let handle = radar.handle();

    let payload = PayloadLock::new();
    let wake = Arc::new(WakeSignal::new());
    let publisher = Arc::new(PublisherQueue::new("publisher"));
    let coordinator = Arc::new(SessionQueue::new("session"));
    let counters = Arc::new(SensingCounters::new());
    let shutdown = Shutdown::new();

    let session = Arc::new(LoopbackSession::new());
    session.set_event_handler(session_event_handler(
        PayloadStager::new(payload.clone(), Arc::clone(&wake)),
        Topic::try_from(TOPIC).unwrap(),
        Arc::clone(&coordinator),
    ));
    session.connect().unwrap();
    session.subscribe(TOPIC, Default::default()).unwrap();

    let dispatcher = ConfigDispatcher::new(
        mode,
        payload,
        SharedEngine::new(radar),
        Arc::clone(&counters),
        Arc::clone(&publisher),
        Arc::clone(&wake),
        shutdown.clone(),
    );
    let dispatcher = thread::spawn(move || dispatcher.run());

    Flow {
        session,
        radar: handle,
        publisher,
        coordinator,
        counters,
        wake,
        shutdown,
        dispatcher,
    }
}

impl Flow {
    fn drain(&self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(cmd) = self.publisher.try_recv() {
            if let PublisherCommand::Publish(msg) = cmd {
                out.push(msg.as_str().to_owned());
            }
        }
        out
    }

    fn collect(&self, n: usize) -> Vec<String> {
        let mut out = Vec::new();
        wait_until(Duration::from_secs(2), || {
            out.extend(self.drain());
            out.len() >= n
        });
        out
    }

    fn stop(self) {
        self.shutdown.trigger(HaltReason::Requested);
        self.wake.post(());
        self.dispatcher.join().unwrap();
    }
}

#[test]
fn presence_payload_round_trip() {
    let f = flow(OperatingMode::Presence);
    assert!(f.session.inject(TOPIC, br#"{"radar_presence_range_max":"2.0"}"#));
    assert_eq!(
        f.collect(1),
        vec!["Config => radar_presence_range_max: 2.0".to_owned()]
    );
    assert_eq!(f.radar.parameter("radar_presence_range_max").as_deref(), Some("2.0"));
    f.stop();
}

#[test]
fn every_pair_gets_one_ack_in_order() {
    let f = flow(OperatingMode::Counter);
    f.session.inject(
        TOPIC,
        br#"{"radar_counter_orientation":"landscape","radar_presence_sensitivity":"low","radar_counter_ceiling_height":"99","radar_counter_out_number":"7"}"#,
    );
    assert_eq!(
        f.collect(4),
        vec![
            "Config => radar_counter_orientation: landscape".to_owned(),
            "\"radar_presence_sensitivity\": invalid entry key.".to_owned(),
            "radar_counter_ceiling_height: configuration failed.".to_owned(),
            "Config => radar_counter_out_number: 7".to_owned(),
        ]
    );
    assert_eq!(
        f.counters.counter_snapshot(),
        radarbridge::telemetry::TelemetrySnapshot::Counter {
            in_count: 0,
            out_count: 7,
            occupied: false
        }
    );
    f.stop();
}

#[test]
fn malformed_payload_applies_leading_pairs_only() {
    let f = flow(OperatingMode::Presence);
    f.session.inject(
        TOPIC,
        br#"{"radar_presence_sensitivity":"high","radar_presence_range_max":1.5}"#,
    );
    assert_eq!(
        f.collect(1),
        vec!["Config => radar_presence_sensitivity: high".to_owned()]
    );
    thread::sleep(Duration::from_millis(50));
    assert!(f.drain().is_empty());
    assert_eq!(f.radar.parameter("radar_presence_range_max"), None);
    f.stop();
}

#[test]
fn messages_on_other_topics_are_ignored() {
    let f = flow(OperatingMode::Presence);
    f.session.subscribe("radar/other", Default::default()).unwrap();
    assert!(f.session.inject("radar/other", br#"{"radar_presence_range_max":"1.0"}"#));
    thread::sleep(Duration::from_millis(50));
    assert!(f.drain().is_empty());
    f.stop();
}

#[test]
fn oversize_message_keeps_previous_payload() {
    let payload = PayloadLock::new();
    let wake = Arc::new(WakeSignal::new());
    let stager = PayloadStager::new(payload.clone(), Arc::clone(&wake));

    stager.on_message(b"{\"a\":\"b\"}").unwrap();
    wake.try_take();
    assert!(stager.on_message(&vec![b'x'; PAYLOAD_CAPACITY]).is_err());
    assert!(!wake.is_pending());
    assert_eq!(payload.lock().as_bytes(), b"{\"a\":\"b\"}");
}

#[test]
fn disconnect_event_reaches_coordinator_queue() {
    let f = flow(OperatingMode::Presence);
    f.session.drop_connection();
    assert_eq!(f.coordinator.try_recv(), Some(SessionCommand::Disconnection));
    f.stop();
}

#[test]
fn staging_and_dispatch_never_interleave() {
    let payload = PayloadLock::new();
    let long = vec![b'a'; 400];
    let short = vec![b'b'; 100];

    let writer = {
        let payload = payload.clone();
        let (long, short) = (long.clone(), short.clone());
        thread::spawn(move || {
            for i in 0..2_000 {
                let msg = if i % 2 == 0 { &long } else { &short };
                payload.lock().stage(msg).unwrap();
            }
        })
    };

    for _ in 0..2_000 {
        let buf = payload.lock();
        let raw = buf.raw();
        match buf.len() {
            0 => assert!(raw.iter().all(|&b| b == 0)),
            400 => {
                assert!(raw[..400].iter().all(|&b| b == b'a'));
                assert!(raw[400..].iter().all(|&b| b == 0));
            }
            100 => {
                assert!(raw[..100].iter().all(|&b| b == b'b'));
                assert!(raw[100..].iter().all(|&b| b == 0));
            }
            n => panic!("torn write: len {n}"),
        }
    }
    writer.join().unwrap();
}

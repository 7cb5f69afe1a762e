//! Property tests for the pure parts of the bridge: the payload scanner,
//! the staging buffer, the LED pattern automaton and config dispatch.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.

#![cfg(not(target_os = "espidf"))]

use std::sync::Arc;

use proptest::prelude::*;
use radarbridge::adapters::sim_radar::SimulatedRadar;
use radarbridge::app::commands::PublisherCommand;
use radarbridge::app::ports::{LedColour, SensingEngine};
use radarbridge::drivers::led_patterns::PatternEngine;
use radarbridge::events::RadarEvent;
use radarbridge::locks::{PayloadLock, SharedEngine};
use radarbridge::mode::OperatingMode;
use radarbridge::payload::PAYLOAD_CAPACITY;
use radarbridge::pins::HardwareConfig;
use radarbridge::queue::WakeSignal;
use radarbridge::scanner::scan;
use radarbridge::shutdown::Shutdown;
use radarbridge::tasks::PublisherQueue;
use radarbridge::tasks::config_dispatcher::ConfigDispatcher;
use radarbridge::tasks::subscriber::PayloadStager;
use radarbridge::telemetry::SensingCounters;

// ── Scanner ───────────────────────────────────────────────────

proptest! {
    /// Arbitrary text never panics the scanner and it always terminates.
    #[test]
    fn scanner_total_on_arbitrary_text(text in ".{0,256}") {
        let items: Vec<_> = scan(&text).take(1_000).collect();
        prop_assert!(items.len() < 1_000);
        // At most one error, and only as the last item.
        if let Some(pos) = items.iter().position(|i| i.is_err()) {
            prop_assert_eq!(pos, items.len() - 1);
        }
    }

    /// Flat objects with plain string members scan back pair for pair.
    #[test]
    fn scanner_yields_every_member(
        pairs in proptest::collection::vec(("[a-z_]{1,20}", "[A-Za-z0-9. ]{0,20}"), 0..8),
    ) {
        let body: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("\"{k}\" : \"{v}\""))
            .collect();
        let text = format!("{{ {} }}", body.join(", "));
        let scanned: Vec<(String, String)> = scan(&text)
            .map(|p| p.map(|p| (p.key.to_owned(), p.value.to_owned())))
            .collect::<Result<_, _>>()
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        prop_assert_eq!(scanned, pairs);
    }
}

// ── Staging buffer ────────────────────────────────────────────

proptest! {
    /// Messages that fit replace the buffer exactly with a zeroed tail;
    /// messages that do not fit change nothing and wake nobody.
    #[test]
    fn staging_respects_capacity(
        first in proptest::collection::vec(1u8..=255u8, 0..PAYLOAD_CAPACITY),
        len in 0usize..(2 * PAYLOAD_CAPACITY),
    ) {
        let payload = PayloadLock::new();
        let wake = Arc::new(WakeSignal::new());
        let stager = PayloadStager::new(payload.clone(), Arc::clone(&wake));
        stager.on_message(&first).unwrap();
        wake.try_take();

        let message = vec![b'z'; len];
        let result = stager.on_message(&message);
        let buf = payload.lock();
        if len >= PAYLOAD_CAPACITY {
            prop_assert!(result.is_err());
            prop_assert!(!wake.is_pending());
            prop_assert_eq!(buf.as_bytes(), &first[..]);
        } else {
            prop_assert!(result.is_ok());
            prop_assert!(wake.is_pending());
            prop_assert_eq!(buf.as_bytes(), &message[..]);
            prop_assert!(buf.raw()[len..].iter().all(|&b| b == 0));
        }
    }
}

// ── LED pattern automaton ─────────────────────────────────────

#[derive(Debug, Clone)]
enum PatternOp {
    Event(RadarEvent),
    Ticks(u8),
}

fn pattern_op() -> impl Strategy<Value = PatternOp> {
    prop_oneof![
        (0..RadarEvent::ALL.len()).prop_map(|i| PatternOp::Event(RadarEvent::ALL[i])),
        any::<u8>().prop_map(PatternOp::Ticks),
    ]
}

proptest! {
    /// The LED only ever shows the latched colour or off, and the exit
    /// blink makes no progress while an entry blink is still pending.
    #[test]
    fn pattern_outputs_and_priority(ops in proptest::collection::vec(pattern_op(), 0..40)) {
        let mut engine = PatternEngine::new();
        for op in ops {
            match op {
                PatternOp::Event(event) => engine.set_pattern(event),
                PatternOp::Ticks(n) => {
                    for _ in 0..n {
                        let entry_running = engine.in_pending() > 0;
                        let out_before = engine.out_pending();
                        let colour = engine.tick();
                        prop_assert!(colour == LedColour::Off || colour == engine.colour());
                        if entry_running {
                            prop_assert_eq!(engine.out_pending(), out_before);
                        }
                        prop_assert!(engine.in_pending() <= 1);
                        prop_assert!(engine.out_pending() <= 1);
                    }
                }
            }
        }
    }
}

// ── Config dispatch ───────────────────────────────────────────

proptest! {
    /// Every scanned pair is acknowledged exactly once unless the
    /// publisher queue overflowed.
    #[test]
    fn dispatch_acks_each_pair(
        pairs in proptest::collection::vec(
            (
                prop_oneof![
                    Just("radar_presence_range_max".to_owned()),
                    Just("radar_presence_sensitivity".to_owned()),
                    "[a-z_]{1,20}",
                ],
                "[a-z0-9.]{0,40}",
            ),
            0..14,
        ),
    ) {
        let mut radar = SimulatedRadar::new();
        radar.init(&HardwareConfig::board(), OperatingMode::Presence.event_mask()).unwrap();
        let publisher = Arc::new(PublisherQueue::new("publisher"));
        let payload = PayloadLock::new();
        let dispatcher = ConfigDispatcher::new(
            OperatingMode::Presence,
            payload.clone(),
            SharedEngine::new(radar),
            Arc::new(SensingCounters::new()),
            Arc::clone(&publisher),
            Arc::new(WakeSignal::new()),
            Shutdown::new(),
        );

        let body: Vec<String> = pairs.iter().map(|(k, v)| format!("\"{k}\":\"{v}\"")).collect();
        let text = format!("{{{}}}", body.join(","));
        prop_assume!(text.len() < PAYLOAD_CAPACITY);
        payload.lock().stage(text.as_bytes()).unwrap();

        let report = dispatcher.dispatch();
        prop_assert!(!report.malformed);
        prop_assert_eq!(report.pairs() as usize, pairs.len());

        let mut queued = 0;
        while let Some(PublisherCommand::Publish(_)) = publisher.try_recv() {
            queued += 1;
        }
        prop_assert_eq!(queued, pairs.len() - report.dropped as usize);
        prop_assert!(queued <= publisher.capacity());
    }
}

//! Fuzz target: inbound configuration payloads
//!
//! Stages arbitrary bytes the way the subscriber does and runs one
//! dispatch pass against the simulated radar in both modes.  Neither the
//! scanner nor the dispatcher may panic, and every scanned pair must be
//! accounted for by exactly one acknowledgment or drop.
//!
//! cargo fuzz run fuzz_config_payload

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use radarbridge::adapters::sim_radar::SimulatedRadar;
use radarbridge::app::ports::SensingEngine;
use radarbridge::locks::{PayloadLock, SharedEngine};
use radarbridge::mode::OperatingMode;
use radarbridge::pins::HardwareConfig;
use radarbridge::queue::WakeSignal;
use radarbridge::scanner::scan;
use radarbridge::shutdown::Shutdown;
use radarbridge::tasks::PublisherQueue;
use radarbridge::tasks::config_dispatcher::ConfigDispatcher;
use radarbridge::tasks::subscriber::PayloadStager;
use radarbridge::telemetry::SensingCounters;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = core::str::from_utf8(data) {
        for item in scan(text) {
            if let Ok(pair) = item {
                assert!(pair.key.len() + pair.value.len() < text.len());
            }
        }
    }

    for mode in [OperatingMode::Counter, OperatingMode::Presence] {
        let mut radar = SimulatedRadar::new();
        if radar.init(&HardwareConfig::board(), mode.event_mask()).is_err() {
            return;
        }
        let payload = PayloadLock::new();
        let wake = Arc::new(WakeSignal::new());
        let publisher = Arc::new(PublisherQueue::new("publisher"));
        let dispatcher = ConfigDispatcher::new(
            mode,
            payload.clone(),
            SharedEngine::new(radar),
            Arc::new(SensingCounters::new()),
            Arc::clone(&publisher),
            Arc::clone(&wake),
            Shutdown::new(),
        );

        if PayloadStager::new(payload, wake).on_message(data).is_err() {
            return;
        }
        let report = dispatcher.dispatch();
        assert_eq!(
            publisher.len() as u32 + report.dropped,
            report.pairs(),
            "every pair is acknowledged or dropped"
        );
    }
});

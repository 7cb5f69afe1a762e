//! Mock outputs and helpers shared by the integration tests.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use radarbridge::app::ports::{LedColour, StatusLedPort};
use radarbridge::config::{RemediationPolicy, SystemConfig};
use radarbridge::mode::OperatingMode;

// ── RecordingLed ──────────────────────────────────────────────

/// Status LED that records every colour change.  Clones share the log,
/// so a test keeps one clone after handing the other to the runtime.
#[derive(Clone, Default)]
pub struct RecordingLed {
    log: Arc<Mutex<Vec<LedColour>>>,
}

#[allow(dead_code)]
impl RecordingLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<LedColour> {
        self.log.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<LedColour> {
        self.log.lock().unwrap().last().copied()
    }
}

impl StatusLedPort for RecordingLed {
    fn set_colour(&mut self, colour: LedColour) {
        self.log.lock().unwrap().push(colour);
    }
}

// ── Helpers ───────────────────────────────────────────────────

/// Defaults with every retry interval shortened for tests.
#[allow(dead_code)]
pub fn fast_config(mode: OperatingMode) -> SystemConfig {
    SystemConfig {
        mode,
        publish_retry_ms: 2,
        subscribe_retry_ms: 2,
        remediation: RemediationPolicy::Reconnect {
            max_attempts: 3,
            retry_ms: 5,
        },
        ..SystemConfig::default()
    }
}

/// Poll `cond` every few milliseconds until it holds or `timeout` passes.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if cond() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

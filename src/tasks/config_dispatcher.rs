//! Config dispatcher task.
//!
//! Woken by the subscriber's inbound handler.  On each wake it takes the
//! payload lock and then the engine lock, scans the staged payload pair
//! by pair, applies each pair, and queues one acknowledgment per pair to
//! the publisher.  Both locks are held for the whole scan so a payload is
//! applied atomically with respect to the sensing driver's `advance`.
//!
//! ```text
//!   key not permitted in mode   → "\"<key>\": invalid entry key."
//!   engine / parse rejects it   → "<key>: configuration failed."
//!   applied                     → "Config => <key>: <value>"
//! ```

use std::sync::Arc;

use log::{debug, error, info, warn};

use crate::app::commands::PublisherCommand;
use crate::app::ports::SensingEngine;
use crate::locks::{PayloadLock, SharedEngine};
use crate::mode::{KeyKind, OperatingMode};
use crate::queue::WakeSignal;
use crate::scanner::scan;
use crate::shutdown::Shutdown;
use crate::telemetry::{ConfigAck, SensingCounters};

use super::PublisherQueue;

/// Longest value forwarded to the engine; longer ones fail outright.
pub const MAX_VALUE_LEN: usize = 31;

/// What one dispatch pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Pairs applied (engine parameters and counter resets).
    pub applied: u32,
    /// Pairs whose key is not permitted in the active mode.
    pub rejected: u32,
    /// Permitted pairs whose value was refused.
    pub failed: u32,
    /// Acknowledgments lost to a full publisher queue or an oversize key.
    pub dropped: u32,
    /// The payload was not valid UTF-8 or stopped scanning early.
    pub malformed: bool,
}

impl ApplyReport {
    pub fn pairs(&self) -> u32 {
        self.applied + self.rejected + self.failed
    }
}

pub struct ConfigDispatcher<E> {
    mode: OperatingMode,
    payload: PayloadLock,
    engine: SharedEngine<E>,
    counters: Arc<SensingCounters>,
    publisher: Arc<PublisherQueue>,
    wake: Arc<WakeSignal>,
    shutdown: Shutdown,
}

impl<E: SensingEngine> ConfigDispatcher<E> {
    pub fn new(
        mode: OperatingMode,
        payload: PayloadLock,
        engine: SharedEngine<E>,
        counters: Arc<SensingCounters>,
        publisher: Arc<PublisherQueue>,
        wake: Arc<WakeSignal>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            mode,
            payload,
            engine,
            counters,
            publisher,
            wake,
            shutdown,
        }
    }

    /// Apply the currently staged payload.
    pub fn dispatch(&self) -> ApplyReport {
        let mut report = ApplyReport::default();

        // Lock order: payload before engine.
        let buffer = self.payload.lock();
        let mut engine = self.engine.lock();

        let text = match buffer.as_str() {
            Ok(text) => text,
            Err(e) => {
                warn!("CFG: payload is not UTF-8 ({}), ignored", e);
                report.malformed = true;
                return report;
            }
        };

        for item in scan(text) {
            let pair = match item {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("CFG: malformed payload: {}", e);
                    report.malformed = true;
                    break;
                }
            };
            let ack = self.apply(&mut *engine, pair.key, pair.value);
            match ack {
                ConfigAck::Applied { .. } => report.applied += 1,
                ConfigAck::InvalidKey { .. } => report.rejected += 1,
                ConfigAck::Failed { .. } => report.failed += 1,
            }
            if !self.acknowledge(&ack) {
                report.dropped += 1;
            }
        }

        debug!("CFG: {:?}", report);
        report
    }

    fn apply<'a>(&self, engine: &mut E, key: &'a str, value: &'a str) -> ConfigAck<'a> {
        let Some(kind) = self.mode.classify_key(key) else {
            return ConfigAck::InvalidKey { key };
        };
        if value.len() > MAX_VALUE_LEN {
            warn!("CFG: value for '{}' is {} bytes, limit {}", key, value.len(), MAX_VALUE_LEN);
            return ConfigAck::Failed { key };
        }
        let result = match kind {
            KeyKind::EngineParameter(name) => engine.set_parameter(name, value).map_err(|e| {
                warn!("CFG: engine rejected {}={}: {}", key, value, e);
            }),
            KeyKind::ResetInCount => value
                .parse::<i32>()
                .map(|n| self.counters.set_in_count(n))
                .map_err(|_| warn!("CFG: '{}' is not an integer", value)),
            KeyKind::ResetOutCount => value
                .parse::<i32>()
                .map(|n| self.counters.set_out_count(n))
                .map_err(|_| warn!("CFG: '{}' is not an integer", value)),
        };
        match result {
            Ok(()) => {
                info!("CFG: {} = {}", key, value);
                ConfigAck::Applied { key, value }
            }
            Err(()) => ConfigAck::Failed { key },
        }
    }

    /// Queue the acknowledgment without blocking.  Returns `false` if it
    /// was dropped.
    fn acknowledge(&self, ack: &ConfigAck<'_>) -> bool {
        match ack.to_message() {
            Ok(message) => self.publisher.send_or_drop(PublisherCommand::Publish(message)),
            Err(e) => {
                warn!("CFG: acknowledgment '{}' dropped: {}", ack, e);
                false
            }
        }
    }

    pub fn run(self) {
        info!("CFG: waiting for {} mode configuration", self.mode.label());
        loop {
            self.wake.wait();
            if self.shutdown.is_requested() {
                break;
            }
            let report = self.dispatch();
            if report.malformed && report.pairs() == 0 {
                error!("CFG: nothing applied from malformed payload");
            }
        }
        info!("CFG: stopped");
    }
}

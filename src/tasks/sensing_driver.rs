//! Sensing engine driver task.
//!
//! Startup is an explicit `Result` chain: init, callback registration,
//! default parameters, enable.  Any failure aborts startup and is
//! reported to the caller; nothing is retried.
//!
//! The loop then advances the engine every few milliseconds under the
//! engine lock.  Events arrive through the registered callback *inside*
//! `advance`, with the engine lock still held, so [`RadarEventHandler`]
//! only touches atomics, a non-blocking queue and the pattern lock.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{error, info, warn};

use crate::app::commands::{PublisherCommand, SystemStatus};
use crate::app::ports::{Clock, SensingEngine};
use crate::error::EngineError;
use crate::events::{EventInfo, RadarEvent};
use crate::locks::SharedEngine;
use crate::mode::OperatingMode;
use crate::pins::HardwareConfig;
use crate::shutdown::Shutdown;
use crate::telemetry::SensingCounters;

use super::led_responder::EventResponder;
use super::{PublisherQueue, StatusSlot};

/// Work done for every event the engine reports.
#[derive(Clone)]
pub struct RadarEventHandler {
    mode: OperatingMode,
    counters: Arc<SensingCounters>,
    publisher: Arc<PublisherQueue>,
    responder: EventResponder,
}

impl RadarEventHandler {
    pub fn new(
        mode: OperatingMode,
        counters: Arc<SensingCounters>,
        publisher: Arc<PublisherQueue>,
        responder: EventResponder,
    ) -> Self {
        Self {
            mode,
            counters,
            publisher,
            responder,
        }
    }

    /// Update counters, queue telemetry, update the LED pattern.
    /// Returns `false` for an event outside the mode's vocabulary.
    pub fn handle(&self, event: RadarEvent, info: &EventInfo) -> bool {
        if !self.mode.accepts(event) {
            error!(
                "RADAR: {} event in {} mode ignored",
                event.label(),
                self.mode.label()
            );
            return false;
        }
        let snapshot = self.counters.record(event);
        match snapshot.to_message() {
            Ok(message) => {
                info!("RADAR: {} @{}ms -> {}", event.label(), info.timestamp_ms, message);
                self.publisher.send_or_drop(PublisherCommand::Publish(message));
            }
            Err(e) => warn!("RADAR: telemetry dropped: {}", e),
        }
        self.responder.set_pattern(event);
        true
    }
}

pub struct SensingDriver<E, C> {
    mode: OperatingMode,
    hardware: HardwareConfig,
    engine: SharedEngine<E>,
    clock: C,
    handler: RadarEventHandler,
    status: Arc<StatusSlot>,
    shutdown: Shutdown,
    interval: Duration,
    last_timestamp: u64,
}

impl<E: SensingEngine, C: Clock> SensingDriver<E, C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        mode: OperatingMode,
        hardware: HardwareConfig,
        engine: SharedEngine<E>,
        clock: C,
        handler: RadarEventHandler,
        status: Arc<StatusSlot>,
        shutdown: Shutdown,
        interval: Duration,
    ) -> Self {
        Self {
            mode,
            hardware,
            engine,
            clock,
            handler,
            status,
            shutdown,
            interval,
            last_timestamp: 0,
        }
    }

    /// Bring the engine up.  Must succeed before [`run`](Self::run).
    pub fn start(&self) -> Result<(), EngineError> {
        let mut engine = self.engine.lock();
        engine.init(&self.hardware, self.mode.event_mask())?;

        let handler = self.handler.clone();
        engine.register_callback(Box::new(move |event: RadarEvent, info: &EventInfo| {
            handler.handle(event, info);
        }))?;

        for (key, value) in self.mode.default_parameters() {
            engine.set_parameter(key, value).map_err(|e| {
                error!("RADAR: default {}={} rejected: {}", key, value, e);
                e
            })?;
        }

        engine.enable()?;
        info!("RADAR: engine enabled in {} mode", self.mode.label());
        Ok(())
    }

    /// Never hands `advance` a timestamp lower than the previous one.
    fn next_timestamp(&mut self) -> u64 {
        self.last_timestamp = self.clock.now_ms().max(self.last_timestamp);
        self.last_timestamp
    }

    /// One locked `advance` call.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let now = self.next_timestamp();
        self.engine.lock().advance(now)
    }

    /// Advance until shutdown.  An advance failure is fatal: it is posted
    /// to the coordinator and returned.
    pub fn run(mut self) -> Result<(), EngineError> {
        while !self.shutdown.is_requested() {
            if let Err(e) = self.step() {
                error!("RADAR: advance failed: {}", e);
                self.status.post(SystemStatus::EngineFault(e));
                return Err(e);
            }
            thread::sleep(self.interval);
        }
        info!("RADAR: stopped");
        Ok(())
    }
}

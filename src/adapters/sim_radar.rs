//! Simulated radar sensing engine.
//!
//! Implements [`SensingEngine`] without hardware: parameters are
//! validated the way the radar library validates them, and events are
//! replayed from a script keyed by engine timestamp.  A cloneable
//! [`SimRadarHandle`] lets the owner keep scripting and inspecting the
//! engine after it has been moved behind the engine lock.
//!
//! ```text
//!   Uninit ──init──▶ Initialised ──enable──▶ Enabled ──advance(ts)──▶ callback(event)…
//! ```

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

use crate::app::ports::{EventCallback, SensingEngine};
use crate::error::EngineError;
use crate::events::{EventInfo, RadarEvent};
use crate::mode::EventMask;
use crate::pins::HardwareConfig;

/// One event the simulator will emit once `advance` reaches `at_ms`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedEvent {
    pub at_ms: u64,
    pub event: RadarEvent,
    pub info: EventInfo,
}

impl ScriptedEvent {
    pub fn new(at_ms: u64, event: RadarEvent) -> Self {
        Self {
            at_ms,
            event,
            info: EventInfo::at(at_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninit,
    Initialised,
    Enabled,
}

#[derive(Default)]
struct SimShared {
    params: BTreeMap<String, String>,
    script: VecDeque<ScriptedEvent>,
    fail_init: bool,
    fail_next_advance: bool,
    advance_calls: u64,
    last_timestamp: Option<u64>,
    delivered: u64,
}

/// Inspection / scripting handle shared with a [`SimulatedRadar`].
#[derive(Clone, Default)]
pub struct SimRadarHandle {
    shared: Arc<Mutex<SimShared>>,
}

impl SimRadarHandle {
    fn lock(&self) -> MutexGuard<'_, SimShared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an event; the script stays ordered by timestamp.
    pub fn push(&self, scripted: ScriptedEvent) {
        let mut st = self.lock();
        let idx = st.script.partition_point(|e| e.at_ms <= scripted.at_ms);
        st.script.insert(idx, scripted);
    }

    pub fn push_event(&self, at_ms: u64, event: RadarEvent) {
        self.push(ScriptedEvent::new(at_ms, event));
    }

    /// Current value of an engine parameter, if it was ever set.
    pub fn parameter(&self, key: &str) -> Option<String> {
        self.lock().params.get(key).cloned()
    }

    pub fn fail_init(&self) {
        self.lock().fail_init = true;
    }

    /// Make the next `advance` call report a processing failure.
    pub fn fail_next_advance(&self) {
        self.lock().fail_next_advance = true;
    }

    pub fn advance_calls(&self) -> u64 {
        self.lock().advance_calls
    }

    pub fn last_timestamp(&self) -> Option<u64> {
        self.lock().last_timestamp
    }

    pub fn delivered_events(&self) -> u64 {
        self.lock().delivered
    }

    pub fn pending_events(&self) -> usize {
        self.lock().script.len()
    }
}

/// Scripted stand-in for the radar sensing library.
pub struct SimulatedRadar {
    phase: Phase,
    mask: Option<EventMask>,
    callback: Option<EventCallback>,
    handle: SimRadarHandle,
}

impl SimulatedRadar {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninit,
            mask: None,
            callback: None,
            handle: SimRadarHandle::default(),
        }
    }

    pub fn handle(&self) -> SimRadarHandle {
        self.handle.clone()
    }

    pub fn mask(&self) -> Option<EventMask> {
        self.mask
    }
}

impl Default for SimulatedRadar {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_in_range(value: &str, min_exclusive: f32, max: f32) -> Result<(), EngineError> {
    match value.parse::<f32>() {
        Ok(v) if v > min_exclusive && v <= max => Ok(()),
        _ => Err(EngineError::InvalidValue),
    }
}

fn one_of(value: &str, allowed: &[&str]) -> Result<(), EngineError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(EngineError::InvalidValue)
    }
}

/// Value rules of the radar library's textual parameter interface.
pub fn validate_parameter(key: &str, value: &str) -> Result<(), EngineError> {
    match key {
        "radar_counter_installation" => one_of(value, &["side", "ceiling"]),
        "radar_counter_orientation" => one_of(value, &["portrait", "landscape"]),
        "radar_counter_ceiling_height" => parse_in_range(value, 0.0, 10.0),
        "radar_counter_entrance_width" => parse_in_range(value, 0.0, 10.0),
        "radar_counter_sensitivity" => parse_in_range(value, -f32::EPSILON, 1.0),
        "radar_counter_traffic_light_zone" => parse_in_range(value, 0.0, 10.0),
        "radar_counter_reverse" => one_of(value, &["true", "false"]),
        "radar_counter_min_person_height" => parse_in_range(value, 0.0, 3.0),
        "radar_presence_range_max" => parse_in_range(value, 0.0, 5.0),
        "radar_presence_sensitivity" => one_of(value, &["low", "medium", "high"]),
        _ => Err(EngineError::UnknownParameter),
    }
}

impl SensingEngine for SimulatedRadar {
    fn init(&mut self, hw: &HardwareConfig, mask: EventMask) -> Result<(), EngineError> {
        if self.handle.lock().fail_init {
            return Err(EngineError::InitFailed);
        }
        debug!("SIMRADAR: init {:?} spi_cs={} irq={}", mask, hw.spi_cs, hw.irq);
        self.mask = Some(mask);
        self.phase = Phase::Initialised;
        Ok(())
    }

    fn register_callback(&mut self, callback: EventCallback) -> Result<(), EngineError> {
        if self.phase == Phase::Uninit {
            return Err(EngineError::CallbackRegistration);
        }
        self.callback = Some(callback);
        Ok(())
    }

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), EngineError> {
        if self.phase == Phase::Uninit {
            return Err(EngineError::InitFailed);
        }
        validate_parameter(key, value)?;
        self.handle
            .lock()
            .params
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn enable(&mut self) -> Result<(), EngineError> {
        if self.phase == Phase::Uninit {
            return Err(EngineError::InitFailed);
        }
        self.phase = Phase::Enabled;
        Ok(())
    }

    fn advance(&mut self, timestamp_ms: u64) -> Result<(), EngineError> {
        if self.phase != Phase::Enabled {
            return Err(EngineError::NotEnabled);
        }
        let due: Vec<ScriptedEvent> = {
            let mut st = self.handle.lock();
            st.advance_calls += 1;
            if std::mem::take(&mut st.fail_next_advance) {
                return Err(EngineError::ProcessFailed);
            }
            if st.last_timestamp.is_some_and(|last| timestamp_ms < last) {
                warn!("SIMRADAR: timestamp went backwards to {}", timestamp_ms);
                return Err(EngineError::ProcessFailed);
            }
            st.last_timestamp = Some(timestamp_ms);
            let n = st.script.partition_point(|e| e.at_ms <= timestamp_ms);
            let due: Vec<ScriptedEvent> = st.script.drain(..n).collect();
            st.delivered += due.len() as u64;
            due
        };
        // The handle lock is released before user code runs.
        if let Some(cb) = self.callback.as_mut() {
            for scripted in &due {
                cb(scripted.event, &scripted.info);
            }
        }
        Ok(())
    }
}

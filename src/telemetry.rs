//! Outbound messages: telemetry snapshots and configuration acknowledgments.
//!
//! Everything queued to the publisher is an [`OutboundMessage`], a
//! bounded string of at most [`OUTBOUND_CAPACITY`] bytes.  Building one
//! never truncates; text that does not fit is a [`CapacityExceeded`]
//! error and the caller decides whether to drop it.
//!
//! ```text
//!  counter mode   {"IN_Count":3,"OUT_Count":1,"Status":0}
//!  presence mode  {"PRESENCE":"IN"}
//!  config acks    Config => radar_presence_range_max: 2.0
//!                 "bogus": invalid entry key.
//!                 radar_counter_in_number: configuration failed.
//! ```

use core::fmt::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use serde::Serialize;

use crate::error::CapacityExceeded;
use crate::events::RadarEvent;

/// Largest outbound message in bytes.
pub const OUTBOUND_CAPACITY: usize = 64;

// ── Outbound message ──────────────────────────────────────────

/// Bounded text queued to the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage(heapless::String<OUTBOUND_CAPACITY>);

impl OutboundMessage {
    pub fn new(text: &str) -> Result<Self, CapacityExceeded> {
        let mut s = heapless::String::new();
        s.push_str(text).map_err(|()| CapacityExceeded {
            capacity: OUTBOUND_CAPACITY,
        })?;
        Ok(Self(s))
    }

    /// Render any `Display` value, failing if the output would not fit.
    pub fn render(value: &dyn fmt::Display) -> Result<Self, CapacityExceeded> {
        let mut s = heapless::String::new();
        write!(s, "{value}").map_err(|_| CapacityExceeded {
            capacity: OUTBOUND_CAPACITY,
        })?;
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Configuration acknowledgments ─────────────────────────────

/// Outcome of applying one configuration pair, as reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAck<'a> {
    Applied { key: &'a str, value: &'a str },
    InvalidKey { key: &'a str },
    Failed { key: &'a str },
}

impl fmt::Display for ConfigAck<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { key, value } => write!(f, "Config => {key}: {value}"),
            Self::InvalidKey { key } => write!(f, "\"{key}\": invalid entry key."),
            Self::Failed { key } => write!(f, "{key}: configuration failed."),
        }
    }
}

impl ConfigAck<'_> {
    pub fn to_message(&self) -> Result<OutboundMessage, CapacityExceeded> {
        OutboundMessage::render(self)
    }
}

// ── Telemetry ─────────────────────────────────────────────────

/// Point-in-time view of the counters after one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySnapshot {
    Counter {
        in_count: i32,
        out_count: i32,
        occupied: bool,
    },
    Presence {
        present: bool,
    },
}

#[derive(Serialize)]
struct CounterStatus {
    #[serde(rename = "IN_Count")]
    in_count: i32,
    #[serde(rename = "OUT_Count")]
    out_count: i32,
    #[serde(rename = "Status")]
    status: u8,
}

#[derive(Serialize)]
struct PresenceStatus {
    #[serde(rename = "PRESENCE")]
    presence: &'static str,
}

impl TelemetrySnapshot {
    /// Compact JSON rendering published on the status topic.
    pub fn to_message(&self) -> Result<OutboundMessage, CapacityExceeded> {
        let json = match *self {
            Self::Counter {
                in_count,
                out_count,
                occupied,
            } => serde_json::to_string(&CounterStatus {
                in_count,
                out_count,
                status: u8::from(occupied),
            }),
            Self::Presence { present } => serde_json::to_string(&PresenceStatus {
                presence: if present { "IN" } else { "OUT" },
            }),
        };
        // Both shapes serialise infallibly; an error here can only be a
        // capacity problem from the caller's point of view.
        let json = json.map_err(|_| CapacityExceeded {
            capacity: OUTBOUND_CAPACITY,
        })?;
        OutboundMessage::new(&json)
    }
}

/// Mode-specific counters updated from the engine callback.
///
/// The callback runs on the sensing driver's thread while the config
/// dispatcher may reset the IN/OUT counts, so every field is atomic.
#[derive(Debug, Default)]
pub struct SensingCounters {
    in_count: AtomicI32,
    out_count: AtomicI32,
    occupied: AtomicBool,
    present: AtomicBool,
}

impl SensingCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `event` and return the resulting snapshot for publishing.
    pub fn record(&self, event: RadarEvent) -> TelemetrySnapshot {
        match event {
            RadarEvent::CounterIn => {
                self.in_count.fetch_add(1, Ordering::AcqRel);
            }
            RadarEvent::CounterOut => {
                self.out_count.fetch_add(1, Ordering::AcqRel);
            }
            RadarEvent::CounterOccupied => self.occupied.store(true, Ordering::Release),
            RadarEvent::CounterFree => self.occupied.store(false, Ordering::Release),
            RadarEvent::PresenceIn => self.present.store(true, Ordering::Release),
            RadarEvent::PresenceOut => self.present.store(false, Ordering::Release),
        }
        match event {
            RadarEvent::PresenceIn | RadarEvent::PresenceOut => self.presence_snapshot(),
            _ => self.counter_snapshot(),
        }
    }

    pub fn set_in_count(&self, value: i32) {
        self.in_count.store(value, Ordering::Release);
    }

    pub fn set_out_count(&self, value: i32) {
        self.out_count.store(value, Ordering::Release);
    }

    pub fn counter_snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::Counter {
            in_count: self.in_count.load(Ordering::Acquire),
            out_count: self.out_count.load(Ordering::Acquire),
            occupied: self.occupied.load(Ordering::Acquire),
        }
    }

    pub fn presence_snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot::Presence {
            present: self.present.load(Ordering::Acquire),
        }
    }
}

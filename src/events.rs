//! Radar sensing events.
//!
//! The sensing engine reports a small fixed vocabulary of discrete
//! events from inside its `advance` call:
//!
//! ```text
//!  Entrance counter            Presence detection
//!  ─────────────────           ──────────────────
//!  CounterIn   (walk in)       PresenceIn  (target entered range)
//!  CounterOut  (walk out)      PresenceOut (range empty)
//!  CounterOccupied (zone busy)
//!  CounterFree     (zone clear)
//! ```
//!
//! Which half of the vocabulary is live depends on the
//! [`OperatingMode`](crate::mode::OperatingMode).

/// Discrete event emitted by the sensing engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RadarEvent {
    // ── Entrance counter ──────────────────────────────────
    /// A person crossed the entrance inwards.
    CounterIn = 0,
    /// A person crossed the entrance outwards.
    CounterOut = 1,
    /// Object present in the traffic-light zone.
    CounterOccupied = 2,
    /// Traffic-light zone is clear again.
    CounterFree = 3,

    // ── Presence detection ────────────────────────────────
    /// Presence detected within the configured range.
    PresenceIn = 10,
    /// No presence detected any more.
    PresenceOut = 11,
}

impl RadarEvent {
    /// Every event in the vocabulary, for exhaustive tests and fuzzing.
    pub const ALL: [RadarEvent; 6] = [
        RadarEvent::CounterIn,
        RadarEvent::CounterOut,
        RadarEvent::CounterOccupied,
        RadarEvent::CounterFree,
        RadarEvent::PresenceIn,
        RadarEvent::PresenceOut,
    ];

    /// Short tag used in log lines.
    pub const fn label(self) -> &'static str {
        match self {
            Self::CounterIn => "counter-in",
            Self::CounterOut => "counter-out",
            Self::CounterOccupied => "counter-occupied",
            Self::CounterFree => "counter-free",
            Self::PresenceIn => "presence-in",
            Self::PresenceOut => "presence-out",
        }
    }
}

/// Side information delivered with every event.
///
/// `distance_m` / `accuracy_m` are only meaningful for presence events;
/// counter events leave them at zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EventInfo {
    /// Engine timestamp (ms) of the frame that produced the event.
    pub timestamp_ms: u64,
    /// Estimated target distance in metres.
    pub distance_m: f32,
    /// Distance uncertainty in metres.
    pub accuracy_m: f32,
}

impl EventInfo {
    pub fn at(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            ..Self::default()
        }
    }
}

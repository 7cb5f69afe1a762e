//! Operating mode: entrance counter vs. presence detection.
//!
//! The mode is chosen at configuration time and fixes three things:
//!
//! | Concern                  | Counter mode                  | Presence mode         |
//! |--------------------------|-------------------------------|-----------------------|
//! | Remote-configurable keys | 8 engine keys + 2 counter resets | 2 engine keys      |
//! | Event vocabulary         | in / out / occupied / free    | presence in / out     |
//! | Engine event mask        | [`EventMask::Counter`]        | [`EventMask::Presence`] |
//!
//! The two key sets are disjoint: a key valid in one mode is an
//! "invalid entry key" in the other.

use serde::{Deserialize, Serialize};

use crate::events::RadarEvent;

/// Runtime-selected operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// People counting across an entrance, with a traffic-light zone.
    Counter,
    /// Presence detection within a range.
    #[default]
    Presence,
}

/// Event classes the engine is asked to report at init time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventMask {
    Counter,
    Presence,
}

/// How a permitted configuration key is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Forwarded verbatim to the engine's parameter-set operation.
    EngineParameter(&'static str),
    /// Resets the local IN counter; never reaches the engine.
    ResetInCount,
    /// Resets the local OUT counter; never reaches the engine.
    ResetOutCount,
}

/// Key for resetting the IN counter from the remote side.
pub const COUNTER_IN_NUMBER_KEY: &str = "radar_counter_in_number";
/// Key for resetting the OUT counter from the remote side.
pub const COUNTER_OUT_NUMBER_KEY: &str = "radar_counter_out_number";

const COUNTER_ENGINE_KEYS: [&str; 8] = [
    "radar_counter_installation",
    "radar_counter_orientation",
    "radar_counter_ceiling_height",
    "radar_counter_entrance_width",
    "radar_counter_sensitivity",
    "radar_counter_traffic_light_zone",
    "radar_counter_reverse",
    "radar_counter_min_person_height",
];

const PRESENCE_ENGINE_KEYS: [&str; 2] = ["radar_presence_range_max", "radar_presence_sensitivity"];

const COUNTER_DEFAULTS: [(&str, &str); 8] = [
    ("radar_counter_installation", "side"),
    ("radar_counter_orientation", "portrait"),
    ("radar_counter_ceiling_height", "2.5"),
    ("radar_counter_entrance_width", "1.0"),
    ("radar_counter_sensitivity", "0.5"),
    ("radar_counter_traffic_light_zone", "1.0"),
    ("radar_counter_reverse", "false"),
    ("radar_counter_min_person_height", "1.0"),
];

const PRESENCE_DEFAULTS: [(&str, &str); 2] = [
    ("radar_presence_range_max", "2.0"),
    ("radar_presence_sensitivity", "medium"),
];

impl OperatingMode {
    /// Classify a remote configuration key.  `None` means the key is not
    /// permitted in this mode.  Matching is exact.
    pub fn classify_key(self, key: &str) -> Option<KeyKind> {
        match self {
            Self::Counter => {
                if key == COUNTER_IN_NUMBER_KEY {
                    return Some(KeyKind::ResetInCount);
                }
                if key == COUNTER_OUT_NUMBER_KEY {
                    return Some(KeyKind::ResetOutCount);
                }
                COUNTER_ENGINE_KEYS
                    .iter()
                    .copied()
                    .find(|k| *k == key)
                    .map(KeyKind::EngineParameter)
            }
            Self::Presence => PRESENCE_ENGINE_KEYS
                .iter()
                .copied()
                .find(|k| *k == key)
                .map(KeyKind::EngineParameter),
        }
    }

    /// Engine parameters applied once at startup, in order.
    pub fn default_parameters(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Counter => &COUNTER_DEFAULTS,
            Self::Presence => &PRESENCE_DEFAULTS,
        }
    }

    pub fn event_mask(self) -> EventMask {
        match self {
            Self::Counter => EventMask::Counter,
            Self::Presence => EventMask::Presence,
        }
    }

    /// Whether `event` belongs to this mode's vocabulary.
    pub fn accepts(self, event: RadarEvent) -> bool {
        match self {
            Self::Counter => matches!(
                event,
                RadarEvent::CounterIn
                    | RadarEvent::CounterOut
                    | RadarEvent::CounterOccupied
                    | RadarEvent::CounterFree
            ),
            Self::Presence => matches!(event, RadarEvent::PresenceIn | RadarEvent::PresenceOut),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Counter => "counter",
            Self::Presence => "presence",
        }
    }
}

impl core::str::FromStr for OperatingMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(Self::Counter),
            "presence" => Ok(Self::Presence),
            _ => Err("expected 'counter' or 'presence'"),
        }
    }
}

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements      | Connects to                  |
//! |-------------|-----------------|------------------------------|
//! | `loopback`  | MessageSession  | In-memory broker (host)      |
//! | `sim_radar` | SensingEngine   | Scripted radar events (host) |
//! | `time`      | Clock           | ESP32 system timer / Instant |
//!
//! The status LED port is implemented by
//! [`drivers::status_led`](crate::drivers::status_led).

pub mod loopback;
pub mod sim_radar;
pub mod time;

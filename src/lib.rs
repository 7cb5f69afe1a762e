//! RadarBridge firmware library.
//!
//! Bridges a radar sensing engine (entrance counter or presence
//! detection) to a pub/sub message session: events become telemetry and
//! LED patterns, and configuration payloads from the session are applied
//! to the engine.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module, so the whole task
//! graph builds and runs on the host.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod locks;
pub mod mode;
pub mod payload;
pub mod pins;
pub mod queue;
pub mod runtime;
pub mod scanner;
pub mod shutdown;
pub mod tasks;
pub mod telemetry;

pub mod adapters;
pub mod drivers;

mod esp_link_shims;

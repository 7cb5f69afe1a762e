//! Port traits: the hexagonal boundary between the bridge tasks and the
//! outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ tasks (publisher, subscriber, driver, ...)
//! ```
//!
//! The message session and the sensing engine are external components;
//! the tasks consume them only through these traits, so the whole task
//! graph runs on the host against the loopback session and the simulated
//! radar.
//!
//! ## Threading contracts
//!
//! - [`MessageSession`] is shared by several tasks at once and delivers
//!   inbound messages on a thread of its own choosing, so every method
//!   takes `&self` and the trait requires `Send + Sync`.
//! - [`SensingEngine`] is only ever touched under the engine lock.  The
//!   event callback runs *inside* [`SensingEngine::advance`] while that
//!   lock is held; callback code must never try to take it again.

use std::sync::Arc;

use crate::config::Qos;
use crate::error::{EngineError, SessionError};
use crate::events::{EventInfo, RadarEvent};
use crate::mode::EventMask;
use crate::pins::HardwareConfig;

// ───────────────────────────────────────────────────────────────
// Message session (pub/sub network client)
// ───────────────────────────────────────────────────────────────

/// Message received on an active subscription.
#[derive(Debug, Clone, Copy)]
pub struct InboundMessage<'a> {
    pub topic: &'a str,
    pub payload: &'a [u8],
    pub qos: Qos,
}

/// Asynchronous notifications from the session.
#[derive(Debug, Clone, Copy)]
pub enum SessionEvent<'a> {
    Message(InboundMessage<'a>),
    /// The broker connection dropped.
    Disconnected,
}

/// Handler registered with [`MessageSession::set_event_handler`].
pub type SessionEventHandler = Arc<dyn Fn(SessionEvent<'_>) + Send + Sync>;

/// Pub/sub client the bridge publishes telemetry on and receives
/// configuration from.
pub trait MessageSession: Send + Sync {
    fn connect(&self) -> Result<(), SessionError>;

    fn disconnect(&self);

    fn subscribe(&self, topic: &str, qos: Qos) -> Result<(), SessionError>;

    fn unsubscribe(&self, topic: &str) -> Result<(), SessionError>;

    fn publish(&self, topic: &str, payload: &[u8], qos: Qos, retain: bool)
    -> Result<(), SessionError>;

    /// Install the handler for inbound messages and disconnect
    /// notifications, replacing any previous one.
    fn set_event_handler(&self, handler: SessionEventHandler);
}

// ───────────────────────────────────────────────────────────────
// Sensing engine (radar signal processing library)
// ───────────────────────────────────────────────────────────────

/// Callback invoked synchronously from inside [`SensingEngine::advance`].
pub type EventCallback = Box<dyn FnMut(RadarEvent, &EventInfo) + Send>;

/// Opaque radar processing context.
pub trait SensingEngine: Send {
    fn init(&mut self, hw: &HardwareConfig, mask: EventMask) -> Result<(), EngineError>;

    fn register_callback(&mut self, callback: EventCallback) -> Result<(), EngineError>;

    /// Set one parameter from its textual key and value.
    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), EngineError>;

    fn enable(&mut self) -> Result<(), EngineError>;

    /// Process pending radar frames.  Detected events are delivered to the
    /// registered callback before this returns.
    fn advance(&mut self, timestamp_ms: u64) -> Result<(), EngineError>;
}

// ───────────────────────────────────────────────────────────────
// Status LED
// ───────────────────────────────────────────────────────────────

/// Output colour of the status LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LedColour {
    #[default]
    Off,
    Red,
    Green,
    Blue,
}

impl LedColour {
    /// RGB channel bits: red = 1, green = 2, blue = 4.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Red => 1,
            Self::Green => 2,
            Self::Blue => 4,
        }
    }
}

/// Drives the physical RGB LED.
pub trait StatusLedPort: Send {
    fn set_colour(&mut self, colour: LedColour);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Millisecond time source fed to the sensing engine.
pub trait Clock: Send {
    fn now_ms(&self) -> u64;
}

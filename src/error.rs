//! Error types shared across the RadarBridge firmware.
//!
//! Every subsystem reports failures through a small `Copy` enum.  Startup
//! wraps them in `anyhow` with a context string per step; the task loops
//! log and carry on.

use core::fmt;

// ---------------------------------------------------------------------------
// Message session errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// Broker connection could not be established.
    ConnectFailed,
    /// Operation attempted while no connection is up.
    NotConnected,
    /// SUBSCRIBE was refused or timed out.
    SubscribeFailed,
    /// UNSUBSCRIBE was refused (e.g. not subscribed).
    UnsubscribeFailed,
    /// PUBLISH was not acknowledged.
    PublishFailed,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectFailed => write!(f, "connect failed"),
            Self::NotConnected => write!(f, "not connected"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::UnsubscribeFailed => write!(f, "unsubscribe failed"),
            Self::PublishFailed => write!(f, "publish failed"),
        }
    }
}

impl std::error::Error for SessionError {}

// ---------------------------------------------------------------------------
// Sensing engine errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Radar front-end did not respond during init (board not fitted?).
    InitFailed,
    /// The event callback could not be registered.
    CallbackRegistration,
    /// Parameter key unknown to the engine.
    UnknownParameter,
    /// Parameter value malformed or out of range.
    InvalidValue,
    /// The engine has not been enabled yet.
    NotEnabled,
    /// Frame acquisition or processing failed inside `advance`.
    ProcessFailed,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailed => write!(f, "init failed"),
            Self::CallbackRegistration => write!(f, "callback registration failed"),
            Self::UnknownParameter => write!(f, "unknown parameter"),
            Self::InvalidValue => write!(f, "invalid parameter value"),
            Self::NotEnabled => write!(f, "engine not enabled"),
            Self::ProcessFailed => write!(f, "process failed"),
        }
    }
}

impl std::error::Error for EngineError {}

// ---------------------------------------------------------------------------
// Payload staging errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadError {
    /// Inbound message length is at or above the staging capacity.
    TooLarge { len: usize, capacity: usize },
}

impl fmt::Display for PayloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLarge { len, capacity } => {
                write!(f, "message of {len} bytes does not fit {capacity}-byte buffer")
            }
        }
    }
}

impl std::error::Error for PayloadError {}

// ---------------------------------------------------------------------------
// Bounded-capacity errors
// ---------------------------------------------------------------------------

/// A write into a fixed-capacity string or buffer would not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded {
    pub capacity: usize,
}

impl fmt::Display for CapacityExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exceeds {} byte capacity", self.capacity)
    }
}

impl std::error::Error for CapacityExceeded {}

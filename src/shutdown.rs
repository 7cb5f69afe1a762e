//! Cooperative cancellation shared by every task.
//!
//! Each task loop checks [`Shutdown::is_requested`] at its wait points.
//! Tasks blocked on a queue are woken by the halting side posting a
//! sentinel command (or a wake) after the flag is set, so a blocked task
//! always re-checks the flag before doing more work.

use core::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{EngineError, SessionError};

/// Why the system stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// `Runtime::request_shutdown` or an external status post.
    Requested,
    /// The sensing engine failed inside the driver loop.
    EngineFault(EngineError),
    /// Remediation policy is `Halt` and a failure was reported.
    SessionFailure,
    /// Reconnect attempts were exhausted.
    ReconnectExhausted(SessionError),
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => write!(f, "shutdown requested"),
            Self::EngineFault(e) => write!(f, "engine fault: {e}"),
            Self::SessionFailure => write!(f, "session failure"),
            Self::ReconnectExhausted(e) => write!(f, "reconnect exhausted: {e}"),
        }
    }
}

/// Shared cancellation flag plus the first recorded halt reason.
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<ShutdownInner>,
}

#[derive(Default)]
struct ShutdownInner {
    requested: AtomicBool,
    reason: Mutex<Option<HaltReason>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the flag.  Only the first reason is kept; returns `true` if
    /// this call was the one that tripped it.
    pub fn trigger(&self, reason: HaltReason) -> bool {
        let mut slot = self
            .inner
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(reason);
        self.inner.requested.store(true, Ordering::Release);
        true
    }

    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    pub fn reason(&self) -> Option<HaltReason> {
        *self
            .inner
            .reason
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

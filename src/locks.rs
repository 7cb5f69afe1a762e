//! Named exclusive locks around shared resources.
//!
//! Two resources are shared between tasks:
//!
//! ```text
//!  PayloadLock   subscriber handler (write) ─┐
//!                config dispatcher   (read) ─┤   acquire order:
//!  SharedEngine  sensing driver   (advance) ─┤   payload ──▶ engine ──▶ pattern
//!                config dispatcher    (set) ─┘
//! ```
//!
//! The payload lock lives next to its buffer in [`crate::payload`].  The
//! engine lock is defined here.  Nested acquisition must follow the order
//! above; the sensing driver takes the pattern lock (inside the LED
//! responder) only while it already holds the engine lock.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub use crate::payload::PayloadLock;

/// Shared handle to the sensing engine.
///
/// Parameter changes from the config dispatcher are serialised against
/// `advance` calls from the sensing driver.
pub struct SharedEngine<E> {
    inner: Arc<Mutex<E>>,
}

impl<E> SharedEngine<E> {
    pub fn new(engine: E) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Acquire the engine lock, blocking until it is free.
    ///
    /// A panic while holding the lock leaves the engine in whatever state
    /// its last completed call produced, so the poison flag is ignored.
    pub fn lock(&self) -> MutexGuard<'_, E> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Non-blocking acquire, used by tests to observe contention.
    pub fn try_lock(&self) -> Option<MutexGuard<'_, E>> {
        match self.inner.try_lock() {
            Ok(guard) => Some(guard),
            Err(std::sync::TryLockError::Poisoned(p)) => Some(p.into_inner()),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

impl<E> Clone for SharedEngine<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

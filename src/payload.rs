//! Inbound configuration payload staging buffer.
//!
//! The subscriber's inbound handler is the only writer, the config
//! dispatcher the only reader.  Both go through [`PayloadLock`]; the
//! buffer content is only meaningful to whoever holds the lock.
//!
//! A message of `len >= PAYLOAD_CAPACITY` is rejected *before* the lock
//! is taken and the buffer is left untouched.  Messages are never
//! truncated to fit.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::PayloadError;

/// Staging capacity in bytes.  One byte is kept in reserve so a full
/// buffer is always NUL-terminated, matching the radar library's C API.
pub const PAYLOAD_CAPACITY: usize = 512;

/// Fixed-capacity byte buffer holding the most recent inbound message.
pub struct PayloadBuffer {
    bytes: [u8; PAYLOAD_CAPACITY],
    len: usize,
}

impl PayloadBuffer {
    pub const fn new() -> Self {
        Self {
            bytes: [0; PAYLOAD_CAPACITY],
            len: 0,
        }
    }

    /// Check whether a message of `len` bytes can be staged.
    pub fn check_fits(len: usize) -> Result<(), PayloadError> {
        if len >= PAYLOAD_CAPACITY {
            return Err(PayloadError::TooLarge {
                len,
                capacity: PAYLOAD_CAPACITY,
            });
        }
        Ok(())
    }

    /// Replace the buffer content with `message`, zeroing the remainder.
    pub fn stage(&mut self, message: &[u8]) -> Result<(), PayloadError> {
        Self::check_fits(message.len())?;
        self.bytes.fill(0);
        self.bytes[..message.len()].copy_from_slice(message);
        self.len = message.len();
        Ok(())
    }

    /// Meaningful bytes of the staged message.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Staged message as UTF-8 text.
    pub fn as_str(&self) -> Result<&str, core::str::Utf8Error> {
        core::str::from_utf8(self.as_bytes())
    }

    /// Whole backing store, including the zeroed tail.
    pub fn raw(&self) -> &[u8; PAYLOAD_CAPACITY] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for PayloadBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ── Payload lock ──────────────────────────────────────────────

/// Shared, exclusively-locked handle to the staging buffer.
///
/// Lock ordering: a task that needs both this lock and the engine lock
/// must take this one first.
#[derive(Clone, Default)]
pub struct PayloadLock {
    inner: Arc<Mutex<PayloadBuffer>>,
}

impl PayloadLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the payload lock, blocking until it is free.
    ///
    /// A poisoned lock is recovered: [`PayloadBuffer::stage`] never leaves
    /// the buffer half-written across a panic point.
    pub fn lock(&self) -> MutexGuard<'_, PayloadBuffer> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

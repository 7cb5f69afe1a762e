//! Inter-task queues.
//!
//! Two delivery disciplines, both built on `embassy-sync` primitives and
//! driven from plain threads with `futures_lite::future::block_on`:
//!
//! ```text
//!  CommandQueue<T, N>   bounded FIFO ───────────────────────────────
//!     producer ──▶ [ a | b | c |   |   ] ──▶ consumer (blocks when empty)
//!     send() blocks when full, try_send()/send_or_drop() never block
//!
//!  OverwriteSlot<T>     single slot ───────────────────────────────
//!     producer ──▶ [ latest ] ──▶ consumer
//!     post() replaces any unconsumed value; the older value is lost
//! ```
//!
//! Ordering is FIFO within one queue only; nothing is guaranteed across
//! queues.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use embassy_sync::signal::Signal;
use futures_lite::future::block_on;
use log::warn;

// ── Bounded FIFO ──────────────────────────────────────────────

/// Bounded FIFO command queue shared between tasks.
pub struct CommandQueue<T, const N: usize> {
    name: &'static str,
    channel: Channel<CriticalSectionRawMutex, T, N>,
}

impl<T, const N: usize> CommandQueue<T, N> {
    /// `name` is only used in log lines.
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            channel: Channel::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue, blocking the caller while the queue is full.
    pub fn send(&self, item: T) {
        block_on(self.channel.send(item));
    }

    /// Enqueue without blocking.  Returns the item back when full.
    pub fn try_send(&self, item: T) -> Result<(), T> {
        self.channel.try_send(item).map_err(|e| match e {
            TrySendError::Full(item) => item,
        })
    }

    /// Enqueue without blocking; on a full queue the item is dropped and
    /// the drop is logged.  Returns `true` if the item was queued.
    pub fn send_or_drop(&self, item: T) -> bool {
        if self.try_send(item).is_err() {
            warn!("{}: queue full ({} slots), dropping item", self.name, N);
            false
        } else {
            true
        }
    }

    /// Dequeue, blocking the caller until an item is available.
    pub fn recv(&self) -> T {
        block_on(self.channel.receive())
    }

    /// Async dequeue, for callers that race several wake sources.
    pub async fn recv_async(&self) -> T {
        self.channel.receive().await
    }

    pub fn try_recv(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}

// ── Single-slot overwrite ─────────────────────────────────────

/// Single-slot queue where every post replaces the pending value.
///
/// Used for urgent status notifications where only the newest value
/// matters.  The producer is never told that an older value was dropped.
pub struct OverwriteSlot<T> {
    signal: Signal<CriticalSectionRawMutex, T>,
}

impl<T: Send> OverwriteSlot<T> {
    pub const fn new() -> Self {
        Self {
            signal: Signal::new(),
        }
    }

    /// Store `value`, discarding any unconsumed one.
    pub fn post(&self, value: T) {
        self.signal.signal(value);
    }

    /// Block until a value is posted, then take it.
    pub fn wait(&self) -> T {
        block_on(self.signal.wait())
    }

    pub async fn wait_async(&self) -> T {
        self.signal.wait().await
    }

    pub fn try_take(&self) -> Option<T> {
        self.signal.try_take()
    }

    pub fn is_pending(&self) -> bool {
        self.signal.signaled()
    }
}

impl<T: Send> Default for OverwriteSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Binary wake notification: several notifications before the waiter
/// runs collapse into one wake.
pub type WakeSignal = OverwriteSlot<()>;

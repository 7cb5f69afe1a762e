//! One module per concurrent component.
//!
//! ```text
//!                   ┌──────────── SessionQueue ◀──────────────┐
//!                   ▼                                         │
//!   StatusSlot ─▶ SessionCoordinator ─▶ SubscriberQueue ─▶ Subscriber
//!                   │                                         │ (inbound handler)
//!                   │                                  PayloadLock + WakeSignal
//!                   ▼                                         ▼
//!   Publisher ◀── PublisherQueue ◀──────────────────── ConfigDispatcher
//!       ▲                                                     │ engine lock
//!       └──────────────── SensingDriver ◀─── SharedEngine ────┘
//!                              │ set_pattern
//!                              ▼
//!                          LedTask (EventResponder)
//! ```
//!
//! Every task loop returns once the shared
//! [`Shutdown`](crate::shutdown::Shutdown) flag is observed.

pub mod config_dispatcher;
pub mod led_responder;
pub mod publisher;
pub mod sensing_driver;
pub mod session;
pub mod subscriber;

use crate::app::commands::{PublisherCommand, SessionCommand, SubscriberCommand, SystemStatus};
use crate::queue::{CommandQueue, OverwriteSlot};

/// Outbound messages waiting for the publisher.
pub const PUBLISHER_QUEUE_DEPTH: usize = 10;
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 4;
pub const SESSION_QUEUE_DEPTH: usize = 4;

pub type PublisherQueue = CommandQueue<PublisherCommand, PUBLISHER_QUEUE_DEPTH>;
pub type SubscriberQueue = CommandQueue<SubscriberCommand, SUBSCRIBER_QUEUE_DEPTH>;
pub type SessionQueue = CommandQueue<SessionCommand, SESSION_QUEUE_DEPTH>;
pub type StatusSlot = OverwriteSlot<SystemStatus>;

//! Inter-task command vocabularies.
//!
//! Each task owns one inbound queue and accepts exactly the commands
//! listed for it here.

use crate::error::EngineError;
use crate::telemetry::OutboundMessage;

/// Failure escalations accepted by the session coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Every subscribe attempt in one sequence failed.
    SubscribeFailure,
    /// A message could not be published within its retry budget.
    PublishFailure,
    /// The session reported a dropped connection.
    Disconnection,
}

/// Commands accepted by the subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberCommand {
    /// Run a bounded subscribe sequence.
    Subscribe,
    /// Single unsubscribe attempt, failures are only logged.
    Unsubscribe,
    /// Wake the task so it can observe the shutdown flag.
    Shutdown,
}

/// Commands accepted by the publisher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherCommand {
    Publish(OutboundMessage),
    /// Wake the task so it can observe the shutdown flag.
    Shutdown,
}

/// Urgent status posted to the coordinator's overwrite slot.  Only the
/// latest unconsumed value is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemStatus {
    EngineFault(EngineError),
    ShutdownRequested,
}

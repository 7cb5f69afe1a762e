//! Session coordinator task.
//!
//! The single authority on whether the bridge keeps running after a
//! session-level failure.  It waits on two sources at once:
//!
//! ```text
//!   SessionQueue (FIFO)  : SubscribeFailure | PublishFailure | Disconnection
//!   StatusSlot (latest)  : EngineFault | ShutdownRequested
//! ```
//!
//! Failure commands that are already queued when one is taken are
//! coalesced into a single remediation pass.  What that pass does is set
//! by [`RemediationPolicy`]:
//!
//! - `Reconnect`: disconnect, reconnect with a bounded number of
//!   attempts, then ask the subscriber to re-subscribe.  Running out of
//!   attempts halts.
//! - `Halt`: stop immediately.
//!
//! Halting sets the shutdown flag, wakes every blocked task and
//! disconnects the session.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures_lite::future;
use log::{error, info, warn};

use crate::app::commands::{PublisherCommand, SessionCommand, SubscriberCommand, SystemStatus};
use crate::app::ports::MessageSession;
use crate::config::RemediationPolicy;
use crate::error::SessionError;
use crate::queue::WakeSignal;
use crate::shutdown::{HaltReason, Shutdown};

use super::{PublisherQueue, SessionQueue, StatusSlot, SubscriberQueue};

enum Wake {
    Command(SessionCommand),
    Status(SystemStatus),
}

/// Queues the coordinator wakes when halting.
pub struct Dependents {
    pub publisher: Arc<PublisherQueue>,
    pub subscriber: Arc<SubscriberQueue>,
    pub dispatcher_wake: Arc<WakeSignal>,
}

pub struct SessionCoordinator<S: ?Sized> {
    session: Arc<S>,
    inbox: Arc<SessionQueue>,
    status: Arc<StatusSlot>,
    dependents: Dependents,
    shutdown: Shutdown,
    policy: RemediationPolicy,
}

impl<S: MessageSession + ?Sized> SessionCoordinator<S> {
    pub fn new(
        session: Arc<S>,
        inbox: Arc<SessionQueue>,
        status: Arc<StatusSlot>,
        dependents: Dependents,
        shutdown: Shutdown,
        policy: RemediationPolicy,
    ) -> Self {
        Self {
            session,
            inbox,
            status,
            dependents,
            shutdown,
            policy,
        }
    }

    fn next_wake(&self) -> Wake {
        future::block_on(future::or(
            async { Wake::Status(self.status.wait_async().await) },
            async { Wake::Command(self.inbox.recv_async().await) },
        ))
    }

    /// Drain failure commands queued behind `first`.  Returns how many
    /// commands the coming remediation pass covers.
    fn coalesce(&self, first: SessionCommand) -> usize {
        let mut covered = 1;
        while let Some(cmd) = self.inbox.try_recv() {
            info!("SESSION: coalescing {:?} into {:?}", cmd, first);
            covered += 1;
        }
        covered
    }

    /// Apply the remediation policy once.
    pub fn remediate(&self, command: SessionCommand) -> Result<(), HaltReason> {
        match self.policy {
            RemediationPolicy::Halt => {
                error!("SESSION: {:?} with halt policy", command);
                Err(HaltReason::SessionFailure)
            }
            RemediationPolicy::Reconnect {
                max_attempts,
                retry_ms,
            } => {
                warn!("SESSION: {:?}, reconnecting", command);
                self.session.disconnect();
                let mut last = SessionError::ConnectFailed;
                for attempt in 1..=max_attempts {
                    if self.shutdown.is_requested() {
                        return Err(self.shutdown.reason().unwrap_or(HaltReason::Requested));
                    }
                    match self.session.connect() {
                        Ok(()) => {
                            info!("SESSION: reconnected (attempt {})", attempt);
                            self.dependents
                                .subscriber
                                .send_or_drop(SubscriberCommand::Subscribe);
                            return Ok(());
                        }
                        Err(e) => {
                            warn!("SESSION: connect attempt {}/{} failed: {}", attempt, max_attempts, e);
                            last = e;
                        }
                    }
                    if attempt < max_attempts {
                        thread::sleep(Duration::from_millis(u64::from(retry_ms)));
                    }
                }
                Err(HaltReason::ReconnectExhausted(last))
            }
        }
    }

    /// Stop the system.  Returns the reason that actually stuck (the
    /// first one recorded wins).
    pub fn halt(&self, reason: HaltReason) -> HaltReason {
        if self.shutdown.trigger(reason) {
            error!("SESSION: halting: {}", reason);
        }
        self.dependents.publisher.send_or_drop(PublisherCommand::Shutdown);
        self.dependents.subscriber.send_or_drop(SubscriberCommand::Shutdown);
        self.dependents.dispatcher_wake.post(());
        self.session.disconnect();
        self.shutdown.reason().unwrap_or(reason)
    }

    /// Serve until something halts the system.
    pub fn run(self) -> HaltReason {
        info!("SESSION: coordinator up ({:?})", self.policy);
        loop {
            let reason = match self.next_wake() {
                Wake::Status(SystemStatus::EngineFault(e)) => HaltReason::EngineFault(e),
                Wake::Status(SystemStatus::ShutdownRequested) => {
                    self.shutdown.reason().unwrap_or(HaltReason::Requested)
                }
                Wake::Command(command) => {
                    let covered = self.coalesce(command);
                    if covered > 1 {
                        info!("SESSION: {} failures handled as one", covered);
                    }
                    match self.remediate(command) {
                        Ok(()) => continue,
                        Err(reason) => reason,
                    }
                }
            };
            return self.halt(reason);
        }
    }
}

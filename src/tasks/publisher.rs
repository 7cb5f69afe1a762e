//! Publisher task.
//!
//! Drains the publisher queue one message at a time and forwards each to
//! the session's publish operation with a bounded retry budget.  A
//! message that exhausts its budget is escalated to the session
//! coordinator and dropped; the task keeps going with the next one.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::app::commands::{PublisherCommand, SessionCommand};
use crate::app::ports::MessageSession;
use crate::config::{Qos, SystemConfig, Topic};
use crate::error::SessionError;
use crate::shutdown::Shutdown;
use crate::telemetry::OutboundMessage;

use super::{PublisherQueue, SessionQueue};

/// Fixed publish parameters.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    pub topic: Topic,
    pub qos: Qos,
    pub retain: bool,
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl PublishSettings {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            topic: config.publish_topic.clone(),
            qos: config.qos,
            retain: config.retain,
            max_attempts: config.publish_max_attempts,
            retry_interval: Duration::from_millis(u64::from(config.publish_retry_ms)),
        }
    }
}

pub struct Publisher<S: ?Sized> {
    session: Arc<S>,
    inbox: Arc<PublisherQueue>,
    coordinator: Arc<SessionQueue>,
    shutdown: Shutdown,
    settings: PublishSettings,
}

impl<S: MessageSession + ?Sized> Publisher<S> {
    pub fn new(
        session: Arc<S>,
        inbox: Arc<PublisherQueue>,
        coordinator: Arc<SessionQueue>,
        shutdown: Shutdown,
        settings: PublishSettings,
    ) -> Self {
        Self {
            session,
            inbox,
            coordinator,
            shutdown,
            settings,
        }
    }

    /// Publish one message, retrying on failure.  Gives up early if
    /// shutdown is requested between attempts.
    pub fn publish_one(&self, message: &OutboundMessage) -> Result<(), SessionError> {
        let s = &self.settings;
        let mut last = SessionError::PublishFailed;
        for attempt in 1..=s.max_attempts {
            match self
                .session
                .publish(&s.topic, message.as_bytes(), s.qos, s.retain)
            {
                Ok(()) => {
                    debug!("PUB: sent '{}' (attempt {})", message, attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!("PUB: attempt {}/{} failed: {}", attempt, s.max_attempts, e);
                    last = e;
                }
            }
            if attempt < s.max_attempts {
                if self.shutdown.is_requested() {
                    break;
                }
                thread::sleep(s.retry_interval);
            }
        }
        Err(last)
    }

    /// Handle one dequeued command.  Returns `false` when the task should stop.
    pub fn handle(&self, command: PublisherCommand) -> bool {
        if self.shutdown.is_requested() {
            return false;
        }
        match command {
            PublisherCommand::Publish(message) => {
                if let Err(e) = self.publish_one(&message) {
                    error!("PUB: giving up on '{}': {}", message, e);
                    if self.coordinator.try_send(SessionCommand::PublishFailure).is_err() {
                        warn!("PUB: coordinator queue full, escalation dropped");
                    }
                }
                true
            }
            PublisherCommand::Shutdown => false,
        }
    }

    pub fn run(self) {
        info!("PUB: publishing on '{}'", self.settings.topic);
        while self.handle(self.inbox.recv()) {}
        info!("PUB: stopped");
    }
}

//! Subscriber task and inbound message handler.
//!
//! The task owns the subscription lifecycle: one bounded subscribe
//! sequence at startup and on every `Subscribe` command, and a single
//! unsubscribe attempt on `Unsubscribe`, which the runtime sends when a
//! shutdown is requested.
//!
//! The inbound handler ([`PayloadStager`]) runs on whatever thread the
//! session delivers messages on.  It takes only the payload lock, holds
//! it for the copy alone, and wakes the config dispatcher afterwards.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::app::commands::{SessionCommand, SubscriberCommand};
use crate::app::ports::{MessageSession, SessionEvent, SessionEventHandler};
use crate::config::{Qos, SystemConfig, Topic};
use crate::error::{PayloadError, SessionError};
use crate::payload::{PayloadBuffer, PayloadLock};
use crate::queue::WakeSignal;
use crate::shutdown::Shutdown;

use super::{SessionQueue, SubscriberQueue};

/// Fixed subscribe parameters.
#[derive(Debug, Clone)]
pub struct SubscribeSettings {
    pub topic: Topic,
    pub qos: Qos,
    pub max_attempts: u32,
    pub retry_interval: Duration,
}

impl SubscribeSettings {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            topic: config.subscribe_topic.clone(),
            qos: config.qos,
            max_attempts: config.subscribe_max_attempts,
            retry_interval: Duration::from_millis(u64::from(config.subscribe_retry_ms)),
        }
    }
}

pub struct Subscriber<S: ?Sized> {
    session: Arc<S>,
    inbox: Arc<SubscriberQueue>,
    coordinator: Arc<SessionQueue>,
    shutdown: Shutdown,
    settings: SubscribeSettings,
}

impl<S: MessageSession + ?Sized> Subscriber<S> {
    pub fn new(
        session: Arc<S>,
        inbox: Arc<SubscriberQueue>,
        coordinator: Arc<SessionQueue>,
        shutdown: Shutdown,
        settings: SubscribeSettings,
    ) -> Self {
        Self {
            session,
            inbox,
            coordinator,
            shutdown,
            settings,
        }
    }

    /// Run one bounded subscribe sequence.  On exhaustion a single
    /// `SubscribeFailure` is escalated, never one per attempt.
    pub fn subscribe_with_retry(&self) -> Result<(), SessionError> {
        let s = &self.settings;
        let mut last = SessionError::SubscribeFailed;
        for attempt in 1..=s.max_attempts {
            match self.session.subscribe(&s.topic, s.qos) {
                Ok(()) => {
                    info!("SUB: subscribed to '{}' (attempt {})", s.topic, attempt);
                    return Ok(());
                }
                Err(e) => {
                    warn!("SUB: subscribe attempt {}/{} failed: {}", attempt, s.max_attempts, e);
                    last = e;
                }
            }
            if attempt < s.max_attempts {
                thread::sleep(s.retry_interval);
            }
        }
        error!("SUB: subscribe to '{}' exhausted, escalating", s.topic);
        if self.coordinator.try_send(SessionCommand::SubscribeFailure).is_err() {
            // A full coordinator queue already holds pending failures
            // that will trigger the same remediation.
            warn!("SUB: coordinator queue full, escalation dropped");
        }
        Err(last)
    }

    /// Single unsubscribe attempt.  Failure is logged, never escalated.
    pub fn unsubscribe(&self) -> Result<(), SessionError> {
        match self.session.unsubscribe(&self.settings.topic) {
            Ok(()) => {
                info!("SUB: unsubscribed from '{}'", self.settings.topic);
                Ok(())
            }
            Err(e) => {
                warn!("SUB: unsubscribe from '{}' failed: {}", self.settings.topic, e);
                Err(e)
            }
        }
    }

    /// Handle one command.  Returns `false` when the task should stop.
    ///
    /// `Unsubscribe` is still carried out once shutdown has begun; it is
    /// the last thing the task does on the way down.
    pub fn handle(&self, command: SubscriberCommand) -> bool {
        match command {
            SubscriberCommand::Subscribe => {
                if self.shutdown.is_requested() {
                    return false;
                }
                let _ = self.subscribe_with_retry();
                true
            }
            SubscriberCommand::Unsubscribe => {
                let _ = self.unsubscribe();
                !self.shutdown.is_requested()
            }
            SubscriberCommand::Shutdown => false,
        }
    }

    pub fn run(self) {
        if self.handle(SubscriberCommand::Subscribe) {
            while self.handle(self.inbox.recv()) {}
        }
        info!("SUB: stopped");
    }
}

// ── Inbound handler ───────────────────────────────────────────

/// Stages inbound configuration payloads for the config dispatcher.
#[derive(Clone)]
pub struct PayloadStager {
    payload: PayloadLock,
    wake: Arc<WakeSignal>,
}

impl PayloadStager {
    pub fn new(payload: PayloadLock, wake: Arc<WakeSignal>) -> Self {
        Self { payload, wake }
    }

    /// Copy `message` into the staging buffer and wake the dispatcher.
    ///
    /// An oversize message is rejected before the lock is taken: the
    /// buffer keeps its previous content and no wake is posted.
    pub fn on_message(&self, message: &[u8]) -> Result<(), PayloadError> {
        if let Err(e) = PayloadBuffer::check_fits(message.len()) {
            warn!("SUB: dropping inbound message: {}", e);
            return Err(e);
        }
        self.payload.lock().stage(message)?;
        debug!("SUB: staged {} bytes", message.len());
        self.wake.post(());
        Ok(())
    }
}

/// Build the session event handler: configuration messages on `topic`
/// are staged, disconnections are reported to the coordinator.
pub fn session_event_handler(
    stager: PayloadStager,
    topic: Topic,
    coordinator: Arc<SessionQueue>,
) -> SessionEventHandler {
    Arc::new(move |event: SessionEvent<'_>| match event {
        SessionEvent::Message(msg) if msg.topic == topic.as_str() => {
            let _ = stager.on_message(msg.payload);
        }
        SessionEvent::Message(msg) => {
            debug!("SUB: ignoring message on '{}'", msg.topic);
        }
        SessionEvent::Disconnected => {
            warn!("SUB: session disconnected");
            coordinator.send_or_drop(SessionCommand::Disconnection);
        }
    })
}

//! In-memory message session.
//!
//! Stands in for the broker client on host builds: records every publish,
//! tracks subscriptions, delivers injected messages to the registered
//! event handler, and can be told to fail the next N calls of each kind.
//!
//! The handler is always invoked with no internal lock held, so it may
//! call back into the session.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::app::ports::{InboundMessage, MessageSession, SessionEvent, SessionEventHandler};
use crate::config::Qos;
use crate::error::SessionError;

/// One recorded publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
    pub retain: bool,
}

impl PublishedMessage {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.payload).into_owned()
    }
}

/// Per-operation call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub connect: u32,
    pub disconnect: u32,
    pub subscribe: u32,
    pub unsubscribe: u32,
    pub publish: u32,
}

#[derive(Default)]
struct LoopbackState {
    connected: bool,
    subscriptions: Vec<String>,
    published: Vec<PublishedMessage>,
    calls: CallCounts,
    fail_connects: u32,
    fail_subscribes: u32,
    fail_publishes: u32,
}

/// Loopback [`MessageSession`].
#[derive(Default)]
pub struct LoopbackSession {
    state: Mutex<LoopbackState>,
    handler: Mutex<Option<SessionEventHandler>>,
}

/// Consume one unit of an injected failure budget.
fn take_failure(budget: &mut u32) -> bool {
    if *budget == 0 {
        return false;
    }
    if *budget != u32::MAX {
        *budget -= 1;
    }
    true
}

impl LoopbackSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, LoopbackState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handler(&self) -> Option<SessionEventHandler> {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // ── Failure injection (`u32::MAX` = fail forever) ────────────

    pub fn fail_next_connects(&self, n: u32) {
        self.state().fail_connects = n;
    }

    pub fn fail_next_subscribes(&self, n: u32) {
        self.state().fail_subscribes = n;
    }

    pub fn fail_next_publishes(&self, n: u32) {
        self.state().fail_publishes = n;
    }

    // ── Broker-side actions ──────────────────────────────────────

    /// Deliver a message as if the broker had routed it.  Returns `false`
    /// when nothing is subscribed to `topic` (or no handler is set).
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        let subscribed = {
            let st = self.state();
            st.connected && st.subscriptions.iter().any(|t| t == topic)
        };
        if !subscribed {
            debug!("LOOPBACK: no subscriber for '{}'", topic);
            return false;
        }
        let Some(handler) = self.handler() else {
            return false;
        };
        handler(SessionEvent::Message(InboundMessage {
            topic,
            payload,
            qos: Qos::AtLeastOnce,
        }));
        true
    }

    /// Simulate the broker dropping the connection.
    pub fn drop_connection(&self) {
        {
            let mut st = self.state();
            st.connected = false;
            st.subscriptions.clear();
        }
        if let Some(handler) = self.handler() {
            handler(SessionEvent::Disconnected);
        }
    }

    // ── Inspection ───────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.state().connected
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.state().subscriptions.iter().any(|t| t == topic)
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state().published.clone()
    }

    /// Text of every message published on `topic`, oldest first.
    pub fn published_texts(&self, topic: &str) -> Vec<String> {
        self.state()
            .published
            .iter()
            .filter(|m| m.topic == topic)
            .map(PublishedMessage::text)
            .collect()
    }

    pub fn calls(&self) -> CallCounts {
        self.state().calls
    }
}

impl MessageSession for LoopbackSession {
    fn connect(&self) -> Result<(), SessionError> {
        let mut st = self.state();
        st.calls.connect += 1;
        if take_failure(&mut st.fail_connects) {
            return Err(SessionError::ConnectFailed);
        }
        st.connected = true;
        Ok(())
    }

    fn disconnect(&self) {
        let mut st = self.state();
        st.calls.disconnect += 1;
        st.connected = false;
        st.subscriptions.clear();
    }

    fn subscribe(&self, topic: &str, _qos: Qos) -> Result<(), SessionError> {
        let mut st = self.state();
        st.calls.subscribe += 1;
        if !st.connected {
            return Err(SessionError::NotConnected);
        }
        if take_failure(&mut st.fail_subscribes) {
            return Err(SessionError::SubscribeFailed);
        }
        if !st.subscriptions.iter().any(|t| t == topic) {
            st.subscriptions.push(topic.to_owned());
        }
        Ok(())
    }

    fn unsubscribe(&self, topic: &str) -> Result<(), SessionError> {
        let mut st = self.state();
        st.calls.unsubscribe += 1;
        let before = st.subscriptions.len();
        st.subscriptions.retain(|t| t != topic);
        if st.subscriptions.len() == before {
            return Err(SessionError::UnsubscribeFailed);
        }
        Ok(())
    }

    fn publish(&self, topic: &str, payload: &[u8], qos: Qos, retain: bool) -> Result<(), SessionError> {
        let mut st = self.state();
        st.calls.publish += 1;
        if !st.connected {
            return Err(SessionError::NotConnected);
        }
        if take_failure(&mut st.fail_publishes) {
            return Err(SessionError::PublishFailed);
        }
        st.published.push(PublishedMessage {
            topic: topic.to_owned(),
            payload: payload.to_vec(),
            qos,
            retain,
        });
        Ok(())
    }

    fn set_event_handler(&self, handler: SessionEventHandler) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }
}

//! System configuration parameters
//!
//! All tunable parameters for the RadarBridge bridge.  Defaults match the
//! deployed firmware; the host binary may override them from a JSON file.

use core::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::mode::OperatingMode;

/// Pub/sub topic name.
pub type Topic = heapless::String<64>;

/// Message session quality of service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Qos {
    AtMostOnce,
    #[default]
    AtLeastOnce,
    ExactlyOnce,
}

/// What the session coordinator does when a failure is escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RemediationPolicy {
    /// Drop and re-establish the session, then re-subscribe.  Halts once
    /// `max_attempts` connects in a row have failed.
    Reconnect { max_attempts: u32, retry_ms: u32 },
    /// Stop every task on the first escalated failure.
    Halt,
}

impl Default for RemediationPolicy {
    fn default() -> Self {
        Self::Reconnect {
            max_attempts: 3,
            retry_ms: 2000,
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Active operating mode (permitted keys and event vocabulary).
    pub mode: OperatingMode,

    // --- Session ---
    /// Topic telemetry and acknowledgments are published on
    pub publish_topic: Topic,
    /// Topic configuration payloads arrive on
    pub subscribe_topic: Topic,
    pub qos: Qos,
    /// Retain flag for published messages
    pub retain: bool,

    // --- Retry ---
    pub publish_max_attempts: u32,
    pub publish_retry_ms: u32,
    pub subscribe_max_attempts: u32,
    pub subscribe_retry_ms: u32,

    // --- Timing ---
    /// Sleep between sensing engine `advance` calls (milliseconds)
    pub engine_process_interval_ms: u32,
    /// LED pattern tick interval (milliseconds)
    pub led_tick_interval_ms: u32,

    pub remediation: RemediationPolicy,
}

fn topic(s: &str) -> Topic {
    let mut t = Topic::new();
    // Both default topics are well under capacity.
    let _ = t.push_str(s);
    t
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),

            // Session
            publish_topic: topic("radar/status"),
            subscribe_topic: topic("radar/config"),
            qos: Qos::AtLeastOnce,
            retain: false,

            // Retry
            publish_max_attempts: 10,
            publish_retry_ms: 1000,
            subscribe_max_attempts: 3,
            subscribe_retry_ms: 1000,

            // Timing
            engine_process_interval_ms: 2,
            led_tick_interval_ms: 2,

            remediation: RemediationPolicy::default(),
        }
    }
}

/// Configuration rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Not valid JSON or wrong field types.
    Parse,
    /// A topic field is empty.
    EmptyTopic(&'static str),
    /// An attempt bound is zero.
    ZeroAttempts(&'static str),
    /// A loop interval is zero.
    ZeroInterval(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse => write!(f, "malformed configuration JSON"),
            Self::EmptyTopic(field) => write!(f, "{field} must not be empty"),
            Self::ZeroAttempts(field) => write!(f, "{field} must be at least 1"),
            Self::ZeroInterval(field) => write!(f, "{field} must be non-zero"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl SystemConfig {
    /// Parse a JSON document.  Missing fields take their default value.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|e| {
            warn!("CONFIG: {e}");
            ConfigError::Parse
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish_topic.is_empty() {
            return Err(ConfigError::EmptyTopic("publish_topic"));
        }
        if self.subscribe_topic.is_empty() {
            return Err(ConfigError::EmptyTopic("subscribe_topic"));
        }
        if self.publish_max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("publish_max_attempts"));
        }
        if self.subscribe_max_attempts == 0 {
            return Err(ConfigError::ZeroAttempts("subscribe_max_attempts"));
        }
        if self.engine_process_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("engine_process_interval_ms"));
        }
        if self.led_tick_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval("led_tick_interval_ms"));
        }
        if matches!(
            self.remediation,
            RemediationPolicy::Reconnect { max_attempts: 0, .. }
        ) {
            return Err(ConfigError::ZeroAttempts("remediation.max_attempts"));
        }
        Ok(())
    }
}

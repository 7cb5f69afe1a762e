//! Startup, task spawning and coordinated shutdown.
//!
//! ```text
//!  start():  validate config
//!            └▶ engine init / callback / defaults / enable   (SensingDriver::start)
//!               └▶ install session handler, connect
//!                  └▶ spawn coordinator, publisher, dispatcher, LED, driver, subscriber
//!
//!  request_shutdown() ─▶ Unsubscribe ─▶ StatusSlot ─▶ coordinator halts ─▶ every task returns
//!  join()             ─▶ HaltReason
//! ```
//!
//! Every startup step is fallible and reported through `anyhow` with
//! context.  If a spawn fails after some tasks are already running, those
//! tasks are told to stop before the error is returned.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use crate::app::commands::{PublisherCommand, SubscriberCommand, SystemStatus};
use crate::app::ports::{Clock, MessageSession, SensingEngine, StatusLedPort};
use crate::config::SystemConfig;
use crate::drivers::led_patterns::PatternEngine;
use crate::drivers::task_pin::{Core, TaskSpec, spawn_on_core};
use crate::locks::{PayloadLock, SharedEngine};
use crate::pins::HardwareConfig;
use crate::queue::WakeSignal;
use crate::shutdown::{HaltReason, Shutdown};
use crate::tasks::config_dispatcher::ConfigDispatcher;
use crate::tasks::led_responder::{EventResponder, LedTask};
use crate::tasks::publisher::{PublishSettings, Publisher};
use crate::tasks::sensing_driver::{RadarEventHandler, SensingDriver};
use crate::tasks::session::{Dependents, SessionCoordinator};
use crate::tasks::subscriber::{PayloadStager, SubscribeSettings, Subscriber, session_event_handler};
use crate::tasks::{PublisherQueue, SessionQueue, StatusSlot, SubscriberQueue};
use crate::telemetry::SensingCounters;

// ── Static task table ─────────────────────────────────────────

pub const COORDINATOR_TASK: TaskSpec = TaskSpec {
    name: "session\0",
    core: Core::Pro,
    priority: 2,
    stack_kb: 8,
};
pub const PUBLISHER_TASK: TaskSpec = TaskSpec {
    name: "publisher\0",
    core: Core::Pro,
    priority: 2,
    stack_kb: 8,
};
pub const SUBSCRIBER_TASK: TaskSpec = TaskSpec {
    name: "subscriber\0",
    core: Core::Pro,
    priority: 2,
    stack_kb: 8,
};
pub const DISPATCHER_TASK: TaskSpec = TaskSpec {
    name: "config\0",
    core: Core::App,
    priority: 3,
    stack_kb: 8,
};
pub const DRIVER_TASK: TaskSpec = TaskSpec {
    name: "radar\0",
    core: Core::App,
    priority: 3,
    stack_kb: 16,
};
pub const LED_TASK: TaskSpec = TaskSpec {
    name: "led\0",
    core: Core::App,
    priority: 2,
    stack_kb: 4,
};

/// Queues and signals used to wake tasks during shutdown.
#[derive(Clone)]
struct Wakers {
    shutdown: Shutdown,
    status: Arc<StatusSlot>,
    publisher: Arc<PublisherQueue>,
    subscriber: Arc<SubscriberQueue>,
    dispatcher: Arc<WakeSignal>,
}

impl Wakers {
    /// Stop everything without the coordinator's help.
    fn stop_all(&self, reason: HaltReason) {
        self.shutdown.trigger(reason);
        self.status.post(SystemStatus::ShutdownRequested);
        self.publisher.send_or_drop(PublisherCommand::Shutdown);
        self.subscriber.send_or_drop(SubscriberCommand::Shutdown);
        self.dispatcher.post(());
    }
}

/// Running task graph.
pub struct Runtime {
    wakers: Wakers,
    coordinator: JoinHandle<HaltReason>,
    workers: Vec<(&'static str, JoinHandle<()>)>,
    responder: EventResponder,
    counters: Arc<SensingCounters>,
}

fn spawn<T, F>(spec: TaskSpec, f: F) -> Result<JoinHandle<T>>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    spawn_on_core(spec, f).with_context(|| format!("spawning {} task", spec.display_name()))
}

impl Runtime {
    /// Bring the bridge up.  `session` is shared with the caller so it can
    /// keep using it (e.g. to inject messages in simulation).
    pub fn start<S, E, L, C>(
        config: &SystemConfig,
        session: Arc<S>,
        engine: E,
        led: L,
        clock: C,
    ) -> Result<Self>
    where
        S: MessageSession + 'static,
        E: SensingEngine + 'static,
        L: StatusLedPort + 'static,
        C: Clock + 'static,
    {
        config.validate().context("invalid system configuration")?;
        let mode = config.mode;
        info!("RUNTIME: starting in {} mode", mode.label());

        let shutdown = Shutdown::new();
        let publisher_q = Arc::new(PublisherQueue::new("publisher"));
        let subscriber_q = Arc::new(SubscriberQueue::new("subscriber"));
        let session_q = Arc::new(SessionQueue::new("session"));
        let status = Arc::new(StatusSlot::new());
        let wake = Arc::new(WakeSignal::new());
        let payload = PayloadLock::new();
        let engine = SharedEngine::new(engine);
        let counters = Arc::new(SensingCounters::new());
        let responder = EventResponder::new(PatternEngine::new());

        let wakers = Wakers {
            shutdown: shutdown.clone(),
            status: Arc::clone(&status),
            publisher: Arc::clone(&publisher_q),
            subscriber: Arc::clone(&subscriber_q),
            dispatcher: Arc::clone(&wake),
        };

        // ── Sensing engine ──
        let driver = SensingDriver::new(
            mode,
            HardwareConfig::board(),
            engine.clone(),
            clock,
            RadarEventHandler::new(
                mode,
                Arc::clone(&counters),
                Arc::clone(&publisher_q),
                responder.clone(),
            ),
            Arc::clone(&status),
            shutdown.clone(),
            Duration::from_millis(u64::from(config.engine_process_interval_ms)),
        );
        driver.start().context("sensing engine startup")?;

        // ── Message session ──
        session.set_event_handler(session_event_handler(
            PayloadStager::new(payload.clone(), Arc::clone(&wake)),
            config.subscribe_topic.clone(),
            Arc::clone(&session_q),
        ));
        session.connect().context("message session connect")?;

        // ── Tasks ──
        let coordinator = SessionCoordinator::new(
            Arc::clone(&session),
            Arc::clone(&session_q),
            Arc::clone(&status),
            Dependents {
                publisher: Arc::clone(&publisher_q),
                subscriber: Arc::clone(&subscriber_q),
                dispatcher_wake: Arc::clone(&wake),
            },
            shutdown.clone(),
            config.remediation,
        );
        let coordinator = spawn(COORDINATOR_TASK, move || coordinator.run())?;

        let mut runtime = Self {
            wakers,
            coordinator,
            workers: Vec::with_capacity(5),
            responder: responder.clone(),
            counters: Arc::clone(&counters),
        };

        let publisher = Publisher::new(
            Arc::clone(&session),
            Arc::clone(&publisher_q),
            Arc::clone(&session_q),
            shutdown.clone(),
            PublishSettings::from_config(config),
        );
        runtime.spawn_worker(PUBLISHER_TASK, move || publisher.run())?;

        let dispatcher = ConfigDispatcher::new(
            mode,
            payload,
            engine,
            counters,
            Arc::clone(&publisher_q),
            wake,
            shutdown.clone(),
        );
        runtime.spawn_worker(DISPATCHER_TASK, move || dispatcher.run())?;

        let led_task = LedTask::new(
            responder,
            led,
            Duration::from_millis(u64::from(config.led_tick_interval_ms)),
            shutdown.clone(),
        );
        runtime.spawn_worker(LED_TASK, move || {
            led_task.run();
        })?;

        runtime.spawn_worker(DRIVER_TASK, move || {
            // Failures are logged and posted to the coordinator by `run`.
            let _ = driver.run();
        })?;

        let subscriber = Subscriber::new(
            session,
            subscriber_q,
            session_q,
            shutdown,
            SubscribeSettings::from_config(config),
        );
        runtime.spawn_worker(SUBSCRIBER_TASK, move || subscriber.run())?;

        info!("RUNTIME: all tasks running");
        Ok(runtime)
    }

    fn spawn_worker<F>(&mut self, spec: TaskSpec, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        match spawn(spec, f) {
            Ok(handle) => {
                self.workers.push((spec.display_name(), handle));
                Ok(())
            }
            Err(e) => {
                self.wakers.stop_all(HaltReason::Requested);
                Err(e)
            }
        }
    }

    /// Ask every task to stop.  Returns immediately; use [`join`](Self::join)
    /// to wait.
    ///
    /// The unsubscribe is queued ahead of the coordinator's `Shutdown`, so
    /// the subscriber runs it before stopping.  It can still reach the
    /// broker after the disconnect, in which case it fails and is logged.
    pub fn request_shutdown(&self) {
        info!("RUNTIME: shutdown requested");
        self.wakers.subscriber.send_or_drop(SubscriberCommand::Unsubscribe);
        self.wakers.shutdown.trigger(HaltReason::Requested);
        self.wakers.status.post(SystemStatus::ShutdownRequested);
    }

    pub fn is_halted(&self) -> bool {
        self.wakers.shutdown.is_requested()
    }

    /// Live view of the LED pattern state.
    pub fn responder(&self) -> &EventResponder {
        &self.responder
    }

    pub fn counters(&self) -> &SensingCounters {
        &self.counters
    }

    /// Wait for every task to finish and return why the system stopped.
    pub fn join(self) -> HaltReason {
        let reason = match self.coordinator.join() {
            Ok(reason) => reason,
            Err(_) => {
                error!("RUNTIME: coordinator panicked");
                self.wakers.stop_all(HaltReason::Requested);
                self.wakers.shutdown.reason().unwrap_or(HaltReason::Requested)
            }
        };
        for (name, handle) in self.workers {
            if handle.join().is_err() {
                error!("RUNTIME: {} task panicked", name);
            }
        }
        info!("RUNTIME: stopped: {}", reason);
        reason
    }
}

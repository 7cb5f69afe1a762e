//! Event responder and LED task.
//!
//! [`EventResponder`] is the shared handle to the pattern state.  The
//! sensing driver calls [`EventResponder::set_pattern`] from inside the
//! engine callback; the LED task calls [`EventResponder::tick`] on its own
//! period and drives the status LED with the result.  The pattern lock is
//! scoped to the pattern state alone and is the innermost lock in the
//! system.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, info};

use crate::app::ports::{LedColour, StatusLedPort};
use crate::drivers::led_patterns::PatternEngine;
use crate::events::RadarEvent;
use crate::shutdown::Shutdown;

/// Shared handle to the pattern automaton.
#[derive(Clone, Default)]
pub struct EventResponder {
    pattern: Arc<Mutex<PatternEngine>>,
}

impl EventResponder {
    pub fn new(pattern: PatternEngine) -> Self {
        Self {
            pattern: Arc::new(Mutex::new(pattern)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PatternEngine> {
        self.pattern.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feed one sensing event into the automaton.
    pub fn set_pattern(&self, event: RadarEvent) {
        debug!("LED: pattern <- {}", event.label());
        self.lock().set_pattern(event);
    }

    /// Advance one tick.
    pub fn tick(&self) -> LedColour {
        self.lock().tick()
    }

    /// Copy of the current automaton state.
    pub fn snapshot(&self) -> PatternEngine {
        self.lock().clone()
    }
}

/// Periodic LED output task.
pub struct LedTask<L> {
    responder: EventResponder,
    led: L,
    interval: Duration,
    shutdown: Shutdown,
}

impl<L: StatusLedPort> LedTask<L> {
    pub fn new(responder: EventResponder, led: L, interval: Duration, shutdown: Shutdown) -> Self {
        Self {
            responder,
            led,
            interval,
            shutdown,
        }
    }

    /// One tick: advance the pattern and drive the LED.
    pub fn step(&mut self) -> LedColour {
        let colour = self.responder.tick();
        self.led.set_colour(colour);
        colour
    }

    /// Tick until shutdown, then switch the LED off.  Returns the port.
    pub fn run(mut self) -> L {
        info!("LED: ticking every {:?}", self.interval);
        while !self.shutdown.is_requested() {
            self.step();
            thread::sleep(self.interval);
        }
        self.led.set_colour(LedColour::Off);
        info!("LED: stopped");
        self.led
    }
}

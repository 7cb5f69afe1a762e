//! Tick-driven LED pattern engine for radar events.
//!
//! Converts sensing events into a colour per tick.  Two kinds of output:
//!
//! - **Blinks** for directional counter events, each direction with its
//!   own timing.  Both blink in the latched colour ([`DEFAULT_COLOUR`]
//!   until an occupancy / presence event changes it).
//! - **Steady** colour latched by occupancy / presence events, shown
//!   whenever no blink is running.
//!
//! ## Blink timing
//!
//! ```text
//!  phase  1 .. on-1   on .. period-1   period
//!         ─ colour ─  ───── off ─────  rollover: repeat, or finish
//!
//!  IN   on=3  period=20  repeats=5   → 6 cycles, 120 ticks
//!  OUT  on=3  period=50  repeats=2   → 3 cycles, 150 ticks
//! ```
//!
//! On the rollover that completes the last repeat the channel's pending
//! count drops by one and the steady colour is emitted for that tick.
//!
//! ## Priority
//!
//! The IN channel is always serviced first.  An OUT event that arrives
//! while an IN blink is running waits in its pending count; an IN event
//! that arrives while an OUT blink is running cancels it.
//!
//! The engine knows nothing about time or threads.  Feed events with
//! [`PatternEngine::set_pattern`], then call [`PatternEngine::tick`] and
//! assert on the returned colour.

use crate::app::ports::LedColour;
use crate::events::RadarEvent;

/// On/off timing of one blink channel, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkTiming {
    /// Ticks `1..on_ticks` of each cycle are lit.
    pub on_ticks: u16,
    /// Cycle length; the rollover happens on this tick.
    pub period_ticks: u16,
    /// Extra cycles after the first.
    pub repeats: u8,
}

pub const IN_BLINK: BlinkTiming = BlinkTiming {
    on_ticks: 3,
    period_ticks: 20,
    repeats: 5,
};

pub const OUT_BLINK: BlinkTiming = BlinkTiming {
    on_ticks: 3,
    period_ticks: 50,
    repeats: 2,
};

/// Colour shown when no steady condition has been latched yet.
pub const DEFAULT_COLOUR: LedColour = LedColour::Green;

/// Last occupancy / presence condition reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteadyCondition {
    Occupied,
    Free,
    PresenceIn,
    PresenceOut,
}

impl SteadyCondition {
    pub const fn colour(self) -> LedColour {
        match self {
            Self::Occupied | Self::PresenceIn => LedColour::Red,
            Self::Free | Self::PresenceOut => LedColour::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct BlinkChannel {
    pending: u8,
    phase: u16,
    repeats_done: u8,
}

impl BlinkChannel {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Advance one tick.  `None` means "show the steady output".
    fn step(&mut self, timing: BlinkTiming, colour: LedColour) -> Option<LedColour> {
        self.phase += 1;
        if self.phase < timing.on_ticks {
            return Some(colour);
        }
        if self.phase < timing.period_ticks {
            return Some(LedColour::Off);
        }
        self.phase = 0;
        if self.repeats_done >= timing.repeats {
            self.pending -= 1;
            self.repeats_done = 0;
            None
        } else {
            self.repeats_done += 1;
            Some(LedColour::Off)
        }
    }
}

/// Pattern state automaton.
#[derive(Debug, Clone)]
pub struct PatternEngine {
    in_channel: BlinkChannel,
    out_channel: BlinkChannel,
    steady: Option<SteadyCondition>,
    colour: LedColour,
    in_timing: BlinkTiming,
    out_timing: BlinkTiming,
}

impl PatternEngine {
    pub fn new() -> Self {
        Self::with_timing(IN_BLINK, OUT_BLINK)
    }

    pub fn with_timing(in_timing: BlinkTiming, out_timing: BlinkTiming) -> Self {
        Self {
            in_channel: BlinkChannel::default(),
            out_channel: BlinkChannel::default(),
            steady: None,
            colour: DEFAULT_COLOUR,
            in_timing,
            out_timing,
        }
    }

    /// Transition on a sensing event.
    pub fn set_pattern(&mut self, event: RadarEvent) {
        match event {
            RadarEvent::CounterIn => {
                self.in_channel.pending = 1;
                self.out_channel.reset();
            }
            RadarEvent::CounterOut => self.out_channel.pending = 1,
            RadarEvent::CounterOccupied => self.latch(SteadyCondition::Occupied),
            RadarEvent::CounterFree => self.latch(SteadyCondition::Free),
            RadarEvent::PresenceIn => self.latch(SteadyCondition::PresenceIn),
            RadarEvent::PresenceOut => self.latch(SteadyCondition::PresenceOut),
        }
    }

    fn latch(&mut self, condition: SteadyCondition) {
        self.steady = Some(condition);
        self.colour = condition.colour();
    }

    /// Advance one tick and return the colour to drive.
    pub fn tick(&mut self) -> LedColour {
        let blink = if self.in_channel.pending > 0 {
            self.in_channel.step(self.in_timing, self.colour)
        } else if self.out_channel.pending > 0 {
            self.out_channel.step(self.out_timing, self.colour)
        } else {
            None
        };
        blink.unwrap_or_else(|| self.steady_output())
    }

    fn steady_output(&self) -> LedColour {
        if self.steady.is_some() {
            self.colour
        } else {
            LedColour::Off
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.in_channel.pending > 0 || self.out_channel.pending > 0
    }

    pub fn in_pending(&self) -> u8 {
        self.in_channel.pending
    }

    pub fn out_pending(&self) -> u8 {
        self.out_channel.pending
    }

    pub fn steady(&self) -> Option<SteadyCondition> {
        self.steady
    }

    /// Latched colour, [`DEFAULT_COLOUR`] until the first steady event.
    pub fn colour(&self) -> LedColour {
        self.colour
    }
}

impl Default for PatternEngine {
    fn default() -> Self {
        Self::new()
    }
}

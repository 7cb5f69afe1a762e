//! LED responder driven the way the sensing driver and LED task drive it.

use std::thread;
use std::time::Duration;

use radarbridge::app::ports::LedColour;
use radarbridge::drivers::led_patterns::{IN_BLINK, OUT_BLINK, PatternEngine};
use radarbridge::events::RadarEvent;
use radarbridge::shutdown::{HaltReason, Shutdown};
use radarbridge::tasks::led_responder::{EventResponder, LedTask};

use crate::mock_hw::{RecordingLed, wait_until};

fn ticks_of(timing: radarbridge::drivers::led_patterns::BlinkTiming) -> usize {
    usize::from(timing.period_ticks) * (usize::from(timing.repeats) + 1)
}

#[test]
fn entry_blink_then_return_to_steady_zone_colour() {
    let responder = EventResponder::new(PatternEngine::new());
    let led = RecordingLed::new();
    let mut task = LedTask::new(
        responder.clone(),
        led.clone(),
        Duration::from_millis(2),
        Shutdown::new(),
    );

    responder.set_pattern(RadarEvent::CounterOccupied);
    responder.set_pattern(RadarEvent::CounterIn);
    for _ in 0..ticks_of(IN_BLINK) {
        task.step();
    }
    let history = led.history();
    assert!(history.iter().all(|c| matches!(c, LedColour::Red | LedColour::Off)));
    let blink = &history[..history.len() - 1];
    assert_eq!(blink.iter().filter(|c| **c == LedColour::Red).count(), 2 * 6);
    assert_eq!(history.last(), Some(&LedColour::Red), "rollover shows steady colour");

    assert_eq!(task.step(), LedColour::Red, "steady occupied colour");
    assert!(!responder.snapshot().is_blinking());
}

#[test]
fn exit_blink_waits_for_entry_blink() {
    let responder = EventResponder::new(PatternEngine::new());
    responder.set_pattern(RadarEvent::CounterIn);
    responder.set_pattern(RadarEvent::CounterOut);

    for _ in 0..ticks_of(IN_BLINK) {
        responder.tick();
        assert_eq!(responder.snapshot().out_pending(), 1);
    }
    assert_eq!(responder.snapshot().in_pending(), 0);

    let exit: Vec<LedColour> = (0..ticks_of(OUT_BLINK)).map(|_| responder.tick()).collect();
    let lit = exit.iter().filter(|c| **c == LedColour::Green).count();
    assert_eq!(lit, 2 * 3);
    assert_eq!(responder.snapshot().out_pending(), 0);
}

#[test]
fn blink_follows_latched_zone_colour() {
    let responder = EventResponder::new(PatternEngine::new());
    responder.set_pattern(RadarEvent::CounterOccupied);
    responder.set_pattern(RadarEvent::CounterFree);
    responder.set_pattern(RadarEvent::CounterIn);
    assert_eq!(responder.tick(), LedColour::Green);

    responder.set_pattern(RadarEvent::CounterOccupied);
    assert_eq!(responder.tick(), LedColour::Red, "running blink picks up the new colour");
}

#[test]
fn task_switches_led_off_on_shutdown() {
    let responder = EventResponder::new(PatternEngine::new());
    responder.set_pattern(RadarEvent::PresenceIn);
    let led = RecordingLed::new();
    let shutdown = Shutdown::new();
    let task = LedTask::new(
        responder,
        led.clone(),
        Duration::from_millis(1),
        shutdown.clone(),
    );
    let handle = thread::spawn(move || task.run());

    assert!(wait_until(Duration::from_secs(1), || {
        led.last() == Some(LedColour::Red)
    }));
    shutdown.trigger(HaltReason::Requested);
    handle.join().unwrap();
    assert_eq!(led.last(), Some(LedColour::Off));
}

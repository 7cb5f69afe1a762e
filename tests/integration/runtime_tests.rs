//! Full task graph on the host: loopback session, simulated radar,
//! recording LED and the system clock.

use std::sync::Arc;
use std::time::Duration;

use radarbridge::adapters::loopback::LoopbackSession;
use radarbridge::adapters::sim_radar::{SimRadarHandle, SimulatedRadar};
use radarbridge::adapters::time::SystemClock;
use radarbridge::app::ports::LedColour;
use radarbridge::config::{RemediationPolicy, SystemConfig};
use radarbridge::error::{EngineError, SessionError};
use radarbridge::events::RadarEvent;
use radarbridge::mode::OperatingMode;
use radarbridge::runtime::Runtime;
use radarbridge::shutdown::HaltReason;

use crate::mock_hw::{RecordingLed, fast_config, wait_until};

const WAIT: Duration = Duration::from_secs(3);

struct Rig {
    session: Arc<LoopbackSession>,
    radar: SimRadarHandle,
    led: RecordingLed,
    runtime: Runtime,
}

fn boot(config: &SystemConfig) -> Rig {
    let session = Arc::new(LoopbackSession::new());
    let radar = SimulatedRadar::new();
    let handle = radar.handle();
    let led = RecordingLed::new();
    let runtime = Runtime::start(
        config,
        Arc::clone(&session),
        radar,
        led.clone(),
        SystemClock::new(),
    )
    .expect("runtime start");
    assert!(
        wait_until(WAIT, || session.is_subscribed(config.subscribe_topic.as_str())),
        "subscriber never subscribed"
    );
    Rig {
        session,
        radar: handle,
        led,
        runtime,
    }
}

fn status_texts(rig: &Rig, config: &SystemConfig) -> Vec<String> {
    rig.session.published_texts(config.publish_topic.as_str())
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn startup_applies_mode_defaults_and_subscribes() {
    let config = fast_config(OperatingMode::Counter);
    let rig = boot(&config);

    for (key, value) in OperatingMode::Counter.default_parameters() {
        assert_eq!(rig.radar.parameter(key).as_deref(), Some(*value), "{key}");
    }
    assert!(rig.session.is_connected());
    assert!(wait_until(WAIT, || rig.radar.advance_calls() > 0));

    rig.runtime.request_shutdown();
    assert_eq!(rig.runtime.join(), HaltReason::Requested);
}

#[test]
fn shutdown_unsubscribes_before_stopping() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);
    assert_eq!(rig.session.calls().unsubscribe, 0);

    rig.runtime.request_shutdown();
    assert_eq!(rig.runtime.join(), HaltReason::Requested);
    assert_eq!(rig.session.calls().unsubscribe, 1);
    assert!(!rig.session.is_subscribed(config.subscribe_topic.as_str()));
}

#[test]
fn engine_init_failure_aborts_startup() {
    let session = Arc::new(LoopbackSession::new());
    let radar = SimulatedRadar::new();
    radar.handle().fail_init();

    let Err(e) = Runtime::start(
        &fast_config(OperatingMode::Presence),
        Arc::clone(&session),
        radar,
        RecordingLed::new(),
        SystemClock::new(),
    ) else {
        panic!("startup should fail");
    };
    assert_eq!(format!("{e:#}"), "sensing engine startup: init failed");
    assert_eq!(e.downcast_ref::<EngineError>(), Some(&EngineError::InitFailed));
    assert_eq!(session.calls().connect, 0, "no connect after engine failure");
}

#[test]
fn connect_failure_aborts_startup() {
    let session = Arc::new(LoopbackSession::new());
    session.fail_next_connects(1);

    let Err(e) = Runtime::start(
        &fast_config(OperatingMode::Presence),
        Arc::clone(&session),
        SimulatedRadar::new(),
        RecordingLed::new(),
        SystemClock::new(),
    ) else {
        panic!("startup should fail");
    };
    assert_eq!(format!("{e:#}"), "message session connect: connect failed");
    assert_eq!(e.downcast_ref::<SessionError>(), Some(&SessionError::ConnectFailed));
}

#[test]
fn invalid_config_is_refused() {
    let mut config = fast_config(OperatingMode::Presence);
    config.publish_max_attempts = 0;
    let result = Runtime::start(
        &config,
        Arc::new(LoopbackSession::new()),
        SimulatedRadar::new(),
        RecordingLed::new(),
        SystemClock::new(),
    );
    assert!(result.is_err());
}

// ── Configuration path ────────────────────────────────────────

#[test]
fn remote_configuration_is_applied_and_acknowledged() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    assert!(rig.session.inject(
        config.subscribe_topic.as_str(),
        br#"{"radar_presence_range_max":"3.5","radar_counter_reverse":"true"}"#,
    ));
    assert!(wait_until(WAIT, || status_texts(&rig, &config).len() >= 2));

    let acks = status_texts(&rig, &config);
    assert_eq!(acks[0], "Config => radar_presence_range_max: 3.5");
    assert_eq!(acks[1], "\"radar_counter_reverse\": invalid entry key.");
    assert_eq!(
        rig.radar.parameter("radar_presence_range_max").as_deref(),
        Some("3.5")
    );

    rig.runtime.request_shutdown();
    assert_eq!(rig.runtime.join(), HaltReason::Requested);
}

#[test]
fn counter_reset_reaches_next_telemetry() {
    let config = fast_config(OperatingMode::Counter);
    let rig = boot(&config);

    rig.session.inject(
        config.subscribe_topic.as_str(),
        br#"{"radar_counter_in_number":"40"}"#,
    );
    assert!(wait_until(WAIT, || {
        status_texts(&rig, &config).contains(&"Config => radar_counter_in_number: 40".to_owned())
    }));

    let now = rig.radar.last_timestamp().unwrap_or(0);
    rig.radar.push_event(now, RadarEvent::CounterIn);
    assert!(wait_until(WAIT, || {
        status_texts(&rig, &config)
            .contains(&r#"{"IN_Count":41,"OUT_Count":0,"Status":0}"#.to_owned())
    }));

    rig.runtime.request_shutdown();
    rig.runtime.join();
}

#[test]
fn oversize_payload_is_ignored() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    let mut big = br#"{"radar_presence_range_max":""#.to_vec();
    big.resize(600, b'1');
    big.extend_from_slice(b"\"}");
    rig.session.inject(config.subscribe_topic.as_str(), &big);
    rig.session.inject(
        config.subscribe_topic.as_str(),
        br#"{"radar_presence_sensitivity":"high"}"#,
    );

    assert!(wait_until(WAIT, || !status_texts(&rig, &config).is_empty()));
    assert_eq!(
        status_texts(&rig, &config),
        vec!["Config => radar_presence_sensitivity: high".to_owned()]
    );

    rig.runtime.request_shutdown();
    rig.runtime.join();
}

// ── Sensing path ──────────────────────────────────────────────

#[test]
fn presence_events_publish_and_drive_led() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    rig.radar.push_event(0, RadarEvent::PresenceIn);
    assert!(wait_until(WAIT, || {
        status_texts(&rig, &config).contains(&r#"{"PRESENCE":"IN"}"#.to_owned())
    }));
    assert!(wait_until(WAIT, || rig.led.history().contains(&LedColour::Red)));

    rig.runtime.request_shutdown();
    rig.runtime.join();
    assert_eq!(rig.led.last(), Some(LedColour::Off), "LED is switched off on exit");
}

#[test]
fn out_of_mode_events_are_not_published() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    rig.radar.push_event(0, RadarEvent::CounterIn);
    rig.radar.push_event(0, RadarEvent::PresenceOut);
    assert!(wait_until(WAIT, || !status_texts(&rig, &config).is_empty()));
    assert_eq!(status_texts(&rig, &config), vec![r#"{"PRESENCE":"OUT"}"#.to_owned()]);

    rig.runtime.request_shutdown();
    rig.runtime.join();
}

#[test]
fn engine_fault_halts_the_system() {
    let config = fast_config(OperatingMode::Counter);
    let rig = boot(&config);

    rig.radar.fail_next_advance();
    assert_eq!(
        rig.runtime.join(),
        HaltReason::EngineFault(EngineError::ProcessFailed)
    );
    assert!(!rig.session.is_connected());
}

// ── Session remediation ───────────────────────────────────────

#[test]
fn disconnection_is_remediated_by_reconnect() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    rig.session.drop_connection();
    assert!(wait_until(WAIT, || rig.session.calls().subscribe >= 2
        && rig.session.is_subscribed(config.subscribe_topic.as_str())));
    assert!(rig.session.calls().connect >= 2);
    assert!(!rig.runtime.is_halted());

    rig.runtime.request_shutdown();
    assert_eq!(rig.runtime.join(), HaltReason::Requested);
}

#[test]
fn reconnect_exhaustion_halts() {
    let config = fast_config(OperatingMode::Presence);
    let rig = boot(&config);

    rig.session.fail_next_connects(u32::MAX);
    rig.session.drop_connection();
    assert_eq!(
        rig.runtime.join(),
        HaltReason::ReconnectExhausted(SessionError::ConnectFailed)
    );
}

#[test]
fn publish_failure_halts_under_halt_policy() {
    let config = SystemConfig {
        publish_max_attempts: 2,
        remediation: RemediationPolicy::Halt,
        ..fast_config(OperatingMode::Presence)
    };
    let rig = boot(&config);

    rig.session.fail_next_publishes(u32::MAX);
    rig.radar.push_event(0, RadarEvent::PresenceIn);
    assert_eq!(rig.runtime.join(), HaltReason::SessionFailure);
    assert!(rig.session.calls().publish >= 2);
}

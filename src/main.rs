//! RadarBridge: host simulation entry point.
//!
//! Runs the complete task graph against the loopback message session and
//! the simulated radar:
//!
//! ```text
//!  SimulatedRadar ──▶ SensingDriver ──▶ Publisher ──▶ LoopbackSession ──▶ log
//!                          │                              │
//!                      StatusLed                 inject(config payload)
//!                                                         ▼
//!                                      Subscriber ──▶ ConfigDispatcher
//! ```
//!
//! A short event script and two sample configuration payloads are played
//! in, then the bridge is shut down after `--run-secs`.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{info, warn};

use radarbridge::adapters::loopback::LoopbackSession;
use radarbridge::adapters::sim_radar::{SimRadarHandle, SimulatedRadar};
use radarbridge::adapters::time::SystemClock;
use radarbridge::config::SystemConfig;
use radarbridge::drivers::status_led::StatusLed;
use radarbridge::events::RadarEvent;
use radarbridge::mode::OperatingMode;
use radarbridge::runtime::Runtime;
use radarbridge::shutdown::HaltReason;

#[derive(Parser, Debug)]
#[command(name = "radarbridge-sim", version, about = "Run the radar bridge against simulated peripherals")]
struct Args {
    /// JSON system configuration; defaults are used when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the operating mode (`counter` or `presence`).
    #[arg(long)]
    mode: Option<OperatingMode>,

    /// Seconds to run before shutting down.
    #[arg(long, default_value_t = 10)]
    run_secs: u64,

    /// Debug-level logging.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<SystemConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SystemConfig::from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => SystemConfig::default(),
    };
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    Ok(config)
}

/// Events played by the simulated radar, one scene every six seconds.
fn script_events(radar: &SimRadarHandle, mode: OperatingMode, run_secs: u64) {
    let scene: &[(u64, RadarEvent)] = match mode {
        OperatingMode::Counter => &[
            (1000, RadarEvent::CounterIn),
            (1800, RadarEvent::CounterIn),
            (2500, RadarEvent::CounterOccupied),
            (3500, RadarEvent::CounterOut),
            (4500, RadarEvent::CounterFree),
        ],
        OperatingMode::Presence => &[
            (1000, RadarEvent::PresenceIn),
            (4000, RadarEvent::PresenceOut),
        ],
    };
    let mut base = 0;
    while base < run_secs * 1000 {
        for &(offset, event) in scene {
            radar.push_event(base + offset, event);
        }
        base += 6000;
    }
}

fn sample_payloads(mode: OperatingMode) -> [&'static str; 2] {
    match mode {
        OperatingMode::Counter => [
            r#"{"radar_counter_ceiling_height":"2.8","radar_counter_in_number":"0"}"#,
            r#"{"radar_presence_range_max":"2.0","radar_counter_reverse":"maybe"}"#,
        ],
        OperatingMode::Presence => [
            r#"{"radar_presence_range_max":"2.0","radar_presence_sensitivity":"high"}"#,
            r#"{"bogus":"1"}"#,
        ],
    }
}

/// Wait for the subscriber to complete its first subscribe sequence.
fn wait_subscribed(session: &LoopbackSession, topic: &str, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if session.is_subscribed(topic) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .init();

    info!("╔══════════════════════════════════════╗");
    info!("║  RadarBridge sim v{}               ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config(&args)?;
    let session = Arc::new(LoopbackSession::new());
    let radar = SimulatedRadar::new();
    let script = radar.handle();
    script_events(&script, config.mode, args.run_secs);
    let led = StatusLed::new().context("status LED init")?;

    let runtime = Runtime::start(&config, Arc::clone(&session), radar, led, SystemClock::new())?;

    if wait_subscribed(&session, &config.subscribe_topic, Duration::from_secs(5)) {
        for payload in sample_payloads(config.mode) {
            session.inject(&config.subscribe_topic, payload.as_bytes());
            thread::sleep(Duration::from_millis(200));
        }
    } else {
        warn!("subscription not established, skipping sample configuration");
    }

    thread::sleep(Duration::from_secs(args.run_secs));
    runtime.request_shutdown();
    let reason = runtime.join();

    for text in session.published_texts(&config.publish_topic) {
        info!("published: {}", text);
    }
    info!("radar delivered {} events", script.delivered_events());

    if reason != HaltReason::Requested {
        bail!("bridge halted: {reason}");
    }
    Ok(())
}

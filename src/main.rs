//! Platformer Simulation Driver
//!
//! Headless frame driver: builds a level, feeds a scripted key sequence
//! through the intent buffer, records it, then replays the recording and
//! verifies the state hashes match.
//!
//! Usage: `platformer-sim [LEVEL.json] [TICKS]`

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use platformer::{
    TICK_RATE, VERSION,
    game::{
        events::GameEventKind,
        input::{InputRecording, Press},
        level::LevelDescription,
        state::Simulation,
        tick::replay,
    },
};

/// Default run length: 30 seconds at the nominal tick rate
const DEFAULT_TICKS: u32 = 30 * TICK_RATE;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Platformer Sim v{}", VERSION);
    info!("Tick Rate: {} Hz", TICK_RATE);

    let mut args = std::env::args().skip(1);
    let level = match args.next() {
        Some(path) => LevelDescription::from_path(&path)
            .with_context(|| format!("loading level {}", path))?,
        None => {
            info!("No level given, using the built-in demo level");
            LevelDescription::demo()
        }
    };
    let ticks = match args.next() {
        Some(raw) => raw
            .parse::<u32>()
            .with_context(|| format!("invalid tick count {:?}", raw))?,
        None => DEFAULT_TICKS,
    };

    run_session(&level, ticks)
}

/// Key events the scripted player sends before tick `t`.
fn scripted_keys(t: u32) -> Vec<(&'static str, Press)> {
    let mut keys = Vec::new();
    match t {
        30 => keys.push(("ArrowRight", Press::Pressed)),
        900 => {
            keys.push(("ArrowLeft", Press::Pressed));
            keys.push(("ArrowRight", Press::Released));
        }
        1200 => keys.push(("ArrowLeft", Press::Released)),
        _ => {}
    }
    if t % 140 == 70 {
        keys.push((" ", Press::Pressed));
    }
    if t % 300 == 150 {
        keys.push(("z", Press::Pressed));
    }
    // Noise the input boundary must ignore
    if t % 500 == 0 {
        keys.push(("Escape", Press::Pressed));
    }
    keys
}

/// Run a scripted session, then verify it by replay.
fn run_session(level: &LevelDescription, ticks: u32) -> Result<()> {
    info!("=== Starting Session ===");

    let mut sim = Simulation::new(level).context("building simulation")?;
    let mut recording = InputRecording::new();
    let mut total_events = 0usize;
    let mut last_report_tick = 0;

    info!("Running {} ticks...", ticks);

    for t in 0..ticks {
        for (key, press) in scripted_keys(t) {
            if !sim.apply_key(key, press) {
                debug!(key, "key ignored");
            }
        }

        let result = sim.step();
        recording.record(result.tick, result.input);
        total_events += result.events.len();

        // Report every 5 seconds
        if result.tick - last_report_tick >= 5 * TICK_RATE {
            let snap = sim.snapshot();
            info!(
                "Tick {}: player ({:.1}, {:.1}) {:?}, background offset {:.1}, {} events so far",
                result.tick,
                snap.player.x,
                snap.player.y,
                sim.player.locomotion,
                snap.background_offset,
                total_events
            );
            last_report_tick = result.tick;
        }

        // Log important events
        for event in &result.events {
            match event.kind {
                GameEventKind::ScrollStarted => info!("Tick {}: world started scrolling", event.tick),
                GameEventKind::ScrollExhausted => info!("Tick {}: scroll range exhausted", event.tick),
                GameEventKind::BackgroundWrapped => info!("Tick {}: background wrapped", event.tick),
                _ => debug!(tick = event.tick, kind = ?event.kind, "event"),
            }
        }
    }

    // Print final results
    info!("=== Session Results ===");
    let hash = sim.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("Total events: {}", total_events);

    let bytes = recording.to_bytes().context("encoding recording")?;
    info!(
        "Recording: {} ticks, {} deltas, {} bytes, digest {}",
        recording.tick_count(),
        recording.delta_count(),
        bytes.len(),
        hex::encode(recording.digest().context("hashing recording")?)
    );

    // Verify determinism by replaying the decoded recording
    info!("=== Verifying Determinism ===");
    let decoded = InputRecording::from_bytes(&bytes).context("decoding recording")?;
    let (replayed, _) = replay(level, &decoded).context("replaying recording")?;
    let replay_hash = replayed.compute_hash();

    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        warn!("DETERMINISM FAILURE: Hashes differ!");
        bail!("replay diverged from the live session");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

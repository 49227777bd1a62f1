//! Ledgewalk headless runner
//!
//! Plays a level with scripted input, records the run, replays it and
//! checks that both runs end on the same state hash.
//!
//! Usage: `ledgewalk-sim [level.json]`. Without an argument the bundled
//! demo level is used. `RUST_LOG` controls verbosity (default `info`).

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledgewalk::{
    game::events::GameEventData, replay, GameAction, LevelDescriptor, SimConfig, Simulation,
    STEP_RATE, VERSION,
};

const DEMO_LEVEL: &str = include_str!("../levels/level1.json");

/// Frames to run before giving up on reaching the end zone.
const MAX_FRAMES: u32 = 60 * 60;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Ledgewalk v{}", VERSION);
    info!("Step Rate: {} Hz", STEP_RATE);

    let level = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
            LevelDescriptor::from_json(&json).with_context(|| format!("parsing {path}"))?
        }
        None => LevelDescriptor::from_json(DEMO_LEVEL).context("parsing bundled level")?,
    };

    demo_run(&level)
}

/// Host frame delta for frame `n`: 60 Hz with deterministic jitter and
/// an occasional long stall.
fn frame_dt(n: u32) -> f64 {
    if n % 500 == 499 {
        return 0.25;
    }
    let jitter = f64::from(n % 7) - 3.0;
    1.0 / 60.0 + jitter * 0.001
}

/// Scripted input: hold right, hop regularly, swing often.
fn script(sim: &mut Simulation, n: u32) {
    if n == 30 {
        sim.start_action(GameAction::MoveRight);
    }
    match n % 90 {
        0 => sim.start_action(GameAction::Jump),
        12 => sim.stop_action(GameAction::Jump),
        _ => {}
    }
    if n % 25 == 0 {
        sim.start_action(GameAction::Attack);
    }
}

fn demo_run(level: &LevelDescriptor) -> Result<()> {
    info!("=== Starting Demo Run ===");

    let config = SimConfig::default();
    let mut sim = Simulation::new(level, config.clone())?;
    sim.enable_recording();

    info!(
        "Level '{}': {} platforms, {} enemies",
        sim.current_level_id(),
        sim.world().platforms.len(),
        sim.world().enemy_count()
    );

    let mut total_events = sim.take_events().len();
    let mut frames = 0;

    for n in 0..MAX_FRAMES {
        script(&mut sim, n);
        let result = sim.tick(frame_dt(n));
        total_events += result.events.len();
        frames = n + 1;

        if result.dropped_time > 0.0 {
            warn!("Frame {}: dropped {:.3}s of simulation time", n, result.dropped_time);
        }

        // Log important events
        for event in &result.events {
            match &event.data {
                GameEventData::PlayerDamaged { amount, health, .. } => {
                    info!("Step {}: player took {} damage ({} left)", event.step, amount, health);
                }
                GameEventData::PlayerRespawned { cause } => {
                    info!("Step {}: player respawned ({:?})", event.step, cause);
                }
                GameEventData::EnemyKilled { enemy_id } => {
                    info!("Step {}: {} killed", event.step, enemy_id);
                }
                GameEventData::LevelCompleted { next_level_id, .. } => {
                    info!("Step {}: level complete, next: {:?}", event.step, next_level_id);
                }
                _ => {}
            }
        }

        if result.level_completed {
            break;
        }
    }

    let snapshot = sim.snapshot();
    info!("=== Run Results ===");
    info!("Frames: {}, substeps: {}", frames, snapshot.step);
    info!(
        "Player at ({:.1}, {:.1}), health {}/{}",
        snapshot.player.position.x,
        snapshot.player.position.y,
        snapshot.player.health,
        snapshot.player.max_health
    );
    info!("Enemies remaining: {}", snapshot.enemies.len());
    info!("Total events: {}", total_events);

    let save = sim.save_data();
    info!("Save record:\n{}", save.to_json()?);

    let hash = sim.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let log = sim
        .take_recording()
        .context("recording was enabled but no log was produced")?;
    info!(
        "Recorded {} ticks ({} input changes, log hash {})",
        log.len(),
        log.delta_count(),
        hex::encode(&log.compute_hash()[..8])
    );

    let bytes = log.to_bytes()?;
    let log = ledgewalk::InputLog::from_bytes(&bytes)?;
    let (replayed, _) = replay(level, &log, config)?;
    let replay_hash = replayed.compute_hash();

    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("determinism failure: replay hash differs");
    }
    info!("DETERMINISM VERIFIED: Hashes match!");
    Ok(())
}

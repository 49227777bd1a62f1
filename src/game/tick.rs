//! Simulation Loop
//!
//! Fixed-timestep driver around one ordered physics substep. Repeated
//! runs from the same level and the same recorded `(dt, input)` stream
//! produce the same state hash.
//!
//! ```text
//! external tick(dt) ─▶ accumulator += dt
//!                        │
//!        while acc ≥ fixed_dt and substeps < cap:
//!                        ▼
//!   ┌──────────────────────────── step() ────────────────────────────┐
//!   │ snapshot → gravity → player input → enemy behavior → integrate │
//!   │ → enemy/platform (vertical, ground scan, horizontal, retry)   │
//!   │ → player/platform + grounding → player/enemy contact          │
//!   │ → fall death → attack hits → end zone → camera                │
//!   └────────────────────────────────────────────────────────────────┘
//!                        │
//!   surplus dropped, alpha = acc / fixed_dt, events drained
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[cfg(feature = "debug-tracing")]
use tracing::trace;

use crate::core::constants::{
    FALLBACK_DT, FIXED_DT, FLIGHT_PATTERN_DIRECTIONS, FLIGHT_PATTERN_JITTER, FLIGHT_STEP_DURATION,
    MAX_SUBSTEPS, VIEWPORT_HEIGHT, VIEWPORT_WIDTH,
};
use crate::core::hash::StateHash;
use crate::game::combat::{resolve_attack_hits, resolve_player_enemy_contact};
use crate::game::enemy::JumpRetry;
use crate::game::events::{GameEvent, GameEventData, RespawnCause};
use crate::game::input::{ActionSet, GameAction, InputFrame, InputLog};
use crate::game::resolve::{
    resolve_enemy_horizontal, resolve_enemy_vertical, resolve_player_platforms, scan_enemy_ground,
    PlayerHit,
};
use crate::game::snapshot::WorldSnapshot;
use crate::game::state::World;
use crate::level::save::{SaveData, SaveError};
use crate::level::{LevelDescriptor, LevelError};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config JSON could not be decoded.
    #[error("config decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Runtime configuration for the simulation loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds per substep
    pub fixed_dt: f64,
    /// Substep cap per external tick
    pub max_substeps: u32,
    /// Replaces non-positive or non-finite external deltas
    pub fallback_dt: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Headings in a generated flight pattern
    pub flight_pattern_directions: u32,
    /// Max per-heading jitter (radians)
    pub flight_pattern_jitter: f64,
    /// Seconds per generated flight leg
    pub flight_step_duration: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: FIXED_DT,
            max_substeps: MAX_SUBSTEPS,
            fallback_dt: FALLBACK_DT,
            viewport_width: VIEWPORT_WIDTH,
            viewport_height: VIEWPORT_HEIGHT,
            flight_pattern_directions: FLIGHT_PATTERN_DIRECTIONS,
            flight_pattern_jitter: FLIGHT_PATTERN_JITTER,
            flight_step_duration: FLIGHT_STEP_DURATION,
        }
    }
}

impl SimConfig {
    /// Parse from JSON; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;

        if !positive(self.fixed_dt) {
            return Err(ConfigError::Invalid {
                field: "fixed_dt",
                reason: "must be finite and positive",
            });
        }
        if !positive(self.fallback_dt) {
            return Err(ConfigError::Invalid {
                field: "fallback_dt",
                reason: "must be finite and positive",
            });
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid {
                field: "max_substeps",
                reason: "must be at least 1",
            });
        }
        if !positive(self.viewport_width) || !positive(self.viewport_height) {
            return Err(ConfigError::Invalid {
                field: "viewport",
                reason: "must be finite and positive",
            });
        }
        if self.flight_pattern_directions == 0 {
            return Err(ConfigError::Invalid {
                field: "flight_pattern_directions",
                reason: "must be at least 1",
            });
        }
        if !self.flight_pattern_jitter.is_finite() || self.flight_pattern_jitter < 0.0 {
            return Err(ConfigError::Invalid {
                field: "flight_pattern_jitter",
                reason: "must be finite and non-negative",
            });
        }
        if !positive(self.flight_step_duration) {
            return Err(ConfigError::Invalid {
                field: "flight_step_duration",
                reason: "must be finite and positive",
            });
        }
        Ok(())
    }
}

// =============================================================================
// FIXED TIMESTEP
// =============================================================================

/// Accumulator that turns variable external deltas into fixed substeps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FixedTimestep {
    fixed_dt: f64,
    max_substeps: u32,
    fallback_dt: f64,
    accumulator: f64,
}

impl FixedTimestep {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            fixed_dt: config.fixed_dt,
            max_substeps: config.max_substeps,
            fallback_dt: config.fallback_dt,
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    #[inline]
    pub fn accumulator(&self) -> f64 {
        self.accumulator
    }

    /// Add an external delta. Returns the delta actually accumulated.
    pub fn accumulate(&mut self, dt: f64) -> f64 {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            warn!(dt, fallback = self.fallback_dt, "Invalid tick delta, using fallback");
            self.fallback_dt
        };
        self.accumulator += dt;
        dt
    }

    /// Take one substep's worth of time if available and under the cap.
    pub fn consume(&mut self, substeps_done: u32) -> bool {
        if substeps_done >= self.max_substeps || self.accumulator < self.fixed_dt {
            return false;
        }
        self.accumulator -= self.fixed_dt;
        true
    }

    /// Drop whole substeps left over after the cap. Returns seconds dropped.
    pub fn discard_surplus(&mut self) -> f64 {
        if self.accumulator < self.fixed_dt {
            return 0.0;
        }
        let kept = self.accumulator % self.fixed_dt;
        let dropped = self.accumulator - kept;
        self.accumulator = kept;
        dropped
    }

    /// Fraction of the next substep already accumulated, in [0, 1].
    #[inline]
    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

// =============================================================================
// SUBSTEP
// =============================================================================

/// Run one fixed physics substep.
///
/// Phase order is fixed; later phases read state settled by earlier ones.
pub fn step(world: &mut World, input: InputFrame, dt: f64) {
    world.step += 1;

    // 0. Interpolation start points
    world.snapshot_previous();

    // 1. Gravity
    world.player.apply_gravity(dt);
    for enemy in &mut world.enemies {
        enemy.apply_gravity(dt);
    }

    // 2. Player input, movement, friction, timers
    apply_player_input(world, input, dt);

    // 3. Enemy behavior
    update_enemy_behavior(world, dt);

    // 4. Integrate velocities
    world.player.integrate(dt);
    for enemy in &mut world.enemies {
        enemy.integrate(dt);
    }

    // 5-8. Enemies vs platforms
    resolve_enemy_platforms(world);

    // 9. Player vs platforms, grounding, platform damage
    let hits = resolve_player_platforms(&mut world.player, &world.platforms);
    for hit in hits {
        push_player_hit(world, hit);
    }

    // 10. Player vs enemy body contact (first enemy only)
    if let Some(contact) = resolve_player_enemy_contact(&mut world.player, &world.enemies) {
        if let Some(hit) = contact.hit {
            push_player_hit(world, hit);
        }
    }

    // 11. Fall death
    if world.player_fell_out() {
        world.player.return_to_spawn();
        debug!(step = world.step, "Player fell out of the level");
        world.push_event(GameEvent::player_respawned(world.step, RespawnCause::Fall));
    }

    // 12. Attack vs enemies
    resolve_attacks(world);

    // Level completion
    if !world.completed && world.player_in_end_zone() {
        world.completed = true;
        info!(level = %world.level_id, next = ?world.next_level_id, "Level completed");
        let event = GameEvent::level_completed(world.step, world.level_id.clone(), world.next_level_id.clone());
        world.push_event(event);
    }

    world.camera.follow(&world.player.body);

    #[cfg(feature = "debug-tracing")]
    trace!(
        step = world.step,
        player = %world.player.position(),
        velocity = %world.player.velocity,
        grounded = world.player.is_on_ground,
        enemies = world.enemies.len(),
        "Substep"
    );
}

fn apply_player_input(world: &mut World, input: InputFrame, dt: f64) {
    let player = &mut world.player;

    player.update_timers(dt);
    player.handle_movement(input, dt);

    if player.try_attack(input) {
        let facing_right = player.is_facing_right;
        world.push_event(GameEvent::attack_started(world.step, facing_right));
    }

    world.player.apply_friction(input, dt);
}

fn update_enemy_behavior(world: &mut World, dt: f64) {
    let step = world.step;
    let player = world.player.body;

    for enemy in &mut world.enemies {
        if let Some(mode) = enemy.step_behavior(dt, &player, &world.platforms) {
            debug!(enemy = %enemy.id, ?mode, "Flying mode changed");
            world
                .pending_events
                .push(GameEvent::flying_mode_changed(step, enemy.id, mode));
        }
    }
}

fn resolve_enemy_platforms(world: &mut World) {
    let step = world.step;

    for enemy in &mut world.enemies {
        resolve_enemy_vertical(enemy, &world.platforms);
        scan_enemy_ground(enemy, &world.platforms);

        if resolve_enemy_horizontal(enemy, &world.platforms) {
            world
                .pending_events
                .push(GameEvent::enemy_jump_started(step, enemy.id));
        }

        if let JumpRetry::Failed { new_direction } = enemy.evaluate_jump_retry() {
            debug!(enemy = %enemy.id, new_direction, "Enemy jump failed, turning around");
            world
                .pending_events
                .push(GameEvent::enemy_jump_failed(step, enemy.id, new_direction));
        }
    }
}

fn push_player_hit(world: &mut World, hit: PlayerHit) {
    let step = world.step;
    world.push_event(GameEvent::player_damaged(step, hit.amount, hit.health_after, hit.knockback));

    if hit.respawned {
        debug!(step, "Player died, respawning");
        world.push_event(GameEvent::player_respawned(step, RespawnCause::Combat));
    }
}

fn resolve_attacks(world: &mut World) {
    let step = world.step;
    let hits = resolve_attack_hits(&mut world.player, &mut world.enemies);

    for hit in hits {
        world.push_event(GameEvent::enemy_hit(step, hit.enemy_id, hit.damage, hit.remaining_health));
        if hit.killed {
            debug!(enemy = %hit.enemy_id, "Enemy killed");
            world.push_event(GameEvent::enemy_killed(step, hit.enemy_id));
        }
    }
}

// =============================================================================
// SIMULATION
// =============================================================================

/// Result of one external tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, in emission order
    pub events: Vec<GameEvent>,
    /// Substeps executed
    pub substeps: u32,
    /// Interpolation alpha after the tick
    pub alpha: f64,
    /// Seconds discarded because of the substep cap
    pub dropped_time: f64,
    /// The end zone was reached during this tick
    pub level_completed: bool,
}

/// Errors constructing a simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Level(#[from] LevelError),

    /// Replay log was recorded on a different level.
    #[error("input log is for level '{found}', expected '{expected}'")]
    ReplayLevelMismatch { expected: String, found: String },
}

/// Host-facing simulation: world, timestep, held actions and recording.
///
/// The host calls [`start_action`](Self::start_action) /
/// [`stop_action`](Self::stop_action) as input arrives and
/// [`tick`](Self::tick) once per frame; renderers read
/// [`snapshot`](Self::snapshot).
#[derive(Debug)]
pub struct Simulation {
    world: World,
    timestep: FixedTimestep,
    actions: ActionSet,
    config: SimConfig,
    recording: Option<InputLog>,
    alpha: f64,
}

impl Simulation {
    /// Validate `config`, build the level and queue a `LevelLoaded` event.
    pub fn new(level: &LevelDescriptor, config: SimConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let world = World::from_level(level, &config)?;

        let mut sim = Self {
            world,
            timestep: FixedTimestep::new(&config),
            actions: ActionSet::new(),
            config,
            recording: None,
            alpha: 0.0,
        };
        sim.announce_level();
        Ok(sim)
    }

    /// Replace the world with a new level.
    ///
    /// Held actions and accumulated time are reset. An active recording
    /// restarts for the new level.
    pub fn load_level(&mut self, level: &LevelDescriptor) -> Result<(), LevelError> {
        self.world = World::from_level(level, &self.config)?;
        self.timestep.reset();
        self.actions.clear();
        self.alpha = 0.0;
        if self.recording.is_some() {
            self.recording = Some(InputLog::new(self.world.level_id.clone()));
        }
        self.announce_level();
        Ok(())
    }

    fn announce_level(&mut self) {
        info!(
            level = %self.world.level_id,
            platforms = self.world.platforms.len(),
            enemies = self.world.enemies.len(),
            "Level loaded"
        );
        let event = GameEvent::level_loaded(self.world.step, self.world.level_id.clone());
        self.world.push_event(event);
    }

    // -------------------------------------------------------------------------
    // Input
    // -------------------------------------------------------------------------

    pub fn start_action(&mut self, action: GameAction) {
        self.actions.start(action);
    }

    /// Release a held action. Attack is one-shot and ignores this.
    pub fn stop_action(&mut self, action: GameAction) {
        self.actions.stop(action);
    }

    pub fn clear_actions(&mut self) {
        self.actions.clear();
    }

    pub fn is_action_active(&self, action: GameAction) -> bool {
        self.actions.is_active(action)
    }

    // -------------------------------------------------------------------------
    // Ticking
    // -------------------------------------------------------------------------

    /// Advance by an external wall-clock delta.
    pub fn tick(&mut self, dt: f64) -> TickResult {
        if let Some(log) = self.recording.as_mut() {
            log.record(dt, self.actions.peek());
        }

        self.timestep.accumulate(dt);

        let mut substeps = 0;
        while self.timestep.consume(substeps) {
            let input = self.actions.poll();
            step(&mut self.world, input, self.timestep.fixed_dt());
            substeps += 1;
        }

        let dropped_time = self.timestep.discard_surplus();
        if dropped_time > 0.0 {
            debug!(dropped_time, substeps, "Substep cap reached, dropping time");
        }

        self.alpha = self.timestep.alpha();

        let events = self.world.take_events();

        let level_completed = events
            .iter()
            .any(|e| matches!(e.data, GameEventData::LevelCompleted { .. }));

        TickResult {
            events,
            substeps,
            alpha: self.alpha,
            dropped_time,
            level_completed,
        }
    }

    // -------------------------------------------------------------------------
    // Reading state
    // -------------------------------------------------------------------------

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    #[inline]
    pub fn interpolation_alpha(&self) -> f64 {
        self.alpha
    }

    pub fn current_level_id(&self) -> &str {
        &self.world.level_id
    }

    pub fn is_level_complete(&self) -> bool {
        self.world.completed
    }

    pub fn next_level_id(&self) -> Option<&str> {
        self.world.next_level_id.as_deref()
    }

    /// Read-only view for renderers.
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::capture(&self.world, self.alpha)
    }

    pub fn compute_hash(&self) -> StateHash {
        self.world.compute_hash()
    }

    /// Drain events queued outside a tick (e.g. `LevelLoaded`).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        self.world.take_events()
    }

    // -------------------------------------------------------------------------
    // Save / recording
    // -------------------------------------------------------------------------

    pub fn save_data(&self) -> SaveData {
        self.world.save_data()
    }

    pub fn apply_save(&mut self, save: &SaveData) -> Result<(), SaveError> {
        self.world.apply_save(save)
    }

    /// Start recording `(dt, input)` per external tick.
    pub fn enable_recording(&mut self) {
        if self.recording.is_none() {
            self.recording = Some(InputLog::new(self.world.level_id.clone()));
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Stop recording and return the log.
    pub fn take_recording(&mut self) -> Option<InputLog> {
        self.recording.take()
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Replay a recorded run from the level's initial state.
///
/// Returns the final world and every event in tick order.
pub fn replay(
    level: &LevelDescriptor,
    log: &InputLog,
    config: SimConfig,
) -> Result<(World, Vec<GameEvent>), SimulationError> {
    if log.level_id != level.id {
        return Err(SimulationError::ReplayLevelMismatch {
            expected: level.id.clone(),
            found: log.level_id.clone(),
        });
    }

    let mut sim = Simulation::new(level, config)?;
    let mut all_events = sim.take_events();

    for (dt, frame) in log.replay_iter() {
        sim.actions = ActionSet::from_frame(frame);
        let result = sim.tick(dt);
        all_events.extend(result.events);
    }

    Ok((sim.world, all_events))
}

// =============================================================================
// TESTS
// =============================================================================

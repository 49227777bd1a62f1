//! Enemy Behavior
//!
//! Enemies share one kinematic/health record and carry their behavior as a
//! tagged variant:
//!
//! ```text
//! Ground:  Patrolling ──hit──▶ Knockback ──timer 0──▶ Patrolling
//!            │   ▲
//!   wall ────┘   └──── land (jump-retry: keep going or turn around)
//!
//! Flying:  Patrol ──near + clear line──▶ Chase ──too far──▶ Patrol
//! ```
//!
//! `step_behavior` only decides velocity. Integration, collision and
//! jump-retry evaluation are separate phases run by the tick loop.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::constants::{
    ENEMY_KNOCKBACK_DURATION, ENEMY_KNOCKBACK_FRICTION,
    FLYING_CHASE_DISTANCE, FLYING_CHASE_SPEED, FLYING_PATROL_SPEED, GRAVITY,
    JUMP_HEIGHT_THRESHOLD, LINE_OF_SIGHT_START, LINE_OF_SIGHT_STEP,
};
use crate::core::hash::StateHasher;
use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::player::approach_zero;
use crate::game::state::Platform;

// =============================================================================
// ENEMY ID
// =============================================================================

/// Stable enemy identifier, assigned sequentially at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EnemyId(pub u32);

impl std::fmt::Display for EnemyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "enemy#{}", self.0)
    }
}

// =============================================================================
// KIND-SPECIFIC STATE
// =============================================================================

/// Flying enemy mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum FlyingMode {
    Patrol = 0,
    Chase = 1,
}

/// One leg of a flying patrol: constant direction for `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightStep {
    pub direction: Vec2,
    pub duration: f64,
}

impl FlightStep {
    pub fn new(direction: Vec2, duration: f64) -> Self {
        Self {
            direction,
            duration,
        }
    }
}

/// Ground patrol state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundState {
    /// Patrol direction (+1 right, -1 left)
    pub direction: i32,
    /// Patrol speed (px/s)
    pub speed: f64,
    /// Half-width of the patrol band around `start_x`
    pub patrol_range: f64,
    /// Patrol anchor
    pub start_x: f64,
    /// Airborne from an auto-jump whose outcome is still pending
    pub is_jumping: bool,
    pub jump_start_y: f64,
    pub jump_start_direction: i32,
}

impl GroundState {
    pub fn new(start_x: f64, direction: i32, speed: f64, patrol_range: f64) -> Self {
        Self {
            direction: if direction < 0 { -1 } else { 1 },
            speed,
            patrol_range,
            start_x,
            is_jumping: false,
            jump_start_y: 0.0,
            jump_start_direction: 0,
        }
    }
}

/// Flying patrol/chase state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlyingState {
    pub mode: FlyingMode,
    /// Cyclic patrol pattern
    pub pattern: Vec<FlightStep>,
    pub step_index: usize,
    pub step_timer: f64,
}

impl FlyingState {
    pub fn new(pattern: Vec<FlightStep>) -> Self {
        Self {
            mode: FlyingMode::Patrol,
            pattern,
            step_index: 0,
            step_timer: 0.0,
        }
    }

    /// Set patrol velocity for the current leg and advance the leg timer.
    fn patrol(&mut self, velocity: &mut Vec2, dt: f64) {
        let Some(step) = self.pattern.get(self.step_index).copied() else {
            *velocity = Vec2::ZERO;
            return;
        };

        *velocity = step.direction.scale(FLYING_PATROL_SPEED);

        self.step_timer += dt;
        if self.step_timer >= step.duration {
            self.step_timer = 0.0;
            self.step_index = (self.step_index + 1) % self.pattern.len();
        }
    }
}

/// Behavior variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EnemyKind {
    Ground(GroundState),
    Flying(FlyingState),
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of evaluating a pending auto-jump after landing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpRetry {
    /// No jump pending, or still airborne
    Pending,
    /// Landed higher or lower than the take-off point
    Succeeded,
    /// Landed at take-off height; patrol reversed
    Failed { new_direction: i32 },
}

// =============================================================================
// ENEMY
// =============================================================================

/// An enemy: shared body/health record plus behavior variant.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Enemy {
    pub id: EnemyId,
    pub body: Aabb,
    pub velocity: Vec2,
    pub health: i32,
    pub max_health: i32,
    /// Contact damage dealt to the player
    pub damage: i32,
    /// Seconds of patrol suppression left after a hit
    pub knockback_timer: f64,
    pub is_on_ground: bool,
    /// Top-left at the start of the current substep
    pub prev_position: Vec2,
    pub kind: EnemyKind,
}

impl Enemy {
    /// Spawn a ground patrol enemy.
    pub fn ground(id: EnemyId, body: Aabb, damage: i32, health: i32, state: GroundState) -> Self {
        Self::spawn(id, body, damage, health, EnemyKind::Ground(state))
    }

    /// Spawn a flying enemy following `pattern`.
    pub fn flying(
        id: EnemyId,
        body: Aabb,
        damage: i32,
        health: i32,
        pattern: Vec<FlightStep>,
    ) -> Self {
        Self::spawn(id, body, damage, health, EnemyKind::Flying(FlyingState::new(pattern)))
    }

    fn spawn(id: EnemyId, body: Aabb, damage: i32, health: i32, kind: EnemyKind) -> Self {
        let health = health.max(0);
        Self {
            id,
            body,
            velocity: Vec2::ZERO,
            health,
            max_health: health,
            damage,
            knockback_timer: 0.0,
            is_on_ground: false,
            prev_position: body.position(),
            kind,
        }
    }

    #[inline]
    pub fn is_flying(&self) -> bool {
        matches!(self.kind, EnemyKind::Flying(_))
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    #[inline]
    pub fn is_knocked_back(&self) -> bool {
        self.knockback_timer > 0.0
    }

    /// Patrol direction for ground enemies, sign of velocity for flyers.
    pub fn direction(&self) -> i32 {
        match &self.kind {
            EnemyKind::Ground(g) => g.direction,
            EnemyKind::Flying(_) => {
                if self.velocity.x < 0.0 {
                    -1
                } else {
                    1
                }
            }
        }
    }

    /// Flying mode, if this is a flyer.
    pub fn mode(&self) -> Option<FlyingMode> {
        match &self.kind {
            EnemyKind::Flying(f) => Some(f.mode),
            EnemyKind::Ground(_) => None,
        }
    }

    #[inline]
    pub fn snapshot_previous(&mut self) {
        self.prev_position = self.body.position();
    }

    #[inline]
    pub fn interpolated_position(&self, alpha: f64) -> Vec2 {
        self.prev_position.lerp(self.body.position(), alpha)
    }

    /// Gravity for grounded-kind enemies in the air. Flyers ignore it.
    pub fn apply_gravity(&mut self, dt: f64) {
        if !self.is_flying() && !self.is_on_ground {
            self.velocity.y += GRAVITY * dt;
        }
    }

    #[inline]
    pub fn integrate(&mut self, dt: f64) {
        self.body.translate(self.velocity.scale(dt));
    }

    /// Apply damage with knockback. Returns remaining health.
    ///
    /// No invincibility window: repeat hits within one swing are filtered
    /// by the attacker's hit-set.
    pub fn take_damage(&mut self, amount: i32, knockback_x: f64, knockback_y: f64) -> i32 {
        if amount <= 0 {
            return self.health;
        }
        self.health = (self.health - amount).max(0);
        self.velocity.x += knockback_x;
        self.velocity.y += knockback_y;
        self.knockback_timer = ENEMY_KNOCKBACK_DURATION;
        self.health
    }

    // -------------------------------------------------------------------------
    // Behavior
    // -------------------------------------------------------------------------

    /// Decide this substep's velocity.
    ///
    /// Returns the new flying mode when a flyer switched modes.
    pub fn step_behavior(
        &mut self,
        dt: f64,
        player: &Aabb,
        platforms: &[Platform],
    ) -> Option<FlyingMode> {
        if self.knockback_timer > 0.0 {
            self.knockback_timer = (self.knockback_timer - dt).max(0.0);
            if self.is_on_ground && !self.is_flying() {
                self.velocity.x = approach_zero(self.velocity.x, ENEMY_KNOCKBACK_FRICTION * dt);
            }
            return None;
        }

        let center = self.body.center();
        match &mut self.kind {
            EnemyKind::Ground(ground) => {
                let x = self.body.x;
                if x > ground.start_x + ground.patrol_range {
                    ground.direction = -1;
                } else if x < ground.start_x - ground.patrol_range {
                    ground.direction = 1;
                }
                self.velocity.x = f64::from(ground.direction) * ground.speed;
                None
            }
            EnemyKind::Flying(flying) => {
                let target = player.center();
                match flying.mode {
                    FlyingMode::Patrol => {
                        flying.patrol(&mut self.velocity, dt);

                        let in_range = center.distance(target) <= FLYING_CHASE_DISTANCE;
                        if in_range && !has_platform_between(center, target, platforms) {
                            flying.mode = FlyingMode::Chase;
                            return Some(FlyingMode::Chase);
                        }
                        None
                    }
                    FlyingMode::Chase => {
                        let to_player = target - center;
                        if to_player.length() > FLYING_CHASE_DISTANCE {
                            flying.mode = FlyingMode::Patrol;
                            return Some(FlyingMode::Patrol);
                        }
                        // Overlapping centers: keep the previous velocity
                        if let Some(dir) = to_player.try_normalize() {
                            self.velocity = dir.scale(FLYING_CHASE_SPEED);
                        }
                        None
                    }
                }
            }
        }
    }

    /// Arm an auto-jump after a wall bump. Ground enemies only.
    ///
    /// Returns true if a jump started.
    pub fn try_auto_jump(&mut self, jump_velocity: f64, velocity_epsilon: f64) -> bool {
        let EnemyKind::Ground(ground) = &mut self.kind else {
            return false;
        };
        if ground.is_jumping || self.velocity.y.abs() >= velocity_epsilon {
            return false;
        }

        self.velocity.y = jump_velocity;
        self.is_on_ground = false;
        ground.is_jumping = true;
        ground.jump_start_y = self.body.y;
        ground.jump_start_direction = ground.direction;
        true
    }

    /// Judge a pending auto-jump once the enemy is back on the ground.
    pub fn evaluate_jump_retry(&mut self) -> JumpRetry {
        let EnemyKind::Ground(ground) = &mut self.kind else {
            return JumpRetry::Pending;
        };
        if !ground.is_jumping || !self.is_on_ground {
            return JumpRetry::Pending;
        }

        ground.is_jumping = false;

        if (self.body.y - ground.jump_start_y).abs() < JUMP_HEIGHT_THRESHOLD {
            let start = if ground.jump_start_direction < 0 { -1 } else { 1 };
            ground.direction = -start;
            self.velocity.x = f64::from(ground.direction) * ground.speed;
            JumpRetry::Failed {
                new_direction: ground.direction,
            }
        } else {
            JumpRetry::Succeeded
        }
    }

    /// Hash this enemy's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.0);
        hasher.update_aabb(&self.body);
        hasher.update_vec2(self.velocity);
        hasher.update_i32(self.health);
        hasher.update_f64(self.knockback_timer);
        hasher.update_bool(self.is_on_ground);

        match &self.kind {
            EnemyKind::Ground(g) => {
                hasher.update_u8(0);
                hasher.update_i32(g.direction);
                hasher.update_bool(g.is_jumping);
                hasher.update_f64(g.jump_start_y);
                hasher.update_i32(g.jump_start_direction);
            }
            EnemyKind::Flying(f) => {
                hasher.update_u8(1);
                hasher.update_u8(f.mode as u8);
                hasher.update_u64(f.step_index as u64);
                hasher.update_f64(f.step_timer);
            }
        }
    }
}

// =============================================================================
// LINE OF SIGHT
// =============================================================================

/// Does any platform block the segment `from → to`?
///
/// Samples points every [`LINE_OF_SIGHT_STEP`] px starting just past
/// `from`; a sample inside (or on the edge of) a platform blocks the line.
/// A zero-length segment is never blocked.
pub fn has_platform_between(from: Vec2, to: Vec2, platforms: &[Platform]) -> bool {
    let delta = to - from;
    let Some(dir) = delta.try_normalize() else {
        return false;
    };
    let distance = delta.length();

    let mut t = LINE_OF_SIGHT_START;
    while t < distance {
        let point = from + dir.scale(t);
        if platforms.iter().any(|p| p.body.contains_point(point)) {
            return true;
        }
        t += LINE_OF_SIGHT_STEP;
    }
    false
}

// =============================================================================
// FLIGHT PATTERN
// =============================================================================

/// Build a closed patrol pattern of `directions` evenly spaced headings.
///
/// Heading `i` is `2πi/n` plus a jitter in `[-jitter, jitter]` drawn from a
/// generator seeded with `seed`. Unit vectors with equal durations sum to
/// roughly zero, so the flyer loops back near its spawn.
pub fn generate_flight_pattern(
    directions: u32,
    seed: u64,
    jitter: f64,
    step_duration: f64,
) -> Vec<FlightStep> {
    let mut rng = DeterministicRng::new(seed);
    let n = directions.max(1);
    let jitter = jitter.abs();

    (0..n)
        .map(|i| {
            let base = TAU * f64::from(i) / f64::from(n);
            let offset = if jitter > 0.0 {
                rng.next_range(-jitter, jitter)
            } else {
                0.0
            };
            FlightStep::new(Vec2::from_angle(base + offset), step_duration)
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::{ENEMY_JUMP_VELOCITY, FIXED_DT, VELOCITY_EPSILON};

    fn ground_enemy(x: f64, speed: f64, range: f64) -> Enemy {
        let body = Aabb::new(x, 700.0, 100.0, 100.0);
        Enemy::ground(EnemyId(0), body, 1, 3, GroundState::new(x, 1, speed, range))
    }

    fn flyer_at(x: f64, y: f64) -> Enemy {
        let pattern = generate_flight_pattern(8, 42, 0.2, 1.5);
        Enemy::flying(EnemyId(1), Aabb::new(x, y, 100.0, 100.0), 1, 3, pattern)
    }

    fn far_player() -> Aabb {
        Aabb::new(10_000.0, 10_000.0, 120.0, 210.0)
    }

    #[test]
    fn test_patrol_reverses_past_range() {
        let mut enemy = ground_enemy(200.0, 200.0, 800.0);
        let player = far_player();

        enemy.step_behavior(FIXED_DT, &player, &[]);
        assert_eq!(enemy.velocity.x, 200.0);

        enemy.body.x = 1000.5;
        enemy.step_behavior(FIXED_DT, &player, &[]);
        assert_eq!(enemy.direction(), -1);
        assert_eq!(enemy.velocity.x, -200.0);

        enemy.body.x = -600.5;
        enemy.step_behavior(FIXED_DT, &player, &[]);
        assert_eq!(enemy.direction(), 1);
    }

    #[test]
    fn test_knockback_suppresses_patrol() {
        let mut enemy = ground_enemy(200.0, 100.0, 800.0);
        enemy.is_on_ground = true;
        enemy.take_damage(1, 400.0, -250.0);
        assert!(enemy.is_knocked_back());

        enemy.step_behavior(FIXED_DT, &far_player(), &[]);
        // Friction applied, patrol velocity not restored
        assert_eq!(enemy.velocity.x, 400.0 - ENEMY_KNOCKBACK_FRICTION * FIXED_DT);

        for _ in 0..40 {
            enemy.step_behavior(FIXED_DT, &far_player(), &[]);
        }
        assert!(!enemy.is_knocked_back());
        assert_eq!(enemy.velocity.x, 100.0);
    }

    #[test]
    fn test_airborne_knockback_keeps_velocity() {
        let mut enemy = ground_enemy(200.0, 100.0, 800.0);
        enemy.take_damage(1, 400.0, -250.0);
        enemy.step_behavior(FIXED_DT, &far_player(), &[]);
        assert_eq!(enemy.velocity.x, 400.0);
        assert_eq!(enemy.direction(), 1);
    }

    #[test]
    fn test_take_damage_clamps_health() {
        let mut enemy = ground_enemy(0.0, 100.0, 800.0);
        assert_eq!(enemy.take_damage(0, 10.0, 10.0), 3);
        assert_eq!(enemy.velocity, Vec2::ZERO);
        assert_eq!(enemy.take_damage(10, 0.0, 0.0), 0);
        assert!(!enemy.is_alive());
    }

    #[test]
    fn test_auto_jump_once() {
        let mut enemy = ground_enemy(0.0, 100.0, 800.0);
        enemy.is_on_ground = true;

        assert!(enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON));
        assert_eq!(enemy.velocity.y, ENEMY_JUMP_VELOCITY);
        assert!(!enemy.is_on_ground);

        // Already jumping
        assert!(!enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON));
    }

    #[test]
    fn test_auto_jump_needs_vertical_rest() {
        let mut enemy = ground_enemy(0.0, 100.0, 800.0);
        enemy.velocity.y = 50.0;
        assert!(!enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON));
    }

    #[test]
    fn test_flyer_never_auto_jumps() {
        let mut flyer = flyer_at(0.0, 0.0);
        assert!(!flyer.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON));
    }

    #[test]
    fn test_failed_jump_reverses_once() {
        let mut enemy = ground_enemy(0.0, 100.0, 800.0);
        enemy.is_on_ground = true;
        enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON);

        // Still airborne
        assert_eq!(enemy.evaluate_jump_retry(), JumpRetry::Pending);

        // Lands 5px from take-off
        enemy.body.y += 5.0;
        enemy.is_on_ground = true;
        assert_eq!(
            enemy.evaluate_jump_retry(),
            JumpRetry::Failed { new_direction: -1 }
        );
        assert_eq!(enemy.velocity.x, -100.0);

        // Evaluated exactly once
        assert_eq!(enemy.evaluate_jump_retry(), JumpRetry::Pending);
    }

    #[test]
    fn test_successful_jump_keeps_direction() {
        let mut enemy = ground_enemy(0.0, 100.0, 800.0);
        enemy.is_on_ground = true;
        enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON);

        enemy.body.y -= 120.0;
        enemy.is_on_ground = true;
        assert_eq!(enemy.evaluate_jump_retry(), JumpRetry::Succeeded);
        assert_eq!(enemy.direction(), 1);
    }

    #[test]
    fn test_flyer_chases_with_clear_line() {
        let mut flyer = flyer_at(0.0, 0.0);
        let player = Aabb::new(300.0, 0.0, 100.0, 100.0);

        let changed = flyer.step_behavior(FIXED_DT, &player, &[]);
        assert_eq!(changed, Some(FlyingMode::Chase));

        flyer.step_behavior(FIXED_DT, &player, &[]);
        assert!((flyer.velocity.x - FLYING_CHASE_SPEED).abs() < 1e-9);
        assert!(flyer.velocity.y.abs() < 1e-9);
    }

    #[test]
    fn test_flyer_blocked_by_platform() {
        let mut flyer = flyer_at(0.0, 0.0);
        let player = Aabb::new(300.0, 0.0, 100.0, 100.0);
        let wall = Platform::new(Aabb::new(160.0, -100.0, 100.0, 400.0));

        let changed = flyer.step_behavior(FIXED_DT, &player, &[wall]);
        assert_eq!(changed, None);
        assert_eq!(flyer.mode(), Some(FlyingMode::Patrol));
    }

    #[test]
    fn test_flyer_reverts_when_far() {
        let mut flyer = flyer_at(0.0, 0.0);
        let near = Aabb::new(300.0, 0.0, 100.0, 100.0);
        flyer.step_behavior(FIXED_DT, &near, &[]);

        let changed = flyer.step_behavior(FIXED_DT, &far_player(), &[]);
        assert_eq!(changed, Some(FlyingMode::Patrol));
    }

    #[test]
    fn test_flyer_ignores_gravity() {
        let mut flyer = flyer_at(0.0, 0.0);
        flyer.apply_gravity(FIXED_DT);
        assert_eq!(flyer.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_patrol_pattern_advances_and_wraps() {
        let pattern = vec![
            FlightStep::new(Vec2::RIGHT, 0.1),
            FlightStep::new(Vec2::LEFT, 0.1),
        ];
        let mut flyer = Enemy::flying(EnemyId(2), Aabb::new(0.0, 0.0, 50.0, 50.0), 1, 1, pattern);
        let player = far_player();

        flyer.step_behavior(0.1, &player, &[]);
        assert_eq!(flyer.velocity.x, FLYING_PATROL_SPEED);
        flyer.step_behavior(0.1, &player, &[]);
        assert_eq!(flyer.velocity.x, -FLYING_PATROL_SPEED);
        flyer.step_behavior(0.1, &player, &[]);
        assert_eq!(flyer.velocity.x, FLYING_PATROL_SPEED);
    }

    #[test]
    fn test_line_of_sight_degenerate() {
        let p = Vec2::new(10.0, 10.0);
        let blocker = Platform::new(Aabb::new(0.0, 0.0, 100.0, 100.0));
        assert!(!has_platform_between(p, p, &[blocker]));
    }

    #[test]
    fn test_flight_pattern_reproducible() {
        let a = generate_flight_pattern(8, 7, 0.2, 1.5);
        let b = generate_flight_pattern(8, 7, 0.2, 1.5);
        let c = generate_flight_pattern(8, 8, 0.2, 1.5);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn test_flight_pattern_evenly_spaced() {
        let pattern = generate_flight_pattern(4, 0, 0.0, 1.0);
        assert!((pattern[0].direction.x - 1.0).abs() < 1e-12);
        assert!((pattern[1].direction.y - 1.0).abs() < 1e-12);
        assert!((pattern[2].direction.x + 1.0).abs() < 1e-12);
        assert!((pattern[3].direction.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_flight_pattern_jitter_bounded() {
        let n = 8;
        let jitter = 0.2;
        let pattern = generate_flight_pattern(n, 99, jitter, 1.5);
        for (i, step) in pattern.iter().enumerate() {
            let base = Vec2::from_angle(TAU * i as f64 / n as f64);
            let cos = (base.x * step.direction.x + base.y * step.direction.y).clamp(-1.0, 1.0);
            assert!(cos.acos() <= jitter + 1e-9);
            assert!((step.direction.length() - 1.0).abs() < 1e-12);
        }
    }
}

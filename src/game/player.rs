//! Player Controller
//!
//! Horizontal drive with friction, gravity and jumping, health with an
//! invincibility window, the attack lifecycle and respawning.
//!
//! Every method here mutates only the player; the tick phases decide
//! when each one runs and turn the returned outcomes into events.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::constants::{
    ATTACK_COOLDOWN, ATTACK_DURATION, GRAVITY, GROUND_FRICTION, INVINCIBILITY_DURATION,
    JUMP_VELOCITY, MAX_MOVE_SPEED, MOVE_ACCELERATION, PLAYER_HEIGHT, PLAYER_MAX_HEALTH,
    PLAYER_WIDTH,
};
use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::enemy::EnemyId;
use crate::game::input::{GameAction, InputFrame};

// =============================================================================
// ATTACK STATE
// =============================================================================

/// Lifecycle of one melee swing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackState {
    /// Swing in progress
    pub is_attacking: bool,
    /// Seconds since the swing started
    pub elapsed: f64,
    /// Seconds until another swing may start
    pub cooldown_remaining: f64,
    /// Enemies already damaged by the current swing
    pub hit_enemies: BTreeSet<EnemyId>,
}

impl AttackState {
    /// Swing progress in [0, 1]. Zero when idle.
    #[inline]
    pub fn progress(&self) -> f64 {
        if !self.is_attacking {
            return 0.0;
        }
        (self.elapsed / ATTACK_DURATION).clamp(0.0, 1.0)
    }

    /// Can a new swing start right now?
    #[inline]
    pub fn is_ready(&self) -> bool {
        !self.is_attacking && self.cooldown_remaining <= 0.0
    }

    /// Start a swing if ready. Clears the hit-set.
    pub fn try_start(&mut self) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.is_attacking = true;
        self.elapsed = 0.0;
        self.hit_enemies.clear();
        true
    }

    /// Advance timers by `dt`. Finishing a swing starts the cooldown.
    pub fn advance(&mut self, dt: f64) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - dt).max(0.0);
        }

        if self.is_attacking {
            self.elapsed += dt;
            if self.elapsed >= ATTACK_DURATION {
                self.is_attacking = false;
                self.elapsed = ATTACK_DURATION;
                self.cooldown_remaining = ATTACK_COOLDOWN;
            }
        }
    }

    /// Has `enemy` already been hit by this swing?
    #[inline]
    pub fn has_hit(&self, enemy: EnemyId) -> bool {
        self.hit_enemies.contains(&enemy)
    }

    /// Record a hit. Returns false if the enemy was already in the set.
    #[inline]
    pub fn record_hit(&mut self, enemy: EnemyId) -> bool {
        self.hit_enemies.insert(enemy)
    }
}

// =============================================================================
// DAMAGE OUTCOME
// =============================================================================

/// What a call to [`Player::take_damage`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Non-positive amount or invincible: nothing changed
    Ignored,
    /// Health reduced, knockback applied, invincibility started
    Damaged { health: i32 },
    /// Health reached zero and the player was sent back to spawn
    Respawned,
}

// =============================================================================
// PLAYER
// =============================================================================

/// The player character.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Player {
    /// Collision box
    pub body: Aabb,

    /// Velocity (px/s)
    pub velocity: Vec2,

    /// Standing on a platform this step
    pub is_on_ground: bool,

    /// Facing direction for attacks and rendering
    pub is_facing_right: bool,

    /// Current health (0..=max_health)
    pub health: i32,

    /// Maximum health
    pub max_health: i32,

    /// Seconds of damage immunity left
    pub invincibility_remaining: f64,

    /// Attack lifecycle
    pub attack: AttackState,

    /// Top-left at the start of the current substep (for interpolation)
    pub prev_position: Vec2,

    /// Respawn point (top-left)
    pub spawn: Vec2,
}

impl Player {
    /// Create a player at `spawn` with default size and health.
    pub fn new(spawn: Vec2) -> Self {
        Self::with_size(spawn, PLAYER_WIDTH, PLAYER_HEIGHT, PLAYER_MAX_HEALTH)
    }

    /// Create a player with explicit size and health.
    pub fn with_size(spawn: Vec2, width: f64, height: f64, max_health: i32) -> Self {
        let max_health = max_health.max(0);
        Self {
            body: Aabb::new(spawn.x, spawn.y, width, height),
            velocity: Vec2::ZERO,
            is_on_ground: false,
            is_facing_right: true,
            health: max_health,
            max_health,
            invincibility_remaining: 0.0,
            attack: AttackState::default(),
            prev_position: spawn,
            spawn,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.body.position()
    }

    #[inline]
    pub fn is_invincible(&self) -> bool {
        self.invincibility_remaining > 0.0
    }

    /// +1 when facing right, -1 when facing left.
    #[inline]
    pub fn facing_sign(&self) -> f64 {
        if self.is_facing_right {
            1.0
        } else {
            -1.0
        }
    }

    /// Record the current position as the interpolation start.
    #[inline]
    pub fn snapshot_previous(&mut self) {
        self.prev_position = self.body.position();
    }

    /// Render position blended between the last two substeps.
    #[inline]
    pub fn interpolated_position(&self, alpha: f64) -> Vec2 {
        self.prev_position.lerp(self.body.position(), alpha)
    }

    // -------------------------------------------------------------------------
    // Movement
    // -------------------------------------------------------------------------

    /// Gravity while airborne.
    pub fn apply_gravity(&mut self, dt: f64) {
        if !self.is_on_ground {
            self.velocity.y += GRAVITY * dt;
        }
    }

    /// Horizontal acceleration, speed clamp and jump.
    pub fn handle_movement(&mut self, input: InputFrame, dt: f64) {
        if input.has(GameAction::MoveLeft) {
            self.velocity.x -= MOVE_ACCELERATION * dt;
            self.is_facing_right = false;
        }
        if input.has(GameAction::MoveRight) {
            self.velocity.x += MOVE_ACCELERATION * dt;
            self.is_facing_right = true;
        }

        self.velocity.x = self.velocity.x.clamp(-MAX_MOVE_SPEED, MAX_MOVE_SPEED);

        if input.jump_held() && self.is_on_ground {
            self.velocity.y = JUMP_VELOCITY;
            self.is_on_ground = false;
        }
    }

    /// Ground friction toward zero when no direction is held.
    pub fn apply_friction(&mut self, input: InputFrame, dt: f64) {
        if !self.is_on_ground || input.is_moving() {
            return;
        }
        self.velocity.x = approach_zero(self.velocity.x, GROUND_FRICTION * dt);
    }

    /// Advance invincibility and attack timers.
    pub fn update_timers(&mut self, dt: f64) {
        if self.invincibility_remaining > 0.0 {
            self.invincibility_remaining = (self.invincibility_remaining - dt).max(0.0);
        }
        self.attack.advance(dt);
    }

    /// Start an attack if the input pressed it and the swing is ready.
    pub fn try_attack(&mut self, input: InputFrame) -> bool {
        input.attack_pressed() && self.attack.try_start()
    }

    /// position += velocity * dt
    #[inline]
    pub fn integrate(&mut self, dt: f64) {
        self.body.translate(self.velocity.scale(dt));
    }

    // -------------------------------------------------------------------------
    // Health
    // -------------------------------------------------------------------------

    /// Apply damage with a knockback impulse.
    pub fn take_damage(&mut self, amount: i32, knockback_x: f64, knockback_y: f64) -> DamageOutcome {
        if amount <= 0 || self.is_invincible() {
            return DamageOutcome::Ignored;
        }

        self.health = (self.health - amount).max(0);
        self.velocity.x += knockback_x;
        self.velocity.y += knockback_y;
        self.invincibility_remaining = INVINCIBILITY_DURATION;

        if self.health == 0 {
            self.respawn();
            return DamageOutcome::Respawned;
        }

        DamageOutcome::Damaged {
            health: self.health,
        }
    }

    /// Combat death: back to spawn with full health and no invincibility.
    pub fn respawn(&mut self) {
        self.return_to_spawn();
        self.health = self.max_health;
        self.invincibility_remaining = 0.0;
    }

    /// Fall death: back to spawn, health untouched.
    pub fn return_to_spawn(&mut self) {
        self.body.set_position(self.spawn);
        self.prev_position = self.spawn;
        self.velocity = Vec2::ZERO;
        self.is_on_ground = false;
    }

    /// Set health, clamped to [0, max].
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.max_health);
    }

    /// Hash this player's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_aabb(&self.body);
        hasher.update_vec2(self.velocity);
        hasher.update_bool(self.is_on_ground);
        hasher.update_bool(self.is_facing_right);
        hasher.update_i32(self.health);
        hasher.update_f64(self.invincibility_remaining);
        hasher.update_bool(self.attack.is_attacking);
        hasher.update_f64(self.attack.elapsed);
        hasher.update_f64(self.attack.cooldown_remaining);
        for id in &self.attack.hit_enemies {
            hasher.update_u32(id.0);
        }
    }
}

/// Move `value` toward zero by `amount` without crossing it.
#[inline]
pub fn approach_zero(value: f64, amount: f64) -> f64 {
    if value > 0.0 {
        (value - amount).max(0.0)
    } else if value < 0.0 {
        (value + amount).min(0.0)
    } else {
        value
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Simulation Events
//!
//! Events are pushed at the point of mutation inside a substep and drained
//! once per external tick. Render and animation layers consume them
//! instead of observing entity fields.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;
use crate::game::enemy::{EnemyId, FlyingMode};

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Level lifecycle first
    Level = 0,
    /// Then enemy AI transitions
    Behavior = 1,
    /// Then damage to the player
    PlayerDamage = 2,
    /// Then player respawns
    Respawn = 3,
    /// Then attack results
    Combat = 4,
}

/// Why the player was sent back to spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RespawnCause {
    /// Health reached zero
    Combat,
    /// Fell below the level
    Fall,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// A level finished loading; dependent visuals should rebuild.
    LevelLoaded {
        level_id: String,
    },

    /// Player entered the end zone.
    LevelCompleted {
        level_id: String,
        next_level_id: Option<String>,
    },

    /// An attack swing started.
    AttackStarted {
        facing_right: bool,
    },

    /// Player took damage.
    PlayerDamaged {
        amount: i32,
        health: i32,
        knockback: Vec2,
    },

    /// Player was returned to spawn.
    PlayerRespawned {
        cause: RespawnCause,
    },

    /// The player's attack hit an enemy.
    EnemyHit {
        enemy_id: EnemyId,
        damage: i32,
        remaining_health: i32,
    },

    /// An enemy was removed from the level.
    EnemyKilled {
        enemy_id: EnemyId,
    },

    /// A flying enemy switched between patrol and chase.
    FlyingModeChanged {
        enemy_id: EnemyId,
        mode: FlyingMode,
    },

    /// A ground enemy auto-jumped at a wall.
    EnemyJumpStarted {
        enemy_id: EnemyId,
    },

    /// A ground enemy landed at its take-off height and turned around.
    EnemyJumpFailed {
        enemy_id: EnemyId,
        new_direction: i32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Substep counter when the event occurred
    pub step: u64,

    /// Processing priority
    pub priority: EventPriority,

    /// Enemy involved (for tie-breaking)
    pub enemy_id: Option<EnemyId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(step: u64, priority: EventPriority, data: GameEventData) -> Self {
        let enemy_id = match &data {
            GameEventData::EnemyHit { enemy_id, .. }
            | GameEventData::EnemyKilled { enemy_id }
            | GameEventData::FlyingModeChanged { enemy_id, .. }
            | GameEventData::EnemyJumpStarted { enemy_id }
            | GameEventData::EnemyJumpFailed { enemy_id, .. } => Some(*enemy_id),
            _ => None,
        };

        Self {
            step,
            priority,
            enemy_id,
            data,
        }
    }

    pub fn level_loaded(step: u64, level_id: impl Into<String>) -> Self {
        Self::new(
            step,
            EventPriority::Level,
            GameEventData::LevelLoaded {
                level_id: level_id.into(),
            },
        )
    }

    pub fn level_completed(step: u64, level_id: impl Into<String>, next_level_id: Option<String>) -> Self {
        Self::new(
            step,
            EventPriority::Level,
            GameEventData::LevelCompleted {
                level_id: level_id.into(),
                next_level_id,
            },
        )
    }

    pub fn attack_started(step: u64, facing_right: bool) -> Self {
        Self::new(step, EventPriority::Combat, GameEventData::AttackStarted { facing_right })
    }

    pub fn player_damaged(step: u64, amount: i32, health: i32, knockback: Vec2) -> Self {
        Self::new(
            step,
            EventPriority::PlayerDamage,
            GameEventData::PlayerDamaged {
                amount,
                health,
                knockback,
            },
        )
    }

    pub fn player_respawned(step: u64, cause: RespawnCause) -> Self {
        Self::new(step, EventPriority::Respawn, GameEventData::PlayerRespawned { cause })
    }

    pub fn enemy_hit(step: u64, enemy_id: EnemyId, damage: i32, remaining_health: i32) -> Self {
        Self::new(
            step,
            EventPriority::Combat,
            GameEventData::EnemyHit {
                enemy_id,
                damage,
                remaining_health,
            },
        )
    }

    pub fn enemy_killed(step: u64, enemy_id: EnemyId) -> Self {
        Self::new(step, EventPriority::Combat, GameEventData::EnemyKilled { enemy_id })
    }

    pub fn flying_mode_changed(step: u64, enemy_id: EnemyId, mode: FlyingMode) -> Self {
        Self::new(
            step,
            EventPriority::Behavior,
            GameEventData::FlyingModeChanged { enemy_id, mode },
        )
    }

    pub fn enemy_jump_started(step: u64, enemy_id: EnemyId) -> Self {
        Self::new(step, EventPriority::Behavior, GameEventData::EnemyJumpStarted { enemy_id })
    }

    pub fn enemy_jump_failed(step: u64, enemy_id: EnemyId, new_direction: i32) -> Self {
        Self::new(
            step,
            EventPriority::Behavior,
            GameEventData::EnemyJumpFailed {
                enemy_id,
                new_direction,
            },
        )
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.step == other.step
            && self.priority == other.priority
            && self.enemy_id == other.enemy_id
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: step, then priority, then enemy id
        self.step
            .cmp(&other.step)
            .then(self.priority.cmp(&other.priority))
            .then(self.enemy_id.cmp(&other.enemy_id))
    }
}

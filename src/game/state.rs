//! World State
//!
//! Everything the simulation mutates lives in one [`World`]: the player,
//! enemies and platforms in spawn order, the camera, level bounds and the
//! event queue drained once per external tick.

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::camera::Camera;
use crate::game::collision::{overlaps, OverlapPolicy};
use crate::game::enemy::{Enemy, EnemyId};
use crate::game::events::GameEvent;
use crate::game::player::Player;
use crate::level::save::{SaveData, SaveError};

// =============================================================================
// PLATFORM
// =============================================================================

/// Static level geometry, optionally harmful to touch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub body: Aabb,
    pub is_damaging: bool,
    /// Damage per contact when `is_damaging` (non-negative)
    pub damage: i32,
}

impl Platform {
    /// Solid, harmless platform.
    pub fn new(body: Aabb) -> Self {
        Self {
            body,
            is_damaging: false,
            damage: 0,
        }
    }

    /// Platform that hurts on contact.
    pub fn damaging(body: Aabb, damage: i32) -> Self {
        Self {
            body,
            is_damaging: true,
            damage: damage.max(0),
        }
    }
}

// =============================================================================
// LEVEL BOUNDS
// =============================================================================

/// Level extents in pixels. Falling past `height` kills the player.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelBounds {
    pub width: f64,
    pub height: f64,
}

// =============================================================================
// WORLD
// =============================================================================

/// Complete simulation state for one loaded level.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct World {
    /// Level identifier
    pub level_id: String,

    /// Substeps executed since load
    pub step: u64,

    pub player: Player,

    /// Live enemies in spawn order
    pub enemies: Vec<Enemy>,

    pub platforms: Vec<Platform>,

    pub camera: Camera,

    pub bounds: LevelBounds,

    /// Touching this box completes the level
    pub end_zone: Option<Aabb>,

    /// Level to load after completion
    pub next_level_id: Option<String>,

    /// End zone already reached
    pub completed: bool,

    /// Events generated since the last drain
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl World {
    /// Create a world with no platforms or enemies.
    pub fn new(level_id: impl Into<String>, player: Player, bounds: LevelBounds, camera: Camera) -> Self {
        let mut world = Self {
            level_id: level_id.into(),
            step: 0,
            player,
            enemies: Vec::new(),
            platforms: Vec::new(),
            camera,
            bounds,
            end_zone: None,
            next_level_id: None,
            completed: false,
            pending_events: Vec::new(),
        };
        world.camera.level_width = bounds.width;
        world.camera.level_height = bounds.height;
        world.camera.follow(&world.player.body);
        world
    }

    /// Look up a live enemy.
    pub fn enemy(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|e| e.id == id)
    }

    pub fn enemy_count(&self) -> usize {
        self.enemies.len()
    }

    /// Has the player fallen below the level?
    pub fn player_fell_out(&self) -> bool {
        self.player.body.y > self.bounds.height
    }

    /// Is the player inside the end zone?
    pub fn player_in_end_zone(&self) -> bool {
        self.end_zone
            .as_ref()
            .is_some_and(|zone| overlaps(&self.player.body, zone, OverlapPolicy::Strict))
    }

    /// Record current positions as interpolation start points.
    pub fn snapshot_previous(&mut self) {
        self.player.snapshot_previous();
        for enemy in &mut self.enemies {
            enemy.snapshot_previous();
        }
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.step, |hasher| {
            hasher.update_str(&self.level_id);
            self.player.hash_into(hasher);

            // Spawn order is the iteration order
            hasher.update_u64(self.enemies.len() as u64);
            for enemy in &self.enemies {
                enemy.hash_into(hasher);
            }

            self.camera.hash_into(hasher);
            hasher.update_bool(self.completed);
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }

    // -------------------------------------------------------------------------
    // Save / restore
    // -------------------------------------------------------------------------

    /// Current progress as a save record.
    pub fn save_data(&self) -> SaveData {
        SaveData::new(self.level_id.clone(), self.player.health)
    }

    /// Restore player health from a save made on this level.
    ///
    /// Health above `max_health` is clamped. A save with no health left
    /// restores full health, the same as a respawn.
    pub fn apply_save(&mut self, save: &SaveData) -> Result<(), SaveError> {
        save.check_version()?;
        if save.current_level_id != self.level_id {
            return Err(SaveError::LevelMismatch {
                expected: self.level_id.clone(),
                found: save.current_level_id.clone(),
            });
        }
        if save.player_health > 0 {
            self.player.set_health(save.player_health);
        } else {
            self.player.set_health(self.player.max_health);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::enemy::GroundState;

    fn world() -> World {
        let mut world = World::new(
            "test",
            Player::new(Vec2::new(100.0, 100.0)),
            LevelBounds {
                width: 4000.0,
                height: 2000.0,
            },
            Camera::default(),
        );
        world.platforms.push(Platform::new(Aabb::new(0.0, 800.0, 1000.0, 20.0)));
        world.enemies.push(Enemy::ground(
            EnemyId(0),
            Aabb::new(500.0, 700.0, 100.0, 100.0),
            1,
            3,
            GroundState::new(500.0, 1, 100.0, 800.0),
        ));
        world
    }

    #[test]
    fn test_hash_determinism() {
        let a = world();
        let b = world();
        assert_eq!(a.compute_hash(), b.compute_hash());
    }

    #[test]
    fn test_hash_sensitive_to_state() {
        let a = world();
        let mut b = world();
        b.enemies[0].body.x += 1e-9;
        assert_ne!(a.compute_hash(), b.compute_hash());

        let mut c = world();
        c.step = 1;
        assert_ne!(a.compute_hash(), c.compute_hash());
    }

    #[test]
    fn test_end_zone_strict() {
        let mut world = world();
        let player = world.player.body;
        world.end_zone = Some(Aabb::new(player.right(), player.y, 50.0, 50.0));
        assert!(!world.player_in_end_zone());

        world.end_zone = Some(Aabb::new(player.right() - 1.0, player.y, 50.0, 50.0));
        assert!(world.player_in_end_zone());
    }

    #[test]
    fn test_fall_out() {
        let mut world = world();
        assert!(!world.player_fell_out());
        world.player.body.y = 2000.5;
        assert!(world.player_fell_out());
    }

    #[test]
    fn test_apply_save_clamps_health() {
        let mut world = world();
        world.apply_save(&SaveData::new("test", 99)).unwrap();
        assert_eq!(world.player.health, world.player.max_health);

        world.apply_save(&SaveData::new("test", 2)).unwrap();
        assert_eq!(world.save_data().player_health, 2);
    }

    #[test]
    fn test_apply_save_without_health_restores_full() {
        let mut world = world();
        world.player.set_health(2);

        world.apply_save(&SaveData::new("test", 0)).unwrap();
        assert_eq!(world.player.health, world.player.max_health);

        world.player.set_health(2);
        world.apply_save(&SaveData::new("test", -4)).unwrap();
        assert_eq!(world.player.health, world.player.max_health);
    }

    #[test]
    fn test_apply_save_wrong_level() {
        let mut world = world();
        let err = world.apply_save(&SaveData::new("other", 2)).unwrap_err();
        assert!(matches!(err, SaveError::LevelMismatch { .. }));
        assert_eq!(world.player.health, world.player.max_health);
    }

    #[test]
    fn test_take_events_drains() {
        let mut world = world();
        world.push_event(GameEvent::level_loaded(0, "test"));
        assert_eq!(world.take_events().len(), 1);
        assert!(world.take_events().is_empty());
    }
}

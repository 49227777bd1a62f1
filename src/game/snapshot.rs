//! Render Snapshots
//!
//! Plain copies of what a renderer needs, detached from the live
//! [`World`]. Positions come in three flavors: the previous substep, the
//! current substep, and the blend between them at the tick's alpha.

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::vec2::Vec2;
use crate::game::enemy::{Enemy, EnemyId, FlyingMode};
use crate::game::player::Player;
use crate::game::state::{LevelBounds, Platform, World};

/// Enemy behavior kind as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyKindTag {
    Ground,
    Flying,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub previous_position: Vec2,
    pub position: Vec2,
    /// Blended at the snapshot's alpha
    pub render_position: Vec2,
    pub width: f64,
    pub height: f64,
    pub velocity: Vec2,
    pub is_on_ground: bool,
    pub is_facing_right: bool,
    pub health: i32,
    pub max_health: i32,
    pub is_invincible: bool,
    pub is_attacking: bool,
    /// Swing progress in [0, 1]
    pub attack_progress: f64,
}

impl PlayerSnapshot {
    fn capture(player: &Player, alpha: f64) -> Self {
        Self {
            previous_position: player.prev_position,
            position: player.position(),
            render_position: player.interpolated_position(alpha),
            width: player.body.width,
            height: player.body.height,
            velocity: player.velocity,
            is_on_ground: player.is_on_ground,
            is_facing_right: player.is_facing_right,
            health: player.health,
            max_health: player.max_health,
            is_invincible: player.is_invincible(),
            is_attacking: player.attack.is_attacking,
            attack_progress: player.attack.progress(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub id: EnemyId,
    pub kind: EnemyKindTag,
    /// Flyers only
    pub mode: Option<FlyingMode>,
    pub previous_position: Vec2,
    pub position: Vec2,
    pub render_position: Vec2,
    pub width: f64,
    pub height: f64,
    pub velocity: Vec2,
    /// Ground patrol direction, or the sign of a flyer's horizontal velocity
    pub direction: i32,
    pub health: i32,
    pub max_health: i32,
    pub is_knocked_back: bool,
}

impl EnemySnapshot {
    fn capture(enemy: &Enemy, alpha: f64) -> Self {
        Self {
            id: enemy.id,
            kind: if enemy.is_flying() {
                EnemyKindTag::Flying
            } else {
                EnemyKindTag::Ground
            },
            mode: enemy.mode(),
            previous_position: enemy.prev_position,
            position: enemy.body.position(),
            render_position: enemy.interpolated_position(alpha),
            width: enemy.body.width,
            height: enemy.body.height,
            velocity: enemy.velocity,
            direction: enemy.direction(),
            health: enemy.health,
            max_health: enemy.max_health,
            is_knocked_back: enemy.is_knocked_back(),
        }
    }
}

/// Everything needed to draw one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub level_id: String,
    pub step: u64,
    pub interpolation_alpha: f64,
    pub camera: Vec2,
    pub bounds: LevelBounds,
    pub player: PlayerSnapshot,
    /// Live enemies in spawn order
    pub enemies: Vec<EnemySnapshot>,
    pub platforms: Vec<Platform>,
    pub end_zone: Option<Aabb>,
    pub completed: bool,
}

impl WorldSnapshot {
    /// Copy the world's renderable state, blending positions at `alpha`.
    pub fn capture(world: &World, alpha: f64) -> Self {
        let alpha = alpha.clamp(0.0, 1.0);
        Self {
            level_id: world.level_id.clone(),
            step: world.step,
            interpolation_alpha: alpha,
            camera: world.camera.position(),
            bounds: world.bounds,
            player: PlayerSnapshot::capture(&world.player, alpha),
            enemies: world
                .enemies
                .iter()
                .map(|e| EnemySnapshot::capture(e, alpha))
                .collect(),
            platforms: world.platforms.clone(),
            end_zone: world.end_zone,
            completed: world.completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::camera::Camera;
    use crate::game::enemy::GroundState;

    fn world() -> World {
        let mut world = World::new(
            "snap",
            Player::new(Vec2::new(0.0, 0.0)),
            LevelBounds {
                width: 4000.0,
                height: 2000.0,
            },
            Camera::default(),
        );
        world.enemies.push(Enemy::ground(
            EnemyId(3),
            Aabb::new(500.0, 700.0, 100.0, 100.0),
            1,
            3,
            GroundState::new(500.0, -1, 100.0, 800.0),
        ));
        world.enemies.push(Enemy::flying(
            EnemyId(4),
            Aabb::new(900.0, 200.0, 100.0, 100.0),
            1,
            3,
            vec![],
        ));
        world
    }

    #[test]
    fn test_render_position_blends() {
        let mut world = world();
        world.player.prev_position = Vec2::new(0.0, 0.0);
        world.player.body.set_position(Vec2::new(10.0, 20.0));

        let snap = WorldSnapshot::capture(&world, 0.5);
        assert_eq!(snap.player.previous_position, Vec2::ZERO);
        assert_eq!(snap.player.position, Vec2::new(10.0, 20.0));
        assert_eq!(snap.player.render_position, Vec2::new(5.0, 10.0));
    }

    #[test]
    fn test_alpha_clamped() {
        let snap = WorldSnapshot::capture(&world(), 3.0);
        assert_eq!(snap.interpolation_alpha, 1.0);
    }

    #[test]
    fn test_enemy_fields() {
        let snap = WorldSnapshot::capture(&world(), 0.0);
        assert_eq!(snap.enemies.len(), 2);

        let ground = &snap.enemies[0];
        assert_eq!(ground.id, EnemyId(3));
        assert_eq!(ground.kind, EnemyKindTag::Ground);
        assert_eq!(ground.mode, None);
        assert_eq!(ground.direction, -1);

        let flyer = &snap.enemies[1];
        assert_eq!(flyer.kind, EnemyKindTag::Flying);
        assert_eq!(flyer.mode, Some(FlyingMode::Patrol));
    }
}

//! Combat System
//!
//! Melee hitbox sweeps against enemies, and body contact between the
//! player and enemies.

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::constants::{
    ATTACK_DAMAGE, ATTACK_HEIGHT, ATTACK_KNOCKBACK_X, ATTACK_KNOCKBACK_Y, ATTACK_MAX_WIDTH,
    ATTACK_MIN_WIDTH, ATTACK_OFFSET_X, ATTACK_OFFSET_Y, CONTACT_BOTTOM_KNOCKBACK_Y,
    CONTACT_SIDE_KNOCKBACK_X, CONTACT_SIDE_KNOCKBACK_Y, CONTACT_TOP_KNOCKBACK_Y,
};
use crate::core::vec2::Vec2;
use crate::game::collision::{classify_with_policy, overlaps, CollisionType, OverlapPolicy};
use crate::game::enemy::{Enemy, EnemyId};
use crate::game::player::Player;
use crate::game::resolve::{damage_player, PlayerHit};

// =============================================================================
// ATTACK
// =============================================================================

/// Hitbox for the current swing.
///
/// Sits against the player's facing edge; width grows linearly from
/// [`ATTACK_MIN_WIDTH`] to [`ATTACK_MAX_WIDTH`] with swing progress.
pub fn attack_hitbox(player: &Player) -> Aabb {
    let progress = player.attack.progress();
    let width = ATTACK_MIN_WIDTH + (ATTACK_MAX_WIDTH - ATTACK_MIN_WIDTH) * progress;
    let x = if player.is_facing_right {
        player.body.right() + ATTACK_OFFSET_X
    } else {
        player.body.x - ATTACK_OFFSET_X - width
    };
    Aabb::new(x, player.body.y + ATTACK_OFFSET_Y, width, ATTACK_HEIGHT)
}

/// One enemy struck by the swing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackHit {
    pub enemy_id: EnemyId,
    pub damage: i32,
    pub remaining_health: i32,
    /// Removed from the level in the same step
    pub killed: bool,
}

/// Test the swing against every live enemy.
///
/// Each enemy is hit at most once per swing. Enemies reaching zero health
/// are removed immediately, preserving the order of the rest.
pub fn resolve_attack_hits(player: &mut Player, enemies: &mut Vec<Enemy>) -> Vec<AttackHit> {
    let mut hits = Vec::new();
    if !player.attack.is_attacking {
        return hits;
    }

    let hitbox = attack_hitbox(player);
    let knockback_x = ATTACK_KNOCKBACK_X * player.facing_sign();

    let mut i = 0;
    while i < enemies.len() {
        let enemy = &mut enemies[i];
        if player.attack.has_hit(enemy.id) || !overlaps(&hitbox, &enemy.body, OverlapPolicy::Strict) {
            i += 1;
            continue;
        }

        let remaining = enemy.take_damage(ATTACK_DAMAGE, knockback_x, ATTACK_KNOCKBACK_Y);
        enemy.is_on_ground = false;
        player.attack.record_hit(enemy.id);

        let killed = !enemy.is_alive();
        hits.push(AttackHit {
            enemy_id: enemy.id,
            damage: ATTACK_DAMAGE,
            remaining_health: remaining,
            killed,
        });

        if killed {
            enemies.remove(i);
        } else {
            i += 1;
        }
    }

    hits
}

// =============================================================================
// BODY CONTACT
// =============================================================================

/// Player knockback for touching `enemy` with contact type `kind`.
pub fn contact_knockback(kind: CollisionType, player: &Aabb, enemy: &Aabb) -> Vec2 {
    match kind {
        CollisionType::Top => Vec2::new(0.0, CONTACT_TOP_KNOCKBACK_Y),
        CollisionType::Bottom => Vec2::new(0.0, CONTACT_BOTTOM_KNOCKBACK_Y),
        CollisionType::Side => {
            let away = if player.center_x() < enemy.center_x() {
                -1.0
            } else {
                1.0
            };
            Vec2::new(away * CONTACT_SIDE_KNOCKBACK_X, CONTACT_SIDE_KNOCKBACK_Y)
        }
        CollisionType::None => Vec2::ZERO,
    }
}

/// Contact between the player and the first touching enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactHit {
    pub enemy_id: EnemyId,
    pub kind: CollisionType,
    /// None when the player was invincible or the enemy deals no damage
    pub hit: Option<PlayerHit>,
}

/// Resolve player/enemy body contact.
///
/// Stops at the first enemy in spawn order whose box overlaps the player,
/// even if that contact dealt no damage.
pub fn resolve_player_enemy_contact(player: &mut Player, enemies: &[Enemy]) -> Option<ContactHit> {
    let enemy = enemies
        .iter()
        .find(|e| overlaps(&player.body, &e.body, OverlapPolicy::PLAYER_ENEMY))?;

    let kind = classify_with_policy(&player.body, &enemy.body, OverlapPolicy::PLAYER_ENEMY);
    let knockback = contact_knockback(kind, &player.body, &enemy.body);
    let hit = damage_player(player, enemy.damage, knockback);

    Some(ContactHit {
        enemy_id: enemy.id,
        kind,
        hit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::constants::FIXED_DT;
    use crate::game::enemy::GroundState;
    use crate::game::input::{GameAction, InputFrame};

    fn enemy_at(id: u32, x: f64, y: f64, health: i32) -> Enemy {
        Enemy::ground(
            EnemyId(id),
            Aabb::new(x, y, 100.0, 100.0),
            1,
            health,
            GroundState::new(x, 1, 100.0, 800.0),
        )
    }

    fn attacking_player() -> Player {
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        player.is_on_ground = true;
        assert!(player.try_attack(InputFrame::new().with(GameAction::Attack)));
        player
    }

    #[test]
    fn test_hitbox_grows_with_progress() {
        let mut player = attacking_player();
        let start = attack_hitbox(&player);
        assert_eq!(start.x, player.body.right());
        assert_eq!(start.width, ATTACK_MIN_WIDTH);
        assert_eq!(start.y, ATTACK_OFFSET_Y);
        assert_eq!(start.height, ATTACK_HEIGHT);

        for _ in 0..15 {
            player.update_timers(FIXED_DT);
        }
        let mid = attack_hitbox(&player);
        assert!((mid.width - (ATTACK_MIN_WIDTH + ATTACK_MAX_WIDTH) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_hitbox_faces_left() {
        let mut player = attacking_player();
        player.is_facing_right = false;
        let hitbox = attack_hitbox(&player);
        assert_eq!(hitbox.right(), player.body.x);
    }

    #[test]
    fn test_attack_hits_each_enemy_once() {
        let mut player = attacking_player();
        let mut enemies = vec![enemy_at(0, 125.0, 60.0, 3)];

        let hits = resolve_attack_hits(&mut player, &mut enemies);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].remaining_health, 2);
        assert!(!hits[0].killed);
        assert!(enemies[0].velocity.x > 0.0);
        assert!(enemies[0].is_knocked_back());

        // Same swing, still overlapping: skipped
        let hits = resolve_attack_hits(&mut player, &mut enemies);
        assert!(hits.is_empty());
        assert_eq!(enemies[0].health, 2);
    }

    #[test]
    fn test_killed_enemy_removed_same_step() {
        let mut player = attacking_player();
        let mut enemies = vec![
            enemy_at(0, 125.0, 60.0, 1),
            enemy_at(1, 130.0, 60.0, 3),
            enemy_at(2, 2000.0, 60.0, 1),
        ];

        let hits = resolve_attack_hits(&mut player, &mut enemies);

        assert_eq!(hits.len(), 2);
        assert!(hits[0].killed);
        assert_eq!(hits[1].enemy_id, EnemyId(1));
        let ids: Vec<_> = enemies.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![EnemyId(1), EnemyId(2)]);
    }

    #[test]
    fn test_no_hits_when_idle() {
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        let mut enemies = vec![enemy_at(0, 125.0, 60.0, 3)];
        assert!(resolve_attack_hits(&mut player, &mut enemies).is_empty());
    }

    #[test]
    fn test_contact_side_knocks_away() {
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        let enemies = vec![enemy_at(0, 110.0, 50.0, 3)];

        let contact = resolve_player_enemy_contact(&mut player, &enemies).expect("touching");
        assert_eq!(contact.kind, CollisionType::Side);
        let hit = contact.hit.expect("damage lands");
        assert_eq!(hit.knockback, Vec2::new(-CONTACT_SIDE_KNOCKBACK_X, CONTACT_SIDE_KNOCKBACK_Y));
        assert_eq!(player.health, 4);
    }

    #[test]
    fn test_contact_top_bounces() {
        // Player feet 5px into the enemy's top
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        let enemies = vec![enemy_at(0, 0.0, 205.0, 3)];

        let contact = resolve_player_enemy_contact(&mut player, &enemies).expect("touching");
        assert_eq!(contact.kind, CollisionType::Top);
        assert_eq!(player.velocity.y, CONTACT_TOP_KNOCKBACK_Y);
    }

    #[test]
    fn test_only_first_contact_resolved() {
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        let enemies = vec![enemy_at(4, 110.0, 50.0, 3), enemy_at(5, -90.0, 50.0, 3)];

        let contact = resolve_player_enemy_contact(&mut player, &enemies).expect("touching");
        assert_eq!(contact.enemy_id, EnemyId(4));
        assert_eq!(player.health, 4);
    }

    #[test]
    fn test_contact_during_invincibility() {
        let mut player = Player::new(Vec2::new(0.0, 0.0));
        player.invincibility_remaining = 0.5;
        let enemies = vec![enemy_at(0, 110.0, 50.0, 3)];

        let contact = resolve_player_enemy_contact(&mut player, &enemies).expect("touching");
        assert!(contact.hit.is_none());
        assert_eq!(player.health, player.max_health);
    }
}

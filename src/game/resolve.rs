//! Collision Resolution
//!
//! Turns a classified contact into position/velocity corrections. The
//! detector (`game::collision`) is pair-agnostic; the rules here are not:
//!
//! | Pair            | Top                 | Bottom            | Side                          |
//! |-----------------|---------------------|-------------------|-------------------------------|
//! | enemy/platform  | snap, land          | snap, stop        | push 1px out, maybe auto-jump |
//! | player/platform | snap, land, damage? | snap, stop, dmg?  | push out, damage or stop      |

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::constants::{
    ENEMY_JUMP_VELOCITY, ENEMY_SIDE_PUSH, GROUND_SNAP_TOLERANCE, PLATFORM_BOTTOM_KNOCKBACK_Y,
    PLATFORM_SIDE_KNOCKBACK_SCALE, PLATFORM_SIDE_KNOCKBACK_Y, PLATFORM_TOP_KNOCKBACK_Y,
    VELOCITY_EPSILON,
};
use crate::core::vec2::Vec2;
use crate::game::collision::{classify_with_policy, CollisionType, OverlapPolicy};
use crate::game::enemy::Enemy;
use crate::game::player::{DamageOutcome, Player};
use crate::game::state::Platform;

/// Damage actually applied to the player by one contact.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerHit {
    pub amount: i32,
    pub knockback: Vec2,
    /// True if the hit was lethal and the player respawned
    pub respawned: bool,
    /// Health after the hit (before any respawn restore)
    pub health_after: i32,
}

/// Route damage through the player's entry point and report what landed.
pub fn damage_player(player: &mut Player, amount: i32, knockback: Vec2) -> Option<PlayerHit> {
    match player.take_damage(amount, knockback.x, knockback.y) {
        DamageOutcome::Ignored => None,
        DamageOutcome::Damaged { health } => Some(PlayerHit {
            amount,
            knockback,
            respawned: false,
            health_after: health,
        }),
        DamageOutcome::Respawned => Some(PlayerHit {
            amount,
            knockback,
            respawned: true,
            health_after: 0,
        }),
    }
}

// =============================================================================
// ENEMY VS PLATFORM
// =============================================================================

/// Apply one enemy/platform contact.
///
/// Returns true when a side contact started an auto-jump.
pub fn resolve_enemy_platform(enemy: &mut Enemy, platform: &Aabb, kind: CollisionType) -> bool {
    match kind {
        CollisionType::None => false,
        CollisionType::Top => {
            enemy.body.y = platform.y - enemy.body.height;
            enemy.velocity.y = 0.0;
            enemy.is_on_ground = !enemy.is_flying();
            false
        }
        CollisionType::Bottom => {
            enemy.body.y = platform.bottom();
            enemy.velocity.y = 0.0;
            false
        }
        CollisionType::Side => {
            if enemy.body.center_x() < platform.center_x() {
                enemy.body.x = platform.x - enemy.body.width - ENEMY_SIDE_PUSH;
            } else {
                enemy.body.x = platform.right() + ENEMY_SIDE_PUSH;
            }
            enemy.try_auto_jump(ENEMY_JUMP_VELOCITY, VELOCITY_EPSILON)
        }
    }
}

/// Vertical pass: resolve Top/Bottom contacts against every platform.
pub fn resolve_enemy_vertical(enemy: &mut Enemy, platforms: &[Platform]) {
    for platform in platforms {
        let kind = classify_with_policy(&enemy.body, &platform.body, OverlapPolicy::ENEMY_PLATFORM);
        if matches!(kind, CollisionType::Top | CollisionType::Bottom) {
            resolve_enemy_platform(enemy, &platform.body, kind);
        }
    }
}

/// Horizontal pass: resolve Side contacts. Returns true if an auto-jump began.
pub fn resolve_enemy_horizontal(enemy: &mut Enemy, platforms: &[Platform]) -> bool {
    let mut jumped = false;
    for platform in platforms {
        let kind = classify_with_policy(&enemy.body, &platform.body, OverlapPolicy::ENEMY_PLATFORM);
        if kind == CollisionType::Side {
            jumped |= resolve_enemy_platform(enemy, &platform.body, kind);
        }
    }
    jumped
}

// =============================================================================
// PLAYER VS PLATFORM
// =============================================================================

/// Apply one player/platform contact. Returns damage dealt, if any.
pub fn resolve_player_platform(
    player: &mut Player,
    platform: &Platform,
    kind: CollisionType,
) -> Option<PlayerHit> {
    let bounds = &platform.body;
    match kind {
        CollisionType::None => None,
        CollisionType::Top => {
            player.body.y = bounds.y - player.body.height;
            player.velocity.y = 0.0;
            player.is_on_ground = true;
            if platform.is_damaging {
                damage_player(player, platform.damage, Vec2::new(0.0, PLATFORM_TOP_KNOCKBACK_Y))
            } else {
                None
            }
        }
        CollisionType::Bottom => {
            player.body.y = bounds.bottom();
            player.velocity.y = 0.0;
            if platform.is_damaging {
                damage_player(player, platform.damage, Vec2::new(0.0, PLATFORM_BOTTOM_KNOCKBACK_Y))
            } else {
                None
            }
        }
        CollisionType::Side => {
            if player.body.center_x() < bounds.center_x() {
                player.body.x = bounds.x - player.body.width;
            } else {
                player.body.x = bounds.right();
            }

            if platform.is_damaging {
                let knockback = Vec2::new(
                    PLATFORM_SIDE_KNOCKBACK_SCALE * player.velocity.x,
                    PLATFORM_SIDE_KNOCKBACK_Y,
                );
                damage_player(player, platform.damage, knockback)
            } else {
                player.velocity.x = 0.0;
                None
            }
        }
    }
}

/// Resolve the player against every platform, then rescan grounding.
///
/// Returns the hits that landed, in platform order.
pub fn resolve_player_platforms(player: &mut Player, platforms: &[Platform]) -> Vec<PlayerHit> {
    let mut hits = Vec::new();
    for platform in platforms {
        let kind = classify_with_policy(&player.body, &platform.body, OverlapPolicy::PLAYER_PLATFORM);
        if let Some(hit) = resolve_player_platform(player, platform, kind) {
            hits.push(hit);
        }
    }

    player.is_on_ground = is_standing(&player.body, player.velocity.y, platforms);
    hits
}

// =============================================================================
// GROUND SCAN
// =============================================================================

/// Is a body with bottom-center feet standing on any platform?
///
/// Feet must lie horizontally within the platform (closed edges), within
/// [`GROUND_SNAP_TOLERANCE`] of its top, and the body must not be rising.
pub fn is_standing(body: &Aabb, velocity_y: f64, platforms: &[Platform]) -> bool {
    if velocity_y < 0.0 {
        return false;
    }

    let feet_x = body.center_x();
    let feet_y = body.bottom();

    platforms.iter().any(|p| {
        let b = &p.body;
        let within_x = feet_x >= b.x && feet_x <= b.right();
        within_x
            && feet_y >= b.y - GROUND_SNAP_TOLERANCE
            && feet_y <= b.y + GROUND_SNAP_TOLERANCE
    })
}

/// Ground-contact scan for an enemy. Flyers are never grounded.
pub fn scan_enemy_ground(enemy: &mut Enemy, platforms: &[Platform]) {
    enemy.is_on_ground = !enemy.is_flying() && is_standing(&enemy.body, enemy.velocity.y, platforms);
}

// =============================================================================
// TESTS
// =============================================================================

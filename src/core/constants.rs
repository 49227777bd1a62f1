//! Simulation Tuning Constants
//!
//! Every gameplay number the simulation uses lives here, grouped by the
//! system that consumes it. Units are pixels and seconds; +Y points down,
//! so upward velocities and knockbacks are negative.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Coordinate system                                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  (0,0) ───────────────▶ +X                                  │
//! │    │                                                        │
//! │    │     ┌──────┐  x,y = top-left corner                    │
//! │    │     │ body │  right  = x + width                       │
//! │    ▼     └──────┘  bottom = y + height                      │
//! │   +Y                                                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// TIMING
// =============================================================================

/// Fixed simulation step: 1/60 second.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Maximum substeps executed per external tick.
pub const MAX_SUBSTEPS: u32 = 5;

/// Substituted for a non-positive or non-finite external delta.
pub const FALLBACK_DT: f64 = 0.001;

// =============================================================================
// PLAYER PHYSICS
// =============================================================================

/// Downward acceleration applied to airborne bodies (px/s²).
pub const GRAVITY: f64 = 900.0;

/// Horizontal acceleration while a direction is held (px/s²).
pub const MOVE_ACCELERATION: f64 = 1200.0;

/// Player horizontal speed cap (px/s).
pub const MAX_MOVE_SPEED: f64 = 300.0;

/// Player jump velocity (px/s, negative = up).
pub const JUMP_VELOCITY: f64 = -800.0;

/// Deceleration applied to grounded bodies with no horizontal drive (px/s²).
pub const GROUND_FRICTION: f64 = 3000.0;

/// Tolerance (px) between feet and a platform top that still counts as standing.
pub const GROUND_SNAP_TOLERANCE: f64 = 3.0;

/// Default player box size.
pub const PLAYER_WIDTH: f64 = 120.0;
/// Default player box size.
pub const PLAYER_HEIGHT: f64 = 210.0;

/// Default player health.
pub const PLAYER_MAX_HEALTH: i32 = 5;

/// Invincibility window after taking damage (s).
pub const INVINCIBILITY_DURATION: f64 = 1.0;

// =============================================================================
// PLATFORM DAMAGE KNOCKBACK
// =============================================================================

/// Knockback when landing on a damaging platform (bounce up).
pub const PLATFORM_TOP_KNOCKBACK_Y: f64 = -400.0;

/// Knockback when bumping a damaging platform from below (push down).
pub const PLATFORM_BOTTOM_KNOCKBACK_Y: f64 = 300.0;

/// Side knockback scale applied to the incoming horizontal velocity.
pub const PLATFORM_SIDE_KNOCKBACK_SCALE: f64 = -3.4;

/// Side knockback vertical component.
pub const PLATFORM_SIDE_KNOCKBACK_Y: f64 = -100.0;

// =============================================================================
// GROUND ENEMY
// =============================================================================

/// Default enemy box size.
pub const ENEMY_WIDTH: f64 = 100.0;
/// Default enemy box size.
pub const ENEMY_HEIGHT: f64 = 100.0;

/// Default contact damage.
pub const ENEMY_DAMAGE: i32 = 1;

/// Default enemy health.
pub const ENEMY_HEALTH: i32 = 3;

/// Default patrol speed (px/s).
pub const ENEMY_PATROL_SPEED: f64 = 100.0;

/// Default patrol half-range around the spawn X (px).
pub const ENEMY_PATROL_RANGE: f64 = 800.0;

/// Auto-jump velocity when blocked by a wall (px/s).
pub const ENEMY_JUMP_VELOCITY: f64 = -600.0;

/// Vertical speed below which an enemy counts as "not already moving vertically".
pub const VELOCITY_EPSILON: f64 = 20.0;

/// Landing within this many px of the jump start Y means the climb failed.
pub const JUMP_HEIGHT_THRESHOLD: f64 = 20.0;

/// Side push-out distance past a platform edge (px).
pub const ENEMY_SIDE_PUSH: f64 = 1.0;

/// Knockback suppression window after an enemy is hit (s).
pub const ENEMY_KNOCKBACK_DURATION: f64 = 0.5;

/// Ground friction applied while knocked back (px/s²).
pub const ENEMY_KNOCKBACK_FRICTION: f64 = 3000.0;

// =============================================================================
// FLYING ENEMY
// =============================================================================

/// Speed while following the patrol pattern (px/s).
pub const FLYING_PATROL_SPEED: f64 = 120.0;

/// Speed while chasing the player (px/s).
pub const FLYING_CHASE_SPEED: f64 = 220.0;

/// Chase engage/disengage distance between centers (px).
pub const FLYING_CHASE_DISTANCE: f64 = 600.0;

/// Spacing of line-of-sight samples (px).
pub const LINE_OF_SIGHT_STEP: f64 = 50.0;

/// First line-of-sight sample offset from the enemy center (px).
pub const LINE_OF_SIGHT_START: f64 = 0.1;

/// Lengths below this are treated as "no direction".
pub const DIRECTION_EPSILON: f64 = 1e-6;

/// Default number of directions in a generated flight pattern.
pub const FLIGHT_PATTERN_DIRECTIONS: u32 = 8;

/// Default max angular jitter per generated direction (radians).
pub const FLIGHT_PATTERN_JITTER: f64 = 0.2;

/// Default duration of each generated flight step (s).
pub const FLIGHT_STEP_DURATION: f64 = 1.5;

// =============================================================================
// COMBAT
// =============================================================================

/// Duration of one attack swing (s).
pub const ATTACK_DURATION: f64 = 0.5;

/// Cooldown after a swing completes (s).
pub const ATTACK_COOLDOWN: f64 = 0.2;

/// Damage dealt per attack hit.
pub const ATTACK_DAMAGE: i32 = 1;

/// Gap between the player's facing edge and the hitbox (px).
pub const ATTACK_OFFSET_X: f64 = 0.0;

/// Hitbox top relative to the player's top (px).
pub const ATTACK_OFFSET_Y: f64 = 50.0;

/// Hitbox width at progress 0 (px).
pub const ATTACK_MIN_WIDTH: f64 = 20.0;

/// Hitbox width at progress 1 (px).
pub const ATTACK_MAX_WIDTH: f64 = 140.0;

/// Hitbox height (px).
pub const ATTACK_HEIGHT: f64 = 100.0;

/// Horizontal knockback applied to a hit enemy, signed by facing.
pub const ATTACK_KNOCKBACK_X: f64 = 400.0;

/// Vertical knockback applied to a hit enemy.
pub const ATTACK_KNOCKBACK_Y: f64 = -250.0;

/// Player knockback when landing on an enemy.
pub const CONTACT_TOP_KNOCKBACK_Y: f64 = -700.0;

/// Player knockback when hitting an enemy from below.
pub const CONTACT_BOTTOM_KNOCKBACK_Y: f64 = 400.0;

/// Player horizontal knockback on side contact, signed away from the enemy.
pub const CONTACT_SIDE_KNOCKBACK_X: f64 = 500.0;

/// Player vertical knockback on side contact.
pub const CONTACT_SIDE_KNOCKBACK_Y: f64 = -300.0;

// =============================================================================
// LEVEL / CAMERA
// =============================================================================

/// Level width when the descriptor omits it.
pub const DEFAULT_LEVEL_WIDTH: f64 = 1920.0;

/// Level height when the descriptor omits it.
pub const DEFAULT_LEVEL_HEIGHT: f64 = 1080.0;

/// Default camera viewport.
pub const VIEWPORT_WIDTH: f64 = 1920.0;
/// Default camera viewport.
pub const VIEWPORT_HEIGHT: f64 = 1080.0;

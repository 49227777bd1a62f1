//! Level Data
//!
//! In-memory level descriptor, its validation, and construction of a
//! [`World`] from it. Where the descriptor comes from (file, network,
//! embedded string) is up to the host; [`LevelDescriptor::from_json`]
//! covers the common case.

pub mod save;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::body::Aabb;
use crate::core::constants::{
    DEFAULT_LEVEL_HEIGHT, DEFAULT_LEVEL_WIDTH, ENEMY_DAMAGE, ENEMY_HEALTH, ENEMY_HEIGHT,
    ENEMY_PATROL_RANGE, ENEMY_PATROL_SPEED, ENEMY_WIDTH,
};
use crate::core::rng::derive_flight_seed;
use crate::core::vec2::Vec2;
use crate::game::camera::Camera;
use crate::game::enemy::{generate_flight_pattern, Enemy, EnemyId, FlightStep, GroundState};
use crate::game::player::Player;
use crate::game::state::{LevelBounds, Platform, World};
use crate::game::tick::SimConfig;

pub use save::{SaveData, SaveError};

/// Level loading errors.
#[derive(Debug, Error)]
pub enum LevelError {
    /// Descriptor is not valid JSON or has the wrong shape.
    #[error("level decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Level width/height not finite and positive.
    #[error("invalid level bounds {width}x{height}")]
    InvalidBounds { width: f64, height: f64 },

    /// A box has non-finite coordinates or a non-positive size.
    #[error("invalid geometry for {0}")]
    InvalidGeometry(String),

    /// A numeric field is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: &'static str },

    /// Enemy direction other than -1 or +1.
    #[error("enemy {index}: direction must be -1 or 1, got {direction}")]
    InvalidDirection { index: usize, direction: i32 },

    /// Explicit flight pattern with no steps.
    #[error("enemy {index}: flight pattern is empty")]
    EmptyFlightPattern { index: usize },
}

// =============================================================================
// DESCRIPTOR TYPES
// =============================================================================

fn default_level_width() -> f64 {
    DEFAULT_LEVEL_WIDTH
}

fn default_level_height() -> f64 {
    DEFAULT_LEVEL_HEIGHT
}

fn default_enemy_width() -> f64 {
    ENEMY_WIDTH
}

fn default_enemy_height() -> f64 {
    ENEMY_HEIGHT
}

fn default_enemy_damage() -> i32 {
    ENEMY_DAMAGE
}

fn default_enemy_health() -> i32 {
    ENEMY_HEALTH
}

/// A plain box in level data.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxData {
    pub fn to_aabb(self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}

/// Platform entry.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlatformData {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub is_damaging: bool,
    #[serde(default)]
    pub damage: i32,
}

/// Enemy behavior kind in level data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKindData {
    #[default]
    Ground,
    Flying,
}

/// One explicit flight leg: direction `(dx, dy)` for `duration` seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlightStepData {
    pub dx: f64,
    pub dy: f64,
    pub duration: f64,
}

/// Enemy entry. Size, damage and health fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyData {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_enemy_width")]
    pub width: f64,
    #[serde(default = "default_enemy_height")]
    pub height: f64,
    #[serde(default = "default_enemy_damage")]
    pub damage: i32,
    #[serde(default = "default_enemy_health")]
    pub health: i32,
    #[serde(default)]
    pub kind: EnemyKindData,
    /// Initial patrol direction (-1 or 1)
    #[serde(default)]
    pub direction: Option<i32>,
    #[serde(default)]
    pub patrol_range: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    /// Seed for the generated flight pattern
    #[serde(default)]
    pub flight_seed: Option<u64>,
    /// Explicit flight pattern; overrides the generated one
    #[serde(default)]
    pub flight_pattern: Option<Vec<FlightStepData>>,
}

impl EnemyData {
    /// Ground enemy at `(x, y)` with default stats.
    pub fn ground(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            width: ENEMY_WIDTH,
            height: ENEMY_HEIGHT,
            damage: ENEMY_DAMAGE,
            health: ENEMY_HEALTH,
            kind: EnemyKindData::Ground,
            direction: None,
            patrol_range: None,
            speed: None,
            flight_seed: None,
            flight_pattern: None,
        }
    }

    /// Flying enemy at `(x, y)` with default stats.
    pub fn flying(x: f64, y: f64) -> Self {
        Self {
            kind: EnemyKindData::Flying,
            ..Self::ground(x, y)
        }
    }

    fn body(&self) -> Aabb {
        Aabb::new(self.x, self.y, self.width, self.height)
    }
}

/// Complete level description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub player_start_x: Option<f64>,
    #[serde(default)]
    pub player_start_y: Option<f64>,
    #[serde(default = "default_level_width")]
    pub width: f64,
    #[serde(default = "default_level_height")]
    pub height: f64,
    #[serde(default)]
    pub platforms: Vec<PlatformData>,
    #[serde(default)]
    pub enemies: Vec<EnemyData>,
    #[serde(default)]
    pub end_zone: Option<BoxData>,
    #[serde(default)]
    pub next_level_id: Option<String>,
}

impl LevelDescriptor {
    /// Minimal level: id, player start and default bounds.
    pub fn new(id: impl Into<String>, player_start: Vec2) -> Self {
        Self {
            id: id.into(),
            player_start_x: Some(player_start.x),
            player_start_y: Some(player_start.y),
            width: DEFAULT_LEVEL_WIDTH,
            height: DEFAULT_LEVEL_HEIGHT,
            platforms: Vec::new(),
            enemies: Vec::new(),
            end_zone: None,
            next_level_id: None,
        }
    }

    /// Parse and validate a JSON descriptor.
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let descriptor: Self = serde_json::from_str(json)?;
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn to_json(&self) -> Result<String, LevelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Player start, if both coordinates are present.
    pub fn player_start(&self) -> Result<Vec2, LevelError> {
        let x = self.player_start_x.ok_or(LevelError::MissingField("player_start_x"))?;
        let y = self.player_start_y.ok_or(LevelError::MissingField("player_start_y"))?;
        Ok(Vec2::new(x, y))
    }

    /// Check every field the simulation relies on.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.id.trim().is_empty() {
            return Err(LevelError::MissingField("id"));
        }

        let start = self.player_start()?;
        if !start.is_finite() {
            return Err(LevelError::InvalidGeometry("player start".into()));
        }

        let bounds_ok = |v: f64| v.is_finite() && v > 0.0;
        if !bounds_ok(self.width) || !bounds_ok(self.height) {
            return Err(LevelError::InvalidBounds {
                width: self.width,
                height: self.height,
            });
        }

        for (i, p) in self.platforms.iter().enumerate() {
            if !Aabb::new(p.x, p.y, p.width, p.height).is_valid() {
                return Err(LevelError::InvalidGeometry(format!("platform {i}")));
            }
            if p.damage < 0 {
                return Err(LevelError::InvalidValue {
                    field: format!("platforms[{i}].damage"),
                    reason: "must be non-negative",
                });
            }
        }

        for (i, e) in self.enemies.iter().enumerate() {
            validate_enemy(i, e)?;
        }

        if let Some(zone) = self.end_zone {
            if !zone.to_aabb().is_valid() {
                return Err(LevelError::InvalidGeometry("end zone".into()));
            }
        }

        Ok(())
    }
}

fn validate_enemy(index: usize, enemy: &EnemyData) -> Result<(), LevelError> {
    if !enemy.body().is_valid() {
        return Err(LevelError::InvalidGeometry(format!("enemy {index}")));
    }
    if enemy.health <= 0 {
        return Err(LevelError::InvalidValue {
            field: format!("enemies[{index}].health"),
            reason: "must be positive",
        });
    }
    if enemy.damage < 0 {
        return Err(LevelError::InvalidValue {
            field: format!("enemies[{index}].damage"),
            reason: "must be non-negative",
        });
    }
    if let Some(direction) = enemy.direction {
        if direction != 1 && direction != -1 {
            return Err(LevelError::InvalidDirection { index, direction });
        }
    }
    if let Some(range) = enemy.patrol_range {
        if !range.is_finite() || range < 0.0 {
            return Err(LevelError::InvalidValue {
                field: format!("enemies[{index}].patrol_range"),
                reason: "must be finite and non-negative",
            });
        }
    }
    if let Some(speed) = enemy.speed {
        if !speed.is_finite() || speed < 0.0 {
            return Err(LevelError::InvalidValue {
                field: format!("enemies[{index}].speed"),
                reason: "must be finite and non-negative",
            });
        }
    }
    if let Some(pattern) = &enemy.flight_pattern {
        if pattern.is_empty() {
            return Err(LevelError::EmptyFlightPattern { index });
        }
        for step in pattern {
            let direction_ok = step.dx.is_finite() && step.dy.is_finite();
            if !direction_ok || !step.duration.is_finite() || step.duration <= 0.0 {
                return Err(LevelError::InvalidValue {
                    field: format!("enemies[{index}].flight_pattern"),
                    reason: "steps need finite directions and positive durations",
                });
            }
        }
    }
    Ok(())
}

// =============================================================================
// WORLD CONSTRUCTION
// =============================================================================

impl World {
    /// Build a world from a descriptor.
    ///
    /// Enemies get ids `0..n` in descriptor order. Flyers without an
    /// explicit pattern get a generated one, seeded from `flight_seed` or
    /// derived from the level id and enemy index.
    pub fn from_level(level: &LevelDescriptor, config: &SimConfig) -> Result<Self, LevelError> {
        level.validate()?;

        let bounds = LevelBounds {
            width: level.width,
            height: level.height,
        };
        let camera = Camera::new(config.viewport_width, config.viewport_height, bounds.width, bounds.height);
        let player = Player::new(level.player_start()?);

        let mut world = World::new(level.id.clone(), player, bounds, camera);

        world.platforms = level
            .platforms
            .iter()
            .map(|p| {
                let body = Aabb::new(p.x, p.y, p.width, p.height);
                if p.is_damaging {
                    Platform::damaging(body, p.damage)
                } else {
                    Platform::new(body)
                }
            })
            .collect();

        world.enemies = level
            .enemies
            .iter()
            .enumerate()
            .map(|(i, data)| spawn_enemy(&level.id, i, data, config))
            .collect();

        world.end_zone = level.end_zone.map(BoxData::to_aabb);
        world.next_level_id = level.next_level_id.clone();

        debug!(
            level = %world.level_id,
            platforms = world.platforms.len(),
            enemies = world.enemies.len(),
            "World built"
        );

        Ok(world)
    }
}

fn spawn_enemy(level_id: &str, index: usize, data: &EnemyData, config: &SimConfig) -> Enemy {
    let id = EnemyId(index as u32);
    let body = data.body();

    match data.kind {
        EnemyKindData::Ground => {
            let state = GroundState::new(
                data.x,
                data.direction.unwrap_or(1),
                data.speed.unwrap_or(ENEMY_PATROL_SPEED),
                data.patrol_range.unwrap_or(ENEMY_PATROL_RANGE),
            );
            Enemy::ground(id, body, data.damage, data.health, state)
        }
        EnemyKindData::Flying => {
            let pattern = match &data.flight_pattern {
                Some(steps) => steps
                    .iter()
                    .map(|s| FlightStep::new(Vec2::new(s.dx, s.dy), s.duration))
                    .collect(),
                None => {
                    let seed = data
                        .flight_seed
                        .unwrap_or_else(|| derive_flight_seed(level_id, index));
                    generate_flight_pattern(
                        config.flight_pattern_directions,
                        seed,
                        config.flight_pattern_jitter,
                        config.flight_step_duration,
                    )
                }
            };
            Enemy::flying(id, body, data.damage, data.health, pattern)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::enemy::EnemyKind;

    const LEVEL_JSON: &str = r#"{
        "id": "level1",
        "player_start_x": 100,
        "player_start_y": 100,
        "width": 4000,
        "height": 1500,
        "platforms": [
            { "x": 0, "y": 800, "width": 1000, "height": 20 },
            { "x": 1200, "y": 800, "width": 200, "height": 20, "is_damaging": true, "damage": 2 }
        ],
        "enemies": [
            { "x": 600, "y": 700, "direction": -1, "patrol_range": 300 },
            { "x": 900, "y": 300, "kind": "flying", "flight_seed": 77 },
            { "x": 900, "y": 200, "kind": "flying",
              "flight_pattern": [ { "dx": 1, "dy": 0, "duration": 2 } ] }
        ],
        "end_zone": { "x": 3800, "y": 600, "width": 100, "height": 200 },
        "next_level_id": "level2"
    }"#;

    #[test]
    fn test_parse_and_build() {
        let level = LevelDescriptor::from_json(LEVEL_JSON).unwrap();
        let world = World::from_level(&level, &SimConfig::default()).unwrap();

        assert_eq!(world.level_id, "level1");
        assert_eq!(world.platforms.len(), 2);
        assert!(world.platforms[1].is_damaging);
        assert_eq!(world.platforms[1].damage, 2);
        assert_eq!(world.enemies.len(), 3);
        assert_eq!(world.next_level_id.as_deref(), Some("level2"));
        assert!(world.end_zone.is_some());

        let ground = &world.enemies[0];
        assert_eq!(ground.id, EnemyId(0));
        assert_eq!(ground.direction(), -1);
        assert_eq!(ground.health, ENEMY_HEALTH);
        assert_eq!(ground.body.width, ENEMY_WIDTH);

        match &world.enemies[1].kind {
            EnemyKind::Flying(f) => {
                let expected = generate_flight_pattern(8, 77, 0.2, 1.5);
                assert_eq!(f.pattern, expected);
            }
            EnemyKind::Ground(_) => panic!("expected flyer"),
        }

        match &world.enemies[2].kind {
            EnemyKind::Flying(f) => {
                assert_eq!(f.pattern, vec![FlightStep::new(Vec2::RIGHT, 2.0)]);
            }
            EnemyKind::Ground(_) => panic!("expected flyer"),
        }
    }

    #[test]
    fn test_defaults_applied() {
        let level = LevelDescriptor::from_json(
            r#"{ "id": "tiny", "player_start_x": 0, "player_start_y": 0 }"#,
        )
        .unwrap();
        assert_eq!(level.width, DEFAULT_LEVEL_WIDTH);
        assert_eq!(level.height, DEFAULT_LEVEL_HEIGHT);
        assert!(level.platforms.is_empty());
    }

    #[test]
    fn test_missing_fields_fail_fast() {
        let err = LevelDescriptor::from_json(r#"{ "id": "x", "player_start_x": 0 }"#).unwrap_err();
        assert!(matches!(err, LevelError::MissingField("player_start_y")));

        let err =
            LevelDescriptor::from_json(r#"{ "player_start_x": 0, "player_start_y": 0 }"#).unwrap_err();
        assert!(matches!(err, LevelError::MissingField("id")));

        let err = LevelDescriptor::from_json("{ nope").unwrap_err();
        assert!(matches!(err, LevelError::Json(_)));
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let mut level = LevelDescriptor::new("bad", Vec2::ZERO);
        level.platforms.push(PlatformData {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 10.0,
            is_damaging: false,
            damage: 0,
        });
        assert!(matches!(level.validate(), Err(LevelError::InvalidGeometry(_))));

        let mut level = LevelDescriptor::new("bad", Vec2::ZERO);
        level.width = f64::NAN;
        assert!(matches!(level.validate(), Err(LevelError::InvalidBounds { .. })));
    }

    #[test]
    fn test_invalid_enemy_rejected() {
        let mut level = LevelDescriptor::new("bad", Vec2::ZERO);
        let mut enemy = EnemyData::ground(0.0, 0.0);
        enemy.direction = Some(0);
        level.enemies.push(enemy);
        assert!(matches!(
            level.validate(),
            Err(LevelError::InvalidDirection { index: 0, direction: 0 })
        ));

        let mut level = LevelDescriptor::new("bad", Vec2::ZERO);
        let mut flyer = EnemyData::flying(0.0, 0.0);
        flyer.flight_pattern = Some(Vec::new());
        level.enemies.push(flyer);
        assert!(matches!(
            level.validate(),
            Err(LevelError::EmptyFlightPattern { index: 0 })
        ));
    }

    #[test]
    fn test_derived_seed_is_stable() {
        let mut level = LevelDescriptor::new("seeded", Vec2::ZERO);
        level.enemies.push(EnemyData::flying(100.0, 100.0));

        let a = World::from_level(&level, &SimConfig::default()).unwrap();
        let b = World::from_level(&level, &SimConfig::default()).unwrap();
        assert_eq!(a.compute_hash(), b.compute_hash());

        match &a.enemies[0].kind {
            EnemyKind::Flying(f) => {
                let expected = generate_flight_pattern(8, derive_flight_seed("seeded", 0), 0.2, 1.5);
                assert_eq!(f.pattern, expected);
            }
            EnemyKind::Ground(_) => panic!("expected flyer"),
        }
    }

    #[test]
    fn test_descriptor_json_roundtrip() {
        let level = LevelDescriptor::from_json(LEVEL_JSON).unwrap();
        let again = LevelDescriptor::from_json(&level.to_json().unwrap()).unwrap();
        assert_eq!(level, again);
    }
}

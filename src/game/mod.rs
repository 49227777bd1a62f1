//! Game Logic Module
//!
//! Everything that runs inside a fixed substep, plus the loop that drives
//! it. Deterministic for a given level, config and input stream.
//!
//! ## Module Structure
//!
//! - `input`: Actions, held-action set, input recording
//! - `collision`: Overlap tests and contact classification
//! - `player` / `enemy`: Per-body state and behavior
//! - `resolve`: Body-vs-platform contact resolution
//! - `combat`: Attack hitbox and player/enemy contact
//! - `camera`: Viewport follow and clamping
//! - `state`: The `World` aggregate
//! - `events`: Events drained per external tick
//! - `snapshot`: Read-only render views
//! - `tick`: Fixed-timestep loop and `Simulation` facade

pub mod input;
pub mod collision;
pub mod player;
pub mod enemy;
pub mod resolve;
pub mod combat;
pub mod camera;
pub mod state;
pub mod events;
pub mod snapshot;
pub mod tick;

// Re-export key types
pub use input::{ActionSet, GameAction, InputFrame, InputLog};
pub use state::{LevelBounds, Platform, World};
pub use player::Player;
pub use enemy::{Enemy, EnemyId, FlyingMode};
pub use events::{GameEvent, GameEventData};
pub use snapshot::WorldSnapshot;
pub use tick::{SimConfig, Simulation, TickResult};

//! # Ledgewalk
//!
//! Deterministic simulation core for a 2D side-scrolling platformer.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         LEDGEWALK                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── constants.rs- Physics and combat tuning                 │
//! │  ├── vec2.rs     - 2D vector                                 │
//! │  ├── body.rs     - Axis-aligned boxes                        │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── hash.rs     - State hashing for replay checks           │
//! │                                                              │
//! │  game/           - Simulation                                │
//! │  ├── input.rs    - Actions, recording                        │
//! │  ├── player.rs   - Movement, health, attack timing           │
//! │  ├── enemy.rs    - Ground patrol, flying patrol/chase        │
//! │  ├── resolve.rs  - Platform contact resolution               │
//! │  ├── combat.rs   - Attack hits, body contact                 │
//! │  ├── state.rs    - World aggregate                           │
//! │  └── tick.rs     - Fixed timestep, Simulation facade         │
//! │                                                              │
//! │  level/          - Level descriptors and save records        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! Physics advances in fixed substeps regardless of the host frame rate.
//! Enemies iterate in spawn order, flight patterns come from seeded
//! randomness, and no wall-clock time enters the simulation. The same
//! level, config and recorded `(dt, input)` stream always reach the same
//! state hash on the same platform.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod level;

// Re-export commonly used types
pub use core::vec2::Vec2;
pub use core::body::Aabb;
pub use core::hash::StateHash;
pub use game::input::{GameAction, InputFrame, InputLog};
pub use game::state::World;
pub use game::tick::{replay, SimConfig, Simulation, SimulationError, TickResult};
pub use level::{LevelDescriptor, LevelError, SaveData, SaveError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Physics substep rate (Hz)
pub const STEP_RATE: u32 = 60;

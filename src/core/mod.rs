//! Core deterministic primitives.
//!
//! Geometry, tuning constants, seeded randomness and state hashing.
//! Nothing here knows about players or enemies.

pub mod constants;
pub mod vec2;
pub mod body;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use body::Aabb;
pub use rng::{DeterministicRng, derive_flight_seed};
pub use hash::{StateHash, StateHasher, compute_state_hash};

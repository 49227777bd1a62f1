//! State Hashing for Verification
//!
//! Provides deterministic hashing of world state for:
//! - Replay validation (recorded input must reproduce the same hash)
//! - Regression checks in tests
//!
//! Floats are hashed by bit pattern, so `0.0` and `-0.0` differ and two
//! runs only match when every intermediate value matched.

use sha2::{Digest, Sha256};

use super::body::Aabb;
use super::vec2::Vec2;

/// Hash output type (256 bits / 32 bytes)
pub type StateHash = [u8; 32];

/// Deterministic hasher for world state.
///
/// Wraps SHA-256 with helpers for simulation types.
/// Order of updates is critical for determinism.
pub struct StateHasher {
    hasher: Sha256,
}

impl StateHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for world state.
    pub fn for_world_state() -> Self {
        Self::new(b"LEDGEWALK_STATE_V1")
    }

    /// Create hasher for an input log.
    pub fn for_input_log() -> Self {
        Self::new(b"LEDGEWALK_INPUTS_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an i32 value (little-endian).
    #[inline]
    pub fn update_i32(&mut self, value: i32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 by its IEEE-754 bits.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.update_u64(value.to_bits());
    }

    /// Update with a Vec2.
    #[inline]
    pub fn update_vec2(&mut self, value: Vec2) {
        self.update_f64(value.x);
        self.update_f64(value.y);
    }

    /// Update with a box.
    #[inline]
    pub fn update_aabb(&mut self, value: &Aabb) {
        self.update_f64(value.x);
        self.update_f64(value.y);
        self.update_f64(value.width);
        self.update_f64(value.height);
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Update with a length-prefixed string.
    #[inline]
    pub fn update_str(&mut self, value: &str) {
        self.update_u64(value.len() as u64);
        self.hasher.update(value.as_bytes());
    }

    /// Finalize and return the hash.
    pub fn finalize(self) -> StateHash {
        self.hasher.finalize().into()
    }
}

/// Compute state hash for world verification.
///
/// Called by `World::compute_hash()`. The closure adds state-specific data
/// after the step counter.
pub fn compute_state_hash<F>(step: u64, add_state: F) -> StateHash
where
    F: FnOnce(&mut StateHasher),
{
    let mut hasher = StateHasher::for_world_state();

    // Always hash the step counter first
    hasher.update_u64(step);

    add_state(&mut hasher);

    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_hasher_determinism() {
        let make_hash = || {
            let mut hasher = StateHasher::for_world_state();
            hasher.update_u32(100);
            hasher.update_f64(5.5);
            hasher.update_vec2(Vec2::new(1.0, 2.0));
            hasher.update_aabb(&Aabb::new(0.0, 800.0, 1000.0, 20.0));
            hasher.update_bool(true);
            hasher.finalize()
        };

        assert_eq!(make_hash(), make_hash());
    }

    #[test]
    fn test_hash_order_matters() {
        let hash1 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(1);
            h.update_u32(2);
            h.finalize()
        };

        let hash2 = {
            let mut h = StateHasher::new(b"test");
            h.update_u32(2);
            h.update_u32(1);
            h.finalize()
        };

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_signed_zero_distinguished() {
        let a = compute_state_hash(0, |h| h.update_f64(0.0));
        let b = compute_state_hash(0, |h| h.update_f64(-0.0));
        assert_ne!(a, b);
    }

    #[test]
    fn test_compute_state_hash() {
        let hash = compute_state_hash(100, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_str("level1");
        });
        let hash2 = compute_state_hash(100, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_str("level1");
        });
        assert_eq!(hash, hash2);

        let hash3 = compute_state_hash(101, |hasher| {
            hasher.update_f64(5.0);
            hasher.update_str("level1");
        });
        assert_ne!(hash, hash3);
    }
}

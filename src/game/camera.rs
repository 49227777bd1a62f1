//! Camera
//!
//! Centers a viewport on a target box and keeps it inside the level.

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;
use crate::core::constants::{VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;

/// Viewport offset in world space (world − camera = screen).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub x: f64,
    pub y: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub level_width: f64,
    pub level_height: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(VIEWPORT_WIDTH, VIEWPORT_HEIGHT, VIEWPORT_WIDTH, VIEWPORT_HEIGHT)
    }
}

impl Camera {
    pub fn new(viewport_width: f64, viewport_height: f64, level_width: f64, level_height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            viewport_width,
            viewport_height,
            level_width,
            level_height,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Center on `target`, clamped to [0, level − viewport] on each axis.
    ///
    /// A level smaller than the viewport pins that axis to 0.
    pub fn follow(&mut self, target: &Aabb) {
        let max_x = (self.level_width - self.viewport_width).max(0.0);
        let max_y = (self.level_height - self.viewport_height).max(0.0);

        self.x = (target.center_x() - self.viewport_width / 2.0).clamp(0.0, max_x);
        self.y = (target.center_y() - self.viewport_height / 2.0).clamp(0.0, max_y);
    }

    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_f64(self.x);
        hasher.update_f64(self.y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centers_on_target() {
        let mut camera = Camera::new(1920.0, 1080.0, 10_000.0, 3000.0);
        camera.follow(&Aabb::new(5000.0, 1500.0, 120.0, 210.0));
        assert_eq!(camera.x, 5060.0 - 960.0);
        assert_eq!(camera.y, 1605.0 - 540.0);
    }

    #[test]
    fn test_clamps_to_level() {
        let mut camera = Camera::new(1920.0, 1080.0, 4000.0, 2000.0);

        camera.follow(&Aabb::new(0.0, 0.0, 120.0, 210.0));
        assert_eq!(camera.position(), Vec2::ZERO);

        camera.follow(&Aabb::new(3900.0, 1900.0, 120.0, 210.0));
        assert_eq!(camera.x, 4000.0 - 1920.0);
        assert_eq!(camera.y, 2000.0 - 1080.0);
    }

    #[test]
    fn test_small_level_pins_to_origin() {
        let mut camera = Camera::new(1920.0, 1080.0, 1000.0, 600.0);
        camera.follow(&Aabb::new(900.0, 500.0, 120.0, 210.0));
        assert_eq!(camera.position(), Vec2::ZERO);
    }
}

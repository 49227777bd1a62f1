//! Collision Detection
//!
//! Pairwise AABB overlap tests and directional classification.
//!
//! Classification is pair-agnostic: the same function serves
//! player/platform, player/enemy and enemy/platform pairs. What happens
//! after a hit is the resolver's business (`game::resolve`).

use serde::{Deserialize, Serialize};

use crate::core::body::Aabb;

/// Boundary rule for an overlap test.
///
/// Two policies exist because edge-touching boxes must behave differently
/// depending on the pair. They are kept apart on purpose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// Open intervals: touching edges do not overlap.
    /// Used for player/platform, player/enemy, hitbox/enemy and end zone.
    Strict,
    /// Closed intervals: touching edges overlap.
    /// Used for enemy/platform.
    Inclusive,
}

impl OverlapPolicy {
    /// Policy for a player against a platform.
    pub const PLAYER_PLATFORM: Self = Self::Strict;
    /// Policy for a player against an enemy.
    pub const PLAYER_ENEMY: Self = Self::Strict;
    /// Policy for an enemy against a platform.
    pub const ENEMY_PLATFORM: Self = Self::Inclusive;
}

/// Result of classifying an ordered (moving, static) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CollisionType {
    /// No overlap
    None = 0,
    /// Moving body's bottom is inside the static body's top
    Top = 1,
    /// Moving body's top is inside the static body's bottom
    Bottom = 2,
    /// Horizontal contact from either side
    Side = 3,
}

/// Check whether two boxes overlap under `policy`.
#[inline]
pub fn overlaps(a: &Aabb, b: &Aabb, policy: OverlapPolicy) -> bool {
    match policy {
        OverlapPolicy::Strict => {
            a.x < b.x + b.width
                && a.right() > b.x
                && a.y < b.y + b.height
                && a.bottom() > b.y
        }
        OverlapPolicy::Inclusive => {
            a.x <= b.right()
                && a.right() >= b.x
                && a.y <= b.bottom()
                && a.bottom() >= b.y
        }
    }
}

/// Directed penetration depths of `a` into `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Penetration {
    /// `a.right - b.x`
    pub left: f64,
    /// `b.right - a.x`
    pub right: f64,
    /// `a.bottom - b.y`
    pub top: f64,
    /// `b.bottom - a.y`
    pub bottom: f64,
}

impl Penetration {
    /// Measure how far `a` reaches into `b` from each side.
    #[inline]
    pub fn between(a: &Aabb, b: &Aabb) -> Self {
        Self {
            left: a.right() - b.x,
            right: b.right() - a.x,
            top: a.bottom() - b.y,
            bottom: b.bottom() - a.y,
        }
    }

    /// Smallest of the four depths.
    #[inline]
    pub fn min(&self) -> f64 {
        self.left.min(self.right).min(self.top.min(self.bottom))
    }
}

/// Classify the collision of moving body `a` against static body `b`.
///
/// Overlap is tested with the strict policy. Use
/// [`classify_with_policy`] for the inclusive variant.
#[inline]
pub fn classify(a: &Aabb, b: &Aabb) -> CollisionType {
    classify_with_policy(a, b, OverlapPolicy::Strict)
}

/// Classify the collision of `a` against `b` under `policy`.
///
/// Picks the side of minimum penetration. Ties resolve Top, then Bottom,
/// then Side; left and right both map to Side. Returns `None` exactly when
/// the boxes do not overlap under `policy`.
pub fn classify_with_policy(a: &Aabb, b: &Aabb, policy: OverlapPolicy) -> CollisionType {
    if !overlaps(a, b, policy) {
        return CollisionType::None;
    }

    let depth = Penetration::between(a, b);
    let min = depth.min();

    if min == depth.top {
        CollisionType::Top
    } else if min == depth.bottom {
        CollisionType::Bottom
    } else {
        // min is left or right
        CollisionType::Side
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn platform() -> Aabb {
        Aabb::new(0.0, 800.0, 1000.0, 20.0)
    }

    #[test]
    fn test_strict_vs_inclusive_touching_edges() {
        let a = Aabb::new(0.0, 0.0, 10.0, 10.0);
        let touching = Aabb::new(10.0, 0.0, 10.0, 10.0);

        assert!(!overlaps(&a, &touching, OverlapPolicy::Strict));
        assert!(overlaps(&a, &touching, OverlapPolicy::Inclusive));
    }

    #[test]
    fn test_classify_landing_is_top() {
        // Player feet 5px into a wide floor
        let player = Aabb::new(100.0, 595.0, 120.0, 210.0);
        assert_eq!(classify(&player, &platform()), CollisionType::Top);
    }

    #[test]
    fn test_classify_head_bump_is_bottom() {
        let player = Aabb::new(100.0, 815.0, 120.0, 210.0);
        assert_eq!(classify(&player, &platform()), CollisionType::Bottom);
    }

    #[test]
    fn test_classify_wall_is_side() {
        let wall = Aabb::new(500.0, 0.0, 50.0, 1000.0);
        let from_left = Aabb::new(385.0, 300.0, 120.0, 210.0);
        let from_right = Aabb::new(545.0, 300.0, 120.0, 210.0);

        assert_eq!(classify(&from_left, &wall), CollisionType::Side);
        assert_eq!(classify(&from_right, &wall), CollisionType::Side);
    }

    #[test]
    fn test_classify_separated_is_none() {
        let player = Aabb::new(100.0, 100.0, 120.0, 210.0);
        assert_eq!(classify(&player, &platform()), CollisionType::None);
    }

    #[test]
    fn test_tie_top_beats_bottom() {
        // Same-size boxes stacked exactly: top == bottom == height
        let a = Aabb::new(0.0, 0.0, 100.0, 10.0);
        let b = Aabb::new(0.0, 0.0, 100.0, 10.0);
        let d = Penetration::between(&a, &b);
        assert_eq!(d.top, d.bottom);
        assert_eq!(classify(&a, &b), CollisionType::Top);
    }

    #[test]
    fn test_tie_bottom_beats_side() {
        // a enters b's bottom-right corner by 5 on both axes
        let a = Aabb::new(95.0, 95.0, 50.0, 50.0);
        let b = Aabb::new(0.0, 0.0, 100.0, 100.0);
        let d = Penetration::between(&a, &b);
        assert_eq!(d.bottom, 5.0);
        assert_eq!(d.right, 5.0);
        assert_eq!(classify(&a, &b), CollisionType::Bottom);
    }

    #[test]
    fn test_inclusive_touching_classifies() {
        // Enemy resting exactly on a platform top: zero-depth Top contact
        let enemy = Aabb::new(10.0, 700.0, 100.0, 100.0);
        assert_eq!(
            classify_with_policy(&enemy, &platform(), OverlapPolicy::ENEMY_PLATFORM),
            CollisionType::Top
        );
        assert_eq!(
            classify_with_policy(&enemy, &platform(), OverlapPolicy::PLAYER_PLATFORM),
            CollisionType::None
        );
    }

    fn arb_box() -> impl Strategy<Value = Aabb> {
        (-500.0..500.0f64, -500.0..500.0f64, 1.0..300.0f64, 1.0..300.0f64)
            .prop_map(|(x, y, w, h)| Aabb::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_none_iff_no_overlap(a in arb_box(), b in arb_box()) {
            for policy in [OverlapPolicy::Strict, OverlapPolicy::Inclusive] {
                let kind = classify_with_policy(&a, &b, policy);
                prop_assert_eq!(kind == CollisionType::None, !overlaps(&a, &b, policy));
            }
        }

        #[test]
        fn prop_classification_matches_min_depth(a in arb_box(), b in arb_box()) {
            let kind = classify(&a, &b);
            if kind != CollisionType::None {
                let d = Penetration::between(&a, &b);
                let min = d.min();
                match kind {
                    CollisionType::Top => prop_assert_eq!(d.top, min),
                    CollisionType::Bottom => {
                        prop_assert_eq!(d.bottom, min);
                        prop_assert!(d.top > min);
                    }
                    CollisionType::Side => {
                        prop_assert!(d.left == min || d.right == min);
                        prop_assert!(d.top > min && d.bottom > min);
                    }
                    CollisionType::None => unreachable!(),
                }
            }
        }

        #[test]
        fn prop_strict_overlap_implies_inclusive(a in arb_box(), b in arb_box()) {
            if overlaps(&a, &b, OverlapPolicy::Strict) {
                prop_assert!(overlaps(&a, &b, OverlapPolicy::Inclusive));
            }
        }
    }
}

//! Toroidal field geometry
//!
//! The arena wraps on both axes, so the "true" displacement between two points
//! is the shortest one through the seam. Every distance, direction and normal
//! in the simulation goes through [`Field::delta`]; a plain `b - a` is wrong
//! near the edges.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Signed shortest displacement from `a` to `b` on a circular axis of length
/// `span`, in `(-span/2, span/2]`.
#[inline]
pub fn wrap_delta(a: f32, b: f32, span: f32) -> f32 {
    let d = (b - a).rem_euclid(span);
    if d > span / 2.0 { d - span } else { d }
}

/// Reduce a coordinate into `[0, span)`
#[inline]
pub fn wrap_coord(x: f32, span: f32) -> f32 {
    let w = x.rem_euclid(span);
    // rem_euclid can round up to exactly `span` for tiny negative inputs
    if w >= span { 0.0 } else { w }
}

/// The wrap-around arena
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub width: f32,
    pub height: f32,
}

impl Field {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Reduce a point into the canonical rectangle `[0,W) x [0,H)`
    #[inline]
    pub fn wrap_position(&self, p: Vec2) -> Vec2 {
        Vec2::new(wrap_coord(p.x, self.width), wrap_coord(p.y, self.height))
    }

    /// Shortest displacement from `a` to `b` through the seams
    #[inline]
    pub fn delta(&self, a: Vec2, b: Vec2) -> Vec2 {
        Vec2::new(
            wrap_delta(a.x, b.x, self.width),
            wrap_delta(a.y, b.y, self.height),
        )
    }

    /// Wrapped distance between two points
    #[inline]
    pub fn distance(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length()
    }

    /// Point half-way along the shortest wrapped path from `a` to `b`
    pub fn midpoint(&self, a: Vec2, b: Vec2) -> Vec2 {
        self.wrap_position(a + 0.5 * self.delta(a, b))
    }

    /// Field centre
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether `p` lies inside an axis-aligned window of `size` centred on
    /// `center`, measured through the seams
    pub fn in_window(&self, center: Vec2, size: Vec2, p: Vec2) -> bool {
        let d = self.delta(center, p);
        d.x.abs() <= size.x / 2.0 && d.y.abs() <= size.y / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_delta_through_seam() {
        let field = Field::new(1000.0, 800.0);
        let d = field.delta(Vec2::new(990.0, 5.0), Vec2::new(10.0, 795.0));
        assert!((d.x - 20.0).abs() < 1e-4);
        assert!((d.y - (-10.0)).abs() < 1e-4);
    }

    #[test]
    fn test_delta_half_span_is_positive() {
        // Exactly half a span lands on the closed end of (-S/2, S/2]
        assert_eq!(wrap_delta(0.0, 500.0, 1000.0), 500.0);
        assert_eq!(wrap_delta(500.0, 0.0, 1000.0), 500.0);
    }

    #[test]
    fn test_wrap_position_negative() {
        let field = Field::new(1000.0, 800.0);
        let p = field.wrap_position(Vec2::new(-10.0, 810.0));
        assert!((p.x - 990.0).abs() < 1e-4);
        assert!((p.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_midpoint_across_seam() {
        let field = Field::new(1000.0, 1000.0);
        let m = field.midpoint(Vec2::new(980.0, 500.0), Vec2::new(40.0, 500.0));
        assert!((m.x - 10.0).abs() < 1e-3);
        assert!((m.y - 500.0).abs() < 1e-3);
    }

    #[test]
    fn test_in_window_wraps() {
        let field = Field::new(1000.0, 1000.0);
        let size = Vec2::new(200.0, 200.0);
        assert!(field.in_window(Vec2::new(980.0, 980.0), size, Vec2::new(50.0, 50.0)));
        assert!(!field.in_window(Vec2::new(500.0, 500.0), size, Vec2::new(50.0, 50.0)));
    }

    proptest! {
        #[test]
        fn prop_wrap_delta_bounded(a in -5000.0f32..5000.0, b in -5000.0f32..5000.0, span in 1.0f32..4000.0) {
            let d = wrap_delta(a, b, span);
            prop_assert!(d.abs() <= span / 2.0 + span * 1e-5);
        }

        #[test]
        fn prop_wrap_delta_lands_on_target(a in 0.0f32..3000.0, b in 0.0f32..3000.0, span in 100.0f32..3000.0) {
            let d = wrap_delta(a, b, span);
            let landed = wrap_coord(a + d, span);
            let target = wrap_coord(b, span);
            let err = wrap_delta(landed, target, span).abs();
            prop_assert!(err < 1e-2, "landed {} target {}", landed, target);
        }

        #[test]
        fn prop_wrap_position_in_bounds(x in -1.0e5f32..1.0e5, y in -1.0e5f32..1.0e5) {
            let field = Field::new(3000.0, 2000.0);
            let p = field.wrap_position(Vec2::new(x, y));
            prop_assert!(p.x >= 0.0 && p.x < 3000.0);
            prop_assert!(p.y >= 0.0 && p.y < 2000.0);
        }
    }
}

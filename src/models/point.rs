//! Two-dimensional point used for pivots, corners and offsets.

use serde::{Deserialize, Serialize};

/// A point (or offset) in either unit space or pixel space.
///
/// The coordinate space is decided by the caller; geometry functions that
/// convert between spaces take an explicit unit-to-pixel scale.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate (grows to the right)
    pub x: f64,
    /// Vertical coordinate (grows downwards)
    pub y: f64,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this point translated by `(dx, dy)`.
    #[must_use]
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns this point with both coordinates multiplied by `factor`.
    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Offset that moves `self` onto `target`.
    #[must_use]
    pub fn offset_to(self, target: Self) -> Self {
        Self::new(target.x - self.x, target.y - self.y)
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Rotates this point by `degrees` (clockwise in screen space) about `pivot`.
    #[must_use]
    pub fn rotated_about(self, pivot: Self, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - pivot.x;
        let dy = self.y - pivot.y;
        Self::new(
            pivot.x + dx * cos - dy * sin,
            pivot.y + dx * sin + dy * cos,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_point_translate_and_scale() {
        let p = Point::new(1.0, 2.0).translated(0.5, -1.0).scaled(2.0);
        assert_eq!(p, Point::new(3.0, 2.0));
    }

    #[test]
    fn test_point_offset_and_distance() {
        let a = Point::new(1.0, 1.0);
        let b = Point::new(4.0, 5.0);
        assert_eq!(a.offset_to(b), Point::new(3.0, 4.0));
        assert!((a.distance_to(b) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_point_rotation_quarter_turn() {
        // Clockwise in screen space: +x axis rotates onto +y axis
        let p = Point::new(1.0, 0.0).rotated_about(Point::default(), 90.0);
        assert!(p.x.abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_point_rotation_about_pivot() {
        let pivot = Point::new(2.0, 2.0);
        let p = Point::new(3.0, 2.0).rotated_about(pivot, 180.0);
        assert!((p.x - 1.0).abs() < EPS);
        assert!((p.y - 2.0).abs() < EPS);
    }
}

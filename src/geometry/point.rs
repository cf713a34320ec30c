//! Point types.
//!
//! [`Point`] is the workhorse of the 2D pipeline: integer coordinates scaled
//! by [`crate::SCALING_FACTOR`] so polygon algebra stays exact. [`PointF`]
//! and [`Point3F`] carry unscaled millimeters where floating point is the
//! natural representation (flow math, mesh vertices).

use crate::{scale, unscale, Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point in scaled integer coordinates (1 unit = 1 nm).
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

impl Point {
    #[inline]
    pub const fn new(x: Coord, y: Coord) -> Self {
        Self { x, y }
    }

    /// Build a point from millimeter coordinates.
    #[inline]
    pub fn new_scale(x: CoordF, y: CoordF) -> Self {
        Self {
            x: scale(x),
            y: scale(y),
        }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Unscale to millimeters.
    #[inline]
    pub fn to_f64(&self) -> PointF {
        PointF {
            x: unscale(self.x),
            y: unscale(self.y),
        }
    }

    /// Squared distance to another point. i128 to survive nm-scale squares.
    #[inline]
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (other.x - self.x) as i128;
        let dy = (other.y - self.y) as i128;
        dx * dx + dy * dy
    }

    #[inline]
    pub fn distance(&self, other: &Point) -> CoordF {
        (self.distance_squared(other) as CoordF).sqrt()
    }

    /// Rotate about the origin by `angle` radians.
    #[inline]
    pub fn rotated(&self, angle: CoordF) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        let x = self.x as CoordF;
        let y = self.y as CoordF;
        Self {
            x: (cos_a * x - sin_a * y).round() as Coord,
            y: (sin_a * x + cos_a * y).round() as Coord,
        }
    }

    /// True when the two points are within `tolerance` on both axes.
    #[inline]
    pub fn coincides_with(&self, other: &Point, tolerance: Coord) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }

    /// Cross product of `(b - self)` and `(c - self)`.
    #[inline]
    pub fn cross(&self, b: &Point, c: &Point) -> i128 {
        let abx = (b.x - self.x) as i128;
        let aby = (b.y - self.y) as i128;
        let acx = (c.x - self.x) as i128;
        let acy = (c.y - self.y) as i128;
        abx * acy - aby * acx
    }
}

impl Add for Point {
    type Output = Point;
    #[inline]
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Point {
    #[inline]
    fn add_assign(&mut self, rhs: Point) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Point {
    type Output = Point;
    #[inline]
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Point {
    #[inline]
    fn sub_assign(&mut self, rhs: Point) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Point {
    type Output = Point;
    #[inline]
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl Mul<CoordF> for Point {
    type Output = Point;
    #[inline]
    fn mul(self, rhs: CoordF) -> Point {
        Point::new(
            (self.x as CoordF * rhs).round() as Coord,
            (self.y as CoordF * rhs).round() as Coord,
        )
    }
}

impl fmt::Debug for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.to_f64();
        write!(f, "({:.3}mm, {:.3}mm)", p.x, p.y)
    }
}

/// A 2D point in millimeters.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PointF {
    pub x: CoordF,
    pub y: CoordF,
}

impl PointF {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF) -> Self {
        Self { x, y }
    }

    /// Scale to integer coordinates.
    #[inline]
    pub fn to_scaled(&self) -> Point {
        Point::new(scale(self.x), scale(self.y))
    }

    #[inline]
    pub fn length(&self) -> CoordF {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

impl fmt::Debug for PointF {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.x, self.y)
    }
}

/// A 3D point in millimeters. Lives on the mesh side of the pipeline only.
#[derive(Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3F {
    pub x: CoordF,
    pub y: CoordF,
    pub z: CoordF,
}

impl Point3F {
    #[inline]
    pub const fn new(x: CoordF, y: CoordF, z: CoordF) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Debug for Point3F {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3}, {:.3})", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_arithmetic() {
        let a = Point::new(3, 4);
        let b = Point::new(1, 2);
        assert_eq!(a + b, Point::new(4, 6));
        assert_eq!(a - b, Point::new(2, 2));
        assert_eq!(-a, Point::new(-3, -4));
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0, 0);
        let b = Point::new(3, 4);
        assert_eq!(a.distance_squared(&b), 25);
        assert!((a.distance(&b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_point_new_scale() {
        let p = Point::new_scale(1.5, -0.5);
        assert_eq!(p, Point::new(1_500_000, -500_000));
        let f = p.to_f64();
        assert!((f.x - 1.5).abs() < 1e-9 && (f.y + 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_point_rotated() {
        let p = Point::new(1_000_000, 0);
        let r = p.rotated(std::f64::consts::FRAC_PI_2);
        assert!(r.x.abs() < 10);
        assert!((r.y - 1_000_000).abs() < 10);
    }

    #[test]
    fn test_point_coincides_with() {
        let a = Point::new(100, 100);
        assert!(a.coincides_with(&Point::new(101, 99), 1));
        assert!(!a.coincides_with(&Point::new(103, 100), 1));
    }

    #[test]
    fn test_cross_orientation() {
        let o = Point::new(0, 0);
        // CCW turn has positive cross product
        assert!(o.cross(&Point::new(10, 0), &Point::new(10, 10)) > 0);
        assert!(o.cross(&Point::new(10, 0), &Point::new(10, -10)) < 0);
    }
}

//! Line segments in scaled coordinates.

use super::Point;
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D line segment between two scaled-coordinate points.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Line {
    pub a: Point,
    pub b: Point,
}

impl Line {
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    #[inline]
    pub fn length(&self) -> CoordF {
        self.a.distance(&self.b)
    }

    #[inline]
    pub fn midpoint(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2, (self.a.y + self.b.y) / 2)
    }

    /// Project `p` onto the segment, clamped to the endpoints.
    pub fn project_point(&self, p: &Point) -> Point {
        let dx = (self.b.x - self.a.x) as CoordF;
        let dy = (self.b.y - self.a.y) as CoordF;
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return self.a;
        }
        let t = (((p.x - self.a.x) as CoordF * dx + (p.y - self.a.y) as CoordF * dy) / len_sq)
            .clamp(0.0, 1.0);
        Point::new(
            (self.a.x as CoordF + t * dx).round() as Coord,
            (self.a.y as CoordF + t * dy).round() as Coord,
        )
    }

    /// Distance from `p` to the closest point on the segment.
    #[inline]
    pub fn distance_to_point(&self, p: &Point) -> CoordF {
        p.distance(&self.project_point(p))
    }

    /// True when `p` lies on the segment within `tolerance`.
    #[inline]
    pub fn contains_point(&self, p: &Point, tolerance: Coord) -> bool {
        self.distance_to_point(p) <= tolerance as CoordF
    }
}

impl fmt::Debug for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line({:?} -> {:?})", self.a, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_length() {
        let l = Line::new(Point::new(0, 0), Point::new(30, 40));
        assert!((l.length() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_point_interior() {
        let l = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert_eq!(l.project_point(&Point::new(40, 30)), Point::new(40, 0));
    }

    #[test]
    fn test_project_point_clamped() {
        let l = Line::new(Point::new(0, 0), Point::new(100, 0));
        assert_eq!(l.project_point(&Point::new(-50, 10)), Point::new(0, 0));
        assert_eq!(l.project_point(&Point::new(150, 10)), Point::new(100, 0));
    }

    #[test]
    fn test_contains_point() {
        let l = Line::new(Point::new(0, 0), Point::new(100, 100));
        assert!(l.contains_point(&Point::new(50, 50), 1));
        assert!(!l.contains_point(&Point::new(50, 60), 5));
    }
}

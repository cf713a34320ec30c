//! Closed contours.

use super::{BoundingBox, Line, Point, Polyline};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

/// A closed polygon. The closing edge from the last point back to the first
/// is implicit; the closing point is never stored.
///
/// Orientation is meaningful: counter-clockwise contours enclose area,
/// clockwise contours describe holes.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    #[inline]
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    #[inline]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    #[inline]
    pub fn points_mut(&mut self) -> &mut Vec<Point> {
        &mut self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn push(&mut self, p: Point) {
        self.points.push(p);
    }

    /// Edge from point `i` to point `i+1` (wrapping).
    #[inline]
    pub fn edge(&self, i: usize) -> Line {
        let n = self.points.len();
        Line::new(self.points[i % n], self.points[(i + 1) % n])
    }

    /// All edges, including the implicit closing edge.
    pub fn edges(&self) -> Vec<Line> {
        if self.points.len() < 2 {
            return Vec::new();
        }
        (0..self.points.len()).map(|i| self.edge(i)).collect()
    }

    /// Shoelace signed area: positive for counter-clockwise.
    pub fn signed_area(&self) -> CoordF {
        if self.points.len() < 3 {
            return 0.0;
        }
        let mut sum: i128 = 0;
        for i in 0..self.points.len() {
            let j = (i + 1) % self.points.len();
            sum += self.points[i].x as i128 * self.points[j].y as i128;
            sum -= self.points[j].x as i128 * self.points[i].y as i128;
        }
        sum as CoordF / 2.0
    }

    #[inline]
    pub fn area(&self) -> CoordF {
        self.signed_area().abs()
    }

    #[inline]
    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    #[inline]
    pub fn is_clockwise(&self) -> bool {
        self.signed_area() < 0.0
    }

    pub fn make_counter_clockwise(&mut self) {
        if self.is_clockwise() {
            self.reverse();
        }
    }

    pub fn make_clockwise(&mut self) {
        if self.is_counter_clockwise() {
            self.reverse();
        }
    }

    #[inline]
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    pub fn perimeter(&self) -> CoordF {
        if self.points.len() < 2 {
            return 0.0;
        }
        (0..self.points.len()).map(|i| self.edge(i).length()).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.points)
    }

    /// Ray-casting point-in-polygon test. Boundary points are not guaranteed
    /// either way; callers needing the boundary use [`Self::is_point_on_boundary`].
    pub fn contains_point(&self, p: &Point) -> bool {
        if self.points.len() < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = self.points.len() - 1;
        for i in 0..self.points.len() {
            let pi = &self.points[i];
            let pj = &self.points[j];
            if ((pi.y > p.y) != (pj.y > p.y))
                && (p.x as i128)
                    < (pj.x as i128 - pi.x as i128) * (p.y as i128 - pi.y as i128)
                        / (pj.y as i128 - pi.y as i128)
                        + pi.x as i128
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn is_point_on_boundary(&self, p: &Point, tolerance: Coord) -> bool {
        self.edges().iter().any(|e| e.contains_point(p, tolerance))
    }

    /// Translate every point by `v`.
    pub fn translate(&mut self, v: Point) {
        for p in &mut self.points {
            *p += v;
        }
    }

    /// Rotate about the origin by `angle` radians.
    pub fn rotate(&mut self, angle: CoordF) {
        for p in &mut self.points {
            *p = p.rotated(angle);
        }
    }

    /// Drop duplicate and near-collinear points within `tolerance`.
    pub fn simplify(&mut self, tolerance: Coord) {
        if self.points.len() < 3 {
            return;
        }
        let mut kept = Vec::with_capacity(self.points.len());
        let n = self.points.len();
        for i in 0..n {
            let prev = self.points[(i + n - 1) % n];
            let curr = self.points[i];
            let next = self.points[(i + 1) % n];
            if curr.coincides_with(&next, tolerance) {
                continue;
            }
            if Line::new(prev, next).distance_to_point(&curr) > tolerance as CoordF {
                kept.push(curr);
            }
        }
        self.points = kept;
    }

    /// A polygon is valid with three or more points enclosing area.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 3 && self.signed_area().abs() > 0.0
    }

    /// Closed polyline form, with the first point repeated at the end.
    pub fn to_closed_polyline(&self) -> Polyline {
        let mut points = self.points.clone();
        if let Some(&first) = points.first() {
            points.push(first);
        }
        Polyline::from_points(points)
    }

    /// Axis-aligned rectangle spanning `min`..`max`, counter-clockwise.
    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::from_points(vec![
            min,
            Point::new(max.x, min.y),
            max,
            Point::new(min.x, max.y),
        ])
    }

    /// Regular-polygon approximation of a circle, counter-clockwise.
    pub fn circle(center: Point, radius: Coord, segments: usize) -> Self {
        let n = segments.max(3);
        let points = (0..n)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * i as CoordF / n as CoordF;
                Point::new(
                    center.x + (radius as CoordF * a.cos()).round() as Coord,
                    center.y + (radius as CoordF * a.sin()).round() as Coord,
                )
            })
            .collect();
        Self::from_points(points)
    }
}

impl Index<usize> for Polygon {
    type Output = Point;
    #[inline]
    fn index(&self, i: usize) -> &Point {
        &self.points[i]
    }
}

impl fmt::Debug for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon({} points)", self.points.len())
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polygon[{} pts, area {:.0}]", self.points.len(), self.area())
    }
}

impl From<Vec<Point>> for Polygon {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::rectangle(Point::new(0, 0), Point::new(100, 100))
    }

    #[test]
    fn test_polygon_area_and_orientation() {
        let sq = unit_square();
        assert!((sq.signed_area() - 10_000.0).abs() < 1e-9);
        assert!(sq.is_counter_clockwise());

        let mut rev = sq.clone();
        rev.reverse();
        assert!(rev.is_clockwise());
        assert!((rev.area() - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_make_counter_clockwise() {
        let mut sq = unit_square();
        sq.make_clockwise();
        assert!(sq.is_clockwise());
        sq.make_counter_clockwise();
        assert!(sq.is_counter_clockwise());
    }

    #[test]
    fn test_polygon_perimeter() {
        assert!((unit_square().perimeter() - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_contains_point() {
        let sq = unit_square();
        assert!(sq.contains_point(&Point::new(50, 50)));
        assert!(!sq.contains_point(&Point::new(150, 50)));
        assert!(!sq.contains_point(&Point::new(-1, 50)));
    }

    #[test]
    fn test_polygon_simplify_collinear() {
        let mut p = Polygon::from_points(vec![
            Point::new(0, 0),
            Point::new(50, 0), // collinear
            Point::new(100, 0),
            Point::new(100, 100),
            Point::new(0, 100),
        ]);
        p.simplify(1);
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_polygon_circle() {
        let c = Polygon::circle(Point::zero(), 1_000_000, 64);
        assert_eq!(c.len(), 64);
        assert!(c.is_counter_clockwise());
        let expected = std::f64::consts::PI * 1e12;
        assert!((c.area() - expected).abs() / expected < 0.01);
    }

    #[test]
    fn test_polygon_rectangle_valid() {
        assert!(unit_square().is_valid());
        assert!(!Polygon::from_points(vec![Point::new(0, 0), Point::new(1, 1)]).is_valid());
    }
}

//! Open paths.
//!
//! Polylines carry extrusion centerlines through the pipeline: thin fills,
//! thin walls and the clipped fill patterns emitted for support material.

use super::Point;
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An open path of scaled-coordinate points.
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

/// A collection of polylines.
pub type Polylines = Vec<Polyline>;

impl Polyline {
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

    /// First point, if any.
    #[inline]
    pub fn first_point(&self) -> Option<Point> {
        self.points.first().copied()
    }

    /// Last point, if any.
    #[inline]
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// True when the first point repeats at the end.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    /// Total path length.
    pub fn length(&self) -> CoordF {
        self.points
            .windows(2)
            .map(|w| w[0].distance(&w[1]))
            .sum()
    }

    /// Reverse the point order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// True when the polyline has at least one segment.
    pub fn is_valid(&self) -> bool {
        self.points.len() >= 2
    }
}

impl fmt::Debug for Polyline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Polyline({} points)", self.points.len())
    }
}

impl From<Vec<Point>> for Polyline {
    fn from(points: Vec<Point>) -> Self {
        Self::from_points(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polyline_length() {
        let pl = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(100, 100),
        ]);
        assert!((pl.length() - 200.0).abs() < 1e-9);
        assert!(pl.is_valid());
        assert!(!pl.is_closed());
    }

    #[test]
    fn test_polyline_closed() {
        let pl = Polyline::from_points(vec![
            Point::new(0, 0),
            Point::new(100, 0),
            Point::new(0, 100),
            Point::new(0, 0),
        ]);
        assert!(pl.is_closed());
    }

    #[test]
    fn test_polyline_endpoints() {
        let mut pl = Polyline::new();
        assert_eq!(pl.first_point(), None);
        pl.push(Point::new(1, 2));
        pl.push(Point::new(3, 4));
        assert_eq!(pl.first_point(), Some(Point::new(1, 2)));
        assert_eq!(pl.last_point(), Some(Point::new(3, 4)));
        pl.reverse();
        assert_eq!(pl.first_point(), Some(Point::new(3, 4)));
    }
}

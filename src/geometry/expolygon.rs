//! Polygons with holes.

use super::{BoundingBox, Point, Polygon, Polyline};
use crate::{Coord, CoordF};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 2D region: one outer contour plus zero or more hole contours.
///
/// Canonical orientation is a counter-clockwise contour with clockwise
/// holes. The clipper module returns expolygons in canonical form; code
/// assembling them by hand calls [`ExPolygon::make_canonical`].
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExPolygon {
    pub contour: Polygon,
    pub holes: Vec<Polygon>,
}

/// A set of expolygons, the universal currency of the layer pipeline.
pub type ExPolygons = Vec<ExPolygon>;

impl ExPolygon {
    #[inline]
    pub fn new(contour: Polygon) -> Self {
        Self {
            contour,
            holes: Vec::new(),
        }
    }

    #[inline]
    pub fn with_holes(contour: Polygon, holes: Vec<Polygon>) -> Self {
        Self { contour, holes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.contour.is_empty()
    }

    #[inline]
    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    #[inline]
    pub fn add_hole(&mut self, hole: Polygon) {
        self.holes.push(hole);
    }

    /// Contour area minus hole areas.
    pub fn area(&self) -> CoordF {
        let holes: CoordF = self.holes.iter().map(|h| h.area()).sum();
        self.contour.area() - holes
    }

    pub fn perimeter(&self) -> CoordF {
        self.contour.perimeter() + self.holes.iter().map(|h| h.perimeter()).sum::<CoordF>()
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }

    /// Inside the contour and outside every hole.
    pub fn contains_point(&self, p: &Point) -> bool {
        self.contour.contains_point(p) && !self.holes.iter().any(|h| h.contains_point(p))
    }

    /// Force contour CCW and holes CW.
    pub fn make_canonical(&mut self) {
        self.contour.make_counter_clockwise();
        for hole in &mut self.holes {
            hole.make_clockwise();
        }
    }

    pub fn translate(&mut self, v: Point) {
        self.contour.translate(v);
        for hole in &mut self.holes {
            hole.translate(v);
        }
    }

    pub fn rotate(&mut self, angle: CoordF) {
        self.contour.rotate(angle);
        for hole in &mut self.holes {
            hole.rotate(angle);
        }
    }

    /// Simplify every ring and drop degenerate holes.
    pub fn simplify(&mut self, tolerance: Coord) {
        self.contour.simplify(tolerance);
        for hole in &mut self.holes {
            hole.simplify(tolerance);
        }
        self.holes.retain(|h| h.len() >= 3);
    }

    pub fn is_valid(&self) -> bool {
        self.contour.is_valid() && self.holes.iter().all(|h| h.is_valid())
    }

    /// Contour plus holes as plain polygons.
    pub fn to_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::with_capacity(1 + self.holes.len());
        out.push(self.contour.clone());
        out.extend(self.holes.iter().cloned());
        out
    }

    /// Every ring as a closed polyline.
    pub fn to_polylines(&self) -> Vec<Polyline> {
        let mut out = Vec::with_capacity(1 + self.holes.len());
        out.push(self.contour.to_closed_polyline());
        out.extend(self.holes.iter().map(|h| h.to_closed_polyline()));
        out
    }

    pub fn rectangle(min: Point, max: Point) -> Self {
        Self::new(Polygon::rectangle(min, max))
    }
}

impl fmt::Debug for ExPolygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExPolygon({} contour pts, {} holes)",
            self.contour.len(),
            self.holes.len()
        )
    }
}

impl From<Polygon> for ExPolygon {
    fn from(contour: Polygon) -> Self {
        Self::new(contour)
    }
}

/// Sum of areas over a set of expolygons.
pub fn expolygons_area(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|e| e.area()).sum()
}

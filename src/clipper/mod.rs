//! Polygon set algebra.
//!
//! Thin bridge over the geo-clipper engine exposing the operations the layer
//! pipeline is written in terms of: `union_ex`, `intersection_ex`, `diff_ex`,
//! `offset_ex` and friends. Geometry crosses into the engine as
//! floating-point millimeters and comes back rounded onto the scaled-integer
//! grid; every result is returned in canonical orientation.
//!
//! The engine carries per-call state only, so these functions are safe to
//! invoke from parallel workers without sharing a context.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon, Polyline, Polylines};
use crate::{scale, unscale, Coord, CoordF};
use geo::{Coord as GeoCoord, LineString, MultiPolygon, Polygon as GeoPolygon};
use geo_clipper::{Clipper, EndType, JoinType};

/// Precision factor handed to the clipper engine for its internal
/// fixed-point representation.
const CLIPPER_PRECISION: f64 = 1000.0;

/// Corner treatment for offset operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetJoin {
    /// Mitered corners, the default for slice geometry.
    #[default]
    Miter,
    /// Rounded corners, used where growth must not overshoot spikes.
    Round,
    /// Squared-off corners.
    Square,
}

impl From<OffsetJoin> for JoinType {
    fn from(j: OffsetJoin) -> Self {
        match j {
            OffsetJoin::Miter => JoinType::Miter(2.0),
            OffsetJoin::Round => JoinType::Round(0.25),
            OffsetJoin::Square => JoinType::Square,
        }
    }
}

fn ring_to_geo(poly: &Polygon) -> LineString<f64> {
    let mut ring: Vec<GeoCoord<f64>> = poly
        .points()
        .iter()
        .map(|p| GeoCoord {
            x: unscale(p.x),
            y: unscale(p.y),
        })
        .collect();
    if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
        if first != last {
            ring.push(first);
        }
    }
    LineString::new(ring)
}

fn expolygon_to_geo(expoly: &ExPolygon) -> GeoPolygon<f64> {
    GeoPolygon::new(
        ring_to_geo(&expoly.contour),
        expoly.holes.iter().map(ring_to_geo).collect(),
    )
}

fn expolygons_to_geo(expolys: &[ExPolygon]) -> MultiPolygon<f64> {
    MultiPolygon::new(expolys.iter().map(expolygon_to_geo).collect())
}

fn ring_from_geo(ring: &LineString<f64>) -> Polygon {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(scale(c.x), scale(c.y)))
        .collect();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    Polygon::from_points(points)
}

fn expolygons_from_geo(multi: &MultiPolygon<f64>) -> ExPolygons {
    multi
        .0
        .iter()
        .map(|gp| {
            let mut expoly = ExPolygon::with_holes(
                ring_from_geo(gp.exterior()),
                gp.interiors().iter().map(ring_from_geo).collect(),
            );
            expoly.make_canonical();
            expoly
        })
        .filter(|e| e.contour.len() >= 3)
        .collect()
}

/// Union of one set of possibly overlapping expolygons.
pub fn union_ex(expolygons: &[ExPolygon]) -> ExPolygons {
    match expolygons.len() {
        0 => Vec::new(),
        1 => expolygons.to_vec(),
        _ => {
            // One engine call over the whole set; clipper resolves the
            // overlaps in a single sweep.
            let (first, rest) = expolygons.split_at(1);
            let subject = expolygons_to_geo(first);
            let clip = expolygons_to_geo(rest);
            expolygons_from_geo(&subject.union(&clip, CLIPPER_PRECISION))
        }
    }
}

/// Union of two sets.
pub fn union2_ex(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return union_ex(clip);
    }
    if clip.is_empty() {
        return union_ex(subject);
    }
    let result = expolygons_to_geo(subject).union(&expolygons_to_geo(clip), CLIPPER_PRECISION);
    expolygons_from_geo(&result)
}

/// `subject ∩ clip`.
pub fn intersection_ex(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() || clip.is_empty() {
        return Vec::new();
    }
    let result =
        expolygons_to_geo(subject).intersection(&expolygons_to_geo(clip), CLIPPER_PRECISION);
    expolygons_from_geo(&result)
}

/// `subject − clip`.
pub fn diff_ex(subject: &[ExPolygon], clip: &[ExPolygon]) -> ExPolygons {
    if subject.is_empty() {
        return Vec::new();
    }
    if clip.is_empty() {
        return subject.to_vec();
    }
    let result =
        expolygons_to_geo(subject).difference(&expolygons_to_geo(clip), CLIPPER_PRECISION);
    expolygons_from_geo(&result)
}

/// Offset by `delta` millimeters; positive grows, negative shrinks.
pub fn offset_ex(expolygons: &[ExPolygon], delta: CoordF, join: OffsetJoin) -> ExPolygons {
    if expolygons.is_empty() {
        return Vec::new();
    }
    let result = expolygons_to_geo(expolygons).offset(
        delta,
        join.into(),
        EndType::ClosedPolygon,
        CLIPPER_PRECISION,
    );
    expolygons_from_geo(&result)
}

/// Grow by `|delta|` millimeters with mitered corners.
#[inline]
pub fn grow(expolygons: &[ExPolygon], delta: CoordF) -> ExPolygons {
    offset_ex(expolygons, delta.abs(), OffsetJoin::Miter)
}

/// Shrink by `|delta|` millimeters with mitered corners.
#[inline]
pub fn shrink(expolygons: &[ExPolygon], delta: CoordF) -> ExPolygons {
    offset_ex(expolygons, -delta.abs(), OffsetJoin::Miter)
}

/// Simplify each expolygon and drop those below `min_area` (mm²).
pub fn simplify_ex(expolygons: &[ExPolygon], tolerance: CoordF, min_area: CoordF) -> ExPolygons {
    let scaled_min = min_area * crate::SCALING_FACTOR * crate::SCALING_FACTOR;
    expolygons
        .iter()
        .map(|e| {
            let mut out = e.clone();
            out.simplify(scale(tolerance));
            out
        })
        .filter(|e| e.contour.len() >= 3 && e.area() > scaled_min)
        .collect()
}

/// Drop expolygons whose area is below `min_area` (mm²).
pub fn discard_small(expolygons: ExPolygons, min_area: CoordF) -> ExPolygons {
    let scaled_min = min_area * crate::SCALING_FACTOR * crate::SCALING_FACTOR;
    expolygons
        .into_iter()
        .filter(|e| e.area() > scaled_min)
        .collect()
}

/// Total area in mm².
pub fn area_mm2(expolygons: &[ExPolygon]) -> CoordF {
    expolygons.iter().map(|e| e.area()).sum::<CoordF>()
        / (crate::SCALING_FACTOR * crate::SCALING_FACTOR)
}

/// True when the two sets overlap with non-zero area.
pub fn overlaps(a: &[ExPolygon], b: &[ExPolygon]) -> bool {
    !intersection_ex(a, b).is_empty()
}

// --- polyline clipping -----------------------------------------------------

/// Parametric positions where the segment `a -> b` crosses any ring edge of
/// the clip set.
fn segment_crossings(a: Point, b: Point, clip: &[ExPolygon]) -> Vec<CoordF> {
    let mut ts = Vec::new();
    let dx = (b.x - a.x) as CoordF;
    let dy = (b.y - a.y) as CoordF;
    for expoly in clip {
        for ring in std::iter::once(&expoly.contour).chain(expoly.holes.iter()) {
            let pts = ring.points();
            let n = pts.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let c = pts[i];
                let d = pts[(i + 1) % n];
                let ex = (d.x - c.x) as CoordF;
                let ey = (d.y - c.y) as CoordF;
                let denom = dx * ey - dy * ex;
                if denom == 0.0 {
                    continue;
                }
                let t = (((c.x - a.x) as CoordF) * ey - ((c.y - a.y) as CoordF) * ex) / denom;
                let u = (((c.x - a.x) as CoordF) * dy - ((c.y - a.y) as CoordF) * dx) / denom;
                if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
                    ts.push(t);
                }
            }
        }
    }
    ts
}

fn point_at(a: Point, b: Point, t: CoordF) -> Point {
    Point::new(
        (a.x as CoordF + (b.x - a.x) as CoordF * t).round() as Coord,
        (a.y as CoordF + (b.y - a.y) as CoordF * t).round() as Coord,
    )
}

fn point_in_any(p: Point, clip: &[ExPolygon]) -> bool {
    clip.iter().any(|e| e.contains_point(&p))
}

/// Clip open polylines to the interior of `clip`, splitting them wherever
/// they leave the region. Consecutive kept pieces are stitched back together
/// when their endpoints touch.
pub fn clip_polylines(polylines: &[Polyline], clip: &[ExPolygon]) -> Polylines {
    if polylines.is_empty() || clip.is_empty() {
        return Vec::new();
    }

    let stitch_tolerance: Coord = 10;
    let mut out: Polylines = Vec::new();

    for polyline in polylines {
        let pts = polyline.points();
        let mut current: Vec<Point> = Vec::new();

        for w in pts.windows(2) {
            let (a, b) = (w[0], w[1]);
            let mut ts = segment_crossings(a, b, clip);
            ts.push(0.0);
            ts.push(1.0);
            ts.sort_by(|x, y| x.total_cmp(y));
            ts.dedup_by(|x, y| (*x - *y).abs() < 1e-12);

            for pair in ts.windows(2) {
                let (t0, t1) = (pair[0], pair[1]);
                if t1 - t0 < 1e-12 {
                    continue;
                }
                let mid = point_at(a, b, (t0 + t1) / 2.0);
                if !point_in_any(mid, clip) {
                    if current.len() >= 2 {
                        out.push(Polyline::from_points(std::mem::take(&mut current)));
                    } else {
                        current.clear();
                    }
                    continue;
                }
                let p0 = point_at(a, b, t0);
                let p1 = point_at(a, b, t1);
                match current.last() {
                    Some(last) if last.coincides_with(&p0, stitch_tolerance) => {
                        current.push(p1);
                    }
                    Some(_) => {
                        if current.len() >= 2 {
                            out.push(Polyline::from_points(std::mem::take(&mut current)));
                        }
                        current = vec![p0, p1];
                    }
                    None => {
                        current = vec![p0, p1];
                    }
                }
            }
        }

        if current.len() >= 2 {
            out.push(Polyline::from_points(current));
        }
    }

    out
}

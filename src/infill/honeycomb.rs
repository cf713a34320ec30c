//! Honeycomb fill.

use super::{line_spacing_for, Filler};
use crate::clipper;
use crate::geometry::{Point, Polyline, Polylines};
use crate::slice::Surface;
use crate::{scale, Coord, CoordF};

/// Hexagon-wall fill built from vertical zigzag columns.
///
/// Each column traces the left or right half of a row of flat-side
/// hexagons; adjacent columns mirror each other so the walls pair up into
/// full cells. Cell size derives from the requested density so the total
/// extruded length matches a rectilinear fill of the same density.
pub struct HoneycombFiller {
    angle: CoordF,
}

impl HoneycombFiller {
    pub fn new() -> Self {
        Self { angle: 0.0 }
    }
}

impl Default for HoneycombFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl Filler for HoneycombFiller {
    fn set_angle(&mut self, angle: CoordF) {
        self.angle = angle;
    }

    fn fill_surface(&self, surface: &Surface, density: CoordF, spacing: CoordF) -> Polylines {
        let Some(line_distance) = line_spacing_for(density, spacing) else {
            return Vec::new();
        };
        // Hexagon side such that column pitch equals the line distance.
        let side = scale(line_distance / 3.0f64.sqrt());
        if side == 0 {
            return Vec::new();
        }

        let mut rotated = surface.expolygon.clone();
        rotated.rotate(-self.angle);
        let bb = rotated.bounding_box();
        if !bb.is_defined() {
            return Vec::new();
        }

        // Vertical zigzag period and horizontal amplitudes.
        let dy = (side as CoordF * 3.0f64.sqrt() / 2.0).round() as Coord;
        let pitch = side * 3 / 2;
        let margin = side;

        let mut raw: Polylines = Vec::new();
        let mut x = bb.min.x - margin;
        let mut column = 0usize;
        while x < bb.max.x + margin {
            let mut points = Vec::new();
            let mut y = bb.min.y - margin;
            let mut toggle = column % 2 == 0;
            while y < bb.max.y + margin {
                let dx = if toggle { 0 } else { side / 2 };
                points.push(Point::new(x + dx, y));
                y += dy;
                toggle = !toggle;
            }
            raw.push(Polyline::from_points(points));
            x += pitch;
            column += 1;
        }

        let mut clipped = clipper::clip_polylines(&raw, std::slice::from_ref(&rotated));
        for line in &mut clipped {
            for p in line.points_mut() {
                *p = p.rotated(self.angle);
            }
        }
        clipped
    }
}

//! Rectilinear and grid fill.

use super::{line_spacing_for, Filler};
use crate::clipper;
use crate::geometry::{ExPolygon, Point, Polyline, Polylines};
use crate::slice::Surface;
use crate::{scale, CoordF};

/// Parallel scanlines at the pattern angle; optionally a second pass
/// rotated 90 degrees (grid).
pub struct RectilinearFiller {
    angle: CoordF,
    crossed: bool,
}

impl RectilinearFiller {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            crossed: false,
        }
    }

    /// Grid variant: two passes at right angles, each carrying half the
    /// requested density.
    pub fn crossed() -> Self {
        Self {
            angle: 0.0,
            crossed: true,
        }
    }
}

impl Default for RectilinearFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl Filler for RectilinearFiller {
    fn set_angle(&mut self, angle: CoordF) {
        self.angle = angle;
    }

    fn fill_surface(&self, surface: &Surface, density: CoordF, spacing: CoordF) -> Polylines {
        if self.crossed {
            let mut lines = scanlines(&surface.expolygon, self.angle, density / 2.0, spacing);
            lines.extend(scanlines(
                &surface.expolygon,
                self.angle + std::f64::consts::FRAC_PI_2,
                density / 2.0,
                spacing,
            ));
            lines
        } else {
            scanlines(&surface.expolygon, self.angle, density, spacing)
        }
    }
}

/// Horizontal scanlines in a frame rotated by `-angle`, clipped to the
/// surface and rotated back.
pub(crate) fn scanlines(
    expolygon: &ExPolygon,
    angle: CoordF,
    density: CoordF,
    spacing: CoordF,
) -> Polylines {
    let Some(step_mm) = line_spacing_for(density, spacing) else {
        return Vec::new();
    };
    let step = scale(step_mm);

    let mut rotated = expolygon.clone();
    rotated.rotate(-angle);
    let bb = rotated.bounding_box();
    if !bb.is_defined() {
        return Vec::new();
    }

    // Overshoot each scanline past the outline so the clip decides the ends.
    let margin = scale(spacing);
    let mut raw: Polylines = Vec::new();
    let mut y = bb.min.y + step / 2;
    while y < bb.max.y {
        raw.push(Polyline::from_points(vec![
            Point::new(bb.min.x - margin, y),
            Point::new(bb.max.x + margin, y),
        ]));
        y += step;
    }

    let mut clipped = clipper::clip_polylines(&raw, std::slice::from_ref(&rotated));
    for line in &mut clipped {
        for p in line.points_mut() {
            *p = p.rotated(angle);
        }
    }
    clipped
}

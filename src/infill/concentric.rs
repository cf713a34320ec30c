//! Concentric fill.

use super::{line_spacing_for, Filler};
use crate::clipper;
use crate::geometry::Polylines;
use crate::slice::Surface;
use crate::CoordF;

/// Inward rings following the surface outline.
pub struct ConcentricFiller;

impl ConcentricFiller {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConcentricFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl Filler for ConcentricFiller {
    /// The pattern follows the outline, so the angle has no effect.
    fn set_angle(&mut self, _angle: CoordF) {}

    fn fill_surface(&self, surface: &Surface, density: CoordF, spacing: CoordF) -> Polylines {
        let Some(step) = line_spacing_for(density, spacing) else {
            return Vec::new();
        };

        let mut rings = Polylines::new();
        let mut interior = clipper::shrink(std::slice::from_ref(&surface.expolygon), spacing / 2.0);
        while !interior.is_empty() {
            for expoly in &interior {
                rings.extend(expoly.to_polylines());
            }
            interior = clipper::shrink(&interior, step);
        }
        rings
    }
}

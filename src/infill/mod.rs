//! Fill pattern generation.
//!
//! A [`Filler`] turns a surface into extrusion centerlines at a requested
//! density. The pipeline uses fillers directly for support material; the
//! typed fill surfaces it produces are filled by the downstream toolpath
//! generator with the same machinery.

mod concentric;
mod honeycomb;
mod rectilinear;

pub use concentric::ConcentricFiller;
pub use honeycomb::HoneycombFiller;
pub use rectilinear::RectilinearFiller;

use crate::config::{InfillPattern, SupportPattern};
use crate::geometry::Polylines;
use crate::slice::Surface;
use crate::CoordF;

/// A fill pattern generator.
///
/// `density` is the fraction of the area to cover (0..=1) and `spacing` the
/// extrusion centerline spacing in mm; together they fix the distance
/// between neighbouring pattern lines at `spacing / density`.
pub trait Filler: Send {
    /// Set the pattern angle in radians.
    fn set_angle(&mut self, angle: CoordF);

    /// Produce centerlines covering `surface` at the given density.
    fn fill_surface(&self, surface: &Surface, density: CoordF, spacing: CoordF) -> Polylines;
}

/// Line distance for a density/spacing pair, guarding degenerate densities.
pub(crate) fn line_spacing_for(density: CoordF, spacing: CoordF) -> Option<CoordF> {
    if density <= 0.0 || spacing <= 0.0 {
        return None;
    }
    Some(spacing / density.min(1.0))
}

/// Filler for an infill pattern.
pub fn filler(pattern: InfillPattern) -> Box<dyn Filler> {
    match pattern {
        InfillPattern::Rectilinear => Box::new(RectilinearFiller::new()),
        InfillPattern::Grid => Box::new(RectilinearFiller::crossed()),
        InfillPattern::Honeycomb => Box::new(HoneycombFiller::new()),
        InfillPattern::Concentric => Box::new(ConcentricFiller::new()),
    }
}

/// Filler for a support pattern. Rectilinear-grid maps onto the plain
/// rectilinear filler; the support generator alternates the extra 90-degree
/// pass across layers itself.
pub fn support_filler(pattern: SupportPattern) -> Box<dyn Filler> {
    match pattern {
        SupportPattern::Rectilinear | SupportPattern::RectilinearGrid => {
            Box::new(RectilinearFiller::new())
        }
        SupportPattern::Honeycomb => Box::new(HoneycombFiller::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point};
    use crate::slice::SurfaceType;

    pub(crate) fn square_surface(size_mm: f64) -> Surface {
        Surface::new(
            ExPolygon::rectangle(Point::zero(), Point::new_scale(size_mm, size_mm)),
            SurfaceType::Internal,
        )
    }

    #[test]
    fn test_line_spacing_for() {
        assert_eq!(line_spacing_for(0.0, 0.45), None);
        assert_eq!(line_spacing_for(0.5, 0.0), None);
        let s = line_spacing_for(0.2, 0.5).unwrap();
        assert!((s - 2.5).abs() < 1e-12);
        // densities above 1 clamp to solid
        let solid = line_spacing_for(2.0, 0.5).unwrap();
        assert!((solid - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_factory_covers_patterns() {
        for pattern in [
            InfillPattern::Rectilinear,
            InfillPattern::Grid,
            InfillPattern::Honeycomb,
            InfillPattern::Concentric,
        ] {
            let f = filler(pattern);
            let lines = f.fill_surface(&square_surface(10.0), 0.4, 0.45);
            assert!(!lines.is_empty(), "{pattern:?} produced no lines");
        }
    }

    #[test]
    fn test_support_factory() {
        for pattern in [
            SupportPattern::Rectilinear,
            SupportPattern::RectilinearGrid,
            SupportPattern::Honeycomb,
        ] {
            let f = support_filler(pattern);
            let lines = f.fill_surface(&square_surface(10.0), 0.2, 0.45);
            assert!(!lines.is_empty(), "{pattern:?} produced no lines");
        }
    }
}

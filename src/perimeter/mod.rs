//! Perimeter generation.
//!
//! Walls are built by offsetting the slice contours inward: the external
//! loop sits half the external flow width inside the outline, each further
//! loop a full perimeter spacing deeper. What the cascade leaves behind
//! becomes the region's fill boundary, which surface typing clips the fill
//! surfaces to.
//!
//! Two side products fall out of the cascade:
//! - **thin walls**: outline features too narrow for even one perimeter
//!   pair, emitted as single-pass medial paths;
//! - **gap fills**: slivers between consecutive loops where the spacing
//!   does not divide the local width evenly.
//!
//! Layers are independent here, so the whole stage fans out over the rayon
//! pool by layer id; each worker rewrites only its own layer.

use crate::clipper::{self, OffsetJoin};
use crate::config::RegionConfig;
use crate::geometry::{ExPolygons, Polygon, Polyline, Polylines};
use crate::slice::{Layer, LayerRegion};
use crate::EPSILON;
use log::debug;
use rayon::prelude::*;

/// Generate perimeters, thin walls and fill boundaries for every region of
/// every layer.
pub fn generate(layers: &mut [Layer], region_configs: &[RegionConfig]) {
    debug!("perimeter generation over {} layers", layers.len());
    layers.par_iter_mut().for_each(|layer| {
        for region in &mut layer.regions {
            if let Some(cfg) = region_configs.get(region.region_id) {
                generate_region(region, cfg);
            }
        }
    });
}

/// Generate one region's perimeters from its slices.
pub fn generate_region(region: &mut LayerRegion, cfg: &RegionConfig) {
    let slices = region.slice_expolygons();
    if slices.is_empty() {
        region.perimeters.clear();
        region.thin_walls.clear();
        region.thin_fills.clear();
        region.fill_boundary.clear();
        return;
    }

    let perimeter_count = cfg.perimeters;
    let detect_gap_fill = cfg.gap_fill_threshold > 0.0;
    let ext_width = region.flows.external_perimeter.width();
    let ext_half = ext_width / 2.0;
    let spacing = region.flows.perimeter.spacing();

    let mut perimeters: Vec<Polygon> = Vec::new();
    let mut thin_fills: Polylines = Vec::new();

    // Features narrower than one external pass cannot host a loop at all;
    // an opening by half the width isolates them.
    let opened = clipper::offset_ex(
        &clipper::offset_ex(&slices, -(ext_half + EPSILON), OffsetJoin::Miter),
        ext_half + EPSILON,
        OffsetJoin::Miter,
    );
    let thin_regions = clipper::diff_ex(&slices, &opened);
    region.thin_walls = medial_paths(&thin_regions);

    // Offset cascade: interior after each loop feeds the next one.
    let mut interior = slices;
    for loop_idx in 0..perimeter_count {
        let inset = if loop_idx == 0 { ext_half } else { spacing };
        let next = clipper::shrink(&interior, inset);
        if next.is_empty() {
            interior = next;
            break;
        }
        // Slivers the next loop no longer covers become single-pass fills;
        // the threshold keeps offset noise out.
        if detect_gap_fill && loop_idx > 0 {
            let covered = clipper::grow(&next, inset);
            let gaps = clipper::diff_ex(&interior, &covered);
            thin_fills.extend(medial_paths(&clipper::discard_small(
                gaps,
                cfg.gap_fill_threshold,
            )));
        }
        for expoly in &next {
            perimeters.extend(expoly.to_polygons());
        }
        interior = next;
    }

    // The fill boundary pulls back half a spacing from the innermost loop
    // so infill overlaps the wall instead of butting against it.
    region.fill_boundary = if perimeter_count == 0 {
        interior
    } else {
        clipper::shrink(&interior, spacing / 2.0)
    };
    region.perimeters = perimeters;
    region.thin_fills = thin_fills;
}

/// Single-pass centerline approximation for sliver regions: collapse each
/// sliver onto its long axis by insetting to (near) zero width.
fn medial_paths(regions: &ExPolygons) -> Polylines {
    let mut paths = Polylines::new();
    for region in regions {
        if region.area() <= 0.0 {
            continue;
        }
        // A sliver's contour hugs its centerline; one shallow inset pulls
        // the two sides together.
        let collapsed = clipper::offset_ex(&[region.clone()], -EPSILON, OffsetJoin::Round);
        let source = if collapsed.is_empty() {
            std::slice::from_ref(region)
        } else {
            &collapsed[..]
        };
        for expoly in source {
            let pl: Polyline = expoly.contour.to_closed_polyline();
            if pl.is_valid() {
                paths.push(pl);
            }
        }
    }
    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ExPolygon, Point};
    use crate::slice::LayerRegion;
    use crate::slice::{Surface, SurfaceType};

    fn make_region(size_mm: f64) -> LayerRegion {
        let cfg = RegionConfig::default();
        let flows = crate::slice::test_util::flows_for(&cfg, 0.4, 0.2);
        let mut region = LayerRegion::new(0, flows);
        region.slices.push(Surface::new(
            ExPolygon::rectangle(Point::zero(), Point::new_scale(size_mm, size_mm)),
            SurfaceType::Internal,
        ));
        region
    }

    /// A square with a tab too narrow for the third loop: the tab interior
    /// survives two insets and becomes a gap on the third.
    fn tabbed_region() -> LayerRegion {
        let cfg = RegionConfig::default();
        let flows = crate::slice::test_util::flows_for(&cfg, 0.4, 0.2);
        let mut region = LayerRegion::new(0, flows);
        let square = ExPolygon::rectangle(Point::zero(), Point::new_scale(10.0, 10.0));
        let tab = ExPolygon::rectangle(
            Point::new_scale(10.0, 4.2),
            Point::new_scale(16.0, 5.8),
        );
        for expoly in clipper::union_ex(&[square, tab]) {
            region.slices.push(Surface::new(expoly, SurfaceType::Internal));
        }
        region
    }

    #[test]
    fn test_generate_loops_count() {
        let mut region = make_region(20.0);
        generate_region(&mut region, &RegionConfig::default());
        // One contour ring per loop on a solid square.
        assert_eq!(region.perimeters.len(), 3);
        assert!(!region.fill_boundary.is_empty());
    }

    #[test]
    fn test_fill_boundary_shrinks_with_loops() {
        let mut one = make_region(20.0);
        generate_region(&mut one, &RegionConfig::default().perimeters(1));
        let mut three = make_region(20.0);
        generate_region(&mut three, &RegionConfig::default().perimeters(3));
        assert!(
            clipper::area_mm2(&three.fill_boundary) < clipper::area_mm2(&one.fill_boundary)
        );
    }

    #[test]
    fn test_zero_perimeters_fill_everything() {
        let mut region = make_region(20.0);
        generate_region(&mut region, &RegionConfig::default().perimeters(0));
        assert!(region.perimeters.is_empty());
        assert!((clipper::area_mm2(&region.fill_boundary) - 400.0).abs() < 1.0);
    }

    #[test]
    fn test_tiny_region_yields_thin_walls() {
        // 0.3mm wide stripe is narrower than the external flow width.
        let cfg = RegionConfig::default().perimeters(2);
        let flows = crate::slice::test_util::flows_for(&cfg, 0.4, 0.2);
        let mut region = LayerRegion::new(0, flows);
        region.slices.push(Surface::new(
            ExPolygon::rectangle(Point::zero(), Point::new_scale(10.0, 0.3)),
            SurfaceType::Internal,
        ));
        generate_region(&mut region, &cfg);
        assert!(region.perimeters.is_empty());
        assert!(!region.thin_walls.is_empty());
    }

    #[test]
    fn test_gap_fill_disabled_by_default() {
        let mut region = tabbed_region();
        generate_region(&mut region, &RegionConfig::default());
        assert!(region.thin_fills.is_empty());
    }

    #[test]
    fn test_gap_fill_detection_enabled() {
        let mut region = tabbed_region();
        let mut cfg = RegionConfig::default();
        cfg.gap_fill_threshold = 0.05;
        generate_region(&mut region, &cfg);
        assert!(!region.thin_fills.is_empty(), "tab gap was not detected");
    }

    #[test]
    fn test_empty_region() {
        let cfg = RegionConfig::default();
        let flows = crate::slice::test_util::flows_for(&cfg, 0.4, 0.2);
        let mut region = LayerRegion::new(0, flows);
        generate_region(&mut region, &cfg);
        assert!(region.perimeters.is_empty());
        assert!(region.fill_boundary.is_empty());
    }
}

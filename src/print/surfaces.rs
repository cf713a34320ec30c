//! Surface typing.
//!
//! Comparing each region's slices with the whole-layer islands above and
//! below partitions them into bottom, top and internal surfaces. The
//! partition is exhaustive: anything the printability filter takes away
//! from top or bottom falls through to internal rather than vanishing.

use super::PrintObject;
use crate::clipper::{self, OffsetJoin};
use crate::geometry::ExPolygons;
use crate::slice::{SurfaceCollection, SurfaceType};
use crate::{CoordF, EPSILON};
use log::debug;

impl PrintObject {
    /// Stage 6: type every region's slices and derive its fill surfaces.
    pub fn detect_surfaces_type(&mut self) {
        debug!("surface typing over {} layers", self.layers.len());
        let islands: Vec<ExPolygons> = self.layers.iter().map(|l| l.slices.clone()).collect();

        for region_id in 0..self.region_count() {
            for i in 0..self.layers.len() {
                let upper = if i + 1 < islands.len() {
                    Some(&islands[i + 1])
                } else {
                    None
                };
                let lower = if i > 0 { Some(&islands[i - 1]) } else { None };

                let region = &mut self.layers[i].regions[region_id];
                let slices = region.slices.expolygons();
                if slices.is_empty() {
                    continue;
                }
                let half_perimeter = region.flows.perimeter.width() / 2.0;

                // Exposed upward: not covered by the layer above.
                let top = match upper {
                    Some(upper) => printable(&clipper::diff_ex(&slices, upper), half_perimeter),
                    None => slices.clone(),
                };

                // Exposed downward: not resting on the layer below.
                let bottom = match lower {
                    Some(lower) => printable(&clipper::diff_ex(&slices, lower), half_perimeter),
                    None => slices.clone(),
                };

                // A membrane thinner than one layer is both; count it as
                // bottom so bridges over it can still be detected from
                // below.
                let top = if !top.is_empty() && !bottom.is_empty() {
                    let overlap = clipper::intersection_ex(&top, &bottom);
                    clipper::diff_ex(&top, &overlap)
                } else {
                    top
                };

                let covered = clipper::union2_ex(&top, &bottom);
                let internal = clipper::diff_ex(&slices, &covered);

                let mut typed = SurfaceCollection::new();
                typed.append_expolygons(bottom, SurfaceType::Bottom);
                typed.append_expolygons(top, SurfaceType::Top);
                typed.append_expolygons(internal, SurfaceType::Internal);
                region.slices = typed;

                // Fill surfaces: the typed partition clipped to the area
                // the perimeters left to fill.
                let boundary = region.fill_boundary.clone();
                let mut fills = SurfaceCollection::new();
                for surface in region.slices.iter() {
                    let clipped = clipper::intersection_ex(
                        std::slice::from_ref(&surface.expolygon),
                        &boundary,
                    );
                    for expoly in clipped {
                        fills.push(surface.with_expolygon(expoly));
                    }
                }
                region.fill_surfaces = fills;
            }
        }
    }

    /// Extra-perimeter hints: where the region above recedes steeply, the
    /// infill band under its rim earns additional perimeter loops so the
    /// transition stays covered.
    ///
    /// Gated per region on `extra_perimeters`, at least one perimeter and a
    /// non-zero fill density.
    pub fn discover_extra_perimeters(&mut self) {
        for region_id in 0..self.region_count() {
            let cfg = &self.region_configs()[region_id];
            if !cfg.extra_perimeters || cfg.perimeters == 0 || cfg.fill_density <= 0.0 {
                continue;
            }
            let perimeters = cfg.perimeters;

            for i in 0..self.layers.len().saturating_sub(1) {
                let (head, tail) = self.layers.split_at_mut(i + 1);
                let layer = &mut head[i];
                let upper_slices = tail[0].regions[region_id].slices.expolygons();
                if upper_slices.is_empty() {
                    continue;
                }

                let region = &mut layer.regions[region_id];
                let spacing = region.flows.perimeter.spacing();

                // Annulus the upper outline sweeps through one spacing in
                // either direction: the footprint of the wall transition.
                let upper_band = clipper::diff_ex(
                    &clipper::grow(&upper_slices, spacing),
                    &clipper::shrink(&upper_slices, spacing),
                );
                if upper_band.is_empty() {
                    continue;
                }

                for surface in region.slices.iter_mut() {
                    let slice = std::slice::from_ref(&surface.expolygon);
                    let mut hypothetical = perimeters + 1;
                    loop {
                        let outer = clipper::offset_ex(
                            slice,
                            -((hypothetical - 1) as CoordF * spacing) - EPSILON,
                            OffsetJoin::Miter,
                        );
                        if outer.is_empty() {
                            break;
                        }
                        let inner = clipper::shrink(slice, hypothetical as CoordF * spacing);
                        if inner.is_empty() {
                            break;
                        }
                        let band = clipper::diff_ex(&outer, &inner);
                        let band_area = clipper::area_mm2(&band);
                        if band_area <= 0.0 {
                            break;
                        }
                        let covered =
                            clipper::area_mm2(&clipper::intersection_ex(&band, &upper_band));
                        // Only steep transitions keep the band under the
                        // upper rim; shallow ones leave it mostly outside.
                        if covered < 0.2 * band_area {
                            break;
                        }
                        surface.extra_perimeters += 1;
                        hypothetical += 1;
                    }
                }
            }
        }
    }
}

/// Printability opening: drop slivers narrower than one perimeter pass.
/// What disappears here is reclaimed by the internal surfaces.
fn printable(expolygons: &ExPolygons, half_width: CoordF) -> ExPolygons {
    if expolygons.is_empty() {
        return Vec::new();
    }
    let inset = half_width - EPSILON;
    clipper::offset_ex(
        &clipper::offset_ex(expolygons, -inset, OffsetJoin::Miter),
        inset,
        OffsetJoin::Miter,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PrintConfig, RegionConfig};
    use crate::mesh::TriangleMesh;
    use crate::print::PrintObject;

    fn processed_cube(size: f64) -> PrintObject {
        let mut object = PrintObject::new(
            PrintConfig::default(),
            vec![(RegionConfig::default(), TriangleMesh::cube(size))],
        );
        object.slice().unwrap();
        let cfgs = object.region_configs().to_vec();
        crate::perimeter::generate(&mut object.layers, &cfgs);
        object.detect_surfaces_type();
        object
    }

    #[test]
    fn test_cube_surface_census() {
        let object = processed_cube(10.0);
        let n = object.layers.len();

        let first = &object.layers[0].regions[0].slices;
        assert!(first.has_type(SurfaceType::Bottom));
        assert!(!first.has_type(SurfaceType::Top));

        let last = &object.layers[n - 1].regions[0].slices;
        assert!(last.has_type(SurfaceType::Top));
        assert!(!last.has_type(SurfaceType::Bottom));

        for layer in &object.layers[1..n - 1] {
            let slices = &layer.regions[0].slices;
            assert!(!slices.has_type(SurfaceType::Top), "layer {}", layer.id);
            assert!(!slices.has_type(SurfaceType::Bottom), "layer {}", layer.id);
            assert!(slices.has_type(SurfaceType::Internal));
        }
    }

    #[test]
    fn test_partition_covers_slices() {
        let object = processed_cube(10.0);
        for layer in &object.layers {
            let region = &layer.regions[0];
            let typed = region.slices.expolygons();
            let whole = clipper::union_ex(&typed);
            // The typed partition covers the region outline.
            let missing = clipper::diff_ex(&layer.slices, &whole);
            assert!(clipper::area_mm2(&missing) < 0.05, "layer {}", layer.id);
        }
    }

    #[test]
    fn test_membrane_goes_to_bottom() {
        // A disk thinner than one layer slices into a single layer whose
        // surface is both top and bottom; bottom wins.
        let mesh = TriangleMesh::cylinder(0.0, 0.0, 0.0, 5.0, 0.15, 64);
        let mut object = PrintObject::new(
            PrintConfig::default(),
            vec![(RegionConfig::default(), mesh)],
        );
        object.slice().unwrap();
        assert_eq!(object.layer_count(), 1);
        let cfgs = object.region_configs().to_vec();
        crate::perimeter::generate(&mut object.layers, &cfgs);
        object.detect_surfaces_type();

        let slices = &object.layers[0].regions[0].slices;
        assert!(slices.has_type(SurfaceType::Bottom));
        assert!(!slices.has_type(SurfaceType::Top));
    }

    #[test]
    fn test_fill_surfaces_inside_boundary() {
        let object = processed_cube(10.0);
        for layer in &object.layers {
            let region = &layer.regions[0];
            let fills = region.fill_surfaces.expolygons();
            let outside = clipper::diff_ex(&fills, &region.fill_boundary);
            assert!(clipper::area_mm2(&outside) < 0.01);
        }
    }

    #[test]
    fn test_hemisphere_extra_perimeters() {
        let mesh = TriangleMesh::hemisphere(0.0, 0.0, 0.0, 10.0, 64);
        let mut region_cfg = RegionConfig::default();
        region_cfg.perimeters = 2;
        region_cfg.extra_perimeters = true;
        let mut object = PrintObject::new(PrintConfig::default(), vec![(region_cfg, mesh)]);
        object.slice().unwrap();
        let cfgs = object.region_configs().to_vec();
        crate::perimeter::generate(&mut object.layers, &cfgs);
        object.detect_surfaces_type();
        object.discover_extra_perimeters();

        // The dome recedes faster with height; some mid layer records a
        // hint.
        let hinted = object
            .layers
            .iter()
            .flat_map(|l| l.regions[0].slices.iter())
            .any(|s| s.extra_perimeters >= 1);
        assert!(hinted);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let mut object = processed_cube(10.0);
        let before: Vec<usize> = object
            .layers
            .iter()
            .map(|l| l.regions[0].slices.len())
            .collect();
        object.detect_surfaces_type();
        let after: Vec<usize> = object
            .layers
            .iter()
            .map(|l| l.regions[0].slices.len())
            .collect();
        assert_eq!(before, after);
    }
}

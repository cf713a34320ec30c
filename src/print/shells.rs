//! Horizontal shell discovery.
//!
//! Top and bottom surfaces project through their neighbouring layers,
//! converting internal fill to internal-solid until the configured shell
//! thickness is reached. The slices (not the fill surfaces) seed the
//! projection because they include the perimeter band, which must also be
//! backed by solid material.

use super::PrintObject;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::slice::{SurfaceCollection, SurfaceType};
use log::debug;

impl PrintObject {
    /// Stage 7: propagate top/bottom surfaces through the shell depth.
    pub fn discover_horizontal_shells(&mut self) {
        debug!("horizontal shell discovery");
        for region_id in 0..self.region_count() {
            let cfg = self.region_configs()[region_id].clone();

            // Sparse regions too small to be worth a pattern are filled
            // solid instead; they then take part in shell combination.
            if cfg.fill_density > 0.0 && cfg.solid_infill_below_area > 0.0 {
                let min_area =
                    cfg.solid_infill_below_area * crate::SCALING_FACTOR * crate::SCALING_FACTOR;
                for layer in &mut self.layers {
                    for surface in layer.regions[region_id].fill_surfaces.iter_mut() {
                        if surface.surface_type == SurfaceType::Internal
                            && surface.expolygon.contour.area() <= min_area
                        {
                            surface.surface_type = SurfaceType::InternalSolid;
                        }
                    }
                }
            }

            for i in 0..self.layers.len() {
                // Periodic solid infill forcing.
                if cfg.solid_infill_every_layers > 0 && i % cfg.solid_infill_every_layers == 0 {
                    let region = &mut self.layers[i].regions[region_id];
                    for surface in region.fill_surfaces.iter_mut() {
                        if surface.surface_type == SurfaceType::Internal {
                            surface.surface_type = SurfaceType::InternalSolid;
                        }
                    }
                }

                for seed_type in [SurfaceType::Top, SurfaceType::Bottom] {
                    let solid: ExPolygons =
                        self.layers[i].regions[region_id].slices.expolygons_by_type(seed_type);
                    if solid.is_empty() {
                        continue;
                    }
                    let shell_depth = match seed_type {
                        SurfaceType::Top => cfg.top_solid_layers,
                        _ => cfg.bottom_solid_layers,
                    };
                    if shell_depth <= 1 {
                        continue;
                    }

                    // Top shells grow downward, bottom shells upward.
                    for n in 1..shell_depth {
                        let neighbour = match seed_type {
                            SurfaceType::Top => match i.checked_sub(n) {
                                Some(j) => j,
                                None => break,
                            },
                            _ => {
                                let j = i + n;
                                if j >= self.layers.len() {
                                    break;
                                }
                                j
                            }
                        };
                        if !self.propagate_shell(region_id, neighbour, &solid) {
                            break;
                        }
                    }
                }
            }

            self.cleanup_fill_surfaces(region_id, &cfg);
        }
    }

    /// Convert the projection's footprint in one neighbour layer to
    /// internal-solid, rewriting the neighbour's fill partition. Returns
    /// false once the projection no longer reaches any internal area, which
    /// ends the sweep.
    fn propagate_shell(&mut self, region_id: usize, neighbour: usize, solid: &ExPolygons) -> bool {
        let fills = &self.layers[neighbour].regions[region_id].fill_surfaces;
        let internal = fills.expolygons_by_type(SurfaceType::Internal);
        let internal_solid = fills.expolygons_by_type(SurfaceType::InternalSolid);

        let fillable = clipper::union2_ex(&internal, &internal_solid);
        let new_solid = clipper::intersection_ex(solid, &fillable);
        if new_solid.is_empty() {
            return false;
        }

        let combined_solid = clipper::union2_ex(&internal_solid, &new_solid);
        let new_internal = clipper::diff_ex(&internal, &combined_solid);
        let consumed = clipper::union2_ex(&combined_solid, &new_internal);

        let region = &mut self.layers[neighbour].regions[region_id];
        let mut rewritten = SurfaceCollection::new();
        for surface in region.fill_surfaces.iter() {
            if surface.surface_type.is_internal() {
                continue;
            }
            // External surfaces survive, minus whatever the internal
            // partition now claims, so the partition stays disjoint.
            for expoly in
                clipper::diff_ex(std::slice::from_ref(&surface.expolygon), &consumed)
            {
                rewritten.push(surface.with_expolygon(expoly));
            }
        }
        rewritten.append_expolygons(new_internal, SurfaceType::Internal);
        rewritten.append_expolygons(combined_solid, SurfaceType::InternalSolid);
        region.fill_surfaces = rewritten;
        true
    }

    /// Post-sweep cleanup: drop fill scraps below the infill area
    /// threshold, and with zero fill density drop sparse internal fill
    /// entirely.
    fn cleanup_fill_surfaces(&mut self, region_id: usize, cfg: &crate::config::RegionConfig) {
        for layer in &mut self.layers {
            let region = &mut layer.regions[region_id];
            let spacing = region.flows.infill.scaled_spacing() as crate::CoordF;
            let area_threshold = spacing * spacing;
            region
                .fill_surfaces
                .surfaces
                .retain(|s| s.area() > area_threshold);
            if cfg.fill_density <= 0.0 {
                region
                    .fill_surfaces
                    .surfaces
                    .retain(|s| s.surface_type != SurfaceType::Internal);
            }
        }
    }
}

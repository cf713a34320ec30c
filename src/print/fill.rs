//! Fill transforms: bridges over sparse infill, demand-driven fill
//! clipping, and vertical infill combination.

use super::PrintObject;
use crate::clipper;
use crate::geometry::ExPolygons;
use crate::slice::{SurfaceCollection, SurfaceType};
use crate::CoordF;
use log::debug;

impl PrintObject {
    /// Solid fill resting on sparse infill must be printed as a bridge:
    /// the sparse pattern below cannot anchor a dense pass. Where that
    /// happens the solid surface is carved into an internal-bridge surface,
    /// and any infill directly below that the bridge flow would squash into
    /// is removed.
    pub fn bridge_over_infill(&mut self) {
        debug!("bridge detection over sparse infill");
        for i in 1..self.layers.len() {
            // Sparse infill anywhere in the layer below, regardless of
            // region.
            let lower_internal: ExPolygons = {
                let lower = &self.layers[i - 1];
                let all: ExPolygons = lower
                    .regions
                    .iter()
                    .flat_map(|r| r.fill_expolygons_by_type(SurfaceType::Internal))
                    .collect();
                clipper::union_ex(&all)
            };
            if lower_internal.is_empty() {
                continue;
            }

            for region_id in 0..self.region_count() {
                let region = &self.layers[i].regions[region_id];
                let solid = region.fill_expolygons_by_type(SurfaceType::InternalSolid);
                if solid.is_empty() {
                    continue;
                }
                let to_bridge = clipper::intersection_ex(&solid, &lower_internal);
                if to_bridge.is_empty() {
                    continue;
                }
                let remaining = clipper::diff_ex(&solid, &to_bridge);

                let region = &mut self.layers[i].regions[region_id];
                let mut rewritten = SurfaceCollection::new();
                for surface in region.fill_surfaces.iter() {
                    if surface.surface_type != SurfaceType::InternalSolid {
                        rewritten.push(surface.clone());
                    }
                }
                rewritten.append_expolygons(remaining, SurfaceType::InternalSolid);
                rewritten.append_expolygons(to_bridge.clone(), SurfaceType::InternalBridge);
                region.fill_surfaces = rewritten;

                self.carve_below_bridge(i, region_id, &to_bridge);
            }
        }
    }

    /// A bridge thread is thicker than the layer; whatever it exceeds the
    /// layer height by is carved out of the layers below so the sagging
    /// thread has room.
    fn carve_below_bridge(&mut self, layer_idx: usize, region_id: usize, to_bridge: &ExPolygons) {
        let bridge_width = self.layers[layer_idx].regions[region_id].flows.bridge.width();
        let mut excess = bridge_width - self.layers[layer_idx].height;
        let mut k = 1;
        while layer_idx >= k && excess >= self.layers[layer_idx - k].height {
            let below = &mut self.layers[layer_idx - k];
            excess -= below.height;
            for region in &mut below.regions {
                let mut rewritten = SurfaceCollection::new();
                for surface in region.fill_surfaces.iter() {
                    for expoly in clipper::diff_ex(
                        std::slice::from_ref(&surface.expolygon),
                        to_bridge,
                    ) {
                        rewritten.push(surface.with_expolygon(expoly));
                    }
                }
                region.fill_surfaces = rewritten;
            }
            k += 1;
        }
    }

    /// With `infill_only_where_needed`, sparse infill survives only where
    /// something above actually rests on it. Sweeping top-down, the
    /// accumulator carries the footprint of everything still needing
    /// support from below.
    pub fn clip_fill_surfaces(&mut self) {
        let any = self
            .region_configs()
            .iter()
            .any(|c| c.infill_only_where_needed);
        if !any {
            return;
        }
        debug!("clipping sparse infill to supported areas");

        let mut overhangs: ExPolygons = Vec::new();
        for i in (0..self.layers.len()).rev() {
            let lower_slices: Option<ExPolygons> =
                (i > 0).then(|| self.layers[i - 1].slices.clone());

            for region_id in 0..self.region_count() {
                let cfg = &self.region_configs()[region_id];
                if !cfg.infill_only_where_needed {
                    continue;
                }
                let overhang_width = if cfg.overhang_width > 0.0 {
                    cfg.overhang_width
                } else {
                    self.layers[i].regions[region_id].flows.perimeter.width()
                };
                let margin = self.layers[i].regions[region_id].flows.infill.width() / 2.0;

                let region = &mut self.layers[i].regions[region_id];

                // Keep internal fill only where the accumulator demands it.
                let mut rewritten = SurfaceCollection::new();
                let mut non_internal: ExPolygons = Vec::new();
                for surface in region.fill_surfaces.iter() {
                    if surface.surface_type == SurfaceType::Internal {
                        for expoly in clipper::intersection_ex(
                            std::slice::from_ref(&surface.expolygon),
                            &overhangs,
                        ) {
                            rewritten.push(surface.with_expolygon(expoly));
                        }
                    } else {
                        non_internal.push(surface.expolygon.clone());
                        rewritten.push(surface.clone());
                    }
                }
                region.fill_surfaces = rewritten;

                // Everything dense in this layer that rests on the layer
                // below needs support from it in turn.
                if let Some(lower) = &lower_slices {
                    let resting = clipper::intersection_ex(
                        &non_internal,
                        &clipper::shrink(lower, overhang_width),
                    );
                    let grown = clipper::grow(&resting, margin);
                    overhangs = clipper::union2_ex(&overhangs, &grown);
                }
            }
        }
    }

    /// Combine sparse infill vertically: where `every` consecutive layers
    /// share fillable area, print it once at full combined depth on the
    /// top layer of the group instead of once per layer.
    pub fn combine_infill(&mut self) {
        for region_id in 0..self.region_count() {
            let cfg = self.region_configs()[region_id].clone();
            if cfg.infill_every_layers <= 1 || cfg.fill_density <= 0.0 {
                continue;
            }
            let nozzle = self.config().nozzle_diameter;
            let layer_height = self.config().layer_height;
            let every = cfg
                .infill_every_layers
                .min((nozzle / layer_height).floor() as usize)
                .max(1);
            if every <= 1 {
                continue;
            }
            debug!("combining region {region_id} infill every {every} layers");

            let mut end = every;
            while end < self.layers.len() {
                let group: Vec<usize> = (end - every + 1..=end).collect();
                for surface_type in [SurfaceType::Internal, SurfaceType::InternalSolid] {
                    self.combine_group(region_id, &cfg, &group, surface_type, every);
                }
                end += every;
            }
        }
    }

    fn combine_group(
        &mut self,
        region_id: usize,
        cfg: &crate::config::RegionConfig,
        group: &[usize],
        surface_type: SurfaceType,
        every: usize,
    ) {
        // Intersect the type's fill across the whole group.
        let mut intersection: Option<ExPolygons> = None;
        for &idx in group {
            let fills = self.layers[idx].regions[region_id].fill_expolygons_by_type(surface_type);
            intersection = Some(match intersection {
                None => fills,
                Some(acc) => clipper::intersection_ex(&acc, &fills),
            });
            if intersection.as_ref().is_some_and(|i| i.is_empty()) {
                return;
            }
        }
        let Some(mut intersection) = intersection else {
            return;
        };

        // Scraps thinner than the fill lines are not worth combining.
        let flows = self.layers[group[0]].regions[region_id].flows;
        let spacing = flows.infill.scaled_spacing() as CoordF;
        intersection.retain(|e| e.area() > spacing * spacing);
        if intersection.is_empty() {
            return;
        }

        // Clearance keeps the thick combined extrusion away from the walls
        // and counteracts the overlap growth patterns get later.
        let mut clearance =
            flows.solid_infill.width() / 2.0 + flows.perimeter.width() / 2.0;
        if surface_type == SurfaceType::InternalSolid || cfg.fill_pattern.needs_combine_overlap() {
            clearance += flows.solid_infill.width();
        }
        let with_clearance = clipper::grow(&intersection, clearance);

        let Some(&top_idx) = group.last() else {
            return;
        };
        for &idx in group {
            let region = &mut self.layers[idx].regions[region_id];
            let mut rewritten = SurfaceCollection::new();
            for surface in region.fill_surfaces.iter() {
                if surface.surface_type != surface_type {
                    rewritten.push(surface.clone());
                    continue;
                }
                for expoly in clipper::diff_ex(
                    std::slice::from_ref(&surface.expolygon),
                    &with_clearance,
                ) {
                    rewritten.push(surface.with_expolygon(expoly));
                }
            }
            if idx == top_idx {
                for expoly in &intersection {
                    let mut combined =
                        crate::slice::Surface::new(expoly.clone(), surface_type);
                    combined.depth_layers = every;
                    rewritten.push(combined);
                }
            }
            region.fill_surfaces = rewritten;
        }
    }
}

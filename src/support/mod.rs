//! Support material.
//!
//! A single top-down sweep derives three per-layer region sets:
//!
//! - **contact areas**: support directly beneath an overhang in the layer
//!   immediately above, printed at the contact height;
//! - **interfaces**: the next few layers of support under a contact,
//!   filled densely so the object sits on a firm bed;
//! - **bulk support**: the columns carrying everything down to the plate.
//!
//! The sweep keeps a sliding window of the last `interface_layers` overhang
//! sets. Only the newest slot feeds the support column propagation; the
//! older slots exist solely to widen the interface band. Keep it that way:
//! the asymmetry is deliberate.
//!
//! Fill patterns are generated once over the union of all support areas and
//! clipped per layer, so the pattern lines stay continuous from plate to
//! contact; per-layer clipping fans out over the rayon pool.

use crate::clipper::{self, OffsetJoin};
use crate::config::PrintConfig;
use crate::flow::{Flow, FlowRole};
use crate::geometry::{ExPolygons, Polylines};
use crate::infill::{self, Filler};
use crate::print::PrintObject;
use crate::slice::{Surface, SurfaceType};
use crate::{CoordF, Result};
use log::debug;
use rayon::prelude::*;

/// Clearance between support and object walls, in flow widths.
const OBJECT_CLEARANCE_FACTOR: CoordF = 1.5;

/// Density of the solid first-layer base.
const BASE_DENSITY: CoordF = 0.5;

/// Per-layer support areas computed by the sweep.
#[derive(Debug, Default)]
struct SupportAreas {
    contact: Vec<ExPolygons>,
    interface: Vec<ExPolygons>,
    bulk: Vec<ExPolygons>,
}

impl SupportAreas {
    fn new(layer_count: usize) -> Self {
        Self {
            contact: vec![Vec::new(); layer_count],
            interface: vec![Vec::new(); layer_count],
            bulk: vec![Vec::new(); layer_count],
        }
    }

    fn is_empty(&self) -> bool {
        self.contact.iter().all(Vec::is_empty)
            && self.interface.iter().all(Vec::is_empty)
            && self.bulk.iter().all(Vec::is_empty)
    }

    /// Union of every area on every layer.
    fn envelope(&self) -> ExPolygons {
        let all: ExPolygons = self
            .contact
            .iter()
            .chain(self.interface.iter())
            .chain(self.bulk.iter())
            .flatten()
            .cloned()
            .collect();
        clipper::union_ex(&all)
    }
}

/// Generate support material for the object and store the per-layer paths
/// and islands on its layers.
pub fn generate(object: &mut PrintObject) -> Result<()> {
    let cfg = object.config().clone();
    let enabled = cfg.support_material
        || cfg.raft_layers > 0
        || cfg.support_material_enforce_layers > 0;
    if !enabled || object.layers.is_empty() {
        return Ok(());
    }

    let flow = Flow::from_config_width(
        FlowRole::SupportMaterial,
        0.0,
        cfg.nozzle_diameter,
        cfg.layer_height,
    )?;
    let areas = sweep(object, &cfg, &flow);
    if areas.is_empty() {
        debug!("no support needed");
        return Ok(());
    }

    emit(object, &cfg, &flow, &areas)?;
    Ok(())
}

/// How far a layer may reach past the one below before it needs support.
fn overhang_reach(object: &PrintObject, cfg: &PrintConfig, flow: &Flow) -> CoordF {
    if cfg.support_material_threshold > 0.0 {
        // One degree of slack: exactly-at-threshold walls stay unsupported.
        let theta = (cfg.support_material_threshold + 1.0).to_radians();
        cfg.layer_height * theta.cos() / theta.sin()
    } else {
        object
            .region_configs()
            .iter()
            .find(|c| c.overhang_width > 0.0)
            .map(|c| c.overhang_width)
            .unwrap_or_else(|| flow.width())
    }
}

/// The top-down sweep of spec'd contact/interface/bulk bookkeeping.
fn sweep(object: &PrintObject, cfg: &PrintConfig, flow: &Flow) -> SupportAreas {
    let layer_count = object.layers.len();
    let mut areas = SupportAreas::new(layer_count);
    let overhang_width = overhang_reach(object, cfg, flow);
    let clearance = OBJECT_CLEARANCE_FACTOR * flow.width();
    let window_len = cfg.support_material_interface_layers.max(1);

    // upper_overhangs[last] is the overhang set of the layer directly
    // above the one being visited.
    let mut upper_overhangs: Vec<ExPolygons> = vec![Vec::new(); window_len];
    let mut current_support: ExPolygons = Vec::new();

    let empty: ExPolygons = Vec::new();
    for i in (0..layer_count).rev() {
        let layer = &object.layers[i];
        let enforced = i < cfg.raft_layers + cfg.support_material_enforce_layers;
        if !cfg.support_material && !enforced {
            continue;
        }

        let off = clipper::grow(&layer.slices, clearance);
        let newest = upper_overhangs.last().cloned().unwrap_or_default();

        // Contact: the upper overhang, away from this layer's walls.
        let contact = clipper::simplify_ex(&clipper::diff_ex(&newest, &off), flow.spacing(), 0.0);

        // Interface band: older overhangs still within reach, minus the
        // object clearance and the contact itself.
        let older: ExPolygons = upper_overhangs[..window_len - 1]
            .iter()
            .flatten()
            .cloned()
            .collect();
        let interface = clipper::diff_ex(
            &clipper::union_ex(&older),
            &clipper::union2_ex(&off, &contact),
        );

        // Support column: everything above still unsupported, carved by
        // this layer's own material. Only the newest overhang feeds it.
        current_support =
            clipper::diff_ex(&clipper::union2_ex(&current_support, &newest), &layer.slices);
        let bulk = clipper::diff_ex(
            &current_support,
            &clipper::union2_ex(&off, &interface),
        );

        areas.contact[i] = contact;
        areas.interface[i] = interface;
        areas.bulk[i] = bulk;

        // This layer's own overhang, seen by the layers below.
        let d = if i < cfg.support_material_enforce_layers {
            0.0
        } else {
            overhang_width
        };
        let lower_slices: &ExPolygons = if i > 0 {
            &object.layers[i - 1].slices
        } else {
            &empty
        };
        let overhang = if d > 0.0 {
            clipper::offset_ex(
                &clipper::diff_ex(
                    &clipper::shrink(&layer.slices, d),
                    lower_slices,
                ),
                2.0 * d,
                OffsetJoin::Miter,
            )
        } else {
            clipper::diff_ex(&layer.slices, lower_slices)
        };
        upper_overhangs.rotate_left(1);
        if let Some(slot) = upper_overhangs.last_mut() {
            *slot = overhang;
        }
    }

    areas
}

/// Pattern polylines precomputed over the support envelope, one entry per
/// fill angle.
struct SupportPatterns {
    bulk: Vec<Polylines>,
    interface: Vec<Polylines>,
}

fn build_patterns(
    cfg: &PrintConfig,
    flow: &Flow,
    envelope: &ExPolygons,
) -> SupportPatterns {
    let mut angles = vec![cfg.support_material_angle.to_radians()];
    if cfg.support_material_pattern == crate::config::SupportPattern::RectilinearGrid {
        angles.push(angles[0] + std::f64::consts::FRAC_PI_2);
    }

    let bulk_density = (flow.spacing() / cfg.support_material_spacing).min(1.0);
    let interface_density = if cfg.support_material_interface_spacing > 0.0 {
        (flow.spacing() / cfg.support_material_interface_spacing).min(1.0)
    } else {
        1.0
    };

    // Inset so border lines stay clear of the per-layer clip.
    let inset = cfg.support_pattern_safety_inset * flow.width();
    let canvas = clipper::shrink(envelope, inset);

    let mut filler = infill::support_filler(cfg.support_material_pattern);
    let mut bulk = Vec::with_capacity(angles.len());
    let mut interface = Vec::with_capacity(angles.len());
    for &angle in &angles {
        filler.set_angle(angle);
        let mut bulk_lines = Polylines::new();
        let mut interface_lines = Polylines::new();
        for expoly in &canvas {
            let surface = Surface::new(expoly.clone(), SurfaceType::Internal);
            bulk_lines.extend(filler.fill_surface(&surface, bulk_density, flow.spacing()));
            interface_lines.extend(filler.fill_surface(
                &surface,
                interface_density,
                flow.spacing(),
            ));
        }
        bulk.push(bulk_lines);
        interface.push(interface_lines);
    }
    SupportPatterns { bulk, interface }
}

/// Clip the precomputed patterns to each layer's areas and store the
/// results on the layers. Layers are independent, so this fans out.
fn emit(
    object: &mut PrintObject,
    cfg: &PrintConfig,
    flow: &Flow,
    areas: &SupportAreas,
) -> Result<()> {
    let patterns = build_patterns(cfg, flow, &areas.envelope());
    let angle_count = patterns.bulk.len();
    debug!(
        "emitting support over {} layers with {} pattern angle(s)",
        object.layers.len(),
        angle_count
    );

    let first_layer_flow = flow.with_height(cfg.effective_first_layer_height())?;

    object
        .layers
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, layer)| {
            let all_support = clipper::union2_ex(
                &clipper::union2_ex(&areas.bulk[i], &areas.interface[i]),
                &areas.contact[i],
            );
            if all_support.is_empty() {
                layer.support_fills = Polylines::new();
                layer.support_contact_fills = Polylines::new();
                layer.support_islands = Vec::new();
                return;
            }

            if i == 0 {
                // A denser straight base grips the plate.
                let mut base_filler = infill::filler(crate::config::InfillPattern::Rectilinear);
                base_filler.set_angle(cfg.support_material_angle.to_radians());
                let mut paths = Polylines::new();
                for expoly in &all_support {
                    let surface = Surface::new(expoly.clone(), SurfaceType::Internal);
                    paths.extend(base_filler.fill_surface(
                        &surface,
                        BASE_DENSITY,
                        first_layer_flow.spacing(),
                    ));
                }
                layer.support_fills = paths;
                layer.support_contact_fills = Polylines::new();
            } else {
                let slot = i % angle_count;
                let mut paths =
                    clipper::clip_polylines(&patterns.bulk[slot], &areas.bulk[i]);
                paths.extend(clipper::clip_polylines(
                    &patterns.interface[slot],
                    &areas.interface[i],
                ));
                layer.support_fills = paths;
                layer.support_contact_fills =
                    clipper::clip_polylines(&patterns.interface[slot], &areas.contact[i]);
            }
            layer.support_islands = all_support;
        });

    Ok(())
}

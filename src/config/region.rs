//! Per-region settings.

use super::InfillPattern;
use crate::flow::{Flow, FlowResult, FlowRole};
use crate::CoordF;
use serde::{Deserialize, Serialize};

/// Settings for one material region of an object.
///
/// A region is the part of an object printed with one material and one set
/// of fill rules; multi-material objects carry one mesh and one of these
/// per region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegionConfig {
    /// Number of perimeter loops.
    pub perimeters: usize,

    /// Add perimeters on steep transitions where the infill would
    /// otherwise show through.
    pub extra_perimeters: bool,

    /// Sparse infill density, 0.0 to 1.0.
    pub fill_density: CoordF,

    /// Sparse infill pattern.
    pub fill_pattern: InfillPattern,

    /// Pattern for solid surfaces.
    pub solid_fill_pattern: InfillPattern,

    /// Base infill angle (degrees).
    pub fill_angle: CoordF,

    /// Solid layers at the top of the object.
    pub top_solid_layers: usize,

    /// Solid layers at the bottom of the object.
    pub bottom_solid_layers: usize,

    /// Force solid infill every N layers; 0 disables.
    pub solid_infill_every_layers: usize,

    /// Combine sparse infill across N layers; 1 disables.
    pub infill_every_layers: usize,

    /// Only fill where needed to support upper surfaces.
    pub infill_only_where_needed: bool,

    /// Internal regions smaller than this are filled solid (mm²).
    pub solid_infill_below_area: CoordF,

    /// Perimeter extrusion width (mm, 0 = auto from nozzle).
    pub perimeter_extrusion_width: CoordF,

    /// External perimeter extrusion width (mm, 0 = auto).
    pub external_perimeter_extrusion_width: CoordF,

    /// Sparse infill extrusion width (mm, 0 = auto).
    pub infill_extrusion_width: CoordF,

    /// Solid infill extrusion width (mm, 0 = auto).
    pub solid_infill_extrusion_width: CoordF,

    /// Flow multiplier for bridges.
    pub bridge_flow_ratio: CoordF,

    /// Fill gaps between perimeter loops at least this large (mm²) with
    /// single-pass paths; 0 disables gap fill.
    pub gap_fill_threshold: CoordF,

    /// Overhang reach override for `infill_only_where_needed` (mm,
    /// 0 = derive from flow).
    pub overhang_width: CoordF,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            perimeters: 3,
            extra_perimeters: true,
            fill_density: 0.2,
            fill_pattern: InfillPattern::Rectilinear,
            solid_fill_pattern: InfillPattern::Rectilinear,
            fill_angle: 45.0,
            top_solid_layers: 3,
            bottom_solid_layers: 3,
            solid_infill_every_layers: 0,
            infill_every_layers: 1,
            infill_only_where_needed: false,
            solid_infill_below_area: 70.0,
            perimeter_extrusion_width: 0.0,
            external_perimeter_extrusion_width: 0.0,
            infill_extrusion_width: 0.0,
            solid_infill_extrusion_width: 0.0,
            bridge_flow_ratio: 1.0,
            gap_fill_threshold: 0.0,
            overhang_width: 0.0,
        }
    }
}

impl RegionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flow for internal perimeter loops.
    pub fn perimeter_flow(&self, nozzle_diameter: CoordF, layer_height: CoordF) -> FlowResult<Flow> {
        Flow::from_config_width(
            FlowRole::Perimeter,
            self.perimeter_extrusion_width,
            nozzle_diameter,
            layer_height,
        )
    }

    /// Flow for the outermost loop.
    pub fn external_perimeter_flow(
        &self,
        nozzle_diameter: CoordF,
        layer_height: CoordF,
    ) -> FlowResult<Flow> {
        Flow::from_config_width(
            FlowRole::ExternalPerimeter,
            self.external_perimeter_extrusion_width,
            nozzle_diameter,
            layer_height,
        )
    }

    /// Flow for sparse infill.
    pub fn infill_flow(&self, nozzle_diameter: CoordF, layer_height: CoordF) -> FlowResult<Flow> {
        Flow::from_config_width(
            FlowRole::Infill,
            self.infill_extrusion_width,
            nozzle_diameter,
            layer_height,
        )
    }

    /// Flow for solid infill.
    pub fn solid_infill_flow(
        &self,
        nozzle_diameter: CoordF,
        layer_height: CoordF,
    ) -> FlowResult<Flow> {
        Flow::from_config_width(
            FlowRole::SolidInfill,
            self.solid_infill_extrusion_width,
            nozzle_diameter,
            layer_height,
        )
    }

    /// Bridging flow: round thread sized by the nozzle and flow ratio.
    pub fn bridge_flow(&self, nozzle_diameter: CoordF) -> Flow {
        Flow::bridging(nozzle_diameter * self.bridge_flow_ratio.sqrt(), nozzle_diameter)
    }

    pub fn perimeters(mut self, n: usize) -> Self {
        self.perimeters = n;
        self
    }

    pub fn fill_density(mut self, density: CoordF) -> Self {
        self.fill_density = density.clamp(0.0, 1.0);
        self
    }

    pub fn solid_layers(mut self, top: usize, bottom: usize) -> Self {
        self.top_solid_layers = top;
        self.bottom_solid_layers = bottom;
        self
    }
}

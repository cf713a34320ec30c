//! Print configuration.
//!
//! Configuration is parsed and validated by the caller; the pipeline
//! receives it as immutable values threaded through stage entry points.
//! Invalid enumerations are unrepresentable here, so range checking never
//! reaches the core.

mod region;

pub use region::RegionConfig;

use crate::CoordF;
use serde::{Deserialize, Serialize};

/// Sparse and solid infill patterns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfillPattern {
    #[default]
    Rectilinear,
    /// Rectilinear with the angle flipped 90 degrees on alternate passes.
    Grid,
    Honeycomb,
    Concentric,
}

impl InfillPattern {
    /// Patterns whose neighbouring layers interlock, needing extra overlap
    /// clearance when infill is combined across layers.
    pub fn needs_combine_overlap(&self) -> bool {
        matches!(self, InfillPattern::Rectilinear | InfillPattern::Grid | InfillPattern::Honeycomb)
    }
}

/// Support material fill patterns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SupportPattern {
    #[default]
    Rectilinear,
    /// Rectilinear alternating with a 90-degree rotated pass.
    RectilinearGrid,
    Honeycomb,
}

/// Object-wide settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrintConfig {
    /// Nominal layer height (mm).
    pub layer_height: CoordF,

    /// Height of the first layer (mm); 0 falls back to `layer_height`.
    pub first_layer_height: CoordF,

    /// Nozzle diameter (mm).
    pub nozzle_diameter: CoordF,

    /// Number of raft layers under the object.
    pub raft_layers: usize,

    /// Generate support material.
    pub support_material: bool,

    /// Overhang threshold in degrees from vertical; 0 derives the reach
    /// from the flow geometry.
    pub support_material_threshold: CoordF,

    /// Pattern used for bulk support.
    pub support_material_pattern: SupportPattern,

    /// Base angle for support patterns (degrees).
    pub support_material_angle: CoordF,

    /// Centerline spacing of the bulk support pattern (mm).
    pub support_material_spacing: CoordF,

    /// Number of dense interface layers between support and object.
    pub support_material_interface_layers: usize,

    /// Centerline spacing of interface patterns (mm); 0 means solid.
    pub support_material_interface_spacing: CoordF,

    /// Force support generation for the first N layers regardless of
    /// overhang tests.
    pub support_material_enforce_layers: usize,

    /// Extrusion height used for contact paths (mm).
    pub support_material_contact_height: CoordF,

    /// Inset applied to the support pattern envelope before clipping,
    /// in flow widths, so border paths survive the per-layer clip.
    pub support_pattern_safety_inset: CoordF,
}

impl Default for PrintConfig {
    fn default() -> Self {
        Self {
            layer_height: 0.2,
            first_layer_height: 0.2,
            nozzle_diameter: 0.4,
            raft_layers: 0,
            support_material: false,
            support_material_threshold: 0.0,
            support_material_pattern: SupportPattern::Rectilinear,
            support_material_angle: 0.0,
            support_material_spacing: 2.5,
            support_material_interface_layers: 3,
            support_material_interface_spacing: 0.0,
            support_material_enforce_layers: 0,
            support_material_contact_height: 0.2,
            support_pattern_safety_inset: 0.5,
        }
    }
}

impl PrintConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective first-layer height.
    pub fn effective_first_layer_height(&self) -> CoordF {
        if self.first_layer_height > 0.0 {
            self.first_layer_height
        } else {
            self.layer_height
        }
    }

    pub fn layer_height(mut self, h: CoordF) -> Self {
        self.layer_height = h;
        self
    }

    pub fn support(mut self, enabled: bool) -> Self {
        self.support_material = enabled;
        self
    }

    pub fn raft_layers(mut self, n: usize) -> Self {
        self.raft_layers = n;
        self
    }
}

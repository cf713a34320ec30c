//! Extrusion flow math.
//!
//! A [`Flow`] maps desired extrusion dimensions (width, layer height) to the
//! geometry the pipeline reasons in: centerline spacing for offsets and
//! cross-sectional area for volume. Extruded material forms a rectangle with
//! semicircular ends, so the usable spacing is less than the width:
//!
//! ```text
//! spacing = width - height * (1 - PI/4)
//! ```
//!
//! Bridge extrusions hang unsupported and pull into a round thread, so a
//! bridging flow has a circular cross-section with `width == height`.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

use crate::{scale, Coord, CoordF};

/// Extra gap left between adjacent bridge threads (mm).
pub const BRIDGE_EXTRA_SPACING: CoordF = 0.05;

/// Flow calculation errors.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Width too small relative to height; centerline spacing collapsed.
    #[error("flow spacing is not positive; extrusion width too small for layer height")]
    NegativeSpacing,

    /// Cross-section math produced a non-positive area.
    #[error("flow produced a non-positive cross-section")]
    NegativeFlow,

    /// Caller passed a dimension the math cannot work with.
    #[error("invalid flow argument: {0}")]
    InvalidArgument(String),
}

/// Result alias for flow math.
pub type FlowResult<T> = Result<T, FlowError>;

/// What the extrusion is for; selects the default auto-width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowRole {
    ExternalPerimeter,
    Perimeter,
    Infill,
    SolidInfill,
    SupportMaterial,
    SupportMaterialInterface,
}

/// Extrusion geometry: width, height, centerline spacing.
///
/// Invariants: `width >= height` for non-bridge flows; `width == height`
/// for bridge flows. All dimensions in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    width: CoordF,
    height: CoordF,
    spacing: CoordF,
    nozzle_diameter: CoordF,
    bridge: bool,
}

impl Flow {
    /// Non-bridge flow; spacing derived from the rounded-rectangle profile.
    pub fn new(width: CoordF, height: CoordF, nozzle_diameter: CoordF) -> FlowResult<Self> {
        let spacing = Self::rounded_rectangle_spacing(width, height)?;
        Ok(Self {
            width,
            height,
            spacing,
            nozzle_diameter,
            bridge: false,
        })
    }

    /// Bridging flow: a round thread of the given diameter.
    pub fn bridging(diameter: CoordF, nozzle_diameter: CoordF) -> Self {
        Self {
            width: diameter,
            height: diameter,
            spacing: diameter + BRIDGE_EXTRA_SPACING,
            nozzle_diameter,
            bridge: true,
        }
    }

    /// Flow from a configured width, where 0 means auto-derive from the
    /// nozzle diameter and role.
    pub fn from_config_width(
        role: FlowRole,
        width: CoordF,
        nozzle_diameter: CoordF,
        height: CoordF,
    ) -> FlowResult<Self> {
        if height <= 0.0 {
            return Err(FlowError::InvalidArgument(format!(
                "flow height must be positive, got {height}"
            )));
        }
        let w = if width == 0.0 {
            Self::auto_width(role, nozzle_diameter)
        } else {
            width
        };
        Self::new(w, height, nozzle_diameter)
    }

    #[inline]
    pub fn width(&self) -> CoordF {
        self.width
    }

    #[inline]
    pub fn scaled_width(&self) -> Coord {
        scale(self.width)
    }

    #[inline]
    pub fn height(&self) -> CoordF {
        self.height
    }

    #[inline]
    pub fn spacing(&self) -> CoordF {
        self.spacing
    }

    #[inline]
    pub fn scaled_spacing(&self) -> Coord {
        scale(self.spacing)
    }

    #[inline]
    pub fn nozzle_diameter(&self) -> CoordF {
        self.nozzle_diameter
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.bridge
    }

    /// Cross-sectional area in mm², i.e. mm³ of material per mm of travel.
    pub fn mm3_per_mm(&self) -> FlowResult<CoordF> {
        let area = if self.bridge {
            self.width * self.width * 0.25 * PI
        } else {
            self.height * (self.width - self.height * (1.0 - 0.25 * PI))
        };
        if area <= 0.0 {
            Err(FlowError::NegativeFlow)
        } else {
            Ok(area)
        }
    }

    /// Same flow recomputed for a different layer height.
    pub fn with_height(&self, height: CoordF) -> FlowResult<Self> {
        debug_assert!(!self.bridge, "bridge flow height is fixed by the diameter");
        Self::new(self.width, height, self.nozzle_diameter)
    }

    /// Centerline spacing for the rounded-rectangle profile.
    pub fn rounded_rectangle_spacing(width: CoordF, height: CoordF) -> FlowResult<CoordF> {
        let spacing = width - height * (1.0 - 0.25 * PI);
        if spacing <= 0.0 {
            Err(FlowError::NegativeSpacing)
        } else {
            Ok(spacing)
        }
    }

    /// Default width when the configuration leaves it at 0.
    fn auto_width(role: FlowRole, nozzle_diameter: CoordF) -> CoordF {
        match role {
            // External walls a touch narrower for accuracy.
            FlowRole::ExternalPerimeter => nozzle_diameter * 1.05,
            FlowRole::Perimeter | FlowRole::SupportMaterial | FlowRole::SupportMaterialInterface => {
                nozzle_diameter * 1.125
            }
            FlowRole::Infill | FlowRole::SolidInfill => nozzle_diameter * 1.125,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_spacing_less_than_width() {
        let flow = Flow::new(0.45, 0.2, 0.4).unwrap();
        assert!(flow.spacing() < flow.width());
        let expected = 0.45 - 0.2 * (1.0 - 0.25 * PI);
        assert!((flow.spacing() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_flow_rejects_degenerate_width() {
        // Width so small the rounded ends consume all the spacing.
        assert!(Flow::new(0.05, 0.3, 0.4).is_err());
    }

    #[test]
    fn test_flow_mm3_per_mm() {
        let flow = Flow::new(0.45, 0.2, 0.4).unwrap();
        let area = flow.mm3_per_mm().unwrap();
        let expected = 0.2 * (0.45 - 0.2 * (1.0 - 0.25 * PI));
        assert!((area - expected).abs() < 1e-12);
    }

    #[test]
    fn test_bridging_flow_is_round() {
        let flow = Flow::bridging(0.4, 0.4);
        assert!(flow.is_bridge());
        assert_eq!(flow.width(), flow.height());
        let area = flow.mm3_per_mm().unwrap();
        assert!((area - 0.4 * 0.4 * 0.25 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_from_config_width_auto() {
        let flow = Flow::from_config_width(FlowRole::Perimeter, 0.0, 0.4, 0.2).unwrap();
        assert!((flow.width() - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_from_config_width_invalid_height() {
        assert!(Flow::from_config_width(FlowRole::Infill, 0.45, 0.4, 0.0).is_err());
    }

    #[test]
    fn test_with_height() {
        let flow = Flow::new(0.45, 0.2, 0.4).unwrap();
        let thicker = flow.with_height(0.3).unwrap();
        assert!((thicker.height() - 0.3).abs() < 1e-12);
        assert!(thicker.spacing() < flow.spacing());
    }
}

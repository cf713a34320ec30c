//! Layer data model and mesh slicing.
//!
//! [`mesh_slicer`] turns a region mesh into per-layer expolygons;
//! [`Layer`]/[`LayerRegion`] hold everything the pipeline derives from them,
//! and [`Surface`] carries the type classification the later stages refine.

pub mod mesh_slicer;

mod layer;
mod surface;

pub use layer::{Layer, LayerRegion, RegionFlows};
pub use surface::{Surface, SurfaceCollection, SurfaceType};

#[cfg(test)]
pub(crate) mod test_util {
    use super::RegionFlows;
    use crate::config::RegionConfig;
    use crate::CoordF;

    /// Region flows for tests, derived the same way layer construction
    /// derives them.
    pub fn flows_for(cfg: &RegionConfig, nozzle: CoordF, layer_height: CoordF) -> RegionFlows {
        RegionFlows {
            perimeter: cfg.perimeter_flow(nozzle, layer_height).unwrap(),
            external_perimeter: cfg.external_perimeter_flow(nozzle, layer_height).unwrap(),
            infill: cfg.infill_flow(nozzle, layer_height).unwrap(),
            solid_infill: cfg.solid_infill_flow(nozzle, layer_height).unwrap(),
            bridge: cfg.bridge_flow(nozzle),
        }
    }
}

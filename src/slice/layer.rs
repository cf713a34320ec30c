//! Layers and layer regions.

use crate::clipper;
use crate::flow::Flow;
use crate::geometry::{ExPolygons, Line, Polygon, Polylines};
use crate::slice::{SurfaceCollection, SurfaceType};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The flows one region extrudes with, computed once at layer construction
/// and treated as pure values by every stage.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RegionFlows {
    pub perimeter: Flow,
    pub external_perimeter: Flow,
    pub infill: Flow,
    pub solid_infill: Flow,
    pub bridge: Flow,
}

/// One material region's share of a layer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerRegion {
    /// Region index into the object's configuration.
    pub region_id: usize,

    /// Unordered slice segments; live only between facet slicing and loop
    /// assembly.
    pub lines: Vec<Line>,

    /// Typed surfaces covering this region's share of the layer outline.
    pub slices: SurfaceCollection,

    /// Typed surfaces still to be filled, clipped to `fill_boundary`.
    pub fill_surfaces: SurfaceCollection,

    /// Interior left inside the perimeter band.
    pub fill_boundary: ExPolygons,

    /// Perimeter centerlines, outermost first.
    pub perimeters: Vec<Polygon>,

    /// Single-pass fills for gaps between perimeters.
    pub thin_fills: Polylines,

    /// Medial paths for walls too narrow for a perimeter pair.
    pub thin_walls: Polylines,

    /// Extrusion flows for this region at this layer's height.
    pub flows: RegionFlows,
}

impl LayerRegion {
    pub fn new(region_id: usize, flows: RegionFlows) -> Self {
        Self {
            region_id,
            lines: Vec::new(),
            slices: SurfaceCollection::new(),
            fill_surfaces: SurfaceCollection::new(),
            fill_boundary: Vec::new(),
            perimeters: Vec::new(),
            thin_fills: Vec::new(),
            thin_walls: Vec::new(),
            flows,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Geometry of this region's slices regardless of type.
    pub fn slice_expolygons(&self) -> ExPolygons {
        self.slices.expolygons()
    }

    /// Fill-surface geometry of one type.
    pub fn fill_expolygons_by_type(&self, surface_type: SurfaceType) -> ExPolygons {
        self.fill_surfaces.expolygons_by_type(surface_type)
    }

    /// Drop the transient slice segments once loops are assembled.
    pub fn release_lines(&mut self) {
        self.lines = Vec::new();
    }
}

/// One horizontal cross-section of the object.
///
/// `id` always equals the layer's index in the object's layer list; it is
/// reassigned when leading empty layers are removed.
#[derive(Clone, Serialize, Deserialize)]
pub struct Layer {
    pub id: usize,

    /// Z of the slicing plane (mm), strictly increasing with `id`.
    pub slice_z: CoordF,

    /// Z of the layer's top, where the nozzle prints (mm).
    pub print_z: CoordF,

    /// Layer thickness (mm).
    pub height: CoordF,

    /// Loop assembly failed somewhere in this layer; repaired in a later
    /// stage.
    pub slicing_errors: bool,

    pub regions: Vec<LayerRegion>,

    /// Whole-layer islands: the union of all regions' slices.
    pub slices: ExPolygons,

    /// Support material paths at this layer.
    pub support_fills: Polylines,

    /// Denser paths directly under overhangs.
    pub support_contact_fills: Polylines,

    /// Outline of all support at this layer.
    pub support_islands: ExPolygons,
}

impl Layer {
    pub fn new(id: usize, slice_z: CoordF, print_z: CoordF, height: CoordF) -> Self {
        Self {
            id,
            slice_z,
            print_z,
            height,
            slicing_errors: false,
            regions: Vec::new(),
            slices: Vec::new(),
            support_fills: Vec::new(),
            support_contact_fills: Vec::new(),
            support_islands: Vec::new(),
        }
    }

    #[inline]
    pub fn region(&self, idx: usize) -> &LayerRegion {
        &self.regions[idx]
    }

    #[inline]
    pub fn region_mut(&mut self, idx: usize) -> &mut LayerRegion {
        &mut self.regions[idx]
    }

    /// True when no region has any slice geometry.
    pub fn is_empty(&self) -> bool {
        self.regions.iter().all(|r| r.is_empty())
    }

    /// True when any region kept thin walls.
    pub fn has_thin_walls(&self) -> bool {
        self.regions.iter().any(|r| !r.thin_walls.is_empty())
    }

    /// Rebuild the whole-layer islands from the regions' slices.
    ///
    /// Called whenever a stage rewrites region slices; everything needing a
    /// cross-region outline of the layer reads `self.slices`.
    pub fn make_slices(&mut self) {
        let all: ExPolygons = self
            .regions
            .iter()
            .flat_map(|r| r.slice_expolygons())
            .collect();
        self.slices = clipper::union_ex(&all);
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Layer(id={}, slice_z={:.3}, {} regions, {} islands)",
            self.id,
            self.slice_z,
            self.regions.len(),
            self.slices.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionConfig;
    use crate::geometry::{ExPolygon, Point};
    use crate::slice::Surface;

    fn test_flows() -> RegionFlows {
        let cfg = RegionConfig::default();
        RegionFlows {
            perimeter: cfg.perimeter_flow(0.4, 0.2).unwrap(),
            external_perimeter: cfg.external_perimeter_flow(0.4, 0.2).unwrap(),
            infill: cfg.infill_flow(0.4, 0.2).unwrap(),
            solid_infill: cfg.solid_infill_flow(0.4, 0.2).unwrap(),
            bridge: cfg.bridge_flow(0.4),
        }
    }

    fn square_mm(x: f64, y: f64, size: f64) -> ExPolygon {
        ExPolygon::rectangle(Point::new_scale(x, y), Point::new_scale(x + size, y + size))
    }

    #[test]
    fn test_layer_new() {
        let layer = Layer::new(0, 0.1, 0.2, 0.2);
        assert!(layer.is_empty());
        assert!(!layer.slicing_errors);
        assert!(layer.slices.is_empty());
    }

    #[test]
    fn test_make_slices_unions_regions() {
        let mut layer = Layer::new(0, 0.1, 0.2, 0.2);
        let flows = test_flows();

        let mut r0 = LayerRegion::new(0, flows);
        r0.slices
            .push(Surface::new(square_mm(0.0, 0.0, 10.0), SurfaceType::Internal));
        let mut r1 = LayerRegion::new(1, flows);
        r1.slices
            .push(Surface::new(square_mm(5.0, 0.0, 10.0), SurfaceType::Internal));
        layer.regions.push(r0);
        layer.regions.push(r1);

        layer.make_slices();
        assert_eq!(layer.slices.len(), 1);
        assert!((clipper::area_mm2(&layer.slices) - 150.0).abs() < 1.0);
    }

    #[test]
    fn test_release_lines() {
        let mut region = LayerRegion::new(0, test_flows());
        region.lines.push(Line::new(Point::new(0, 0), Point::new(1, 1)));
        region.release_lines();
        assert!(region.lines.is_empty());
    }

    #[test]
    fn test_has_thin_walls() {
        let mut layer = Layer::new(0, 0.1, 0.2, 0.2);
        let mut region = LayerRegion::new(0, test_flows());
        assert!(!layer.has_thin_walls());
        region
            .thin_walls
            .push(vec![Point::new(0, 0), Point::new(100, 0)].into());
        layer.regions.push(region);
        assert!(layer.has_thin_walls());
    }
}

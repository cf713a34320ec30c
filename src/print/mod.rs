//! Print objects and the layer analysis pipeline.
//!
//! [`PrintObject`] owns one object's meshes (one per material region) and
//! its layer stack, and drives the stages in order:
//!
//! 1. layer construction along the Z ramp;
//! 2. facet slicing per region;
//! 3. loop assembly into initial surfaces;
//! 4. repair of layers whose loops did not close;
//! 5. trim of empty leading layers;
//! 6. perimeters, thin walls and fill boundaries;
//! 7. surface typing (top/bottom/internal, membranes) and fill surfaces;
//! 8. extra-perimeter hints, horizontal shells, bridges, fill clipping and
//!    vertical infill combination;
//! 9. support material.
//!
//! Stages run strictly in sequence; the parallel stages fan out internally
//! and merge their results before the next stage starts.

mod fill;
mod shells;
mod surfaces;

use crate::config::{PrintConfig, RegionConfig};
use crate::geometry::{BoundingBox3F, PointF};
use crate::mesh::TriangleMesh;
use crate::perimeter;
use crate::slice::{
    mesh_slicer, Layer, LayerRegion, RegionFlows, SurfaceCollection, SurfaceType,
};
use crate::{support, CoordF, Error, Result};
use log::{debug, warn};

/// A print job: shared settings plus the objects on the plate.
#[derive(Debug, Default)]
pub struct Print {
    objects: Vec<PrintObject>,
}

impl Print {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_object(&mut self, object: PrintObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[PrintObject] {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut [PrintObject] {
        &mut self.objects
    }

    /// Run the pipeline for every object.
    pub fn process(&mut self) -> Result<()> {
        for object in &mut self.objects {
            object.process()?;
        }
        Ok(())
    }
}

/// One object on the plate: per-region meshes and the derived layer stack.
#[derive(Debug)]
pub struct PrintObject {
    config: PrintConfig,
    region_configs: Vec<RegionConfig>,
    /// One mesh per region; dropped after slicing unless retention is
    /// requested.
    meshes: Vec<Option<TriangleMesh>>,
    retain_meshes: bool,
    /// Bounding box of all region meshes, captured before they are
    /// released.
    size: BoundingBox3F,
    /// Plate positions this object is printed at.
    copies: Vec<PointF>,
    pub layers: Vec<Layer>,
}

impl PrintObject {
    /// Build an object from (region config, mesh) pairs.
    pub fn new(config: PrintConfig, regions: Vec<(RegionConfig, TriangleMesh)>) -> Self {
        let (region_configs, meshes): (Vec<_>, Vec<_>) = regions
            .into_iter()
            .map(|(cfg, mesh)| (cfg, Some(mesh)))
            .unzip();
        let mut size = BoundingBox3F::new();
        for mesh in meshes.iter().flatten() {
            let bb = mesh.compute_bounding_box();
            if bb.is_defined() {
                size.merge_point(bb.min);
                size.merge_point(bb.max);
            }
        }
        Self {
            config,
            region_configs,
            meshes,
            retain_meshes: false,
            size,
            copies: vec![PointF::new(0.0, 0.0)],
            layers: Vec::new(),
        }
    }

    /// Bounding box of the object's meshes.
    #[inline]
    pub fn size(&self) -> &BoundingBox3F {
        &self.size
    }

    /// Keep the meshes alive after slicing.
    pub fn retain_meshes(mut self, retain: bool) -> Self {
        self.retain_meshes = retain;
        self
    }

    pub fn with_copies(mut self, copies: Vec<PointF>) -> Self {
        self.copies = copies;
        self
    }

    #[inline]
    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    #[inline]
    pub fn region_configs(&self) -> &[RegionConfig] {
        &self.region_configs
    }

    #[inline]
    pub fn region_count(&self) -> usize {
        self.region_configs.len()
    }

    #[inline]
    pub fn copies(&self) -> &[PointF] {
        &self.copies
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Run every stage of the pipeline.
    pub fn process(&mut self) -> Result<()> {
        self.slice()?;
        if self.layers.is_empty() {
            warn!("object is empty after slicing; skipping layer analysis");
            return Ok(());
        }

        perimeter::generate(&mut self.layers, &self.region_configs);

        self.detect_surfaces_type();
        self.discover_extra_perimeters();
        self.discover_horizontal_shells();
        self.bridge_over_infill();
        self.clip_fill_surfaces();
        self.combine_infill();

        support::generate(self)?;
        Ok(())
    }

    /// Stages 1-5: build layers, slice every region mesh into them, repair
    /// inconsistent layers and trim empty leading layers.
    pub fn slice(&mut self) -> Result<()> {
        self.make_layers()?;

        let slice_zs: Vec<CoordF> = self.layers.iter().map(|l| l.slice_z).collect();
        debug!("slicing {} regions at {} planes", self.meshes.len(), slice_zs.len());

        let mut any_geometry = false;
        for region_id in 0..self.meshes.len() {
            let Some(mesh) = self.meshes[region_id].as_ref() else {
                continue;
            };
            let slices = mesh_slicer::slice_mesh(mesh, &slice_zs);
            for (layer, slice) in self.layers.iter_mut().zip(slices) {
                if slice.errors {
                    layer.slicing_errors = true;
                }
                if !slice.expolygons.is_empty() {
                    any_geometry = true;
                }
                let region = &mut layer.regions[region_id];
                region.slices =
                    SurfaceCollection::from_expolygons(slice.expolygons, SurfaceType::Internal);
                region.release_lines();
            }
        }

        if !any_geometry {
            return Err(Error::InvalidMesh(
                "no layer received any slice geometry".into(),
            ));
        }

        if !self.retain_meshes {
            for mesh in &mut self.meshes {
                *mesh = None;
            }
        }

        for layer in &mut self.layers {
            layer.make_slices();
        }

        self.repair_errored_layers();

        // The ramp always overshoots the object; drop the empty tail.
        while self.layers.last().is_some_and(|l| l.is_empty()) {
            self.layers.pop();
        }

        self.trim_empty_leading_layers();
        self.reindex_layers();
        Ok(())
    }

    /// Stage 1: allocate empty layers along the Z ramp.
    ///
    /// The first slicing plane sits at half the first-layer height, each
    /// further plane one layer height up, continuing while the plane is
    /// inside the object plus one plane beyond it.
    fn make_layers(&mut self) -> Result<()> {
        let object_height = if self.size.is_defined() { self.size.max.z } else { 0.0 };
        if object_height <= 0.0 {
            return Err(Error::InvalidMesh("object has zero height".into()));
        }

        let first_height = self.config.effective_first_layer_height();
        let height = self.config.layer_height;
        if height <= 0.0 || first_height <= 0.0 {
            return Err(Error::Slicing(format!(
                "layer heights must be positive (first {first_height}, rest {height})"
            )));
        }

        self.layers.clear();
        let mut slice_z = first_height / 2.0;
        let mut print_z = first_height;
        let mut layer_height = first_height;
        let mut id = 0;
        loop {
            let beyond = slice_z >= object_height;
            let mut layer = Layer::new(id, slice_z, print_z, layer_height);
            for (region_id, region_cfg) in self.region_configs.iter().enumerate() {
                let flows = self.region_flows(region_cfg, layer_height)?;
                layer.regions.push(LayerRegion::new(region_id, flows));
            }
            self.layers.push(layer);
            if beyond {
                break;
            }
            id += 1;
            layer_height = height;
            slice_z += height;
            print_z += height;
        }
        debug!(
            "allocated {} layers up to z={:.3}",
            self.layers.len(),
            print_z
        );
        Ok(())
    }

    fn region_flows(&self, cfg: &RegionConfig, layer_height: CoordF) -> Result<RegionFlows> {
        let nozzle = self.config.nozzle_diameter;
        Ok(RegionFlows {
            perimeter: cfg.perimeter_flow(nozzle, layer_height)?,
            external_perimeter: cfg.external_perimeter_flow(nozzle, layer_height)?,
            infill: cfg.infill_flow(nozzle, layer_height)?,
            solid_infill: cfg.solid_infill_flow(nozzle, layer_height)?,
            bridge: cfg.bridge_flow(nozzle),
        })
    }

    /// Stage 4: rebuild the slices of layers whose loop assembly failed
    /// from their nearest consistent neighbours.
    fn repair_errored_layers(&mut self) {
        let errored: Vec<usize> = self
            .layers
            .iter()
            .enumerate()
            .filter(|(_, l)| l.slicing_errors)
            .map(|(i, _)| i)
            .collect();
        if errored.is_empty() {
            return;
        }
        warn!(
            "{} layer(s) had inconsistent slices and were rebuilt from neighbours",
            errored.len()
        );

        for idx in errored {
            let upper = (idx + 1..self.layers.len()).find(|&i| !self.layers[i].slicing_errors);
            let lower = (0..idx).rev().find(|&i| !self.layers[i].slicing_errors);

            for region_id in 0..self.region_count() {
                let mut contours = Vec::new();
                let mut holes = Vec::new();
                for neighbour in [upper, lower].into_iter().flatten() {
                    for surface in self.layers[neighbour].regions[region_id].slices.iter() {
                        contours.push(crate::geometry::ExPolygon::new(
                            surface.expolygon.contour.clone(),
                        ));
                        for hole in &surface.expolygon.holes {
                            let mut h = hole.clone();
                            h.make_counter_clockwise();
                            holes.push(crate::geometry::ExPolygon::new(h));
                        }
                    }
                }
                let contours = crate::clipper::union_ex(&contours);
                let holes = crate::clipper::union_ex(&holes);
                let rebuilt = crate::clipper::diff_ex(&contours, &holes);
                self.layers[idx].regions[region_id].slices =
                    SurfaceCollection::from_expolygons(rebuilt, SurfaceType::Internal);
            }
            self.layers[idx].make_slices();
        }
    }

    /// Stage 5: drop empty layers above the raft until the first layer with
    /// geometry, renumbering the rest.
    fn trim_empty_leading_layers(&mut self) {
        let idx = self.config.raft_layers;
        while idx < self.layers.len() {
            let layer = &self.layers[idx];
            if layer.slices.is_empty() && !layer.has_thin_walls() {
                self.layers.remove(idx);
            } else {
                break;
            }
        }
        if self.layers.len() <= self.config.raft_layers {
            warn!("object has no printable layers above the raft");
        }
    }

    fn reindex_layers(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.id = i;
        }
    }
}

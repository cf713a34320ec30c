//! Typed surfaces.
//!
//! Every point of a region's share of a layer belongs to exactly one surface
//! type once surface detection has run; the later stages only ever replace
//! whole surface lists, never mutate geometry in place.

use crate::geometry::{ExPolygon, ExPolygons};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a surface within a layer region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceType {
    /// Exposed upward; nothing above it on the next layer.
    Top,
    /// Exposed downward; nothing below it on the previous layer.
    Bottom,
    /// Sandwiched area that receives sparse infill.
    #[default]
    Internal,
    /// Internal area converted to solid fill as part of a horizontal shell.
    InternalSolid,
    /// Internal solid spanning sparse infill below; printed in bridge mode.
    InternalBridge,
}

impl SurfaceType {
    #[inline]
    pub fn is_top(&self) -> bool {
        matches!(self, SurfaceType::Top)
    }

    #[inline]
    pub fn is_bottom(&self) -> bool {
        matches!(self, SurfaceType::Bottom)
    }

    /// External surfaces face air; everything else is internal.
    #[inline]
    pub fn is_external(&self) -> bool {
        matches!(self, SurfaceType::Top | SurfaceType::Bottom)
    }

    #[inline]
    pub fn is_internal(&self) -> bool {
        !self.is_external()
    }

    /// Surfaces that get dense fill.
    #[inline]
    pub fn is_solid(&self) -> bool {
        !matches!(self, SurfaceType::Internal)
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        matches!(self, SurfaceType::InternalBridge)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurfaceType::Top => "top",
            SurfaceType::Bottom => "bottom",
            SurfaceType::Internal => "internal",
            SurfaceType::InternalSolid => "internal solid",
            SurfaceType::InternalBridge => "internal bridge",
        }
    }
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A classified region of a layer: geometry plus type and fill metadata.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Surface {
    pub expolygon: ExPolygon,
    pub surface_type: SurfaceType,

    /// Bridge direction in radians, once detected.
    pub bridge_angle: Option<CoordF>,

    /// Number of layers this surface fills when infill is combined
    /// vertically; 1 for plain surfaces.
    pub depth_layers: usize,

    /// Additional inner perimeters requested for steep transitions.
    pub extra_perimeters: usize,
}

impl Surface {
    pub fn new(expolygon: ExPolygon, surface_type: SurfaceType) -> Self {
        Self {
            expolygon,
            surface_type,
            bridge_angle: None,
            depth_layers: 1,
            extra_perimeters: 0,
        }
    }

    /// Same metadata, different geometry.
    pub fn with_expolygon(&self, expolygon: ExPolygon) -> Self {
        Self {
            expolygon,
            ..self.clone()
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.expolygon.is_empty()
    }

    /// Area in scaled units squared.
    #[inline]
    pub fn area(&self) -> CoordF {
        self.expolygon.area()
    }

    #[inline]
    pub fn is_solid(&self) -> bool {
        self.surface_type.is_solid()
    }

    #[inline]
    pub fn is_external(&self) -> bool {
        self.surface_type.is_external()
    }

    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.surface_type.is_bridge()
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Surface({}, {:?})", self.surface_type, self.expolygon)
    }
}

/// An ordered list of surfaces with set-like helpers.
///
/// The pipeline's contract is list replacement: stages build a new
/// collection and swap it in, which keeps stage boundaries auditable.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct SurfaceCollection {
    pub surfaces: Vec<Surface>,
}

impl SurfaceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_surfaces(surfaces: Vec<Surface>) -> Self {
        Self { surfaces }
    }

    /// Wrap expolygons as surfaces of one type.
    pub fn from_expolygons(expolygons: ExPolygons, surface_type: SurfaceType) -> Self {
        Self {
            surfaces: expolygons
                .into_iter()
                .map(|e| Surface::new(e, surface_type))
                .collect(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[inline]
    pub fn push(&mut self, surface: Surface) {
        self.surfaces.push(surface);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Surface> {
        self.surfaces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Surface> {
        self.surfaces.iter_mut()
    }

    /// Surfaces of exactly this type.
    pub fn filter_by_type(&self, surface_type: SurfaceType) -> impl Iterator<Item = &Surface> {
        self.surfaces
            .iter()
            .filter(move |s| s.surface_type == surface_type)
    }

    /// Geometry of all surfaces of this type.
    pub fn expolygons_by_type(&self, surface_type: SurfaceType) -> ExPolygons {
        self.filter_by_type(surface_type)
            .map(|s| s.expolygon.clone())
            .collect()
    }

    /// Geometry of every surface.
    pub fn expolygons(&self) -> ExPolygons {
        self.surfaces.iter().map(|s| s.expolygon.clone()).collect()
    }

    /// True when at least one surface has this type.
    pub fn has_type(&self, surface_type: SurfaceType) -> bool {
        self.surfaces.iter().any(|s| s.surface_type == surface_type)
    }

    /// Remove and return surfaces matching the predicate.
    pub fn extract_if<F>(&mut self, mut pred: F) -> Vec<Surface>
    where
        F: FnMut(&Surface) -> bool,
    {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.surfaces.len());
        for s in self.surfaces.drain(..) {
            if pred(&s) {
                taken.push(s);
            } else {
                kept.push(s);
            }
        }
        self.surfaces = kept;
        taken
    }

    /// Append expolygons as surfaces of one type.
    pub fn append_expolygons(&mut self, expolygons: ExPolygons, surface_type: SurfaceType) {
        self.surfaces
            .extend(expolygons.into_iter().map(|e| Surface::new(e, surface_type)));
    }

    /// Total area in scaled units squared.
    pub fn total_area(&self) -> CoordF {
        self.surfaces.iter().map(|s| s.area()).sum()
    }
}

impl fmt::Debug for SurfaceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceCollection({} surfaces)", self.surfaces.len())
    }
}

impl IntoIterator for SurfaceCollection {
    type Item = Surface;
    type IntoIter = std::vec::IntoIter<Surface>;
    fn into_iter(self) -> Self::IntoIter {
        self.surfaces.into_iter()
    }
}

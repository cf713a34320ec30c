//! # strata
//!
//! Layer analysis core for fused-deposition 3D printing.
//!
//! Given one triangle mesh per material region, this crate slices the meshes
//! into a stack of horizontal layers and decomposes every layer into typed
//! surface regions (top, bottom, internal, internal-solid, internal-bridge),
//! together with the derived artifacts a toolpath generator consumes:
//! extra-perimeter hints, horizontal solid shells, bridge regions over sparse
//! infill, multi-layer combined infill and support material with fill
//! patterns.
//!
//! The entry point is [`print::PrintObject`]: construct it from meshes and a
//! [`config::PrintConfig`], then call [`print::PrintObject::process`].
//!
//! Coordinates are scaled integers (1 unit = 1 nanometer) to keep the polygon
//! algebra exact; Z heights and extrusion dimensions stay in floating-point
//! millimeters.

pub mod clipper;
pub mod config;
pub mod flow;
pub mod geometry;
pub mod infill;
pub mod mesh;
pub mod perimeter;
pub mod print;
pub mod slice;
pub mod support;

use thiserror::Error as ThisError;

/// Scaled integer coordinate type. 1 unit = 1 nanometer.
pub type Coord = i64;

/// Floating-point coordinate type, in millimeters.
pub type CoordF = f64;

/// Conversion factor between millimeters and scaled units.
pub const SCALING_FACTOR: CoordF = 1_000_000.0;

/// Geometric tolerance in millimeters, used by printability tests and
/// offset slivers. Kept consistent across every stage.
pub const EPSILON: CoordF = 1e-4;

/// Convert millimeters to scaled units.
#[inline]
pub fn scale(v: CoordF) -> Coord {
    (v * SCALING_FACTOR).round() as Coord
}

/// Convert scaled units back to millimeters.
#[inline]
pub fn unscale(v: Coord) -> CoordF {
    v as CoordF / SCALING_FACTOR
}

/// The scaled form of [`EPSILON`].
#[inline]
pub fn scaled_epsilon() -> Coord {
    scale(EPSILON)
}

/// Crate-wide error type.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Slicing produced no geometry on any layer.
    #[error("invalid input mesh: {0}")]
    InvalidMesh(String),

    /// A pipeline stage failed in a way that cannot be repaired.
    #[error("slicing failed: {0}")]
    Slicing(String),

    /// A polygon primitive failed; fatal for the object.
    #[error("geometry operation failed: {0}")]
    Geometry(String),

    /// Flow math rejected the configured extrusion dimensions.
    #[error(transparent)]
    Flow(#[from] flow::FlowError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

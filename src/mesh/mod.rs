//! Triangle meshes.
//!
//! The pipeline consumes already-loaded meshes, one per material region;
//! file parsing belongs to the caller. Builders for a few watertight
//! primitives are provided for tests and benchmarks.

mod triangle_mesh;

pub use triangle_mesh::{Triangle, TriangleMesh};

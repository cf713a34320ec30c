//! 2D/3D geometry primitives used by the layer pipeline.
//!
//! All 2D types use scaled integer coordinates (see [`crate::scale`]); the
//! 3D types keep floating-point millimeters because they only exist on the
//! mesh side of the slicing boundary.

mod bounding_box;
mod expolygon;
mod line;
mod point;
mod polygon;
mod polyline;

pub use bounding_box::{BoundingBox, BoundingBox3F};
pub use expolygon::{ExPolygon, ExPolygons};
pub use line::Line;
pub use point::{Point, Point3F, PointF};
pub use polygon::Polygon;
pub use polyline::{Polyline, Polylines};

//! Indexed triangle set.

use crate::geometry::{BoundingBox3F, Point3F};
use crate::CoordF;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Three indices into a mesh vertex array.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triangle {
    pub indices: [u32; 3],
}

impl Triangle {
    #[inline]
    pub const fn new(v0: u32, v1: u32, v2: u32) -> Self {
        Self {
            indices: [v0, v1, v2],
        }
    }

    /// True when two corners share a vertex.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.indices[0] == self.indices[1]
            || self.indices[1] == self.indices[2]
            || self.indices[2] == self.indices[0]
    }
}

impl fmt::Debug for Triangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Triangle({}, {}, {})",
            self.indices[0], self.indices[1], self.indices[2]
        )
    }
}

/// A triangle mesh with vertices in floating-point millimeters.
///
/// Facets must be wound counter-clockwise seen from outside; loop assembly
/// relies on that winding to orient slice contours.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TriangleMesh {
    vertices: Vec<Point3F>,
    triangles: Vec<Triangle>,
    #[serde(skip)]
    bounding_box: Option<BoundingBox3F>,
}

impl TriangleMesh {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(vertices: Vec<Point3F>, triangles: Vec<Triangle>) -> Self {
        Self {
            vertices,
            triangles,
            bounding_box: None,
        }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3F] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Vertex indices of facet `i`.
    #[inline]
    pub fn triangle_indices(&self, i: usize) -> [u32; 3] {
        self.triangles[i].indices
    }

    /// Corner positions of facet `i`.
    #[inline]
    pub fn triangle_vertices(&self, i: usize) -> [Point3F; 3] {
        let t = &self.triangles[i];
        [
            self.vertices[t.indices[0] as usize],
            self.vertices[t.indices[1] as usize],
            self.vertices[t.indices[2] as usize],
        ]
    }

    pub fn add_vertex(&mut self, v: Point3F) -> u32 {
        let idx = self.vertices.len() as u32;
        self.vertices.push(v);
        self.bounding_box = None;
        idx
    }

    pub fn add_triangle(&mut self, t: Triangle) {
        self.triangles.push(t);
    }

    /// Append another mesh, remapping its indices.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(other.triangles.iter().map(|t| {
            Triangle::new(
                t.indices[0] + offset,
                t.indices[1] + offset,
                t.indices[2] + offset,
            )
        }));
        self.bounding_box = None;
    }

    /// Translate every vertex.
    pub fn translate(&mut self, dx: CoordF, dy: CoordF, dz: CoordF) {
        for v in &mut self.vertices {
            v.x += dx;
            v.y += dy;
            v.z += dz;
        }
        self.bounding_box = None;
    }

    pub fn compute_bounding_box(&self) -> BoundingBox3F {
        if let Some(bb) = self.bounding_box {
            return bb;
        }
        let mut bb = BoundingBox3F::new();
        for v in &self.vertices {
            bb.merge_point(*v);
        }
        bb
    }

    // --- watertight primitives for tests and benchmarks --------------------

    /// Axis-aligned box with its minimum corner at the origin.
    pub fn cuboid(size_x: CoordF, size_y: CoordF, size_z: CoordF) -> Self {
        let (x, y, z) = (size_x, size_y, size_z);
        let vertices = vec![
            Point3F::new(0.0, 0.0, 0.0),
            Point3F::new(x, 0.0, 0.0),
            Point3F::new(x, y, 0.0),
            Point3F::new(0.0, y, 0.0),
            Point3F::new(0.0, 0.0, z),
            Point3F::new(x, 0.0, z),
            Point3F::new(x, y, z),
            Point3F::new(0.0, y, z),
        ];
        let triangles = vec![
            // bottom, top
            Triangle::new(0, 2, 1),
            Triangle::new(0, 3, 2),
            Triangle::new(4, 5, 6),
            Triangle::new(4, 6, 7),
            // sides
            Triangle::new(0, 1, 5),
            Triangle::new(0, 5, 4),
            Triangle::new(1, 2, 6),
            Triangle::new(1, 6, 5),
            Triangle::new(2, 3, 7),
            Triangle::new(2, 7, 6),
            Triangle::new(3, 0, 4),
            Triangle::new(3, 4, 7),
        ];
        Self::from_parts(vertices, triangles)
    }

    /// Cube of edge `size` with its minimum corner at the origin.
    #[inline]
    pub fn cube(size: CoordF) -> Self {
        Self::cuboid(size, size, size)
    }

    /// Vertical cylinder centered on (cx, cy), base at `z0`.
    pub fn cylinder(cx: CoordF, cy: CoordF, z0: CoordF, radius: CoordF, height: CoordF, segments: usize) -> Self {
        let n = segments.max(3);
        let mut mesh = Self::new();
        let ring = |z: CoordF, mesh: &mut Self| -> Vec<u32> {
            (0..n)
                .map(|i| {
                    let a = 2.0 * std::f64::consts::PI * i as CoordF / n as CoordF;
                    mesh.add_vertex(Point3F::new(cx + radius * a.cos(), cy + radius * a.sin(), z))
                })
                .collect()
        };
        let bottom = ring(z0, &mut mesh);
        let top = ring(z0 + height, &mut mesh);
        let cb = mesh.add_vertex(Point3F::new(cx, cy, z0));
        let ct = mesh.add_vertex(Point3F::new(cx, cy, z0 + height));
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_triangle(Triangle::new(bottom[i], bottom[j], top[j]));
            mesh.add_triangle(Triangle::new(bottom[i], top[j], top[i]));
            mesh.add_triangle(Triangle::new(cb, bottom[j], bottom[i]));
            mesh.add_triangle(Triangle::new(ct, top[i], top[j]));
        }
        mesh
    }

    /// Hemisphere dome: flat face on the z=`z0` plane, apex at `z0 + radius`.
    pub fn hemisphere(cx: CoordF, cy: CoordF, z0: CoordF, radius: CoordF, segments: usize) -> Self {
        let n = segments.max(8);
        let rings = (n / 4).max(3);
        let mut mesh = Self::new();

        let mut ring_ids: Vec<Vec<u32>> = Vec::with_capacity(rings);
        for k in 0..rings {
            let phi = std::f64::consts::FRAC_PI_2 * k as CoordF / rings as CoordF;
            let r = radius * phi.cos();
            let z = z0 + radius * phi.sin();
            let ids = (0..n)
                .map(|i| {
                    let a = 2.0 * std::f64::consts::PI * i as CoordF / n as CoordF;
                    mesh.add_vertex(Point3F::new(cx + r * a.cos(), cy + r * a.sin(), z))
                })
                .collect();
            ring_ids.push(ids);
        }
        let apex = mesh.add_vertex(Point3F::new(cx, cy, z0 + radius));
        let center = mesh.add_vertex(Point3F::new(cx, cy, z0));

        for k in 0..rings - 1 {
            let (lower, upper) = (&ring_ids[k], &ring_ids[k + 1]);
            for i in 0..n {
                let j = (i + 1) % n;
                mesh.add_triangle(Triangle::new(lower[i], lower[j], upper[j]));
                mesh.add_triangle(Triangle::new(lower[i], upper[j], upper[i]));
            }
        }
        let last = &ring_ids[rings - 1];
        let base = &ring_ids[0];
        for i in 0..n {
            let j = (i + 1) % n;
            mesh.add_triangle(Triangle::new(last[i], last[j], apex));
            mesh.add_triangle(Triangle::new(center, base[j], base[i]));
        }
        mesh
    }
}

impl fmt::Debug for TriangleMesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TriangleMesh({} vertices, {} triangles)",
            self.vertices.len(),
            self.triangles.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_counts() {
        let mesh = TriangleMesh::cube(10.0);
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!(mesh.triangles().iter().all(|t| !t.is_degenerate()));
    }

    #[test]
    fn test_cuboid_bounding_box() {
        let mesh = TriangleMesh::cuboid(10.0, 20.0, 5.0);
        let bb = mesh.compute_bounding_box();
        assert!((bb.height() - 5.0).abs() < 1e-9);
        assert!((bb.max.y - 20.0).abs() < 1e-9);
        assert!(bb.min.x.abs() < 1e-9);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = TriangleMesh::cube(5.0);
        let mut b = TriangleMesh::cube(5.0);
        b.translate(0.0, 0.0, 5.0);
        a.merge(&b);
        assert_eq!(a.vertices().len(), 16);
        assert_eq!(a.triangle_count(), 24);
        let bb = a.compute_bounding_box();
        assert!((bb.height() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_cylinder_watertight_counts() {
        let n = 32;
        let mesh = TriangleMesh::cylinder(0.0, 0.0, 0.0, 5.0, 2.0, n);
        // n side quads (2 tris each) + n bottom + n top
        assert_eq!(mesh.triangle_count(), 4 * n);
    }

    #[test]
    fn test_hemisphere_apex() {
        let mesh = TriangleMesh::hemisphere(0.0, 0.0, 0.0, 10.0, 32);
        let bb = mesh.compute_bounding_box();
        assert!((bb.height() - 10.0).abs() < 1e-9);
        assert!((bb.max.x - 10.0).abs() < 1e-6);
    }
}

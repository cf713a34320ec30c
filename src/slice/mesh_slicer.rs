//! Facet slicing and loop assembly.
//!
//! Intersecting every facet of a region mesh with every layer plane it
//! crosses yields unordered 2D segments per layer. Segments remember which
//! mesh vertex or edge produced each endpoint, so chaining them back into
//! closed loops can match topologically first and fall back to coordinates
//! only for degenerate geometry. Loops are then classified into contours and
//! holes by orientation, which the facet winding provides for free.
//!
//! Facet slicing is data-parallel: above [`PARALLEL_FACET_THRESHOLD`] facets
//! the work fans out over rayon workers, each emitting a partial
//! per-layer segment table; the tables merge by plain append, which is
//! order-insensitive because loop assembly does not depend on segment input
//! order.

use crate::geometry::{ExPolygon, ExPolygons, Point, Polygon};
use crate::mesh::TriangleMesh;
use crate::{scale, Coord, CoordF};
use rayon::prelude::*;
use std::collections::HashMap;

/// Facet counts above this are sliced on the rayon pool.
pub const PARALLEL_FACET_THRESHOLD: usize = 500;

/// Tolerance for vertex-on-plane tests, in mm.
const ON_PLANE_EPS: CoordF = 1e-10;

/// Coordinate fallback tolerance for chaining, in scaled units.
const CHAIN_TOLERANCE: Coord = 10;

/// Result of slicing one mesh at one plane.
#[derive(Clone, Debug, Default)]
pub struct LayerSlice {
    /// Islands of the cross-section, canonical orientation.
    pub expolygons: ExPolygons,
    /// Loop assembly could not close every chain.
    pub errors: bool,
}

/// A slice segment with the mesh topology that produced its endpoints.
/// Vertex and edge ids are -1 when the endpoint lies mid-edge or mid-face.
#[derive(Clone, Copy, Debug)]
struct SliceSegment {
    a: Point,
    b: Point,
    a_vertex: i32,
    b_vertex: i32,
    a_edge: i32,
    b_edge: i32,
}

/// An endpoint candidate collected while walking a facet's edges.
#[derive(Clone, Copy, Debug)]
struct PlanePoint {
    p: Point,
    vertex: i32,
    edge: i32,
}

/// Assign every undirected mesh edge a stable id shared by both facets.
fn build_edge_ids(mesh: &TriangleMesh) -> Vec<[i32; 3]> {
    let mut map: HashMap<(u32, u32), i32> = HashMap::new();
    let mut next = 0i32;
    let mut ids = Vec::with_capacity(mesh.triangle_count());
    for t in 0..mesh.triangle_count() {
        let idx = mesh.triangle_indices(t);
        let mut tri_ids = [0i32; 3];
        for (i, id_slot) in tri_ids.iter_mut().enumerate() {
            let (v0, v1) = (idx[i], idx[(i + 1) % 3]);
            let key = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            *id_slot = *map.entry(key).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            });
        }
        ids.push(tri_ids);
    }
    ids
}

/// Intersect one facet with one plane.
///
/// Walking the edges in winding order starting from the lowest vertex makes
/// the emitted segment's direction encode which side is inside; chaining
/// relies on that orientation. A facet edge lying exactly in the plane is
/// emitted only when the remaining vertex is below (the facet's top edge);
/// the opposite case belongs to the facet above sharing that edge.
fn slice_facet(
    slice_z: CoordF,
    vertices: &[[CoordF; 3]; 3],
    indices: &[u32; 3],
    edge_ids: &[i32; 3],
    lowest: usize,
) -> Option<SliceSegment> {
    let horizontal = vertices.iter().all(|v| (v[2] - slice_z).abs() < ON_PLANE_EPS);
    if horizontal {
        return None;
    }

    let mut points: Vec<PlanePoint> = Vec::with_capacity(2);
    let mut vertex_point_seen: Option<i32> = None;

    let push_vertex_point = |points: &mut Vec<PlanePoint>,
                                 seen: &mut Option<i32>,
                                 v: &[CoordF; 3],
                                 id: i32| {
        if *seen == Some(id) {
            return;
        }
        *seen = Some(id);
        points.push(PlanePoint {
            p: Point::new(scale(v[0]), scale(v[1])),
            vertex: id,
            edge: -1,
        });
    };

    for j in 0..3 {
        let k = (lowest + j) % 3;
        let l = (k + 1) % 3;
        let a = &vertices[k];
        let b = &vertices[l];
        let c = &vertices[(k + 2) % 3];
        let (a_id, b_id) = (indices[k] as i32, indices[l] as i32);

        let a_on = (a[2] - slice_z).abs() < ON_PLANE_EPS;
        let b_on = (b[2] - slice_z).abs() < ON_PLANE_EPS;

        if a_on && b_on {
            if c[2] >= slice_z {
                // The facet above this edge owns the slice here.
                return None;
            }
            // Reversed so the interior stays on the conventional side.
            let (fa, fb, fa_id, fb_id) = (b, a, b_id, a_id);
            let seg = SliceSegment {
                a: Point::new(scale(fa[0]), scale(fa[1])),
                b: Point::new(scale(fb[0]), scale(fb[1])),
                a_vertex: fa_id,
                b_vertex: fb_id,
                a_edge: -1,
                b_edge: -1,
            };
            if seg.a != seg.b {
                return Some(seg);
            }
            return None;
        }

        if a_on {
            push_vertex_point(&mut points, &mut vertex_point_seen, a, a_id);
        } else if b_on {
            push_vertex_point(&mut points, &mut vertex_point_seen, b, b_id);
        } else if (a[2] < slice_z) != (b[2] < slice_z) {
            // Order the endpoints by vertex id so both facets sharing the
            // edge interpolate identically.
            let (lo, hi, lo_id) = if a_id < b_id {
                (a, b, a_id)
            } else {
                (b, a, b_id)
            };
            let t = (slice_z - hi[2]) / (lo[2] - hi[2]);
            if t <= 0.0 {
                push_vertex_point(&mut points, &mut vertex_point_seen, hi, a_id.max(b_id));
            } else if t >= 1.0 {
                push_vertex_point(&mut points, &mut vertex_point_seen, lo, lo_id);
            } else {
                let x = hi[0] + (lo[0] - hi[0]) * t;
                let y = hi[1] + (lo[1] - hi[1]) * t;
                points.push(PlanePoint {
                    p: Point::new(scale(x), scale(y)),
                    vertex: -1,
                    edge: edge_ids[k],
                });
            }
        }
    }

    if points.len() == 2 && points[0].p != points[1].p {
        // Collection order runs with the winding; swapping keeps the
        // interior on the left of a -> b.
        Some(SliceSegment {
            a: points[1].p,
            b: points[0].p,
            a_vertex: points[1].vertex,
            b_vertex: points[0].vertex,
            a_edge: points[1].edge,
            b_edge: points[0].edge,
        })
    } else {
        None
    }
}

/// Slice every facet against every plane it spans, one segment table per
/// layer.
fn slice_to_segments(mesh: &TriangleMesh, zs: &[CoordF]) -> Vec<Vec<SliceSegment>> {
    if mesh.is_empty() || zs.is_empty() {
        return vec![Vec::new(); zs.len()];
    }

    let edge_ids = build_edge_ids(mesh);

    let slice_one = |table: &mut Vec<Vec<SliceSegment>>, tri: usize| {
        let verts = mesh.triangle_vertices(tri);
        let indices = mesh.triangle_indices(tri);
        let vertices = [
            [verts[0].x, verts[0].y, verts[0].z],
            [verts[1].x, verts[1].y, verts[1].z],
            [verts[2].x, verts[2].y, verts[2].z],
        ];
        let min_z = vertices[0][2].min(vertices[1][2]).min(vertices[2][2]);
        let max_z = vertices[0][2].max(vertices[1][2]).max(vertices[2][2]);
        let lowest = if vertices[1][2] == min_z {
            1
        } else if vertices[2][2] == min_z {
            2
        } else {
            0
        };

        let first = zs.partition_point(|&z| z < min_z);
        let last = zs.partition_point(|&z| z <= max_z);
        for layer in first..last {
            if let Some(seg) = slice_facet(zs[layer], &vertices, &indices, &edge_ids[tri], lowest) {
                table[layer].push(seg);
            }
        }
    };

    if mesh.triangle_count() > PARALLEL_FACET_THRESHOLD {
        (0..mesh.triangle_count())
            .into_par_iter()
            .fold(
                || vec![Vec::new(); zs.len()],
                |mut table, tri| {
                    slice_one(&mut table, tri);
                    table
                },
            )
            .reduce(
                || vec![Vec::new(); zs.len()],
                |mut a, mut b| {
                    for (dst, src) in a.iter_mut().zip(b.iter_mut()) {
                        dst.append(src);
                    }
                    a
                },
            )
    } else {
        let mut table = vec![Vec::new(); zs.len()];
        for tri in 0..mesh.triangle_count() {
            slice_one(&mut table, tri);
        }
        table
    }
}

/// Chain one layer's segments into closed polygons.
///
/// Matching prefers shared mesh vertices, then shared mesh edges, then exact
/// coordinates, then a small coordinate tolerance. A chain that cannot reach
/// its start is kept as a best-effort polygon when it has enough points, but
/// the layer is reported as inconsistent.
fn chain_segments(segments: &[SliceSegment]) -> (Vec<Polygon>, bool) {
    if segments.is_empty() {
        return (Vec::new(), false);
    }

    let mut by_vertex: HashMap<i32, Vec<usize>> = HashMap::new();
    let mut by_edge: HashMap<i32, Vec<usize>> = HashMap::new();
    let mut by_coord: HashMap<(Coord, Coord), Vec<usize>> = HashMap::new();
    for (i, seg) in segments.iter().enumerate() {
        if seg.a_vertex >= 0 {
            by_vertex.entry(seg.a_vertex).or_default().push(i);
        }
        if seg.a_edge >= 0 {
            by_edge.entry(seg.a_edge).or_default().push(i);
        }
        by_coord.entry((seg.a.x, seg.a.y)).or_default().push(i);
    }

    let mut used = vec![false; segments.len()];
    let mut polygons = Vec::new();
    let mut errors = false;

    let first_unused = |candidates: Option<&Vec<usize>>, used: &[bool]| -> Option<usize> {
        candidates.and_then(|list| list.iter().copied().find(|&i| !used[i]))
    };

    for start in 0..segments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;
        let mut points = Vec::new();
        let mut current = start;
        let mut closed = false;

        loop {
            let seg = &segments[current];
            points.push(seg.a);

            let mut next = None;
            if seg.b_vertex >= 0 {
                next = first_unused(by_vertex.get(&seg.b_vertex), &used);
            }
            if next.is_none() && seg.b_edge >= 0 {
                next = first_unused(by_edge.get(&seg.b_edge), &used);
            }
            if next.is_none() {
                next = first_unused(by_coord.get(&(seg.b.x, seg.b.y)), &used);
            }
            if next.is_none() {
                // Tolerant scan, last resort for degenerate meshes.
                next = segments.iter().enumerate().position(|(i, cand)| {
                    !used[i] && cand.a.coincides_with(&seg.b, CHAIN_TOLERANCE)
                });
            }

            match next {
                // Reaching the start segment closes the loop; its `a` point
                // is already in the chain.
                Some(i) if i == start => {
                    closed = true;
                    break;
                }
                Some(i) => {
                    used[i] = true;
                    current = i;
                }
                None => break,
            }
        }

        if !closed {
            // Accept the chain if its open ends nearly touch; otherwise the
            // mesh is locally non-manifold here.
            let seg = &segments[current];
            if points.len() >= 3 && seg.b.coincides_with(&points[0], CHAIN_TOLERANCE * 100) {
                closed = true;
            } else {
                errors = true;
            }
        }

        if closed && points.len() >= 3 {
            polygons.push(Polygon::from_points(points));
        }
    }

    (polygons, errors)
}

/// Classify chained loops into contours and holes and nest them.
fn make_expolygons(polygons: Vec<Polygon>) -> ExPolygons {
    let mut contours: Vec<Polygon> = Vec::new();
    let mut holes: Vec<Polygon> = Vec::new();
    for mut poly in polygons {
        let area = poly.signed_area();
        if area > 0.0 {
            contours.push(poly);
        } else if area < 0.0 {
            poly.reverse();
            holes.push(poly);
        }
    }

    // Largest contour first so nested islands claim their own holes.
    contours.sort_by(|a, b| b.area().partial_cmp(&a.area()).unwrap_or(std::cmp::Ordering::Equal));

    let mut expolygons: ExPolygons = Vec::with_capacity(contours.len());
    for contour in contours {
        expolygons.push(ExPolygon::new(contour));
    }
    'hole: for hole in holes {
        let probe = match hole.points().first() {
            Some(p) => *p,
            None => continue,
        };
        // Smallest enclosing contour wins; scan from the back where the
        // small contours sort.
        for expoly in expolygons.iter_mut().rev() {
            if expoly.contour.contains_point(&probe)
                && !expoly.holes.iter().any(|h| h.contains_point(&probe))
            {
                let mut hole = hole;
                hole.make_clockwise();
                expoly.add_hole(hole);
                continue 'hole;
            }
        }
        // Orphaned hole: non-manifold input, drop it.
    }
    expolygons
}

/// Slice a mesh at the given plane heights (mm), one result per plane.
pub fn slice_mesh(mesh: &TriangleMesh, zs: &[CoordF]) -> Vec<LayerSlice> {
    let tables = slice_to_segments(mesh, zs);
    tables
        .into_iter()
        .map(|segments| {
            let (polygons, errors) = chain_segments(&segments);
            LayerSlice {
                expolygons: make_expolygons(polygons),
                errors,
            }
        })
        .collect()
}

/// Slice a mesh at a single height.
pub fn slice_mesh_at(mesh: &TriangleMesh, z: CoordF) -> ExPolygons {
    slice_mesh(mesh, &[z])
        .pop()
        .map(|s| s.expolygons)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipper::area_mm2;

    #[test]
    fn test_slice_cube_mid() {
        let mesh = TriangleMesh::cube(10.0);
        let result = slice_mesh_at(&mesh, 5.0);
        assert_eq!(result.len(), 1);
        assert!(result[0].holes.is_empty());
        assert!((area_mm2(&result) - 100.0).abs() < 0.5);
        assert!(result[0].contour.is_counter_clockwise());
    }

    #[test]
    fn test_slice_cube_every_layer() {
        let mesh = TriangleMesh::cube(10.0);
        let zs: Vec<CoordF> = (0..50).map(|i| 0.1 + i as CoordF * 0.2).collect();
        let slices = slice_mesh(&mesh, &zs);
        assert_eq!(slices.len(), 50);
        for s in &slices {
            assert_eq!(s.expolygons.len(), 1);
            assert!(!s.errors);
            assert!((area_mm2(&s.expolygons) - 100.0).abs() < 0.5);
        }
    }

    #[test]
    fn test_slice_outside_range_is_empty() {
        let mesh = TriangleMesh::cube(10.0);
        assert!(slice_mesh_at(&mesh, 15.0).is_empty());
        assert!(slice_mesh_at(&mesh, -1.0).is_empty());
    }

    #[test]
    fn test_slice_empty_mesh() {
        let mesh = TriangleMesh::new();
        assert!(slice_mesh_at(&mesh, 0.0).is_empty());
    }

    #[test]
    fn test_slice_tube_has_hole() {
        // Outer box with an inner vertical channel: build as outer walls of
        // a 20mm cube plus inner walls of a 10mm channel, stitched top and
        // bottom into a closed solid.
        let mesh = tube_mesh();
        let result = slice_mesh_at(&mesh, 5.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert!((area_mm2(&result) - (400.0 - 100.0)).abs() < 1.0);
        assert!(result[0].holes[0].is_clockwise());
    }

    #[test]
    fn test_slice_cylinder_round_area() {
        let mesh = TriangleMesh::cylinder(0.0, 0.0, 0.0, 5.0, 4.0, 64);
        let result = slice_mesh_at(&mesh, 2.0);
        assert_eq!(result.len(), 1);
        let expected = std::f64::consts::PI * 25.0;
        let got = area_mm2(&result);
        assert!((got - expected).abs() / expected < 0.02, "area {got}");
    }

    #[test]
    fn test_parallel_matches_serial() {
        // A cylinder fine enough to cross the parallel threshold.
        let mesh = TriangleMesh::cylinder(0.0, 0.0, 0.0, 5.0, 10.0, 200);
        assert!(mesh.triangle_count() > PARALLEL_FACET_THRESHOLD);
        let zs: Vec<CoordF> = (0..40).map(|i| 0.125 + i as CoordF * 0.25).collect();
        let slices = slice_mesh(&mesh, &zs);
        for s in &slices {
            assert_eq!(s.expolygons.len(), 1);
            assert!(!s.errors);
        }
    }

    /// 20mm square ring, 10mm channel, 10mm tall.
    fn tube_mesh() -> TriangleMesh {
        use crate::geometry::Point3F;
        use crate::mesh::Triangle;

        let mut mesh = TriangleMesh::new();
        let (lo, hi) = (0.0, 10.0);
        // outer ring corners
        let outer = [(0.0, 0.0), (20.0, 0.0), (20.0, 20.0), (0.0, 20.0)];
        // inner ring corners
        let inner = [(5.0, 5.0), (15.0, 5.0), (15.0, 15.0), (5.0, 15.0)];

        let mut ids = Vec::new();
        for &(x, y) in outer.iter().chain(inner.iter()) {
            let b = mesh.add_vertex(Point3F::new(x, y, lo));
            let t = mesh.add_vertex(Point3F::new(x, y, hi));
            ids.push((b, t));
        }
        let (ob, ot): (Vec<u32>, Vec<u32>) = ids[..4].iter().copied().unzip();
        let (ib, it): (Vec<u32>, Vec<u32>) = ids[4..].iter().copied().unzip();

        for i in 0..4 {
            let j = (i + 1) % 4;
            // outer walls face outward
            mesh.add_triangle(Triangle::new(ob[i], ob[j], ot[j]));
            mesh.add_triangle(Triangle::new(ob[i], ot[j], ot[i]));
            // inner walls face the channel
            mesh.add_triangle(Triangle::new(ib[j], ib[i], it[i]));
            mesh.add_triangle(Triangle::new(ib[j], it[i], it[j]));
            // top annulus
            mesh.add_triangle(Triangle::new(ot[i], ot[j], it[j]));
            mesh.add_triangle(Triangle::new(ot[i], it[j], it[i]));
            // bottom annulus
            mesh.add_triangle(Triangle::new(ob[j], ob[i], ib[i]));
            mesh.add_triangle(Triangle::new(ob[j], ib[i], ib[j]));
        }
        mesh
    }
}

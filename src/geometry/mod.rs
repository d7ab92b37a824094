//! Collision geometry types and decoders.
//!
//! Physics shapes store their geometry as raw little-endian byte blobs. This
//! module turns those blobs into [`Triangle`]s:
//!
//! - [`extract_hull_triangles`] walks a half-edge convex hull and fans each
//!   polygonal face into triangles.
//! - [`extract_mesh_triangles`] reads an indexed triangle mesh.
//!
//! Vertex blobs hold 12-byte records (three `f32`); any trailing partial
//! record is ignored.
//!
//! ```
//! use phystri::geometry::{extract_mesh_triangles, Vec3};
//!
//! let mut vertices = Vec::new();
//! for v in [[0.0f32, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]] {
//!     for c in v {
//!         vertices.extend_from_slice(&c.to_le_bytes());
//!     }
//! }
//! let mut indices = Vec::new();
//! for i in [0i32, 1, 2] {
//!     indices.extend_from_slice(&i.to_le_bytes());
//! }
//!
//! let triangles = extract_mesh_triangles(&vertices, &indices).unwrap();
//! assert_eq!(triangles.len(), 1);
//! assert_eq!(triangles[0].b, Vec3::new(1.0, 0.0, 0.0));
//! ```

mod halfedge;
mod trimesh;

use nalgebra::{Point3, Vector3};

use crate::bytes::VEC3_SIZE;

pub use halfedge::{extract_hull_triangles, HalfEdge, Hull, HALF_EDGE_SIZE};
pub use trimesh::{extract_mesh_triangles, TRIANGLE_INDEX_SIZE};

#[cfg(test)]
pub(crate) use halfedge::tests as hull_fixtures;

/// A 3D position with `f32` components.
pub type Vec3 = Point3<f32>;

/// A triangle given by three corner positions.
///
/// Winding is kept exactly as it appears in the source data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner.
    pub a: Vec3,
    /// Second corner.
    pub b: Vec3,
    /// Third corner.
    pub c: Vec3,
}

impl Triangle {
    /// Create a triangle from its corners.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// The corners in order.
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.a, self.b, self.c]
    }

    /// Unit normal, or zero for a degenerate triangle.
    pub fn normal(&self) -> Vector3<f32> {
        let n = (self.b - self.a).cross(&(self.c - self.a));
        n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Surface area.
    pub fn area(&self) -> f32 {
        0.5 * (self.b - self.a).cross(&(self.c - self.a)).norm()
    }

    /// Whether the triangle has (near) zero area.
    pub fn is_degenerate(&self) -> bool {
        self.area() <= f32::EPSILON
    }
}

/// Decode a vertex blob into positions.
pub fn read_vertices(bytes: &[u8]) -> Vec<Vec3> {
    bytes
        .chunks_exact(VEC3_SIZE)
        .map(|rec| {
            let f = |i: usize| f32::from_le_bytes([rec[i], rec[i + 1], rec[i + 2], rec[i + 3]]);
            Vec3::new(f(0), f(4), f(8))
        })
        .collect()
}

/// Axis-aligned bounds of a set of triangles, or `None` when empty.
pub fn bounding_box<'a, I>(triangles: I) -> Option<(Vec3, Vec3)>
where
    I: IntoIterator<Item = &'a Triangle>,
{
    let mut bounds: Option<(Vec3, Vec3)> = None;
    for tri in triangles {
        for v in tri.vertices() {
            bounds = Some(match bounds {
                None => (v, v),
                Some((min, max)) => (min.inf(&v), max.sup(&v)),
            });
        }
    }
    bounds
}

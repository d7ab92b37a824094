//! Half-edge convex hulls.
//!
//! A hull is stored as three blobs:
//!
//! - vertices: 12-byte positions, indexed by vertex number;
//! - edges: 4-byte half-edge records `(next, twin, origin, face)`, indexed by
//!   half-edge number;
//! - faces: one byte per face holding the index of a half-edge on that face.
//!
//! Each face is recovered by following `next` from its start half-edge until
//! the loop closes, then fanned into triangles around the start vertex.
//!
//! # Malformed input
//!
//! A face loop can never legitimately visit more half-edges than the hull
//! holds, so traversal stops with [`ExtractError::MalformedGeometry`] once it
//! does. Out-of-range half-edge or vertex indices fail the same way.

use super::{read_vertices, Triangle, Vec3};
use crate::error::{ExtractError, Result};

/// Size in bytes of one half-edge record.
pub const HALF_EDGE_SIZE: usize = 4;

/// A half-edge record as stored in a hull blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HalfEdge {
    /// The next half-edge around the same face.
    pub next: u8,

    /// The opposite half-edge. Not needed for triangulation.
    pub twin: u8,

    /// The vertex this half-edge starts at.
    pub origin: u8,

    /// The face this half-edge belongs to. Not needed for triangulation.
    pub face: u8,
}

impl HalfEdge {
    /// Decode a 4-byte record.
    #[inline]
    pub fn from_bytes(rec: [u8; HALF_EDGE_SIZE]) -> Self {
        Self {
            next: rec[0],
            twin: rec[1],
            origin: rec[2],
            face: rec[3],
        }
    }
}

/// A decoded half-edge hull.
#[derive(Debug, Clone)]
pub struct Hull {
    vertices: Vec<Vec3>,
    faces: Vec<u8>,
    edges: Vec<HalfEdge>,
}

impl Hull {
    /// Decode hull blobs. Trailing partial records are ignored.
    pub fn parse(vertices: &[u8], faces: &[u8], edges: &[u8]) -> Self {
        let edges = edges
            .chunks_exact(HALF_EDGE_SIZE)
            .map(|rec| HalfEdge::from_bytes([rec[0], rec[1], rec[2], rec[3]]))
            .collect();

        Self {
            vertices: read_vertices(vertices),
            faces: faces.to_vec(),
            edges,
        }
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Start half-edge of each face.
    pub fn faces(&self) -> &[u8] {
        &self.faces
    }

    /// All half-edges.
    pub fn edges(&self) -> &[HalfEdge] {
        &self.edges
    }

    /// Get a half-edge by index.
    #[inline]
    pub fn half_edge(&self, index: u8) -> Result<&HalfEdge> {
        self.edges.get(index as usize).ok_or_else(|| {
            ExtractError::malformed(format!(
                "half-edge {} out of range ({} half-edges)",
                index,
                self.edges.len()
            ))
        })
    }

    /// Position of the vertex a half-edge starts at.
    #[inline]
    pub fn origin(&self, index: u8) -> Result<Vec3> {
        let origin = self.half_edge(index)?.origin;
        self.vertices.get(origin as usize).copied().ok_or_else(|| {
            ExtractError::malformed(format!(
                "half-edge {} starts at vertex {} out of range ({} vertices)",
                index,
                origin,
                self.vertices.len()
            ))
        })
    }

    /// Iterate the half-edges of the face that starts at `start`.
    pub fn face_loop(&self, start: u8) -> FaceLoop<'_> {
        FaceLoop {
            hull: self,
            start,
            current: Some(start),
            steps: 0,
        }
    }

    /// Fan-triangulate one face and append the triangles to `out`.
    ///
    /// An n-sided face produces n - 2 triangles, all sharing the start
    /// half-edge's origin. The walk's closing (start, last, start) triangle
    /// is degenerate and is not emitted.
    pub fn triangulate_face(&self, start: u8, out: &mut Vec<Triangle>) -> Result<()> {
        let ring = self.face_loop(start).collect::<Result<Vec<u8>>>()?;
        let Some((&first, rest)) = ring.split_first() else {
            return Ok(());
        };

        let root = self.origin(first)?;
        for pair in rest.windows(2) {
            out.push(Triangle::new(root, self.origin(pair[0])?, self.origin(pair[1])?));
        }
        Ok(())
    }

    /// Triangulate every face in face order.
    pub fn triangles(&self) -> Result<Vec<Triangle>> {
        let mut out = Vec::with_capacity(self.edges.len());
        for &start in &self.faces {
            self.triangulate_face(start, &mut out)?;
        }
        Ok(out)
    }
}

/// Iterator over the half-edges around one hull face.
///
/// Yields the start half-edge first. Yields an error and stops if the loop
/// runs longer than the hull's half-edge count or leaves the edge array.
pub struct FaceLoop<'a> {
    hull: &'a Hull,
    start: u8,
    current: Option<u8>,
    steps: usize,
}

impl Iterator for FaceLoop<'_> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;

        if self.steps >= self.hull.edges.len() {
            self.current = None;
            return Some(Err(ExtractError::malformed(format!(
                "face starting at half-edge {} does not close within {} steps",
                self.start,
                self.hull.edges.len()
            ))));
        }
        self.steps += 1;

        match self.hull.half_edge(current) {
            Ok(he) => {
                self.current = (he.next != self.start).then_some(he.next);
                Some(Ok(current))
            }
            Err(e) => {
                self.current = None;
                Some(Err(e))
            }
        }
    }
}

/// Triangulate a half-edge hull given as raw blobs.
///
/// # Example
///
/// ```
/// use phystri::geometry::extract_hull_triangles;
///
/// // A single triangular face: 0 -> 1 -> 2 -> 0.
/// let mut vertices = Vec::new();
/// for c in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
///     vertices.extend_from_slice(&c.to_le_bytes());
/// }
/// let edges = [1, 0, 0, 0, 2, 0, 1, 0, 0, 0, 2, 0];
/// let faces = [0];
///
/// let triangles = extract_hull_triangles(&vertices, &faces, &edges).unwrap();
/// assert_eq!(triangles.len(), 1);
/// ```
pub fn extract_hull_triangles(vertices: &[u8], faces: &[u8], edges: &[u8]) -> Result<Vec<Triangle>> {
    Hull::parse(vertices, faces, edges).triangles()
}

//! Indexed triangle meshes.
//!
//! A mesh shape carries a vertex blob and a triangle blob. The triangle blob is
//! a flat array of little-endian `i32` vertex indices, three per triangle.

use super::{read_vertices, Triangle, Vec3};
use crate::bytes::ByteReader;
use crate::error::{ExtractError, Result};

/// Size in bytes of one triangle's index triple.
pub const TRIANGLE_INDEX_SIZE: usize = 12;

/// Resolve the triangles of an indexed mesh given as raw blobs.
///
/// The triangle count is `triangles.len() / 12`; a trailing partial triple is
/// ignored. A negative or out-of-range index fails with
/// [`ExtractError::MalformedGeometry`].
pub fn extract_mesh_triangles(vertices: &[u8], triangles: &[u8]) -> Result<Vec<Triangle>> {
    let vertices = read_vertices(vertices);
    let count = triangles.len() / TRIANGLE_INDEX_SIZE;

    let mut reader = ByteReader::new(triangles);
    let mut out = Vec::with_capacity(count);

    for t in 0..count {
        let a = lookup(&vertices, reader.read_i32()?, t)?;
        let b = lookup(&vertices, reader.read_i32()?, t)?;
        let c = lookup(&vertices, reader.read_i32()?, t)?;
        out.push(Triangle::new(a, b, c));
    }

    Ok(out)
}

fn lookup(vertices: &[Vec3], index: i32, triangle: usize) -> Result<Vec3> {
    usize::try_from(index)
        .ok()
        .and_then(|i| vertices.get(i))
        .copied()
        .ok_or_else(|| {
            ExtractError::malformed(format!(
                "triangle {} references vertex {} out of range ({} vertices)",
                triangle,
                index,
                vertices.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::hull_fixtures::vertex_blob;

    fn index_blob(indices: &[i32]) -> Vec<u8> {
        indices.iter().flat_map(|i| i.to_le_bytes()).collect()
    }

    const POSITIONS: [[f32; 3]; 8] = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [1.0, 1.0, 0.0],
        [0.0, 1.0, 0.0],
        [0.0, 0.0, 2.0],
        [1.0, 0.0, 2.0],
        [1.0, 1.0, 2.0],
        [0.0, 1.0, 2.0],
    ];

    fn p(i: usize) -> Vec3 {
        Vec3::new(POSITIONS[i][0], POSITIONS[i][1], POSITIONS[i][2])
    }

    #[test]
    fn test_two_triangles() {
        let vertices = vertex_blob(&POSITIONS);
        let triangles = index_blob(&[0, 1, 2, 7, 5, 4]);

        let out = extract_mesh_triangles(&vertices, &triangles).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Triangle::new(p(0), p(1), p(2)));
        assert_eq!(out[1], Triangle::new(p(7), p(5), p(4)));
    }

    #[test]
    fn test_trailing_partial_triple_ignored() {
        let vertices = vertex_blob(&POSITIONS);
        let mut triangles = index_blob(&[3, 2, 1]);
        triangles.extend_from_slice(&[0, 0, 0, 0, 1, 0]);

        let out = extract_mesh_triangles(&vertices, &triangles).unwrap();
        assert_eq!(out, vec![Triangle::new(p(3), p(2), p(1))]);
    }

    #[test]
    fn test_index_out_of_range() {
        let vertices = vertex_blob(&POSITIONS);
        for bad in [8, -1, i32::MAX] {
            let triangles = index_blob(&[0, 1, bad]);
            match extract_mesh_triangles(&vertices, &triangles) {
                Err(ExtractError::MalformedGeometry { details }) => {
                    assert!(details.contains(&bad.to_string()), "{}", details);
                }
                other => panic!("expected MalformedGeometry for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_empty_mesh() {
        assert!(extract_mesh_triangles(&vertex_blob(&POSITIONS), &[]).unwrap().is_empty());
    }
}

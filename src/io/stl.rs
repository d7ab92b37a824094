//! STL export for inspection.
//!
//! Collision triangles can be written as binary STL and opened in any mesh
//! viewer. STL has no notion of chunks, so chunks are flattened on save and a
//! loaded file is a single triangle list. Per-face normals are computed from
//! the winding; degenerate triangles get a zero normal.

use std::fs::File;
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use crate::error::{ExtractError, Result};
use crate::geometry::{Triangle, Vec3};

fn to_stl(triangle: &Triangle) -> stl_io::Triangle {
    let n = triangle.normal();
    let v = |p: &Vec3| stl_io::Vertex::new([p.x, p.y, p.z]);
    stl_io::Triangle {
        normal: stl_io::Normal::new([n.x, n.y, n.z]),
        vertices: [v(&triangle.a), v(&triangle.b), v(&triangle.c)],
    }
}

/// Write chunks as binary STL to any writer.
pub fn write_to<W: Write, C: AsRef<[Triangle]>>(writer: &mut W, chunks: &[C]) -> std::io::Result<()> {
    let triangles: Vec<stl_io::Triangle> = chunks
        .iter()
        .flat_map(|c| c.as_ref().iter())
        .map(to_stl)
        .collect();
    stl_io::write_stl(writer, triangles.iter())
}

/// Read triangles from binary or ASCII STL.
///
/// Corner order is kept as stored; stored normals are ignored.
pub fn read_from<R: Read + Seek>(reader: &mut R) -> std::io::Result<Vec<Triangle>> {
    let stl = stl_io::read_stl(reader)?;
    let vertex = |i: usize| -> std::io::Result<Vec3> {
        let v = stl.vertices.get(i).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("face references vertex {} of {}", i, stl.vertices.len()),
            )
        })?;
        Ok(Vec3::new(v[0], v[1], v[2]))
    };

    stl.faces
        .iter()
        .map(|face| {
            Ok(Triangle::new(
                vertex(face.vertices[0])?,
                vertex(face.vertices[1])?,
                vertex(face.vertices[2])?,
            ))
        })
        .collect()
}

/// Save chunks to a binary STL file.
///
/// # Example
///
/// ```no_run
/// use phystri::geometry::{Triangle, Vec3};
/// use phystri::io::stl;
///
/// let t = Triangle::new(Vec3::origin(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
/// stl::save(&[vec![t]], "collision.stl").unwrap();
/// ```
pub fn save<C: AsRef<[Triangle]>, P: AsRef<Path>>(chunks: &[C], path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_to(&mut writer, chunks)
        .and_then(|_| writer.flush())
        .map_err(|e| ExtractError::SaveError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load triangles from an STL file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Triangle>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    read_from(&mut file).map_err(|e| ExtractError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

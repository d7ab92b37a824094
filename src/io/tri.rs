//! Flat triangle stream (`.tri`).
//!
//! A `.tri` file is a bare sequence of 36-byte records with no header. Each
//! record is nine little-endian `f32`: the x, y, z of corners a, b and c.

use std::fs;
use std::path::Path;

use crate::bytes::{put_vec3, ByteReader};
use crate::error::Result;
use crate::geometry::Triangle;

/// Size in bytes of one encoded triangle.
pub const TRIANGLE_RECORD_SIZE: usize = 36;

/// Append one triangle record to `buf`.
#[inline]
pub(crate) fn put_triangle(buf: &mut Vec<u8>, triangle: &Triangle) {
    put_vec3(buf, &triangle.a);
    put_vec3(buf, &triangle.b);
    put_vec3(buf, &triangle.c);
}

/// Read one triangle record.
///
/// The whole record is claimed up front, so a short tail reports the full
/// record size as needed.
#[inline]
pub(crate) fn read_triangle(reader: &mut ByteReader<'_>) -> Result<Triangle> {
    let mut record = ByteReader::new(reader.take(TRIANGLE_RECORD_SIZE)?);
    Ok(Triangle::new(
        record.read_vec3()?,
        record.read_vec3()?,
        record.read_vec3()?,
    ))
}

/// Encode triangles as a flat stream.
///
/// # Example
///
/// ```
/// use phystri::geometry::{Triangle, Vec3};
/// use phystri::io::tri;
///
/// let t = Triangle::new(Vec3::origin(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
/// let bytes = tri::encode(&[t]);
/// assert_eq!(bytes.len(), tri::TRIANGLE_RECORD_SIZE);
/// assert_eq!(tri::decode(&bytes).unwrap(), vec![t]);
/// ```
pub fn encode(triangles: &[Triangle]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(triangles.len() * TRIANGLE_RECORD_SIZE);
    for triangle in triangles {
        put_triangle(&mut buf, triangle);
    }
    buf
}

/// Decode a flat stream.
///
/// Fails with [`ExtractError::TruncatedRecord`](crate::ExtractError::TruncatedRecord)
/// if the stream ends inside a record.
pub fn decode(bytes: &[u8]) -> Result<Vec<Triangle>> {
    let mut reader = ByteReader::new(bytes);
    let mut out = Vec::with_capacity(bytes.len() / TRIANGLE_RECORD_SIZE);
    while !reader.is_empty() {
        out.push(read_triangle(&mut reader)?);
    }
    Ok(out)
}

/// Write triangles to a `.tri` file.
pub fn save<P: AsRef<Path>>(triangles: &[Triangle], path: P) -> Result<()> {
    fs::write(path, encode(triangles))?;
    Ok(())
}

/// Read triangles from a `.tri` file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Triangle>> {
    decode(&fs::read(path)?)
}

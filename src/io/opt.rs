//! Chunked triangle stream (`.opt`).
//!
//! Layout, all little-endian:
//!
//! ```text
//! u64 chunk_count
//! repeat chunk_count times:
//!     u64 triangle_count
//!     triangle_count * 36-byte triangle records (see `tri`)
//! ```
//!
//! Chunk boundaries are kept so each collision part stays a separate unit.
//! A chunk with zero triangles is written as a bare zero count.

use std::fs;
use std::path::Path;

use super::tri::{put_triangle, read_triangle, TRIANGLE_RECORD_SIZE};
use crate::bytes::ByteReader;
use crate::error::{ExtractError, Result};
use crate::geometry::Triangle;

/// Size in bytes of a count field.
pub const COUNT_SIZE: usize = 8;

/// Encode chunks as a chunked stream.
///
/// # Example
///
/// ```
/// use phystri::geometry::{Triangle, Vec3};
/// use phystri::io::opt;
///
/// let t = Triangle::new(Vec3::origin(), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
/// let chunks = vec![vec![t, t], vec![], vec![t]];
///
/// let bytes = opt::encode(&chunks);
/// assert_eq!(opt::decode(&bytes).unwrap(), chunks);
/// ```
///
/// Zero chunks encode to a bare zero count, which [`decode`] rejects.
pub fn encode<C: AsRef<[Triangle]>>(chunks: &[C]) -> Vec<u8> {
    if chunks.is_empty() {
        log::warn!("encoding zero chunks; the stream will not decode");
    }
    let size = COUNT_SIZE
        + chunks
            .iter()
            .map(|c| COUNT_SIZE + c.as_ref().len() * TRIANGLE_RECORD_SIZE)
            .sum::<usize>();

    let mut buf = Vec::with_capacity(size);
    buf.extend_from_slice(&(chunks.len() as u64).to_le_bytes());
    for chunk in chunks {
        let triangles = chunk.as_ref();
        buf.extend_from_slice(&(triangles.len() as u64).to_le_bytes());
        for triangle in triangles {
            put_triangle(&mut buf, triangle);
        }
    }
    buf
}

/// Decode a chunked stream.
///
/// Fails with [`ExtractError::ZeroChunkCount`] when the stream declares no
/// chunks and with [`ExtractError::TruncatedRecord`] when it ends early.
/// Bytes after the last chunk are ignored.
pub fn decode(bytes: &[u8]) -> Result<Vec<Vec<Triangle>>> {
    let mut reader = ByteReader::new(bytes);

    let chunk_count = reader.read_u64()?;
    if chunk_count == 0 {
        return Err(ExtractError::ZeroChunkCount);
    }

    let mut chunks = Vec::new();
    for _ in 0..chunk_count {
        let count = reader.read_u64()?;
        let len = usize::try_from(count)
            .ok()
            .and_then(|n| n.checked_mul(TRIANGLE_RECORD_SIZE))
            .unwrap_or(usize::MAX);

        let mut records = ByteReader::new(reader.take(len)?);
        let mut triangles = Vec::with_capacity(len / TRIANGLE_RECORD_SIZE);
        while !records.is_empty() {
            triangles.push(read_triangle(&mut records)?);
        }
        chunks.push(triangles);
    }

    if !reader.is_empty() {
        log::debug!("ignoring {} bytes after the last chunk", reader.remaining());
    }

    Ok(chunks)
}

/// Write chunks to an `.opt` file.
pub fn save<C: AsRef<[Triangle]>, P: AsRef<Path>>(chunks: &[C], path: P) -> Result<()> {
    fs::write(path, encode(chunks))?;
    Ok(())
}

/// Read chunks from an `.opt` file.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Triangle>>> {
    decode(&fs::read(path)?)
}

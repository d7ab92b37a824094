//! Little-endian byte reading helpers.
//!
//! All binary inputs (resource containers, geometry blobs and triangle streams)
//! are read through [`ByteReader`], a bounds-checked cursor over a borrowed
//! slice. Every read that would run past the end fails with
//! [`ExtractError::TruncatedRecord`].

use crate::error::{ExtractError, Result};
use crate::geometry::Vec3;

/// Size in bytes of one vertex record (three `f32`).
pub const VEC3_SIZE: usize = 12;

/// A bounds-checked little-endian cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a reader positioned at the start of `buffer`.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Current absolute position.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Whether the cursor has consumed the whole buffer.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Move the cursor to an absolute position.
    ///
    /// Seeking to exactly the end of the buffer is allowed.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.buffer.len() {
            return Err(ExtractError::TruncatedRecord {
                offset: position,
                needed: 0,
                available: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Move the cursor by a signed delta.
    pub fn skip(&mut self, delta: i64) -> Result<()> {
        let target = i64::try_from(self.position)
            .ok()
            .and_then(|p| p.checked_add(delta))
            .and_then(|p| usize::try_from(p).ok())
            .ok_or_else(|| {
                ExtractError::malformed(format!(
                    "seek by {} from offset {} leaves the buffer",
                    delta, self.position
                ))
            })?;
        self.seek(target)
    }

    /// Borrow the next `len` bytes and advance past them.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let available = self.remaining();
        if len > available {
            return Err(ExtractError::TruncatedRecord {
                offset: self.position,
                needed: len,
                available,
            });
        }
        let slice = &self.buffer[self.position..self.position + len];
        self.position += len;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Read a `u8`.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Read a little-endian `u16`.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian `u32`.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian `i32`.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian `u64`.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    /// Read a little-endian `f32`.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.take_array().map(f32::from_le_bytes)
    }

    /// Read three little-endian `f32` as a point.
    #[inline]
    pub fn read_vec3(&mut self) -> Result<Vec3> {
        let x = self.read_f32()?;
        let y = self.read_f32()?;
        let z = self.read_f32()?;
        Ok(Vec3::new(x, y, z))
    }
}

/// Append a point as three little-endian `f32`.
#[inline]
pub fn put_vec3(buf: &mut Vec<u8>, v: &Vec3) {
    buf.extend_from_slice(&v.x.to_le_bytes());
    buf.extend_from_slice(&v.y.to_le_bytes());
    buf.extend_from_slice(&v.z.to_le_bytes());
}

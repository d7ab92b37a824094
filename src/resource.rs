//! Compiled resource container scanning.
//!
//! A compiled resource starts with a fixed 16-byte header followed (at a
//! relative offset) by a block directory. Each directory entry names a block by
//! a four-character tag and addresses its payload with an offset relative to
//! the end of the entry's offset field.
//!
//! ```text
//! 0x00  u32  file size
//! 0x04  u16  header version
//! 0x06  u16  file version
//! 0x08  u32  block table offset (relative to 0x08)
//! 0x0C  u32  block count
//!
//! entry:
//! +0    u32  type tag ("PHYS", "DATA", ...)
//! +4    u32  data offset (relative to +8)
//! +8    u32  data size
//! ```
//!
//! Only the directory and the requested block are touched; block payloads are
//! returned as borrowed slices.

use std::fmt;
use std::str::FromStr;

use crate::bytes::ByteReader;
use crate::error::{ExtractError, Result};

/// Size of the fixed resource header.
pub const HEADER_SIZE: usize = 16;

/// A four-character block type tag packed little-endian into a `u32`.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct BlockType(u32);

impl BlockType {
    /// Physics data (collision shapes).
    pub const PHYS: BlockType = BlockType::from_tag(b"PHYS");
    /// Generic resource data.
    pub const DATA: BlockType = BlockType::from_tag(b"DATA");
    /// Introspection manifest.
    pub const NTRO: BlockType = BlockType::from_tag(b"NTRO");
    /// External resource references.
    pub const RERL: BlockType = BlockType::from_tag(b"RERL");
    /// Resource edit info.
    pub const REDI: BlockType = BlockType::from_tag(b"REDI");
    /// Resource edit info, version 2.
    pub const RED2: BlockType = BlockType::from_tag(b"RED2");
    /// Mesh buffers.
    pub const MBUF: BlockType = BlockType::from_tag(b"MBUF");
    /// Model control data.
    pub const CTRL: BlockType = BlockType::from_tag(b"CTRL");
    /// Model data.
    pub const MDAT: BlockType = BlockType::from_tag(b"MDAT");
    /// Animation group.
    pub const AGRP: BlockType = BlockType::from_tag(b"AGRP");

    /// Pack a four-byte ASCII tag.
    pub const fn from_tag(tag: &[u8; 4]) -> Self {
        BlockType(u32::from_le_bytes(*tag))
    }

    /// Wrap a raw packed tag as read from a block directory.
    pub const fn from_raw(raw: u32) -> Self {
        BlockType(raw)
    }

    /// The packed `u32` value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The tag bytes in file order.
    pub const fn tag(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.tag() {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockType({})", self)
    }
}

impl FromStr for BlockType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii) {
            return Err(format!("block type must be four ASCII characters, got {:?}", s));
        }
        Ok(BlockType::from_tag(&[bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// The fixed header at the start of a compiled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHeader {
    /// Total file size as recorded in the header.
    pub file_size: u32,
    /// Header layout version.
    pub header_version: u16,
    /// Resource file version.
    pub version: u16,
    /// Absolute offset of the first block directory entry.
    pub block_table_offset: usize,
    /// Number of block directory entries.
    pub block_count: u32,
}

impl ResourceHeader {
    /// Parse the header from the start of a resource buffer.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        Self::read(&mut reader)
    }

    /// Read the header and leave `reader` at the first directory entry.
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let file_size = reader.read_u32()?;
        let header_version = reader.read_u16()?;
        let version = reader.read_u16()?;
        let block_offset = reader.read_u32()?;
        let block_count = reader.read_u32()?;

        // The table offset counts from its own field, which sits 8 bytes
        // before the cursor.
        reader.skip(i64::from(block_offset) - 8)?;

        Ok(Self {
            file_size,
            header_version,
            version,
            block_table_offset: reader.position(),
            block_count,
        })
    }
}

/// One entry of the block directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDirectoryEntry {
    /// Block type tag.
    pub block_type: BlockType,
    /// Absolute offset of the block payload.
    pub offset: usize,
    /// Payload size in bytes. Zero means the block is present but empty.
    pub size: usize,
}

impl BlockDirectoryEntry {
    /// Whether this entry carries no payload.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}

/// Iterator over the block directory of a resource buffer.
///
/// Entries are read lazily; the first read error is yielded once and ends
/// iteration.
pub struct BlockEntries<'a> {
    reader: ByteReader<'a>,
    remaining: u32,
}

impl<'a> BlockEntries<'a> {
    /// Start reading the directory of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let mut reader = ByteReader::new(bytes);
        let header = ResourceHeader::read(&mut reader)?;
        Ok(Self {
            reader,
            remaining: header.block_count,
        })
    }

    fn read_entry(&mut self) -> Result<BlockDirectoryEntry> {
        let block_type = BlockType::from_raw(self.reader.read_u32()?);

        let base = self.reader.position();
        let rel_offset = self.reader.read_u32()? as usize;
        // Payload offset counts from the end of the offset field.
        let data_base = self.reader.position();
        let size = self.reader.read_u32()? as usize;

        // Next entry: offset field + size field past the base.
        self.reader.seek(base + 8)?;

        Ok(BlockDirectoryEntry {
            block_type,
            offset: data_base + rel_offset,
            size,
        })
    }
}

impl Iterator for BlockEntries<'_> {
    type Item = Result<BlockDirectoryEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let entry = self.read_entry();
        if entry.is_err() {
            self.remaining = 0;
        }
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining as usize))
    }
}

/// Borrow the payload an entry points at.
pub fn block_data<'a>(bytes: &'a [u8], entry: &BlockDirectoryEntry) -> Result<&'a [u8]> {
    let mut reader = ByteReader::new(bytes);
    reader.seek(entry.offset).map_err(|_| ExtractError::TruncatedRecord {
        offset: entry.offset,
        needed: entry.size,
        available: 0,
    })?;
    reader.take(entry.size)
}

/// Find the first non-empty block of `block_type` and borrow its payload.
///
/// Entries with a matching tag but zero size are skipped. Fails with
/// [`ExtractError::BlockNotFound`] when the directory is exhausted.
///
/// # Example
///
/// ```no_run
/// use phystri::resource::{find_block, BlockType};
///
/// let bytes = std::fs::read("world_physics.vmdl_c").unwrap();
/// let physics = find_block(&bytes, BlockType::PHYS).unwrap();
/// println!("PHYS block: {} bytes", physics.len());
/// ```
pub fn find_block(bytes: &[u8], block_type: BlockType) -> Result<&[u8]> {
    for entry in BlockEntries::new(bytes)? {
        let entry = entry?;
        if entry.block_type == block_type && !entry.is_empty() {
            log::debug!(
                "found {} block at offset {} ({} bytes)",
                block_type,
                entry.offset,
                entry.size
            );
            return block_data(bytes, &entry);
        }
    }
    Err(ExtractError::BlockNotFound { block: block_type })
}

/// A parsed resource: header plus the full block directory.
#[derive(Debug, Clone)]
pub struct ResourceFile<'a> {
    bytes: &'a [u8],
    header: ResourceHeader,
    entries: Vec<BlockDirectoryEntry>,
}

impl<'a> ResourceFile<'a> {
    /// Parse the header and block directory of `bytes`.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let header = ResourceHeader::parse(bytes)?;
        let entries = BlockEntries::new(bytes)?.collect::<Result<Vec<_>>>()?;
        Ok(Self {
            bytes,
            header,
            entries,
        })
    }

    /// The resource header.
    pub fn header(&self) -> &ResourceHeader {
        &self.header
    }

    /// All directory entries in file order.
    pub fn entries(&self) -> &[BlockDirectoryEntry] {
        &self.entries
    }

    /// The first non-empty entry of the given type.
    pub fn find(&self, block_type: BlockType) -> Option<&BlockDirectoryEntry> {
        self.entries
            .iter()
            .find(|e| e.block_type == block_type && !e.is_empty())
    }

    /// Borrow the payload of an entry.
    pub fn block_data(&self, entry: &BlockDirectoryEntry) -> Result<&'a [u8]> {
        block_data(self.bytes, entry)
    }

    /// Borrow the payload of the first non-empty block of the given type.
    pub fn block(&self, block_type: BlockType) -> Result<&'a [u8]> {
        let entry = self
            .find(block_type)
            .ok_or(ExtractError::BlockNotFound { block: block_type })?;
        self.block_data(entry)
    }
}

/// Build a resource container from `(type, payload)` pairs.
///
/// The directory immediately follows the header and payloads follow the
/// directory in order. Used by tests and benchmarks.
#[doc(hidden)]
pub fn build_container(blocks: &[(BlockType, &[u8])]) -> Vec<u8> {
    let table_start = HEADER_SIZE;
    let mut data_offset = table_start + blocks.len() * 12;

    let mut table = Vec::with_capacity(blocks.len() * 12);
    let mut payload = Vec::new();
    for (i, (block_type, data)) in blocks.iter().enumerate() {
        let offset_field_end = table_start + i * 12 + 8;
        table.extend_from_slice(&block_type.raw().to_le_bytes());
        table.extend_from_slice(&((data_offset - offset_field_end) as u32).to_le_bytes());
        table.extend_from_slice(&(data.len() as u32).to_le_bytes());
        payload.extend_from_slice(data);
        data_offset += data.len();
    }

    let total = data_offset;
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&12u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes());
    out.extend_from_slice(&8u32.to_le_bytes());
    out.extend_from_slice(&(blocks.len() as u32).to_le_bytes());
    out.extend_from_slice(&table);
    out.extend_from_slice(&payload);
    out
}

//! Triangle file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Flat | `.tri` | ✓ | ✓ | Headerless 36-byte records |
//! | Chunked | `.opt` | ✓ | ✓ | One chunk per collision part |
//! | STL | `.stl` | ✓ | ✓ | Binary on save, binary or ASCII on load |
//!
//! # Usage
//!
//! [`load`] and [`save`] pick the format from the file extension and always
//! work in chunks. Formats without chunk boundaries save the chunks
//! flattened and load as a single chunk.
//!
//! ```no_run
//! use phystri::io::{load, save};
//!
//! let chunks = load("de_dust2.opt").unwrap();
//! save(&chunks, "de_dust2.stl").unwrap();
//! ```
//!
//! The format modules also work on in-memory buffers:
//!
//! ```no_run
//! use phystri::io::tri;
//!
//! let bytes = std::fs::read("de_dust2.tri").unwrap();
//! let triangles = tri::decode(&bytes).unwrap();
//! ```

pub mod opt;
pub mod stl;
pub mod tri;

use std::fmt;
use std::path::Path;

use crate::error::{ExtractError, Result};
use crate::geometry::Triangle;

/// Supported triangle file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Flat triangle stream.
    Tri,
    /// Chunked triangle stream.
    Opt,
    /// STL (stereolithography) format.
    Stl,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "tri" => Some(Format::Tri),
            "opt" => Some(Format::Opt),
            "stl" => Some(Format::Stl),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Tri => "tri",
            Format::Opt => "opt",
            Format::Stl => "stl",
        }
    }

    /// Whether the format keeps chunk boundaries.
    pub fn is_chunked(self) -> bool {
        self == Format::Opt
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| ExtractError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load triangle chunks from a file with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<Triangle>>> {
    let path = path.as_ref();
    let chunks = match detect(path)? {
        Format::Tri => vec![tri::load(path)?],
        Format::Opt => opt::load(path)?,
        Format::Stl => vec![stl::load(path)?],
    };
    log::debug!("loaded {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}

/// Save triangle chunks to a file with automatic format detection.
pub fn save<C: AsRef<[Triangle]>, P: AsRef<Path>>(chunks: &[C], path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Tri => tri::save(&flatten(chunks), path),
        Format::Opt => opt::save(chunks, path),
        Format::Stl => stl::save(chunks, path),
    }
}

fn flatten<C: AsRef<[Triangle]>>(chunks: &[C]) -> Vec<Triangle> {
    let len = chunks.iter().map(|c| c.as_ref().len()).sum();
    let mut out = Vec::with_capacity(len);
    for chunk in chunks {
        out.extend_from_slice(chunk.as_ref());
    }
    out
}

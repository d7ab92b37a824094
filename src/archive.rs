//! Archive access.
//!
//! Compiled map archives are opened by an external reader; this crate only
//! needs "give me the bytes of the entry at this logical path". The
//! [`ArchiveReader`] trait captures that, with two implementations:
//!
//! - [`MemoryArchive`] holds entries in memory (tests, embedding).
//! - [`DirectoryArchive`] reads entries from an unpacked archive on disk.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Logical path of a map's compiled physics resource.
///
/// ```
/// assert_eq!(
///     phystri::archive::world_physics_path("de_dust2"),
///     "maps/de_dust2/world_physics.vmdl_c"
/// );
/// ```
pub fn world_physics_path(map: &str) -> String {
    format!("maps/{}/world_physics.vmdl_c", map)
}

/// Read access to the entries of a game archive.
pub trait ArchiveReader {
    /// Read the full contents of the entry at `path`.
    ///
    /// Fails with [`ExtractError::EntryNotFound`] when no such entry exists.
    fn read_entry(&self, path: &str) -> Result<Vec<u8>>;

    /// Whether an entry exists at `path`.
    fn contains(&self, path: &str) -> bool {
        self.read_entry(path).is_ok()
    }
}

impl<A: ArchiveReader + ?Sized> ArchiveReader for &A {
    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        (**self).read_entry(path)
    }

    fn contains(&self, path: &str) -> bool {
        (**self).contains(path)
    }
}

/// An archive whose entries live in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryArchive {
    /// Create an empty archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, path: impl Into<String>, data: Vec<u8>) {
        self.entries.insert(path.into(), data);
    }

    /// Add an entry, builder style.
    pub fn with_entry(mut self, path: impl Into<String>, data: Vec<u8>) -> Self {
        self.insert(path, data);
        self
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ArchiveReader for MemoryArchive {
    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        self.entries
            .get(path)
            .cloned()
            .ok_or_else(|| ExtractError::EntryNotFound {
                path: path.to_string(),
            })
    }

    fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }
}

/// An archive unpacked into a directory tree.
///
/// Logical paths use `/` separators and are resolved relative to the root.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    /// Open an unpacked archive rooted at `root`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(ExtractError::Io(std::io::Error::new(
                ErrorKind::NotFound,
                format!("{} is not a directory", root.display()),
            )));
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// The archive root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|c| !c.is_empty())
            .fold(self.root.clone(), |acc, c| acc.join(c))
    }
}

impl ArchiveReader for DirectoryArchive {
    fn read_entry(&self, path: &str) -> Result<Vec<u8>> {
        let full = self.resolve(path);
        log::debug!("reading archive entry {} from {}", path, full.display());
        match fs::read(&full) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(ExtractError::EntryNotFound {
                path: path.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

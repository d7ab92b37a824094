//! Error types for phystri.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

use crate::resource::BlockType;

/// Result type alias using [`ExtractError`].
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Errors that can occur while locating, extracting or encoding collision geometry.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive has no entry at the requested logical path.
    #[error("archive entry not found: {path}")]
    EntryNotFound {
        /// The logical path that was looked up.
        path: String,
    },

    /// The resource container has no non-empty block of the requested type.
    #[error("resource has no {block} block")]
    BlockNotFound {
        /// The requested block type.
        block: BlockType,
    },

    /// Hull or mesh data does not describe valid geometry.
    #[error("malformed geometry: {details}")]
    MalformedGeometry {
        /// Description of the malformed condition.
        details: String,
    },

    /// A read needed more bytes than the buffer holds.
    #[error("truncated record at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedRecord {
        /// Byte offset the read started at.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer.
        available: usize,
    },

    /// A chunked triangle stream declares zero chunks.
    #[error("chunked triangle stream declares zero chunks")]
    ZeroChunkCount,

    /// A selected collision part lacks a field, or the field has the wrong type.
    #[error("missing or invalid field {path} (expected {expected})")]
    MissingField {
        /// Path of the field in the decoded tree.
        path: String,
        /// What kind of value was expected.
        expected: &'static str,
    },

    /// The key-value decoder rejected its input.
    #[error("failed to decode key-value data: {0}")]
    Decode(String),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading triangles from file.
    #[error("failed to load triangles from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving triangles to file.
    #[error("failed to save triangles to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl ExtractError {
    /// Create a malformed geometry error.
    pub fn malformed<T: std::fmt::Display>(details: T) -> Self {
        ExtractError::MalformedGeometry {
            details: details.to_string(),
        }
    }

    /// Whether this error only invalidates a single collision part.
    ///
    /// Part-level failures can be skipped while extraction continues with the
    /// remaining parts.
    pub fn is_part_failure(&self) -> bool {
        matches!(
            self,
            ExtractError::MalformedGeometry { .. } | ExtractError::MissingField { .. }
        )
    }
}

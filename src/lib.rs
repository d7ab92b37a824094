//! # phystri
//!
//! Extracts collision triangles from compiled game map resources and writes
//! them out as simple flat triangle files.
//!
//! A map's compiled physics resource is a block container. Its `PHYS` block
//! holds a key-value tree describing collision shapes: convex hulls stored as
//! half-edge structures, and indexed triangle meshes. phystri finds the block,
//! walks the tree, triangulates every solid shape and encodes the result.
//!
//! ## Features
//!
//! - **Resource scanning**: locate a typed block in a container without
//!   copying ([`resource`])
//! - **Hull triangulation**: fan-triangulate half-edge hull faces with cycle
//!   detection ([`geometry`])
//! - **Attribute filtering**: extract only shapes in a chosen collision group
//!   ([`extract`])
//! - **Output formats**: flat `.tri`, chunked `.opt` and STL ([`io`])
//! - **Pluggable collaborators**: bring your own archive reader and key-value
//!   decoder ([`archive`], [`kv`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use phystri::prelude::*;
//!
//! let archive = DirectoryArchive::open("unpacked_maps").unwrap();
//! let parser = MapParser::new(archive, JsonKvDecoder);
//!
//! let extraction = parser.extract_map("de_dust2").unwrap();
//! println!("Chunks: {}", extraction.chunks.len());
//! println!("Triangles: {}", extraction.num_triangles());
//!
//! phystri::io::save(&extraction.chunks, "de_dust2.opt").unwrap();
//! ```
//!
//! ## Working with Blocks Directly
//!
//! ```
//! use phystri::resource::{build_container, find_block, BlockType};
//!
//! let container = build_container(&[
//!     (BlockType::DATA, b"data".as_slice()),
//!     (BlockType::PHYS, b"physics".as_slice()),
//! ]);
//!
//! assert_eq!(find_block(&container, BlockType::PHYS).unwrap(), b"physics");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod bytes;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod io;
pub mod kv;
pub mod pipeline;
pub mod resource;

pub use error::{ExtractError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use phystri::prelude::*;
/// ```
pub mod prelude {
    pub use crate::archive::{world_physics_path, ArchiveReader, DirectoryArchive, MemoryArchive};
    pub use crate::error::{ExtractError, Result};
    pub use crate::extract::{
        extract_physics, Chunk, ExtractOptions, Extraction, PartKind, PartPolicy,
    };
    pub use crate::geometry::{Triangle, Vec3};
    pub use crate::kv::{JsonKvDecoder, KeyValueDecoder, KvValue};
    pub use crate::pipeline::MapParser;
    pub use crate::resource::{find_block, BlockType, ResourceFile};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use crate::geometry::hull_fixtures::cube_hull;
    use crate::kv::json::from_json;
    use crate::resource::build_container;

    /// Render bytes as a key-value blob literal.
    fn blob(bytes: &[u8]) -> String {
        let hex: Vec<String> = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        format!("#[ {} ]", hex.join(" "))
    }

    #[test]
    fn test_cube_map_end_to_end() {
        let (vertices, faces, edges) = cube_hull();
        let json = serde_json::json!({
            "m_parts": [{
                "m_rnShape": {
                    "m_hulls": [{
                        "m_nCollisionAttributeIndex": 0,
                        "m_Hull": {
                            "m_Vertices": blob(&vertices),
                            "m_Faces": blob(&faces),
                            "m_Edges": blob(&edges),
                        }
                    }],
                    "m_meshes": []
                }
            }]
        });
        assert!(from_json(json.clone()).is_ok());

        let physics = serde_json::to_vec(&json).unwrap();
        let container = build_container(&[
            (BlockType::DATA, b"ignored".as_slice()),
            (BlockType::PHYS, physics.as_slice()),
        ]);
        let archive = MemoryArchive::new().with_entry(world_physics_path("cube"), container);
        let parser = MapParser::new(archive, JsonKvDecoder);

        let extraction = parser.extract_map("cube").unwrap();
        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.chunks[0].kind, PartKind::Hull);
        assert_eq!(extraction.num_triangles(), 12);

        let area: f32 = extraction.triangles().map(Triangle::area).sum();
        assert!((area - 6.0).abs() < 1e-5);

        let decoded = crate::io::opt::decode(&parser.map_to_opt("cube").unwrap()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0], extraction.chunks[0].triangles);
    }
}

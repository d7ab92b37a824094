//! End-to-end map parsing.
//!
//! [`MapParser`] chains the stages: archive entry, `PHYS` block, key-value
//! tree, extracted chunks, encoded bytes.
//!
//! # Example
//!
//! ```no_run
//! use phystri::archive::DirectoryArchive;
//! use phystri::kv::JsonKvDecoder;
//! use phystri::pipeline::MapParser;
//!
//! let archive = DirectoryArchive::open("unpacked").unwrap();
//! let parser = MapParser::new(archive, JsonKvDecoder);
//!
//! let bytes = parser.map_to_opt("de_dust2").unwrap();
//! std::fs::write("de_dust2.opt", bytes).unwrap();
//! ```

use crate::archive::{world_physics_path, ArchiveReader};
use crate::error::Result;
use crate::extract::{extract_physics, ExtractOptions, Extraction};
use crate::io::{opt, tri};
use crate::kv::KeyValueDecoder;
use crate::resource::{find_block, BlockType};

/// Extracts collision triangles for named maps.
#[derive(Debug, Clone)]
pub struct MapParser<A, D> {
    archive: A,
    decoder: D,
    options: ExtractOptions,
}

impl<A: ArchiveReader, D: KeyValueDecoder> MapParser<A, D> {
    /// Create a parser with default extraction options.
    pub fn new(archive: A, decoder: D) -> Self {
        Self {
            archive,
            decoder,
            options: ExtractOptions::default(),
        }
    }

    /// Replace the extraction options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// The extraction options in use.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// The underlying archive.
    pub fn archive(&self) -> &A {
        &self.archive
    }

    /// Raw `PHYS` block bytes of a map's physics resource.
    pub fn physics_block(&self, map: &str) -> Result<Vec<u8>> {
        let path = world_physics_path(map);
        let resource = self.archive.read_entry(&path)?;
        log::debug!("{}: {} bytes", path, resource.len());
        Ok(find_block(&resource, BlockType::PHYS)?.to_vec())
    }

    /// Extract a map's collision chunks.
    pub fn extract_map(&self, map: &str) -> Result<Extraction> {
        let block = self.physics_block(map)?;
        let tree = self.decoder.decode(&block)?;
        let extraction = extract_physics(&tree, &self.options)?;
        log::info!(
            "{}: {} triangles in {} chunks",
            map,
            extraction.num_triangles(),
            extraction.chunks.len()
        );
        Ok(extraction)
    }

    /// A map's collision triangles as a flat `.tri` stream.
    pub fn map_to_tri(&self, map: &str) -> Result<Vec<u8>> {
        let extraction = self.extract_map(map)?;
        Ok(tri::encode(&extraction.into_triangles()))
    }

    /// A map's collision triangles as a chunked `.opt` stream.
    ///
    /// A map with no eligible collision parts yields a zero chunk count,
    /// which the chunked decoder rejects.
    pub fn map_to_opt(&self, map: &str) -> Result<Vec<u8>> {
        let extraction = self.extract_map(map)?;
        Ok(opt::encode(&extraction.chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;
    use crate::error::ExtractError;
    use crate::extract::tests::{hull_node, physics_tree, quad_mesh};
    use crate::geometry::hull_fixtures::cube_hull;
    use crate::kv::KvValue;
    use crate::resource::build_container;

    /// A decoder that ignores its input and returns a fixed tree.
    fn fixed_decoder(tree: KvValue) -> impl Fn(&[u8]) -> Result<KvValue> {
        move |bytes: &[u8]| -> Result<KvValue> {
            if bytes != b"physics" {
                return Err(ExtractError::Decode("unexpected block".to_string()));
            }
            Ok(tree.clone())
        }
    }

    fn archive_with(map: &str, blocks: &[(BlockType, &[u8])]) -> MemoryArchive {
        MemoryArchive::new().with_entry(world_physics_path(map), build_container(blocks))
    }

    fn test_tree() -> KvValue {
        physics_tree(vec![hull_node(0, cube_hull())], vec![quad_mesh(0)])
    }

    #[test]
    fn test_extract_map() {
        let archive = archive_with(
            "cube",
            &[(BlockType::DATA, b"other"), (BlockType::PHYS, b"physics")],
        );
        let parser = MapParser::new(archive, fixed_decoder(test_tree()));

        assert_eq!(parser.physics_block("cube").unwrap(), b"physics");

        let extraction = parser.extract_map("cube").unwrap();
        assert_eq!(extraction.chunks.len(), 2);
        assert_eq!(extraction.num_triangles(), 14);
    }

    #[test]
    fn test_map_encodings() {
        let archive = archive_with("cube", &[(BlockType::PHYS, b"physics")]);
        let parser = MapParser::new(archive, fixed_decoder(test_tree()));

        let flat = parser.map_to_tri("cube").unwrap();
        assert_eq!(flat.len(), 14 * tri::TRIANGLE_RECORD_SIZE);

        let chunked = opt::decode(&parser.map_to_opt("cube").unwrap()).unwrap();
        assert_eq!(chunked.len(), 2);
        assert_eq!(chunked[0].len(), 12);
        assert_eq!(chunked[1].len(), 2);
        assert_eq!(tri::decode(&flat).unwrap(), chunked.concat());
    }

    #[test]
    fn test_options_are_applied() {
        let archive = archive_with("cube", &[(BlockType::PHYS, b"physics")]);
        let parser = MapParser::new(archive, fixed_decoder(test_tree()))
            .with_options(ExtractOptions::default().with_hulls(false));

        assert!(!parser.options().extract_hulls);
        assert_eq!(parser.extract_map("cube").unwrap().num_triangles(), 2);
    }

    #[test]
    fn test_map_without_parts_gives_unreadable_opt() {
        let archive = archive_with("empty", &[(BlockType::PHYS, b"physics")]);
        let parser = MapParser::new(archive, fixed_decoder(test_tree()))
            .with_options(ExtractOptions::default().with_collision_attribute(7));

        let bytes = parser.map_to_opt("empty").unwrap();
        assert_eq!(bytes, 0u64.to_le_bytes());
        assert!(matches!(opt::decode(&bytes), Err(ExtractError::ZeroChunkCount)));
        assert!(parser.map_to_tri("empty").unwrap().is_empty());
    }

    #[test]
    fn test_missing_inputs() {
        let archive = archive_with("empty", &[(BlockType::DATA, b"other"), (BlockType::PHYS, b"")]);
        let parser = MapParser::new(archive, fixed_decoder(test_tree()));

        assert!(matches!(
            parser.extract_map("nowhere"),
            Err(ExtractError::EntryNotFound { .. })
        ));
        assert!(matches!(
            parser.map_to_tri("empty"),
            Err(ExtractError::BlockNotFound { block }) if block == BlockType::PHYS
        ));
    }
}

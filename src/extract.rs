//! Collision part selection and extraction.
//!
//! A decoded physics tree holds its collision shapes under
//! `m_parts[P].m_rnShape`, split into two lists:
//!
//! ```text
//! m_hulls[i]  { m_nCollisionAttributeIndex, m_Hull { m_Vertices, m_Faces, m_Edges } }
//! m_meshes[i] { m_nCollisionAttributeIndex, m_Mesh { m_Vertices, m_Triangles } }
//! ```
//!
//! Each list is scanned from index 0 until the first index whose collision
//! attribute cannot be found; there is no stored count. Parts whose attribute
//! differs from the requested one are skipped. Every extracted part becomes
//! one [`Chunk`], hulls first, then meshes.
//!
//! # Example
//!
//! ```no_run
//! use phystri::extract::{extract_physics, ExtractOptions, PartPolicy};
//! use phystri::kv::{JsonKvDecoder, KeyValueDecoder};
//!
//! let json = std::fs::read("world_physics.json").unwrap();
//! let tree = JsonKvDecoder.decode(&json).unwrap();
//!
//! let options = ExtractOptions::default().with_policy(PartPolicy::Abort);
//! let extraction = extract_physics(&tree, &options).unwrap();
//! println!("{} triangles in {} chunks", extraction.num_triangles(), extraction.chunks.len());
//! ```

use std::fmt;

use crate::error::{ExtractError, Result};
use crate::geometry::{extract_hull_triangles, extract_mesh_triangles, Triangle};
use crate::kv::{DisplayPath, KvValue, PathStep};

/// Key of the collision attribute on every part.
pub const COLLISION_ATTRIBUTE_KEY: &str = "m_nCollisionAttributeIndex";

/// The two kinds of collision part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// Half-edge convex hull.
    Hull,
    /// Indexed triangle mesh.
    Mesh,
}

impl PartKind {
    /// Key of the list holding parts of this kind.
    pub fn list_key(self) -> &'static str {
        match self {
            PartKind::Hull => "m_hulls",
            PartKind::Mesh => "m_meshes",
        }
    }

    /// Key of the geometry record inside a part.
    pub fn body_key(self) -> &'static str {
        match self {
            PartKind::Hull => "m_Hull",
            PartKind::Mesh => "m_Mesh",
        }
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartKind::Hull => write!(f, "hull"),
            PartKind::Mesh => write!(f, "mesh"),
        }
    }
}

/// What to do when a single part is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PartPolicy {
    /// Log the failure, record it in [`Extraction::skipped`] and continue.
    #[default]
    Skip,
    /// Fail the whole extraction.
    Abort,
}

/// Options for physics extraction.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Index into `m_parts` of the physics part to read.
    pub part_index: usize,

    /// Collision attribute a shape must carry to be extracted.
    /// Attribute 0 is the default solid collision group.
    pub collision_attribute: i64,

    /// Failure handling for malformed parts.
    pub policy: PartPolicy,

    /// Whether to extract hull parts.
    pub extract_hulls: bool,

    /// Whether to extract mesh parts.
    pub extract_meshes: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            part_index: 0,
            collision_attribute: 0,
            policy: PartPolicy::Skip,
            extract_hulls: true,
            extract_meshes: true,
        }
    }
}

impl ExtractOptions {
    /// Set the physics part index.
    pub fn with_part_index(mut self, index: usize) -> Self {
        self.part_index = index;
        self
    }

    /// Set the collision attribute to extract.
    pub fn with_collision_attribute(mut self, attribute: i64) -> Self {
        self.collision_attribute = attribute;
        self
    }

    /// Set the malformed-part policy.
    pub fn with_policy(mut self, policy: PartPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable hull extraction.
    pub fn with_hulls(mut self, enabled: bool) -> Self {
        self.extract_hulls = enabled;
        self
    }

    /// Enable or disable mesh extraction.
    pub fn with_meshes(mut self, enabled: bool) -> Self {
        self.extract_meshes = enabled;
        self
    }
}

/// Borrowed geometry blobs of one collision part.
#[derive(Debug, Clone, Copy)]
pub enum CollisionPart<'a> {
    /// Half-edge hull blobs.
    Hull {
        /// 12-byte vertex records.
        vertices: &'a [u8],
        /// One start half-edge per face.
        faces: &'a [u8],
        /// 4-byte half-edge records.
        edges: &'a [u8],
    },
    /// Indexed mesh blobs.
    Mesh {
        /// 12-byte vertex records.
        vertices: &'a [u8],
        /// 12-byte index triples.
        triangles: &'a [u8],
    },
}

impl<'a> CollisionPart<'a> {
    /// Read the blobs of a part node. `path` locates the node, for errors.
    pub fn read(node: &'a KvValue, kind: PartKind, path: &[PathStep<'_>]) -> Result<Self> {
        let body = kind.body_key();
        let blob = |key: &str| -> Result<&'a [u8]> {
            node.get(body)
                .and_then(|b| b.get(key))
                .and_then(KvValue::as_bytes)
                .ok_or_else(|| ExtractError::MissingField {
                    path: format!("{}.{}.{}", DisplayPath(path), body, key),
                    expected: "byte array",
                })
        };

        Ok(match kind {
            PartKind::Hull => CollisionPart::Hull {
                vertices: blob("m_Vertices")?,
                faces: blob("m_Faces")?,
                edges: blob("m_Edges")?,
            },
            PartKind::Mesh => CollisionPart::Mesh {
                vertices: blob("m_Vertices")?,
                triangles: blob("m_Triangles")?,
            },
        })
    }

    /// The kind of this part.
    pub fn kind(&self) -> PartKind {
        match self {
            CollisionPart::Hull { .. } => PartKind::Hull,
            CollisionPart::Mesh { .. } => PartKind::Mesh,
        }
    }

    /// Decode the part's triangles.
    pub fn triangles(&self) -> Result<Vec<Triangle>> {
        match *self {
            CollisionPart::Hull {
                vertices,
                faces,
                edges,
            } => extract_hull_triangles(vertices, faces, edges),
            CollisionPart::Mesh {
                vertices,
                triangles,
            } => extract_mesh_triangles(vertices, triangles),
        }
    }
}

/// Triangles extracted from one collision part.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Kind of the source part.
    pub kind: PartKind,
    /// Index of the source part within its list.
    pub index: usize,
    /// The part's triangles.
    pub triangles: Vec<Triangle>,
}

impl AsRef<[Triangle]> for Chunk {
    fn as_ref(&self) -> &[Triangle] {
        &self.triangles
    }
}

/// A part that matched the attribute filter but could not be extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPart {
    /// Kind of the part.
    pub kind: PartKind,
    /// Index of the part within its list.
    pub index: usize,
    /// Why it was skipped.
    pub reason: String,
}

/// Result of extracting a physics tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// One chunk per extracted part: hulls in order, then meshes in order.
    pub chunks: Vec<Chunk>,
    /// Parts dropped under [`PartPolicy::Skip`].
    pub skipped: Vec<SkippedPart>,
}

impl Extraction {
    /// Total number of triangles across all chunks.
    pub fn num_triangles(&self) -> usize {
        self.chunks.iter().map(|c| c.triangles.len()).sum()
    }

    /// Whether no triangles were extracted.
    pub fn is_empty(&self) -> bool {
        self.num_triangles() == 0
    }

    /// Iterate all triangles in chunk order.
    pub fn triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.chunks.iter().flat_map(|c| c.triangles.iter())
    }

    /// Flatten into a single triangle list.
    pub fn into_triangles(self) -> Vec<Triangle> {
        let mut out = Vec::with_capacity(self.num_triangles());
        for chunk in self.chunks {
            out.extend(chunk.triangles);
        }
        out
    }

    /// Chunks of the given kind.
    pub fn chunks_of(&self, kind: PartKind) -> impl Iterator<Item = &Chunk> + '_ {
        self.chunks.iter().filter(move |c| c.kind == kind)
    }
}

/// Extract collision triangles from a decoded physics tree.
///
/// Returns an empty extraction, not an error, when the tree has no shape
/// lists at all.
pub fn extract_physics(tree: &KvValue, options: &ExtractOptions) -> Result<Extraction> {
    let shape = tree
        .get("m_parts")
        .and_then(|parts| parts.at(options.part_index))
        .and_then(|part| part.get("m_rnShape"));

    if shape.is_none() {
        log::debug!("physics tree has no m_parts[{}].m_rnShape", options.part_index);
    }

    let mut extraction = Extraction::default();
    if options.extract_hulls {
        scan_parts(shape, PartKind::Hull, options, &mut extraction)?;
    }
    if options.extract_meshes {
        scan_parts(shape, PartKind::Mesh, options, &mut extraction)?;
    }

    log::debug!(
        "extracted {} hull and {} mesh chunks ({} triangles, {} parts skipped)",
        extraction.chunks_of(PartKind::Hull).count(),
        extraction.chunks_of(PartKind::Mesh).count(),
        extraction.num_triangles(),
        extraction.skipped.len()
    );

    Ok(extraction)
}

fn scan_parts(
    shape: Option<&KvValue>,
    kind: PartKind,
    options: &ExtractOptions,
    extraction: &mut Extraction,
) -> Result<()> {
    let list = shape.and_then(|s| s.get(kind.list_key()));

    for index in 0.. {
        let Some(node) = list.and_then(|l| l.at(index)) else {
            break;
        };
        // A null attribute ends the scan the same way a missing one does.
        let attribute = match node.get(COLLISION_ATTRIBUTE_KEY) {
            None | Some(KvValue::Null) => break,
            Some(attribute) => attribute,
        };

        let path = [
            PathStep::Key("m_parts"),
            PathStep::Index(options.part_index),
            PathStep::Key("m_rnShape"),
            PathStep::Key(kind.list_key()),
            PathStep::Index(index),
        ];

        let result = match attribute.as_int() {
            Some(a) if a != options.collision_attribute => {
                log::trace!("{} {} has collision attribute {}, skipping", kind, index, a);
                continue;
            }
            Some(_) => CollisionPart::read(node, kind, &path).and_then(|part| part.triangles()),
            None => Err(ExtractError::MissingField {
                path: format!("{}.{}", DisplayPath(&path), COLLISION_ATTRIBUTE_KEY),
                expected: "integer",
            }),
        };

        match result {
            Ok(triangles) => extraction.chunks.push(Chunk {
                kind,
                index,
                triangles,
            }),
            Err(e) if e.is_part_failure() && options.policy == PartPolicy::Skip => {
                log::warn!("skipping {} {}: {}", kind, index, e);
                extraction.skipped.push(SkippedPart {
                    kind,
                    index,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::hull_fixtures::{cube_hull, vertex_blob};
    use crate::kv::{JsonKvDecoder, KeyValueDecoder};

    pub(crate) fn hull_node(attribute: i64, (vertices, faces, edges): (Vec<u8>, Vec<u8>, Vec<u8>)) -> KvValue {
        KvValue::map([
            (COLLISION_ATTRIBUTE_KEY, KvValue::Int(attribute)),
            (
                "m_Hull",
                KvValue::map([
                    ("m_Vertices", KvValue::Bytes(vertices)),
                    ("m_Faces", KvValue::Bytes(faces)),
                    ("m_Edges", KvValue::Bytes(edges)),
                ]),
            ),
        ])
    }

    pub(crate) fn mesh_node(attribute: i64, vertices: Vec<u8>, indices: &[i32]) -> KvValue {
        KvValue::map([
            (COLLISION_ATTRIBUTE_KEY, KvValue::Int(attribute)),
            (
                "m_Mesh",
                KvValue::map([
                    ("m_Vertices", KvValue::Bytes(vertices)),
                    (
                        "m_Triangles",
                        KvValue::Bytes(indices.iter().flat_map(|i| i.to_le_bytes()).collect()),
                    ),
                ]),
            ),
        ])
    }

    pub(crate) fn physics_tree(hulls: Vec<KvValue>, meshes: Vec<KvValue>) -> KvValue {
        KvValue::map([(
            "m_parts",
            KvValue::Array(vec![KvValue::map([(
                "m_rnShape",
                KvValue::map([
                    ("m_hulls", KvValue::Array(hulls)),
                    ("m_meshes", KvValue::Array(meshes)),
                ]),
            )])]),
        )])
    }

    pub(crate) fn quad_mesh(attribute: i64) -> KvValue {
        let vertices = vertex_blob(&[
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 4.0, 0.0],
            [0.0, 4.0, 0.0],
        ]);
        mesh_node(attribute, vertices, &[0, 1, 2, 0, 2, 3])
    }

    fn broken_hull(attribute: i64) -> KvValue {
        let (vertices, faces, _) = cube_hull();
        // Two half-edges for six faces, and the first loop never closes.
        let edges = vec![1, 0, 0, 0, 1, 0, 1, 0];
        hull_node(attribute, (vertices, faces, edges))
    }

    #[test]
    fn test_hulls_then_meshes() {
        let tree = physics_tree(vec![hull_node(0, cube_hull())], vec![quad_mesh(0)]);
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.chunks.len(), 2);
        assert_eq!(extraction.chunks[0].kind, PartKind::Hull);
        assert_eq!(extraction.chunks[0].triangles.len(), 12);
        assert_eq!(extraction.chunks[1].kind, PartKind::Mesh);
        assert_eq!(extraction.chunks[1].triangles.len(), 2);
        assert_eq!(extraction.num_triangles(), 14);
        assert!(extraction.skipped.is_empty());
        assert_eq!(extraction.into_triangles().len(), 14);
    }

    #[test]
    fn test_attribute_filter() {
        let tree = physics_tree(
            vec![hull_node(1, cube_hull()), hull_node(0, cube_hull())],
            vec![quad_mesh(1)],
        );
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.chunks[0].kind, PartKind::Hull);
        assert_eq!(extraction.chunks[0].index, 1);

        let other = ExtractOptions::default().with_collision_attribute(1);
        let extraction = extract_physics(&tree, &other).unwrap();
        let kinds: Vec<_> = extraction.chunks.iter().map(|c| (c.kind, c.index)).collect();
        assert_eq!(kinds, vec![(PartKind::Hull, 0), (PartKind::Mesh, 0)]);
    }

    #[test]
    fn test_missing_attribute_ends_scan() {
        let no_attribute = KvValue::map([("m_Hull", KvValue::Null)]);
        let tree = physics_tree(
            vec![hull_node(0, cube_hull()), no_attribute, hull_node(0, cube_hull())],
            vec![],
        );
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.chunks[0].index, 0);
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_null_attribute_ends_scan() {
        let mut null_attribute = hull_node(0, cube_hull());
        if let KvValue::Map(m) = &mut null_attribute {
            m.insert(COLLISION_ATTRIBUTE_KEY.to_string(), KvValue::Null);
        }
        let tree = physics_tree(
            vec![hull_node(0, cube_hull()), null_attribute, hull_node(0, cube_hull())],
            vec![],
        );

        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.chunks[0].index, 0);
        assert!(extraction.skipped.is_empty());

        let strict = ExtractOptions::default().with_policy(PartPolicy::Abort);
        assert_eq!(extract_physics(&tree, &strict).unwrap().chunks.len(), 1);
    }

    #[test]
    fn test_null_attribute_from_json_is_empty() {
        let json = br#"{"m_parts":[{"m_rnShape":{"m_hulls":[{"m_nCollisionAttributeIndex":null}]}}]}"#;
        let tree = JsonKvDecoder.decode(json).unwrap();
        let strict = ExtractOptions::default().with_policy(PartPolicy::Abort);

        let extraction = extract_physics(&tree, &strict).unwrap();
        assert!(extraction.chunks.is_empty());
        assert!(extraction.skipped.is_empty());
    }

    #[test]
    fn test_no_shapes_is_empty() {
        let extraction = extract_physics(&KvValue::map([("m_parts", KvValue::Array(vec![]))]), &ExtractOptions::default()).unwrap();
        assert!(extraction.is_empty());
        assert!(extraction.chunks.is_empty());

        let tree = physics_tree(vec![], vec![]);
        assert!(extract_physics(&tree, &ExtractOptions::default()).unwrap().chunks.is_empty());
    }

    #[test]
    fn test_skip_policy_keeps_other_parts() {
        let tree = physics_tree(
            vec![broken_hull(0), hull_node(0, cube_hull())],
            vec![quad_mesh(0)],
        );
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();

        assert_eq!(extraction.chunks.len(), 2);
        assert_eq!(extraction.chunks[0].index, 1);
        assert_eq!(extraction.skipped.len(), 1);
        assert_eq!(extraction.skipped[0].kind, PartKind::Hull);
        assert_eq!(extraction.skipped[0].index, 0);
        assert!(extraction.skipped[0].reason.contains("malformed geometry"));
    }

    #[test]
    fn test_abort_policy() {
        let tree = physics_tree(vec![hull_node(0, cube_hull()), broken_hull(0)], vec![]);
        let options = ExtractOptions::default().with_policy(PartPolicy::Abort);
        assert!(matches!(
            extract_physics(&tree, &options),
            Err(ExtractError::MalformedGeometry { .. })
        ));
    }

    #[test]
    fn test_missing_blob_reports_path() {
        let mut hull = hull_node(0, cube_hull());
        if let KvValue::Map(m) = &mut hull {
            if let Some(KvValue::Map(body)) = m.get_mut("m_Hull") {
                body.remove("m_Edges");
            }
        }
        let tree = physics_tree(vec![hull], vec![]);
        let options = ExtractOptions::default().with_policy(PartPolicy::Abort);

        match extract_physics(&tree, &options) {
            Err(ExtractError::MissingField { path, expected }) => {
                assert_eq!(path, "m_parts[0].m_rnShape.m_hulls[0].m_Hull.m_Edges");
                assert_eq!(expected, "byte array");
            }
            other => panic!("expected MissingField, got {:?}", other),
        }
    }

    #[test]
    fn test_non_integer_attribute_is_part_failure() {
        let mut hull = hull_node(0, cube_hull());
        if let KvValue::Map(m) = &mut hull {
            m.insert(COLLISION_ATTRIBUTE_KEY.to_string(), KvValue::Str("solid".to_string()));
        }
        let tree = physics_tree(vec![hull, hull_node(0, cube_hull())], vec![]);
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.chunks.len(), 1);
        assert_eq!(extraction.skipped.len(), 1);
    }

    #[test]
    fn test_kind_toggles_and_part_index() {
        let tree = physics_tree(vec![hull_node(0, cube_hull())], vec![quad_mesh(0)]);

        let meshes_only = ExtractOptions::default().with_hulls(false);
        let extraction = extract_physics(&tree, &meshes_only).unwrap();
        assert!(extraction.chunks.iter().all(|c| c.kind == PartKind::Mesh));

        let hulls_only = ExtractOptions::default().with_meshes(false);
        let extraction = extract_physics(&tree, &hulls_only).unwrap();
        assert!(extraction.chunks.iter().all(|c| c.kind == PartKind::Hull));

        let second_part = ExtractOptions::default().with_part_index(1);
        assert!(extract_physics(&tree, &second_part).unwrap().chunks.is_empty());
    }

    #[test]
    fn test_collision_part_read() {
        let hull = hull_node(0, cube_hull());
        let part = CollisionPart::read(&hull, PartKind::Hull, &[]).unwrap();
        assert_eq!(part.kind(), PartKind::Hull);
        assert_eq!(part.triangles().unwrap().len(), 12);

        let mesh = quad_mesh(0);
        let part = CollisionPart::read(&mesh, PartKind::Mesh, &[]).unwrap();
        assert_eq!(part.kind(), PartKind::Mesh);

        // A mesh node read as a hull lacks the hull body.
        assert!(matches!(
            CollisionPart::read(&mesh, PartKind::Hull, &[]),
            Err(ExtractError::MissingField { .. })
        ));
    }

    #[test]
    fn test_empty_hull_is_an_empty_chunk() {
        let tree = physics_tree(vec![hull_node(0, (vec![], vec![], vec![]))], vec![]);
        let extraction = extract_physics(&tree, &ExtractOptions::default()).unwrap();
        assert_eq!(extraction.chunks.len(), 1);
        assert!(extraction.chunks[0].triangles.is_empty());
    }
}

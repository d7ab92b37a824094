// Property tests for the triangle codecs and the block scanner.
use phystri::geometry::{Triangle, Vec3};
use phystri::io::{opt, tri};
use phystri::resource::{build_container, find_block, BlockType};
use proptest::num::f32::NORMAL;
use proptest::prelude::*;
use proptest::strategy::Strategy;

fn bounded_f32() -> impl Strategy<Value = f32> {
    NORMAL.prop_filter("bounded", |v| v.is_finite() && v.abs() <= 1e6)
}

fn arb_vec3() -> impl Strategy<Value = Vec3> {
    (bounded_f32(), bounded_f32(), bounded_f32()).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn arb_triangle() -> impl Strategy<Value = Triangle> {
    (arb_vec3(), arb_vec3(), arb_vec3()).prop_map(|(a, b, c)| Triangle::new(a, b, c))
}

fn arb_tag() -> impl Strategy<Value = BlockType> {
    prop::sample::select(vec![
        BlockType::DATA,
        BlockType::NTRO,
        BlockType::RERL,
        BlockType::REDI,
        BlockType::MBUF,
    ])
}

proptest! {
    // Flat stream: decode(encode(t)) == t, 36 bytes per triangle
    #[test]
    fn tri_round_trip(triangles in prop::collection::vec(arb_triangle(), 1..64)) {
        let bytes = tri::encode(&triangles);
        prop_assert_eq!(bytes.len(), triangles.len() * tri::TRIANGLE_RECORD_SIZE);
        prop_assert_eq!(tri::decode(&bytes).unwrap(), triangles);
    }

    // Chunked stream keeps chunk boundaries, including empty chunks
    #[test]
    fn opt_round_trip(
        chunks in prop::collection::vec(prop::collection::vec(arb_triangle(), 0..16), 1..8),
    ) {
        let bytes = opt::encode(&chunks);
        prop_assert_eq!(opt::decode(&bytes).unwrap(), chunks);
    }

    // Any cut inside a flat stream's last record is reported as truncation
    #[test]
    fn tri_truncation_detected(
        triangles in prop::collection::vec(arb_triangle(), 1..8),
        cut in 1usize..36,
    ) {
        let mut bytes = tri::encode(&triangles);
        bytes.truncate(bytes.len() - cut);
        let truncated = matches!(
            tri::decode(&bytes),
            Err(phystri::ExtractError::TruncatedRecord { .. })
        );
        prop_assert!(truncated);
    }

    // PHYS is found at any position among other blocks
    #[test]
    fn scanner_finds_phys_anywhere(
        others in prop::collection::vec((arb_tag(), prop::collection::vec(any::<u8>(), 0..32)), 0..8),
        position in any::<prop::sample::Index>(),
        payload in prop::collection::vec(any::<u8>(), 1..64),
    ) {
        let mut blocks: Vec<(BlockType, &[u8])> =
            others.iter().map(|(t, d)| (*t, d.as_slice())).collect();
        let at = position.index(blocks.len() + 1);
        blocks.insert(at, (BlockType::PHYS, payload.as_slice()));

        let container = build_container(&blocks);
        prop_assert_eq!(find_block(&container, BlockType::PHYS).unwrap(), payload.as_slice());
    }
}

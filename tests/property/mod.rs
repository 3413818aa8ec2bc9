//! Property-based testing for Treesum
//!
//! Uses proptest to check manifest and digest invariants across
//! randomly generated inputs.

use ::treesum::*;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use tempfile::TempDir;

/// Generate relative paths: 1-4 segments, may contain inner spaces
fn path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-zA-Z0-9_][a-zA-Z0-9 _.-]{0,10}[a-zA-Z0-9_]", 1..=4)
        .prop_map(|segments| segments.join("/"))
}

fn md5_hex_strategy() -> impl Strategy<Value = String> {
    "[0-9a-f]{32}"
}

/// Manifest entries with unique paths
fn entries_strategy() -> impl Strategy<Value = Vec<(String, String)>> {
    prop::collection::btree_map(path_strategy(), md5_hex_strategy(), 0..40)
        .prop_map(|map| map.into_iter().map(|(path, digest)| (digest, path)).collect())
}

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..4096)
}

fn manifest_of(entries: &[(String, String)]) -> Manifest {
    let mut manifest = Manifest::new();
    for (digest, path) in entries {
        manifest.push(FileRecord::from_relative_path(path).with_digest(digest.clone()));
    }
    manifest
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_render_then_parse_round_trips(entries in entries_strategy()) {
        let codec = ManifestCodec::default();
        let text = codec.render(&manifest_of(&entries), &[]).join("\n");
        let parsed = codec.parse(&text);

        prop_assert!(parsed.failures.is_empty());
        let pairs: Vec<(String, String)> = parsed
            .manifest
            .records
            .iter()
            .map(|r| (r.digest_hex.clone(), r.relative_path.clone()))
            .collect();

        let mut expected = entries.clone();
        expected.sort_by(|a, b| a.1.cmp(&b.1));
        prop_assert_eq!(pairs, expected);
    }

    #[test]
    fn prop_render_is_independent_of_input_order(entries in entries_strategy()) {
        let codec = ManifestCodec::default();
        let mut reversed = entries.clone();
        reversed.reverse();

        // Skip the timestamped header line
        let forward = codec.render(&manifest_of(&entries), &[]);
        let backward = codec.render(&manifest_of(&reversed), &[]);
        prop_assert_eq!(&forward[2..], &backward[2..]);
    }

    #[test]
    fn prop_parse_never_panics(text in "(?s).{0,512}") {
        let parsed = ManifestCodec::default().parse(&text);
        let lines = text.lines().count();
        prop_assert!(parsed.manifest.len() + parsed.failures.len() <= lines);
    }

    #[test]
    fn prop_streaming_matches_in_memory(
        content in content_strategy(),
        chunk_size in 1usize..1024,
    ) {
        for algorithm in [DigestAlgorithm::Md5, DigestAlgorithm::Sha256] {
            let engine = DigestEngine::new(algorithm).with_chunk_size(chunk_size);
            let (streamed, size) = engine.digest_reader(content.as_slice()).unwrap();
            prop_assert_eq!(size, content.len() as u64);
            prop_assert_eq!(streamed.len(), algorithm.hex_len());
            prop_assert_eq!(streamed, engine.digest_bytes(&content));
        }
    }

    #[test]
    fn prop_flipping_a_byte_changes_the_digest(
        content in content_strategy(),
        index in any::<prop::sample::Index>(),
        mask in 1u8..=255,
    ) {
        let engine = DigestEngine::default();
        let mut tampered = content.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= mask;
        prop_assert_ne!(engine.digest_bytes(&content), engine.digest_bytes(&tampered));
    }

    #[test]
    fn prop_generate_then_verify_is_good(
        files in prop::collection::btree_map("[a-z]{1,8}\\.(txt|bin)", content_strategy(), 1..8),
    ) {
        let temp_dir = TempDir::new().unwrap();
        let tree = temp_dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        for (name, content) in &files {
            fs::write(tree.join(name), content).unwrap();
        }

        let treesum = Treesum::builder().echo_progress(false).build().unwrap();
        let generated = treesum.generate(&tree).unwrap();
        prop_assert_eq!(generated.files_digested, files.len());

        let report = treesum.verify(&temp_dir.path().join("tree.md5")).unwrap();
        prop_assert!(report.is_good());

        let verified: BTreeSet<_> = report.entries.iter().map(|e| e.relative_path.clone()).collect();
        let written: BTreeSet<_> = files.keys().cloned().collect();
        prop_assert_eq!(verified, written);
    }
}

//! Main test module for Treesum
//!
//! This module includes all test suites:
//! - Integration tests for multi-step scenarios
//! - Property-based tests for invariants

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::treesum::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet() -> Treesum {
        Treesum::builder().echo_progress(false).build().unwrap()
    }

    #[test]
    fn test_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("empty.dat");
        fs::write(&file, "").unwrap();

        quiet().process(&file).unwrap();
        let text = fs::read_to_string(temp_dir.path().join("empty.md5")).unwrap();
        assert!(text.contains("d41d8cd98f00b204e9800998ecf8427e *empty.dat"));
    }

    #[test]
    fn test_paths_with_spaces_and_unicode() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("Tax Docs");
        fs::create_dir_all(dir.join("2024 Q1")).unwrap();
        fs::write(dir.join("2024 Q1/résumé final.pdf"), "hello").unwrap();

        let treesum = quiet();
        treesum.process(&dir).unwrap();
        let manifest = temp_dir.path().join("Tax Docs.md5");
        let text = fs::read_to_string(&manifest).unwrap();
        assert!(text.contains("5d41402abc4b2a76b9719d911017c592 *2024 Q1/résumé final.pdf"));

        let report = treesum.verify(&manifest).unwrap();
        assert!(report.is_good());
        assert!(temp_dir.path().join("Tax Docs.Verify.Good.txt").exists());
    }

    #[test]
    fn test_uppercase_manifest_digests_verify() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "hello").unwrap();
        let manifest = temp_dir.path().join("UPPER.md5");
        fs::write(&manifest, "5D41402ABC4B2A76B9719D911017C592 *a.txt\r\n").unwrap();

        let report = quiet().verify(&manifest).unwrap();
        assert!(report.is_good());
    }

    #[test]
    fn test_backslash_paths_in_manifest() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        fs::write(temp_dir.path().join("sub/a.txt"), "hello").unwrap();
        let manifest = temp_dir.path().join("win.md5");
        fs::write(&manifest, "5d41402abc4b2a76b9719d911017c592 *sub\\a.txt\n").unwrap();

        let report = quiet().verify(&manifest).unwrap();
        assert!(report.is_good());
        assert_eq!(report.entries[0].relative_path, "sub/a.txt");
    }

    #[test]
    fn test_excluded_directory_is_not_digested() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("vol");
        fs::create_dir_all(dir.join("System Volume Information")).unwrap();
        fs::write(dir.join("System Volume Information/IndexerVolumeGuid"), "x").unwrap();
        fs::create_dir_all(dir.join("deep/cache")).unwrap();
        fs::write(dir.join("deep/cache/blob"), "x").unwrap();
        fs::write(dir.join("keep.txt"), "hello").unwrap();

        let treesum = Treesum::builder()
            .exclude("cache")
            .echo_progress(false)
            .build()
            .unwrap();
        let outcome = treesum.process(&dir).unwrap();
        match outcome {
            PathOutcome::Generated(report) => assert_eq!(report.files_digested, 1),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_manifest_of_other_algorithm_is_digested() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("set.sha256");
        fs::write(&file, "abc *x\n").unwrap();

        // With MD5 selected a .sha256 file is just data
        let outcome = quiet().process(&file).unwrap();
        assert!(matches!(outcome, PathOutcome::Generated(_)));
        assert!(temp_dir.path().join("set.md5").exists());
    }
}

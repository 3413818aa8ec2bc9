//! Integration tests for multi-step scenarios
//!
//! Generate, disturb the tree, verify, and check what the reports say.

use ::treesum::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// A small tree with nested directories and an embedded manifest
fn build_archive(root: &Path) -> PathBuf {
    let archive = root.join("archive");
    fs::create_dir_all(archive.join("isos")).unwrap();
    fs::create_dir_all(archive.join("docs/2024")).unwrap();

    fs::write(archive.join("isos/distro.iso"), vec![0xAB; 200_000]).unwrap();
    fs::write(archive.join("docs/readme.txt"), "read me").unwrap();
    fs::write(archive.join("docs/2024/report.pdf"), "pdf bytes").unwrap();
    fs::write(archive.join("top.txt"), "top").unwrap();

    let iso_digest = DigestEngine::default()
        .digest(&archive.join("isos/distro.iso"))
        .unwrap();
    fs::write(
        archive.join("isos/distro.md5"),
        format!("{} *distro.iso\n", iso_digest),
    )
    .unwrap();

    archive
}

fn quiet() -> Treesum {
    Treesum::builder().echo_progress(false).build().unwrap()
}

#[test]
fn test_archive_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let archive = build_archive(temp_dir.path());
    let treesum = quiet();

    let outcome = treesum.process(&archive).unwrap();
    let report = match outcome {
        PathOutcome::Generated(report) => report,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(report.files_digested, 5);
    assert_eq!(report.cross_checks.len(), 1);
    assert_eq!(report.cross_checks[0].outcome, LineOutcome::Ok);
    assert_eq!(report.cross_checks[0].record.relative_path, "isos/distro.iso");

    let manifest = temp_dir.path().join("archive.md5");
    let parsed = ManifestCodec::default().read(&manifest).unwrap();
    let paths: Vec<_> = parsed
        .manifest
        .records
        .iter()
        .map(|r| r.relative_path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "docs/2024/report.pdf",
            "docs/readme.txt",
            "isos/distro.iso",
            "isos/distro.md5",
            "top.txt"
        ]
    );
    assert!(parsed
        .manifest
        .comments
        .iter()
        .any(|c| c.starts_with("OK - ") && c.ends_with("*isos/distro.iso")));

    // Intact tree verifies good
    let verified = treesum.verify(&manifest).unwrap();
    assert!(verified.is_good());

    // Corrupt the ISO: both verification and the next cross-check notice
    fs::write(archive.join("isos/distro.iso"), vec![0xAC; 200_000]).unwrap();
    let verified = treesum.verify(&manifest).unwrap();
    assert!(!verified.is_good());
    assert_eq!(verified.count(LineOutcome::Bad), 1);
    assert!(temp_dir.path().join("archive.Verify.Bad.txt").exists());
    assert!(!temp_dir.path().join("archive.Verify.Good.txt").exists());

    let regenerated = treesum.generate(&archive).unwrap();
    assert_eq!(regenerated.cross_check_failures(), 1);

    // The new manifest describes the corrupted tree, so verification is good again
    let verified = treesum.verify(&manifest).unwrap();
    assert!(verified.is_good());
    assert!(!temp_dir.path().join("archive.Verify.Bad.txt").exists());
}

#[test]
fn test_run_mixes_modes_and_reports_failures() {
    let temp_dir = TempDir::new().unwrap();
    let archive = build_archive(temp_dir.path());
    let treesum = quiet();

    treesum.process(&archive).unwrap();
    let manifest = temp_dir.path().join("archive.md5");
    fs::remove_file(archive.join("top.txt")).unwrap();

    let outcomes = treesum.run([
        archive.join("docs"),
        manifest,
        temp_dir.path().join("nope"),
    ]);
    assert_eq!(outcomes.len(), 3);
    assert!(matches!(outcomes[0], PathOutcome::Generated(_)));
    assert!(archive.join("docs.md5").exists());

    match &outcomes[1] {
        PathOutcome::Verified(report) => {
            assert_eq!(report.count(LineOutcome::NotFound), 1);
            assert_eq!(report.phase, ReportPhase::Bad);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(matches!(outcomes[2], PathOutcome::Skipped { .. }));
    assert_eq!(outcomes.iter().filter(|o| o.is_failure()).count(), 2);
}

#[test]
fn test_outcomes_serialize_to_json() {
    let temp_dir = TempDir::new().unwrap();
    let archive = build_archive(temp_dir.path());
    let outcomes = quiet().run([&archive]);

    let json = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(json[0]["mode"], "generated");
    assert_eq!(json[0]["files_digested"], 5);
    assert_eq!(json[0]["cross_checks"][0]["outcome"], "Ok");
}

#[test]
fn test_concurrent_instances_share_session_log() {
    let temp_dir = TempDir::new().unwrap();
    let session = temp_dir.path().join("session.log");
    let registry = LogRegistry::shared();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let dir = temp_dir.path().join(format!("tree{}", i));
            fs::create_dir(&dir).unwrap();
            for j in 0..10 {
                fs::write(dir.join(format!("f{}.txt", j)), format!("{}-{}", i, j)).unwrap();
            }

            let registry = Arc::clone(&registry);
            let session = session.clone();
            thread::spawn(move || {
                let treesum = Treesum::builder()
                    .registry(registry)
                    .echo_progress(false)
                    .log_file(&session)
                    .build()
                    .unwrap();
                treesum.run([&dir])
            })
        })
        .collect();

    for handle in handles {
        let outcomes = handle.join().unwrap();
        assert!(!outcomes[0].is_failure());
    }

    assert!(registry.is_empty());
    let log = fs::read_to_string(&session).unwrap();
    // 4 runs x (header + blank + 10 files)
    assert_eq!(log.lines().count(), 48);
    assert_eq!(log.lines().filter(|l| l.contains(".txt, ")).count(), 40);
}

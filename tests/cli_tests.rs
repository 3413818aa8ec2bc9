use std::fs;
use std::process::{Command, Output};
use tempfile::TempDir;

fn treesum(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_treesum"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run treesum")
}

#[test]
fn test_cli_requires_paths() {
    let output = treesum(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_cli_generate_and_verify() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("D");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("a.txt"), "hello").unwrap();
    fs::write(dir.join("b.txt"), "world").unwrap();

    let output = treesum(&[dir.to_str().unwrap()]);
    assert!(output.status.success(), "CLI generate failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("a.txt, 5d41402abc4b2a76b9719d911017c592"));

    let manifest = tmp.path().join("D.md5");
    let text = fs::read_to_string(&manifest).unwrap();
    assert!(text.contains("5d41402abc4b2a76b9719d911017c592 *a.txt\n7d793037a0760186574b0282f2f435e7 *b.txt\n"));

    let output = treesum(&[manifest.to_str().unwrap()]);
    assert!(output.status.success(), "CLI verify failed");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("OK - 5d41402abc4b2a76b9719d911017c592 *a.txt"));
    assert!(tmp.path().join("D.Verify.Good.txt").exists());
}

#[test]
fn test_cli_bad_verification_exits_non_zero() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.txt"), "tampered").unwrap();
    let manifest = tmp.path().join("D.md5");
    fs::write(&manifest, "5d41402abc4b2a76b9719d911017c592 *a.txt\n").unwrap();

    let output = treesum(&["--quiet", manifest.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    assert!(tmp.path().join("D.Verify.Bad.txt").exists());
}

#[test]
fn test_cli_missing_path_is_reported() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a.txt");
    fs::write(&file, "hello").unwrap();
    let missing = tmp.path().join("missing");

    let output = treesum(&[missing.to_str().unwrap(), file.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Source does not exist"), "Unexpected output: {}", stdout);

    // The other argument was still processed
    assert!(tmp.path().join("a.md5").exists());
}

#[test]
fn test_cli_json_sha256_with_session_log() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("a.txt");
    fs::write(&file, "hello").unwrap();
    let log = tmp.path().join("session.log");

    let output = treesum(&[
        "--json",
        "-a",
        "sha256",
        "--log",
        log.to_str().unwrap(),
        file.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["mode"], "generated");
    assert_eq!(json[0]["files_digested"], 1);
    assert!(tmp.path().join("a.sha256").exists());

    let log_text = fs::read_to_string(&log).unwrap();
    assert!(log_text.starts_with("# SHA-256 checksums by treesum\n"));
    assert!(log_text.contains(
        "a.txt, 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
    ));
}

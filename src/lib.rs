//! # Treesum - checksum manifests for files and directory trees
//!
//! Treesum walks a file or directory, digests every file, and writes a
//! manifest of `"<digest> *<relative path>"` lines. Pointing it at a
//! manifest instead verifies the files it lists and leaves a report next to
//! it whose name says how the check went.
//!
//! ## Overview
//!
//! - Generate MD5 (default) or SHA-256 manifests for single files, directory
//!   trees, or whole volumes
//! - Cross-check single-entry manifests found inside the tree against the
//!   files they describe, and annotate the result in the new manifest
//! - Verify a manifest in place, producing `D.Verify.Good.txt` or
//!   `D.Verify.Bad.txt`
//! - Fan progress output to the console and any number of log files through
//!   a reference-counted logger registry
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use treesum::{PathOutcome, Treesum};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let treesum = Treesum::new()?;
//!
//! // Writes ./photos.md5 next to the directory
//! treesum.process("./photos".as_ref())?;
//!
//! // Writes ./photos.Verify.Good.txt or ./photos.Verify.Bad.txt
//! match treesum.process("./photos.md5".as_ref())? {
//!     PathOutcome::Verified(report) => println!("{}", report.summary()),
//!     _ => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Manifest Format
//!
//! ```text
//! # MD5 checksums generated by treesum
//! # Generated 2026-10-18 09:30:00
//!
//! 5d41402abc4b2a76b9719d911017c592 *a.txt
//! 7d793037a0760186574b0282f2f435e7 *sub/b.txt
//!
//! # OK - 0cc175b9c0f1b6a831c399e269772661 *movie.iso
//! ```
//!
//! Paths use `/` on every platform. Lines starting with `#` are comments;
//! the trailing `# OK` / `# BAD*` lines are cross-check annotations.
//!
//! ## Error Handling
//!
//! Operations return [`Result<T>`] with [`TreesumError`]. Per-file problems
//! (an unreadable file, a malformed manifest line, a log target that cannot
//! be written) are logged and skipped so one bad file never aborts a run.
//!
//! ## Module Organization
//!
//! - [`treesum`]: input classification and the [`Treesum`] entry point
//! - [`generation`]: generate mode and cross-checks
//! - [`verification`]: verify mode and report files
//! - [`manifest`]: manifest text format
//! - [`digest`]: streaming MD5 / SHA-256
//! - [`walker`]: directory traversal with exclusions
//! - [`logger`]: multi-target, reference-counted line logger
//! - [`types`]: records, reports and configuration
//! - [`error`]: error types and handling

// Public API modules
pub mod digest;
pub mod error;
pub mod generation;
pub mod logger;
pub mod manifest;
pub mod treesum;
pub mod types;
pub mod verification;
pub mod walker;

// Internal modules (not part of public API)
mod utils;

// Re-export main types for convenience
pub use digest::{DigestAlgorithm, DigestEngine};
pub use error::{Result, TreesumError};
pub use generation::ChecksumGenerator;
pub use logger::{Console, LogRegistry, LogTarget, MultiLog};
pub use manifest::{ManifestCodec, ParsedManifest};
pub use treesum::{InputKind, ProgressCallback, Treesum, TreesumBuilder};
pub use types::*;
pub use verification::ManifestVerifier;
pub use walker::TreeWalker;

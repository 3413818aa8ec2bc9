//! Manifest text format
//!
//! A manifest is a UTF-8, line-oriented text file:
//!
//! ```text
//! # MD5 checksums generated by treesum
//! # Generated 2026-10-18 09:30:00
//!
//! 5d41402abc4b2a76b9719d911017c592 *a.txt
//! 7d793037a0760186574b0282f2f435e7 *b.txt
//!
//! # OK - 0cc175b9c0f1b6a831c399e269772661 *movie.iso
//! ```
//!
//! ## Writing
//!
//! `ManifestCodec::render` produces the header comments, a blank line, one
//! `"{digest} *{path}"` line per record sorted by path, and optionally a blank
//! line followed by cross-check annotations.
//!
//! ## Reading
//!
//! Blank lines and lines starting with `#` are comments. Every other line is
//! split at its first whitespace run: the first token is the digest, the rest
//! of the line is the path, so paths may contain spaces. A leading `*`
//! (binary-mode marker) is trimmed from both. Lines that cannot be split are
//! reported as [`TreesumError::ParseFailure`] and skipped; the rest of the
//! manifest is still read.

use crate::digest::DigestAlgorithm;
use crate::error::{Result, TreesumError};
use crate::types::{CrossCheck, FileRecord, Manifest};
use crate::utils;
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Name written into manifest and report headers
pub const TOOL_NAME: &str = "treesum";

/// A manifest read from text, with the lines that had to be skipped
#[derive(Debug, Default)]
pub struct ParsedManifest {
    /// Records and comments that parsed cleanly
    pub manifest: Manifest,
    /// One [`TreesumError::ParseFailure`] per malformed line
    pub failures: Vec<TreesumError>,
}

/// Reads and writes manifests for one digest algorithm
#[derive(Debug, Clone, Copy)]
pub struct ManifestCodec {
    algorithm: DigestAlgorithm,
}

impl ManifestCodec {
    /// Create a codec for `algorithm`
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self { algorithm }
    }

    /// Header comment lines followed by a blank line
    ///
    /// `verb` completes "checksums ___ by treesum", e.g. `generated`.
    pub fn header_lines(&self, verb: &str) -> Vec<String> {
        vec![
            format!(
                "# {} checksums {} by {}",
                self.algorithm.display_name(),
                verb,
                TOOL_NAME
            ),
            format!("# Generated {}", utils::header_timestamp()),
            String::new(),
        ]
    }

    /// Render a manifest as lines, records sorted by path
    ///
    /// Cross-check annotations, if any, follow the records after a blank line.
    pub fn render(&self, manifest: &Manifest, cross_checks: &[CrossCheck]) -> Vec<String> {
        let mut lines = self.header_lines("generated");

        // Extra comments go just above the blank separator
        if !manifest.comments.is_empty() {
            lines.pop();
            lines.extend(manifest.comments.iter().map(|c| format!("# {}", c)));
            lines.push(String::new());
        }

        let mut sorted = manifest.clone();
        sorted.sort_by_path();
        lines.extend(sorted.records.iter().map(FileRecord::manifest_line));

        if !cross_checks.is_empty() {
            lines.push(String::new());
            lines.extend(cross_checks.iter().map(CrossCheck::annotation));
        }

        lines
    }

    /// Parse manifest text, skipping malformed lines
    pub fn parse(&self, text: &str) -> ParsedManifest {
        let mut parsed = ParsedManifest::default();
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(comment) = line.strip_prefix('#') {
                parsed.manifest.comments.push(comment.trim().to_string());
                continue;
            }

            match parse_entry(line) {
                Some((digest, path)) => {
                    parsed
                        .manifest
                        .push(FileRecord::from_relative_path(path).with_digest(digest));
                }
                None => {
                    let failure = TreesumError::parse(
                        index + 1,
                        raw,
                        "expected '<digest> *<path>'",
                    );
                    debug!("{}", failure);
                    parsed.failures.push(failure);
                }
            }
        }

        parsed
    }

    /// Read and parse a manifest file
    ///
    /// Invalid UTF-8 is replaced rather than rejected, with a warning.
    ///
    /// # Errors
    ///
    /// - [`TreesumError::ReadFailure`] if the file cannot be read
    pub fn read(&self, path: &Path) -> Result<ParsedManifest> {
        let bytes = fs::read(path).map_err(|e| TreesumError::read(path, e))?;
        let text = String::from_utf8_lossy(&bytes);
        if let Cow::Owned(_) = text {
            warn!(
                "{:?} is not valid UTF-8; affected paths were replaced with U+FFFD and will not be found",
                path
            );
        }
        let parsed = self.parse(&text);

        if !parsed.failures.is_empty() {
            warn!(
                "Skipped {} malformed line(s) in {:?}",
                parsed.failures.len(),
                path
            );
        }
        Ok(parsed)
    }
}

impl Default for ManifestCodec {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}

/// Split an entry line into (digest, path)
fn parse_entry(line: &str) -> Option<(&str, &str)> {
    let split = line.find(char::is_whitespace)?;
    let digest = line[..split].trim_start_matches('*');
    let path = line[split..].trim().trim_start_matches('*');

    if digest.is_empty() || path.is_empty() {
        None
    } else {
        Some((digest, path))
    }
}

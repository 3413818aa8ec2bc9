//! Core data types used throughout treesum
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Records**: `FileRecord`, `Manifest` - files, their digests, and the
//!   flat-text manifests they are written to
//! - **Outcomes**: `LineOutcome`, `CrossCheck`, `VerifyEntry` - per-file
//!   classifications produced by the engines
//! - **Reports**: `GenerateReport`, `VerifyReport`, `PathOutcome` - summaries
//!   returned to callers, serializable for the CLI's `--json` output
//! - **Configuration**: `TreesumConfig` - options for a run
//! - **Progress**: `ProgressInfo` - per-file progress callbacks
//!
//! ## Examples
//!
//! ```rust
//! use treesum::types::FileRecord;
//!
//! let record = FileRecord::from_relative_path("photos/beach.jpg");
//! assert_eq!(record.name, "beach.jpg");
//! assert_eq!(record.base_name, "beach");
//! assert_eq!(record.file_type, "jpg");
//!
//! let copy = record.with_digest("5d41402abc4b2a76b9719d911017c592");
//! assert_eq!(copy.relative_path, record.relative_path);
//! assert!(record.digest_hex.is_empty());
//! ```

use crate::digest::DigestAlgorithm;
use crate::utils;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One file and its content digest
///
/// `relative_path` always uses `/` separators. `digest_hex` is empty until
/// the digest has been computed or parsed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Leaf file name
    pub name: String,
    /// File name without its extension
    pub base_name: String,
    /// Extension without the leading dot
    pub file_type: String,
    /// Path relative to the scan root, `/`-separated
    pub relative_path: String,
    /// Lowercase hexadecimal digest
    pub digest_hex: String,
}

impl FileRecord {
    /// Build a record from a relative path, normalizing separators
    pub fn from_relative_path(relative_path: &str) -> Self {
        let relative_path = utils::normalize_separators(relative_path);
        let name = relative_path
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        let base_name = utils::strip_extension(&name).to_string();
        let file_type = if base_name.len() < name.len() {
            name[base_name.len() + 1..].to_string()
        } else {
            String::new()
        };

        Self {
            name,
            base_name,
            file_type,
            relative_path,
            digest_hex: String::new(),
        }
    }

    /// Copy this record with a different digest
    ///
    /// All scalar fields are copied; only `digest_hex` differs.
    pub fn with_digest(&self, digest_hex: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            base_name: self.base_name.clone(),
            file_type: self.file_type.clone(),
            relative_path: self.relative_path.clone(),
            digest_hex: digest_hex.into(),
        }
    }

    /// Relative path without the extension of its last segment
    pub fn relative_stem(&self) -> &str {
        utils::strip_extension(&self.relative_path)
    }

    /// Whether this record names a manifest for `algorithm`
    pub fn is_manifest(&self, algorithm: DigestAlgorithm) -> bool {
        self.file_type
            .eq_ignore_ascii_case(algorithm.manifest_extension())
    }

    /// The manifest entry line for this record
    pub fn manifest_line(&self) -> String {
        format!("{} *{}", self.digest_hex, self.relative_path)
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.name, self.digest_hex)
    }
}

/// An ordered list of records plus free-form comment lines
///
/// Records keep the order they were added in. Duplicate paths are allowed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    /// Comment lines, without the leading `#`
    pub comments: Vec<String>,
    /// Digest/path records
    pub records: Vec<FileRecord>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn push(&mut self, record: FileRecord) {
        self.records.push(record);
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether there are no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sort records by relative path, keeping the order of equal paths
    pub fn sort_by_path(&mut self) {
        self.records
            .sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    }
}

/// Classification of one file against its recorded digest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LineOutcome {
    /// Digest matches
    Ok,
    /// Digest differs, or the file could not be read
    Bad,
    /// File is missing
    NotFound,
}

impl LineOutcome {
    /// Label written into reports
    pub fn label(self) -> &'static str {
        match self {
            LineOutcome::Ok => "OK",
            LineOutcome::Bad => "BAD*",
            LineOutcome::NotFound => "Not Found",
        }
    }

    /// Whether this outcome counts as a pass
    pub fn is_ok(self) -> bool {
        self == LineOutcome::Ok
    }

    /// Report line for a digest/path pair, e.g. `BAD* - <digest> *<path>`
    pub fn report_line(self, digest_hex: &str, relative_path: &str) -> String {
        format!("{} - {} *{}", self.label(), digest_hex, relative_path)
    }
}

/// Phases of a verification report file
///
/// A run starts in `Checking` and is committed by renaming the report to
/// `Good` or `Bad`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReportPhase {
    /// In progress; left behind only by an interrupted run
    Checking,
    /// Every record matched
    Good,
    /// At least one record was bad, unreadable or missing
    Bad,
}

impl ReportPhase {
    /// All phases, in the order stale reports are cleaned up
    pub const ALL: [ReportPhase; 3] = [ReportPhase::Checking, ReportPhase::Good, ReportPhase::Bad];

    /// File name suffix appended to the manifest base path
    pub fn suffix(self) -> &'static str {
        match self {
            ReportPhase::Checking => ".Verify,Checking.txt",
            ReportPhase::Good => ".Verify.Good.txt",
            ReportPhase::Bad => ".Verify.Bad.txt",
        }
    }
}

/// Result of comparing an embedded single-entry manifest with the file it
/// describes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CrossCheck {
    /// Relative path of the embedded manifest
    pub manifest_path: String,
    /// Freshly computed record it was paired with
    pub record: FileRecord,
    /// Digest recorded inside the embedded manifest
    pub expected_digest: String,
    /// `Ok` or `Bad`
    pub outcome: LineOutcome,
}

impl CrossCheck {
    /// Annotation line appended to the generated manifest
    pub fn annotation(&self) -> String {
        format!(
            "# {}",
            self.outcome
                .report_line(&self.record.digest_hex, &self.record.relative_path)
        )
    }
}

/// Summary of one generate-mode run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateReport {
    /// File or directory that was digested
    pub source: PathBuf,
    /// Manifest written, if any records were produced
    pub manifest_path: Option<PathBuf>,
    /// Number of records written
    pub files_digested: usize,
    /// Total bytes read while digesting
    pub bytes_digested: u64,
    /// Files that could not be read
    pub unreadable: Vec<PathBuf>,
    /// Cross-checks against embedded manifests
    pub cross_checks: Vec<CrossCheck>,
}

impl GenerateReport {
    /// Number of cross-checks that failed
    pub fn cross_check_failures(&self) -> usize {
        self.cross_checks
            .iter()
            .filter(|c| !c.outcome.is_ok())
            .count()
    }
}

/// One verified manifest entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyEntry {
    /// Path as recorded in the manifest
    pub relative_path: String,
    /// Digest as recorded in the manifest
    pub expected_digest: String,
    /// Where the file was found, if anywhere
    pub resolved_path: Option<PathBuf>,
    /// Classification
    pub outcome: LineOutcome,
}

/// Summary of one verify-mode run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyReport {
    /// Manifest that was verified
    pub manifest_path: PathBuf,
    /// Final report file, `None` when the manifest held no records
    pub report_path: Option<PathBuf>,
    /// `Good` or `Bad`; `Checking` never escapes a finished run
    pub phase: ReportPhase,
    /// Per-record results, in manifest order
    pub entries: Vec<VerifyEntry>,
    /// Lines of the manifest that could not be parsed
    pub skipped_lines: usize,
}

impl VerifyReport {
    /// Whether every record matched
    pub fn is_good(&self) -> bool {
        self.phase == ReportPhase::Good
    }

    /// Count entries with the given outcome
    pub fn count(&self, outcome: LineOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} OK, {} bad, {} not found",
            self.count(LineOutcome::Ok),
            self.count(LineOutcome::Bad),
            self.count(LineOutcome::NotFound)
        )
    }
}

/// What happened to one command-line argument
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PathOutcome {
    /// A manifest was generated
    Generated(GenerateReport),
    /// A manifest was verified
    Verified(VerifyReport),
    /// The argument was skipped
    Skipped {
        /// Argument as given
        path: PathBuf,
        /// Why it was skipped
        reason: String,
    },
}

impl PathOutcome {
    /// Whether this argument should make the run exit non-zero
    pub fn is_failure(&self) -> bool {
        match self {
            PathOutcome::Generated(_) => false,
            PathOutcome::Verified(report) => !report.is_good(),
            PathOutcome::Skipped { .. } => true,
        }
    }
}

/// Options for a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreesumConfig {
    /// Digest algorithm; also selects the manifest extension
    pub algorithm: DigestAlgorithm,
    /// Directory names skipped at any depth
    pub exclusions: Vec<String>,
    /// Volume label used to name reports for file-system roots
    pub volume_label: Option<String>,
    /// Whether to follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Whether per-file progress lines go to the console
    pub echo_progress: bool,
    /// Whether progress lines are timestamped
    pub timestamps: bool,
}

impl Default for TreesumConfig {
    fn default() -> Self {
        Self {
            algorithm: DigestAlgorithm::Md5,
            exclusions: vec![crate::walker::SYSTEM_VOLUME_INFORMATION.to_string()],
            volume_label: None,
            follow_symlinks: false,
            echo_progress: true,
            timestamps: false,
        }
    }
}

/// Progress information for long-running operations
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Current operation name
    pub operation: String,
    /// Current item being processed
    pub current_item: Option<String>,
    /// Number of items processed
    pub processed: usize,
    /// Bytes processed so far
    pub bytes_processed: u64,
}

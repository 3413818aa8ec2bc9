//! Generate mode: digest a file or tree and write its manifest
//!
//! ## Process
//!
//! 1. Work out the output path and delete any manifest already there
//! 2. Walk the source and digest every file into a [`FileRecord`]
//! 3. Note embedded single-entry manifests found along the way
//! 4. Pair each embedded manifest with the file it describes and compare
//!    digests (the cross-check)
//! 5. Write the manifest, sorted by path, with cross-check annotations
//!
//! ## Output Location
//!
//! | Source                      | Manifest                         |
//! |-----------------------------|----------------------------------|
//! | file `dir/movie.iso`        | `dir/movie.md5`                  |
//! | directory `photos/2024`     | `photos/2024.md5` (sibling)      |
//! | file-system root `/`, `D:\` | `<root>/[<label> ]Checksums.md5` |
//!
//! ## Cross-Check Pairing
//!
//! An embedded manifest `sub/movie.md5` holding exactly one entry is paired
//! with the first record, in walk order, whose path without extension
//! contains `sub/movie` and which is not itself a manifest. When nothing
//! matches, the path recorded inside the embedded manifest (relative to its
//! directory) is looked up instead. Several files sharing a prefix make the
//! pairing ambiguous; the first one walked wins.

use crate::digest::DigestEngine;
use crate::error::{Result, TreesumError};
use crate::logger::{LogRegistry, MultiLog};
use crate::manifest::ManifestCodec;
use crate::treesum::ProgressCallback;
use crate::types::{
    CrossCheck, FileRecord, GenerateReport, LineOutcome, Manifest, ProgressInfo, TreesumConfig,
};
use crate::utils;
use crate::walker::TreeWalker;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Default report name for file-system roots, before the extension
pub const ROOT_REPORT_STEM: &str = "Checksums";

/// An embedded manifest waiting to be paired
struct Candidate {
    /// The manifest file's own record, carrying the digest recorded inside it
    manifest: FileRecord,
    /// The single entry parsed from it
    entry: FileRecord,
}

/// Runs generate mode for one source path
pub struct ChecksumGenerator<'a> {
    config: &'a TreesumConfig,
    registry: &'a Arc<LogRegistry>,
    progress: &'a MultiLog,
    progress_callback: Option<&'a ProgressCallback>,
}

impl<'a> ChecksumGenerator<'a> {
    /// Create a generator
    ///
    /// Per-file progress goes to `progress`; the manifest itself is written
    /// through a fresh logger bound to `registry`.
    pub fn new(
        config: &'a TreesumConfig,
        registry: &'a Arc<LogRegistry>,
        progress: &'a MultiLog,
    ) -> Self {
        Self {
            config,
            registry,
            progress,
            progress_callback: None,
        }
    }

    /// Report per-file progress to a callback as well
    pub fn with_progress_callback(mut self, callback: Option<&'a ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Where the manifest for `source` is written
    ///
    /// `source` should be absolute so that file-system roots are recognized.
    pub fn output_path(&self, source: &Path) -> PathBuf {
        let extension = self.config.algorithm.manifest_extension();

        if !source.is_dir() {
            return source.with_extension(extension);
        }

        if utils::is_filesystem_root(source) {
            let name = match self.config.volume_label.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => {
                    format!("{} {}.{}", label, ROOT_REPORT_STEM, extension)
                }
                _ => format!("{}.{}", ROOT_REPORT_STEM, extension),
            };
            source.join(name)
        } else {
            utils::append_extension(source, extension)
        }
    }

    /// Digest `source` and write its manifest
    ///
    /// Unreadable files are logged and left out; they are listed in the
    /// report's `unreadable` field. When no file could be digested, nothing
    /// is written and `manifest_path` is `None`.
    ///
    /// # Errors
    ///
    /// - [`TreesumError::SourceNotFound`] if `source` does not exist
    /// - [`TreesumError::InvalidConfiguration`] if `source` is itself a
    ///   manifest, so its output path would be the source
    /// - [`TreesumError::WriteFailure`] if a stale manifest cannot be removed
    pub fn generate(&self, source: &Path) -> Result<GenerateReport> {
        if !source.exists() {
            return Err(TreesumError::SourceNotFound {
                path: source.to_path_buf(),
            });
        }

        let source_abs = utils::resolve_absolute(source)?;
        let output = self.output_path(&source_abs);
        if output == source_abs {
            return Err(TreesumError::InvalidConfiguration(format!(
                "{} is a manifest; verify it instead of generating over it",
                source.display()
            )));
        }
        if utils::remove_if_exists(&output)? {
            debug!("Removed previous manifest {:?}", output);
        }

        let scan_root = if source_abs.is_dir() {
            source_abs.clone()
        } else {
            source_abs
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source_abs.clone())
        };

        let walker = TreeWalker::new()
            .with_exclusions(self.config.exclusions.clone())
            .with_follow_symlinks(self.config.follow_symlinks);
        let paths = walker.walk(&source_abs)?;

        let engine = DigestEngine::new(self.config.algorithm);
        let codec = ManifestCodec::new(self.config.algorithm);

        let mut report = GenerateReport {
            source: source.to_path_buf(),
            manifest_path: None,
            files_digested: 0,
            bytes_digested: 0,
            unreadable: Vec::new(),
            cross_checks: Vec::new(),
        };
        let mut manifest = Manifest::new();
        let mut candidates = Vec::new();

        for path in paths {
            if path == output {
                continue;
            }

            let (digest, size) = match engine.digest_with_size(&path) {
                Ok(result) => result,
                Err(e) => {
                    error!("{}", e);
                    self.progress.write_line(&e.to_string());
                    report.unreadable.push(path);
                    continue;
                }
            };

            let relative = utils::relative_slash_path(&path, &scan_root)?;
            let record = FileRecord::from_relative_path(&relative).with_digest(digest);

            if record.is_manifest(self.config.algorithm) {
                if let Some(candidate) = self.load_candidate(&codec, &path, &record) {
                    candidates.push(candidate);
                }
            }

            self.progress.write_line(&record.to_string());
            report.files_digested += 1;
            report.bytes_digested += size;
            if let Some(callback) = self.progress_callback {
                callback(ProgressInfo {
                    operation: "Digesting files".to_string(),
                    current_item: Some(record.relative_path.clone()),
                    processed: report.files_digested,
                    bytes_processed: report.bytes_digested,
                });
            }

            manifest.push(record);
        }

        if manifest.is_empty() {
            warn!("No files digested under {:?}; nothing written", source);
            return Ok(report);
        }

        report.cross_checks = self.cross_check(&manifest.records, &candidates);
        self.write_manifest(&codec, &output, &manifest, &report.cross_checks)?;

        info!(
            "Wrote {:?}: {} files, {} cross-checks ({} bad)",
            output,
            report.files_digested,
            report.cross_checks.len(),
            report.cross_check_failures()
        );
        report.manifest_path = Some(output);
        Ok(report)
    }

    /// Read an embedded manifest; only single-entry manifests qualify
    fn load_candidate(
        &self,
        codec: &ManifestCodec,
        path: &Path,
        record: &FileRecord,
    ) -> Option<Candidate> {
        let parsed = match codec.read(path) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Cannot read embedded manifest: {}", e);
                return None;
            }
        };

        let mut records = parsed.manifest.records;
        if records.len() != 1 {
            debug!(
                "Embedded manifest {:?} holds {} entries; not cross-checked",
                path,
                records.len()
            );
            return None;
        }

        let entry = records.remove(0);
        Some(Candidate {
            manifest: record.with_digest(entry.digest_hex.clone()),
            entry,
        })
    }

    /// Pair each candidate with a freshly digested record and compare
    fn cross_check(&self, records: &[FileRecord], candidates: &[Candidate]) -> Vec<CrossCheck> {
        let algorithm = self.config.algorithm;
        let eligible = |r: &&FileRecord| !r.is_manifest(algorithm);

        candidates
            .iter()
            .filter_map(|candidate| {
                let key = candidate.manifest.relative_stem();
                let recorded_path = match candidate.manifest.relative_path.rsplit_once('/') {
                    Some((dir, _)) => format!("{}/{}", dir, candidate.entry.relative_path),
                    None => candidate.entry.relative_path.clone(),
                };

                let paired = records
                    .iter()
                    .filter(eligible)
                    .find(|r| r.relative_stem().contains(key))
                    .or_else(|| {
                        records
                            .iter()
                            .filter(eligible)
                            .find(|r| r.relative_path == recorded_path)
                    });

                let Some(record) = paired else {
                    debug!(
                        "No file found for embedded manifest {}",
                        candidate.manifest.relative_path
                    );
                    return None;
                };

                let outcome = if record
                    .digest_hex
                    .eq_ignore_ascii_case(&candidate.manifest.digest_hex)
                {
                    LineOutcome::Ok
                } else {
                    LineOutcome::Bad
                };

                Some(CrossCheck {
                    manifest_path: candidate.manifest.relative_path.clone(),
                    record: record.clone(),
                    expected_digest: candidate.manifest.digest_hex.clone(),
                    outcome,
                })
            })
            .collect()
    }

    fn write_manifest(
        &self,
        codec: &ManifestCodec,
        output: &Path,
        manifest: &Manifest,
        cross_checks: &[CrossCheck],
    ) -> Result<()> {
        let mut writer = MultiLog::new(Arc::clone(self.registry));
        writer.register(output)?;

        let mut failed_lines = 0;
        for line in codec.render(manifest, cross_checks) {
            if !writer.write_line(&line).is_empty() {
                failed_lines += 1;
            }
        }
        writer.deregister(output)?;

        if failed_lines > 0 {
            error!("{} line(s) could not be written to {:?}", failed_lines, output);
        }
        Ok(())
    }
}

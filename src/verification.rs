//! Verify mode: check the files listed in a manifest
//!
//! Verifying `dir/D.md5` produces a report next to it whose name carries
//! the outcome:
//!
//! - `dir/D.Verify,Checking.txt` while the run is in progress
//! - `dir/D.Verify.Good.txt` once every record matched
//! - `dir/D.Verify.Bad.txt` if any record was bad or missing
//!
//! Stale reports of all three kinds are removed before a run starts, so at
//! most one report exists afterwards. An interrupted run leaves the
//! `Checking` report behind.
//!
//! ## Resolving Entries
//!
//! Each recorded path is looked up first next to the manifest
//! (`dir/<path>`), then under the directory named after it (`dir/D/<path>`),
//! so a manifest works whether it sits inside or beside the tree it covers.
//!
//! ## Report Lines
//!
//! ```text
//! OK - 5d41402abc4b2a76b9719d911017c592 *a.txt
//! BAD* - 7d793037a0760186574b0282f2f435e7 *b.txt
//! Not Found - 0cc175b9c0f1b6a831c399e269772661 *gone.txt
//! ```
//!
//! Each line carries the digest recorded in the manifest. Digests compare
//! case-insensitively.

use crate::digest::DigestEngine;
use crate::error::{Result, TreesumError};
use crate::logger::{LogRegistry, MultiLog};
use crate::manifest::ManifestCodec;
use crate::treesum::ProgressCallback;
use crate::types::{
    FileRecord, LineOutcome, ProgressInfo, ReportPhase, TreesumConfig, VerifyEntry, VerifyReport,
};
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Runs verify mode for one manifest
pub struct ManifestVerifier<'a> {
    config: &'a TreesumConfig,
    registry: &'a Arc<LogRegistry>,
    progress: &'a MultiLog,
    progress_callback: Option<&'a ProgressCallback>,
}

impl<'a> ManifestVerifier<'a> {
    /// Create a verifier
    ///
    /// The report logger reuses the console of `progress`, so report lines
    /// are echoed whenever progress is.
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

    /// Report per-entry progress to a callback as well
    pub fn with_progress_callback(mut self, callback: Option<&'a ProgressCallback>) -> Self {
        self.progress_callback = callback;
        self
    }

    /// Path of the report for `manifest` in the given phase
    pub fn report_path(manifest: &Path, phase: ReportPhase) -> PathBuf {
        utils::append_suffix(&manifest.with_extension(""), phase.suffix())
    }

    /// Verify every record of `manifest` and write the report
    ///
    /// Malformed lines are logged and skipped. A manifest without records
    /// produces no report and counts as bad.
    ///
    /// # Errors
    ///
    /// - [`TreesumError::SourceNotFound`] if `manifest` does not exist
    /// - [`TreesumError::ReadFailure`] if `manifest` cannot be read
    /// - [`TreesumError::WriteFailure`] if stale reports cannot be removed or
    ///   the finished report cannot be renamed
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let verifier = ManifestVerifier::new(&config, &registry, &progress);
    /// let report = verifier.verify(Path::new("backup/D.md5"))?;
    /// println!("{}", report.summary());
    /// ```
    pub fn verify(&self, manifest: &Path) -> Result<VerifyReport> {
        if !manifest.is_file() {
            return Err(TreesumError::SourceNotFound {
                path: manifest.to_path_buf(),
            });
        }

        let manifest_abs = utils::resolve_absolute(manifest)?;
        let codec = ManifestCodec::new(self.config.algorithm);
        let parsed = codec.read(&manifest_abs)?;

        for failure in &parsed.failures {
            self.progress.write_line(&failure.to_string());
        }

        let mut report = VerifyReport {
            manifest_path: manifest.to_path_buf(),
            report_path: None,
            phase: ReportPhase::Bad,
            entries: Vec::new(),
            skipped_lines: parsed.failures.len(),
        };

        if parsed.manifest.is_empty() {
            warn!("{:?} lists no files; nothing verified", manifest);
            return Ok(report);
        }

        for phase in ReportPhase::ALL {
            let stale = Self::report_path(&manifest_abs, phase);
            if utils::remove_if_exists(&stale)? {
                debug!("Removed stale report {:?}", stale);
            }
        }

        let checking = Self::report_path(&manifest_abs, ReportPhase::Checking);
        let mut writer = MultiLog::new(Arc::clone(self.registry));
        if let Some(console) = self.progress.console() {
            writer = writer.with_console(console.clone());
        }
        writer.register(&checking)?;

        for line in codec.header_lines("verified") {
            writer.write_line(&line);
        }

        let engine = DigestEngine::new(self.config.algorithm);
        let base_dir = manifest_abs.with_extension("");
        let manifest_dir = manifest_abs
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        let mut all_good = true;
        let mut bytes_processed = 0;

        for record in &parsed.manifest.records {
            let resolved = resolve_entry(&manifest_dir, &base_dir, &record.relative_path);
            let outcome = match &resolved {
                None => LineOutcome::NotFound,
                Some(path) => match engine.digest_with_size(path) {
                    Ok((digest, size)) => {
                        bytes_processed += size;
                        if digest.eq_ignore_ascii_case(&record.digest_hex) {
                            LineOutcome::Ok
                        } else {
                            LineOutcome::Bad
                        }
                    }
                    Err(e) => {
                        error!("{}", e);
                        writer.write_line(&e.to_string());
                        LineOutcome::Bad
                    }
                },
            };

            all_good &= outcome.is_ok();
            writer.write_line(&outcome.report_line(&record.digest_hex, &record.relative_path));
            report.entries.push(entry_for(record, resolved, outcome));

            if let Some(callback) = self.progress_callback {
                callback(ProgressInfo {
                    operation: "Verifying files".to_string(),
                    current_item: Some(record.relative_path.clone()),
                    processed: report.entries.len(),
                    bytes_processed,
                });
            }
        }

        writer.blank_line();
        writer.deregister(&checking)?;
        drop(writer);

        report.phase = if all_good {
            ReportPhase::Good
        } else {
            ReportPhase::Bad
        };
        let final_path = Self::report_path(&manifest_abs, report.phase);
        fs::rename(&checking, &final_path).map_err(|e| TreesumError::write(&final_path, e))?;

        info!("Verified {:?}: {}", manifest, report.summary());
        report.report_path = Some(final_path);
        Ok(report)
    }
}

/// Find a recorded path beside the manifest, then under its base directory
fn resolve_entry(manifest_dir: &Path, base_dir: &Path, relative_path: &str) -> Option<PathBuf> {
    let relative: PathBuf = relative_path
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    [manifest_dir.join(&relative), base_dir.join(&relative)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn entry_for(record: &FileRecord, resolved: Option<PathBuf>, outcome: LineOutcome) -> VerifyEntry {
    VerifyEntry {
        relative_path: record.relative_path.clone(),
        expected_digest: record.digest_hex.clone(),
        resolved_path: resolved,
        outcome,
    }
}

//! Main treesum implementation
//!
//! `Treesum` decides, per input path, whether to generate or verify:
//!
//! - a file with the manifest extension (`.md5`, `.sha256`) is verified
//! - any other existing file or directory gets a manifest generated
//! - a missing path is reported and skipped
//!
//! Per-file progress lines go through one [`MultiLog`] that writes to the
//! console (unless progress echo is off) and to any session log files
//! registered with [`TreesumBuilder::log_file`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use treesum::{DigestAlgorithm, Treesum};
//!
//! # fn main() -> treesum::Result<()> {
//! let treesum = Treesum::builder()
//!     .algorithm(DigestAlgorithm::Sha256)
//!     .exclude("node_modules")
//!     .build()?;
//!
//! for outcome in treesum.run(["./photos", "./backup/photos.sha256"]) {
//!     println!("failed: {}", outcome.is_failure());
//! }
//! # Ok(())
//! # }
//! ```

use crate::digest::DigestAlgorithm;
use crate::error::{Result, TreesumError};
use crate::generation::ChecksumGenerator;
use crate::logger::{Console, LogRegistry, MultiLog};
use crate::manifest::TOOL_NAME;
use crate::types::{GenerateReport, PathOutcome, ProgressInfo, TreesumConfig, VerifyReport};
use crate::utils;
use crate::verification::ManifestVerifier;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Callback receiving progress for each digested file
pub type ProgressCallback = Box<dyn Fn(ProgressInfo) + Send + Sync>;

/// How an input path will be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// An existing manifest to verify
    Manifest,
    /// A file or directory to generate a manifest for
    Source,
    /// Nothing exists at the path
    Missing,
}

/// Generates and verifies checksum manifests
pub struct Treesum {
    config: TreesumConfig,
    registry: Arc<LogRegistry>,
    progress: MultiLog,
    progress_callback: Option<ProgressCallback>,
}

impl std::fmt::Debug for Treesum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Treesum")
            .field("config", &self.config)
            .field("progress_targets", &self.progress.targets())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Treesum {
    /// Create an instance with the default configuration
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Start building an instance
    pub fn builder() -> TreesumBuilder {
        TreesumBuilder::new()
    }

    /// Active configuration
    pub fn config(&self) -> &TreesumConfig {
        &self.config
    }

    /// Receive a [`ProgressInfo`] for every file digested
    pub fn with_progress_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressInfo) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    /// Decide how `path` would be handled
    pub fn classify(&self, path: &Path) -> InputKind {
        if !path.exists() {
            InputKind::Missing
        } else if path.is_file()
            && utils::has_extension(path, self.config.algorithm.manifest_extension())
        {
            InputKind::Manifest
        } else {
            InputKind::Source
        }
    }

    /// Generate a manifest for a file or directory
    pub fn generate(&self, source: &Path) -> Result<GenerateReport> {
        ChecksumGenerator::new(&self.config, &self.registry, &self.progress)
            .with_progress_callback(self.progress_callback.as_ref())
            .generate(source)
    }

    /// Verify a manifest and write its report
    pub fn verify(&self, manifest: &Path) -> Result<VerifyReport> {
        ManifestVerifier::new(&self.config, &self.registry, &self.progress)
            .with_progress_callback(self.progress_callback.as_ref())
            .verify(manifest)
    }

    /// Handle one input path
    ///
    /// # Errors
    ///
    /// - [`TreesumError::SourceNotFound`] if nothing exists at `path`
    /// - whatever generate or verify mode returns
    pub fn process(&self, path: &Path) -> Result<PathOutcome> {
        match self.classify(path) {
            InputKind::Missing => Err(TreesumError::SourceNotFound {
                path: path.to_path_buf(),
            }),
            InputKind::Manifest => {
                debug!("Verifying {:?}", path);
                self.verify(path).map(PathOutcome::Verified)
            }
            InputKind::Source => {
                debug!("Generating manifest for {:?}", path);
                self.generate(path).map(PathOutcome::Generated)
            }
        }
    }

    /// Handle every path in turn
    ///
    /// Failures are logged and recorded as [`PathOutcome::Skipped`]; later
    /// paths are still processed.
    pub fn run<I, P>(&self, paths: I) -> Vec<PathOutcome>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.progress.write_line(&format!(
            "# {} checksums by {}",
            self.config.algorithm.display_name(),
            TOOL_NAME
        ));
        self.progress.blank_line();

        let outcomes: Vec<PathOutcome> = paths
            .into_iter()
            .map(|path| {
                let path = path.as_ref();
                self.process(path).unwrap_or_else(|e| {
                    warn!("{}", e);
                    self.progress.write_line(&e.to_string());
                    PathOutcome::Skipped {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    }
                })
            })
            .collect();

        let failures = outcomes.iter().filter(|o| o.is_failure()).count();
        info!("Processed {} path(s), {} failed", outcomes.len(), failures);
        outcomes
    }
}

/// Builder for [`Treesum`]
#[derive(Debug)]
pub struct TreesumBuilder {
    config: TreesumConfig,
    registry: Option<Arc<LogRegistry>>,
    console: Option<Console>,
    log_files: Vec<PathBuf>,
}

impl TreesumBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self {
            config: TreesumConfig::default(),
            registry: None,
            console: None,
            log_files: Vec::new(),
        }
    }

    /// Start from an existing configuration
    pub fn config(mut self, config: TreesumConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the digest algorithm
    ///
    /// This also selects the manifest extension used to recognize manifests
    /// and to name generated ones.
    pub fn algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Replace the excluded directory names
    pub fn exclusions(mut self, names: Vec<String>) -> Self {
        self.config.exclusions = names;
        self
    }

    /// Add one excluded directory name
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.config.exclusions.contains(&name) {
            self.config.exclusions.push(name);
        }
        self
    }

    /// Set the volume label used to name reports for file-system roots
    pub fn volume_label(mut self, label: impl Into<String>) -> Self {
        self.config.volume_label = Some(label.into());
        self
    }

    /// Set symbolic link following behavior
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// Echo progress lines to the console
    pub fn echo_progress(mut self, echo: bool) -> Self {
        self.config.echo_progress = echo;
        self
    }

    /// Prefix progress lines with a timestamp
    pub fn timestamps(mut self, enabled: bool) -> Self {
        self.config.timestamps = enabled;
        self
    }

    /// Share an existing registry instead of creating one
    pub fn registry(mut self, registry: Arc<LogRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Console used when progress echo is on (default: stdout)
    pub fn console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// Also append progress lines to `path`
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_files.push(path.into());
        self
    }

    /// Build the instance
    ///
    /// # Errors
    ///
    /// - [`TreesumError::InvalidConfiguration`] if an exclusion is empty or a
    ///   path, or the volume label contains a path separator
    /// - [`TreesumError::Io`] if a log file path cannot be resolved
    pub fn build(self) -> Result<Treesum> {
        if let Some(bad) = self
            .config
            .exclusions
            .iter()
            .find(|name| name.is_empty() || name.contains(['/', '\\']))
        {
            return Err(TreesumError::InvalidConfiguration(format!(
                "exclusions are directory names, got {:?}",
                bad
            )));
        }
        if let Some(label) = &self.config.volume_label {
            if label.contains(['/', '\\']) {
                return Err(TreesumError::InvalidConfiguration(format!(
                    "volume label cannot contain a path separator: {:?}",
                    label
                )));
            }
        }

        let registry = self.registry.unwrap_or_else(LogRegistry::shared);
        let mut progress =
            MultiLog::new(Arc::clone(&registry)).with_timestamps(self.config.timestamps);
        if self.config.echo_progress {
            progress = progress.with_console(self.console.unwrap_or(Console::Stdout));
        }
        for path in &self.log_files {
            progress.register(path)?;
        }

        Ok(Treesum {
            config: self.config,
            registry,
            progress,
            progress_callback: None,
        })
    }
}

impl Default for TreesumBuilder {
    fn default() -> Self {
        Self::new()
    }
}

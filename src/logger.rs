//! Multi-target line logger with a shared, reference-counted target registry
//!
//! Reports and progress output are written through [`MultiLog`], which fans
//! each line out to an optional console and to every file target the
//! instance has registered.
//!
//! ## Registry
//!
//! File targets live in a [`LogRegistry`] shared by all loggers that should
//! see each other's targets. The registry is an explicit object handed
//! around as `Arc<LogRegistry>`; there is no global state, so tests can build
//! an isolated registry each.
//!
//! Targets are keyed by their absolute, lexically cleaned path and carry a
//! reference count:
//!
//! - registering a path that is already present increments its count
//! - deregistering decrements it, and the target is removed at zero
//! - a logger only writes to targets that are still present
//!
//! Two loggers addressing the same physical file (a manifest writer and a
//! verification report writer running back to back, say) therefore keep the
//! target alive until both are done with it.
//!
//! ## Locking
//!
//! The registry map sits behind a single `parking_lot::RwLock`:
//!
//! - `register` / `deregister` take the write lock
//! - `write_line` takes the read lock, so any number of loggers can append
//!   concurrently; they only wait for in-flight registrations
//!
//! ## Failures
//!
//! A target that cannot be appended to (locked by another process, disk
//! full) produces a [`TreesumError::WriteFailure`]. The failure is reported to
//! the console and to `tracing`, and the remaining targets still get the
//! line.
//!
//! ## Example
//!
//! ```rust,no_run
//! use treesum::logger::{Console, LogRegistry, MultiLog};
//!
//! # fn main() -> treesum::Result<()> {
//! let registry = LogRegistry::shared();
//! let mut log = MultiLog::new(registry.clone()).with_console(Console::Stdout);
//! log.register("session.log")?;
//! log.write_line("# checksums by treesum");
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TreesumError};
use crate::utils;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A registered file target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    /// Fully resolved path
    pub path: PathBuf,
    /// Number of live registrations, at least 1 while registered
    pub reference_count: usize,
}

/// Shared registry of file targets
#[derive(Debug, Default)]
pub struct LogRegistry {
    targets: RwLock<HashMap<PathBuf, LogTarget>>,
}

impl LogRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry behind an `Arc`, ready to hand to loggers
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register `path`, returning the target after the update
    ///
    /// # Errors
    ///
    /// - [`TreesumError::Io`] if the path cannot be made absolute
    pub fn register(&self, path: impl AsRef<Path>) -> Result<LogTarget> {
        let resolved = utils::resolve_absolute(path.as_ref())?;
        Ok(self.register_resolved(resolved))
    }

    /// Drop one registration of `path`
    ///
    /// Returns the remaining reference count; 0 means the target is gone or
    /// was never registered.
    pub fn deregister(&self, path: impl AsRef<Path>) -> Result<usize> {
        let resolved = utils::resolve_absolute(path.as_ref())?;
        Ok(self.release_resolved(&resolved, 1))
    }

    /// Current state of a target, if registered
    pub fn target(&self, path: impl AsRef<Path>) -> Option<LogTarget> {
        let resolved = utils::resolve_absolute(path.as_ref()).ok()?;
        self.targets.read().get(&resolved).cloned()
    }

    /// Whether a target is registered
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.target(path).is_some()
    }

    /// Number of registered targets
    pub fn len(&self) -> usize {
        self.targets.read().len()
    }

    /// Whether no targets are registered
    pub fn is_empty(&self) -> bool {
        self.targets.read().is_empty()
    }

    fn register_resolved(&self, resolved: PathBuf) -> LogTarget {
        let mut targets = self.targets.write();
        let target = targets
            .entry(resolved.clone())
            .and_modify(|t| t.reference_count += 1)
            .or_insert_with(|| LogTarget {
                path: resolved,
                reference_count: 1,
            });
        trace!("Registered {:?} (refs: {})", target.path, target.reference_count);
        target.clone()
    }

    fn release_resolved(&self, resolved: &Path, count: usize) -> usize {
        let mut targets = self.targets.write();
        let remaining = match targets.get_mut(resolved) {
            Some(target) => {
                target.reference_count = target.reference_count.saturating_sub(count);
                target.reference_count
            }
            None => return 0,
        };

        if remaining == 0 {
            targets.remove(resolved);
            trace!("Removed log target {:?}", resolved);
        }
        remaining
    }
}

/// Console sink for a logger
#[derive(Debug, Clone)]
pub enum Console {
    /// Process standard output
    Stdout,
    /// Process standard error
    Stderr,
    /// In-memory buffer, for tests and embedding
    Memory(Arc<Mutex<Vec<u8>>>),
}

impl Console {
    /// Create an in-memory console
    pub fn memory() -> Self {
        Console::Memory(Arc::new(Mutex::new(Vec::new())))
    }

    /// Everything written to an in-memory console so far
    pub fn contents(&self) -> Option<String> {
        match self {
            Console::Memory(buffer) => Some(String::from_utf8_lossy(&buffer.lock()).into_owned()),
            _ => None,
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        match self {
            Console::Stdout => writeln!(io::stdout().lock(), "{}", line),
            Console::Stderr => writeln!(io::stderr().lock(), "{}", line),
            Console::Memory(buffer) => writeln!(buffer.lock(), "{}", line),
        }
    }
}

/// A logger instance writing to a console and to its registered targets
///
/// Dropping the logger releases every registration it still holds.
#[derive(Debug)]
pub struct MultiLog {
    registry: Arc<LogRegistry>,
    /// This instance's registrations and how many times each was made
    owned: Vec<(PathBuf, usize)>,
    console: Option<Console>,
    timestamps: bool,
}

impl MultiLog {
    /// Create a logger bound to `registry`, with no console and no targets
    pub fn new(registry: Arc<LogRegistry>) -> Self {
        Self {
            registry,
            owned: Vec::new(),
            console: None,
            timestamps: false,
        }
    }

    /// Attach a console
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = Some(console);
        self
    }

    /// Prefix every line with a local timestamp
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    /// The attached console, if any
    pub fn console(&self) -> Option<&Console> {
        self.console.as_ref()
    }

    /// Targets this logger writes to
    pub fn targets(&self) -> Vec<PathBuf> {
        self.owned.iter().map(|(path, _)| path.clone()).collect()
    }

    /// Register a file target
    ///
    /// Registering the same path twice counts twice in the registry, but the
    /// logger still writes each line to it once.
    pub fn register(&mut self, path: impl AsRef<Path>) -> Result<LogTarget> {
        let resolved = utils::resolve_absolute(path.as_ref())?;
        let target = self.registry.register_resolved(resolved.clone());

        match self.owned.iter_mut().find(|(p, _)| *p == resolved) {
            Some((_, count)) => *count += 1,
            None => self.owned.push((resolved, 1)),
        }
        Ok(target)
    }

    /// Release one registration of a file target
    ///
    /// Returns the registry's remaining reference count. Paths this logger
    /// never registered are left alone and report 0.
    pub fn deregister(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let resolved = utils::resolve_absolute(path.as_ref())?;

        let Some(index) = self.owned.iter().position(|(p, _)| *p == resolved) else {
            debug!("Ignoring deregister of unowned target {:?}", resolved);
            return Ok(0);
        };

        self.owned[index].1 -= 1;
        if self.owned[index].1 == 0 {
            self.owned.remove(index);
        }
        Ok(self.registry.release_resolved(&resolved, 1))
    }

    /// Write a blank line
    pub fn blank_line(&self) -> Vec<TreesumError> {
        self.write_line("")
    }

    /// Write a line to the console and to every live target
    ///
    /// Returns the write failures that were reported and skipped.
    pub fn write_line(&self, text: &str) -> Vec<TreesumError> {
        let line = if self.timestamps {
            format!("{}: {}", utils::line_timestamp(), text)
        } else {
            text.to_string()
        };

        if let Some(console) = &self.console {
            if let Err(e) = console.write_line(&line) {
                trace!("Console write failed: {}", e);
            }
        }

        let mut failures = Vec::new();
        let targets = self.registry.targets.read();

        for (path, _) in &self.owned {
            if !targets.contains_key(path) {
                continue;
            }
            if let Err(e) = append_line(path, &line) {
                let failure = TreesumError::write(path, e);
                self.report_failure(&failure);
                failures.push(failure);
            }
        }

        failures
    }

    fn report_failure(&self, failure: &TreesumError) {
        warn!("{}", failure);
        if let Some(console) = &self.console {
            let _ = console.write_line(&failure.to_string());
        }
    }
}

impl Drop for MultiLog {
    fn drop(&mut self) {
        for (path, count) in self.owned.drain(..) {
            self.registry.release_resolved(&path, count);
        }
    }
}

fn append_line(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("{}\n", line).as_bytes())
}

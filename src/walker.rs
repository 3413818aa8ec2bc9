//! Directory traversal for checksum generation
//!
//! `TreeWalker` enumerates the files under a root in a fixed order:
//!
//! 1. files directly inside the root, by file name
//! 2. each subdirectory of the root, by name, walked depth-first with
//!    entries sorted by file name at every level
//!
//! Directories whose name appears in the exclusion list are skipped at any
//! depth, together with everything below them. By default the list holds
//! `System Volume Information`, which Windows keeps at the root of every
//! volume and which ordinary users cannot read.
//!
//! The walk order is the raw input to cross-check pairing ("first match in
//! walk order wins"); manifests sort their records by path separately.
//!
//! ## Example
//!
//! ```rust,no_run
//! use treesum::walker::TreeWalker;
//! use std::path::Path;
//!
//! # fn main() -> treesum::Result<()> {
//! let walker = TreeWalker::new().with_exclusions(vec!["node_modules".to_string()]);
//! for path in walker.walk(Path::new("./project"))? {
//!     println!("{}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, TreesumError};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Windows per-volume system folder, excluded by default
pub const SYSTEM_VOLUME_INFORMATION: &str = "System Volume Information";

/// Enumerates files under a root
#[derive(Debug, Clone)]
pub struct TreeWalker {
    /// Directory names to skip
    exclusions: Vec<String>,
    /// Whether to follow symbolic links
    follow_symlinks: bool,
}

impl TreeWalker {
    /// Create a walker with the default exclusion list
    pub fn new() -> Self {
        Self {
            exclusions: vec![SYSTEM_VOLUME_INFORMATION.to_string()],
            follow_symlinks: false,
        }
    }

    /// Replace the exclusion list
    pub fn with_exclusions(mut self, exclusions: Vec<String>) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Set symbolic link following behavior
    pub fn with_follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Whether a directory name is on the exclusion list
    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.iter().any(|excluded| excluded == name)
    }

    /// Collect every file under `root`
    ///
    /// A file root yields just that file.
    ///
    /// # Errors
    ///
    /// - [`TreesumError::SourceNotFound`] if `root` does not exist
    /// - [`TreesumError::WalkDir`] if the root directory itself cannot be read
    pub fn walk(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        self.walk_into(root, |path| files.push(path))?;
        Ok(files)
    }

    /// Stream every file under `root` to `visit`, returning the count
    ///
    /// Unreadable entries below the root are logged and skipped.
    pub fn walk_into<F>(&self, root: &Path, mut visit: F) -> Result<usize>
    where
        F: FnMut(PathBuf),
    {
        if !root.exists() {
            return Err(TreesumError::SourceNotFound {
                path: root.to_path_buf(),
            });
        }

        if !root.is_dir() {
            visit(root.to_path_buf());
            return Ok(1);
        }

        let mut count = 0;
        let mut subdirectories = Vec::new();

        // Top level first: files now, directories after
        let top_level = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name();

        for entry in top_level {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!("Skipping unreadable entry under {:?}: {}", root, e);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if self.is_excluded_entry(&entry) {
                    debug!("Excluding directory {:?}", entry.path());
                } else {
                    subdirectories.push(entry.into_path());
                }
            } else if entry.file_type().is_file() {
                visit(entry.into_path());
                count += 1;
            }
        }

        for directory in subdirectories {
            let walker = WalkDir::new(&directory)
                .follow_links(self.follow_symlinks)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && self.is_excluded_entry(e)));

            for entry in walker {
                match entry {
                    Ok(entry) if entry.file_type().is_file() => {
                        visit(entry.into_path());
                        count += 1;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Skipping unreadable entry under {:?}: {}", directory, e),
                }
            }
        }

        debug!("Walked {:?}: {} files", root, count);
        Ok(count)
    }

    fn is_excluded_entry(&self, entry: &DirEntry) -> bool {
        self.is_excluded(&entry.file_name().to_string_lossy())
    }
}

impl Default for TreeWalker {
    fn default() -> Self {
        Self::new()
    }
}

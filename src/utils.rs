//! Utility functions for treesum
//!
//! Path and time helpers shared by the walker, the manifest codec, the
//! engines and the logger.
//!
//! ## Path Conventions
//!
//! Manifests always store relative paths with `/` separators, whatever the
//! host platform uses. Log targets are keyed by an absolute, lexically
//! cleaned path so that `reports/../out.txt` and `out.txt` resolve to the
//! same target. Cleaning never touches the file system, so targets that do
//! not exist yet can still be resolved.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use crate::utils::{normalize_separators, strip_extension};
//!
//! assert_eq!(normalize_separators("sub\\movie.iso"), "sub/movie.iso");
//! assert_eq!(strip_extension("sub/movie.iso"), "sub/movie");
//! ```

use crate::error::{Result, TreesumError};
use chrono::Local;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Timestamp format used to prefix log lines
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Timestamp format used in `# Generated` header comments
pub const HEADER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Replace every `\` with `/`
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Express `path` relative to `root` using `/` separators
///
/// # Errors
///
/// - [`TreesumError::InvalidConfiguration`] if `path` is not under `root`
pub fn relative_slash_path(path: &Path, root: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        TreesumError::InvalidConfiguration(format!(
            "{} is not under {}",
            path.display(),
            root.display()
        ))
    })?;

    let joined = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");

    Ok(normalize_separators(&joined))
}

/// Drop the extension from the last segment of a `/`-separated path
///
/// A leading dot (`.profile`) is a hidden file name, not an extension.
pub fn strip_extension(path: &str) -> &str {
    let segment_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[segment_start..].rfind('.') {
        Some(0) | None => path,
        Some(dot) => &path[..segment_start + dot],
    }
}

/// Check a path's extension against `ext`, ignoring ASCII case
pub fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}

/// Append `.ext` to the full path, keeping any dots already in the name
///
/// `photos/2024.06` becomes `photos/2024.06.md5`, where
/// `Path::with_extension` would have produced `photos/2024.md5`.
pub fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Append a literal suffix such as `.Verify.Good.txt` to a path
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Make a path absolute and lexically clean it
pub fn resolve_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    Ok(clean_path(&absolute))
}

/// Clean a path by removing redundant `.` and `..` components
///
/// Works without the path existing on disk.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => continue,
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            _ => components.push(component),
        }
    }

    let result: PathBuf = components.iter().collect();
    if result.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        result
    }
}

/// Whether an absolute directory path is the root of its file system
pub fn is_filesystem_root(path: &Path) -> bool {
    path.parent().is_none()
}

/// Delete a file if it exists
///
/// Returns whether something was removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(TreesumError::write(path, e)),
    }
}

/// Local time formatted for log-line prefixes
pub fn line_timestamp() -> String {
    Local::now().format(LINE_TIMESTAMP_FORMAT).to_string()
}

/// Local time formatted for `# Generated` header comments
pub fn header_timestamp() -> String {
    Local::now().format(HEADER_TIMESTAMP_FORMAT).to_string()
}

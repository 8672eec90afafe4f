//! Repository Scanner
//!
//! Walks a root directory, detects each file's language and derives the
//! qualified module name of Python files from their relative path.
//!
//! @module scan

pub mod languages;
pub mod walker;

use std::path::{Component, Path, PathBuf};

use tracing::info;

pub use languages::Language;
pub use walker::FileWalker;

use crate::core::config::ScanConfig;
use crate::core::error::{Error, Result};

/// A file found under the scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the root
    pub rel_path: String,
    pub language: Language,
    /// Qualified module name (Python files only)
    pub module: Option<String>,
    /// Enclosing package, `None` for top-level modules
    pub package: Option<String>,
    pub size: u64,
    /// Modification time in nanoseconds since the epoch, 0 if unknown
    pub mtime_ns: u64,
    /// Larger than `max_file_size`; listed but never read
    pub oversized: bool,
}

/// Resolve and validate a repository root
pub fn resolve_root(root: &Path) -> Result<PathBuf> {
    if !root.exists() {
        return Err(Error::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(root.canonicalize()?)
}

/// Scan every file under `root`.
///
/// `root` must already be resolved with [`resolve_root`].
pub fn scan_repository(root: &Path, config: &ScanConfig) -> Vec<ScannedFile> {
    let files = FileWalker::new(root, config).walk();
    info!(
        root = %root.display(),
        files = files.len(),
        python = files.iter().filter(|f| f.language.is_python()).count(),
        "Scanned repository"
    );
    files
}

/// Qualified module name for a path relative to the root.
///
/// Drops the extension and any `__init__` component, joins the rest with
/// `.` and replaces `-` with `_`.
pub fn to_module_name(rel_path: &Path) -> String {
    let without_ext = rel_path.with_extension("");
    let parts: Vec<String> = without_ext
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .filter(|part| part != "__init__")
        .collect();
    parts.join(".").replace('-', "_")
}

/// Package of a qualified module name: everything before the last dot,
/// or `""` for a top-level module.
pub fn to_package_name(module: &str) -> String {
    module
        .rsplit_once('.')
        .map(|(package, _)| package.to_string())
        .unwrap_or_default()
}

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use ignore::WalkBuilder;
use tracing::{debug, warn};

use super::languages::Language;
use super::{to_module_name, to_package_name, ScannedFile};
use crate::core::config::ScanConfig;

/// Walks repository files, skipping ignored directories
pub struct FileWalker {
    root: PathBuf,
    ignore_dirs: HashSet<String>,
    max_file_size: u64,
    respect_gitignore: bool,
}

impl FileWalker {
    pub fn new(root: &Path, config: &ScanConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            ignore_dirs: config.ignore_dirs.iter().cloned().collect(),
            max_file_size: config.max_file_size,
            respect_gitignore: config.respect_gitignore,
        }
    }

    /// Walk every file under the root, sorted by relative path
    pub fn walk(&self) -> Vec<ScannedFile> {
        let ignore_dirs = self.ignore_dirs.clone();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(false)
            .parents(self.respect_gitignore)
            .ignore(self.respect_gitignore)
            .git_ignore(self.respect_gitignore)
            .git_global(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map_or(false, |ft| ft.is_dir());
                let name = entry.file_name().to_string_lossy();
                !(is_dir && entry.depth() > 0 && ignore_dirs.contains(&*name))
            });

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().map_or(false, |ft| ft.is_file()) {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                    continue;
                }
            };

            let oversized = meta.len() > self.max_file_size;
            if oversized {
                debug!(path = %entry.path().display(), size = meta.len(), "Large file will not be read");
            }

            let mtime_ns = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);

            let mut file = self.scanned_file(entry.path(), meta.len(), mtime_ns);
            file.oversized = oversized;
            files.push(file);
        }

        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        files
    }

    fn scanned_file(&self, path: &Path, size: u64, mtime_ns: u64) -> ScannedFile {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let language = Language::from_path(path);

        let module = if language.is_python() {
            Some(to_module_name(rel)).filter(|m| !m.is_empty())
        } else {
            None
        };
        let package = module
            .as_deref()
            .map(to_package_name)
            .filter(|p| !p.is_empty());

        ScannedFile {
            path: path.to_path_buf(),
            rel_path: rel.to_string_lossy().into_owned(),
            language,
            module,
            package,
            size,
            mtime_ns,
            oversized: false,
        }
    }
}

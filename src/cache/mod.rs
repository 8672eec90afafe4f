//! Analysis Cache
//!
//! Completed analyses keyed by repository root and a fingerprint of the
//! scanned files. A changed file changes the fingerprint, so stale entries
//! are never returned; they age out of the LRU instead.
//!
//! @module cache

pub mod fingerprint;

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::debug;

pub use fingerprint::fingerprint;

use crate::core::config::{CacheConfig, ScanConfig};
use crate::core::error::Result;
use crate::facts::{analyze_scanned, Analysis};
use crate::scan::{resolve_root, scan_repository};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub root: PathBuf,
    pub fingerprint: u64,
}

/// Thread-safe LRU of shared, immutable analyses
pub struct AnalysisCache {
    entries: Mutex<LruCache<CacheKey, Arc<Analysis>>>,
}

impl AnalysisCache {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Analysis>> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: CacheKey, analysis: Arc<Analysis>) {
        self.entries.lock().put(key, analysis);
    }

    /// Analysis of `root`, reusing a cached one when no file changed.
    ///
    /// The repository is always rescanned to compute the fingerprint.
    pub fn get_or_analyze(&self, root: &Path, scan: &ScanConfig) -> Result<Arc<Analysis>> {
        let root = resolve_root(root)?;
        let scanned = scan_repository(&root, scan);
        let key = CacheKey {
            root: root.clone(),
            fingerprint: fingerprint(&scanned),
        };

        if let Some(hit) = self.get(&key) {
            debug!(root = %root.display(), fingerprint = key.fingerprint, "Cache hit");
            return Ok(hit);
        }
        debug!(root = %root.display(), fingerprint = key.fingerprint, "Cache miss");

        let analysis = Arc::new(analyze_scanned(&root, &scanned));
        self.insert(key, Arc::clone(&analysis));
        Ok(analysis)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hit_returns_same_analysis() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();

        let cache = AnalysisCache::default();
        let first = cache.get_or_analyze(dir.path(), &ScanConfig::default()).unwrap();
        let second = cache.get_or_analyze(dir.path(), &ScanConfig::default()).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_new_file_misses() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "def f():\n    pass\n").unwrap();

        let cache = AnalysisCache::default();
        let first = cache.get_or_analyze(dir.path(), &ScanConfig::default()).unwrap();
        fs::write(dir.path().join("b.py"), "def g():\n    pass\n").unwrap();
        let second = cache.get_or_analyze(dir.path(), &ScanConfig::default()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.result.facts.modules.len(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = AnalysisCache::new(&CacheConfig { max_entries: 1 });
        let dirs: Vec<TempDir> = (0..2).map(|_| TempDir::new().unwrap()).collect();
        for dir in &dirs {
            cache.get_or_analyze(dir.path(), &ScanConfig::default()).unwrap();
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalid_root_not_cached() {
        let cache = AnalysisCache::default();
        assert!(cache.get_or_analyze(Path::new("/definitely/not/here"), &ScanConfig::default()).is_err());
        assert!(cache.is_empty());
    }
}

use xxhash_rust::xxh3::Xxh3;

use crate::scan::ScannedFile;

/// Hash of a scan: relative path, mtime and size of every file, in order.
///
/// Any added, removed, touched or resized file changes the fingerprint.
pub fn fingerprint(files: &[ScannedFile]) -> u64 {
    let mut hasher = Xxh3::new();
    for file in files {
        hasher.update(file.rel_path.as_bytes());
        hasher.update(&[0]);
        hasher.update(&file.mtime_ns.to_le_bytes());
        hasher.update(&file.size.to_le_bytes());
    }
    hasher.digest()
}

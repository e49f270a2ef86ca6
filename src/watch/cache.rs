// src/watch/cache.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Compute the blake3 hash of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs
        .open_read(path)
        .with_context(|| format!("opening file for hashing: {:?}", path))?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

/// Last seen content hash per file.
///
/// Editors and build tools often touch or rewrite files without changing
/// them; comparing hashes lets the watcher ignore those events.
#[derive(Debug, Default)]
pub struct FileCache {
    hashes: HashMap<PathBuf, String>,
}

impl FileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-hash `path` and report whether its content differs from the last
    /// time it was seen. A file seen for the first time counts as changed.
    pub fn refresh(&mut self, fs: &dyn FileSystem, path: &Path) -> Result<bool> {
        let hash = compute_file_hash(fs, path)?;
        match self.hashes.insert(path.to_path_buf(), hash.clone()) {
            Some(previous) if previous == hash => {
                debug!(?path, "content unchanged");
                Ok(false)
            }
            _ => Ok(true),
        }
    }

    /// Drop what we know about `path` (e.g. it was deleted).
    pub fn forget(&mut self, path: &Path) {
        if self.hashes.remove(path).is_some() {
            debug!(?path, "forgot cached hash");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn blake3_of_known_content() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", b"hello world".to_vec());

        let hash = compute_file_hash(&fs, Path::new("test.txt")).unwrap();
        assert_eq!(hash, "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24");
    }

    #[test]
    fn refresh_detects_real_changes_only() {
        let fs = MockFileSystem::new();
        let path = Path::new("src/Main.scala");
        fs.add_file(path, b"object Main".to_vec());

        let mut cache = FileCache::new();
        assert!(cache.refresh(&fs, path).unwrap(), "first sighting counts as a change");
        assert!(!cache.refresh(&fs, path).unwrap(), "same bytes are not a change");

        fs.add_file(path, b"object Main { }".to_vec());
        assert!(cache.refresh(&fs, path).unwrap());

        cache.forget(path);
        assert!(cache.refresh(&fs, path).unwrap());
    }
}

// src/watch/filter.rs

//! Decides which raw filesystem events are worth a rebuild.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::GlobSet;
use notify::{Event, EventKind};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::cache::FileCache;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Falls back to comparing canonicalized paths (symlinked temp dirs on
/// macOS). Returns `None` if `path` is not under `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}

pub struct ChangeFilter {
    root: PathBuf,
    exclude: GlobSet,
    use_hash: bool,
    cache: FileCache,
    fs: Arc<dyn FileSystem>,
}

impl std::fmt::Debug for ChangeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeFilter")
            .field("root", &self.root)
            .field("use_hash", &self.use_hash)
            .finish_non_exhaustive()
    }
}

impl ChangeFilter {
    pub fn new(
        root: impl Into<PathBuf>,
        exclude: GlobSet,
        use_hash: bool,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            exclude,
            use_hash,
            cache: FileCache::new(),
            fs,
        }
    }

    /// True if at least one path in `event` should trigger a rebuild.
    pub fn is_relevant_event(&mut self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        let mut relevant = false;
        // Every path is visited so the hash cache stays current.
        for path in &event.paths {
            if self.is_relevant_path(path) {
                relevant = true;
            }
        }
        relevant
    }

    /// Exclusion and (optionally) content check for one path.
    pub fn is_relevant_path(&mut self, path: &Path) -> bool {
        let Some(rel) = relative_str(&self.root, path) else {
            warn!(?path, root = ?self.root, "could not relativize path");
            return false;
        };

        if self.exclude.is_match(&rel) {
            debug!(rel = %rel, "change excluded");
            return false;
        }

        if !self.use_hash {
            return true;
        }

        if !self.fs.is_file(path) {
            // Deleted or a directory: nothing to hash, but still a change.
            self.cache.forget(path);
            return true;
        }

        match self.cache.refresh(self.fs.as_ref(), path) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(?path, error = %err, "hashing failed; treating as changed");
                true
            }
        }
    }
}

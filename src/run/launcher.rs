// src/run/launcher.rs

//! Scoped launcher artifacts.
//!
//! A launcher artifact is the linked script or native binary produced for a
//! single execution. [`with_launcher`] owns it for the whole execution and
//! removes it afterwards, on every exit path:
//!
//! - normal return and `Err` from the caller's closure: explicit removal;
//! - link/compile failure: explicit removal;
//! - panic or the future being dropped mid-run: `TempPath`'s `Drop`.
//!
//! Removal is best effort; failures are logged at debug level only.

use std::io::ErrorKind;
use std::path::Path;

use tempfile::TempPath;
use tracing::debug;

use crate::build::SuccessfulBuild;
use crate::errors::Result;
use crate::exec::Linker;

/// Which population step produces the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    Script,
    Native,
}

impl LauncherKind {
    fn suffix(self) -> &'static str {
        match self {
            LauncherKind::Script => ".js",
            LauncherKind::Native if cfg!(windows) => ".exe",
            LauncherKind::Native => "",
        }
    }
}

/// A uniquely named file in the work directory, deleted when released or
/// dropped.
#[derive(Debug)]
pub struct LauncherArtifact {
    path: TempPath,
}

impl LauncherArtifact {
    /// Create an empty, uniquely named file in `work_dir` (created if needed).
    pub fn create(work_dir: &Path, kind: LauncherKind) -> Result<Self> {
        std::fs::create_dir_all(work_dir)?;
        let file = tempfile::Builder::new()
            .prefix("launcher-")
            .suffix(kind.suffix())
            .tempfile_in(work_dir)?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. Already-absent files and deletion errors are ignored.
    pub fn release(self) {
        let shown = self.path.to_path_buf();
        match self.path.close() {
            Ok(()) => debug!(path = ?shown, "removed launcher artifact"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = ?shown, "launcher artifact already gone")
            }
            Err(e) => debug!(path = ?shown, error = %e, "ignoring launcher cleanup failure"),
        }
    }
}

/// Produce a launcher artifact, hand its path to `f`, and remove it
/// afterwards whatever `f` did.
///
/// The path is lent to `f` by reference and must not be kept past it.
pub async fn with_launcher<T, F>(
    linker: &dyn Linker,
    build: &SuccessfulBuild,
    kind: LauncherKind,
    entry: &str,
    test_mode: bool,
    work_dir: &Path,
    f: F,
) -> Result<T>
where
    F: AsyncFnOnce(&Path) -> Result<T>,
{
    let artifact = LauncherArtifact::create(work_dir, kind)?;
    debug!(path = ?artifact.path(), ?kind, entry, "created launcher artifact");

    let populated = match kind {
        LauncherKind::Script => {
            linker
                .link_script(build, artifact.path(), entry, test_mode)
                .await
        }
        LauncherKind::Native => {
            linker
                .compile_native(build, entry, artifact.path(), work_dir)
                .await
                .and_then(|()| mark_executable(artifact.path()))
        }
    };

    if let Err(e) = populated {
        artifact.release();
        return Err(e);
    }

    let result = f(artifact.path()).await;
    artifact.release();
    result
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifacts_get_unique_names_and_release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("nested/work");

        let a = LauncherArtifact::create(&work_dir, LauncherKind::Script).unwrap();
        let b = LauncherArtifact::create(&work_dir, LauncherKind::Script).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(a.path().to_string_lossy().ends_with(".js"));

        let a_path = a.path().to_path_buf();
        std::fs::remove_file(&a_path).unwrap();
        a.release();
        assert!(!a_path.exists());

        let b_path = b.path().to_path_buf();
        drop(b);
        assert!(!b_path.exists());
    }
}

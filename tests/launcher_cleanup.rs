// tests/launcher_cleanup.rs

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use runwatch::errors::{Result, RunwatchError};
use runwatch::run::{with_launcher, LauncherKind};
use runwatch_test_utils::builders::SuccessfulBuildBuilder;
use runwatch_test_utils::fakes::FakeLinker;
use runwatch_test_utils::init_tracing;

fn leftover_files(dir: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn script_artifact_exists_during_run_and_is_removed_after() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().join(".runwatch");
    let build = SuccessfulBuildBuilder::new().work_dir(&work_dir).build();
    let linker = FakeLinker::new();

    let seen = with_launcher(
        &linker,
        &build,
        LauncherKind::Script,
        "Main",
        false,
        &work_dir,
        async |path: &Path| -> Result<(PathBuf, String)> {
            let content = std::fs::read_to_string(path)?;
            Ok((path.to_path_buf(), content))
        },
    )
    .await
    .unwrap();

    assert!(seen.1.contains("entry=Main test=false"));
    assert!(seen.0.to_string_lossy().ends_with(".js"));
    assert!(!seen.0.exists());
    assert!(leftover_files(&work_dir).is_empty());
}

#[tokio::test]
async fn native_artifact_is_removed_when_the_run_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().to_path_buf();
    let build = SuccessfulBuildBuilder::new().work_dir(&work_dir).build();
    let linker = FakeLinker::new();
    let lent = Arc::new(Mutex::new(None));

    let result: Result<()> = with_launcher(
        &linker,
        &build,
        LauncherKind::Native,
        "Main",
        false,
        &work_dir,
        async |path: &Path| {
            *lent.lock().unwrap() = Some(path.to_path_buf());
            Err(RunwatchError::Launcher("boom".to_string()))
        },
    )
    .await;

    assert!(matches!(result, Err(RunwatchError::Launcher(_))));
    let path = lent.lock().unwrap().clone().unwrap();
    assert!(!path.exists());
    assert!(leftover_files(&work_dir).is_empty());
}

#[tokio::test]
async fn link_failure_removes_artifact_and_skips_the_body() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().to_path_buf();
    let build = SuccessfulBuildBuilder::new().work_dir(&work_dir).build();
    let linker = FakeLinker::failing();
    let destinations = linker.destinations();
    let body_ran = AtomicBool::new(false);

    let result = with_launcher(
        &linker,
        &build,
        LauncherKind::Script,
        "Main",
        true,
        &work_dir,
        async |_path: &Path| {
            body_ran.store(true, Ordering::SeqCst);
            Ok(())
        },
    )
    .await;

    assert!(matches!(result, Err(RunwatchError::Launcher(_))));
    assert!(!body_ran.load(Ordering::SeqCst));
    let destinations = destinations.lock().unwrap();
    assert_eq!(destinations.len(), 1);
    assert!(!destinations[0].exists());
}

#[tokio::test]
async fn cancelled_run_still_removes_artifact() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let work_dir = dir.path().to_path_buf();
    let build = SuccessfulBuildBuilder::new().work_dir(&work_dir).build();
    let linker = FakeLinker::new();
    let destinations = linker.destinations();

    let fut = with_launcher(
        &linker,
        &build,
        LauncherKind::Script,
        "Main",
        false,
        &work_dir,
        async |_path: &Path| {
            std::future::pending::<()>().await;
            Ok(())
        },
    );
    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(50), fut).await;

    assert!(timed_out.is_err());
    let destinations = destinations.lock().unwrap();
    assert_eq!(destinations.len(), 1);
    assert!(!destinations[0].exists());
}

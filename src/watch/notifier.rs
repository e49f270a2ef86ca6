// src/watch/notifier.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::WatchSection;
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::filter::{relative_str, ChangeFilter};
use crate::watch::patterns::build_globset;
use crate::watch::session::{NotifierHandle, WatchEvent, WatchSession};

const EVENT_BUFFER: usize = 16;

/// Keeps the OS watcher and its forwarding task alive.
pub struct NotifyHandle {
    watcher: RecommendedWatcher,
    forwarder: JoinHandle<()>,
}

impl std::fmt::Debug for NotifyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyHandle")
            .field("finished", &self.forwarder.is_finished())
            .finish()
    }
}

impl NotifierHandle for NotifyHandle {
    fn dispose(self: Box<Self>) {
        let NotifyHandle { watcher, forwarder } = *self;
        drop(watcher);
        forwarder.abort();
        debug!("file watcher stopped");
    }
}

/// Watch every `paths` entry (relative to `root`) recursively and send one
/// [`WatchEvent::Changed`] per burst of relevant events.
///
/// A burst ends once `debounce` passes without further raw events.
pub fn spawn_notifier(
    root: &Path,
    paths: &[PathBuf],
    mut filter: ChangeFilter,
    debounce: Duration,
    events_tx: mpsc::Sender<WatchEvent>,
) -> Result<NotifyHandle> {
    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if raw_tx.send(event).is_err() {
                    debug!("notify event dropped; forwarder gone");
                }
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    for path in paths {
        // `root.join(".")` would leak a `./` into every event path.
        let dir: PathBuf = root.join(path).components().collect();
        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .with_context(|| format!("watching {:?}", dir))?;
        info!("watching {:?}", dir);
    }

    let forwarder = tokio::spawn(async move {
        while let Some(event) = raw_rx.recv().await {
            debug!(?event, "received notify event");
            if !filter.is_relevant_event(&event) {
                continue;
            }

            // Swallow the rest of the burst.
            loop {
                tokio::time::sleep(debounce).await;
                let mut drained = false;
                while let Ok(more) = raw_rx.try_recv() {
                    // Already a change; only the hash cache needs to see it.
                    filter.is_relevant_event(&more);
                    drained = true;
                }
                if !drained {
                    break;
                }
            }

            if events_tx.send(WatchEvent::Changed).await.is_err() {
                break;
            }
        }
        debug!("notifier forwarding loop finished");
    });

    Ok(NotifyHandle { watcher, forwarder })
}

/// Exclude globs for launcher artifacts under `work_dir`.
///
/// Empty when `work_dir` lies outside `root`: nothing there is watched.
pub fn work_dir_excludes(root: &Path, work_dir: &Path) -> Vec<String> {
    match relative_str(root, work_dir) {
        Some(rel) if !rel.is_empty() => {
            let rel = globset::escape(rel.trim_end_matches('/'));
            vec![rel.clone(), format!("{rel}/**")]
        }
        _ => Vec::new(),
    }
}

/// The change filter `start_watch` uses: `[watch].exclude` plus the work
/// directory, so launching a program never looks like a source change.
pub fn watch_filter(root: &Path, section: &WatchSection, work_dir: &Path) -> Result<ChangeFilter> {
    let mut exclude = section.exclude.clone();
    exclude.extend(work_dir_excludes(root, work_dir));
    debug!(?exclude, "watch exclusions");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    Ok(ChangeFilter::new(root, build_globset(&exclude)?, section.use_hash, fs))
}

/// Start watching per `[watch]` and wrap the notifier in a [`WatchSession`].
///
/// The returned sender feeds the same channel; callers use it to deliver
/// [`WatchEvent::Interrupted`].
pub fn start_watch(
    root: &Path,
    section: &WatchSection,
    work_dir: &Path,
) -> Result<(WatchSession, mpsc::Sender<WatchEvent>)> {
    let filter = watch_filter(root, section, work_dir)?;
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let handle = spawn_notifier(
        &root,
        &section.paths,
        filter,
        Duration::from_millis(section.debounce_ms),
        tx.clone(),
    )?;

    Ok((WatchSession::new(Box::new(handle), rx), tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::{LauncherArtifact, LauncherKind};

    #[tokio::test]
    async fn file_write_produces_a_single_changed_event() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();

        let root = dir.path().canonicalize().unwrap();
        let filter = ChangeFilter::new(
            root.clone(),
            build_globset(&[]).unwrap(),
            false,
            Arc::new(RealFileSystem),
        );
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let handle = spawn_notifier(
            &root,
            &[PathBuf::from("src")],
            filter,
            Duration::from_millis(50),
            tx,
        )
        .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        std::fs::write(root.join("src/Main.scala"), "object Main").unwrap();

        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no change event within timeout");
        assert_eq!(got, Some(WatchEvent::Changed));

        Box::new(handle).dispose();
    }

    #[test]
    fn start_watch_fails_for_missing_directory() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let section = WatchSection {
            paths: vec![PathBuf::from("does-not-exist")],
            ..WatchSection::default()
        };
        let _guard = rt.enter();
        assert!(start_watch(dir.path(), &section, &dir.path().join(".runwatch")).is_err());
    }

    #[test]
    fn work_dir_inside_root_is_excluded() {
        let root = Path::new("/proj");
        assert_eq!(
            work_dir_excludes(root, &root.join(".runwatch")),
            vec![".runwatch".to_string(), ".runwatch/**".to_string()]
        );
        assert!(work_dir_excludes(root, Path::new("/tmp/launchers")).is_empty());
        assert!(work_dir_excludes(root, root).is_empty());
    }

    #[tokio::test]
    async fn launcher_lifecycle_in_work_dir_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let work_dir = root.join(".runwatch");
        let section = WatchSection::default();

        let filter = watch_filter(&root, &section, &work_dir).unwrap();
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let handle = spawn_notifier(
            &root,
            &section.paths,
            filter,
            Duration::from_millis(50),
            tx,
        )
        .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let artifact = LauncherArtifact::create(&work_dir, LauncherKind::Script).unwrap();
        std::fs::write(artifact.path(), "console.log('hi')").unwrap();
        artifact.release();

        let quiet = tokio::time::timeout(Duration::from_millis(500), rx.recv()).await;
        assert!(quiet.is_err(), "launcher files must not trigger a rebuild: {quiet:?}");

        std::fs::write(root.join("Main.scala"), "object Main").unwrap();
        let got = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("no change event within timeout");
        assert_eq!(got, Some(WatchEvent::Changed));

        Box::new(handle).dispose();
    }
}

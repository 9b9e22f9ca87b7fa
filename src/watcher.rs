//! Marker-directory watching.
//!
//! One [`InstallDirWatcher`] per watched directory. On every write-type
//! filesystem event the directory is re-listed and every marker file is
//! handed to the pipeline; the tracker absorbs re-observations, so listing
//! the same file across events is harmless.
//!
//! Attempts the platform's native watcher backend first and falls back to a
//! polling backend when the native one is unavailable (e.g. inside a
//! container or on a network filesystem). Failure to establish a watch at
//! startup is fatal to the monitor.

use crate::marker::InstallStage;
use crate::pipeline::InstallPipeline;
use anyhow::{Context, Result};
use notify::{Config as NotifyConfig, Event, PollWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Suffix of the marker files the MDM agent writes.
pub const MARKER_SUFFIX: &str = ".plist";

/// Poll interval for the fallback backend.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Watches one marker directory and feeds the pipeline.
pub struct InstallDirWatcher {
    /// The file system watcher (kept alive to maintain watching; dropping it
    /// releases the underlying OS watch).
    _watcher: Box<dyn Watcher + Send>,
    dir: PathBuf,
}

impl std::fmt::Debug for InstallDirWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallDirWatcher")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Build the event-handler closure shared by both watcher backends.
fn make_event_handler(
    dir: PathBuf,
    stage: InstallStage,
    pipeline: Arc<InstallPipeline>,
) -> impl Fn(std::result::Result<Event, notify::Error>) + Send + 'static {
    move |result| {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Watch error on {}: {}", dir.display(), e);
                return;
            }
        };

        // Only write-type events: markers are created or rewritten in place.
        if !matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_)
        ) {
            return;
        }

        scan_directory(&dir, stage, &pipeline);
    }
}

/// List a watched directory and ingest every marker file found.
///
/// Listing failures after startup are logged and the event becomes a no-op;
/// the watcher keeps running.
pub fn scan_directory(dir: &Path, stage: InstallStage, pipeline: &InstallPipeline) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to list {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let is_marker = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(MARKER_SUFFIX));
        if !is_marker {
            continue;
        }
        log::debug!("Marker detected in {}: {}", dir.display(), path.display());
        pipeline.ingest(&path, stage);
    }
}

impl InstallDirWatcher {
    /// Start watching `dir` for markers of the given stage.
    ///
    /// # Errors
    ///
    /// Fails when the directory does not exist or the watch cannot be
    /// established on either backend. Both conditions are fatal at startup:
    /// the monitor cannot do its job without the watch.
    pub fn spawn(
        dir: &Path,
        stage: InstallStage,
        pipeline: Arc<InstallPipeline>,
    ) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Watched directory not found: {}", dir.display());
        }

        let mut watcher = Self::create_watcher(dir.to_path_buf(), stage, pipeline)?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", dir.display()))?;

        log::info!("Watching for {} markers in {}", stage.label(), dir.display());

        Ok(Self {
            _watcher: watcher,
            dir: dir.to_path_buf(),
        })
    }

    /// The watched directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Try the native backend first; fall back to polling when unavailable.
    fn create_watcher(
        dir: PathBuf,
        stage: InstallStage,
        pipeline: Arc<InstallPipeline>,
    ) -> Result<Box<dyn Watcher + Send>> {
        let handler = make_event_handler(dir.clone(), stage, Arc::clone(&pipeline));

        match notify::recommended_watcher(handler) {
            Ok(watcher) => {
                log::debug!("Marker watcher: native backend for {}", dir.display());
                Ok(Box::new(watcher))
            }
            Err(e) => {
                log::warn!(
                    "Marker watcher: native backend unavailable ({}); falling back to polling",
                    e
                );
                let fallback_handler = make_event_handler(dir, stage, pipeline);
                let poll_watcher = PollWatcher::new(
                    fallback_handler,
                    NotifyConfig::default().with_poll_interval(POLL_INTERVAL),
                )
                .context("Failed to create fallback poll watcher")?;
                Ok(Box::new(poll_watcher))
            }
        }
    }
}

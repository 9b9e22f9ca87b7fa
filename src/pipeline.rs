//! Pipeline orchestration: marker file in, reactions out.
//!
//! [`InstallPipeline`] is shared by both directory watchers. Ingestion
//! (decode + dedup decision) runs directly on the watcher callback thread and
//! never touches the network; each accepted transition is then enriched and
//! reacted to on a short-lived worker thread, so a slow lookup cannot stall
//! marker processing. Fetch-then-react ordering is preserved per event
//! because both run on the same worker.

use crate::catalog::MetadataSource;
use crate::marker::{self, InstallStage};
use crate::reactions::ReactionDispatcher;
use crate::state::{InstallEvent, InstallTracker};
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Cheaply cloneable: all fields are shared handles, and each accepted
/// transition's worker thread carries its own clone.
#[derive(Clone)]
pub struct InstallPipeline {
    tracker: Arc<InstallTracker>,
    catalog: Arc<dyn MetadataSource>,
    reactions: Arc<ReactionDispatcher>,
}

impl InstallPipeline {
    pub fn new(
        tracker: Arc<InstallTracker>,
        catalog: Arc<dyn MetadataSource>,
        reactions: Arc<ReactionDispatcher>,
    ) -> Self {
        Self {
            tracker,
            catalog,
            reactions,
        }
    }

    /// The shared dedup tracker.
    pub fn tracker(&self) -> &InstallTracker {
        &self.tracker
    }

    /// Ingest one marker file observed in a watched directory.
    ///
    /// Decode failures are logged and the file skipped; policy no-ops
    /// (duplicate start, orphan completion) end inside the tracker. An
    /// accepted transition spawns a worker for enrichment and reactions;
    /// the handle is returned so tests can join it, watchers drop it.
    pub fn ingest(&self, path: &Path, stage: InstallStage) -> Option<JoinHandle<()>> {
        let marker = match marker::read_marker(path, stage) {
            Ok(marker) => marker,
            Err(e) => {
                log::warn!("Skipping marker {}: {}", path.display(), e);
                return None;
            }
        };
        log::debug!(
            "Observed {} marker {} (catalog id {})",
            marker.stage.label(),
            marker.file_name,
            marker.catalog_id
        );

        let event = self.tracker.accept(marker.catalog_id, stage)?;

        let pipeline = self.clone();
        Some(std::thread::spawn(move || {
            pipeline.enrich_and_react(&event);
        }))
    }

    /// Fetch metadata for an accepted transition, then fire its reactions.
    ///
    /// A failed lookup drops the event silently (no retry): only successful
    /// transitions ever produce anything the user can see.
    pub fn enrich_and_react(&self, event: &InstallEvent) {
        let catalog_id = event.catalog_id();
        let metadata = match self.catalog.lookup(catalog_id) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Metadata lookup for {} failed: {}", catalog_id, e);
                return;
            }
        };
        log::debug!(
            "App found: {} ({})",
            metadata.display_name,
            metadata.package_id
        );
        self.reactions.handle(event, &metadata);
    }
}

//! In-progress install tracking.
//!
//! [`InstallTracker`] is the single piece of state shared between the two
//! directory watchers. It holds the set of catalog identifiers currently
//! known to be installing and turns raw marker observations into accepted
//! lifecycle transitions: a completion only produces an event when a matching
//! start was accepted earlier, and repeated observations of either stage are
//! absorbed.
//!
//! The tracker is intentionally in-memory only. A completion whose start was
//! observed before the monitor launched (e.g. after a restart mid-install) is
//! logged and dropped.

use crate::marker::InstallStage;
use parking_lot::Mutex;
use std::collections::HashSet;

/// An accepted install-lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallEvent {
    /// First "started" observation for this catalog identifier.
    Started(u64),
    /// "Completed" observation matching an earlier accepted start.
    Completed(u64),
}

impl InstallEvent {
    /// The catalog identifier the transition concerns.
    pub fn catalog_id(&self) -> u64 {
        match *self {
            InstallEvent::Started(id) | InstallEvent::Completed(id) => id,
        }
    }
}

/// Set of catalog identifiers currently known to be installing.
///
/// Shared (via `Arc`) between both watchers; every decision runs under one
/// lock so a start and a completion for the same identifier can never be
/// interleaved.
#[derive(Debug, Default)]
pub struct InstallTracker {
    in_progress: Mutex<HashSet<String>>,
}

impl InstallTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one marker observation to the tracked set.
    ///
    /// Returns the accepted transition, or `None` when the observation is a
    /// policy no-op (duplicate start, completion without a tracked start).
    pub fn accept(&self, catalog_id: u64, stage: InstallStage) -> Option<InstallEvent> {
        let key = catalog_id.to_string();
        let mut tracked = self.in_progress.lock();
        match stage {
            InstallStage::InProgress => {
                if tracked.insert(key) {
                    log::debug!("New install detected: {}", catalog_id);
                    Some(InstallEvent::Started(catalog_id))
                } else {
                    log::info!("Skipping already tracked install: {}", catalog_id);
                    None
                }
            }
            InstallStage::Completed => {
                if tracked.remove(&key) {
                    log::debug!("Install completed: {}", catalog_id);
                    Some(InstallEvent::Completed(catalog_id))
                } else {
                    log::info!(
                        "Skipping completion for {} - never observed in progress",
                        catalog_id
                    );
                    None
                }
            }
        }
    }

    /// Whether a catalog identifier is currently tracked as installing.
    pub fn is_tracking(&self, catalog_id: u64) -> bool {
        self.in_progress.lock().contains(&catalog_id.to_string())
    }

    /// Number of installs currently tracked.
    pub fn in_progress_count(&self) -> usize {
        self.in_progress.lock().len()
    }
}

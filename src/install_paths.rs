//! Install-path resolution from per-package records.
//!
//! When an install completes, the MDM agent has already written a record file
//! named `{bundle id}.plist` next to the marker directories. Somewhere in
//! that record is a list of receipt entries carrying the on-disk `Path` of
//! the installed bundle, but the key the list sits under varies between
//! agent versions, so the record's top-level values are scanned in order and
//! the first path-bearing list wins. A record with no such list is an
//! explicit miss: the caller skips dock registration and nothing else.

use plist::Value;
use std::path::{Path, PathBuf};

/// Locate the installed path recorded for `package_id`.
///
/// Returns `None` (logged at debug level) when the record file is missing,
/// undecodable, or contains no path-bearing entry.
pub fn resolve_install_path(device_dir: &Path, package_id: &str) -> Option<PathBuf> {
    let record_path = device_dir.join(format!("{}.plist", package_id));
    let record = match Value::from_file(&record_path) {
        Ok(value) => value,
        Err(e) => {
            log::debug!(
                "No readable record for {} at {}: {}",
                package_id,
                record_path.display(),
                e
            );
            return None;
        }
    };

    let Some(dict) = record.as_dictionary() else {
        log::debug!("Record for {} is not a dictionary", package_id);
        return None;
    };

    // The key holding the receipt list is unknown; scan every value.
    for (_key, value) in dict.iter() {
        if let Some(entries) = value.as_array()
            && let Some(first) = entries.first()
            && let Some(entry) = first.as_dictionary()
            && let Some(path) = entry.get("Path").and_then(Value::as_string)
        {
            log::debug!("Install path for {}: {}", package_id, path);
            return Some(PathBuf::from(path));
        }
    }

    log::debug!("No Path entry in record for {}", package_id);
    None
}

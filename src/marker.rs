//! Marker-file decoding.
//!
//! The MDM agent records install progress by dropping a property list per app
//! into the watched directories. The only field the monitor consumes is the
//! app's catalog identifier, nested as `MDMOptions.iTunesStoreID`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Which watched directory a marker came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Dropped into the "_In Progress" directory.
    InProgress,
    /// Dropped into the "_Completed" directory.
    Completed,
}

impl InstallStage {
    /// Human-readable label used in log lines.
    pub fn label(self) -> &'static str {
        match self {
            InstallStage::InProgress => "in-progress",
            InstallStage::Completed => "completed",
        }
    }
}

/// One decoded marker file.
#[derive(Debug, Clone)]
pub struct InstallMarker {
    /// Catalog identifier of the app the install concerns.
    pub catalog_id: u64,
    /// Directory the marker was observed in.
    pub stage: InstallStage,
    /// File name of the marker, for diagnostics.
    pub file_name: String,
}

/// Why a marker file could not be turned into an [`InstallMarker`].
///
/// All variants are recoverable: the caller logs and skips the file.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to read marker file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed marker plist: {0}")]
    Decode(#[from] plist::Error),
    #[error("marker has no MDMOptions.iTunesStoreID field")]
    MissingStoreId,
}

#[derive(Debug, Deserialize)]
struct MarkerFile {
    #[serde(rename = "MDMOptions")]
    mdm_options: Option<MdmOptions>,
}

#[derive(Debug, Deserialize)]
struct MdmOptions {
    #[serde(rename = "iTunesStoreID")]
    itunes_store_id: Option<u64>,
}

/// Decode one marker file.
///
/// # Errors
///
/// Returns [`MarkerError::Io`] if the file cannot be read,
/// [`MarkerError::Decode`] if it is not a property list, and
/// [`MarkerError::MissingStoreId`] if the catalog identifier field is absent.
pub fn read_marker(path: &Path, stage: InstallStage) -> Result<InstallMarker, MarkerError> {
    let data = std::fs::read(path)?;
    let decoded: MarkerFile = plist::from_bytes(&data)?;
    let catalog_id = decoded
        .mdm_options
        .and_then(|options| options.itunes_store_id)
        .ok_or(MarkerError::MissingStoreId)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(InstallMarker {
        catalog_id,
        stage,
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MARKER_WITH_ID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>MDMOptions</key>
    <dict>
        <key>iTunesStoreID</key>
        <integer>409183694</integer>
    </dict>
    <key>ManagementFlags</key>
    <integer>1</integer>
</dict>
</plist>
"#;

    const MARKER_WITHOUT_ID: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>MDMOptions</key>
    <dict>
        <key>ManagementFlags</key>
        <integer>1</integer>
    </dict>
</dict>
</plist>
"#;

    #[test]
    fn test_reads_catalog_id() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("12345.plist");
        fs::write(&path, MARKER_WITH_ID).expect("Failed to write marker");

        let marker =
            read_marker(&path, InstallStage::InProgress).expect("marker should decode");
        assert_eq!(marker.catalog_id, 409183694);
        assert_eq!(marker.stage, InstallStage::InProgress);
        assert_eq!(marker.file_name, "12345.plist");
    }

    #[test]
    fn test_missing_store_id_is_typed() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("12345.plist");
        fs::write(&path, MARKER_WITHOUT_ID).expect("Failed to write marker");

        let err = read_marker(&path, InstallStage::InProgress)
            .expect_err("marker without store id should fail");
        assert!(
            matches!(err, MarkerError::MissingStoreId),
            "expected MissingStoreId, got: {err}"
        );
    }

    #[test]
    fn test_missing_mdm_options_is_typed() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("12345.plist");
        fs::write(
            &path,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict><key>Other</key><string>x</string></dict></plist>"#,
        )
        .expect("Failed to write marker");

        let err = read_marker(&path, InstallStage::Completed)
            .expect_err("marker without MDMOptions should fail");
        assert!(matches!(err, MarkerError::MissingStoreId));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let path = dir.path().join("broken.plist");
        fs::write(&path, b"this is not a plist").expect("Failed to write file");

        let err = read_marker(&path, InstallStage::InProgress)
            .expect_err("garbage should fail to decode");
        assert!(matches!(err, MarkerError::Decode(_)), "got: {err}");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_marker(
            Path::new("/nonexistent/vpp-monitor-test/12345.plist"),
            InstallStage::InProgress,
        )
        .expect_err("missing file should fail");
        assert!(matches!(err, MarkerError::Io(_)));
    }

    #[test]
    fn test_stage_labels() {
        assert_eq!(InstallStage::InProgress.label(), "in-progress");
        assert_eq!(InstallStage::Completed.label(), "completed");
    }
}

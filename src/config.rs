//! Watched-path configuration.
//!
//! The MDM agent writes its marker files under fixed system locations, so the
//! defaults are constants rather than a config file. Each path can be
//! overridden through an environment variable, which is how the integration
//! tests (and manual runs against scratch directories) point the monitor at
//! temporary trees.

use std::path::PathBuf;

/// Directory the MDM agent drops "install started" markers into.
pub const IN_PROGRESS_DIR: &str =
    "/private/var/db/ConfigurationProfiles/Settings/Managed Applications/Device/_In Progress";

/// Directory the MDM agent drops "install completed" markers into.
pub const COMPLETED_DIR: &str =
    "/private/var/db/ConfigurationProfiles/Settings/Managed Applications/Device/_Completed";

/// Directory holding the per-package record files (`{bundle id}.plist`).
pub const DEVICE_DIR: &str =
    "/private/var/db/ConfigurationProfiles/Settings/Managed Applications/Device";

/// Scratch location the icon artwork is downloaded to before notifying.
const ICON_CACHE_PATH: &str = "/tmp/vpp-monitor-icon.png";

/// Paths the monitor operates on.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Watched directory for "started" markers.
    pub in_progress_dir: PathBuf,
    /// Watched directory for "completed" markers.
    pub completed_dir: PathBuf,
    /// Directory containing per-package install records.
    pub device_dir: PathBuf,
    /// Where downloaded icon artwork is written.
    pub icon_cache_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            in_progress_dir: PathBuf::from(IN_PROGRESS_DIR),
            completed_dir: PathBuf::from(COMPLETED_DIR),
            device_dir: PathBuf::from(DEVICE_DIR),
            icon_cache_path: PathBuf::from(ICON_CACHE_PATH),
        }
    }
}

impl MonitorConfig {
    /// Build the config from the process environment.
    ///
    /// `VPP_MONITOR_IN_PROGRESS_DIR`, `VPP_MONITOR_COMPLETED_DIR` and
    /// `VPP_MONITOR_DEVICE_DIR` override the corresponding default path.
    /// A production LaunchAgent sets none of them.
    pub fn from_env() -> Self {
        Self::with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(dir) = lookup("VPP_MONITOR_IN_PROGRESS_DIR") {
            config.in_progress_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VPP_MONITOR_COMPLETED_DIR") {
            config.completed_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("VPP_MONITOR_DEVICE_DIR") {
            config.device_dir = PathBuf::from(dir);
        }
        config
    }
}

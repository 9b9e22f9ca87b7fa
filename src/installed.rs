//! Installed-app detection.
//!
//! Answers "is this package's app bundle actually on disk, and where?" for a
//! given package identifier. The chain mirrors what an admin would do by
//! hand: correct the identifier's casing against the pkgutil database, pull
//! the first `.app` entry out of the package's file list, check
//! `/Applications`, and fall back to a Spotlight search for bundles that
//! were moved. Used by the `vpp-appcheck` binary; independent of the watch
//! pipeline.

use crate::shell::CommandRunner;
use std::path::{Path, PathBuf};

/// Resolve the correctly-cased package identifier from the pkgutil database.
///
/// The receipt database is case-sensitive but admins rarely are; the match
/// is case-insensitive and the first hit wins.
pub fn correct_package_id(runner: &dyn CommandRunner, package_id: &str) -> Option<String> {
    let command = format!("/usr/sbin/pkgutil --pkgs | grep -i {}", package_id);
    runner
        .run(&command)
        .and_then(|output| output.lines().next().map(|line| line.trim().to_string()))
        .filter(|id| !id.is_empty())
}

/// Extract the bundle name from a package file entry.
///
/// `Applications/Keynote.app` → `Keynote.app`.
pub fn app_name_from_path(path: &str) -> Option<String> {
    path.split('/')
        .filter(|component| !component.is_empty())
        .next_back()
        .map(str::to_string)
}

/// First `.app` entry in the package's file list, if any.
///
/// Payload-free packages (profiles, scripts) have none.
fn first_app_payload(runner: &dyn CommandRunner, package_id: &str) -> Option<String> {
    let command = format!(
        "/usr/sbin/pkgutil --files {} | grep \".app\" | head -1",
        package_id
    );
    runner.run(&command)
}

/// Check whether the bundle sits in the applications folder.
pub fn path_in_applications(app_name: &str) -> Option<PathBuf> {
    app_path_in(Path::new("/Applications"), app_name)
}

fn app_path_in(applications_dir: &Path, app_name: &str) -> Option<PathBuf> {
    let path = applications_dir.join(app_name);
    path.exists().then_some(path)
}

/// Search for the bundle with Spotlight, for apps moved out of
/// `/Applications`. First hit wins.
pub fn spotlight_search(runner: &dyn CommandRunner, app_name: &str) -> Option<PathBuf> {
    let command = format!(
        "mdfind \"kMDItemContentType == 'com.apple.application-bundle' && kMDItemFSName == '{}'\"",
        app_name
    );
    runner
        .run(&command)
        .and_then(|output| output.lines().next().map(|line| PathBuf::from(line.trim())))
}

/// Full detection chain: package id → payload → on-disk bundle path.
///
/// Returns `None` when the package is unknown, carries no `.app` payload, or
/// the bundle cannot be found on disk.
pub fn installed_app_path(runner: &dyn CommandRunner, package_id: &str) -> Option<PathBuf> {
    let Some(package) = correct_package_id(runner, package_id) else {
        log::info!("No package found for identifier: {}", package_id);
        return None;
    };
    log::debug!("Resolved package id: {}", package);

    let Some(payload) = first_app_payload(runner, &package) else {
        log::info!("No .app file found for package {}", package);
        return None;
    };
    let app_name = app_name_from_path(&payload)?;
    log::debug!("Extracted app name: {}", app_name);

    if let Some(path) = path_in_applications(&app_name) {
        log::debug!("App installed in: {}", path.display());
        return Some(path);
    }

    match spotlight_search(runner, &app_name) {
        Some(path) => {
            log::debug!("App found with Spotlight at: {}", path.display());
            Some(path)
        }
        None => {
            log::info!("App {} is not installed", app_name);
            None
        }
    }
}

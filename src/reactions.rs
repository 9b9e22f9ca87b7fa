//! Reaction dispatch: the observable side effects of a lifecycle transition.
//!
//! Each accepted transition produces exactly one user notification, and each
//! accepted completion additionally attempts one dock registration. The OS
//! boundary (console-user resolution, notification display, dock
//! manipulation, icon download) sits behind single-method capability traits:
//! production implementations in `shell` run external commands, tests inject
//! recording doubles.

use crate::catalog::AppMetadata;
use crate::install_paths;
use crate::state::InstallEvent;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Resolves the currently logged-in console user.
pub trait UserResolver: Send + Sync {
    /// Short name of the console user, or `None` when no GUI session exists.
    fn console_user(&self) -> Option<String>;
}

/// Displays a notification in the given user's session.
pub trait Notifier: Send + Sync {
    fn notify(&self, user: &str, note: &UserNotification);
}

/// Registers an application path in the given user's dock.
pub trait DockRegistrar: Send + Sync {
    fn register(&self, user: &str, app_path: &Path);
}

/// Fetches icon artwork to a local file for use in notifications.
pub trait IconFetcher: Send + Sync {
    /// Local path of the fetched icon, or `None` on any failure (best-effort).
    fn fetch(&self, url: &str) -> Option<PathBuf>;
}

/// Content of one user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotification {
    pub title: String,
    pub body: String,
    /// Vendor name shown under the title.
    pub subtitle: String,
    /// Local icon file, when artwork could be fetched.
    pub icon: Option<PathBuf>,
}

/// Fires the side effects for accepted lifecycle transitions.
pub struct ReactionDispatcher {
    users: Arc<dyn UserResolver>,
    notifier: Arc<dyn Notifier>,
    dock: Arc<dyn DockRegistrar>,
    icons: Arc<dyn IconFetcher>,
    /// Directory holding the per-package install records.
    device_dir: PathBuf,
}

impl ReactionDispatcher {
    pub fn new(
        users: Arc<dyn UserResolver>,
        notifier: Arc<dyn Notifier>,
        dock: Arc<dyn DockRegistrar>,
        icons: Arc<dyn IconFetcher>,
        device_dir: PathBuf,
    ) -> Self {
        Self {
            users,
            notifier,
            dock,
            icons,
            device_dir,
        }
    }

    /// Fire the reactions for one accepted transition.
    ///
    /// No console user is a non-fatal condition: the whole reaction is
    /// skipped and logged. Icon-fetch failure only drops the icon, never the
    /// notification. A completion whose install path cannot be resolved
    /// skips the dock step only.
    pub fn handle(&self, event: &InstallEvent, metadata: &AppMetadata) {
        let Some(user) = self.users.console_user() else {
            log::warn!(
                "No console user logged in; skipping reaction for {}",
                metadata.display_name
            );
            return;
        };

        let icon = metadata
            .icon_url
            .as_deref()
            .and_then(|url| self.icons.fetch(url));

        let note = match event {
            InstallEvent::Started(_) => UserNotification {
                title: "Installation in Progress".to_string(),
                body: format!(
                    "Installation for {} is now in progress.",
                    metadata.display_name
                ),
                subtitle: metadata.vendor_name.clone(),
                icon,
            },
            InstallEvent::Completed(_) => UserNotification {
                title: "Installation Completed".to_string(),
                body: format!(
                    "Installation of {} is now finished.",
                    metadata.display_name
                ),
                subtitle: metadata.vendor_name.clone(),
                icon,
            },
        };

        log::info!("Notifying {}: {} - {}", user, note.title, note.body);
        self.notifier.notify(&user, &note);

        if matches!(event, InstallEvent::Completed(_)) {
            self.register_in_dock(&user, metadata);
        }
    }

    fn register_in_dock(&self, user: &str, metadata: &AppMetadata) {
        if metadata.package_id.is_empty() {
            log::debug!(
                "Lookup result for {} has no bundle id; skipping dock registration",
                metadata.display_name
            );
            return;
        }
        match install_paths::resolve_install_path(&self.device_dir, &metadata.package_id) {
            Some(path) => {
                log::info!("Registering {} in dock for {}", path.display(), user);
                self.dock.register(user, &path);
            }
            None => {
                log::info!(
                    "No install path recorded for {}; skipping dock registration",
                    metadata.package_id
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod recording {
    //! Recording capability doubles shared by unit and integration tests.

    use super::*;
    use parking_lot::Mutex;

    /// `UserResolver` returning a fixed answer.
    pub struct FixedUser(pub Option<&'static str>);

    impl UserResolver for FixedUser {
        fn console_user(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    /// `Notifier` capturing every delivered notification.
    #[derive(Default)]
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<(String, UserNotification)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, user: &str, note: &UserNotification) {
            self.sent.lock().push((user.to_string(), note.clone()));
        }
    }

    /// `DockRegistrar` capturing every registration attempt.
    #[derive(Default)]
    pub struct RecordingDock {
        pub registered: Mutex<Vec<(String, PathBuf)>>,
    }

    impl DockRegistrar for RecordingDock {
        fn register(&self, user: &str, app_path: &Path) {
            self.registered
                .lock()
                .push((user.to_string(), app_path.to_path_buf()));
        }
    }

    /// `IconFetcher` that either always misses or returns a fixed path.
    pub struct FixedIcon(pub Option<PathBuf>);

    impl IconFetcher for FixedIcon {
        fn fetch(&self, _url: &str) -> Option<PathBuf> {
            self.0.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::*;
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn metadata() -> AppMetadata {
        AppMetadata {
            catalog_id: 409183694,
            display_name: "Keynote".to_string(),
            vendor_name: "Apple".to_string(),
            icon_url: Some("https://is1-ssl.mzstatic.com/icon.png".to_string()),
            package_id: "com.apple.iWork.Keynote".to_string(),
        }
    }

    struct Fixture {
        notifier: Arc<RecordingNotifier>,
        dock: Arc<RecordingDock>,
        dispatcher: ReactionDispatcher,
        _device_dir: TempDir,
    }

    fn fixture(user: Option<&'static str>, icon: Option<PathBuf>, record: Option<&str>) -> Fixture {
        let device_dir = TempDir::new().expect("Failed to create temp dir");
        if let Some(body) = record {
            fs::write(
                device_dir.path().join("com.apple.iWork.Keynote.plist"),
                body,
            )
            .expect("Failed to write record");
        }
        let notifier = Arc::new(RecordingNotifier::default());
        let dock = Arc::new(RecordingDock::default());
        let dispatcher = ReactionDispatcher::new(
            Arc::new(FixedUser(user)),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&dock) as Arc<dyn DockRegistrar>,
            Arc::new(FixedIcon(icon)),
            device_dir.path().to_path_buf(),
        );
        Fixture {
            notifier,
            dock,
            dispatcher,
            _device_dir: device_dir,
        }
    }

    const RECORD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
    <key>Receipts</key>
    <array>
        <dict>
            <key>Path</key>
            <string>/Applications/Keynote.app</string>
        </dict>
    </array>
</dict>
</plist>
"#;

    #[test]
    fn test_started_notifies_without_dock() {
        let fx = fixture(Some("mrieder"), None, Some(RECORD));
        fx.dispatcher
            .handle(&InstallEvent::Started(409183694), &metadata());

        let sent = fx.notifier.sent.lock();
        assert_eq!(sent.len(), 1, "exactly one notification per transition");
        let (user, note) = &sent[0];
        assert_eq!(user, "mrieder");
        assert_eq!(note.title, "Installation in Progress");
        assert_eq!(note.body, "Installation for Keynote is now in progress.");
        assert_eq!(note.subtitle, "Apple");
        assert!(
            fx.dock.registered.lock().is_empty(),
            "started transitions never touch the dock"
        );
    }

    #[test]
    fn test_completed_notifies_and_registers() {
        let fx = fixture(Some("mrieder"), None, Some(RECORD));
        fx.dispatcher
            .handle(&InstallEvent::Completed(409183694), &metadata());

        let sent = fx.notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.title, "Installation Completed");
        assert_eq!(sent[0].1.body, "Installation of Keynote is now finished.");

        let registered = fx.dock.registered.lock();
        assert_eq!(registered.len(), 1, "one dock attempt per completion");
        assert_eq!(registered[0].1, PathBuf::from("/Applications/Keynote.app"));
    }

    #[test]
    fn test_no_console_user_skips_everything() {
        let fx = fixture(None, None, Some(RECORD));
        fx.dispatcher
            .handle(&InstallEvent::Completed(409183694), &metadata());

        assert!(fx.notifier.sent.lock().is_empty());
        assert!(fx.dock.registered.lock().is_empty());
    }

    #[test]
    fn test_icon_failure_does_not_block_notification() {
        let fx = fixture(Some("mrieder"), None, Some(RECORD));
        fx.dispatcher
            .handle(&InstallEvent::Started(409183694), &metadata());

        let sent = fx.notifier.sent.lock();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.icon.is_none(), "failed fetch drops only the icon");
    }

    #[test]
    fn test_icon_attached_when_fetched() {
        let icon_path = PathBuf::from("/tmp/vpp-monitor-icon.png");
        let fx = fixture(Some("mrieder"), Some(icon_path.clone()), Some(RECORD));
        fx.dispatcher
            .handle(&InstallEvent::Started(409183694), &metadata());

        assert_eq!(fx.notifier.sent.lock()[0].1.icon, Some(icon_path));
    }

    #[test]
    fn test_missing_record_skips_dock_only() {
        let fx = fixture(Some("mrieder"), None, None);
        fx.dispatcher
            .handle(&InstallEvent::Completed(409183694), &metadata());

        assert_eq!(
            fx.notifier.sent.lock().len(),
            1,
            "the notification still goes out"
        );
        assert!(fx.dock.registered.lock().is_empty());
    }

    #[test]
    fn test_empty_bundle_id_skips_dock() {
        let fx = fixture(Some("mrieder"), None, Some(RECORD));
        let mut meta = metadata();
        meta.package_id = String::new();
        fx.dispatcher.handle(&InstallEvent::Completed(1), &meta);

        assert_eq!(fx.notifier.sent.lock().len(), 1);
        assert!(fx.dock.registered.lock().is_empty());
    }
}

//! Production capability implementations that shell out.
//!
//! Everything that crosses the OS boundary funnels through [`CommandRunner`]:
//! resolving the console user, displaying notifications via swiftDialog,
//! dock manipulation via dockutil. Failures are logged and swallowed; no
//! external-command outcome is ever fatal to the pipeline.

use crate::http;
use crate::reactions::{DockRegistrar, IconFetcher, Notifier, UserNotification, UserResolver};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// swiftDialog binary used for notifications.
const DIALOG_BIN: &str = "/usr/local/bin/dialog";

/// dockutil binary used for dock registration.
const DOCKUTIL_BIN: &str = "/usr/local/bin/dockutil";

/// Executes a command string and captures its output.
pub trait CommandRunner: Send + Sync {
    /// Run `command`, returning trimmed captured output, or `None` when the
    /// command produced no output or could not be spawned.
    fn run(&self, command: &str) -> Option<String>;
}

/// Production [`CommandRunner`] executing through `/bin/bash -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&self, command: &str) -> Option<String> {
        let output = match Command::new("/bin/bash").arg("-c").arg(command).output() {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Failed to run command: {}", e);
                return None;
            }
        };

        // Commands like pkgutil report misses on stderr; capture both streams.
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Escape a string for interpolation into a double-quoted shell argument.
///
/// Backslashes first, then quotes; newlines become spaces because neither
/// dialog nor dockutil accepts multi-line arguments.
fn escape_arg(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace(['\n', '\r'], " ")
        .replace('$', "\\$")
        .replace('`', "\\`")
}

/// Resolves the console user via `stat` on `/dev/console`.
pub struct ConsoleUserResolver {
    runner: Arc<dyn CommandRunner>,
}

impl ConsoleUserResolver {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl UserResolver for ConsoleUserResolver {
    fn console_user(&self) -> Option<String> {
        let user = self.runner.run("/usr/bin/stat -f %Su /dev/console")?;
        if user == "root" {
            log::debug!("Console owned by root; no GUI session");
            return None;
        }
        Some(user)
    }
}

/// Displays notifications through swiftDialog in the target user's session.
pub struct DialogNotifier {
    runner: Arc<dyn CommandRunner>,
}

impl DialogNotifier {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl Notifier for DialogNotifier {
    fn notify(&self, user: &str, note: &UserNotification) {
        let mut command = format!(
            "sudo -u {} {} --notification --title \"{}\" --message \"{}\" --subtitle \"{}\"",
            user,
            DIALOG_BIN,
            escape_arg(&note.title),
            escape_arg(&note.body),
            escape_arg(&note.subtitle)
        );
        if let Some(icon) = &note.icon {
            command.push_str(&format!(" -i \"{}\"", escape_arg(&icon.to_string_lossy())));
        }
        log::debug!("Sending notification via dialog: {}", note.title);
        self.runner.run(&command);
    }
}

/// Registers applications in the dock through dockutil.
pub struct DockutilRegistrar {
    runner: Arc<dyn CommandRunner>,
}

impl DockutilRegistrar {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

impl DockRegistrar for DockutilRegistrar {
    fn register(&self, user: &str, app_path: &Path) {
        let command = format!(
            "sudo -u {} {} --add \"{}\"",
            user,
            DOCKUTIL_BIN,
            escape_arg(&app_path.to_string_lossy())
        );
        log::debug!("Adding {} to dock for {}", app_path.display(), user);
        self.runner.run(&command);
    }
}

/// Downloads icon artwork to a fixed scratch path.
pub struct HttpIconFetcher {
    cache_path: PathBuf,
}

impl HttpIconFetcher {
    pub fn new(cache_path: PathBuf) -> Self {
        Self { cache_path }
    }
}

impl IconFetcher for HttpIconFetcher {
    fn fetch(&self, url: &str) -> Option<PathBuf> {
        let bytes = match http::download_file(url, http::MAX_ICON_SIZE) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Icon download failed: {}", e);
                return None;
            }
        };
        if let Err(e) = std::fs::write(&self.cache_path, &bytes) {
            log::warn!(
                "Failed to write icon to {}: {}",
                self.cache_path.display(),
                e
            );
            return None;
        }
        Some(self.cache_path.clone())
    }
}

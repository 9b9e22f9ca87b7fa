use anyhow::{Context, Result};
use std::sync::Arc;
use vpp_monitor::catalog::ItunesCatalog;
use vpp_monitor::cli;
use vpp_monitor::config::MonitorConfig;
use vpp_monitor::logging;
use vpp_monitor::marker::InstallStage;
use vpp_monitor::pipeline::InstallPipeline;
use vpp_monitor::reactions::ReactionDispatcher;
use vpp_monitor::shell::{
    CommandRunner, ConsoleUserResolver, DialogNotifier, DockutilRegistrar, HttpIconFetcher,
    ShellRunner,
};
use vpp_monitor::state::InstallTracker;
use vpp_monitor::watcher::InstallDirWatcher;

fn main() -> Result<()> {
    // Process CLI arguments first (before logging init for cleaner output)
    let options = cli::process_cli();
    logging::init(options.debug);

    log::info!("Starting vpp-monitor {}", env!("CARGO_PKG_VERSION"));

    let config = MonitorConfig::from_env();

    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner);
    let reactions = Arc::new(ReactionDispatcher::new(
        Arc::new(ConsoleUserResolver::new(Arc::clone(&runner))),
        Arc::new(DialogNotifier::new(Arc::clone(&runner))),
        Arc::new(DockutilRegistrar::new(Arc::clone(&runner))),
        Arc::new(HttpIconFetcher::new(config.icon_cache_path.clone())),
        config.device_dir.clone(),
    ));
    let pipeline = Arc::new(InstallPipeline::new(
        Arc::new(InstallTracker::new()),
        Arc::new(ItunesCatalog),
        reactions,
    ));

    // Watch-setup failure on either directory is fatal: the monitor cannot
    // do its job without both watches.
    let _in_progress = InstallDirWatcher::spawn(
        &config.in_progress_dir,
        InstallStage::InProgress,
        Arc::clone(&pipeline),
    )
    .context("Cannot watch the in-progress marker directory")?;
    let _completed = InstallDirWatcher::spawn(
        &config.completed_dir,
        InstallStage::Completed,
        Arc::clone(&pipeline),
    )
    .context("Cannot watch the completed marker directory")?;

    log::info!("Marker watchers running; waiting for install events");

    // All real work happens on watcher callbacks and their worker threads;
    // the process runs until externally terminated.
    loop {
        std::thread::park();
    }
}

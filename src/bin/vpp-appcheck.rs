//! Standalone installed-app check.
//!
//! Resolves whether a managed package's app bundle is actually on disk,
//! using the same detection chain the monitor relies on. Exit code 0 when
//! the app is found, 1 otherwise, so it can back MDM extension attributes
//! and install/re-install button logic.

use clap::Parser;
use vpp_monitor::installed;
use vpp_monitor::logging;
use vpp_monitor::shell::ShellRunner;

/// vpp-appcheck - check whether a managed package's app is installed
#[derive(Parser)]
#[command(name = "vpp-appcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package identifier to check (case-insensitive)
    package_id: String,

    /// Enable verbose diagnostic logging
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.debug);

    match installed::installed_app_path(&ShellRunner, &cli.package_id) {
        Some(path) => {
            println!("installed: {}", path.display());
        }
        None => {
            println!("not installed");
            std::process::exit(1);
        }
    }
}

//! Command-line interface for vpp-monitor.
//!
//! The monitor takes a single optional flag; everything else (watched paths,
//! lookup endpoint) is fixed configuration. See `config` for the env-var
//! overrides used when running against scratch directories.

use clap::Parser;

/// vpp-monitor - managed-app install monitor for MDM deployments
#[derive(Parser)]
#[command(name = "vpp-monitor")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose diagnostic logging
    #[arg(short = 'd', long)]
    pub debug: bool,
}

/// Runtime options passed from CLI to the monitor
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Verbose diagnostic logging requested
    pub debug: bool,
}

/// Process CLI arguments into runtime options.
pub fn process_cli() -> RuntimeOptions {
    let cli = Cli::parse();
    RuntimeOptions { debug: cli.debug }
}

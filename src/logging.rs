//! Logging bridge for vpp-monitor.
//!
//! Routes all `log::info!()` etc. to stderr with timestamps. The monitor runs
//! as a LaunchAgent whose stderr launchd already captures, so no separate log
//! file is kept. The `-d` flag raises the level to debug; `RUST_LOG` can
//! refine further (e.g. `RUST_LOG=trace`).

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!(
                "[{}] [{:<5}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Install the stderr logger and set the level.
///
/// Base level is `Info`, or `Debug` when `debug` is set. A parseable
/// `RUST_LOG` value can only raise verbosity, never silence what the flag
/// asked for. Safe to call more than once; later calls only adjust the level.
pub fn init(debug: bool) {
    let mut level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Ok(env) = std::env::var("RUST_LOG")
        && let Ok(parsed) = env.trim().parse::<LevelFilter>()
    {
        level = level.max(parsed);
    }

    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test: the logger level is process-global, so splitting these
    // assertions across tests would race under the parallel test runner.
    #[test]
    fn test_init_levels() {
        init(false);
        assert!(log::log_enabled!(log::Level::Info));

        init(true);
        assert!(
            log::max_level() >= LevelFilter::Debug,
            "re-init with debug should raise the level"
        );
        assert!(log::log_enabled!(log::Level::Debug));
    }
}

//! Diagnostic logging to stderr.
//!
//! The event log owns stdout; everything diagnostic (warning
//! summaries, league progress, bot `log()` output) goes to stderr
//! through the `log` facade. The level is taken from the
//! `SKIRMISH_LOG` environment variable (`error`, `warn`, `info`,
//! `debug`, `trace`; default `info`).

use std::io::{self, Write};
use std::sync::OnceLock;

use log::{LevelFilter, Metadata, Record, SetLoggerError};

#[derive(Debug)]
struct StderrLogger {
    level: LevelFilter,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f");
        let mut stderr = io::stderr().lock();
        let _ = writeln!(
            stderr,
            "{timestamp} {:5} [{}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger. Safe to call once per process.
///
/// # Errors
///
/// Returns an error if another logger is already installed.
pub fn init() -> Result<(), SetLoggerError> {
    let level = std::env::var("SKIRMISH_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let logger = LOGGER.get_or_init(|| StderrLogger { level });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

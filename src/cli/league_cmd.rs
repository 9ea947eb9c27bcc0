//! The `league` command: round-robin tournament, script list on
//! stdin, markdown report on stdout.

use std::io::{BufRead, Write};
use std::path::Path;

use skirmish::config::Config;
use skirmish::league::{self, DEFAULT_WORKERS};

use super::CliError;

/// Execute the league command.
///
/// Worker count precedence: `--workers` flag, then the
/// `LEAGUE_WORKERS` environment variable, then 8.
///
/// # Errors
///
/// Returns an error for invalid configuration or an empty bot list.
/// Individual match failures are logged and do not abort the league.
pub(crate) fn execute(workers: Option<usize>, config_path: &Path) -> Result<(), CliError> {
    let config = Config::load(config_path)?;
    let workers = workers.unwrap_or_else(workers_from_env);

    let stdin = std::io::stdin();
    let mut identifiers = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            identifiers.push(trimmed.to_string());
        }
    }

    if identifiers.is_empty() {
        return Err(CliError::new("no bot scripts provided via stdin"));
    }

    log::info!(
        "running league: {} bots, {} workers",
        identifiers.len(),
        workers
    );
    let report = league::run_league(&identifiers, &config, workers)?;

    // Echo the configuration file in the report when it exists.
    let config_display = std::fs::read_to_string(config_path).ok();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    out.write_all(report.render_markdown(config_display.as_deref()).as_bytes())?;
    out.flush()?;
    Ok(())
}

/// Read the worker count from `LEAGUE_WORKERS`, defaulting to 8.
fn workers_from_env() -> usize {
    match std::env::var("LEAGUE_WORKERS") {
        Ok(value) => match value.trim().parse::<usize>() {
            Ok(n) if n >= 1 => n,
            _ => {
                log::warn!("invalid LEAGUE_WORKERS value '{value}', using default {DEFAULT_WORKERS}");
                DEFAULT_WORKERS
            }
        },
        Err(_) => DEFAULT_WORKERS,
    }
}

//! The `match` command: run one match, event log to stdout.

use std::io::Write;
use std::path::Path;

use skirmish::config::Config;
use skirmish::source::ScriptSource;

use super::CliError;

/// Execute the match command.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable scripts, or
/// a bot that fails to load. Bot misbehavior during the match is
/// reported in the event log instead.
pub(crate) fn execute(scripts: &[String], config_path: &Path) -> Result<(), CliError> {
    let config = Config::load(config_path)?;

    let mut sources = Vec::with_capacity(scripts.len());
    for identifier in scripts {
        sources.push(ScriptSource::resolve(identifier)?);
    }

    let log = skirmish::run_match(&sources, &config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    log.write_jsonl(&mut out)?;
    out.flush()?;
    Ok(())
}

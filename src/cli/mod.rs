//! CLI command implementations.

pub(crate) mod league_cmd;
pub(crate) mod match_cmd;

use std::error::Error;
use std::fmt;

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<skirmish::MatchError> for CliError {
    fn from(e: skirmish::MatchError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<skirmish::config::ConfigError> for CliError {
    fn from(e: skirmish::config::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<skirmish::source::SourceError> for CliError {
    fn from(e: skirmish::source::SourceError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<skirmish::league::LeagueError> for CliError {
    fn from(e: skirmish::league::LeagueError) -> Self {
        Self::new(e.to_string())
    }
}

//! Error types for match setup and execution.
//!
//! Everything here is fatal: it aborts the match with a non-zero exit.
//! In-match bot misbehavior never surfaces as an error; it is reported
//! through warning records in the event log.

use std::fmt;

use crate::config::ConfigError;
use crate::script::ScriptError;

/// Fatal match error.
#[derive(Debug)]
pub enum MatchError {
    /// The configuration violates structural constraints.
    Config(ConfigError),
    /// Not enough scripts for a match (minimum 2).
    TooFewPlayers(usize),
    /// More scripts than the configured player cap.
    TooManyPlayers {
        /// Number of scripts supplied.
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A bot failed to load.
    Load {
        /// 1-based index of the failing player.
        player: usize,
        /// Bot label.
        label: String,
        /// Underlying script error.
        source: ScriptError,
    },
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "{e}"),
            Self::TooFewPlayers(n) => write!(f, "too few players: {n} (minimum 2)"),
            Self::TooManyPlayers { count, max } => {
                write!(f, "too many players: {count} (max {max})")
            }
            Self::Load {
                player,
                label,
                source,
            } => write!(f, "player {player} ({label}): {source}"),
        }
    }
}

impl std::error::Error for MatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Load { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for MatchError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

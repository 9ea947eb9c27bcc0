//! Sandboxed bot script runtime.
//!
//! One interpreter per player per match. The runtime contains one
//! untrusted Lua program, exposes the capability API to it, and
//! enforces the configured resource limits.

mod runtime;

pub use runtime::ScriptRuntime;

use std::fmt;

/// Maximum warnings recorded per bot per tick.
pub const MAX_WARNINGS_PER_TICK: usize = 3;

/// An in-band report of bot API misuse or resource exhaustion.
///
/// The tick is assigned by the orchestrator when the warning is
/// written to the event log.
#[derive(Debug, Clone)]
pub struct Warning {
    /// 1-based index of the offending player.
    pub player: usize,
    /// Name of the API involved.
    pub api: &'static str,
    /// Stringified raw arguments of the offending call.
    pub args: Vec<String>,
    /// Human-readable reason.
    pub reason: String,
}

/// Fatal script runtime error. Anything here aborts the match for the
/// bot; in-match misbehavior is reported through [`Warning`] instead.
#[derive(Debug)]
pub enum ScriptError {
    /// The interpreter could not be constructed with the configured
    /// limits.
    Init(String),
    /// Top-level evaluation of the bot source failed.
    Load(String),
    /// The source evaluated but did not install a global `run`
    /// function.
    NoRunFunction,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(reason) => write!(f, "interpreter setup failed: {reason}"),
            Self::Load(reason) => write!(f, "load failed: {reason}"),
            Self::NoRunFunction => write!(f, "no run function"),
        }
    }
}

impl std::error::Error for ScriptError {}

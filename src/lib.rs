// Allow unwrap in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
//! Skirmish: a deterministic bot-match engine.
//!
//! Two or more untrusted Lua bot programs decide, tick by tick, what
//! their robot should do. Each bot runs in an isolated,
//! resource-bounded interpreter; the engine collects intents, applies
//! them to a shared world through a fixed per-tick pipeline, and
//! emits a JSONL stream of world-state records.
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------+
//! |        League Driver (rayon)         |
//! +--------------------------------------+
//! |     Tick Orchestrator (arena)        |
//! +--------------------------------------+
//! |  Simulator (game)  | Runtime (mlua)  |
//! +--------------------------------------+
//! ```

pub mod arena;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod league;
pub mod logging;
pub mod script;
pub mod source;

pub use arena::run_match;
pub use config::Config;
pub use error::MatchError;
pub use event::{Event, EventLog};
pub use game::{Engine, Intent, Snapshot, World};
pub use league::{run_league, LeagueReport};
pub use script::ScriptRuntime;
pub use source::ScriptSource;

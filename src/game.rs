//! Game layer: the deterministic tick simulation.
//!
//! - World state (players, projectiles, intents)
//! - The per-tick simulator pipeline
//! - Read-only sensor queries for scripts
//! - Sanity invariants over reachable worlds

mod engine;
mod invariants;
mod queries;
mod state;

pub use engine::Engine;
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use queries::{scan, Detection};
pub use state::{Intent, Player, Projectile, Rng, Snapshot, World};

//! World invariants - sanity checks that detect bugs.
//!
//! A correctly implemented pipeline can never violate these; every
//! input is sanitized before it reaches the simulator. If one fires,
//! it indicates a bug, not bot misbehavior.

use crate::config::Config;
use crate::game::state::World;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all world invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(world: &World, config: &Config) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for (i, p) in world.players.iter().enumerate() {
        let index = i + 1;

        if p.hp < 0 || p.hp > config.robot.max_hp {
            violations.push(InvariantViolation {
                message: format!(
                    "player {index} hp {} outside [0, {}]",
                    p.hp, config.robot.max_hp
                ),
            });
        }

        if p.ammo < 0 || p.ammo > config.robot.max_ammo {
            violations.push(InvariantViolation {
                message: format!(
                    "player {index} ammo {} outside [0, {}]",
                    p.ammo, config.robot.max_ammo
                ),
            });
        }

        if !config.field.contains(p.x, p.y) {
            violations.push(InvariantViolation {
                message: format!("player {index} at ({}, {}) outside the field", p.x, p.y),
            });
        }

        if p.x.fract() != 0.0 || p.y.fract() != 0.0 {
            violations.push(InvariantViolation {
                message: format!(
                    "player {index} at ({}, {}) has non-integral coordinates",
                    p.x, p.y
                ),
            });
        }

        if !(0.0..360.0).contains(&p.heading) {
            violations.push(InvariantViolation {
                message: format!("player {index} heading {} outside [0, 360)", p.heading),
            });
        }

        let inflight = world.inflight_count(index);
        if inflight > config.robot.max_inflight {
            violations.push(InvariantViolation {
                message: format!(
                    "player {index} has {inflight} projectiles inflight (cap {})",
                    config.robot.max_inflight
                ),
            });
        }
    }

    for q in &world.projectiles {
        if q.traveled < 0.0 || q.traveled > q.target {
            violations.push(InvariantViolation {
                message: format!(
                    "projectile {} traveled {} outside [0, {}]",
                    q.id, q.traveled, q.target
                ),
            });
        }
    }

    violations
}

/// Assert all world invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with a detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(world: &World, config: &Config) {
    let violations = check_invariants(world, config);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("World invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_world: &World, _config: &Config) {}

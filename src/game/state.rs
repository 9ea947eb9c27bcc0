//! World state: players, projectiles, intents.

use serde::{Serialize, Serializer};

/// Deterministic PRNG using xorshift64.
///
/// Used only for initial player placement; the per-tick pipeline draws
/// no randomness, which is what keeps matches reproducible.
#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        // Ensure non-zero state
        let state = if seed == 0 { 0x5555_5555_5555_5555 } else { seed };
        Self { state }
    }

    /// Generate next random u64.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generate random f64 in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Serialize an integral `f64` coordinate as a JSON integer.
///
/// Player coordinates are rounded after every write, so the value has
/// no fractional part by the time it is serialized.
#[allow(clippy::cast_possible_truncation)]
fn coord<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(*v as i64)
}

/// State of a single player.
#[derive(Debug, Clone, Serialize)]
pub struct Player {
    /// X coordinate, integral, within `[-width/2, width/2]`.
    #[serde(serialize_with = "coord")]
    pub x: f64,
    /// Y coordinate, integral, within `[-height/2, height/2]`.
    #[serde(serialize_with = "coord")]
    pub y: f64,
    /// Heading in degrees, normalized to `[0, 360)`. 0 points north
    /// (+Y), 90 east (+X).
    pub heading: f64,
    /// Hit points, never negative.
    pub hp: i32,
    /// Projectiles remaining in inventory, never negative.
    pub ammo: i32,
}

impl Player {
    /// Euclidean distance from this player to a point.
    #[must_use]
    pub fn distance_to(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A live projectile.
#[derive(Debug, Clone, Serialize)]
pub struct Projectile {
    /// Match-unique monotonically increasing id. Never reused.
    pub id: u64,
    /// Owning player index (1-based).
    pub owner: usize,
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// X velocity, fixed at creation.
    pub vx: f64,
    /// Y velocity, fixed at creation.
    pub vy: f64,
    /// Target travel distance.
    pub target: f64,
    /// Distance accumulated so far.
    pub traveled: f64,
}

/// A sanitized request from a bot to change the world, consumed once
/// by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Move along the current heading by a signed integral distance.
    Move(i64),
    /// Add a raw degree offset to the heading.
    Turn(i64),
    /// Launch a projectile with the given target distance.
    Fire(i64),
}

/// Complete world state for one match.
#[derive(Debug, Clone)]
pub struct World {
    /// Committed tick counter.
    pub tick: u64,
    /// Players in stable index order (1-based externally).
    pub players: Vec<Player>,
    /// Live projectiles.
    pub projectiles: Vec<Projectile>,
    /// Next projectile id to hand out.
    pub next_projectile_id: u64,
    /// Match RNG state.
    pub rng: Rng,
}

impl World {
    /// Get a player by 1-based index.
    #[must_use]
    pub fn player(&self, index: usize) -> Option<&Player> {
        index.checked_sub(1).and_then(|i| self.players.get(i))
    }

    /// Count live projectiles owned by the given player.
    #[must_use]
    pub fn inflight_count(&self, owner: usize) -> usize {
        self.projectiles.iter().filter(|p| p.owner == owner).count()
    }

    /// Build the immutable view scripts and the event log consume.
    ///
    /// `tick` is supplied by the caller: scripts observe the tick they
    /// are deciding for, which is one ahead of the committed counter.
    #[must_use]
    pub fn snapshot(&self, tick: u64) -> Snapshot {
        Snapshot {
            tick,
            players: self.players.clone(),
            projectiles: self.projectiles.clone(),
        }
    }
}

/// An immutable view of the world at a given tick.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// The tick this view describes.
    pub tick: u64,
    /// Player states.
    pub players: Vec<Player>,
    /// Live projectiles.
    pub projectiles: Vec<Projectile>,
}

impl Snapshot {
    /// Get a player by 1-based index.
    #[must_use]
    pub fn player(&self, index: usize) -> Option<&Player> {
        index.checked_sub(1).and_then(|i| self.players.get(i))
    }
}

//! World simulator: applies per-tick intent batches to the world.
//!
//! The per-tick pipeline runs in a strict order: increment the tick
//! counter, apply each player's intents in player-index order, then
//! sweep the live projectiles once. Inputs are sanitized before they
//! reach the simulator, so `apply` never fails.

use crate::config::Config;
use crate::game::state::{Intent, Player, Projectile, Rng, World};

/// The match simulator. Holds the world and the configuration it was
/// created with; all mutation goes through [`Engine::apply`].
#[derive(Debug, Clone)]
pub struct Engine {
    /// Current world state.
    pub world: World,
    /// Tuning parameters, read-only.
    pub config: Config,
}

impl Engine {
    /// Create a new engine with `num_players` players spawned at
    /// uniformly random integral positions and headings drawn from an
    /// RNG seeded with `seed`.
    #[must_use]
    pub fn new(config: &Config, num_players: usize, seed: u64) -> Self {
        let mut rng = Rng::new(seed);
        let half_w = config.field.half_width();
        let half_h = config.field.half_height();

        let players = (0..num_players)
            .map(|_| Player {
                x: (rng.next_f64() * 2.0 * half_w - half_w).round(),
                y: (rng.next_f64() * 2.0 * half_h - half_h).round(),
                heading: rng.next_f64() * 360.0,
                hp: config.robot.max_hp,
                ammo: config.robot.max_ammo,
            })
            .collect();

        Self {
            world: World {
                tick: 0,
                players,
                projectiles: Vec::new(),
                next_projectile_id: 1,
                rng,
            },
            config: *config,
        }
    }

    /// Advance the world by one tick.
    ///
    /// `intents` is indexed by player (0-based internally); each
    /// element is that player's ordered intent list for the tick.
    /// Players beyond the intent slice simply act on nothing.
    pub fn apply(&mut self, intents: &[Vec<Intent>]) {
        self.world.tick += 1;

        for (idx, batch) in intents.iter().enumerate() {
            let player_index = idx + 1;
            if idx >= self.world.players.len() {
                continue;
            }
            for intent in batch {
                self.apply_intent(idx, player_index, *intent);
            }
        }

        self.sweep_projectiles();
    }

    fn apply_intent(&mut self, idx: usize, player_index: usize, intent: Intent) {
        match intent {
            Intent::Move(distance) => {
                let p = &mut self.world.players[idx];
                // 0 deg = north (Y+), 90 deg = east (X+)
                let rad = p.heading.to_radians();
                let new_x = p.x + rad.sin() * distance as f64;
                let new_y = p.y + rad.cos() * distance as f64;

                let half_w = self.config.field.half_width();
                let half_h = self.config.field.half_height();
                p.x = new_x.clamp(-half_w, half_w).round();
                p.y = new_y.clamp(-half_h, half_h).round();
            }
            Intent::Turn(degrees) => {
                let p = &mut self.world.players[idx];
                p.heading = (p.heading + degrees as f64).rem_euclid(360.0);
            }
            Intent::Fire(distance) => {
                let can_fire = {
                    let p = &self.world.players[idx];
                    p.ammo > 0
                        && self.world.inflight_count(player_index)
                            < self.config.robot.max_inflight
                };
                if !can_fire {
                    return;
                }

                let speed = self.config.projectile.speed as f64;
                let p = &mut self.world.players[idx];
                let rad = p.heading.to_radians();
                let projectile = Projectile {
                    id: self.world.next_projectile_id,
                    owner: player_index,
                    x: p.x,
                    y: p.y,
                    vx: rad.sin() * speed,
                    vy: rad.cos() * speed,
                    target: distance as f64,
                    traveled: 0.0,
                };
                p.ammo -= 1;
                self.world.projectiles.push(projectile);
                self.world.next_projectile_id += 1;
            }
        }
    }

    /// Advance every live projectile by one step.
    ///
    /// Boundary removal takes precedence over detonation: a projectile
    /// that leaves the field on the same step it reaches its target is
    /// removed without damage.
    fn sweep_projectiles(&mut self) {
        let half_w = self.config.field.half_width();
        let half_h = self.config.field.half_height();
        let speed = self.config.projectile.speed as f64;
        let damage_radius = self.config.projectile.damage_radius as f64;
        let damage = self.config.projectile.damage;

        let mut remaining = Vec::with_capacity(self.world.projectiles.len());

        for mut projectile in self.world.projectiles.drain(..) {
            projectile.x += projectile.vx;
            projectile.y += projectile.vy;
            projectile.traveled += speed;

            let outside = projectile.x < -half_w
                || projectile.x > half_w
                || projectile.y < -half_h
                || projectile.y > half_h;
            if outside {
                continue;
            }

            if projectile.traveled >= projectile.target {
                for p in &mut self.world.players {
                    if p.distance_to(projectile.x, projectile.y) <= damage_radius {
                        p.hp = (p.hp - damage).max(0);
                    }
                }
                continue;
            }

            remaining.push(projectile);
        }

        self.world.projectiles = remaining;
    }

    /// True when at most one player still has hit points.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.world.players.iter().filter(|p| p.hp > 0).count() <= 1
    }
}

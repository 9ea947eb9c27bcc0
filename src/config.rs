//! Match configuration.
//!
//! Configuration is read once at startup from a TOML file and then
//! consumed read-only by every other subsystem. A missing file falls
//! back to the defaults with a logged warning; a structurally invalid
//! file is a fatal error.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Match-level settings.
    #[serde(rename = "match")]
    pub match_: MatchConfig,
    /// Field dimensions.
    pub field: FieldConfig,
    /// Per-robot movement and inventory constraints.
    pub robot: RobotConfig,
    /// Projectile flight and damage parameters.
    pub projectile: ProjectileConfig,
    /// Script runtime resource limits.
    pub runtime: RuntimeConfig,
    /// Sensor constraints.
    pub sensor: SensorConfig,
}

/// Match-level settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum ticks before the match ends.
    pub max_ticks: u64,
    /// Maximum number of players in a match.
    pub max_players: usize,
    /// Seed for the match RNG. Zero selects a clock-derived seed.
    pub random_seed: u64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_ticks: 1000,
            max_players: 2,
            random_seed: 0,
        }
    }
}

/// Field dimensions. The field is the closed square
/// `[-width/2, width/2] x [-height/2, height/2]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    /// Field width.
    pub width: i64,
    /// Field height.
    pub height: i64,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 1000,
        }
    }
}

impl FieldConfig {
    /// Half the field width.
    #[must_use]
    pub fn half_width(&self) -> f64 {
        self.width as f64 / 2.0
    }

    /// Half the field height.
    #[must_use]
    pub fn half_height(&self) -> f64 {
        self.height as f64 / 2.0
    }

    /// Length of the field diagonal.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        ((self.width * self.width + self.height * self.height) as f64).sqrt()
    }

    /// Check whether a point lies inside the field.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= -self.half_width()
            && x <= self.half_width()
            && y >= -self.half_height()
            && y <= self.half_height()
    }
}

/// Per-robot movement and inventory constraints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Minimum movement magnitude per tick.
    pub min_move: i64,
    /// Maximum movement magnitude per tick.
    pub max_move: i64,
    /// Hit points at match start.
    pub max_hp: i32,
    /// Projectiles in inventory at match start.
    pub max_ammo: i32,
    /// Maximum live projectiles per owner.
    pub max_inflight: usize,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            min_move: 1,
            max_move: 10,
            max_hp: 100,
            max_ammo: 10,
            max_inflight: 3,
        }
    }
}

/// Projectile flight and damage parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileConfig {
    /// Maximum requestable target distance.
    pub max_flying_distance: i64,
    /// Distance travelled per tick.
    pub speed: i64,
    /// Detonation damage radius.
    pub damage_radius: i64,
    /// Hit points subtracted on detonation.
    pub damage: i32,
}

impl Default for ProjectileConfig {
    fn default() -> Self {
        Self {
            max_flying_distance: 100,
            speed: 10,
            damage_radius: 5,
            damage: 10,
        }
    }
}

/// Script runtime resource limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Interpreter heap limit in bytes.
    pub max_memory_bytes: usize,
    /// Interpreter stack limit in bytes.
    pub max_stack_bytes: usize,
    /// Wall-clock budget per tick in milliseconds. Zero disables the
    /// interrupt.
    pub tick_timeout_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_memory_bytes: 10 * 1024 * 1024,
            max_stack_bytes: 1024 * 1024,
            tick_timeout_ms: 100,
        }
    }
}

/// Sensor constraints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Minimum accepted scan resolution in degrees.
    pub min_scan: i64,
    /// Maximum accepted scan resolution in degrees.
    pub max_scan: i64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            min_scan: 10,
            max_scan: 45,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// Description of the violated constraint.
    pub reason: String,
}

impl ConfigError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid configuration: {}", self.reason)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Read configuration from a TOML file.
    ///
    /// Missing sections and fields take their default values. If the
    /// file does not exist, the defaults are returned and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or
    /// parsed, or if the parsed configuration fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::warn!(
                "config file {} not found, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::new(format!("reading {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| ConfigError::new(format!("parsing {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural constraints.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.match_.max_ticks == 0 {
            return Err(ConfigError::new("match.max_ticks must be positive"));
        }
        if self.match_.max_players < 2 {
            return Err(ConfigError::new("match.max_players must be at least 2"));
        }
        if self.field.width <= 0 || self.field.height <= 0 {
            return Err(ConfigError::new("field dimensions must be positive"));
        }
        if self.robot.min_move < 1 || self.robot.min_move > self.robot.max_move {
            return Err(ConfigError::new(
                "robot.min_move must satisfy 1 <= min_move <= max_move",
            ));
        }
        if self.robot.max_hp <= 0 {
            return Err(ConfigError::new("robot.max_hp must be positive"));
        }
        if self.robot.max_ammo < 0 {
            return Err(ConfigError::new("robot.max_ammo must be non-negative"));
        }
        if self.projectile.speed <= 0 {
            return Err(ConfigError::new("projectile.speed must be positive"));
        }
        if self.projectile.max_flying_distance <= 0 {
            return Err(ConfigError::new(
                "projectile.max_flying_distance must be positive",
            ));
        }
        if self.projectile.damage_radius < 0 {
            return Err(ConfigError::new(
                "projectile.damage_radius must be non-negative",
            ));
        }
        if self.projectile.damage < 0 {
            return Err(ConfigError::new("projectile.damage must be non-negative"));
        }
        if self.sensor.min_scan <= 0
            || self.sensor.min_scan > self.sensor.max_scan
            || self.sensor.max_scan > 360
        {
            return Err(ConfigError::new(
                "sensor range must satisfy 0 < min_scan <= max_scan <= 360",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.match_.max_ticks, 1000);
        assert_eq!(cfg.match_.max_players, 2);
        assert_eq!(cfg.match_.random_seed, 0);
        assert_eq!(cfg.field.width, 1000);
        assert_eq!(cfg.field.height, 1000);
        assert_eq!(cfg.robot.min_move, 1);
        assert_eq!(cfg.robot.max_move, 10);
        assert_eq!(cfg.robot.max_hp, 100);
        assert_eq!(cfg.robot.max_ammo, 10);
        assert_eq!(cfg.robot.max_inflight, 3);
        assert_eq!(cfg.projectile.max_flying_distance, 100);
        assert_eq!(cfg.projectile.speed, 10);
        assert_eq!(cfg.projectile.damage_radius, 5);
        assert_eq!(cfg.projectile.damage, 10);
        assert_eq!(cfg.runtime.max_memory_bytes, 10 * 1024 * 1024);
        assert_eq!(cfg.runtime.max_stack_bytes, 1024 * 1024);
        assert_eq!(cfg.runtime.tick_timeout_ms, 100);
        assert_eq!(cfg.sensor.min_scan, 10);
        assert_eq!(cfg.sensor.max_scan, 45);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_merges_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [field]
            width = 500

            [projectile]
            damage = 25
            "#,
        )
        .unwrap();

        assert_eq!(cfg.field.width, 500);
        assert_eq!(cfg.field.height, 1000);
        assert_eq!(cfg.projectile.damage, 25);
        assert_eq!(cfg.projectile.speed, 10);
        assert_eq!(cfg.match_.max_ticks, 1000);
    }

    #[test]
    fn test_round_trip() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.match_.max_ticks, cfg.match_.max_ticks);
        assert_eq!(parsed.robot.max_inflight, cfg.robot.max_inflight);
    }

    #[test]
    fn test_validate_rejects_bad_field() {
        let mut cfg = Config::default();
        cfg.field.width = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_move_range() {
        let mut cfg = Config::default();
        cfg.robot.min_move = 20;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_scan_range() {
        let mut cfg = Config::default();
        cfg.sensor.min_scan = 50;
        cfg.sensor.max_scan = 45;
        assert!(cfg.validate().is_err());

        cfg.sensor.min_scan = 0;
        cfg.sensor.max_scan = 45;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_field_geometry() {
        let field = FieldConfig::default();
        assert!((field.half_width() - 500.0).abs() < f64::EPSILON);
        assert!(field.contains(500.0, -500.0));
        assert!(!field.contains(500.1, 0.0));
        let diag = field.diagonal();
        assert!((diag - (2_000_000f64).sqrt()).abs() < 1e-9);
    }
}

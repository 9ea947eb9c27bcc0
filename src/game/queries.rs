//! Read-only sensor queries over an immutable world view.
//!
//! These are pure functions: they never mutate state and are safe to
//! call any number of times per tick.

use serde::Serialize;

use crate::config::Config;
use crate::game::state::Snapshot;

/// A single scan hit.
#[derive(Debug, Clone, Serialize)]
pub struct Detection {
    /// Kind of object detected. Currently always `"robot"`.
    pub kind: &'static str,
    /// Bearing from the scanner in degrees, normalized to `[0, 360)`.
    pub angle: f64,
    /// Euclidean distance from the scanner.
    pub distance: f64,
}

/// Scan an arc for other players.
///
/// The field of view is the half-open arc
/// `[center - resolution/2, center + resolution/2)` in degrees with
/// wrap-around. A resolution outside the configured sensor range
/// yields no detections. Hits closer than 1 or farther than the field
/// diagonal are discarded. Results are sorted by distance ascending,
/// then angle ascending.
#[must_use]
pub fn scan(
    snapshot: &Snapshot,
    config: &Config,
    player_index: usize,
    center: i64,
    resolution: i64,
) -> Vec<Detection> {
    if resolution < config.sensor.min_scan || resolution > config.sensor.max_scan {
        return Vec::new();
    }

    let Some(scanner) = snapshot.player(player_index) else {
        return Vec::new();
    };

    let center = (center as f64).rem_euclid(360.0);
    let half_res = resolution as f64 / 2.0;
    let mut arc_min = center - half_res;
    let mut arc_max = center + half_res;
    if arc_min < 0.0 {
        arc_min += 360.0;
    }
    if arc_max >= 360.0 {
        arc_max -= 360.0;
    }

    let max_distance = config.field.diagonal();

    let mut hits: Vec<Detection> = snapshot
        .players
        .iter()
        .enumerate()
        .filter(|(i, _)| i + 1 != player_index)
        .filter_map(|(_, target)| {
            let dx = target.x - scanner.x;
            let dy = target.y - scanner.y;
            let distance = (dx * dx + dy * dy).sqrt();

            // Bearing with 0 deg = north, 90 deg = east.
            let mut angle = dx.atan2(dy).to_degrees();
            if angle < 0.0 {
                angle += 360.0;
            }

            let in_arc = if arc_min <= arc_max {
                angle >= arc_min && angle < arc_max
            } else {
                // Arc wraps through north.
                angle >= arc_min || angle < arc_max
            };

            if in_arc && distance >= 1.0 && distance <= max_distance {
                Some(Detection {
                    kind: "robot",
                    angle,
                    distance,
                })
            } else {
                None
            }
        })
        .collect();

    hits.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.angle.total_cmp(&b.angle))
    });

    hits
}

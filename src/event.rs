//! The match event log.
//!
//! A match produces an append-only sequence of records serialized as
//! newline-delimited JSON: one `meta` record, then per executed tick
//! any number of `warning` records followed by exactly one `state`
//! record.

use std::io::{self, Write};

use serde::Serialize;

use crate::game::{Player, Projectile, Snapshot};

/// A single event log record.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Match parameters and bot labels, emitted once at match start.
    Meta {
        /// Labels of the participating bots, in player order.
        #[serde(rename = "botNames")]
        bot_names: Vec<String>,
        /// Tick cap for this match.
        #[serde(rename = "maxTicks")]
        max_ticks: u64,
        /// Field width.
        #[serde(rename = "fieldWidth")]
        field_width: i64,
        /// Field height.
        #[serde(rename = "fieldHeight")]
        field_height: i64,
        /// The resolved RNG seed.
        seed: u64,
    },
    /// Full world snapshot at the end of a tick.
    State {
        /// The tick this snapshot closes.
        tick: u64,
        /// Player states.
        players: Vec<Player>,
        /// Live projectiles.
        projectiles: Vec<Projectile>,
    },
    /// Bot misuse report, with the pre-update snapshot attached for
    /// context.
    Warning {
        /// The tick the bot was deciding for.
        tick: u64,
        /// 1-based index of the offending player.
        player: usize,
        /// Name of the API involved.
        api: String,
        /// Stringified raw arguments, omitted when empty.
        #[serde(skip_serializing_if = "Vec::is_empty")]
        args: Vec<String>,
        /// Human-readable reason.
        reason: String,
        /// Player states before the update.
        players: Vec<Player>,
        /// Live projectiles before the update.
        projectiles: Vec<Projectile>,
    },
}

impl Event {
    /// Build a `state` record from a post-update snapshot.
    #[must_use]
    pub fn state(snapshot: Snapshot) -> Self {
        Self::State {
            tick: snapshot.tick,
            players: snapshot.players,
            projectiles: snapshot.projectiles,
        }
    }
}

/// The complete, ordered event log of one match.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Records in emission order.
    pub events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record.
    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// The last `state` record, if any. This is the terminal state a
    /// league driver scores from.
    #[must_use]
    pub fn final_state(&self) -> Option<&Event> {
        self.events
            .iter()
            .rev()
            .find(|e| matches!(e, Event::State { .. }))
    }

    /// Final hit points per player, from the last `state` record.
    #[must_use]
    pub fn final_hp(&self) -> Option<Vec<i32>> {
        match self.final_state()? {
            Event::State { players, .. } => Some(players.iter().map(|p| p.hp).collect()),
            _ => None,
        }
    }

    /// Write the log as newline-delimited JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the underlying write
    /// fails.
    pub fn write_jsonl<W: Write>(&self, mut writer: W) -> io::Result<()> {
        for event in &self.events {
            let line = serde_json::to_string(event)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

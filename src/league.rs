//! League driver: parallel round-robin over match invocations.
//!
//! Forms all unordered pairs from a list of script identifiers and
//! dispatches each pair to an independent match on a bounded worker
//! pool. Matches share nothing mutable: each resolves its own sources
//! and runs on its own engine and interpreters. A single match
//! failure is logged and scored for neither side.

use std::collections::HashMap;
use std::fmt;

use rayon::prelude::*;

use crate::arena::run_match;
use crate::config::Config;
use crate::source::{bot_label, ScriptSource};

/// Default worker count when none is configured.
pub const DEFAULT_WORKERS: usize = 8;

/// Outcome of a single pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    FirstWins,
    SecondWins,
    Draw,
    Error,
}

/// Result of one match within the league.
#[derive(Debug, Clone)]
struct PairResult {
    first: String,
    second: String,
    outcome: Outcome,
    first_hp: i32,
    second_hp: i32,
}

/// Accumulated statistics for one bot.
#[derive(Debug, Clone, Default)]
pub struct BotStats {
    /// Bot label.
    pub label: String,
    /// Matches won.
    pub wins: u32,
    /// Matches lost.
    pub losses: u32,
    /// Matches drawn.
    pub draws: u32,
    /// Accumulated end-of-match hit points, for tie-breaking.
    pub total_hp: i64,
}

impl BotStats {
    /// Fraction of decided-or-drawn matches won.
    #[must_use]
    pub fn win_ratio(&self) -> f64 {
        let total = self.wins + self.losses + self.draws;
        if total == 0 {
            return 0.0;
        }
        f64::from(self.wins) / f64::from(total)
    }
}

/// Final league standings and totals.
#[derive(Debug, Clone)]
pub struct LeagueReport {
    /// Per-bot statistics, ranked best first.
    pub standings: Vec<BotStats>,
    /// Number of participating bots.
    pub total_bots: usize,
    /// Number of scheduled matches.
    pub total_matches: usize,
}

/// League error.
#[derive(Debug)]
pub enum LeagueError {
    /// Fewer than two bots were supplied.
    NotEnoughBots(usize),
    /// The worker pool could not be built.
    Pool(String),
}

impl fmt::Display for LeagueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnoughBots(n) => {
                write!(f, "need at least 2 bots for a league (got {n})")
            }
            Self::Pool(reason) => write!(f, "failed to build worker pool: {reason}"),
        }
    }
}

impl std::error::Error for LeagueError {}

/// Run a round-robin league over the given script identifiers.
///
/// # Errors
///
/// Returns an error if fewer than two identifiers are supplied or the
/// worker pool cannot be built. Individual match failures are logged
/// and do not abort the tournament.
pub fn run_league(
    identifiers: &[String],
    config: &Config,
    workers: usize,
) -> Result<LeagueReport, LeagueError> {
    if identifiers.len() < 2 {
        return Err(LeagueError::NotEnoughBots(identifiers.len()));
    }

    let pairs = all_pairs(identifiers);
    let total_matches = pairs.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .build()
        .map_err(|e| LeagueError::Pool(e.to_string()))?;

    let results: Vec<PairResult> = pool.install(|| {
        pairs
            .par_iter()
            .map(|(first, second)| play_pair(first, second, config))
            .collect()
    });

    let standings = rank(aggregate(&results));

    Ok(LeagueReport {
        standings,
        total_bots: identifiers.len(),
        total_matches,
    })
}

/// All unordered pairs, in input order.
fn all_pairs(identifiers: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for i in 0..identifiers.len() {
        for j in i + 1..identifiers.len() {
            pairs.push((identifiers[i].clone(), identifiers[j].clone()));
        }
    }
    pairs
}

/// Resolve both sources and run one match; failures become an `Error`
/// outcome that counts for neither side.
fn play_pair(first: &str, second: &str, config: &Config) -> PairResult {
    let first_label = bot_label(first);
    let second_label = bot_label(second);

    let error_result = |reason: String| {
        log::warn!("match {first_label} vs {second_label} failed: {reason}");
        PairResult {
            first: first_label.clone(),
            second: second_label.clone(),
            outcome: Outcome::Error,
            first_hp: 0,
            second_hp: 0,
        }
    };

    let sources = match (ScriptSource::resolve(first), ScriptSource::resolve(second)) {
        (Ok(a), Ok(b)) => vec![a, b],
        (Err(e), _) | (_, Err(e)) => return error_result(e.to_string()),
    };

    let log = match run_match(&sources, config) {
        Ok(log) => log,
        Err(e) => return error_result(e.to_string()),
    };

    let Some(hp) = log.final_hp() else {
        return error_result("no state record in event log".to_string());
    };
    let (first_hp, second_hp) = (hp[0], hp[1]);

    let outcome = match first_hp.cmp(&second_hp) {
        std::cmp::Ordering::Greater => Outcome::FirstWins,
        std::cmp::Ordering::Less => Outcome::SecondWins,
        std::cmp::Ordering::Equal => Outcome::Draw,
    };

    PairResult {
        first: first_label,
        second: second_label,
        outcome,
        first_hp,
        second_hp,
    }
}

/// Fold match results into per-bot statistics.
fn aggregate(results: &[PairResult]) -> Vec<BotStats> {
    let mut by_label: HashMap<&str, BotStats> = HashMap::new();

    for result in results {
        for label in [result.first.as_str(), result.second.as_str()] {
            by_label.entry(label).or_insert_with(|| BotStats {
                label: label.to_string(),
                ..BotStats::default()
            });
        }

        if result.outcome == Outcome::Error {
            continue;
        }

        if let Some(s) = by_label.get_mut(result.first.as_str()) {
            match result.outcome {
                Outcome::FirstWins => s.wins += 1,
                Outcome::SecondWins => s.losses += 1,
                Outcome::Draw => s.draws += 1,
                Outcome::Error => unreachable!(),
            }
            s.total_hp += i64::from(result.first_hp);
        }
        if let Some(s) = by_label.get_mut(result.second.as_str()) {
            match result.outcome {
                Outcome::FirstWins => s.losses += 1,
                Outcome::SecondWins => s.wins += 1,
                Outcome::Draw => s.draws += 1,
                Outcome::Error => unreachable!(),
            }
            s.total_hp += i64::from(result.second_hp);
        }
    }

    by_label.into_values().collect()
}

/// Sort standings: win ratio descending, then accumulated hp
/// descending, then label ascending.
fn rank(mut standings: Vec<BotStats>) -> Vec<BotStats> {
    standings.sort_by(|a, b| {
        b.win_ratio()
            .total_cmp(&a.win_ratio())
            .then(b.total_hp.cmp(&a.total_hp))
            .then(a.label.cmp(&b.label))
    });
    standings
}

impl LeagueReport {
    /// Render the report as a markdown document, optionally echoing
    /// the configuration it ran with.
    #[must_use]
    pub fn render_markdown(&self, config_display: Option<&str>) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        let _ = writeln!(out, "# League Results\n");
        let _ = writeln!(
            out,
            "**Date**: {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "- **Total Bots**: {}", self.total_bots);
        let _ = writeln!(out, "- **Total Matches**: {}\n", self.total_matches);

        if let Some(config) = config_display {
            let _ = writeln!(out, "## Match Configuration\n");
            let _ = writeln!(out, "```toml\n{}\n```\n", config.trim());
        }

        let _ = writeln!(out, "## Rankings");
        let _ = writeln!(out, "| Rank | Bot | Wins | Losses | Draws | Win Rate |");
        let _ = writeln!(out, "|------|-----|------|--------|-------|----------|");
        for (i, stats) in self.standings.iter().enumerate() {
            let _ = writeln!(
                out,
                "| {} | `{}` | {} | {} | {} | {:.1}% |",
                i + 1,
                stats.label,
                stats.wins,
                stats.losses,
                stats.draws,
                stats.win_ratio() * 100.0,
            );
        }
        out
    }
}

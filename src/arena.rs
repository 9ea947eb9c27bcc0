//! The tick orchestrator.
//!
//! Couples the simulator and the script runtimes into the
//! sense-decide-apply loop and produces the event log. One call, one
//! match: `(sources, config) -> event log`, deterministic for a fixed
//! non-zero seed.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::Config;
use crate::error::MatchError;
use crate::event::{Event, EventLog};
use crate::game::{assert_invariants, Engine, Intent};
use crate::script::ScriptRuntime;
use crate::source::ScriptSource;

/// Run a complete match.
///
/// Bots are executed sequentially in player-index order within each
/// tick; the loop emits every warning (tagged with the tick the bot
/// was deciding for, with the pre-update snapshot attached) and then
/// exactly one `state` record per executed tick.
///
/// # Determinism
///
/// With `random_seed != 0`, the same sources and configuration always
/// produce a byte-identical event log. A zero seed draws from the
/// system clock.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the player count
/// is out of range, or any bot fails to load. Bot misbehavior during
/// the match is never an error.
pub fn run_match(sources: &[ScriptSource], config: &Config) -> Result<EventLog, MatchError> {
    config.validate()?;

    if sources.len() < 2 {
        return Err(MatchError::TooFewPlayers(sources.len()));
    }
    if sources.len() > config.match_.max_players {
        return Err(MatchError::TooManyPlayers {
            count: sources.len(),
            max: config.match_.max_players,
        });
    }

    let seed = resolve_seed(config.match_.random_seed);
    let mut engine = Engine::new(config, sources.len(), seed);

    let mut runtimes = Vec::with_capacity(sources.len());
    for (i, source) in sources.iter().enumerate() {
        let player = i + 1;
        let runtime = ScriptRuntime::new(config, player).map_err(|e| MatchError::Load {
            player,
            label: source.label.clone(),
            source: e,
        })?;
        runtime.load(&source.code).map_err(|e| MatchError::Load {
            player,
            label: source.label.clone(),
            source: e,
        })?;
        runtimes.push(runtime);
    }

    let mut log = EventLog::new();
    log.push(Event::Meta {
        bot_names: sources.iter().map(|s| s.label.clone()).collect(),
        max_ticks: config.match_.max_ticks,
        field_width: config.field.width,
        field_height: config.field.height,
        seed,
    });

    for tick in 1..=config.match_.max_ticks {
        // Scripts observe the tick they are deciding for.
        let view = engine.world.snapshot(tick);

        let mut intents: Vec<Vec<Intent>> = Vec::with_capacity(runtimes.len());
        let mut warnings = Vec::new();
        for runtime in &runtimes {
            let (batch, batch_warnings) = runtime.run(&view);
            intents.push(batch);
            warnings.extend(batch_warnings);
        }

        engine.apply(&intents);
        assert_invariants(&engine.world, config);

        for warning in warnings {
            log::warn!(
                "player {}: {}: {}",
                warning.player,
                warning.api,
                warning.reason
            );
            log.push(Event::Warning {
                tick,
                player: warning.player,
                api: warning.api.to_string(),
                args: warning.args,
                reason: warning.reason,
                players: view.players.clone(),
                projectiles: view.projectiles.clone(),
            });
        }

        log.push(Event::state(engine.world.snapshot(engine.world.tick)));

        if engine.is_over() {
            break;
        }
    }

    Ok(log)
}

/// Resolve the configured seed: zero selects a clock-derived seed.
fn resolve_seed(configured: u64) -> u64 {
    if configured != 0 {
        return configured;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(42)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(label: &str, code: &str) -> ScriptSource {
        ScriptSource {
            label: label.to_string(),
            code: code.to_string(),
        }
    }

    fn idle_pair() -> Vec<ScriptSource> {
        vec![
            source("a", "function run(state) end"),
            source("b", "function run(state) end"),
        ]
    }

    fn seeded_config(seed: u64, max_ticks: u64) -> Config {
        let mut cfg = Config::default();
        cfg.match_.random_seed = seed;
        cfg.match_.max_ticks = max_ticks;
        cfg
    }

    #[test]
    fn test_meta_comes_first() {
        let cfg = seeded_config(42, 5);
        let log = run_match(&idle_pair(), &cfg).unwrap();
        assert!(matches!(log.events[0], Event::Meta { .. }));
        match &log.events[0] {
            Event::Meta {
                bot_names, seed, ..
            } => {
                assert_eq!(bot_names, &["a".to_string(), "b".to_string()]);
                assert_eq!(*seed, 42);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_one_state_per_tick_strictly_increasing() {
        let cfg = seeded_config(42, 7);
        let log = run_match(&idle_pair(), &cfg).unwrap();

        let ticks: Vec<u64> = log
            .events
            .iter()
            .filter_map(|e| match e {
                Event::State { tick, .. } => Some(*tick),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_deterministic_for_fixed_seed() {
        let cfg = seeded_config(1234, 20);
        let sources = vec![
            source("a", "function run(state) move(5) turn(10) end"),
            source("b", "function run(state) fire(50) end"),
        ];

        let mut first = Vec::new();
        run_match(&sources, &cfg)
            .unwrap()
            .write_jsonl(&mut first)
            .unwrap();
        let mut second = Vec::new();
        run_match(&sources, &cfg)
            .unwrap()
            .write_jsonl(&mut second)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_seeds_change_spawns() {
        let a = run_match(&idle_pair(), &seeded_config(1, 1)).unwrap();
        let b = run_match(&idle_pair(), &seeded_config(2, 1)).unwrap();

        let mut buf_a = Vec::new();
        a.write_jsonl(&mut buf_a).unwrap();
        let mut buf_b = Vec::new();
        b.write_jsonl(&mut buf_b).unwrap();
        assert_ne!(buf_a, buf_b);
    }

    #[test]
    fn test_warning_emitted_with_forward_tick() {
        let cfg = seeded_config(42, 1);
        let sources = vec![
            source("dup", "function run(state) move(1) move(2) end"),
            source("b", "function run(state) end"),
        ];
        let log = run_match(&sources, &cfg).unwrap();

        let warning = log
            .events
            .iter()
            .find(|e| matches!(e, Event::Warning { .. }))
            .expect("warning record");
        match warning {
            Event::Warning {
                tick, player, api, ..
            } => {
                assert_eq!(*tick, 1);
                assert_eq!(*player, 1);
                assert_eq!(api, "move");
            }
            _ => unreachable!(),
        }

        // Warnings precede the tick's state record.
        let warning_pos = log
            .events
            .iter()
            .position(|e| matches!(e, Event::Warning { .. }))
            .unwrap();
        let state_pos = log
            .events
            .iter()
            .position(|e| matches!(e, Event::State { .. }))
            .unwrap();
        assert!(warning_pos < state_pos);
    }

    #[test]
    fn test_too_few_players() {
        let cfg = seeded_config(42, 5);
        let one = vec![source("a", "function run(state) end")];
        assert!(matches!(
            run_match(&one, &cfg),
            Err(MatchError::TooFewPlayers(1))
        ));
    }

    #[test]
    fn test_too_many_players() {
        let cfg = seeded_config(42, 5);
        let three = vec![
            source("a", "function run(state) end"),
            source("b", "function run(state) end"),
            source("c", "function run(state) end"),
        ];
        assert!(matches!(
            run_match(&three, &cfg),
            Err(MatchError::TooManyPlayers { count: 3, max: 2 })
        ));
    }

    #[test]
    fn test_load_failure_aborts_match() {
        let cfg = seeded_config(42, 5);
        let sources = vec![
            source("a", "function run(state) end"),
            source("broken", "not lua at all"),
        ];
        match run_match(&sources, &cfg) {
            Err(MatchError::Load { player, label, .. }) => {
                assert_eq!(player, 2);
                assert_eq!(label, "broken");
            }
            other => panic!("expected load error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_run_function_aborts_match() {
        let cfg = seeded_config(42, 5);
        let sources = vec![
            source("a", "function run(state) end"),
            source("norun", "local x = 1"),
        ];
        assert!(matches!(
            run_match(&sources, &cfg),
            Err(MatchError::Load { player: 2, .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = seeded_config(42, 5);
        cfg.field.width = -1;
        assert!(matches!(
            run_match(&idle_pair(), &cfg),
            Err(MatchError::Config(_))
        ));
    }

    #[test]
    fn test_runs_full_tick_cap_without_winner() {
        let cfg = seeded_config(42, 1000);
        let log = run_match(&idle_pair(), &cfg).unwrap();
        let states = log
            .events
            .iter()
            .filter(|e| matches!(e, Event::State { .. }))
            .count();
        assert_eq!(states, 1000);
    }

    #[test]
    fn test_resolve_seed() {
        assert_eq!(resolve_seed(7), 7);
        assert_ne!(resolve_seed(0), 0);
    }
}

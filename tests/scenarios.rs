//! End-to-end match scenarios driven through real Lua bots.
//!
//! Each scenario places players at fixed poses, runs the
//! sense-decide-apply loop the way the orchestrator does, and checks
//! the world afterwards.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use skirmish::config::Config;
use skirmish::game::Engine;
use skirmish::script::{ScriptRuntime, Warning};

/// A fixed starting pose: x, y, heading.
type Pose = (f64, f64, f64);

struct Scenario {
    engine: Engine,
    runtimes: Vec<ScriptRuntime>,
}

impl Scenario {
    fn new(config: &Config, bots: &[&str], poses: &[Pose]) -> Self {
        assert_eq!(bots.len(), poses.len());

        let mut engine = Engine::new(config, bots.len(), 42);
        for (player, &(x, y, heading)) in engine.world.players.iter_mut().zip(poses) {
            player.x = x;
            player.y = y;
            player.heading = heading;
        }

        let runtimes = bots
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let rt = ScriptRuntime::new(config, i + 1).unwrap();
                rt.load(code).unwrap();
                rt
            })
            .collect();

        Self { engine, runtimes }
    }

    /// Run one tick; returns the warnings collected from all bots.
    fn step(&mut self) -> Vec<Warning> {
        let view = self.engine.world.snapshot(self.engine.world.tick + 1);
        let mut intents = Vec::with_capacity(self.runtimes.len());
        let mut warnings = Vec::new();
        for rt in &self.runtimes {
            let (batch, batch_warnings) = rt.run(&view);
            intents.push(batch);
            warnings.extend(batch_warnings);
        }
        self.engine.apply(&intents);
        warnings
    }

    /// Run ticks until the match is over or the cap is hit; returns
    /// the number of ticks executed.
    fn run_until_over(&mut self, cap: u64) -> u64 {
        for i in 1..=cap {
            self.step();
            if self.engine.is_over() {
                return i;
            }
        }
        cap
    }
}

const IDLE: &str = "function run(state) end";

#[test]
fn scenario_straight_march() {
    let cfg = Config::default();
    let mut scenario = Scenario::new(
        &cfg,
        &["function run(state) move(5) end", IDLE],
        &[(-50.0, 0.0, 0.0), (50.0, 0.0, 180.0)],
    );

    for i in 1..=10 {
        scenario.step();
        assert_eq!(scenario.engine.world.players[0].y, f64::from(i * 5));
    }

    let p1 = &scenario.engine.world.players[0];
    let p2 = &scenario.engine.world.players[1];
    assert_eq!((p1.x, p1.y), (-50.0, 50.0));
    assert_eq!((p2.x, p2.y), (50.0, 0.0));
}

#[test]
fn scenario_cardinal_turn() {
    let cfg = Config::default();
    let walker = r"
        local n = 0
        function run(state)
            n = n + 1
            if n % 2 == 1 then
                move(10)
            else
                turn(90)
            end
        end
    ";
    let mut scenario = Scenario::new(
        &cfg,
        &[walker, IDLE],
        &[(-50.0, 0.0, 0.0), (50.0, 0.0, 180.0)],
    );

    // North, east, south, then west back to the start.
    let expected: [(f64, f64, f64); 7] = [
        (-50.0, 10.0, 0.0),
        (-50.0, 10.0, 90.0),
        (-40.0, 10.0, 90.0),
        (-40.0, 10.0, 180.0),
        (-40.0, 0.0, 180.0),
        (-40.0, 0.0, 270.0),
        (-50.0, 0.0, 270.0),
    ];
    for (tick, &(x, y, heading)) in expected.iter().enumerate() {
        scenario.step();
        let p1 = &scenario.engine.world.players[0];
        assert_eq!(
            (p1.x, p1.y, p1.heading),
            (x, y, heading),
            "tick {}",
            tick + 1
        );
    }
}

#[test]
fn scenario_wall_clamp() {
    // Movement limits lifted so a single stride crosses the wall.
    let mut cfg = Config::default();
    cfg.robot.max_move = 1000;
    let mut scenario = Scenario::new(
        &cfg,
        &["function run(state) move(600) end", IDLE],
        &[(-50.0, 0.0, 0.0), (50.0, 0.0, 180.0)],
    );

    scenario.step();
    let p1 = &scenario.engine.world.players[0];
    assert_eq!((p1.x, p1.y), (-50.0, 500.0));

    // Pushing into the wall keeps the pose pinned.
    scenario.step();
    let p1 = &scenario.engine.world.players[0];
    assert_eq!((p1.x, p1.y), (-50.0, 500.0));
}

#[test]
fn scenario_single_hit() {
    let cfg = Config::default();
    let gunner = r"
        local fired = false
        function run(state)
            if not fired then
                fired = true
                fire(50)
            end
        end
    ";
    let mut scenario = Scenario::new(
        &cfg,
        &[gunner, IDLE],
        &[(-50.0, 0.0, 90.0), (0.0, 0.0, 180.0)],
    );

    // Distance 50 at speed 10: the projectile detonates on the fifth
    // sweep, on top of the stationary target.
    for _ in 0..5 {
        scenario.step();
    }
    assert_eq!(scenario.engine.world.players[1].hp, 90);
    assert_eq!(scenario.engine.world.players[0].hp, 100);
    assert!(scenario.engine.world.projectiles.is_empty());
}

#[test]
fn scenario_inflight_cap() {
    let cfg = Config::default();
    let mut scenario = Scenario::new(
        &cfg,
        &["function run(state) fire(100) end", IDLE],
        &[(-400.0, 0.0, 0.0), (400.0, 0.0, 180.0)],
    );

    let mut max_observed = 0;
    for _ in 0..10 {
        scenario.step();
        let inflight = scenario.engine.world.projectiles.len();
        assert!(inflight <= cfg.robot.max_inflight);
        max_observed = max_observed.max(inflight);
    }
    assert_eq!(max_observed, cfg.robot.max_inflight);
}

#[test]
fn scenario_ammo_exhaustion() {
    let cfg = Config::default();
    let mut scenario = Scenario::new(
        &cfg,
        &["function run(state) fire(10) end", IDLE],
        &[(-400.0, 0.0, 0.0), (400.0, 0.0, 180.0)],
    );

    for _ in 0..15 {
        scenario.step();
    }

    // Target distance equals one step, so every projectile detonates
    // the tick it launches: exactly max_ammo projectiles ever existed.
    assert_eq!(scenario.engine.world.players[0].ammo, 0);
    assert_eq!(
        scenario.engine.world.next_projectile_id,
        u64::try_from(cfg.robot.max_ammo).unwrap() + 1
    );
    assert!(scenario.engine.world.projectiles.is_empty());
}

#[test]
fn scenario_termination() {
    let cfg = Config::default();
    let hunter = r"
        function run(state)
            local hits = scan(90, 30)
            if #hits > 0 then
                fire(hits[1].distance)
            end
        end
    ";
    let mut scenario = Scenario::new(
        &cfg,
        &[hunter, IDLE],
        &[(-50.0, 0.0, 90.0), (50.0, 0.0, 180.0)],
    );
    scenario.engine.world.players[1].hp = 20;

    let ticks = scenario.run_until_over(100);
    assert!(ticks < 100, "match should end early, ran {ticks} ticks");
    assert_eq!(scenario.engine.world.players[1].hp, 0);
    assert!(scenario.engine.is_over());
}

#[test]
fn scenario_timeout() {
    let mut cfg = Config::default();
    cfg.runtime.tick_timeout_ms = 50;
    let mut scenario = Scenario::new(
        &cfg,
        &["function run(state) while true do end end", IDLE],
        &[(-50.0, 0.0, 0.0), (50.0, 0.0, 180.0)],
    );

    for _ in 0..3 {
        let warnings = scenario.step();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].player, 1);
        assert_eq!(warnings[0].api, "run");
        assert_eq!(warnings[0].reason, "execution timed out");
    }
    // No intents ever got through.
    let p1 = &scenario.engine.world.players[0];
    assert_eq!((p1.x, p1.y), (-50.0, 0.0));
}

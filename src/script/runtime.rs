//! The mlua-backed bot interpreter.
//!
//! Each runtime owns a Lua 5.4 state constructed with only the math,
//! table, and string libraries, a heap ceiling, and an instruction
//! hook that enforces the per-tick wall-clock budget. The capability
//! table is installed once at construction; per-tick state lives in a
//! shared scratch cell the host functions write into.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, Instant};

use mlua::{
    Function, HookTriggers, Lua, LuaOptions, LuaSerdeExt, MultiValue, RegistryKey, StdLib, Value,
    VmState,
};

use crate::config::Config;
use crate::game::{self, Intent, Snapshot};
use crate::script::{ScriptError, Warning, MAX_WARNINGS_PER_TICK};

/// How many Lua instructions run between budget checks.
const HOOK_INSTRUCTION_INTERVAL: u32 = 1_000;

/// Read-only proxy builder installed at construction. Children are
/// replaced by proxies first, so nested writes are inert too.
const FREEZE_SRC: &str = r"
local function freeze(t)
    for k, v in pairs(t) do
        if type(v) == 'table' then
            rawset(t, k, freeze(v))
        end
    end
    return setmetatable({}, {
        __index = t,
        __newindex = function() end,
        __len = function() return #t end,
        __metatable = false,
    })
end
return freeze
";

/// Per-tick state shared between the host functions and the runtime.
#[derive(Default)]
struct Scratch {
    intents: Vec<Intent>,
    warnings: Vec<Warning>,
    move_used: bool,
    turn_used: bool,
    fire_used: bool,
    snapshot: Option<Snapshot>,
}

impl Scratch {
    fn begin_tick(&mut self, snapshot: Snapshot) {
        self.intents.clear();
        self.warnings.clear();
        self.move_used = false;
        self.turn_used = false;
        self.fire_used = false;
        self.snapshot = Some(snapshot);
    }

    fn warn(&mut self, player: usize, api: &'static str, args: &[Value], reason: &str) {
        if self.warnings.len() >= MAX_WARNINGS_PER_TICK {
            return;
        }
        self.warnings.push(Warning {
            player,
            api,
            args: args.iter().map(format_arg).collect(),
            reason: reason.to_string(),
        });
    }
}

/// Why a `run` invocation produced no usable result.
enum RunFailure {
    Timeout,
    Memory,
    StackOverflow,
    Script(String),
}

/// One sandboxed bot interpreter, reused for every tick of a match.
pub struct ScriptRuntime {
    lua: Lua,
    freeze: RegistryKey,
    scratch: Rc<RefCell<Scratch>>,
    timed_out: Rc<Cell<bool>>,
    player: usize,
    tick_timeout: Duration,
}

impl ScriptRuntime {
    /// Create an interpreter for the given player with the configured
    /// resource limits, and install the capability table.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Init`] if the interpreter cannot be
    /// constructed.
    pub fn new(config: &Config, player: usize) -> Result<Self, ScriptError> {
        // No io, os, package, or debug: the capability table is the
        // only authority the script gets.
        let lua = Lua::new_with(
            StdLib::MATH | StdLib::TABLE | StdLib::STRING,
            LuaOptions::default(),
        )
        .map_err(|e| ScriptError::Init(e.to_string()))?;

        lua.set_memory_limit(config.runtime.max_memory_bytes)
            .map_err(|e| ScriptError::Init(e.to_string()))?;

        let freeze_fn: Function = lua
            .load(FREEZE_SRC)
            .set_name("freeze")
            .eval()
            .map_err(|e| ScriptError::Init(e.to_string()))?;
        let freeze = lua
            .create_registry_value(freeze_fn)
            .map_err(|e| ScriptError::Init(e.to_string()))?;

        let scratch = Rc::new(RefCell::new(Scratch::default()));

        let runtime = Self {
            lua,
            freeze,
            scratch,
            timed_out: Rc::new(Cell::new(false)),
            player,
            tick_timeout: Duration::from_millis(config.runtime.tick_timeout_ms),
        };
        runtime
            .install_capabilities(config)
            .map_err(|e| ScriptError::Init(e.to_string()))?;
        Ok(runtime)
    }

    /// Parse and top-level-evaluate the bot source exactly once, then
    /// verify that a global `run` function was installed.
    ///
    /// The wall-clock interrupt is armed during evaluation so a
    /// non-terminating top level fails the load instead of hanging the
    /// match.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Load`] if evaluation raises, or
    /// [`ScriptError::NoRunFunction`] if no `run` entry point exists.
    pub fn load(&self, source: &str) -> Result<(), ScriptError> {
        self.arm_interrupt();
        let result = self
            .lua
            .load(source)
            .set_name(format!("player{}", self.player))
            .exec();
        self.lua.remove_hook();
        result.map_err(|e| ScriptError::Load(e.to_string()))?;

        self.lua
            .globals()
            .get::<Function>("run")
            .map_err(|_| ScriptError::NoRunFunction)?;
        Ok(())
    }

    /// Execute the bot's `run` function for one tick.
    ///
    /// Returns the recorded intents (at most one per capability, in
    /// call order) and any warnings. A timed-out, out-of-memory, or
    /// otherwise failed run yields no intents plus a warning; the
    /// interpreter stays usable for later ticks.
    pub fn run(&self, view: &Snapshot) -> (Vec<Intent>, Vec<Warning>) {
        self.scratch.borrow_mut().begin_tick(view.clone());
        self.timed_out.set(false);

        let outcome = self.call_run(view);

        let mut scratch = self.scratch.borrow_mut();
        if let Err(failure) = outcome {
            // Never a partial intent sequence.
            scratch.intents.clear();
            let reason = match failure {
                RunFailure::Timeout => "execution timed out".to_string(),
                RunFailure::Memory => "memory limit exceeded".to_string(),
                RunFailure::StackOverflow => "stack overflow".to_string(),
                RunFailure::Script(msg) => msg,
            };
            scratch.warn(self.player, "run", &[], &reason);
        }
        (
            std::mem::take(&mut scratch.intents),
            std::mem::take(&mut scratch.warnings),
        )
    }

    fn call_run(&self, view: &Snapshot) -> Result<(), RunFailure> {
        let state = self
            .lua
            .to_value(view)
            .map_err(|e| self.classify(&e))?;
        let freeze: Function = self
            .lua
            .registry_value(&self.freeze)
            .map_err(|e| self.classify(&e))?;
        let frozen: Value = freeze.call(state).map_err(|e| self.classify(&e))?;

        let run_fn: Function = self
            .lua
            .globals()
            .get("run")
            .map_err(|_| RunFailure::Script("run is not defined".to_string()))?;

        self.arm_interrupt();
        let result = run_fn.call::<()>(frozen);
        self.lua.remove_hook();

        result.map_err(|e| self.classify(&e))
    }

    /// Arm the cooperative interrupt for the configured budget. A zero
    /// budget disables the interrupt.
    fn arm_interrupt(&self) {
        if self.tick_timeout.is_zero() {
            return;
        }
        let start = Instant::now();
        let budget = self.tick_timeout;
        let flag = Rc::clone(&self.timed_out);
        self.lua.set_hook(
            HookTriggers::new().every_nth_instruction(HOOK_INSTRUCTION_INTERVAL),
            move |_lua, _debug| {
                if start.elapsed() >= budget {
                    flag.set(true);
                    return Err(mlua::Error::RuntimeError(
                        "tick budget exceeded".to_string(),
                    ));
                }
                Ok(VmState::Continue)
            },
        );
    }

    fn classify(&self, error: &mlua::Error) -> RunFailure {
        if self.timed_out.get() {
            return RunFailure::Timeout;
        }
        if matches!(error, mlua::Error::MemoryError(_)) {
            return RunFailure::Memory;
        }
        let message = error.to_string();
        if message.contains("stack overflow") {
            RunFailure::StackOverflow
        } else {
            RunFailure::Script(message)
        }
    }

    /// Install the capability table into the interpreter globals.
    fn install_capabilities(&self, config: &Config) -> mlua::Result<()> {
        let globals = self.lua.globals();
        let player = self.player;
        let cfg = *config;

        // move(n)
        let scratch = Rc::clone(&self.scratch);
        let move_fn = self.lua.create_function(move |_, args: MultiValue| {
            let args: Vec<Value> = args.into_iter().collect();
            let mut s = scratch.borrow_mut();
            if s.move_used {
                s.warn(player, "move", &args, "called multiple times in one tick");
                return Ok(());
            }
            s.move_used = true;

            if args.is_empty() {
                s.warn(player, "move", &args, "missing argument");
                return Ok(());
            }

            let distance = number_arg(&args[0]) as i64;
            if distance == 0 {
                return Ok(());
            }
            let magnitude = distance
                .unsigned_abs()
                .clamp(cfg.robot.min_move as u64, cfg.robot.max_move as u64)
                as i64;
            let distance = if distance > 0 { magnitude } else { -magnitude };
            s.intents.push(Intent::Move(distance));
            Ok(())
        })?;
        globals.set("move", move_fn)?;

        // turn(degrees)
        let scratch = Rc::clone(&self.scratch);
        let turn_fn = self.lua.create_function(move |_, args: MultiValue| {
            let args: Vec<Value> = args.into_iter().collect();
            let mut s = scratch.borrow_mut();
            if s.turn_used {
                s.warn(player, "turn", &args, "called multiple times in one tick");
                return Ok(());
            }
            s.turn_used = true;

            if args.is_empty() {
                s.warn(player, "turn", &args, "missing argument");
                return Ok(());
            }

            // The raw offset passes through; normalization happens in
            // the simulator.
            let degrees = number_arg(&args[0]) as i64;
            if degrees == 0 {
                return Ok(());
            }
            s.intents.push(Intent::Turn(degrees));
            Ok(())
        })?;
        globals.set("turn", turn_fn)?;

        // fire(distance)
        let scratch = Rc::clone(&self.scratch);
        let fire_fn = self.lua.create_function(move |_, args: MultiValue| {
            let args: Vec<Value> = args.into_iter().collect();
            let mut s = scratch.borrow_mut();
            if s.fire_used {
                s.warn(player, "fire", &args, "called multiple times in one tick");
                return Ok(());
            }
            s.fire_used = true;

            if args.is_empty() {
                s.warn(player, "fire", &args, "missing argument");
                return Ok(());
            }

            let mut distance = number_arg(&args[0]) as i64;
            if distance < 0 {
                distance = 0;
            }
            if distance == 0 {
                return Ok(());
            }
            if distance > cfg.projectile.max_flying_distance {
                distance = cfg.projectile.max_flying_distance;
            }
            s.intents.push(Intent::Fire(distance));
            Ok(())
        })?;
        globals.set("fire", fire_fn)?;

        // scan(angle, resolution)
        let scratch = Rc::clone(&self.scratch);
        let scan_fn = self.lua.create_function(move |lua, args: MultiValue| {
            let args: Vec<Value> = args.into_iter().collect();
            let mut s = scratch.borrow_mut();
            if args.len() < 2 {
                s.warn(player, "scan", &args, "missing argument");
                return lua.to_value(&Vec::<game::Detection>::new());
            }

            let Some(snapshot) = s.snapshot.as_ref() else {
                return lua.to_value(&Vec::<game::Detection>::new());
            };

            let angle = number_arg(&args[0]) as i64;
            let resolution = number_arg(&args[1]) as i64;
            let hits = game::scan(snapshot, &cfg, player, angle, resolution);
            lua.to_value(&hits)
        })?;
        globals.set("scan", scan_fn)?;

        // position()
        let scratch = Rc::clone(&self.scratch);
        let position_fn = self.lua.create_function(move |lua, _: MultiValue| {
            let s = scratch.borrow();
            match s.snapshot.as_ref().and_then(|v| v.player(player)) {
                Some(p) => {
                    let table = lua.create_table()?;
                    table.set("x", p.x)?;
                    table.set("y", p.y)?;
                    Ok(Value::Table(table))
                }
                None => Ok(Value::Nil),
            }
        })?;
        globals.set("position", position_fn)?;

        // heading()
        let scratch = Rc::clone(&self.scratch);
        let heading_fn = self.lua.create_function(move |_, _: MultiValue| {
            let s = scratch.borrow();
            let heading = s
                .snapshot
                .as_ref()
                .and_then(|v| v.player(player))
                .map_or(0, |p| p.heading as i64);
            Ok(heading)
        })?;
        globals.set("heading", heading_fn)?;

        // hp()
        let scratch = Rc::clone(&self.scratch);
        let hp_fn = self.lua.create_function(move |_, _: MultiValue| {
            let s = scratch.borrow();
            let hp = s
                .snapshot
                .as_ref()
                .and_then(|v| v.player(player))
                .map_or(0, |p| p.hp);
            Ok(hp)
        })?;
        globals.set("hp", hp_fn)?;

        // ammo()
        let scratch = Rc::clone(&self.scratch);
        let ammo_fn = self.lua.create_function(move |_, _: MultiValue| {
            let s = scratch.borrow();
            let ammo = s
                .snapshot
                .as_ref()
                .and_then(|v| v.player(player))
                .map_or(0, |p| p.ammo);
            Ok(ammo)
        })?;
        globals.set("ammo", ammo_fn)?;

        // max_hp() / max_ammo()
        let max_hp_fn = self
            .lua
            .create_function(move |_, _: MultiValue| Ok(cfg.robot.max_hp))?;
        globals.set("max_hp", max_hp_fn)?;
        let max_ammo_fn = self
            .lua
            .create_function(move |_, _: MultiValue| Ok(cfg.robot.max_ammo))?;
        globals.set("max_ammo", max_ammo_fn)?;

        // log(...) writes to the diagnostic channel, never to events.
        // print is aliased to it so stray prints cannot corrupt the
        // event stream on stdout.
        let log_fn = self.lua.create_function(move |_, args: MultiValue| {
            let line = args
                .into_iter()
                .map(|v| format_arg(&v))
                .collect::<Vec<_>>()
                .join(" ");
            log::info!(target: "bot", "player {player}: {line}");
            Ok(())
        })?;
        globals.set("log", log_fn.clone())?;
        globals.set("print", log_fn)?;

        Ok(())
    }
}

/// Coerce a Lua value to a number the way the capability API promises:
/// numbers pass through, numeric strings parse, everything else is 0.
fn number_arg(value: &Value) -> f64 {
    match value {
        Value::Integer(i) => *i as f64,
        Value::Number(n) => *n,
        Value::String(s) => s
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Render a raw argument for a warning record.
fn format_arg(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_string(),
        Value::Boolean(b) => b.to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.to_string_lossy().to_string(),
        other => other.type_name().to_string(),
    }
}

// ABOUTME: Engine configuration: resource limits, function families, host hooks

use crate::engine::Engine;
use crate::value::Value;
use clap::Parser;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

pub const VERSION: &str = "0.1.0";
pub const WELCOME_MESSAGE: &str = "wisp interpreter";
pub const WELCOME_SUBTITLE: &str = "an embeddable expression and indented-script interpreter";

pub const DEFAULT_SPACES_PER_INDENT: usize = 2;
pub const DEFAULT_MAX_LINES: u64 = 10_000_000;
pub const DEFAULT_MAX_MICROS: u64 = 10_000_000;

/// Host callback invoked for bare-identifier reads/writes/existence checks,
/// per §6.1's `variablefn`: `(op, name, value, arg, engine) -> Value?`. The
/// trailing `engine` lets the hook read constants or re-invoke evaluation
/// rather than being limited to the four value arguments.
pub type VariableFn = Rc<dyn Fn(&str, &str, Option<&Value>, Option<&Value>, &Engine) -> Option<Value>>;

/// Host callback replacing built-in binary-op semantics for one operator.
/// Returning `None` is the "not handled, fall through to the built-in"
/// sentinel (§6.1, §9). `(l, op, r, arg, engine)` per §6.1.
pub type OverloadFn = Rc<dyn Fn(&Value, &str, &Value, Option<&Value>, &Engine) -> Option<Value>>;

/// Runtime configuration for one [`Engine`](crate::Engine) instance:
/// resource limits, function-family toggles, and host hook callbacks,
/// built with a builder-with-`Default` convention.
#[derive(Clone)]
pub struct EngineConfig {
    pub spaces_per_indent: usize,
    pub max_lines: u64,
    pub max_micros: u64,
    pub enable_math_fns: bool,
    pub enable_time_fns: bool,
    pub enable_string_fns: bool,
    pub enable_misc_fns: bool,
    pub disabled_fns: Vec<String>,
    pub variable_fn: Option<VariableFn>,
    pub variable_fn_arg: Option<Value>,
    pub overload_fns: HashMap<String, OverloadFn>,
    pub overload_fn_args: HashMap<String, Value>,
    /// Cooperative stop flag the host can clone out and flip from outside
    /// `Script::run` (§4.10).
    pub stop_script: Rc<Cell<bool>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            spaces_per_indent: DEFAULT_SPACES_PER_INDENT,
            max_lines: DEFAULT_MAX_LINES,
            max_micros: DEFAULT_MAX_MICROS,
            enable_math_fns: true,
            enable_time_fns: true,
            enable_string_fns: true,
            enable_misc_fns: true,
            disabled_fns: Vec::new(),
            variable_fn: None,
            variable_fn_arg: None,
            overload_fns: HashMap::new(),
            overload_fn_args: HashMap::new(),
            stop_script: Rc::new(Cell::new(false)),
        }
    }
}

impl EngineConfig {
    pub fn with_spaces_per_indent(mut self, spaces: usize) -> Self {
        self.spaces_per_indent = spaces;
        self
    }

    pub fn with_max_lines(mut self, max_lines: u64) -> Self {
        self.max_lines = max_lines;
        self
    }

    pub fn with_max_micros(mut self, max_micros: u64) -> Self {
        self.max_micros = max_micros;
        self
    }

    pub fn with_variable_fn(mut self, f: VariableFn) -> Self {
        self.variable_fn = Some(f);
        self
    }

    pub fn register_overload(&mut self, op: impl Into<String>, f: OverloadFn) {
        self.overload_fns.insert(op.into(), f);
    }

    pub fn disable(&mut self, name: impl Into<String>) {
        self.disabled_fns.push(name.into());
    }
}

/// Ambient command-line surface for the `wisp-repl` binary: either run a
/// script file, or fall into an interactive REPL when no path is given.
#[derive(Parser, Debug)]
#[command(name = "wisp-repl", version = VERSION, about = WELCOME_SUBTITLE)]
pub struct CliArgs {
    /// Path to a script file to run; omit to start an interactive REPL.
    pub script: Option<String>,

    #[arg(long, default_value_t = DEFAULT_MAX_LINES)]
    pub max_lines: u64,

    #[arg(long, default_value_t = DEFAULT_MAX_MICROS)]
    pub max_micros: u64,

    #[arg(long, default_value_t = DEFAULT_SPACES_PER_INDENT)]
    pub spaces: usize,

    #[arg(long)]
    pub no_math_fns: bool,

    #[arg(long)]
    pub no_time_fns: bool,

    #[arg(long)]
    pub no_string_fns: bool,

    #[arg(long)]
    pub no_misc_fns: bool,
}

impl From<&CliArgs> for EngineConfig {
    fn from(args: &CliArgs) -> Self {
        EngineConfig {
            spaces_per_indent: args.spaces,
            max_lines: args.max_lines,
            max_micros: args.max_micros,
            enable_math_fns: !args.no_math_fns,
            enable_time_fns: !args.no_time_fns,
            enable_string_fns: !args.no_string_fns,
            enable_misc_fns: !args.no_misc_fns,
            ..EngineConfig::default()
        }
    }
}

// ABOUTME: Public entry point (§0, §10): owns the registry and configuration
// one embedding instance needs, and evaluates bare expressions directly.

use crate::builtins;
use crate::config::EngineConfig;
use crate::expr::parser::eval_source;
use crate::registry::Registry;
use crate::scope::TopLevelScope;
use crate::value::Value;

/// One embeddable interpreter instance. Not `Sync` — it holds `Rc`-rooted
/// state throughout (`Registry`, `EngineConfig`'s callback fields), so a
/// host runs one `Engine` per thread rather than sharing one across
/// threads.
pub struct Engine {
    registry: Registry,
    config: EngineConfig,
    top_scope: TopLevelScope,
}

impl Engine {
    /// Builds a fresh engine and registers every enabled built-in function
    /// family (`builtins::register_all`) plus the `PI`/`e`/`true`/`false`
    /// constants.
    pub fn new(config: EngineConfig) -> Engine {
        let registry = Registry::new();
        builtins::register_all(&registry, &config);
        Engine {
            registry,
            config,
            top_scope: TopLevelScope::new(),
        }
    }

    /// Evaluates `src` as a bare expression (§4.2) against this engine's
    /// top-level variable scope, e.g. for calculator-style one-off use
    /// without a `Script`. Variables written here persist across calls on
    /// the same `Engine`, the same way a script's top-level frame would.
    pub fn eval(&self, src: &str) -> Value {
        eval_source(src, self, &self.top_scope)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    #[test]
    fn bare_expression_evaluates_with_builtins_available() {
        let engine = Engine::default();
        assert_eq!(engine.eval("abs(-3)"), Value::Number(3.0));
    }

    #[test]
    fn top_level_scope_persists_across_calls() {
        let engine = Engine::default();
        engine.eval("a = 5");
        assert_eq!(engine.eval("a + 1"), Value::Number(6.0));
    }

    #[test]
    fn engine_drives_a_script_through_itself() {
        let engine = Engine::default();
        let script = Script::load(engine.config(), "return sqrt(16)").expect("loads");
        let result = script.run(&engine).expect("runs");
        assert_eq!(result, Value::Number(4.0));
    }

    #[test]
    fn constants_are_available_without_enabling_any_function_family() {
        let config = EngineConfig {
            enable_math_fns: false,
            enable_string_fns: false,
            enable_time_fns: false,
            enable_misc_fns: false,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config);
        assert_eq!(engine.eval("PI > 3"), Value::Number(1.0));
        assert!(engine.eval("sqrt(4)").is_error());
    }
}

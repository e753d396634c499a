// ABOUTME: Out-of-core built-in function families (§1, §6.1, §11): registered
// through the same public function-registration interface as a host would use.

pub mod math;
pub mod misc;
pub mod strings;
pub mod time;

use crate::config::EngineConfig;
use crate::registry::Registry;

/// Registers every function family `config` has enabled, then removes any
/// name listed in `config.disabled_fns` (§6.1's `disabledfns`, applied
/// after registration so it works uniformly across families).
pub fn register_all(registry: &Registry, config: &EngineConfig) {
    registry.define_constant("PI", crate::value::Value::Number(std::f64::consts::PI));
    registry.define_constant("e", crate::value::Value::Number(std::f64::consts::E));
    // §9 open question: the source defines both `true` and `false` as `1`
    // (a documented bug). This crate implements the redesign-flagged
    // correction instead (DESIGN.md, "Open Question decisions" #1).
    registry.define_constant("true", crate::value::Value::Number(1.0));
    registry.define_constant("false", crate::value::Value::Number(0.0));

    if config.enable_math_fns {
        math::register(registry);
    }
    if config.enable_string_fns {
        strings::register(registry);
    }
    if config.enable_time_fns {
        time::register(registry);
    }
    if config.enable_misc_fns {
        misc::register(registry);
    }
    for name in &config.disabled_fns {
        registry.disable_function(name);
    }
}

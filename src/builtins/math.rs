//! Math helper functions (`enablemathsfns`, §6.1, §11).
//!
//! Registered as ordinary functions through the same `Registry` a host uses
//! for its own callbacks; nothing here is special-cased by the core
//! evaluator. Out of core scope per spec §1 — these exist so worked
//! examples like `sin(PI/4)` and `min(10,11,12*4,-4-7,15)` (§8) have
//! something real to call.

use crate::engine::Engine;
use crate::error::EvalError;
use crate::registry::Registry;
use crate::value::Value;
use std::rc::Rc;

/// `abs(n)` — absolute value.
fn builtin_abs(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().abs()))
}

/// `min(a, b, ...)` — smallest of at least one argument.
///
/// ```text
/// min(10,11,12*4,-4-7,15) => -11
/// ```
fn builtin_min(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let m = args.iter().map(Value::as_f64).fold(f64::INFINITY, f64::min);
    Ok(Value::Number(m))
}

/// `max(a, b, ...)` — largest of at least one argument.
fn builtin_max(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let m = args.iter().map(Value::as_f64).fold(f64::NEG_INFINITY, f64::max);
    Ok(Value::Number(m))
}

fn builtin_sin(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().sin()))
}

fn builtin_cos(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().cos()))
}

fn builtin_tan(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().tan()))
}

fn builtin_sqrt(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let n = args[0].as_f64();
    if n < 0.0 {
        return Err(EvalError::invalid_argument("sqrt", "argument must be non-negative"));
    }
    Ok(Value::Number(n.sqrt()))
}

fn builtin_pow(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().powf(args[1].as_f64())))
}

fn builtin_floor(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().floor()))
}

fn builtin_ceil(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().ceil()))
}

fn builtin_round(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::Number(args[0].as_f64().round()))
}

pub fn register(registry: &Registry) {
    registry.register_function("abs", 1, 1, Rc::new(builtin_abs)).expect("abs is a valid name");
    registry.register_function("min", 1, usize::MAX, Rc::new(builtin_min)).expect("min is a valid name");
    registry.register_function("max", 1, usize::MAX, Rc::new(builtin_max)).expect("max is a valid name");
    registry.register_function("sin", 1, 1, Rc::new(builtin_sin)).expect("sin is a valid name");
    registry.register_function("cos", 1, 1, Rc::new(builtin_cos)).expect("cos is a valid name");
    registry.register_function("tan", 1, 1, Rc::new(builtin_tan)).expect("tan is a valid name");
    registry.register_function("sqrt", 1, 1, Rc::new(builtin_sqrt)).expect("sqrt is a valid name");
    registry.register_function("pow", 2, 2, Rc::new(builtin_pow)).expect("pow is a valid name");
    registry.register_function("floor", 1, 1, Rc::new(builtin_floor)).expect("floor is a valid name");
    registry.register_function("ceil", 1, 1, Rc::new(builtin_ceil)).expect("ceil is a valid name");
    registry.register_function("round", 1, 1, Rc::new(builtin_round)).expect("round is a valid name");
}

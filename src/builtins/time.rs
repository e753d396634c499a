//! Time helper functions (`enabletimefns`, §6.1, §11).
//!
//! Uses `chrono` for calendar/format handling the way the rest of the
//! corpus reaches for it rather than hand-rolling Gregorian arithmetic.

use crate::engine::Engine;
use crate::error::EvalError;
use crate::registry::Registry;
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// `now()` — current Unix timestamp in seconds, as a `number`.
fn builtin_now(_args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(Value::Number(secs))
}

/// `format_time(ts, fmt)` — formats a Unix timestamp via `chrono`'s strftime
/// syntax, e.g. `format_time(now(), "%Y-%m-%d")`.
fn builtin_format_time(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let ts = args[0].as_f64();
    let fmt = match &args[1] {
        Value::String(s) => s.clone(),
        other => return Err(EvalError::invalid_argument("format_time", format!("expected string format, got {}", other.tag()))),
    };
    let dt: DateTime<Utc> = DateTime::from_timestamp(ts.trunc() as i64, 0)
        .ok_or_else(|| EvalError::invalid_argument("format_time", "timestamp out of range"))?;
    Ok(Value::String(dt.format(&fmt).to_string()))
}

pub fn register(registry: &Registry) {
    registry.register_function("now", 0, 0, Rc::new(builtin_now)).expect("now is a valid name");
    registry
        .register_function("format_time", 2, 2, Rc::new(builtin_format_time))
        .expect("format_time is a valid name");
}

//! Miscellaneous helper functions (`enablemiscfns`, §6.1, §11).

use crate::engine::Engine;
use crate::error::EvalError;
use crate::registry::Registry;
use crate::value::{DataValue, Value};
use std::rc::Rc;

/// `typeof(v)` — the tag name as a `string` (§3.1's eight tags).
fn builtin_typeof(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::String(args[0].tag().to_string()))
}

/// `caseof(value, case1, result1, case2, result2, ..., default?)` — the
/// first `case` equal to `value` wins; a trailing unpaired argument is the
/// default returned when nothing matches, otherwise no match yields `0`.
fn builtin_caseof(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let value = &args[0];
    let rest = &args[1..];
    let mut pairs = rest.chunks_exact(2);
    for pair in pairs.by_ref() {
        if &pair[0] == value {
            return Ok(pair[1].clone());
        }
    }
    if let [default] = pairs.remainder() {
        Ok(default.clone())
    } else {
        Ok(Value::Number(0.0))
    }
}

/// `chart(kind, payload_json)` — wraps a host-display hint as an opaque
/// `data` value (§3.1's `data` tag); `chart`/`table` differ only in the
/// `kind` string a host-side renderer dispatches on.
fn wrap_data(kind: &str, args: &[Value]) -> Result<Value, EvalError> {
    let payload = match &args[0] {
        Value::String(s) => serde_json::from_str(s)
            .map_err(|e| EvalError::invalid_argument(kind, format!("payload is not valid JSON: {e}")))?,
        other => return Err(EvalError::invalid_argument(kind, format!("expected a JSON string payload, got {}", other.tag()))),
    };
    Ok(Value::Data(Rc::new(DataValue {
        kind: kind.to_string(),
        payload,
    })))
}

fn builtin_chart(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    wrap_data("chart", args)
}

fn builtin_table(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    wrap_data("table", args)
}

pub fn register(registry: &Registry) {
    registry.register_function("typeof", 1, 1, Rc::new(builtin_typeof)).expect("typeof is a valid name");
    registry
        .register_function("caseof", 1, usize::MAX, Rc::new(builtin_caseof))
        .expect("caseof is a valid name");
    registry.register_function("chart", 1, 1, Rc::new(builtin_chart)).expect("chart is a valid name");
    registry.register_function("table", 1, 1, Rc::new(builtin_table)).expect("table is a valid name");
}

//! String helper functions (`enablestringfns`, §6.1, §11).

use crate::engine::Engine;
use crate::error::EvalError;
use crate::registry::Registry;
use crate::value::Value;
use std::rc::Rc;

fn as_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `substr(s, start, len?)` — zero-indexed substring; `len` omitted means
/// "to the end". Negative/out-of-range bounds clamp rather than error,
/// matching the forgiving style of the rest of the string family.
fn builtin_substr(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let s: Vec<char> = as_string(&args[0]).chars().collect();
    let start = args[1].as_i64().max(0) as usize;
    let start = start.min(s.len());
    let end = if args.len() > 2 {
        let len = args[2].as_i64().max(0) as usize;
        (start + len).min(s.len())
    } else {
        s.len()
    };
    Ok(Value::String(s[start..end].iter().collect()))
}

/// `strlen(v)` / `length(v)` — character count for a string, key count for
/// a dict, element count for an array. `object` has no defined length
/// (Open Question decision, DESIGN.md).
fn builtin_strlen(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let n = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Dict(map) => map.len(),
        Value::Object(_) => {
            return Err(EvalError::invalid_argument("strlen", "object has no defined length"))
        }
        other => as_string(other).chars().count(),
    };
    Ok(Value::Number(n as f64))
}

/// `replace(s, from, to)` — replaces every non-overlapping occurrence of
/// `from` with `to`, always returning a `string` (Open Question decision:
/// the source returns a bare Python `str`, so this stays `Value::String`
/// even if `to` looks numeric).
fn builtin_replace(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let s = as_string(&args[0]);
    let from = as_string(&args[1]);
    let to = as_string(&args[2]);
    if from.is_empty() {
        return Err(EvalError::invalid_argument("replace", "search string must not be empty"));
    }
    Ok(Value::String(s.replace(&from, &to)))
}

fn builtin_upper(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::String(as_string(&args[0]).to_uppercase()))
}

fn builtin_lower(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::String(as_string(&args[0]).to_lowercase()))
}

fn builtin_trim(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    Ok(Value::String(as_string(&args[0]).trim().to_string()))
}

/// `split(s, sep)` — splits on a literal separator, returning an `array` of
/// `string`.
fn builtin_split(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let s = as_string(&args[0]);
    let sep = as_string(&args[1]);
    let parts = if sep.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(sep.as_str()).map(|p| Value::String(p.to_string())).collect()
    };
    Ok(Value::Array(parts))
}

/// `join(arr, sep)` — the inverse of `split`, coercing non-string elements
/// via `Display` the same way string concatenation does.
fn builtin_join(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let items = match &args[0] {
        Value::Array(items) => items,
        other => return Err(EvalError::invalid_argument("join", format!("expected array, got {}", other.tag()))),
    };
    let sep = as_string(&args[1]);
    let joined = items.iter().map(as_string).collect::<Vec<_>>().join(&sep);
    Ok(Value::String(joined))
}

/// `sprintf(fmt, args...)` — a minimal `%d` / `%.Nf` / `%s` formatter
/// (§8's `sprintf("%.2f", 5/3) => "1.67"`). Unsupported conversions and
/// arity mismatches both surface as `InvalidArgument` rather than
/// panicking on a malformed format string.
fn builtin_sprintf(args: &[Value], _engine: &Engine) -> Result<Value, EvalError> {
    let fmt = as_string(&args[0]);
    let values = &args[1..];
    let mut out = String::new();
    let mut arg_idx = 0;
    let mut chars = fmt.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('%') => {
                chars.next();
                out.push('%');
                continue;
            }
            _ => {}
        }
        let mut precision: Option<usize> = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut digits = String::new();
            while let Some(d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(*d);
                    chars.next();
                } else {
                    break;
                }
            }
            precision = digits.parse().ok();
        }
        let conv = chars.next().ok_or_else(|| {
            EvalError::invalid_argument("sprintf", "dangling '%' at end of format string")
        })?;
        let arg = values.get(arg_idx).ok_or_else(|| {
            EvalError::invalid_argument("sprintf", "not enough arguments for format string")
        })?;
        arg_idx += 1;
        match conv {
            'd' => out.push_str(&format!("{}", arg.as_i64())),
            'f' => out.push_str(&format!("{:.*}", precision.unwrap_or(6), arg.as_f64())),
            's' => out.push_str(&as_string(arg)),
            other => {
                return Err(EvalError::invalid_argument(
                    "sprintf",
                    format!("unsupported conversion: %{other}"),
                ))
            }
        }
    }
    Ok(Value::String(out))
}

pub fn register(registry: &Registry) {
    registry.register_function("substr", 2, 3, Rc::new(builtin_substr)).expect("substr is a valid name");
    registry.register_function("strlen", 1, 1, Rc::new(builtin_strlen)).expect("strlen is a valid name");
    registry.register_function("length", 1, 1, Rc::new(builtin_strlen)).expect("length is a valid name");
    registry.register_function("replace", 3, 3, Rc::new(builtin_replace)).expect("replace is a valid name");
    registry.register_function("upper", 1, 1, Rc::new(builtin_upper)).expect("upper is a valid name");
    registry.register_function("lower", 1, 1, Rc::new(builtin_lower)).expect("lower is a valid name");
    registry.register_function("trim", 1, 1, Rc::new(builtin_trim)).expect("trim is a valid name");
    registry.register_function("split", 2, 2, Rc::new(builtin_split)).expect("split is a valid name");
    registry.register_function("join", 2, 2, Rc::new(builtin_join)).expect("join is a valid name");
    registry
        .register_function("sprintf", 1, usize::MAX, Rc::new(builtin_sprintf))
        .expect("sprintf is a valid name");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Registry {
        let r = Registry::new();
        register(&r);
        r
    }

    fn engine() -> Engine {
        Engine::default()
    }

    #[test]
    fn substr_extracts_middle_range() {
        let r = registry();
        let f = r.function("substr").unwrap();
        let v = (f.f)(&[Value::String("--String--".into()), Value::Number(2.0), Value::Number(6.0)], &engine()).unwrap();
        assert_eq!(v, Value::String("String".into()));
    }

    #[test]
    fn substr_without_length_runs_to_the_end() {
        let r = registry();
        let f = r.function("substr").unwrap();
        let v = (f.f)(&[Value::String("hello".into()), Value::Number(2.0)], &engine()).unwrap();
        assert_eq!(v, Value::String("llo".into()));
    }

    #[test]
    fn substr_clamps_out_of_range_bounds() {
        let r = registry();
        let f = r.function("substr").unwrap();
        let v = (f.f)(&[Value::String("hi".into()), Value::Number(0.0), Value::Number(99.0)], &engine()).unwrap();
        assert_eq!(v, Value::String("hi".into()));
    }

    #[test]
    fn replace_always_returns_string_tag() {
        let r = registry();
        let f = r.function("replace").unwrap();
        let v = (f.f)(
            &[
                Value::String("a1a".into()),
                Value::String("a".into()),
                Value::String("9".into()),
            ],
            &engine(),
        )
        .unwrap();
        assert_eq!(v, Value::String("919".into()));
        assert_eq!(v.tag(), "string");
    }

    #[test]
    fn strlen_on_object_is_invalid_argument() {
        struct Empty;
        impl crate::value::HostObject for Empty {
            fn get_property(&self, _: &str) -> Option<Value> {
                None
            }
            fn object_id(&self) -> usize {
                1
            }
        }
        let r = registry();
        let f = r.function("strlen").unwrap();
        let obj = Value::Object(Rc::new(Empty));
        assert!((f.f)(&[obj], &engine()).is_err());
    }

    #[test]
    fn sprintf_formats_float_with_precision() {
        let r = registry();
        let f = r.function("sprintf").unwrap();
        let v = (f.f)(&[Value::String("%.2f".into()), Value::Number(5.0 / 3.0)], &engine()).unwrap();
        assert_eq!(v, Value::String("1.67".into()));
    }

    #[test]
    fn split_and_join_round_trip() {
        let r = registry();
        let e = engine();
        let split = r.function("split").unwrap();
        let join = r.function("join").unwrap();
        let parts = (split.f)(&[Value::String("a,b,c".into()), Value::String(",".into())], &e).unwrap();
        let back = (join.f)(&[parts, Value::String(",".into())], &e).unwrap();
        assert_eq!(back, Value::String("a,b,c".into()));
    }
}

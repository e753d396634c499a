// ABOUTME: Binary-operator dispatch, comparisons, and the range generator (component E)

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EvalError;
use crate::value::{round10, Value, INFINITY_SENTINEL};
use indexmap::IndexMap;

fn bool_num(b: bool) -> Value {
    Value::Number(if b { 1.0 } else { 0.0 })
}

fn divide(l: f64, r: f64) -> Value {
    if r == 0.0 {
        if l == 0.0 {
            Value::Number(0.0)
        } else if l.is_sign_negative() {
            Value::Number(-INFINITY_SENTINEL)
        } else {
            Value::Number(INFINITY_SENTINEL)
        }
    } else {
        Value::Number(l / r)
    }
}

/// String comparison is lexicographic by byte order when both operands are
/// strings (decision in SPEC_FULL.md / DESIGN.md, §9 open question);
/// otherwise both operands convert to `f64` first.
fn compare(op: &str, l: &Value, r: &Value) -> Value {
    let result = if let (Value::String(a), Value::String(b)) = (l, r) {
        match op {
            "==" => a == b,
            "!=" => a != b,
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            ">=" => a >= b,
            _ => unreachable!("compare called with non-comparison op {op}"),
        }
    } else {
        let a = l.as_f64();
        let b = r.as_f64();
        match op {
            "==" => round10(a) == round10(b),
            "!=" => round10(a) != round10(b),
            "<" => a < b,
            "<=" => a <= b,
            ">" => a > b,
            ">=" => a >= b,
            _ => unreachable!("compare called with non-comparison op {op}"),
        }
    };
    bool_num(result)
}

/// Binary-op dispatch (§4.5). Dispatch order:
/// 1. host overload hook for this operator
/// 2. `===`/`!==` structural/identity equality (extended to array/dict,
///    decision in DESIGN.md)
/// 3. `+` on two strings -> concatenation
/// 4. either operand outside `{number,string}` -> `number 0`
/// 5. numeric/string semantics per operator
pub fn apply_binop(op: &str, l: &Value, r: &Value, cfg: &EngineConfig, engine: &Engine) -> Value {
    if let Some(f) = cfg.overload_fns.get(op) {
        if let Some(v) = f(l, op, r, cfg.overload_fn_args.get(op), engine) {
            return v;
        }
    }

    if op == "===" || op == "!==" {
        let eq = l == r;
        return bool_num(eq == (op == "==="));
    }

    if op == "+" {
        if let (Value::String(a), Value::String(b)) = (l, r) {
            return Value::String(format!("{a}{b}"));
        }
    }

    let l_ok = matches!(l, Value::Number(_) | Value::String(_));
    let r_ok = matches!(r, Value::Number(_) | Value::String(_));
    if !l_ok || !r_ok {
        return Value::Number(0.0);
    }

    match op {
        "==" | "!=" | "<" | "<=" | ">" | ">=" => compare(op, l, r),
        "&&" => bool_num(l.as_i64() != 0 && r.as_i64() != 0),
        "||" => bool_num(l.as_i64() != 0 || r.as_i64() != 0),
        "|" => Value::Number((l.as_i64() | r.as_i64()) as f64),
        "&" => Value::Number((l.as_i64() & r.as_i64()) as f64),
        "^" => Value::Number((l.as_i64() ^ r.as_i64()) as f64),
        "+" => Value::Number(l.as_f64() + r.as_f64()),
        "-" => Value::Number(l.as_f64() - r.as_f64()),
        "*" => Value::Number(l.as_f64() * r.as_f64()),
        "/" => divide(l.as_f64(), r.as_f64()),
        "%" => {
            let rn = r.as_f64();
            if rn == 0.0 {
                Value::Number(0.0)
            } else {
                Value::Number(l.as_f64() % rn)
            }
        }
        _ => Value::Number(0.0),
    }
}

/// `a:b` range construction (§3.1, §4.5): both sides must be integral with
/// `a <= b`; produces an inclusive array of sequential integers.
pub fn make_range(l: &Value, r: &Value) -> Result<Value, EvalError> {
    let a = l.as_f64();
    let b = r.as_f64();
    if a.fract() != 0.0 || b.fract() != 0.0 {
        return Err(EvalError::invalid_argument(":", "range bounds must be integral"));
    }
    let (ai, bi) = (a as i64, b as i64);
    if ai > bi {
        return Err(EvalError::invalid_argument(":", "range start must not exceed end"));
    }
    Ok(Value::Array((ai..=bi).map(|n| Value::Number(n as f64)).collect()))
}

/// Array indexing (§4.3.2): out-of-range access returns an empty string
/// (documented quirk, preserved).
pub fn index_array(items: &[Value], idx: i64) -> Value {
    if idx < 0 {
        return Value::String(String::new());
    }
    items.get(idx as usize).cloned().unwrap_or_else(|| Value::String(String::new()))
}

/// Dict keyed access (§4.3.2): a missing key is `ErrKey` (code 16).
pub fn dict_get(dict: &IndexMap<String, Value>, key: &str) -> Result<Value, EvalError> {
    dict.get(key).cloned().ok_or_else(|| EvalError::KeyNotInDict(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn engine() -> Engine {
        Engine::default()
    }

    #[test]
    fn string_concatenation() {
        let v = apply_binop("+", &Value::String("ab".into()), &Value::String("cd".into()), &cfg(), &engine());
        assert_eq!(v, Value::String("abcd".into()));
    }

    #[test]
    fn mixed_string_number_coerces_number_side() {
        let v = apply_binop("+", &Value::String("x".into()), &Value::Number(1.0), &cfg(), &engine());
        assert_eq!(v, Value::Number(1.0));
    }

    #[test]
    fn division_by_zero_sentinel() {
        let e = engine();
        assert_eq!(apply_binop("/", &Value::Number(1.0), &Value::Number(0.0), &cfg(), &e), Value::Number(INFINITY_SENTINEL));
        assert_eq!(apply_binop("/", &Value::Number(-1.0), &Value::Number(0.0), &cfg(), &e), Value::Number(-INFINITY_SENTINEL));
        assert_eq!(apply_binop("/", &Value::Number(0.0), &Value::Number(0.0), &cfg(), &e), Value::Number(0.0));
    }

    #[test]
    fn range_builds_inclusive_array() {
        let v = make_range(&Value::Number(2.0), &Value::Number(5.0)).unwrap();
        assert_eq!(
            v,
            Value::Array(vec![
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(4.0),
                Value::Number(5.0)
            ])
        );
    }

    #[test]
    fn range_fails_when_start_exceeds_end() {
        assert!(make_range(&Value::Number(5.0), &Value::Number(2.0)).is_err());
    }

    #[test]
    fn array_index_out_of_range_is_empty_string() {
        let items = vec![Value::Number(1.0)];
        assert_eq!(index_array(&items, 5), Value::String(String::new()));
    }

    #[test]
    fn exact_equality_is_structural_for_arrays() {
        let a = Value::Array(vec![Value::Number(1.0)]);
        let b = Value::Array(vec![Value::Number(1.0)]);
        assert_eq!(apply_binop("===", &a, &b, &cfg(), &engine()), Value::Number(1.0));
    }

    #[test]
    fn string_comparison_is_lexicographic() {
        assert_eq!(
            apply_binop("<", &Value::String("abc".into()), &Value::String("abd".into()), &cfg(), &engine()),
            Value::Number(1.0)
        );
    }
}

// ABOUTME: Value types representing the tagged runtime values of the interpreter

use crate::engine::Engine;
use crate::error::EvalError;
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// Numeric sentinel returned in place of `±infinity` on integer division by
/// zero (sign follows the dividend). Chosen by the host-embedding contract,
/// not IEEE-754 infinity, so the value survives round-tripping through
/// `number` arithmetic and comparisons unchanged.
pub const INFINITY_SENTINEL: f64 = 2_100_776_655.0;

/// Host-registered or script-visible callable. Takes the invoking `Engine`
/// alongside its arguments (§6.1) so a host hook can read constants or
/// re-invoke evaluation rather than being limited to its argument list.
pub type BuiltinFn = Rc<dyn Fn(&[Value], &Engine) -> Result<Value, EvalError>>;

/// A callable discovered as a `function`-tagged property, or registered
/// directly in the function registry.
#[derive(Clone)]
pub struct Callable {
    pub name: String,
    pub min_arity: usize,
    pub max_arity: usize,
    pub f: BuiltinFn,
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self.name)
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.f, &other.f)
    }
}

/// A host-registered object exposing named properties, per the object
/// contract: either a fixed property table or a dynamic hook.
pub trait HostObject {
    fn get_property(&self, name: &str) -> Option<Value>;
    /// Identity used by `===`/`!==`; distinct objects never compare equal.
    fn object_id(&self) -> usize;

    /// Opt-in iterator protocol for `for NAME in obj` (§4.8: "object whose
    /// payload is iterable -> use directly"). Default `None` means the
    /// object cannot be iterated; a host overrides this to expose its own
    /// ordered element list.
    fn iter_values(&self) -> Option<Vec<Value>> {
        None
    }
}

#[derive(Clone)]
pub struct DataValue {
    pub kind: String,
    pub payload: serde_json::Value,
}

impl fmt::Debug for DataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Data({})", self.kind)
    }
}

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Dict(IndexMap<String, Value>),
    Object(Rc<dyn HostObject>),
    Function(Callable),
    Data(Rc<DataValue>),
    Error { code: i32, message: String },
}

impl Value {
    pub fn number(n: f64) -> Value {
        Value::Number(n)
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn error(code: i32, message: impl Into<String>) -> Value {
        Value::Error {
            code,
            message: message.into(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Data(_) => "data",
            Value::Error { .. } => "error",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error { .. })
    }

    /// Truthiness per §4.8: only `number` and `string` are truthy-tested;
    /// non-zero / non-empty is truthy, every other tag is false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            _ => false,
        }
    }

    /// Numeric coercion used throughout binary-op dispatch: non-numeric,
    /// non-numeric-string values fall back to `0.0` per §4.5 rule 3.
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    pub fn as_i64(&self) -> i64 {
        self.as_f64() as i64
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Dict(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Object(_) => write!(f, "#<object>"),
            Value::Function(c) => write!(f, "#<function {}>", c.name),
            Value::Data(d) => write!(f, "#<data {}>", d.kind),
            Value::Error { code, message } => write!(f, "#<error {}: {}>", code, message),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({})", n),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Array(items) => write!(f, "Array({:?})", items),
            Value::Dict(map) => write!(f, "Dict({:?})", map),
            Value::Object(o) => write!(f, "Object(#{})", o.object_id()),
            Value::Function(c) => write!(f, "{:?}", c),
            Value::Data(d) => write!(f, "{:?}", d),
            Value::Error { code, message } => {
                f.debug_struct("Error").field("code", code).field("message", message).finish()
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => round10(*a) == round10(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.object_id() == b.object_id(),
            (Value::Function(a), Value::Function(b)) => a == b,
            // `data` never compares equal across distinct handles, even to
            // itself by value — only identity, matching `object`/`function`.
            (Value::Data(a), Value::Data(b)) => Rc::ptr_eq(a, b),
            (Value::Error { code: c1, .. }, Value::Error { code: c2, .. }) => c1 == c2,
            _ => false,
        }
    }
}

pub fn round10(n: f64) -> f64 {
    (n * 1e10).round() / 1e10
}

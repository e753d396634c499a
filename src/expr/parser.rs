// ABOUTME: Precedence-climbing recursive-descent expression parser/evaluator (component D)

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::EvalError;
use crate::expr::ops::{apply_binop, dict_get, index_array, make_range};
use crate::lexer::{Cursor, IDENT_PATTERN, NUMBER_PATTERN};
use crate::registry::Registry;
use crate::scope::EvalContext;
use crate::value::{Callable, Value};
use indexmap::IndexMap;

/// One step in a dot-chain, recorded so an assignment can write back through
/// the same path a read traversed (§4.4).
#[derive(Clone, Debug, PartialEq)]
pub enum PathSegment {
    Index(i64),
    Key(String),
}

/// An assignable binding: a root variable name plus the dict/array path
/// walked to reach the current value. Object-tagged segments never produce
/// one (§4.4, DESIGN.md) — host objects aren't assignable from expressions.
#[derive(Clone, Debug, PartialEq)]
pub struct LValue {
    pub root: String,
    pub path: Vec<PathSegment>,
}

/// The result of evaluating one grammar level: the `Value` plus, when the
/// expression denotes a binding reference, the path back to it.
#[derive(Clone, Debug)]
pub struct Evaluated {
    pub value: Value,
    pub lvalue: Option<LValue>,
}

impl Evaluated {
    fn plain(value: Value) -> Self {
        Evaluated { value, lvalue: None }
    }
}

struct ExprCtx<'a> {
    registry: &'a Registry,
    config: &'a EngineConfig,
    scope: &'a dyn EvalContext,
    engine: &'a Engine,
}

/// Parses and evaluates `src` as one expression (or `;`-separated sequence
/// of expressions, §4.2), collapsing any failure into a terminal
/// `Value::Error` (§7) so callers never see a bare `Result`. `engine` is
/// handed to host hooks (`variablefn`/`overloadfn`/registered functions) so
/// they can reach back into the engine that invoked them.
pub fn eval_source(src: &str, engine: &Engine, scope: &dyn EvalContext) -> Value {
    match eval_source_inner(src, engine, scope) {
        Ok(v) => v,
        Err(e) => e.into_value(),
    }
}

fn eval_source_inner(src: &str, engine: &Engine, scope: &dyn EvalContext) -> Result<Value, EvalError> {
    let processed = preprocess(src)?;
    let ctx = ExprCtx {
        registry: engine.registry(),
        config: engine.config(),
        scope,
        engine,
    };
    let mut cursor = Cursor::new(&processed);
    let mut last = Value::Number(0.0);
    loop {
        let ev = parse_level1(&mut cursor, &ctx)?
            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "expected expression".to_string()))?;
        last = ev.value;
        if cursor.consume_char(";").is_some() {
            if cursor.at_end() {
                break;
            }
            continue;
        }
        break;
    }
    if !cursor.at_end() {
        return Err(EvalError::JunkAfterExpression(cursor.index));
    }
    Ok(last)
}

/// Elides whitespace outside double-quoted strings (§4.2). Escape
/// processing is deferred to the string-literal atom parse so quoted
/// content survives this pass verbatim; a backslash here only needs to
/// shield the character right after it from ending the quoted region.
fn preprocess(src: &str) -> Result<String, EvalError> {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
            out.push(c);
        } else if c.is_whitespace() {
            continue;
        } else {
            out.push(c);
        }
    }
    if in_string {
        return Err(EvalError::DanglingQuote);
    }
    if out.is_empty() {
        return Err(EvalError::EmptyExpression);
    }
    Ok(out)
}

// ===== Levels 1-3, 5: plain left-associative binary operators =====

type LevelFn = fn(&mut Cursor, &ExprCtx) -> Result<Option<Evaluated>, EvalError>;

fn parse_binary_level(
    cursor: &mut Cursor,
    ctx: &ExprCtx,
    ops: &[&str],
    higher: LevelFn,
) -> Result<Option<Evaluated>, EvalError> {
    let mut lhs = match higher(cursor, ctx)? {
        Some(ev) => ev,
        None => return Ok(None),
    };
    loop {
        let save = *cursor;
        let op = match ops.iter().find(|o| cursor.consume_literal(o)) {
            Some(o) => *o,
            None => break,
        };
        match higher(cursor, ctx)? {
            Some(rhs) => {
                let value = apply_binop(op, &lhs.value, &rhs.value, ctx.config, ctx.engine);
                lhs = Evaluated::plain(value);
            }
            None => {
                *cursor = save;
                break;
            }
        }
    }
    Ok(Some(lhs))
}

fn parse_level1(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    parse_binary_level(cursor, ctx, &["||"], parse_level2)
}

fn parse_level2(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    parse_binary_level(cursor, ctx, &["&&"], parse_level3)
}

fn parse_level3(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    parse_binary_level(cursor, ctx, &["|", "&", "^"], parse_level4)
}

// ===== Level 4: comparisons and assignment share one precedence tier =====

const LEVEL4_OPS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "&=", "|=", "^=", "<", ">", "=",
];

fn parse_level4(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    let mut lhs = match parse_level5(cursor, ctx)? {
        Some(ev) => ev,
        None => return Ok(None),
    };
    loop {
        let save = *cursor;
        let op = match LEVEL4_OPS.iter().find(|o| cursor.consume_literal(o)) {
            Some(o) => *o,
            None => break,
        };
        match parse_level5(cursor, ctx)? {
            Some(rhs) => {
                lhs = apply_level4_op(op, lhs, rhs, ctx)?;
            }
            None => {
                *cursor = save;
                break;
            }
        }
    }
    Ok(Some(lhs))
}

fn apply_level4_op(op: &str, lhs: Evaluated, rhs: Evaluated, ctx: &ExprCtx) -> Result<Evaluated, EvalError> {
    match op {
        "==" | "!=" | "===" | "!==" | "<" | "<=" | ">" | ">=" => {
            let value = apply_binop(op, &lhs.value, &rhs.value, ctx.config, ctx.engine);
            Ok(Evaluated::plain(value))
        }
        "=" => {
            let lvalue = lhs.lvalue.ok_or(EvalError::NotAssignable)?;
            assign(ctx, &lvalue, rhs.value.clone())?;
            Ok(Evaluated {
                value: rhs.value,
                lvalue: Some(lvalue),
            })
        }
        // compound assignment (+= -= *= /= &= |= ^=): desugars to
        // assign(L, binop(L, op, R)) per §4.4.
        _ => {
            let base_op = &op[..op.len() - 1];
            let lvalue = lhs.lvalue.ok_or(EvalError::NotAssignable)?;
            let new_value = apply_binop(base_op, &lhs.value, &rhs.value, ctx.config, ctx.engine);
            assign(ctx, &lvalue, new_value.clone())?;
            Ok(Evaluated {
                value: new_value,
                lvalue: Some(lvalue),
            })
        }
    }
}

// ===== Level 5: + - =====

fn parse_level5(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    parse_binary_level(cursor, ctx, &["+", "-"], parse_level6)
}

// ===== Level 6: * / % : (`:` builds a range and can fail) =====

fn parse_level6(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    let mut lhs = match parse_level7(cursor, ctx)? {
        Some(ev) => ev,
        None => return Ok(None),
    };
    loop {
        let save = *cursor;
        if cursor.consume_literal(":") {
            match parse_level7(cursor, ctx)? {
                Some(rhs) => {
                    let value = make_range(&lhs.value, &rhs.value)?;
                    lhs = Evaluated::plain(value);
                }
                None => {
                    *cursor = save;
                    break;
                }
            }
            continue;
        }
        let op = match ["*", "/", "%"].iter().find(|o| cursor.consume_literal(o)) {
            Some(o) => *o,
            None => break,
        };
        match parse_level7(cursor, ctx)? {
            Some(rhs) => {
                let value = apply_binop(op, &lhs.value, &rhs.value, ctx.config, ctx.engine);
                lhs = Evaluated::plain(value);
            }
            None => {
                *cursor = save;
                break;
            }
        }
    }
    Ok(Some(lhs))
}

// ===== Level 7: DOT chain — .prop, [expr], and call-on-property =====

fn parse_level7(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    let mut ev = match parse_atom(cursor, ctx)? {
        Some(ev) => ev,
        None => return Ok(None),
    };
    loop {
        match ev.value.tag() {
            "object" => {
                let save = *cursor;
                if cursor.consume_char(".").is_none() {
                    break;
                }
                let name = match cursor.consume_regex(IDENT_PATTERN) {
                    Some(n) => n.to_string(),
                    None => {
                        *cursor = save;
                        break;
                    }
                };
                ev = access_object(cursor, ctx, &ev, &name)?;
            }
            "dict" => {
                if cursor.consume_char(".").is_some() {
                    let name = cursor
                        .consume_regex(IDENT_PATTERN)
                        .ok_or_else(|| EvalError::MissingDictName(cursor.index))?
                        .to_string();
                    ev = access_dict(ev, name)?;
                } else if cursor.consume_char("[").is_some() {
                    let key_ev = parse_level1(cursor, ctx)?
                        .ok_or_else(|| EvalError::BadIndex("missing index expression".to_string()))?;
                    if cursor.consume_char("]").is_none() {
                        return Err(EvalError::BadIndex("missing closing ]".to_string()));
                    }
                    let key = dict_key_string(&key_ev.value);
                    ev = access_dict(ev, key)?;
                } else {
                    break;
                }
            }
            "array" => {
                if cursor.consume_char("[").is_some() {
                    let idx_ev = parse_level1(cursor, ctx)?
                        .ok_or_else(|| EvalError::BadIndex("missing index expression".to_string()))?;
                    let idx = idx_ev.value.as_i64();
                    if cursor.consume_char("]").is_none() {
                        return Err(EvalError::BadIndex("missing closing ]".to_string()));
                    }
                    ev = access_array(ev, idx);
                } else {
                    break;
                }
            }
            _ => break,
        }
    }
    Ok(Some(ev))
}

fn dict_key_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn access_dict(ev: Evaluated, key: String) -> Result<Evaluated, EvalError> {
    let value = match &ev.value {
        Value::Dict(map) => dict_get(map, &key)?,
        _ => unreachable!("access_dict called on non-dict"),
    };
    let lvalue = ev.lvalue.map(|mut lv| {
        lv.path.push(PathSegment::Key(key));
        lv
    });
    Ok(Evaluated { value, lvalue })
}

fn access_array(ev: Evaluated, idx: i64) -> Evaluated {
    let value = match &ev.value {
        Value::Array(items) => index_array(items, idx),
        _ => unreachable!("access_array called on non-array"),
    };
    let lvalue = ev.lvalue.map(|mut lv| {
        lv.path.push(PathSegment::Index(idx));
        lv
    });
    Evaluated { value, lvalue }
}

/// Object property/method dispatch (§4.3.2, §3.3). A function-typed
/// property followed by `(` consumes an argument list and is invoked;
/// otherwise the raw property value is returned. Object segments never
/// carry an `lvalue` — see DESIGN.md's open-question decision.
fn access_object(cursor: &mut Cursor, ctx: &ExprCtx, ev: &Evaluated, name: &str) -> Result<Evaluated, EvalError> {
    let obj = match &ev.value {
        Value::Object(o) => o.clone(),
        _ => unreachable!("access_object called on non-object"),
    };
    if cursor.peek_char() == Some('(') {
        cursor.consume_char("(");
        let args = parse_call_args(cursor, ctx)?;
        let prop = obj.get_property(name).ok_or_else(|| EvalError::InvalidObject(name.to_string()))?;
        let value = match prop {
            Value::Function(callable) => invoke_callable(&callable, &args, ctx.engine)?,
            other => other,
        };
        Ok(Evaluated::plain(value))
    } else {
        let prop = obj.get_property(name).ok_or_else(|| EvalError::InvalidObject(name.to_string()))?;
        Ok(Evaluated::plain(prop))
    }
}

// ===== Level 8: atoms =====

fn parse_atom(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    if let Some(ev) = parse_number_atom(cursor)? {
        return Ok(Some(ev));
    }
    if let Some(ev) = parse_string_atom(cursor)? {
        return Ok(Some(ev));
    }
    if let Some(ev) = parse_paren_atom(cursor, ctx)? {
        return Ok(Some(ev));
    }
    if let Some(ev) = parse_array_literal(cursor, ctx)? {
        return Ok(Some(ev));
    }
    if let Some(ev) = parse_dict_literal(cursor, ctx)? {
        return Ok(Some(ev));
    }
    if let Some(ev) = parse_ident_atom(cursor, ctx)? {
        return Ok(Some(ev));
    }
    Ok(None)
}

fn parse_number_atom(cursor: &mut Cursor) -> Result<Option<Evaluated>, EvalError> {
    match cursor.consume_regex(NUMBER_PATTERN) {
        Some(m) => {
            let n: f64 = m
                .parse()
                .map_err(|_| EvalError::ParseFailure(cursor.index, format!("invalid number literal: {m}")))?;
            Ok(Some(Evaluated::plain(Value::Number(n))))
        }
        None => Ok(None),
    }
}

/// String literal (§4.3.1): escapes `n r t b " \` and `\uXXXX` (4 hex
/// digits -> code point). Preprocessing already guarantees a matching
/// closing quote exists somewhere in the source.
fn parse_string_atom(cursor: &mut Cursor) -> Result<Option<Evaluated>, EvalError> {
    if cursor.consume_char("\"").is_none() {
        return Ok(None);
    }
    let mut s = String::new();
    loop {
        match cursor.peek_char() {
            None => return Err(EvalError::DanglingQuote),
            Some('"') => {
                cursor.bump();
                break;
            }
            Some('\\') => {
                cursor.bump();
                match cursor.peek_char() {
                    None => return Err(EvalError::DanglingBackslash),
                    Some('n') => {
                        s.push('\n');
                        cursor.bump();
                    }
                    Some('r') => {
                        s.push('\r');
                        cursor.bump();
                    }
                    Some('t') => {
                        s.push('\t');
                        cursor.bump();
                    }
                    Some('b') => {
                        s.push('\u{8}');
                        cursor.bump();
                    }
                    Some('"') => {
                        s.push('"');
                        cursor.bump();
                    }
                    Some('\\') => {
                        s.push('\\');
                        cursor.bump();
                    }
                    Some('u') => {
                        cursor.bump();
                        let hex = cursor
                            .consume_regex(r"^[0-9A-Fa-f]{4}")
                            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "invalid \\u escape".to_string()))?;
                        let code = u32::from_str_radix(hex, 16)
                            .map_err(|_| EvalError::ParseFailure(cursor.index, "invalid \\u escape".to_string()))?;
                        let c = char::from_u32(code)
                            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "invalid \\u code point".to_string()))?;
                        s.push(c);
                    }
                    Some(other) => {
                        s.push(other);
                        cursor.bump();
                    }
                }
            }
            Some(c) => {
                s.push(c);
                cursor.bump();
            }
        }
    }
    Ok(Some(Evaluated::plain(Value::String(s))))
}

fn parse_paren_atom(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    if cursor.consume_char("(").is_none() {
        return Ok(None);
    }
    let inner = parse_level1(cursor, ctx)?
        .ok_or_else(|| EvalError::ParseFailure(cursor.index, "expected expression".to_string()))?;
    if cursor.consume_char(")").is_none() {
        return Err(EvalError::ParseFailure(cursor.index, "expected )".to_string()));
    }
    Ok(Some(Evaluated::plain(inner.value)))
}

fn parse_array_literal(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    if cursor.consume_char("[").is_none() {
        return Ok(None);
    }
    let mut items = Vec::new();
    if cursor.consume_char("]").is_some() {
        return Ok(Some(Evaluated::plain(Value::Array(items))));
    }
    loop {
        let ev = parse_level1(cursor, ctx)?
            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "expected array element".to_string()))?;
        items.push(ev.value);
        if cursor.consume_char(",").is_some() {
            continue;
        }
        if cursor.consume_char("]").is_some() {
            break;
        }
        return Err(EvalError::ParseFailure(cursor.index, "expected , or ]".to_string()));
    }
    Ok(Some(Evaluated::plain(Value::Array(items))))
}

fn parse_dict_literal(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    if cursor.consume_char("{").is_none() {
        return Ok(None);
    }
    let mut map = IndexMap::new();
    if cursor.consume_char("}").is_some() {
        return Ok(Some(Evaluated::plain(Value::Dict(map))));
    }
    loop {
        let key = parse_dict_key(cursor)?;
        if cursor.consume_char(":").is_none() {
            return Err(EvalError::MissingDictColon(cursor.index));
        }
        let ev = parse_level1(cursor, ctx)?
            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "expected dict value".to_string()))?;
        map.insert(key, ev.value);
        if cursor.consume_char(",").is_some() {
            continue;
        }
        if cursor.consume_char("}").is_some() {
            break;
        }
        return Err(EvalError::ParseFailure(cursor.index, "expected , or }".to_string()));
    }
    Ok(Some(Evaluated::plain(Value::Dict(map))))
}

/// Dict key (§4.3.1): identifier, quoted string, or number.
fn parse_dict_key(cursor: &mut Cursor) -> Result<String, EvalError> {
    if let Some(name) = cursor.consume_regex(IDENT_PATTERN) {
        return Ok(name.to_string());
    }
    if let Some(num) = cursor.consume_regex(NUMBER_PATTERN) {
        return Ok(num.to_string());
    }
    if cursor.peek_char() == Some('"') {
        if let Some(ev) = parse_string_atom(cursor)? {
            if let Value::String(s) = ev.value {
                return Ok(s);
            }
        }
    }
    Err(EvalError::MissingDictName(cursor.index))
}

/// Identifier atom: a function call when immediately followed by `(`
/// (checked via `FUNCTION_START_PATTERN`, §4.1), else a variable/constant/
/// object reference resolved in the order described in §4.3.1/DESIGN.md:
/// constant, host `variablefn(read)`, host `variablefn(check)` (claims the
/// name exists without supplying a value), script scope (if bound or
/// host-claimed), registered object, else auto-create a `0` script
/// variable.
/// `FUNCTION_START_PATTERN` documents the grammar's "identifier followed by
/// `(`" lookahead (§4.1); matching is done here via `IDENT_PATTERN` plus a
/// `peek_char` check instead, since both need the identifier text itself
/// and a single regex match can't hand back the split.
fn parse_ident_atom(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Option<Evaluated>, EvalError> {
    let name = match cursor.consume_regex(IDENT_PATTERN) {
        Some(n) => n.to_string(),
        None => return Ok(None),
    };
    if cursor.peek_char() == Some('(') {
        cursor.consume_char("(");
        let args = parse_call_args(cursor, ctx)?;
        let value = call_function(&name, &args, ctx)?;
        return Ok(Some(Evaluated::plain(value)));
    }
    if let Some(v) = ctx.registry.constant(&name) {
        return Ok(Some(Evaluated::plain(v)));
    }
    if let Some(v) = variable_hook(ctx, "read", &name, None) {
        return Ok(Some(Evaluated::plain(v)));
    }
    let host_claims = variable_hook(ctx, "check", &name, None).is_some();
    if ctx.scope.exists(&name) || host_claims {
        let value = ctx.scope.read(&name);
        return Ok(Some(Evaluated {
            value,
            lvalue: Some(LValue { root: name, path: Vec::new() }),
        }));
    }
    if let Some(obj) = ctx.registry.object(&name) {
        return Ok(Some(Evaluated::plain(Value::Object(obj))));
    }
    let value = ctx.scope.read(&name); // auto-creates per §4.9
    Ok(Some(Evaluated {
        value,
        lvalue: Some(LValue { root: name, path: Vec::new() }),
    }))
}

fn parse_call_args(cursor: &mut Cursor, ctx: &ExprCtx) -> Result<Vec<Value>, EvalError> {
    let mut args = Vec::new();
    if cursor.consume_char(")").is_some() {
        return Ok(args);
    }
    loop {
        let ev = parse_level1(cursor, ctx)?
            .ok_or_else(|| EvalError::ParseFailure(cursor.index, "expected argument".to_string()))?;
        args.push(ev.value);
        if cursor.consume_char(",").is_some() {
            continue;
        }
        if cursor.consume_char(")").is_some() {
            break;
        }
        return Err(EvalError::ParseFailure(cursor.index, "expected , or )".to_string()));
    }
    Ok(args)
}

fn invoke_callable(callable: &Callable, args: &[Value], engine: &Engine) -> Result<Value, EvalError> {
    if args.len() < callable.min_arity || args.len() > callable.max_arity {
        let expected = if callable.min_arity == callable.max_arity {
            callable.min_arity.to_string()
        } else {
            format!("{}-{}", callable.min_arity, callable.max_arity)
        };
        return Err(EvalError::arity_error(&callable.name, expected, args.len()));
    }
    (callable.f)(args, engine)
}

/// Call-bridge resolution order (component I, §4.8/§9): a disabled
/// function behaves as unregistered, then the host registry, then (when a
/// script context is active) a user-defined script function.
fn call_function(name: &str, args: &[Value], ctx: &ExprCtx) -> Result<Value, EvalError> {
    if ctx.config.disabled_fns.iter().any(|d| d == name) {
        return Err(EvalError::UnknownFunction(name.to_string()));
    }
    if let Some(callable) = ctx.registry.function(name) {
        return invoke_callable(&callable, args, ctx.engine);
    }
    if let Some(result) = ctx.scope.call_user_function(name, args) {
        return result;
    }
    Err(EvalError::UnknownFunction(name.to_string()))
}

/// Consults the host `variablefn` hook (§6.1: `op ∈ {read, set, check}`),
/// short-circuiting to `None` when no hook is installed. Shared by the
/// plain-identifier read/check resolution in `parse_ident_atom` and the
/// plain-name write path in `assign`.
fn variable_hook(ctx: &ExprCtx, op: &str, name: &str, value: Option<&Value>) -> Option<Value> {
    let vf = ctx.config.variable_fn.as_ref()?;
    vf(op, name, value, ctx.config.variable_fn_arg.as_ref(), ctx.engine)
}

/// Writes `new_value` through the binding path `lvalue` describes (§4.4,
/// §9 "binding references"): read the root variable, mutate a clone along
/// the recorded dict/array path, write the whole value back.
///
/// A plain-name assignment (`lvalue.path` empty) is offered to the host
/// `variablefn` hook first via `op="set"` (§6.1) — a non-`None` result
/// means the host has claimed the write, and the script/top-level scope is
/// left untouched; `None` falls through to the normal `scope.write`. Writes
/// through a dict/array path are never offered to the hook: `variablefn`
/// is a plain-name capability (§3.3 is the surface for structured
/// properties), matching the read side's resolution order.
fn assign(ctx: &ExprCtx, lvalue: &LValue, new_value: Value) -> Result<(), EvalError> {
    if lvalue.path.is_empty() {
        if variable_hook(ctx, "set", &lvalue.root, Some(&new_value)).is_some() {
            return Ok(());
        }
        ctx.scope.write(&lvalue.root, new_value);
        return Ok(());
    }
    let mut root_val = ctx.scope.read(&lvalue.root);
    set_path(&mut root_val, &lvalue.path, new_value)?;
    ctx.scope.write(&lvalue.root, root_val);
    Ok(())
}

fn set_path(val: &mut Value, path: &[PathSegment], new_value: Value) -> Result<(), EvalError> {
    match path.split_first() {
        None => {
            *val = new_value;
            Ok(())
        }
        Some((PathSegment::Index(i), rest)) => match val {
            Value::Array(items) => {
                if *i < 0 {
                    return Err(EvalError::NotAssignable);
                }
                let idx = *i as usize;
                while items.len() <= idx {
                    items.push(Value::Number(0.0));
                }
                set_path(&mut items[idx], rest, new_value)
            }
            _ => Err(EvalError::NotAssignable),
        },
        Some((PathSegment::Key(k), rest)) => match val {
            Value::Dict(map) => {
                let entry = map.entry(k.clone()).or_insert(Value::Number(0.0));
                set_path(entry, rest, new_value)
            }
            _ => Err(EvalError::NotAssignable),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::TopLevelScope;

    fn eval(src: &str) -> Value {
        let engine = Engine::default();
        let scope = TopLevelScope::new();
        eval_source(src, &engine, &scope)
    }

    #[test]
    fn precedence_multiplication_before_addition() {
        assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
        assert_eq!(eval("(1+2)*3"), Value::Number(9.0));
    }

    #[test]
    fn string_concatenation_and_mixed_coercion() {
        assert_eq!(eval("\"ab\" + \"cd\""), Value::String("abcd".to_string()));
        assert_eq!(eval("\"x\" + 1"), Value::Number(1.0));
    }

    #[test]
    fn division_by_zero_sentinel() {
        assert_eq!(eval("1/0"), Value::Number(2_100_776_655.0));
        assert_eq!(eval("-1/0"), Value::Number(-2_100_776_655.0));
        assert_eq!(eval("0/0"), Value::Number(0.0));
    }

    #[test]
    fn range_builds_array() {
        assert_eq!(
            eval("2:5"),
            Value::Array(vec![
                Value::Number(2.0),
                Value::Number(3.0),
                Value::Number(4.0),
                Value::Number(5.0)
            ])
        );
    }

    #[test]
    fn array_indexing_and_out_of_range() {
        assert_eq!(eval("[10,20,30][1]"), Value::Number(20.0));
        assert_eq!(eval("[10,20,30][9]"), Value::String(String::new()));
    }

    #[test]
    fn dict_literal_and_missing_key() {
        assert_eq!(eval("{a:1,b:2}.a"), Value::Number(1.0));
        assert_eq!(eval("{a:1,b:2}.b + 10"), Value::Number(12.0));
        assert!(eval("{a:1}.missing").is_error());
    }

    #[test]
    fn assignment_is_a_binding_reference() {
        assert_eq!(eval("a = 5; a += 3; a"), Value::Number(8.0));
    }

    #[test]
    fn assignment_into_array_element_persists() {
        assert_eq!(eval("a = [1,2,3]; a[1] = 99; a[1]"), Value::Number(99.0));
    }

    #[test]
    fn compound_division_assignment() {
        assert_eq!(eval("a = 10; a /= 4; a"), Value::Number(2.5));
    }

    #[test]
    fn string_escape_sequences() {
        assert_eq!(eval("\"a\\nb\""), Value::String("a\nb".to_string()));
        assert_eq!(eval("\"\\u0041\""), Value::String("A".to_string()));
    }

    #[test]
    fn multiple_expressions_separated_by_semicolons() {
        assert_eq!(eval("a=1;b=2;a+b"), Value::Number(3.0));
    }

    #[test]
    fn trailing_semicolon_is_permitted() {
        assert_eq!(eval("1+1;"), Value::Number(2.0));
    }

    #[test]
    fn unknown_function_is_an_error_value() {
        assert!(eval("nope(1)").is_error());
    }

    #[test]
    fn junk_after_expression_is_an_error() {
        assert!(eval("1 2").is_error());
    }

    #[test]
    fn bare_unbound_identifier_reads_as_zero() {
        assert_eq!(eval("x"), Value::Number(0.0));
    }

    #[test]
    fn logical_operators_are_int_coerced() {
        assert_eq!(eval("1 && 0"), Value::Number(0.0));
        assert_eq!(eval("0 || 5"), Value::Number(1.0));
    }

    #[test]
    fn bitwise_operators() {
        assert_eq!(eval("6 & 3"), Value::Number(2.0));
        assert_eq!(eval("6 | 1"), Value::Number(7.0));
        assert_eq!(eval("5 ^ 1"), Value::Number(4.0));
    }
}

// ABOUTME: Sentinel-driven tree-walking executor over preparsed lines (component H)

use crate::engine::Engine;
use crate::error::{EvalError, ScriptError};
use crate::expr::parser::eval_source;
use crate::script::iter::ForIter;
use crate::script::loader::{self, Line, LoadedScript};
use crate::scope::{CallBridge, VariableScope};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::time::Instant;

/// Control-flow token `execute_line` hands back to its calling
/// `execute_block` loop (§4.8's sentinel table).
#[derive(Debug, Clone, PartialEq)]
enum Sentinel {
    NextLine,
    EndOfBlock,
    EndOfFn,
    Abort,
    AbortLoop,
    ContinueLoop,
    Goto(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Top,
    Def,
    If,
    Elseif,
    Else,
    While,
    For,
}

struct Frame {
    kind: FrameKind,
    variables: RefCell<HashMap<String, Value>>,
    globals: RefCell<Vec<String>>,
}

impl Frame {
    fn new(kind: FrameKind) -> Self {
        Frame {
            kind,
            variables: RefCell::new(HashMap::new()),
            globals: RefCell::new(Vec::new()),
        }
    }
}

/// A loaded, validated script (component G's output) ready to run.
#[derive(Debug, Clone)]
pub struct Script {
    loaded: LoadedScript,
}

impl Script {
    /// Tokenizes, builds the line table, and validates it (components F, G)
    /// against `engine`'s configured indentation width.
    pub fn load(config: &EngineConfig, src: &str) -> Result<Script, ScriptError> {
        let loaded = loader::load(src, config.spaces_per_indent)?;
        Ok(Script { loaded })
    }

    pub fn lines(&self) -> &[Line] {
        &self.loaded.lines
    }

    /// Executes the top-level block (component H) and returns whatever
    /// `return` last stored, or `number 0` if the script never returned.
    /// `engine` supplies the registry/config this run executes against, and
    /// is also the `engine` handed to host hooks (§6.1).
    pub fn run(&self, engine: &Engine) -> Result<Value, ScriptError> {
        if self.loaded.lines.is_empty() {
            return Ok(Value::Number(0.0));
        }
        let exec = Executor::new(&self.loaded, engine);
        exec.execute_block(0);
        if let Some(err) = exec.runtime_error.borrow_mut().take() {
            return Err(err);
        }
        Ok(exec.returnvalue.borrow().clone())
    }
}

struct Executor<'a> {
    lines: &'a [Line],
    functions: &'a HashMap<String, loader::FunctionEntry>,
    engine: &'a Engine,
    frames: RefCell<Vec<Frame>>,
    infn: Cell<Option<usize>>,
    executed_lines: Cell<u64>,
    start: Instant,
    returnvalue: RefCell<Value>,
    iters: RefCell<HashMap<usize, ForIter>>,
    runtime_error: RefCell<Option<ScriptError>>,
}

impl<'a> Executor<'a> {
    fn new(loaded: &'a LoadedScript, engine: &'a Engine) -> Self {
        Executor {
            lines: &loaded.lines,
            functions: &loaded.functions,
            engine,
            frames: RefCell::new(vec![Frame::new(FrameKind::Top)]),
            infn: Cell::new(None),
            executed_lines: Cell::new(0),
            start: Instant::now(),
            returnvalue: RefCell::new(Value::Number(0.0)),
            iters: RefCell::new(HashMap::new()),
            runtime_error: RefCell::new(None),
        }
    }

    fn eval(&self, src: &str) -> Value {
        eval_source(src, self.engine, self)
    }

    /// Resource bound check (§4.10): line count, wall clock, and the
    /// host-cooperative stop flag. Monotonic once tripped, so a single
    /// check at the top of every `execute_line` is enough to unwind the
    /// whole call stack within one extra statement of the limit being hit.
    fn over_limit(&self) -> bool {
        let config = self.engine.config();
        if config.stop_script.get() {
            return true;
        }
        if self.executed_lines.get() > config.max_lines {
            return true;
        }
        self.start.elapsed().as_micros() as u64 > config.max_micros
    }

    fn push(&self, kind: FrameKind) {
        self.frames.borrow_mut().push(Frame::new(kind));
    }

    fn pop(&self) {
        self.frames.borrow_mut().pop();
    }

    /// Runs the contiguous sibling lines starting at `start` (all at
    /// `lines[start].level`), advancing via `NEXT_LINE`/`Goto` and
    /// returning whatever terminal sentinel a child line produced.
    fn execute_block(&self, start: usize) -> Sentinel {
        if start >= self.lines.len() {
            return Sentinel::EndOfBlock;
        }
        let base_level = self.lines[start].level;
        let mut idx = start;
        loop {
            if idx >= self.lines.len() || self.lines[idx].level < base_level {
                return Sentinel::EndOfBlock;
            }
            if self.lines[idx].is_blank() {
                idx += 1;
                continue;
            }
            match self.execute_line(idx) {
                Sentinel::NextLine => {
                    idx = idx + 1 + self.lines[idx].num_child_lines;
                }
                Sentinel::Goto(n) => idx = n,
                other => return other,
            }
        }
    }

    fn execute_line(&self, idx: usize) -> Sentinel {
        self.executed_lines.set(self.executed_lines.get() + 1);
        if self.over_limit() {
            return Sentinel::Abort;
        }
        let line = &self.lines[idx];
        match line.line_type.as_str() {
            "global" => {
                if let Some(frame) = self.frames.borrow().last() {
                    let mut globals = frame.globals.borrow_mut();
                    for tok in line.tokens[1..].iter().filter(|t| t.as_str() != ",") {
                        if !globals.contains(tok) {
                            globals.push(tok.clone());
                        }
                    }
                }
                Sentinel::NextLine
            }
            "return" => {
                let expr = line.rest_joined(1);
                let value = if expr.is_empty() { Value::Number(0.0) } else { self.eval(&expr) };
                *self.returnvalue.borrow_mut() = value;
                if self.infn.get().is_some() {
                    Sentinel::EndOfFn
                } else {
                    Sentinel::Abort
                }
            }
            "break" => Sentinel::AbortLoop,
            "continue" => Sentinel::ContinueLoop,
            "if" | "elseif" => self.execute_if_like(idx),
            "else" => self.execute_unconditional_block(idx, FrameKind::Else),
            "while" => self.execute_while(idx),
            "for" => self.execute_for(idx),
            // Definitions are pre-indexed at load time (component G) and
            // never fallen into at runtime; skipping straight past the
            // body is the behavior §4.8 describes as "definitions are
            // skipped at execution" (see DESIGN.md for why this resolves
            // to NEXT_LINE rather than a literal END_OF_BLOCK).
            "def" => Sentinel::NextLine,
            _ => {
                self.eval(&line.rest_joined(0));
                Sentinel::NextLine
            }
        }
    }

    /// Shared handling for `if`/`elseif` (§4.8: "elseif — identical to if
    /// when reached directly").
    fn execute_if_like(&self, idx: usize) -> Sentinel {
        let line = &self.lines[idx];
        let cond = self.eval(&line.rest_joined(1));
        if cond.is_truthy() {
            let kind = if line.line_type == "elseif" { FrameKind::Elseif } else { FrameKind::If };
            return self.execute_unconditional_block(idx, kind);
        }
        // Falsy: scan for an else/elseif sibling chained off this line.
        let next_sibling = idx + 1 + line.num_child_lines;
        match self.lines.get(next_sibling) {
            Some(sib) if sib.line_type == "else" => self.execute_unconditional_block(next_sibling, FrameKind::Else),
            Some(sib) if sib.line_type == "elseif" => Sentinel::Goto(next_sibling),
            _ => Sentinel::NextLine,
        }
    }

    /// Pushes a frame, runs the body immediately below `idx`, pops, and
    /// translates the child block's sentinel per §4.8's "if" rule (shared
    /// by `if`/`elseif`/`else`): abnormal exits propagate, a normal
    /// fall-through becomes `NEXT_LINE`.
    fn execute_unconditional_block(&self, idx: usize, kind: FrameKind) -> Sentinel {
        self.push(kind);
        let result = self.execute_block(idx + 1);
        self.pop();
        match result {
            Sentinel::EndOfFn | Sentinel::Abort | Sentinel::AbortLoop | Sentinel::ContinueLoop => result,
            _ => Sentinel::NextLine,
        }
    }

    fn execute_while(&self, idx: usize) -> Sentinel {
        let line = &self.lines[idx];
        loop {
            if self.over_limit() {
                return Sentinel::Abort;
            }
            let cond = self.eval(&line.rest_joined(1));
            if !cond.is_truthy() {
                return Sentinel::NextLine;
            }
            self.push(FrameKind::While);
            let result = self.execute_block(idx + 1);
            self.pop();
            match result {
                Sentinel::AbortLoop => return Sentinel::NextLine,
                Sentinel::ContinueLoop | Sentinel::EndOfBlock => continue,
                other => return other,
            }
        }
    }

    fn execute_for(&self, idx: usize) -> Sentinel {
        let line = &self.lines[idx];
        let var_name = line.tokens[1].clone();
        let source_expr = line.rest_joined(3);

        if !self.iters.borrow().contains_key(&idx) {
            let seed = self.eval(&source_expr);
            match ForIter::from_value(&seed, &source_expr) {
                Some(it) => {
                    self.iters.borrow_mut().insert(idx, it);
                }
                None => {
                    *self.runtime_error.borrow_mut() =
                        Some(ScriptError::new(line.lineno, format!("value of type {} is not iterable", seed.tag())));
                    return Sentinel::Abort;
                }
            }
        }

        loop {
            if self.over_limit() {
                self.iters.borrow_mut().remove(&idx);
                return Sentinel::Abort;
            }
            let next = {
                let mut iters = self.iters.borrow_mut();
                let it = iters.get_mut(&idx).expect("for-loop iterator missing");
                it.next(|expr| self.eval(expr))
            };
            let value = match next {
                Some(v) => v,
                None => {
                    self.iters.borrow_mut().remove(&idx);
                    return Sentinel::NextLine;
                }
            };
            self.write(&var_name, value);
            self.push(FrameKind::For);
            let result = self.execute_block(idx + 1);
            self.pop();
            match result {
                Sentinel::AbortLoop => {
                    self.iters.borrow_mut().remove(&idx);
                    return Sentinel::NextLine;
                }
                Sentinel::ContinueLoop | Sentinel::EndOfBlock => continue,
                other => {
                    self.iters.borrow_mut().remove(&idx);
                    return other;
                }
            }
        }
    }
}

/// Variable scoping (§4.9): frames are searched top (most recently pushed)
/// to bottom, stopping at a `def` frame's boundary unless the name is
/// declared `global` in that same frame, in which case the walk continues
/// past it rather than stopping.
impl<'a> VariableScope for Executor<'a> {
    fn read(&self, name: &str) -> Value {
        let frames = self.frames.borrow();
        for frame in frames.iter().rev() {
            if let Some(v) = frame.variables.borrow().get(name) {
                return v.clone();
            }
            if frame.kind == FrameKind::Def && !frame.globals.borrow().iter().any(|g| g == name) {
                break;
            }
        }
        drop(frames);
        let frames = self.frames.borrow();
        let top = frames.last().expect("frame stack is never empty");
        top.variables.borrow_mut().insert(name.to_string(), Value::Number(0.0));
        Value::Number(0.0)
    }

    fn write(&self, name: &str, value: Value) {
        let frames = self.frames.borrow();
        for frame in frames.iter().rev() {
            if frame.variables.borrow().contains_key(name) {
                frame.variables.borrow_mut().insert(name.to_string(), value);
                return;
            }
            if frame.kind == FrameKind::Def && !frame.globals.borrow().iter().any(|g| g == name) {
                break;
            }
        }
        let top = frames.last().expect("frame stack is never empty");
        top.variables.borrow_mut().insert(name.to_string(), value);
    }

    fn exists(&self, name: &str) -> bool {
        let frames = self.frames.borrow();
        for frame in frames.iter().rev() {
            if frame.variables.borrow().contains_key(name) {
                return true;
            }
            if frame.kind == FrameKind::Def && !frame.globals.borrow().iter().any(|g| g == name) {
                break;
            }
        }
        false
    }
}

/// Call bridge (component I): resolves a user-defined script function by
/// pushing a `def` frame, binding args positionally by parameter name
/// (extra args ignored, missing ones left to auto-create as `0` on read
/// per §4.9), running its body, and popping the frame.
impl<'a> CallBridge for Executor<'a> {
    fn call_user_function(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>> {
        let entry = self.functions.get(name)?;
        let body_start = entry.lineno + 1;

        self.push(FrameKind::Def);
        {
            let frames = self.frames.borrow();
            let frame = frames.last().expect("just pushed");
            let mut vars = frame.variables.borrow_mut();
            for (param, arg) in entry.params.iter().zip(args.iter()) {
                vars.insert(param.clone(), arg.clone());
            }
        }
        let prev_infn = self.infn.replace(Some(entry.lineno));
        self.execute_block(body_start);
        self.infn.set(prev_infn);
        self.pop();
        Some(Ok(self.returnvalue.borrow().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn run(src: &str) -> Value {
        let engine = Engine::default();
        let script = Script::load(engine.config(), src).expect("script should load");
        script.run(&engine).expect("script should run")
    }

    #[test]
    fn for_loop_over_range_sums_correctly() {
        let src = "s = 0\nfor i in 1:4\n  s = s + i\nreturn s";
        assert_eq!(run(src), Value::Number(10.0));
    }

    #[test]
    fn if_else_chooses_branch() {
        let src = "x = 5\nif x > 10\n  return 1\nelse\n  return 2";
        assert_eq!(run(src), Value::Number(2.0));
    }

    #[test]
    fn elseif_chain_picks_matching_branch() {
        let src = "x = 2\nif x == 1\n  return 10\nelseif x == 2\n  return 20\nelse\n  return 30";
        assert_eq!(run(src), Value::Number(20.0));
    }

    #[test]
    fn while_with_break_exits_innermost_loop_only() {
        let src = "i = 0\nwhile 1\n  i = i + 1\n  if i == 3\n    break\nreturn i";
        assert_eq!(run(src), Value::Number(3.0));
    }

    #[test]
    fn continue_skips_rest_of_loop_body() {
        let src = "s = 0\nfor i in 1:5\n  if i == 3\n    continue\n  s = s + i\nreturn s";
        assert_eq!(run(src), Value::Number(12.0));
    }

    #[test]
    fn user_defined_function_returns_value() {
        let src = "def add(a, b)\n  return a + b\nreturn add(3, 4)";
        assert_eq!(run(src), Value::Number(7.0));
    }

    #[test]
    fn def_without_global_creates_local_shadow() {
        let src = "x = 1\ndef f()\n  x = 2\n  return x\nf()\nreturn x";
        assert_eq!(run(src), Value::Number(1.0));
    }

    #[test]
    fn global_inside_def_mutates_outer_binding() {
        let src = "x = 1\ndef f()\n  global x\n  x = 2\nf()\nreturn x";
        assert_eq!(run(src), Value::Number(2.0));
    }

    #[test]
    fn for_over_string_yields_codepoints() {
        let src = "out = \"\"\nfor c in \"ab\"\n  out = out + c\nreturn out";
        assert_eq!(run(src), Value::String("ab".to_string()));
    }

    #[test]
    fn resource_bound_terminates_infinite_loop() {
        let engine = Engine::new(EngineConfig::default().with_max_lines(1000));
        let script = Script::load(engine.config(), "while 1\n  x = 1").expect("loads");
        let result = script.run(&engine);
        assert!(result.is_ok());
    }

    #[test]
    fn recursive_function_call() {
        let src = "def fact(n)\n  if n <= 1\n    return 1\n  return n * fact(n - 1)\nreturn fact(5)";
        assert_eq!(run(src), Value::Number(120.0));
    }
}

// ABOUTME: Variable scope and call-bridge traits shared by bare `Engine::eval`
// and the script executor's frame stack

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;

/// Binding-reference contract (§4.4, §4.9): reads always succeed (auto-
/// creating `number 0` on miss), writes mutate the existing binding in
/// place when found, else create one.
pub trait VariableScope {
    fn read(&self, name: &str) -> Value;
    fn write(&self, name: &str, value: Value);
    fn exists(&self, name: &str) -> bool;
}

/// Glue letting the expression evaluator invoke a user-defined script
/// function (component I). Returns `None` when no such function is
/// defined, so the caller falls through to the host function registry /
/// unknown-function error.
pub trait CallBridge {
    fn call_user_function(&self, name: &str, args: &[Value]) -> Option<Result<Value, EvalError>>;
}

pub trait EvalContext: VariableScope + CallBridge {}
impl<T: VariableScope + CallBridge> EvalContext for T {}

/// The scope `Engine::eval` uses when no `Script` is active: a single flat
/// table, so standalone calculator-style use (`"a=5; a+1"`) works without
/// a host first standing up a script (see SPEC_FULL.md §4 note).
#[derive(Default)]
pub struct TopLevelScope {
    vars: RefCell<HashMap<String, Value>>,
}

impl TopLevelScope {
    pub fn new() -> Self {
        TopLevelScope::default()
    }
}

impl VariableScope for TopLevelScope {
    fn read(&self, name: &str) -> Value {
        if let Some(v) = self.vars.borrow().get(name) {
            return v.clone();
        }
        self.vars.borrow_mut().insert(name.to_string(), Value::Number(0.0));
        Value::Number(0.0)
    }

    fn write(&self, name: &str, value: Value) {
        self.vars.borrow_mut().insert(name.to_string(), value);
    }

    fn exists(&self, name: &str) -> bool {
        self.vars.borrow().contains_key(name)
    }
}

impl CallBridge for TopLevelScope {
    fn call_user_function(&self, _name: &str, _args: &[Value]) -> Option<Result<Value, EvalError>> {
        None
    }
}

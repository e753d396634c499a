// ABOUTME: Host registry of constants, functions, and objects (§3.2, §3.3)

use crate::error::EvalError;
use crate::value::{BuiltinFn, Callable, HostObject, Value};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

fn function_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Named constants, functions, and objects a host makes available to
/// expressions. One `Registry` belongs to one `Engine`.
#[derive(Default)]
pub struct Registry {
    constants: RefCell<HashMap<String, Value>>,
    functions: RefCell<HashMap<String, Callable>>,
    objects: RefCell<HashMap<String, Rc<dyn HostObject>>>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn define_constant(&self, name: impl Into<String>, value: Value) {
        self.constants.borrow_mut().insert(name.into(), value);
    }

    pub fn constant(&self, name: &str) -> Option<Value> {
        self.constants.borrow().get(name).cloned()
    }

    /// Registers a function under `name`. Returns an error if `name` does
    /// not match `[A-Za-z_][A-Za-z0-9_]*` (§3.2).
    pub fn register_function(
        &self,
        name: impl Into<String>,
        min_arity: usize,
        max_arity: usize,
        f: BuiltinFn,
    ) -> Result<(), EvalError> {
        let name = name.into();
        if !function_name_re().is_match(&name) {
            return Err(EvalError::invalid_argument(
                "register_function",
                format!("invalid function name: {name}"),
            ));
        }
        self.functions.borrow_mut().insert(
            name.clone(),
            Callable {
                name,
                min_arity,
                max_arity,
                f,
            },
        );
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<Callable> {
        self.functions.borrow().get(name).cloned()
    }

    pub fn disable_function(&self, name: &str) {
        self.functions.borrow_mut().remove(name);
    }

    pub fn register_object(&self, name: impl Into<String>, object: Rc<dyn HostObject>) {
        self.objects.borrow_mut().insert(name.into(), object);
    }

    pub fn object(&self, name: &str) -> Option<Rc<dyn HostObject>> {
        self.objects.borrow().get(name).cloned()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.constants.borrow().contains_key(name)
            || self.functions.borrow().contains_key(name)
            || self.objects.borrow().contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_read_constant() {
        let r = Registry::new();
        r.define_constant("PI", Value::Number(3.0));
        assert_eq!(r.constant("PI"), Some(Value::Number(3.0)));
    }

    #[test]
    fn register_function_rejects_bad_name() {
        let r = Registry::new();
        let err = r.register_function(
            "1bad",
            0,
            0,
            Rc::new(|_: &[Value], _: &crate::engine::Engine| Ok(Value::Number(0.0))),
        );
        assert!(err.is_err());
    }

    #[test]
    fn disable_function_removes_it() {
        let r = Registry::new();
        r.register_function(
            "f",
            0,
            0,
            Rc::new(|_: &[Value], _: &crate::engine::Engine| Ok(Value::Number(1.0))),
        )
        .unwrap();
        assert!(r.function("f").is_some());
        r.disable_function("f");
        assert!(r.function("f").is_none());
    }
}

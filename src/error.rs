// ABOUTME: Error types for the expression parser/evaluator and the script layer

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";
pub const ARITY_ZERO_OR_ONE: &str = "0-1";
pub const ARITY_ONE_OR_TWO: &str = "1-2";
pub const ARITY_TWO_OR_THREE: &str = "2-3";

/// Expression-layer errors, carrying the stable numeric codes from §6.4 so a
/// host can map failures without string matching.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("dangling quote")]
    DanglingQuote,

    #[error("empty expression")]
    EmptyExpression,

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function}: expected {expected} arguments, got {actual}")]
    BadArity {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("junk after expression at {0}")]
    JunkAfterExpression(usize),

    #[error("parse failure at {0}: {1}")]
    ParseFailure(usize, String),

    #[error("{function}: invalid argument: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("invalid object: {0}")]
    InvalidObject(String),

    #[error("dangling backslash")]
    DanglingBackslash,

    #[error("bad index: {0}")]
    BadIndex(String),

    #[error("missing dict name at {0}")]
    MissingDictName(usize),

    #[error("missing dict colon at {0}")]
    MissingDictColon(usize),

    #[error("key not in dict: {0}")]
    KeyNotInDict(String),

    #[error("value is not assignable")]
    NotAssignable,
}

impl EvalError {
    pub fn code(&self) -> i32 {
        match self {
            EvalError::DanglingQuote => 1,
            EvalError::EmptyExpression => 2,
            EvalError::UnknownFunction(_) => 3,
            EvalError::BadArity { .. } => 4,
            EvalError::JunkAfterExpression(_) => 5,
            EvalError::ParseFailure(_, _) => 6,
            EvalError::InvalidArgument { .. } => 7,
            EvalError::InvalidObject(_) => 9,
            EvalError::DanglingBackslash => 10,
            EvalError::BadIndex(_) => 11,
            EvalError::MissingDictName(_) => 14,
            EvalError::MissingDictColon(_) => 15,
            EvalError::KeyNotInDict(_) => 16,
            EvalError::NotAssignable => 7,
        }
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::BadArity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn invalid_argument(function: &str, message: impl Into<String>) -> Self {
        EvalError::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// Collapse this error into the terminal `error` Value the parser
    /// returns as its top-level result (§7: first recorded error wins).
    pub fn into_value(self) -> crate::value::Value {
        let code = self.code();
        crate::value::Value::error(code, self.to_string())
    }
}

/// Script-layer error (loader, validator, executor); carries the offending
/// line number per §7's `errortext`/`errorlineno` contract.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("line {lineno}: {message}")]
pub struct ScriptError {
    pub lineno: u32,
    pub message: String,
}

impl ScriptError {
    pub fn new(lineno: u32, message: impl Into<String>) -> Self {
        ScriptError {
            lineno,
            message: message.into(),
        }
    }
}

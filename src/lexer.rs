// ABOUTME: Cursor-based lexing primitives shared by the expression parser

use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::OnceLock;

fn regex_cache() -> &'static Mutex<HashMap<String, Regex>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Regex>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

fn cached_regex(pattern: &str) -> Regex {
    let mut cache = regex_cache().lock().unwrap();
    if let Some(re) = cache.get(pattern) {
        return re.clone();
    }
    let re = Regex::new(pattern).expect("invalid internal regex pattern");
    cache.insert(pattern.to_string(), re.clone());
    re
}

pub const IDENT_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*";
pub const NUMBER_PATTERN: &str = r"^-?[0-9]+(\.[0-9]+)?";
pub const FUNCTION_START_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*\(";

/// A single mutable cursor `(input, index)` over the whole expression text
/// (§4.1). Cloning a `Cursor` is the re-entrancy mechanism: every recursive
/// parse call owns its own cursor on the stack, so nothing needs explicit
/// save/restore bookkeeping (see DESIGN.md, "parser re-entrancy").
#[derive(Clone, Copy)]
pub struct Cursor<'a> {
    pub input: &'a str,
    pub index: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Cursor { input, index: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.index >= self.input.len()
    }

    pub fn remaining(&self) -> &'a str {
        &self.input[self.index..]
    }

    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// If the next character is in `set`, advance past it and return it;
    /// otherwise leave `index` unchanged and return `None`.
    pub fn consume_char(&mut self, set: &str) -> Option<char> {
        let c = self.peek_char()?;
        if set.contains(c) {
            self.index += c.len_utf8();
            Some(c)
        } else {
            None
        }
    }

    /// Match `pattern` anchored at the current position; on success advance
    /// past the match and return it, otherwise leave `index` unchanged.
    pub fn consume_regex(&mut self, pattern: &str) -> Option<&'a str> {
        let re = cached_regex(pattern);
        let m = re.find(self.remaining())?;
        if m.start() != 0 {
            return None;
        }
        self.index += m.end();
        Some(&self.input[self.index - m.end()..self.index])
    }

    /// Consume zero or more plain ASCII spaces (whitespace elision, §4.2).
    pub fn skip_spaces(&mut self) {
        while self.consume_char(" ").is_some() {}
    }

    pub fn consume_literal(&mut self, lit: &str) -> bool {
        if self.remaining().starts_with(lit) {
            self.index += lit.len();
            true
        } else {
            false
        }
    }

    /// Unconditionally advances past the current character. Used by callers
    /// (e.g. string-literal escape scanning) that have already inspected
    /// `peek_char` and decided to consume it regardless of membership in a
    /// fixed set.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.index += c.len_utf8();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_char_advances_on_match() {
        let mut c = Cursor::new("+abc");
        assert_eq!(c.consume_char("+-"), Some('+'));
        assert_eq!(c.index, 1);
    }

    #[test]
    fn consume_char_leaves_index_on_mismatch() {
        let mut c = Cursor::new("abc");
        assert_eq!(c.consume_char("+-"), None);
        assert_eq!(c.index, 0);
    }

    #[test]
    fn consume_regex_matches_identifier() {
        let mut c = Cursor::new("foo_1(bar)");
        let m = c.consume_regex(IDENT_PATTERN).unwrap();
        assert_eq!(m, "foo_1");
        assert_eq!(c.index, 5);
    }

    #[test]
    fn consume_regex_matches_number() {
        let mut c = Cursor::new("-12.5 + 1");
        let m = c.consume_regex(NUMBER_PATTERN).unwrap();
        assert_eq!(m, "-12.5");
    }

    #[test]
    fn consume_regex_fails_leaves_index() {
        let mut c = Cursor::new("abc");
        assert!(c.consume_regex(NUMBER_PATTERN).is_none());
        assert_eq!(c.index, 0);
    }

    #[test]
    fn function_start_pattern_requires_paren() {
        let mut c = Cursor::new("foo(1,2)");
        assert!(c.consume_regex(FUNCTION_START_PATTERN).is_some());
        let mut c2 = Cursor::new("foo + 1");
        let idx = c2.index;
        assert!(c2.consume_regex(FUNCTION_START_PATTERN).is_none());
        assert_eq!(c2.index, idx);
    }
}

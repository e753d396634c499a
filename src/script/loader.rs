// ABOUTME: Indentation-to-level mapping, structural validation, function table (component G)

use crate::error::ScriptError;
use crate::lexer::Cursor;
use crate::script::tokenizer::tokenize_line;
use std::collections::HashMap;

pub const RESERVED_WORDS: &[&str] = &[
    "def", "for", "in", "while", "return", "if", "else", "elseif", "break", "continue", "float", "int", "array",
    "string", "object", "const", "var", "global", "class", "new", "include",
];

fn is_reserved(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

fn is_valid_ident(s: &str) -> bool {
    let mut c = Cursor::new(s);
    matches!(c.consume_regex(crate::lexer::IDENT_PATTERN), Some(m) if m.len() == s.len())
}

/// One loaded script line (§3.4). `level` is indentation depth;
/// `num_child_lines` is the count of immediately-following lines more
/// indented than this one (contiguous, blank lines skipped over).
#[derive(Debug, Clone)]
pub struct Line {
    pub lineno: u32,
    pub tokens: Vec<String>,
    pub line_type: String,
    pub level: usize,
    pub num_child_lines: usize,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens rejoined with spaces, minus the leading keyword — the text a
    /// control-flow line's expression is parsed from (e.g. the `EXPR` in
    /// `if EXPR`).
    pub fn rest_joined(&self, skip: usize) -> String {
        self.tokens[skip..].join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub lineno: usize, // index into `LoadedScript::lines`
    pub params: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedScript {
    pub lines: Vec<Line>,
    pub functions: HashMap<String, FunctionEntry>,
}

pub fn load(src: &str, spaces_per_indent: usize) -> Result<LoadedScript, ScriptError> {
    let lines = build_lines(src, spaces_per_indent)?;
    validate(&lines)?;
    let functions = index_functions(&lines)?;
    Ok(LoadedScript { lines, functions })
}

fn build_lines(src: &str, spaces_per_indent: usize) -> Result<Vec<Line>, ScriptError> {
    let mut lines = Vec::new();
    for (i, raw) in src.split('\n').enumerate() {
        let lineno = (i + 1) as u32;
        let trimmed = raw.trim_end_matches(['\r', '\t', ' ']);
        let indent = trimmed.len() - trimmed.trim_start_matches(' ').len();
        if trimmed[..indent].contains('\t') {
            return Err(ScriptError::new(lineno, "tabs are not permitted in indentation"));
        }
        if spaces_per_indent > 0 && indent % spaces_per_indent != 0 {
            return Err(ScriptError::new(
                lineno,
                format!("indentation {indent} is not a multiple of {spaces_per_indent}"),
            ));
        }
        let level = if spaces_per_indent > 0 { indent / spaces_per_indent } else { 0 };
        let tokens = tokenize_line(trimmed.trim_start_matches(' '));
        let line_type = tokens.first().cloned().unwrap_or_default();
        lines.push(Line {
            lineno,
            tokens,
            line_type,
            level,
            num_child_lines: 0,
        });
    }
    for i in 0..lines.len() {
        let base_level = lines[i].level;
        let mut count = 0;
        for line in &lines[i + 1..] {
            if line.is_blank() || line.level > base_level {
                count += 1;
            } else {
                break;
            }
        }
        lines[i].num_child_lines = count;
    }
    Ok(lines)
}

const BLOCK_OPENERS: &[&str] = &["if", "elseif", "else", "while", "for", "def"];

fn validate(lines: &[Line]) -> Result<(), ScriptError> {
    // Stack of (level, type) for enclosing blocks, used to resolve
    // `global`'s "only inside def" rule.
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut prev_sibling_at_level: HashMap<usize, String> = HashMap::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.is_blank() {
            continue;
        }
        stack.retain(|(lvl, _)| *lvl < line.level);

        // Every line must sit exactly one level under its nearest enclosing
        // block opener; a stray deeper level here means it skipped past a
        // level no open block established.
        if line.level != stack.len() {
            return Err(ScriptError::new(
                line.lineno,
                format!("unexpected indentation at level {}", line.level),
            ));
        }

        match line.line_type.as_str() {
            "def" => {
                if line.level != 0 {
                    return Err(ScriptError::new(line.lineno, "def must be at indentation level 0"));
                }
                validate_def(line)?;
            }
            "for" => validate_for(line)?,
            "global" => {
                let enclosing = stack.last().map(|(_, t)| t.as_str());
                if enclosing != Some("def") {
                    return Err(ScriptError::new(line.lineno, "global is only valid inside a function"));
                }
                validate_global(line)?;
            }
            "elseif" => {
                if prev_sibling_at_level.get(&line.level).map(String::as_str) == Some("else") {
                    return Err(ScriptError::new(line.lineno, "elseif may not follow else"));
                }
            }
            _ => {}
        }

        if BLOCK_OPENERS.contains(&line.line_type.as_str()) {
            let first_child = lines[idx + 1..].iter().find(|n| !n.is_blank());
            match first_child {
                Some(child) if child.level == line.level + 1 => {}
                Some(child) if child.level > line.level => {
                    return Err(ScriptError::new(
                        child.lineno,
                        format!("body of {} must be indented exactly one level deeper", line.line_type),
                    ));
                }
                _ => {
                    return Err(ScriptError::new(line.lineno, format!("{} requires an indented body", line.line_type)));
                }
            }
            stack.push((line.level, line.line_type.clone()));
        }

        if matches!(line.line_type.as_str(), "if" | "elseif" | "else") {
            prev_sibling_at_level.insert(line.level, line.line_type.clone());
        } else if !line.is_blank() {
            prev_sibling_at_level.remove(&line.level);
        }
    }
    Ok(())
}

fn validate_def(line: &Line) -> Result<(), ScriptError> {
    if line.tokens.len() < 3 || line.tokens[2] != "(" {
        return Err(ScriptError::new(line.lineno, "def requires NAME(ARGS)"));
    }
    let name = &line.tokens[1];
    if !is_valid_ident(name) || is_reserved(name) {
        return Err(ScriptError::new(line.lineno, format!("invalid function name: {name}")));
    }
    let mut params = Vec::new();
    let mut i = 3;
    if line.tokens.get(i).map(String::as_str) == Some(")") {
        return Ok(());
    }
    loop {
        let arg = line
            .tokens
            .get(i)
            .ok_or_else(|| ScriptError::new(line.lineno, "unterminated parameter list"))?;
        if !is_valid_ident(arg) || is_reserved(arg) {
            return Err(ScriptError::new(line.lineno, format!("invalid parameter name: {arg}")));
        }
        if params.contains(arg) {
            return Err(ScriptError::new(line.lineno, format!("duplicate parameter name: {arg}")));
        }
        params.push(arg.clone());
        i += 1;
        match line.tokens.get(i).map(String::as_str) {
            Some(",") => {
                i += 1;
            }
            Some(")") => break,
            _ => return Err(ScriptError::new(line.lineno, "expected , or ) in parameter list")),
        }
    }
    Ok(())
}

fn validate_for(line: &Line) -> Result<(), ScriptError> {
    if line.tokens.len() < 4 {
        return Err(ScriptError::new(line.lineno, "for requires: for NAME in EXPR"));
    }
    let name = &line.tokens[1];
    if !is_valid_ident(name) || is_reserved(name) {
        return Err(ScriptError::new(line.lineno, format!("invalid loop variable name: {name}")));
    }
    if line.tokens[2] != "in" {
        return Err(ScriptError::new(line.lineno, "for requires: for NAME in EXPR"));
    }
    Ok(())
}

fn validate_global(line: &Line) -> Result<(), ScriptError> {
    if line.tokens.len() < 2 {
        return Err(ScriptError::new(line.lineno, "global requires at least one name"));
    }
    let mut expect_name = true;
    for tok in &line.tokens[1..] {
        if expect_name {
            if !is_valid_ident(tok) {
                return Err(ScriptError::new(line.lineno, format!("invalid name in global: {tok}")));
            }
        } else if tok != "," {
            return Err(ScriptError::new(line.lineno, "expected , between global names"));
        }
        expect_name = !expect_name;
    }
    if expect_name {
        return Err(ScriptError::new(line.lineno, "trailing , in global"));
    }
    Ok(())
}

fn index_functions(lines: &[Line]) -> Result<HashMap<String, FunctionEntry>, ScriptError> {
    let mut functions = HashMap::new();
    for (i, line) in lines.iter().enumerate() {
        if line.line_type != "def" {
            continue;
        }
        let name = line.tokens[1].clone();
        let params = line.tokens[3..line.tokens.len() - 1]
            .iter()
            .filter(|t| *t != ",")
            .cloned()
            .collect();
        functions.insert(name, FunctionEntry { lineno: i, params });
    }
    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_levels_from_indentation() {
        let src = "if 1\n  a = 1\nb = 2";
        let lines = build_lines(src, 2).unwrap();
        assert_eq!(lines[0].level, 0);
        assert_eq!(lines[1].level, 1);
        assert_eq!(lines[2].level, 0);
        assert_eq!(lines[0].num_child_lines, 1);
    }

    #[test]
    fn rejects_non_multiple_indentation() {
        let src = "if 1\n   a = 1";
        assert!(build_lines(src, 2).is_err());
    }

    #[test]
    fn rejects_tabs_in_indentation() {
        let src = "if 1\n\ta = 1";
        assert!(build_lines(src, 2).is_err());
    }

    #[test]
    fn rejects_empty_block() {
        let src = "if 1\nb = 2";
        assert!(load(src, 2).is_err());
    }

    #[test]
    fn rejects_def_not_at_top_level() {
        let src = "if 1\n  def f()\n    return 1";
        assert!(load(src, 2).is_err());
    }

    #[test]
    fn rejects_elseif_after_else() {
        let src = "if 1\n  a = 1\nelse\n  a = 2\nelseif 2\n  a = 3";
        assert!(load(src, 2).is_err());
    }

    #[test]
    fn rejects_global_outside_def() {
        let src = "global x";
        assert!(load(src, 2).is_err());
    }

    #[test]
    fn accepts_global_inside_def() {
        let src = "def f()\n  global x\n  x = 1";
        assert!(load(src, 2).is_ok());
    }

    #[test]
    fn indexes_function_with_params() {
        let src = "def add(a, b)\n  return a + b";
        let loaded = load(src, 2).unwrap();
        let entry = loaded.functions.get("add").unwrap();
        assert_eq!(entry.params, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn rejects_duplicate_params() {
        let src = "def add(a, a)\n  return a";
        assert!(load(src, 2).is_err());
    }

    #[test]
    fn rejects_invalid_for_shape() {
        let src = "for 1 in x\n  a = 1";
        assert!(load(src, 2).is_err());
    }
}

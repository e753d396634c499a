// ABOUTME: Per-line token splitter honoring quotes, parens, and comments (component F)

/// Splits one script line into tokens (§4.6): ASCII space is the separator
/// outside quoted strings; `(`, `)`, and `,` are emitted as their own
/// tokens; a quoted substring (including its quotes) is retained as a
/// single token with backslash escapes kept literal, so re-parsing the
/// rejoined tokens as an expression honors them; `//` outside a string
/// starts a line comment that discards the remainder of the line.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                let mut tok = String::from("\"");
                loop {
                    match chars.next() {
                        None => break,
                        Some('\\') => {
                            tok.push('\\');
                            if let Some(next) = chars.next() {
                                tok.push(next);
                            }
                        }
                        Some('"') => {
                            tok.push('"');
                            break;
                        }
                        Some(ch) => tok.push(ch),
                    }
                }
                tokens.push(tok);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '(' | ')' | ',' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(c.to_string());
            }
            ' ' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Rejoins tokens with single spaces, the form fed back into the
/// expression evaluator for bare-expression lines (§4.8, "otherwise").
pub fn rejoin(tokens: &[String]) -> String {
    tokens.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_space_and_parens() {
        assert_eq!(tokenize_line("foo(1, 2)"), vec!["foo", "(", "1", ",", "2", ")"]);
    }

    #[test]
    fn retains_quoted_string_as_one_token() {
        assert_eq!(tokenize_line("a = \"hello world\""), vec!["a", "=", "\"hello world\""]);
    }

    #[test]
    fn keeps_escapes_literal_inside_strings() {
        assert_eq!(tokenize_line("x = \"a\\\"b\""), vec!["x", "=", "\"a\\\"b\""]);
    }

    #[test]
    fn comment_discards_rest_of_line() {
        assert_eq!(tokenize_line("a = 1 // trailing note"), vec!["a", "=", "1"]);
    }

    #[test]
    fn comment_inside_string_is_not_a_comment() {
        assert_eq!(tokenize_line("a = \"http://x\""), vec!["a", "=", "\"http://x\""]);
    }

    #[test]
    fn blank_line_has_no_tokens() {
        assert!(tokenize_line("").is_empty());
    }

    #[test]
    fn rejoin_reconstructs_spaced_form() {
        assert_eq!(rejoin(&tokenize_line("a+b")), "a+b");
        assert_eq!(rejoin(&tokenize_line("foo(1, 2)")), "foo ( 1 , 2 )");
    }
}

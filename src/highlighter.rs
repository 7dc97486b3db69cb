// ABOUTME: Syntax highlighter for REPL with color support
// Implements rustyline's Highlighter trait to provide ANSI color codes
// for Lox syntax elements while preserving display width

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_KEYWORD: &str = "\x1b[1;35m"; // Bold magenta
const COLOR_NATIVE: &str = "\x1b[36m"; // Cyan
const COLOR_NUMBER: &str = "\x1b[33m"; // Yellow
const COLOR_STRING: &str = "\x1b[32m"; // Green
const COLOR_BOOLEAN: &str = "\x1b[33m"; // Yellow
const COLOR_COMMENT: &str = "\x1b[90m"; // Bright black (gray)

/// Main highlighter helper for the Lox REPL. Provides syntax-aware color
/// highlighting of keywords, literals, and comments.
pub struct LoxHelper;

impl LoxHelper {
    pub fn new() -> Self {
        LoxHelper
    }
}

impl Default for LoxHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LoxHelper {}

impl Completer for LoxHelper {
    type Candidate = String;
}

impl Hinter for LoxHelper {
    type Hint = String;
}

impl Validator for LoxHelper {}

impl Highlighter for LoxHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let keywords = get_keywords();
        let natives = get_natives();
        let highlighted = highlight_line(line, &keywords, &natives);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn get_keywords() -> HashSet<&'static str> {
    [
        "and", "class", "else", "fun", "for", "if", "or", "print", "return", "super", "this",
        "var", "while",
    ]
    .into_iter()
    .collect()
}

fn get_natives() -> HashSet<&'static str> {
    ["clock"].into_iter().collect()
}

/// Tokenizes a line with a minimal scan (not a full `Scanner`) and wraps each
/// token class in its ANSI color, leaving punctuation and whitespace as-is.
fn highlight_line(line: &str, keywords: &HashSet<&'static str>, natives: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '/' if i + 1 < chars.len() && chars[i + 1] == '/' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;
                while i < chars.len() {
                    let c = chars[i];
                    result.push(c);
                    i += 1;
                    if c == '"' {
                        break;
                    }
                }
                result.push_str(COLOR_RESET);
            }
            c if c.is_ascii_digit() => {
                result.push_str(COLOR_NUMBER);
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word == "true" || word == "false" || word == "nil" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if keywords.contains(word.as_str()) {
                    result.push_str(COLOR_KEYWORD);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else if natives.contains(word.as_str()) {
                    result.push_str(COLOR_NATIVE);
                    result.push_str(&word);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&word);
                }
            }
            c => {
                result.push(c);
                i += 1;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ansi(s: &str) -> String {
        let mut out = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn highlighting_preserves_visible_text() {
        let line = "var x = \"hi\"; // trailing";
        let keywords = get_keywords();
        let natives = get_natives();
        let highlighted = highlight_line(line, &keywords, &natives);
        assert_eq!(strip_ansi(&highlighted), line);
    }

    #[test]
    fn non_keyword_identifiers_pass_through_unstyled() {
        let line = "var counter = 0;";
        let keywords = get_keywords();
        let natives = get_natives();
        let highlighted = highlight_line(line, &keywords, &natives);
        assert!(highlighted.contains("counter"));
        assert!(!highlighted.contains(&format!("{}counter", COLOR_KEYWORD)));
    }
}

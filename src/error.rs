// ABOUTME: Error types for the scan/parse/resolve/runtime diagnostic phases

use crate::token::{Token, TokenKind};
use crate::value::Value;
use thiserror::Error;

/// A lex-phase diagnostic. The scanner never aborts on one of these; it
/// keeps scanning and the caller decides what to do with the whole batch.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] Error: {message}")]
pub struct LexError {
    pub line: u32,
    pub message: String,
}

/// A parse-phase diagnostic, token-aware per spec §4.5/§7: `" at end"` for
/// EOF, `" at '<lexeme>'"` otherwise.
#[derive(Debug, Clone, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct ParseError {
    pub line: u32,
    pub location: String,
    pub message: String,
}

impl ParseError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.kind == TokenKind::EndOfFile {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        ParseError {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

/// A static-resolution diagnostic (redeclaration, self-initialising
/// reference, misplaced `return`/`this`/`super`, self-inheriting class).
#[derive(Debug, Clone, Error)]
#[error("[line {line}] Error{location}: {message}")]
pub struct ResolveError {
    pub line: u32,
    pub location: String,
    pub message: String,
}

impl ResolveError {
    pub fn at(token: &Token, message: impl Into<String>) -> Self {
        let location = if token.kind == TokenKind::EndOfFile {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        ResolveError {
            line: token.line,
            location,
            message: message.into(),
        }
    }
}

/// A runtime diagnostic raised while interpreting. Carries the line of the
/// offending token so the CLI can render `"<msg>\n[line N]"`.
#[derive(Debug, Clone, Error)]
#[error("{message}\n[line {line}]")]
pub struct RuntimeError {
    pub message: String,
    pub line: u32,
}

impl RuntimeError {
    pub fn new(token: &Token, message: impl Into<String>) -> Self {
        RuntimeError {
            message: message.into(),
            line: token.line,
        }
    }
}

/// Non-local control flow and runtime failure share a single outcome type
/// so an expression/statement visitor can propagate either with `?`;
/// `Return` is caught only at the enclosing function-call frame and must
/// never reach the CLI driver as an error.
#[derive(Debug, Clone)]
pub enum Signal {
    Error(RuntimeError),
    Return(Value),
}

impl From<RuntimeError> for Signal {
    fn from(e: RuntimeError) -> Self {
        Signal::Error(e)
    }
}

pub type EvalResult<T> = Result<T, Signal>;

/// Summarises one run of the pipeline for the CLI's exit-code selection,
/// mirroring the source's "had lex/parse error" / "had runtime error" flags.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunOutcome {
    pub had_static_error: bool,
    pub had_runtime_error: bool,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        if self.had_runtime_error {
            70
        } else if self.had_static_error {
            65
        } else {
            0
        }
    }
}

// ABOUTME: Scanner module turning Lox source text into a token stream

use crate::error::LexError;
use crate::token::{keyword_kind, Literal, Token, TokenKind};

pub struct Scanner<'s> {
    source: &'s [u8],
    start: usize,
    current: usize,
    line: u32,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &'s str) -> Self {
        Scanner {
            source: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Scans the whole source, returning the token stream (always terminated
    /// by a single `EndOfFile` token) together with any lex errors encountered.
    /// Scanning never aborts early: it continues past unterminated strings and
    /// unexpected characters, per spec.
    pub fn scan_tokens(mut self) -> (Vec<Token>, Vec<LexError>) {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens
            .push(Token::new(TokenKind::EndOfFile, "", Literal::Nil, self.line));
        (self.tokens, self.errors)
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current] as char;
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current] as char
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1] as char
        }
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] as char != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_literal(kind, Literal::Nil);
    }

    fn add_token_literal(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(LexError {
            line: self.line,
            message: message.into(),
        });
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.matches('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_ident_start(c) => self.identifier(),
            _ => self.error(format!("Unexpected character '{}'", c)),
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.error("Unterminated string.");
            return;
        }

        // Consume the closing quote.
        self.advance();

        let value = String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1])
            .into_owned();
        self.add_token_literal(TokenKind::String, Literal::String(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            // Consume the '.'
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned number lexeme must parse");
        self.add_token_literal(TokenKind::Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while is_ident_continue(self.peek()) {
            self.advance();
        }

        let text = self.lexeme();
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Scanner::new(src).scan_tokens();
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_single_and_double_char_operators() {
        assert_eq!(
            kinds("! != = == < <= > >="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("1 // a comment\n2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::EndOfFile]
        );
    }

    #[test]
    fn tracks_line_numbers_across_newlines_in_strings() {
        let (tokens, _) = Scanner::new("\"a\nb\"\nprint").scan_tokens();
        // The string token starts on line 1; print starts on line 3.
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Print);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn unterminated_string_reports_error_and_continues() {
        let (tokens, errors) = Scanner::new("\"oops").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens.last().unwrap().kind, TokenKind::EndOfFile);
    }

    #[test]
    fn number_requires_trailing_digit_after_dot() {
        let (tokens, _) = Scanner::new("123.").scan_tokens();
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[1].kind, TokenKind::Dot);
    }

    #[test]
    fn recognises_keywords_and_identifiers() {
        assert_eq!(
            kinds("class orchid"),
            vec![TokenKind::Class, TokenKind::Identifier, TokenKind::EndOfFile]
        );
    }

    #[test]
    fn unexpected_character_reports_and_continues_scan() {
        let (tokens, errors) = Scanner::new("@ 1").scan_tokens();
        assert_eq!(errors.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
    }
}

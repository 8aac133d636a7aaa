//! Lexer for Go source.
//!
//! Produces the full Go token stream, including automatic semicolon
//! insertion: a newline (or end of input) after an identifier, literal,
//! one of `break continue fallthrough return`, `++ --` or a closing
//! bracket inserts a `;` token.

use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};

/// Multi-character operators, longest first.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

const SINGLE: &str = "+-*/%&|^<>=!()[]{},;.:~";

pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    prev: Option<TokenKind>,
}

/// Tokenize a whole file.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    Lexer::new(source).tokenize()
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            column: 1,
            prev: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, SyntaxError> {
        let mut tokens = Vec::new();
        loop {
            let crossed_newline = self.skip_trivia()?;
            let at_end = self.peek().is_none();

            if (crossed_newline || at_end) && self.prev.is_some_and(TokenKind::ends_statement) {
                tokens.push(self.token_here(TokenKind::Semicolon));
                self.prev = Some(TokenKind::Semicolon);
            }

            let Some(c) = self.peek() else {
                tokens.push(self.token_here(TokenKind::Eof));
                return Ok(tokens);
            };

            let (start, line, column) = (self.pos, self.line, self.column);
            let kind = self.scan(c)?;
            tokens.push(Token {
                kind,
                start,
                end: self.pos,
                line,
                column,
            });
            self.prev = Some(kind);
        }
    }

    fn token_here(&self, kind: TokenKind) -> Token {
        Token {
            kind,
            start: self.pos,
            end: self.pos,
            line: self.line,
            column: self.column,
        }
    }

    fn error(&self, message: impl Into<String>) -> SyntaxError {
        SyntaxError::new(self.line, self.column, message)
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_by(&mut self, bytes: usize) {
        let end = self.pos + bytes;
        while self.pos < end {
            self.advance();
        }
    }

    /// Skip whitespace and comments. Returns whether a newline was crossed.
    fn skip_trivia(&mut self) -> Result<bool, SyntaxError> {
        let mut newline = false;
        loop {
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                }
                Some('\n') => {
                    newline = true;
                    self.advance();
                }
                Some('/') if self.peek_next() == Some('/') => {
                    while self.peek().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_next() == Some('*') => {
                    let Some(len) = self.rest()[2..].find("*/") else {
                        return Err(self.error("comment not terminated"));
                    };
                    newline |= self.rest()[2..2 + len].contains('\n');
                    self.advance_by(len + 4);
                }
                _ => return Ok(newline),
            }
        }
    }

    fn scan(&mut self, c: char) -> Result<TokenKind, SyntaxError> {
        if c.is_alphabetic() || c == '_' {
            return Ok(self.scan_ident());
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_next().is_some_and(|n| n.is_ascii_digit())) {
            return Ok(self.scan_number());
        }
        match c {
            '"' => self.scan_quoted('"', TokenKind::String),
            '\'' => self.scan_quoted('\'', TokenKind::Char),
            '`' => self.scan_raw_string(),
            _ => self.scan_operator(c),
        }
    }

    fn scan_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        TokenKind::keyword(&self.source[start..self.pos]).unwrap_or(TokenKind::Ident)
    }

    fn scan_number(&mut self) -> TokenKind {
        let rest = self.rest();
        let hex = rest.starts_with("0x") || rest.starts_with("0X");
        if hex || ["0b", "0B", "0o", "0O"].iter().any(|p| rest.starts_with(p)) {
            self.advance_by(2);
        }

        let mut kind = TokenKind::Int;
        while let Some(c) = self.peek() {
            let lower = c.to_ascii_lowercase();
            if (!hex && lower == 'e') || (hex && lower == 'p') {
                kind = TokenKind::Float;
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
            } else if lower == 'i' {
                self.advance();
                return TokenKind::Imag;
            } else if c == '.' {
                kind = TokenKind::Float;
                self.advance();
            } else if c.is_ascii_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        kind
    }

    fn scan_quoted(&mut self, quote: char, kind: TokenKind) -> Result<TokenKind, SyntaxError> {
        self.advance();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    let what = if kind == TokenKind::Char { "rune" } else { "string" };
                    return Err(self.error(format!("{what} literal not terminated")));
                }
                Some('\\') => {
                    self.advance();
                    self.advance();
                }
                Some(c) => {
                    self.advance();
                    if c == quote {
                        return Ok(kind);
                    }
                }
            }
        }
    }

    fn scan_raw_string(&mut self) -> Result<TokenKind, SyntaxError> {
        self.advance();
        let Some(len) = self.rest().find('`') else {
            return Err(self.error("raw string literal not terminated"));
        };
        self.advance_by(len + 1);
        Ok(TokenKind::String)
    }

    fn scan_operator(&mut self, c: char) -> Result<TokenKind, SyntaxError> {
        if let Some(op) = OPERATORS.iter().find(|op| self.rest().starts_with(**op)) {
            self.advance_by(op.len());
            let kind = match *op {
                "..." => TokenKind::Ellipsis,
                "<-" => TokenKind::Arrow,
                "++" => TokenKind::Inc,
                "--" => TokenKind::Dec,
                _ => TokenKind::Op,
            };
            return Ok(kind);
        }

        if !SINGLE.contains(c) {
            return Err(self.error(format!("unexpected character {c:?}")));
        }
        self.advance();
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBrack,
            ']' => TokenKind::RBrack,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '=' => TokenKind::Assign,
            '~' => TokenKind::Tilde,
            '|' => TokenKind::Pipe,
            ':' => TokenKind::Colon,
            _ => TokenKind::Op,
        };
        Ok(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn inserts_semicolons_at_line_ends() {
        assert_eq!(
            kinds("package foo\nimport \"fmt\"\n"),
            vec![Package, Ident, Semicolon, Import, String, Semicolon, Eof]
        );
    }

    #[test]
    fn no_semicolon_after_open_brace_or_operator() {
        assert_eq!(
            kinds("type A interface {\n\tDo() error\n}\n"),
            vec![
                Type, Ident, Interface, LBrace, Ident, LParen, RParen, Ident, Semicolon, RBrace,
                Semicolon, Eof
            ]
        );
    }

    #[test]
    fn semicolon_at_eof_without_newline() {
        assert_eq!(kinds("x"), vec![Ident, Semicolon, Eof]);
    }

    #[test]
    fn comments_count_as_newlines_only_when_they_span_lines() {
        assert_eq!(kinds("a // trailing\nb"), vec![Ident, Semicolon, Ident, Semicolon, Eof]);
        assert_eq!(kinds("a /* inline */ b"), vec![Ident, Ident, Semicolon, Eof]);
        assert_eq!(kinds("a /* multi\nline */ b"), vec![Ident, Semicolon, Ident, Semicolon, Eof]);
    }

    #[test]
    fn variadic_and_channel_operators() {
        assert_eq!(
            kinds("f(a ...string, c <-chan int)"),
            vec![
                Ident, LParen, Ident, Ellipsis, Ident, Comma, Ident, Arrow, Chan, Ident, RParen,
                Semicolon, Eof
            ]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("1 0x1F 1.5e-3 .5 2i 0b1_0"), vec![
            Int, Int, Float, Float, Imag, Int, Semicolon, Eof
        ]);
    }

    #[test]
    fn string_literals() {
        let source = "\"a\\\"b\" `raw\nstring` 'x'";
        let tokens = tokenize(source).unwrap();
        assert_eq!(tokens[0].text(source), "\"a\\\"b\"");
        assert_eq!(tokens[1].text(source), "`raw\nstring`");
        assert_eq!(tokens[2].kind, Char);
    }

    #[test]
    fn reports_position_of_unterminated_string() {
        let err = tokenize("package a\nvar s = \"oops\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("not terminated"));
    }

    #[test]
    fn rejects_unknown_characters() {
        let err = tokenize("a @ b").unwrap_err();
        assert!(err.message.contains("unexpected character"));
    }
}

use std::iter::FusedIterator;

use log::{debug, info};
use phf::phf_map;

use crate::error::{ErrorReporter, LoxError, Result};
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and" => TokenType::AND,
    "class" => TokenType::CLASS,
    "else" => TokenType::ELSE,
    "false" => TokenType::FALSE,
    "fun" => TokenType::FUN,
    "for" => TokenType::FOR,
    "if" => TokenType::IF,
    "nil" => TokenType::NIL,
    "or" => TokenType::OR,
    "print" => TokenType::PRINT,
    "return" => TokenType::RETURN,
    "super" => TokenType::SUPER,
    "this" => TokenType::THIS,
    "true" => TokenType::TRUE,
    "var" => TokenType::VAR,
    "while" => TokenType::WHILE,
};

/// Turns source text into a token stream.
///
/// The scanner is an iterator over `Result<Token, LoxError>`: lexical errors
/// are yielded inline and scanning continues with the next character, so a
/// single pass surfaces every diagnostic. The final `Ok` item is always one
/// `EOF` token.
#[derive(Debug, Clone)]
pub struct Scanner {
    source: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    col: usize,
    start_line: usize,
    start_col: usize,
    pending: Option<TokenType>,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        info!("Initializing scanner over {} bytes", source.len());

        Self {
            source: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            col: 0,
            start_line: 1,
            start_col: 1,
            pending: None,
        }
    }

    fn scan_token(&mut self) -> Result<()> {
        let c: char = self.advance();

        match c {
            '(' => self.add_token(TokenType::LEFT_PAREN),

            ')' => self.add_token(TokenType::RIGHT_PAREN),

            '{' => self.add_token(TokenType::LEFT_BRACE),

            '}' => self.add_token(TokenType::RIGHT_BRACE),

            ',' => self.add_token(TokenType::COMMA),

            '.' => self.add_token(TokenType::DOT),

            '-' => self.add_token(TokenType::MINUS),

            '+' => self.add_token(TokenType::PLUS),

            ';' => self.add_token(TokenType::SEMICOLON),

            '*' => self.add_token(TokenType::STAR),

            '!' => {
                let token_type: TokenType = if self.match_char('=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(token_type);
            }

            '=' => {
                let token_type: TokenType = if self.match_char('=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(token_type);
            }

            '<' => {
                let token_type: TokenType = if self.match_char('=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(token_type);
            }

            '>' => {
                let token_type: TokenType = if self.match_char('=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(token_type);
            }

            '/' => {
                if self.match_char('/') {
                    // Line comment, runs to end of line.
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_char('*') {
                    self.skip_block_comment()?;
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => self.new_line(),

            '"' => self.scan_string()?,

            '0'..='9' => self.scan_number(),

            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(),

            _ => {
                return Err(LoxError::lex(
                    self.start_line,
                    self.start_col,
                    format!("Unexpected character '{}'", c),
                ));
            }
        }

        Ok(())
    }

    /// Consumes a `/* ... */` comment. Nesting is not supported; an
    /// unterminated comment is reported at its opening position.
    fn skip_block_comment(&mut self) -> Result<()> {
        loop {
            if self.is_at_end() {
                return Err(LoxError::lex(
                    self.start_line,
                    self.start_col,
                    "Unterminated multi-line comment",
                ));
            }

            match self.peek() {
                '\n' => {
                    self.advance();
                    self.new_line();
                }

                '*' if self.peek_next() == '/' => {
                    self.advance();
                    self.advance();
                    return Ok(());
                }

                _ => {
                    self.advance();
                }
            }
        }
    }

    fn scan_string(&mut self) -> Result<()> {
        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                self.advance();
                self.new_line();
            } else {
                self.advance();
            }
        }

        if self.is_at_end() {
            return Err(LoxError::lex(
                self.start_line,
                self.start_col,
                "Unterminated string.",
            ));
        }

        // The closing quote.
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();

        debug!("Scanned string literal: {:?}", value);

        self.add_token(TokenType::STRING(value));

        Ok(())
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A fractional part only counts when digits follow the dot.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let literal: String = self.source[self.start..self.current].iter().collect();
        let number: f64 = literal.parse().unwrap_or(0.0);

        debug!("Scanned number literal: {}", number);

        self.add_token(TokenType::NUMBER(number));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match KEYWORDS.get(text.as_str()) {
            Some(token_type) => self.add_token(token_type.clone()),

            None => self.add_token(TokenType::IDENTIFIER),
        }
    }

    #[inline]
    fn add_token(&mut self, token_type: TokenType) {
        self.pending = Some(token_type);
    }

    #[inline]
    fn advance(&mut self) -> char {
        let c: char = self.source[self.current];

        self.current += 1;
        self.col += 1;

        c
    }

    #[inline]
    fn new_line(&mut self) {
        self.line += 1;
        self.col = 0;
    }

    #[inline]
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;
            self.col += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.source[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            '\0'
        } else {
            self.source[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

impl Iterator for Scanner {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.is_at_end() {
                if self.current == self.source.len() {
                    // Emit the trailing EOF exactly once, then fuse.
                    self.current += 1;

                    debug!("Reached EOF at line {}", self.line);

                    return Some(Ok(Token::new(
                        TokenType::EOF,
                        String::new(),
                        self.line,
                        self.col + 1,
                    )));
                }

                return None;
            }

            self.pending = None;
            self.start = self.current;
            self.start_line = self.line;
            self.start_col = self.col + 1;

            if let Err(e) = self.scan_token() {
                return Some(Err(e));
            }

            if let Some(token_type) = self.pending.take() {
                let lexeme: String = self.source[self.start..self.current].iter().collect();

                debug!(
                    "Emitting token: type={:?}, lexeme={:?}, line={}",
                    token_type, lexeme, self.start_line
                );

                return Some(Ok(Token::new(
                    token_type,
                    lexeme,
                    self.start_line,
                    self.start_col,
                )));
            }

            // Whitespace or a comment; keep scanning.
        }
    }
}

impl FusedIterator for Scanner {}

/// Drives the scanner to completion, routing errors to the reporter.
///
/// The returned vector always ends with a single `EOF` token, even when the
/// source contained lexical errors.
pub fn scan_tokens(source: &str, reporter: &mut ErrorReporter) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for item in Scanner::new(source) {
        match item {
            Ok(token) => tokens.push(token),

            Err(e) => reporter.report(e),
        }
    }

    tokens
}

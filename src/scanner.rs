//! One-pass streaming lexer.
//!
//! Transforms source bytes into a sequence of [`Token`]s, skipping whitespace
//! and `//` comments, and emitting exactly one `EOF` token at the end.  The
//! scanner is a `FusedIterator` yielding `Result<Token, LoxError>`: lexical
//! errors carry line information and do not stop the scan, so one pass can
//! surface every bad character in the input.
//!
//! Keywords are recognized through a compile-time perfect-hash map; comment
//! skipping fast-forwards to the next newline with `memchr`.

use crate::error::LoxError;
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    src: &'a [u8],
    start: usize,      // first byte of the current lexeme
    curr: usize,       // one past the last byte examined
    line: usize,       // 1-based line counter
    eof_emitted: bool, // exactly one EOF token is produced
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(src: &'a [u8]) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            curr: 0,
            line: 1,
            eof_emitted: false,
        }
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.curr >= self.src.len()
    }

    #[inline(always)]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.src[self.curr];
        self.curr += 1;
        byte
    }

    #[inline(always)]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.src[self.curr]
        }
    }

    #[inline(always)]
    fn peek_next(&self) -> u8 {
        if self.curr + 1 >= self.src.len() {
            0
        } else {
            self.src[self.curr + 1]
        }
    }

    /// Consume the next byte if it equals `expected`.
    #[inline(always)]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.src[self.curr] != expected {
            return false;
        }
        self.curr += 1;
        true
    }

    fn lexeme(&self) -> String {
        String::from_utf8_lossy(&self.src[self.start..self.curr]).into_owned()
    }

    fn make_token(&self, token_type: TokenType) -> Token {
        Token::new(token_type, self.lexeme(), self.line)
    }

    /// Skip whitespace and comments.  Returns `false` if input ran out.
    fn skip_trivia(&mut self) -> bool {
        loop {
            match self.peek() {
                b' ' | b'\r' | b'\t' => {
                    self.curr += 1;
                }

                b'\n' => {
                    self.line += 1;
                    self.curr += 1;
                }

                b'/' if self.peek_next() == b'/' => {
                    // Fast-forward to the next newline.
                    if let Some(pos) = memchr(b'\n', &self.src[self.curr..]) {
                        self.curr += pos;
                    } else {
                        self.curr = self.src.len();
                    }
                }

                _ => return !self.is_at_end(),
            }
        }
    }

    fn string(&mut self) -> Result<Token, LoxError> {
        let opening_line: usize = self.line;

        while self.peek() != b'"' && !self.is_at_end() {
            if self.peek() == b'\n' {
                self.line += 1;
            }
            self.curr += 1;
        }

        if self.is_at_end() {
            return Err(LoxError::lex(opening_line, "Unterminated string."));
        }

        // Closing quote.
        self.curr += 1;

        let contents: String =
            String::from_utf8_lossy(&self.src[self.start + 1..self.curr - 1]).into_owned();

        Ok(Token::new(
            TokenType::STRING(contents),
            self.lexeme(),
            self.line,
        ))
    }

    fn number(&mut self) -> Result<Token, LoxError> {
        while self.peek().is_ascii_digit() {
            self.curr += 1;
        }

        // A fractional part needs a digit after the dot, otherwise the dot is
        // a property access.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.curr += 1;
            while self.peek().is_ascii_digit() {
                self.curr += 1;
            }
        }

        let lexeme: String = self.lexeme();
        let value: f64 = lexeme
            .parse()
            .map_err(|_| LoxError::lex(self.line, format!("Invalid number '{}'.", lexeme)))?;

        Ok(Token::new(TokenType::NUMBER(value), lexeme, self.line))
    }

    fn identifier(&mut self) -> Token {
        while is_identifier_byte(self.peek()) {
            self.curr += 1;
        }

        let word: &[u8] = &self.src[self.start..self.curr];
        let token_type: TokenType = KEYWORDS
            .get(word)
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER);

        self.make_token(token_type)
    }

    fn scan_token(&mut self) -> Result<Token, LoxError> {
        let byte: u8 = self.advance();

        let token_type: TokenType = match byte {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,

            b'!' => {
                if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                }
            }

            b'=' => {
                if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                }
            }

            b'<' => {
                if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                }
            }

            b'>' => {
                if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                }
            }

            b'"' => return self.string(),

            b'0'..=b'9' => return self.number(),

            b if is_identifier_start(b) => return Ok(self.identifier()),

            other => {
                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected token '{}'", other as char),
                ));
            }
        };

        Ok(self.make_token(token_type))
    }
}

#[inline(always)]
fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

#[inline(always)]
fn is_identifier_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token, LoxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.skip_trivia() {
            if self.eof_emitted {
                return None;
            }
            self.eof_emitted = true;
            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        }

        self.start = self.curr;
        let result: Result<Token, LoxError> = self.scan_token();

        if let Ok(token) = &result {
            debug!("Scanned token: {}", token);
        }

        Some(result)
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

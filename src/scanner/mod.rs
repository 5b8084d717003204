use std::iter::FusedIterator;

use crate::token::{lookup_ident, Token, TokenKind};

mod table;

pub use table::{standard_classifications, ScannerTable, TableScanner};

/// Scanner is the handwritten tokenizer, used to bootstrap and to cross-check the
/// table-driven one: for the standard classifications both produce the same
/// token stream for any input.
#[derive(Debug)]
pub struct Scanner<'a> {
    input: &'a [u8],
    // Rather than tracking separate start and current positions we keep the
    // unscanned remainder in `input` and count how many of its bytes belong to
    // the token being scanned:
    // - scanned_input_len is (current - start)
    // - reset_scanned_input() is `start = current`
    scanned_input_len: usize,
    ended: bool,
}

impl<'a> Scanner<'a> {
    /// Returns a fresh Scanner, ready to spit out tokens from the given source
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            input: source.as_bytes(),
            scanned_input_len: 0,
            ended: false,
        }
    }

    /// Returns the next token from the input, advancing the scanner.
    /// Bytes that start no token come back in-band as a one-byte `Illegal` token.
    /// Once the input is used up this keeps returning `Eof`.
    pub fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();
        let next_byte = match self.take_next_byte() {
            None => return Token::new(TokenKind::Eof, ""),
            Some(b) => b,
        };
        let token = match next_byte {
            b'(' => self.make_token(TokenKind::LParen),
            b')' => self.make_token(TokenKind::RParen),
            b'{' => self.make_token(TokenKind::LBrace),
            b'}' => self.make_token(TokenKind::RBrace),
            b'[' => self.make_token(TokenKind::LBracket),
            b']' => self.make_token(TokenKind::RBracket),
            b';' => self.make_token(TokenKind::Semicolon),
            b':' => self.make_token(TokenKind::Colon),
            b',' => self.make_token(TokenKind::Comma),
            b'-' => self.make_token(TokenKind::Minus),
            b'+' => self.make_token(TokenKind::Plus),
            b'/' => self.make_token(TokenKind::Slash),
            b'*' => self.make_token(TokenKind::Asterisk),
            b'!' => self.one_or_two(b'=', TokenKind::NotEq, TokenKind::Bang),
            b'=' => self.one_or_two(b'=', TokenKind::Eq, TokenKind::Assign),
            b'<' => self.one_or_two(b'=', TokenKind::LtEq, TokenKind::Lt),
            b'>' => self.one_or_two(b'=', TokenKind::GtEq, TokenKind::Gt),
            b'&' => self.one_or_two(b'&', TokenKind::And, TokenKind::Illegal),
            b'|' => self.one_or_two(b'|', TokenKind::Or, TokenKind::Illegal),
            b'"' => self.scan_string_literal(),
            b'0'..=b'9' => self.scan_numeric_literal(),
            b'a'..=b'z' => self.scan_identifier_or_keyword(),
            _ => self.make_token(TokenKind::Illegal),
        };
        self.reset_scanned_input();
        token
    }

    fn unscanned_input(&self) -> &'a [u8] {
        &self.input[self.scanned_input_len.min(self.input.len())..]
    }

    fn peek_next_byte(&self) -> Option<u8> {
        self.unscanned_input().first().copied()
    }

    fn take_next_byte(&mut self) -> Option<u8> {
        let next_byte = self.peek_next_byte()?;
        self.scanned_input_len += 1;
        Some(next_byte)
    }

    fn take_next_byte_if_matches(&mut self, target: u8) -> bool {
        if self.peek_next_byte() == Some(target) {
            self.scanned_input_len += 1;
            true
        } else {
            false
        }
    }

    fn one_or_two(&mut self, second: u8, two: TokenKind, one: TokenKind) -> Token<'a> {
        if self.take_next_byte_if_matches(second) {
            self.make_token(two)
        } else {
            self.make_token(one)
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b' ' | b'\r' | b'\n' | b'\t') = self.peek_next_byte() {
            self.take_next_byte();
        }
        self.reset_scanned_input();
    }

    // Makes a token of the given kind from the scanned portion of input.
    // Does NOT reset scanned input, caller of this probably also wants to call that.
    fn make_token(&self, kind: TokenKind) -> Token<'a> {
        Token {
            kind,
            literal: String::from_utf8_lossy(&self.input[..self.scanned_input_len]),
        }
    }

    // Mark the scanned portion of input as done by removing it from input.
    fn reset_scanned_input(&mut self) {
        self.input = self.unscanned_input();
        self.scanned_input_len = 0;
    }

    // Assumes we have just scanned the opening double-quote.
    // Strings hold only letters, digits and spaces; anything else (including
    // running out of input) leaves the quote on its own as an Illegal token.
    fn scan_string_literal(&mut self) -> Token<'a> {
        while let Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b' ') = self.peek_next_byte() {
            self.take_next_byte();
        }
        if self.take_next_byte_if_matches(b'"') {
            self.make_token(TokenKind::String)
        } else {
            self.scanned_input_len = 1;
            self.make_token(TokenKind::Illegal)
        }
    }

    fn scan_numeric_literal(&mut self) -> Token<'a> {
        while let Some(b'0'..=b'9') = self.peek_next_byte() {
            self.take_next_byte();
        }
        self.make_token(TokenKind::Int)
    }

    fn scan_identifier_or_keyword(&mut self) -> Token<'a> {
        while let Some(b'a'..=b'z' | b'A'..=b'Z') = self.peek_next_byte() {
            self.take_next_byte();
        }
        let token = self.make_token(TokenKind::Ident);
        let kind = lookup_ident(&token.literal);
        Token {
            kind,
            literal: token.literal,
        }
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Token<'a>;

    // One Eof, then None.
    fn next(&mut self) -> Option<Self::Item> {
        if self.ended {
            return None;
        }
        let token = self.next_token();
        self.ended = token.kind == TokenKind::Eof;
        Some(token)
    }
}

impl<'a> FusedIterator for Scanner<'a> {}

// Turns a list of (kind, literal) pairs into tokens.
#[cfg(test)]
pub(crate) fn tokens_from<'a>(pairs: &[(TokenKind, &'a str)]) -> Vec<Token<'a>> {
    pairs
        .iter()
        .map(|(kind, literal)| Token {
            kind: *kind,
            literal: std::borrow::Cow::Borrowed(*literal),
        })
        .collect()
}

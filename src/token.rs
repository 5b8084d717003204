use std::borrow::Cow;
use std::fmt::Display;

/// The closed set of token kinds for the language.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
    Illegal,
    Eof,
    // Identifiers and literals.
    Ident,
    Int,
    String,
    // Operators.
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    And,
    Or,
    // Punctuation.
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    // Keywords.
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
}

/// Keyword text and the kind it scans as.
pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("fn", TokenKind::Function),
    ("let", TokenKind::Let),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("return", TokenKind::Return),
];

impl TokenKind {
    /// Stable label for this kind, e.g. `LET` or `LT_EQ`.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Illegal => "ILLEGAL",
            TokenKind::Eof => "EOF",
            TokenKind::Ident => "IDENT",
            TokenKind::Int => "INT",
            TokenKind::String => "STRING",
            TokenKind::Assign => "ASSIGN",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Bang => "BANG",
            TokenKind::Asterisk => "ASTERISK",
            TokenKind::Slash => "SLASH",
            TokenKind::Lt => "LT",
            TokenKind::LtEq => "LT_EQ",
            TokenKind::Gt => "GT",
            TokenKind::GtEq => "GT_EQ",
            TokenKind::Eq => "EQ",
            TokenKind::NotEq => "NOT_EQ",
            TokenKind::And => "AND",
            TokenKind::Or => "OR",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Colon => "COLON",
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::LBracket => "LBRACKET",
            TokenKind::RBracket => "RBRACKET",
            TokenKind::Function => "FUNCTION",
            TokenKind::Let => "LET",
            TokenKind::True => "TRUE",
            TokenKind::False => "FALSE",
            TokenKind::If => "IF",
            TokenKind::Else => "ELSE",
            TokenKind::Return => "RETURN",
        }
    }

    /// The fixed source text of this kind, if it has one.
    pub fn literal(&self) -> Option<&'static str> {
        let text = match self {
            TokenKind::Illegal
            | TokenKind::Eof
            | TokenKind::Ident
            | TokenKind::Int
            | TokenKind::String => return None,
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Bang => "!",
            TokenKind::Asterisk => "*",
            TokenKind::Slash => "/",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::Colon => ":",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Function => "fn",
            TokenKind::Let => "let",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Return => "return",
        };
        Some(text)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Keyword kind for `text`, or `Ident` if it isn't one.
pub fn lookup_ident(text: &str) -> TokenKind {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == text)
        .map_or(TokenKind::Ident, |(_, kind)| *kind)
}

/// Kinds the table-driven scanner can hand out: besides whatever the classifiers
/// produce it needs a kind for end of input and one for unmatched bytes.
pub trait TokenClass: Clone + Ord + std::fmt::Debug {
    /// Kind of the end-of-input token.
    fn eof() -> Self;
    /// Kind of a byte no classifier matches.
    fn illegal() -> Self;
}

impl TokenClass for TokenKind {
    fn eof() -> Self {
        TokenKind::Eof
    }

    fn illegal() -> Self {
        TokenKind::Illegal
    }
}

impl TokenClass for &'static str {
    fn eof() -> Self {
        "EOF"
    }

    fn illegal() -> Self {
        "ILLEGAL"
    }
}

/// Token is a kind plus the raw text that was scanned for it.
// The Cow lets ILLEGAL tokens for non-UTF-8 bytes carry an owned replacement,
// while everything else borrows from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a, K = TokenKind> {
    /// What was scanned.
    pub kind: K,
    /// The scanned text; empty for EOF.
    pub literal: Cow<'a, str>,
}

impl<'a, K> Token<'a, K> {
    /// A token borrowing or owning its literal text.
    pub fn new(kind: K, literal: impl Into<Cow<'a, str>>) -> Self {
        Token {
            kind,
            literal: literal.into(),
        }
    }
}

impl<'a, K: Display> Display for Token<'a, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {:?}", self.kind, self.literal)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keywords_lookup() {
        for (text, kind) in KEYWORDS {
            assert_eq!(lookup_ident(text), *kind);
            assert_eq!(kind.literal(), Some(*text));
        }
        assert_eq!(lookup_ident("lets"), TokenKind::Ident);
        assert_eq!(lookup_ident("Let"), TokenKind::Ident);
    }

    #[test]
    fn test_display() {
        assert_eq!(TokenKind::LtEq.to_string(), "LT_EQ");
        assert_eq!(Token::new(TokenKind::Int, "55").to_string(), r#"INT "55""#);
        assert_eq!(TokenKind::Ident.literal(), None);
    }
}

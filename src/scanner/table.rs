use std::iter::FusedIterator;

use crate::automata::{build_dfa, Classification, Dfa, RegexError, StateId};
use crate::token::{Token, TokenClass, TokenKind, KEYWORDS};

// No transition; the forward scan stops here.
const ERROR: StateId = StateId::MAX;

/// The standard lexical grammar: punctuation and operators at precedence 1,
/// keywords at precedence 2, then identifiers, integers and strings at precedence 1.
pub fn standard_classifications() -> Vec<Classification<TokenKind>> {
    use TokenKind::*;
    let operators = [
        Assign, Plus, Minus, Comma, Semicolon, Colon, LParen, RParen, LBrace, RBrace, LBracket,
        RBracket, Gt, GtEq, Lt, LtEq, Eq, Bang, NotEq, And, Or, Slash, Asterisk,
    ];
    let mut classes: Vec<Classification<TokenKind>> = operators
        .iter()
        .filter_map(|kind| Some(Classification::new(escape(kind.literal()?), *kind, 1)))
        .collect();
    classes.extend(
        KEYWORDS
            .iter()
            .map(|(text, kind)| Classification::new(*text, *kind, 2)),
    );
    classes.push(Classification::new("[a-z]([a-z]|[A-Z])*", Ident, 1));
    classes.push(Classification::new("[0-9]([0-9])*", Int, 1));
    classes.push(Classification::new(
        r#""([a-z]|[A-Z]|[0-9]| )*""#,
        String,
        1,
    ));
    classes
}

// Backslash-escape regex metacharacters in a literal.
fn escape(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len() * 2);
    for c in literal.chars() {
        if "()[]|*+\\".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A minimized DFA flattened into a dense `state x byte` table, ready to drive any
/// number of [`TableScanner`]s.
#[derive(Debug, Clone)]
pub struct ScannerTable<K> {
    initial: StateId,
    next: Vec<StateId>,
    kinds: Vec<Option<K>>,
    dfa: Dfa<K>,
}

impl<K: TokenClass> ScannerTable<K> {
    /// Run the whole generator pipeline over `classifications`.
    pub fn new(classifications: &[Classification<K>]) -> Result<Self, RegexError> {
        Ok(Self::from_dfa(build_dfa(classifications)?))
    }

    /// Flatten an already built DFA. Only accepting states that carry a kind can end
    /// a token.
    pub fn from_dfa(dfa: Dfa<K>) -> Self {
        let states = dfa.num_states();
        let mut next = vec![ERROR; states * 256];
        let mut kinds = vec![None; states];
        for (state, kind) in kinds.iter_mut().enumerate() {
            for byte in dfa.alphabet() {
                if let Some(to) = dfa.step(state, byte) {
                    next[state * 256 + usize::from(byte)] = to;
                }
            }
            if dfa.is_accepting(state) {
                *kind = dfa.kind(state).cloned();
            }
        }
        ScannerTable {
            initial: dfa.initial(),
            next,
            kinds,
            dfa,
        }
    }

    /// The DFA this table was flattened from.
    pub fn dfa(&self) -> &Dfa<K> {
        &self.dfa
    }

    fn step(&self, state: StateId, byte: u8) -> Option<StateId> {
        match self.next[state * 256 + usize::from(byte)] {
            ERROR => None,
            to => Some(to),
        }
    }

    fn kind(&self, state: StateId) -> Option<&K> {
        self.kinds[state].as_ref()
    }

    /// Scan `source` with this table.
    pub fn scanner<'a, 't>(&'t self, source: &'a str) -> TableScanner<'a, 't, K> {
        TableScanner::new(source, self)
    }
}

impl ScannerTable<TokenKind> {
    /// The table for [`standard_classifications`].
    pub fn standard() -> Result<Self, RegexError> {
        Self::new(&standard_classifications())
    }
}

/// Longest-match tokenizer driven by a [`ScannerTable`].
#[derive(Debug)]
pub struct TableScanner<'a, 't, K> {
    input: &'a [u8],
    position: usize,
    table: &'t ScannerTable<K>,
    // Pre-transition states of the current scan, for rolling back to the last
    // accepting state.
    history: Vec<StateId>,
    ended: bool,
}

impl<'a, 't, K: TokenClass> TableScanner<'a, 't, K> {
    /// A scanner positioned at the start of `source`.
    pub fn new(source: &'a str, table: &'t ScannerTable<K>) -> Self {
        TableScanner {
            input: source.as_bytes(),
            position: 0,
            table,
            history: Vec::new(),
            ended: false,
        }
    }

    /// Returns the longest token at the current position, breaking ties by
    /// precedence (already encoded in the table's kinds). If no non-empty prefix
    /// matches, returns the first byte as an illegal token and moves past it.
    /// Once the input is used up this keeps returning EOF.
    pub fn next_token(&mut self) -> Token<'a, K> {
        while let Some(b' ' | b'\r' | b'\n' | b'\t') = self.input.get(self.position) {
            self.position += 1;
        }
        if self.position >= self.input.len() {
            return Token::new(K::eof(), "");
        }

        let start = self.position;
        self.history.clear();
        let mut state = Some(self.table.initial);
        while let (Some(current), Some(byte)) = (state, self.input.get(self.position)) {
            self.history.push(current);
            state = self.table.step(current, *byte);
            self.position += 1;
        }

        loop {
            if let Some(kind) = state.and_then(|s| self.table.kind(s)) {
                if self.position > start {
                    let literal = String::from_utf8_lossy(&self.input[start..self.position]);
                    return Token::new(kind.clone(), literal);
                }
            }
            match self.history.pop() {
                Some(previous) => {
                    state = Some(previous);
                    self.position -= 1;
                }
                None => break,
            }
        }

        self.position = start + 1;
        Token::new(
            K::illegal(),
            String::from_utf8_lossy(&self.input[start..start + 1]),
        )
    }
}

impl<'a, 't, K: TokenClass> Iterator for TableScanner<'a, 't, K> {
    type Item = Token<'a, K>;

    // One EOF, then None.
    fn next(&mut self) -> Option<Self::Item> {
        if self.ended {
            return None;
        }
        let token = self.next_token();
        self.ended = token.kind == K::eof();
        Some(token)
    }
}

impl<'a, 't, K: TokenClass> FusedIterator for TableScanner<'a, 't, K> {}

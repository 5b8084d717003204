//! Regex to NFA by Thompson construction.
//!
//! The dialect is deliberately small: single-byte literals, concatenation,
//! alternation `|`, Kleene star `*`, grouping `( )`, bracket expressions made of
//! single bytes and inclusive ranges (`[a-z]`, `[a-zA-Z]`), and backslash escapes
//! for the metacharacters `( ) [ ] | * + \`.

use thiserror::Error;

use super::Nfa;

const ESCAPABLE: &[u8] = b"()[]|*+\\";
const UNSUPPORTED: &[u8] = b"+?.^$";

/// Ways a pattern can fail to compile. Positions are byte offsets into the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegexError {
    /// A metacharacter outside the dialect, e.g. `+` or `.`.
    #[error("unsupported metacharacter {found:?} at position {position}")]
    UnsupportedMetacharacter {
        /// Where it was found.
        position: usize,
        /// The offending byte.
        found: char,
    },
    /// A byte that cannot appear here, e.g. a dangling `*` or an unbalanced `)`.
    #[error("unexpected {found:?} at position {position}")]
    UnexpectedByte {
        /// Where it was found.
        position: usize,
        /// The offending byte.
        found: char,
    },
    /// The pattern stopped in the middle of a construct (or was empty).
    #[error("unexpected end of pattern at position {position}")]
    UnexpectedEnd {
        /// Length of the pattern.
        position: usize,
    },
    /// A backslash followed by something that isn't a metacharacter.
    #[error("invalid escape {found:?} at position {position}")]
    InvalidEscape {
        /// Position of the escaped byte.
        position: usize,
        /// The escaped byte.
        found: char,
    },
    /// A bracket range whose end comes before its start.
    #[error("invalid range {from:?}-{to:?} at position {position}")]
    InvalidRange {
        /// Position of the range start.
        position: usize,
        /// First byte of the range.
        from: char,
        /// Last byte of the range.
        to: char,
    },
}

/// Compile `pattern` into an NFA with a single accepting state and no kinds.
pub fn compile<K: Clone>(pattern: &str) -> Result<Nfa<K>, RegexError> {
    let mut parser = RegexParser {
        pattern: pattern.as_bytes(),
        position: 0,
    };
    let nfa = parser.alternation()?;
    match parser.peek() {
        None => Ok(nfa),
        Some(byte) => Err(parser.unexpected(byte)),
    }
}

// Recursive descent over the pattern bytes:
//   alternation   := concatenation ('|' concatenation)*
//   concatenation := repetition+
//   repetition    := atom '*'*
//   atom          := literal | escape | '(' alternation ')' | '[' items ']'
#[derive(Debug)]
struct RegexParser<'a> {
    pattern: &'a [u8],
    position: usize,
}

impl<'a> RegexParser<'a> {
    fn peek(&self) -> Option<u8> {
        self.pattern.get(self.position).copied()
    }

    fn take(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.position += 1;
        Some(byte)
    }

    fn unexpected(&self, byte: u8) -> RegexError {
        RegexError::UnexpectedByte {
            position: self.position,
            found: char::from(byte),
        }
    }

    fn end(&self) -> RegexError {
        RegexError::UnexpectedEnd {
            position: self.position,
        }
    }

    fn alternation<K: Clone>(&mut self) -> Result<Nfa<K>, RegexError> {
        let mut nfa = self.concatenation()?;
        while self.peek() == Some(b'|') {
            self.position += 1;
            let rhs = self.concatenation()?;
            nfa = nfa.union(rhs);
        }
        Ok(nfa)
    }

    fn concatenation<K: Clone>(&mut self) -> Result<Nfa<K>, RegexError> {
        let mut nfa: Option<Nfa<K>> = None;
        loop {
            match self.peek() {
                None | Some(b'|') | Some(b')') => break,
                Some(_) => {
                    let piece = self.repetition()?;
                    nfa = Some(match nfa {
                        None => piece,
                        Some(prefix) => prefix.concat(piece),
                    });
                }
            }
        }
        // Empty alternatives have no meaning in this dialect.
        nfa.ok_or_else(|| match self.peek() {
            None => self.end(),
            Some(byte) => self.unexpected(byte),
        })
    }

    fn repetition<K: Clone>(&mut self) -> Result<Nfa<K>, RegexError> {
        let mut nfa = self.atom()?;
        while self.peek() == Some(b'*') {
            self.position += 1;
            nfa = nfa.kleene();
        }
        Ok(nfa)
    }

    fn atom<K: Clone>(&mut self) -> Result<Nfa<K>, RegexError> {
        let byte = match self.peek() {
            None => return Err(self.end()),
            Some(byte) => byte,
        };
        match byte {
            b'(' => {
                self.position += 1;
                let inner = self.alternation()?;
                match self.take() {
                    Some(b')') => Ok(inner),
                    Some(other) => {
                        self.position -= 1;
                        Err(self.unexpected(other))
                    }
                    None => Err(self.end()),
                }
            }
            b'[' => {
                self.position += 1;
                self.bracket()
            }
            b'\\' => {
                self.position += 1;
                let escaped = self.escaped()?;
                Ok(Nfa::literal(escaped))
            }
            b'*' | b')' | b']' => Err(self.unexpected(byte)),
            b if UNSUPPORTED.contains(&b) => Err(RegexError::UnsupportedMetacharacter {
                position: self.position,
                found: char::from(b),
            }),
            b => {
                self.position += 1;
                Ok(Nfa::literal(b))
            }
        }
    }

    // Called just after a backslash.
    fn escaped(&mut self) -> Result<u8, RegexError> {
        match self.peek() {
            None => Err(self.end()),
            Some(b) if ESCAPABLE.contains(&b) => {
                self.position += 1;
                Ok(b)
            }
            Some(b) => Err(RegexError::InvalidEscape {
                position: self.position,
                found: char::from(b),
            }),
        }
    }

    // Called just after '['; consumes through the matching ']'.
    fn bracket<K: Clone>(&mut self) -> Result<Nfa<K>, RegexError> {
        let mut nfa: Option<Nfa<K>> = None;
        loop {
            let start_position = self.position;
            let from = match self.take() {
                None => return Err(self.end()),
                Some(b']') if nfa.is_some() => break,
                Some(b']') => {
                    self.position -= 1;
                    return Err(self.unexpected(b']'));
                }
                Some(b'\\') => self.escaped()?,
                Some(b) => b,
            };
            let to = if self.peek() == Some(b'-')
                && !matches!(self.pattern.get(self.position + 1), Some(b']') | None)
            {
                self.position += 1;
                match self.take() {
                    Some(b'\\') => self.escaped()?,
                    Some(b) => b,
                    None => return Err(self.end()),
                }
            } else {
                from
            };
            let item = Nfa::range(from, to).ok_or(RegexError::InvalidRange {
                position: start_position,
                from: char::from(from),
                to: char::from(to),
            })?;
            nfa = Some(match nfa {
                None => item,
                Some(items) => items.union(item),
            });
        }
        // The loop only breaks once at least one item was read.
        nfa.ok_or_else(|| self.end())
    }
}

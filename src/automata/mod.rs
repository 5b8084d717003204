//! Finite automata for the scanner generator.
//!
//! The pipeline is: each classification's regex is compiled into a Thompson NFA
//! tagged with its token kind, the NFAs are combined with a disjoint union,
//! determinized by subset construction (resolving kind conflicts by precedence),
//! and finally minimized by partition refinement.
//!
//! States are plain integer indices into flat tables everywhere, so composing and
//! renumbering automata never has to chase pointers.

use std::collections::BTreeMap;

mod dfa;
mod minimize;
mod nfa;
pub mod regex;

pub use dfa::Dfa;
pub use nfa::Nfa;
pub use regex::RegexError;

/// Index of a state within one automaton.
pub type StateId = usize;

/// A transition label. Epsilon sorts before every byte, so iterating over the
/// transition table visits epsilon moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    /// The empty move; never consumed from input.
    Epsilon,
    /// A single input byte.
    Byte(u8),
}

/// One entry of a lexical grammar: a regex, the kind it produces, and how strongly
/// it wins when another entry matches the same text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<K> {
    /// Source of the regex, in the dialect accepted by [`regex::compile`].
    pub regex: String,
    /// Kind assigned to text matched by `regex`.
    pub kind: K,
    /// Higher wins when several kinds accept the same text.
    pub precedence: u32,
}

impl<K> Classification<K> {
    /// Shorthand constructor.
    pub fn new(regex: impl Into<String>, kind: K, precedence: u32) -> Self {
        Classification {
            regex: regex.into(),
            kind,
            precedence,
        }
    }
}

/// Compile a list of classifications into one minimized DFA whose accepting
/// states carry the winning kind.
pub fn build_dfa<K: Clone + Ord + std::fmt::Debug>(
    classifications: &[Classification<K>],
) -> Result<Dfa<K>, RegexError> {
    let mut nfas = Vec::with_capacity(classifications.len());
    let mut precedence: BTreeMap<K, u32> = BTreeMap::new();
    for class in classifications {
        let nfa: Nfa<K> = regex::compile(&class.regex)?;
        nfas.push(nfa.with_kind(class.kind.clone()));
        let entry = precedence.entry(class.kind.clone()).or_insert(0);
        *entry = (*entry).max(class.precedence);
    }

    let nfa = Nfa::union_distinct(nfas);
    #[cfg(feature = "trace")]
    eprintln!(
        "[automata] combined NFA: {} states, {} accepting",
        nfa.num_states(),
        nfa.accepting().len()
    );

    let dfa = Dfa::from_nfa(&nfa, &precedence);
    #[cfg(feature = "trace")]
    eprintln!(
        "[automata] subset DFA: {} states, {} transitions",
        dfa.num_states(),
        dfa.num_transitions()
    );

    let minimized = dfa.minimize();
    #[cfg(feature = "trace")]
    eprintln!(
        "[automata] minimized DFA: {} states, {} transitions",
        minimized.num_states(),
        minimized.num_transitions()
    );
    Ok(minimized)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_precedence_conflict() {
        let dfa = build_dfa(&[
            Classification::new("a", "FIRST", 2),
            Classification::new("aa*", "SECOND", 1),
        ])
        .expect("valid regexes");
        assert_eq!(dfa.classify(b"a"), Some(&"FIRST"));
        assert_eq!(dfa.classify(b"aa"), Some(&"SECOND"));
        assert_eq!(dfa.classify(b"aaaa"), Some(&"SECOND"));
        assert_eq!(dfa.classify(b""), None);
        assert_eq!(dfa.classify(b"b"), None);
    }

    #[test]
    fn test_equal_precedence_prefers_registration_order() {
        let dfa = build_dfa(&[
            Classification::new("ab", "EARLY", 1),
            Classification::new("a(b|c)", "LATE", 1),
        ])
        .expect("valid regexes");
        assert_eq!(dfa.classify(b"ab"), Some(&"EARLY"));
        assert_eq!(dfa.classify(b"ac"), Some(&"LATE"));
    }

    #[test]
    fn test_bad_regex_is_reported() {
        let err = build_dfa(&[
            Classification::new("ok", "OK", 1),
            Classification::new("a+", "BAD", 1),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegexError::UnsupportedMetacharacter {
                position: 1,
                found: '+'
            }
        );
    }
}

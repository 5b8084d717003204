use std::collections::{BTreeMap, BTreeSet};

use super::{StateId, Symbol};

type TransitionTable = BTreeMap<Symbol, BTreeMap<StateId, BTreeSet<StateId>>>;

/// A nondeterministic automaton with epsilon moves.
///
/// States are numbered `0..num_states`. Fragments built by Thompson construction
/// always have `initial == 0` and `final_state == num_states - 1`; combined
/// automata from [`Nfa::union_distinct`] have several accepting states, each of
/// which may carry a token kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nfa<K> {
    transitions: TransitionTable,
    num_states: usize,
    initial: StateId,
    final_state: StateId,
    accepting: Vec<StateId>,
    kinds: BTreeMap<StateId, K>,
}

impl<K: Clone> Nfa<K> {
    // States 0..num_states with no transitions and nothing accepting.
    fn with_states(num_states: usize) -> Self {
        Nfa {
            transitions: BTreeMap::new(),
            num_states,
            initial: 0,
            final_state: num_states.saturating_sub(1),
            accepting: Vec::new(),
            kinds: BTreeMap::new(),
        }
    }

    /// Two states joined by a single transition on `byte`.
    pub fn literal(byte: u8) -> Self {
        let mut nfa = Self::with_states(2);
        nfa.add_transition(0, Symbol::Byte(byte), 1);
        nfa.accepting.push(1);
        nfa
    }

    /// Alternation of every byte in `from..=to`, in ascending order.
    /// An empty range (`from > to`) yields `None`.
    pub fn range(from: u8, to: u8) -> Option<Self> {
        (from..=to).map(Self::literal).reduce(Self::union)
    }

    fn add_transition(&mut self, from: StateId, symbol: Symbol, to: StateId) {
        self.transitions
            .entry(symbol)
            .or_default()
            .entry(from)
            .or_default()
            .insert(to);
    }

    // Copy `other`'s transitions into self, renumbered to start at `offset`.
    fn absorb(&mut self, other: &Nfa<K>, offset: usize) {
        for (symbol, by_source) in &other.transitions {
            for (from, targets) in by_source {
                for to in targets {
                    self.add_transition(from + offset, *symbol, to + offset);
                }
            }
        }
    }

    fn final_kind(&self) -> Option<&K> {
        self.kinds.get(&self.final_state)
    }

    /// `self` followed by `other`. The result accepts wherever `other` accepted.
    pub fn concat(self, other: Nfa<K>) -> Self {
        let offset = self.num_states;
        let mut nfa = Self::with_states(self.num_states + other.num_states);
        nfa.absorb(&self, 0);
        nfa.absorb(&other, offset);
        nfa.add_transition(self.final_state, Symbol::Epsilon, other.initial + offset);
        nfa.initial = self.initial;
        nfa.final_state = other.final_state + offset;
        nfa.accepting = other.accepting.iter().map(|s| s + offset).collect();
        nfa.kinds = other
            .kinds
            .into_iter()
            .map(|(s, kind)| (s + offset, kind))
            .collect();
        nfa
    }

    /// Either `self` or `other`, through a fresh initial and a fresh final state.
    /// The new final state inherits the first kind found on the operands' finals.
    pub fn union(self, other: Nfa<K>) -> Self {
        let left_offset = 1;
        let right_offset = 1 + self.num_states;
        let final_state = right_offset + other.num_states;
        let mut nfa = Self::with_states(final_state + 1);
        nfa.absorb(&self, left_offset);
        nfa.absorb(&other, right_offset);
        nfa.add_transition(0, Symbol::Epsilon, self.initial + left_offset);
        nfa.add_transition(0, Symbol::Epsilon, other.initial + right_offset);
        nfa.add_transition(self.final_state + left_offset, Symbol::Epsilon, final_state);
        nfa.add_transition(other.final_state + right_offset, Symbol::Epsilon, final_state);
        nfa.accepting.push(final_state);
        if let Some(kind) = self.final_kind().or_else(|| other.final_kind()) {
            nfa.kinds.insert(final_state, kind.clone());
        }
        nfa
    }

    /// Zero or more repetitions of `self`.
    pub fn kleene(self) -> Self {
        let offset = 1;
        let final_state = offset + self.num_states;
        let mut nfa = Self::with_states(final_state + 1);
        nfa.absorb(&self, offset);
        let inner_initial = self.initial + offset;
        let inner_final = self.final_state + offset;
        nfa.add_transition(0, Symbol::Epsilon, inner_initial);
        nfa.add_transition(0, Symbol::Epsilon, final_state);
        nfa.add_transition(inner_final, Symbol::Epsilon, inner_initial);
        nfa.add_transition(inner_final, Symbol::Epsilon, final_state);
        nfa.accepting.push(final_state);
        if let Some(kind) = self.final_kind() {
            nfa.kinds.insert(final_state, kind.clone());
        }
        nfa
    }

    /// Tag every accepting state with `kind`.
    pub fn with_kind(mut self, kind: K) -> Self {
        for state in &self.accepting {
            self.kinds.insert(*state, kind.clone());
        }
        self
    }

    /// Combine automata into one multi-root NFA: each participant is renumbered into
    /// its own range after a fresh initial state that has an epsilon move to every
    /// participant's initial. Accepting states and kinds are kept, in participant
    /// order.
    pub fn union_distinct(nfas: Vec<Nfa<K>>) -> Self {
        let total = 1 + nfas.iter().map(|n| n.num_states).sum::<usize>();
        let mut combined = Self::with_states(total);
        let mut offset = 1;
        for nfa in nfas {
            combined.absorb(&nfa, offset);
            combined.add_transition(0, Symbol::Epsilon, nfa.initial + offset);
            for state in &nfa.accepting {
                let state = state + offset;
                if !combined.accepting.contains(&state) {
                    combined.accepting.push(state);
                }
            }
            for (state, kind) in nfa.kinds {
                combined.kinds.insert(state + offset, kind);
            }
            offset += nfa.num_states;
        }
        combined
    }
}

impl<K> Nfa<K> {
    /// The start state.
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// The highest-numbered state, which is the accepting state of a Thompson fragment.
    pub fn final_state(&self) -> StateId {
        self.final_state
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Accepting states, in the order their classifiers were combined.
    pub fn accepting(&self) -> &[StateId] {
        &self.accepting
    }

    /// Token kind carried by an accepting state, if any.
    pub fn kind(&self, state: StateId) -> Option<&K> {
        self.kinds.get(&state)
    }

    /// Every byte with at least one transition, ascending.
    pub fn alphabet(&self) -> Vec<u8> {
        self.transitions
            .keys()
            .filter_map(|symbol| match symbol {
                Symbol::Byte(b) => Some(*b),
                Symbol::Epsilon => None,
            })
            .collect()
    }

    /// All states reachable from `states` through zero or more epsilon moves.
    pub fn epsilon_closure(&self, states: &BTreeSet<StateId>) -> BTreeSet<StateId> {
        let mut closure = states.clone();
        let epsilon = match self.transitions.get(&Symbol::Epsilon) {
            Some(e) => e,
            None => return closure,
        };
        let mut pending: Vec<StateId> = states.iter().copied().collect();
        while let Some(state) = pending.pop() {
            if let Some(targets) = epsilon.get(&state) {
                for target in targets {
                    if closure.insert(*target) {
                        pending.push(*target);
                    }
                }
            }
        }
        closure
    }

    /// States reachable from `states` by consuming exactly `byte` (no closure applied).
    pub fn step(&self, states: &BTreeSet<StateId>, byte: u8) -> BTreeSet<StateId> {
        let mut targets = BTreeSet::new();
        if let Some(by_source) = self.transitions.get(&Symbol::Byte(byte)) {
            for state in states {
                if let Some(to) = by_source.get(state) {
                    targets.extend(to.iter().copied());
                }
            }
        }
        targets
    }

    /// Whether the whole of `input` is in the automaton's language.
    pub fn accepts(&self, input: &[u8]) -> bool {
        let mut current = self.epsilon_closure(&BTreeSet::from([self.initial]));
        for byte in input {
            current = self.epsilon_closure(&self.step(&current, *byte));
            if current.is_empty() {
                return false;
            }
        }
        self.accepting.iter().any(|s| current.contains(s))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    type Plain = Nfa<&'static str>;

    #[test]
    fn test_literal() {
        let nfa = Plain::literal(b'a');
        assert_eq!(nfa.num_states(), 2);
        assert_eq!(nfa.initial(), 0);
        assert_eq!(nfa.final_state(), 1);
        assert!(nfa.accepts(b"a"));
        assert!(!nfa.accepts(b""));
        assert!(!nfa.accepts(b"aa"));
    }

    #[test]
    fn test_concat_renumbers_right_operand() {
        let nfa = Plain::literal(b'a').concat(Plain::literal(b'b'));
        assert_eq!(nfa.num_states(), 4);
        assert_eq!(nfa.initial(), 0);
        assert_eq!(nfa.final_state(), 3);
        assert_eq!(nfa.accepting(), &[3]);
        assert_eq!(
            nfa.epsilon_closure(&BTreeSet::from([1])),
            BTreeSet::from([1, 2])
        );
        assert!(nfa.accepts(b"ab"));
        assert!(!nfa.accepts(b"a"));
        assert!(!nfa.accepts(b"ba"));
    }

    #[test]
    fn test_union_and_kleene() {
        let nfa = Plain::literal(b'a').union(Plain::literal(b'b')).kleene();
        assert_eq!(nfa.final_state(), nfa.num_states() - 1);
        let inputs: [&[u8]; 5] = [b"", b"a", b"b", b"abba", b"bbbb"];
        for input in inputs {
            assert!(nfa.accepts(input), "{:?}", input);
        }
        assert!(!nfa.accepts(b"abc"));
        assert_eq!(nfa.alphabet(), vec![b'a', b'b']);
    }

    #[test]
    fn test_range() {
        let nfa = Plain::range(b'1', b'5').expect("non-empty range");
        assert!(nfa.accepts(b"1"));
        assert!(nfa.accepts(b"5"));
        assert!(!nfa.accepts(b"6"));
        assert!(!nfa.accepts(b"0"));
        assert_eq!(nfa.alphabet(), b"12345".to_vec());
        assert!(Plain::range(b'z', b'a').is_none());
    }

    #[test]
    fn test_kind_survives_composition() {
        let nfa = Plain::literal(b'a').with_kind("A").kleene();
        assert_eq!(nfa.kind(nfa.final_state()), Some(&"A"));
        let nfa = Plain::literal(b'x').concat(Plain::literal(b'y').with_kind("Y"));
        assert_eq!(nfa.kind(nfa.final_state()), Some(&"Y"));
        assert_eq!(nfa.kind(1), None);
    }

    #[test]
    fn test_union_distinct() {
        let first = Plain::literal(b'a').with_kind("A");
        let second = Plain::literal(b'b').concat(Plain::literal(b'c')).with_kind("BC");
        let nfa = Plain::union_distinct(vec![first, second]);
        assert_eq!(nfa.num_states(), 1 + 2 + 4);
        assert_eq!(nfa.initial(), 0);
        assert_eq!(nfa.accepting(), &[2, 6]);
        assert_eq!(nfa.kind(2), Some(&"A"));
        assert_eq!(nfa.kind(6), Some(&"BC"));
        assert_eq!(
            nfa.epsilon_closure(&BTreeSet::from([0])),
            BTreeSet::from([0, 1, 3])
        );
        assert!(nfa.accepts(b"a"));
        assert!(nfa.accepts(b"bc"));
        assert!(!nfa.accepts(b"b"));
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use super::{Nfa, StateId};

/// A deterministic automaton with a possibly partial transition function.
/// A missing transition means the input is rejected from that point on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dfa<K> {
    pub(super) transitions: BTreeMap<u8, BTreeMap<StateId, StateId>>,
    pub(super) num_states: usize,
    pub(super) initial: StateId,
    pub(super) accepting: BTreeSet<StateId>,
    pub(super) kinds: BTreeMap<StateId, K>,
}

impl<K> Dfa<K> {
    /// States `0..num_states`, nothing accepting and no transitions yet.
    pub fn new(num_states: usize, initial: StateId) -> Self {
        Dfa {
            transitions: BTreeMap::new(),
            num_states,
            initial,
            accepting: BTreeSet::new(),
            kinds: BTreeMap::new(),
        }
    }

    /// Set `from --byte--> to`, returning the target it replaced, if any.
    pub fn add_transition(&mut self, from: StateId, byte: u8, to: StateId) -> Option<StateId> {
        self.num_states = self.num_states.max(from + 1).max(to + 1);
        self.transitions.entry(byte).or_default().insert(from, to)
    }

    /// Mark `state` as accepting, optionally with a token kind.
    pub fn set_accepting(&mut self, state: StateId, kind: Option<K>) {
        self.num_states = self.num_states.max(state + 1);
        self.accepting.insert(state);
        match kind {
            Some(kind) => {
                self.kinds.insert(state, kind);
            }
            None => {
                self.kinds.remove(&state);
            }
        }
    }

    /// The start state.
    pub fn initial(&self) -> StateId {
        self.initial
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.num_states
    }

    /// Total number of defined transitions.
    pub fn num_transitions(&self) -> usize {
        self.transitions.values().map(BTreeMap::len).sum()
    }

    /// Every byte with at least one transition, ascending.
    pub fn alphabet(&self) -> Vec<u8> {
        self.transitions.keys().copied().collect()
    }

    /// Accepting states, ascending.
    pub fn accepting(&self) -> &BTreeSet<StateId> {
        &self.accepting
    }

    /// Whether `state` is accepting.
    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.contains(&state)
    }

    /// Token kind of an accepting state.
    pub fn kind(&self, state: StateId) -> Option<&K> {
        self.kinds.get(&state)
    }

    /// Follow the transition on `byte`, if there is one.
    pub fn step(&self, state: StateId, byte: u8) -> Option<StateId> {
        self.transitions.get(&byte)?.get(&state).copied()
    }

    fn run(&self, input: &[u8]) -> Option<StateId> {
        input
            .iter()
            .try_fold(self.initial, |state, byte| self.step(state, *byte))
    }

    /// Whether the whole of `input` is in the automaton's language.
    pub fn accepts(&self, input: &[u8]) -> bool {
        self.run(input).map_or(false, |s| self.is_accepting(s))
    }

    /// Token kind of the whole of `input`, if it is accepted with one.
    pub fn classify(&self, input: &[u8]) -> Option<&K> {
        self.run(input).and_then(|s| self.kind(s))
    }
}

impl<K: Clone + Ord> Dfa<K> {
    /// Subset construction.
    ///
    /// DFA states are numbered in the order their NFA state sets are discovered,
    /// exploring breadth-first with the alphabet in ascending byte order, so the
    /// numbering is reproducible. A DFA state accepts iff its set contains an
    /// accepting NFA state; its kind is that of the member with the highest
    /// precedence (kinds missing from `precedence` count as 0), ties going to the
    /// NFA accepting state listed first.
    pub fn from_nfa(nfa: &Nfa<K>, precedence: &BTreeMap<K, u32>) -> Self {
        let alphabet = nfa.alphabet();
        let start = nfa.epsilon_closure(&BTreeSet::from([nfa.initial()]));

        let mut sets: Vec<BTreeSet<StateId>> = vec![start.clone()];
        let mut index: HashMap<BTreeSet<StateId>, StateId> = HashMap::from([(start, 0)]);
        let mut worklist: VecDeque<StateId> = VecDeque::from([0]);
        let mut dfa = Dfa::new(1, 0);

        while let Some(from) = worklist.pop_front() {
            for byte in &alphabet {
                let target = nfa.epsilon_closure(&nfa.step(&sets[from], *byte));
                if target.is_empty() {
                    continue;
                }
                let to = match index.get(&target) {
                    Some(to) => *to,
                    None => {
                        let to = sets.len();
                        index.insert(target.clone(), to);
                        sets.push(target);
                        worklist.push_back(to);
                        to
                    }
                };
                dfa.add_transition(from, *byte, to);
            }
        }
        dfa.num_states = sets.len();

        for (state, set) in sets.iter().enumerate() {
            let mut best: Option<(u32, Option<&K>)> = None;
            for accept in nfa.accepting().iter().filter(|s| set.contains(s)) {
                let kind = nfa.kind(*accept);
                let rank = kind.and_then(|k| precedence.get(k)).copied().unwrap_or(0);
                if best.map_or(true, |(best_rank, _)| rank > best_rank) {
                    best = Some((rank, kind));
                }
            }
            if let Some((_, kind)) = best {
                dfa.set_accepting(state, kind.cloned());
            }
        }
        dfa
    }
}

use std::collections::{BTreeMap, BTreeSet};

use super::{Dfa, StateId};

impl<K: Clone + Ord> Dfa<K> {
    /// Hopcroft-style partition refinement.
    ///
    /// The initial partition has one class per distinct accepting kind plus one class
    /// of non-accepting states. Refinement runs over the DFA completed with an
    /// implicit dead state; the class of states equivalent to the dead state is
    /// dropped from the result, so missing transitions stay missing. Each remaining
    /// class becomes one state, numbered in partition order.
    pub fn minimize(&self) -> Dfa<K> {
        let alphabet = self.alphabet();
        let dead = self.num_states;
        let total = self.num_states + 1;
        let delta = |state: StateId, byte: u8| -> StateId {
            if state == dead {
                dead
            } else {
                self.step(state, byte).unwrap_or(dead)
            }
        };

        // inverse[i][q] = states p with delta(p, alphabet[i]) == q
        let mut inverse: Vec<Vec<Vec<StateId>>> = vec![vec![Vec::new(); total]; alphabet.len()];
        for (i, byte) in alphabet.iter().enumerate() {
            for p in 0..total {
                inverse[i][delta(p, *byte)].push(p);
            }
        }

        let mut partition = self.initial_partition(dead);
        let mut worklist = partition.clone();

        while let Some(splitter) = worklist.pop() {
            for predecessors in &inverse {
                let x: BTreeSet<StateId> = splitter
                    .iter()
                    .flat_map(|q| predecessors[*q].iter().copied())
                    .collect();
                if x.is_empty() {
                    continue;
                }
                let mut refined = Vec::with_capacity(partition.len());
                for class in partition {
                    let inside: BTreeSet<StateId> = class.intersection(&x).copied().collect();
                    if inside.is_empty() || inside.len() == class.len() {
                        refined.push(class);
                        continue;
                    }
                    let outside: BTreeSet<StateId> = class.difference(&x).copied().collect();
                    if let Some(pos) = worklist.iter().position(|c| *c == class) {
                        worklist[pos] = inside.clone();
                        worklist.push(outside.clone());
                    } else if inside.len() <= outside.len() {
                        worklist.push(inside.clone());
                    } else {
                        worklist.push(outside.clone());
                    }
                    refined.push(inside);
                    refined.push(outside);
                }
                partition = refined;
            }
        }

        self.rebuild(&partition, dead, &alphabet)
    }

    fn initial_partition(&self, dead: StateId) -> Vec<BTreeSet<StateId>> {
        let mut by_kind: BTreeMap<Option<&K>, BTreeSet<StateId>> = BTreeMap::new();
        let mut rejecting = BTreeSet::from([dead]);
        for state in 0..self.num_states {
            if self.is_accepting(state) {
                by_kind.entry(self.kind(state)).or_default().insert(state);
            } else {
                rejecting.insert(state);
            }
        }
        let mut partition: Vec<BTreeSet<StateId>> = by_kind.into_values().collect();
        partition.push(rejecting);
        partition
    }

    fn rebuild(&self, partition: &[BTreeSet<StateId>], dead: StateId, alphabet: &[u8]) -> Dfa<K> {
        let mut class_of = vec![0; dead + 1];
        for (i, class) in partition.iter().enumerate() {
            for state in class {
                class_of[*state] = i;
            }
        }
        let dead_class = class_of[dead];
        if class_of[self.initial] == dead_class {
            // Nothing is accepted.
            return Dfa::new(1, 0);
        }

        let mut numbering = vec![None; partition.len()];
        let mut next = 0;
        for (i, slot) in numbering.iter_mut().enumerate() {
            if i != dead_class {
                *slot = Some(next);
                next += 1;
            }
        }

        let mut dfa = Dfa::new(next, 0);
        for (i, class) in partition.iter().enumerate() {
            let (state, representative) = match (numbering[i], class.iter().next()) {
                (Some(state), Some(rep)) => (state, *rep),
                _ => continue,
            };
            if class_of[self.initial] == i {
                dfa.initial = state;
            }
            for byte in alphabet {
                let target = match self.step(representative, *byte) {
                    Some(t) => t,
                    None => continue,
                };
                if let Some(to) = numbering[class_of[target]] {
                    dfa.add_transition(state, *byte, to);
                }
            }
            if let Some(accepting) = class.iter().find(|s| self.is_accepting(**s)) {
                dfa.set_accepting(state, self.kind(*accepting).cloned());
            }
        }
        dfa
    }
}

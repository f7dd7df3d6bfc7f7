//! Deterministic finite automata compiled from regular expressions.
//!
//! Compilation runs in three steps: the syntax tree is expanded into a
//! Thompson NFA, the NFA is determinised by subset construction over the
//! elementary character intervals leaving each state set, and states that
//! cannot reach an accepting state are pruned.
//!
//! After pruning every state either has outgoing transitions or is accepting,
//! so a walk that follows transitions can always stop on an accepting state.
//! The only exception is the initial state of an expression that matches
//! nothing, which is left non-accepting with no transitions.

use std::collections::{BTreeSet, VecDeque};

use indexmap::IndexSet;

use crate::charset::CharSet;
use crate::error::{RegexError, RegexResult};
use crate::parser::{self, Node};

/// Upper bound on NFA states created while expanding repetitions.
pub const STATE_LIMIT: usize = 200_000;

/// Upper bound on DFA states created by subset construction.
pub const DFA_STATE_LIMIT: usize = 10_000;

/// A labelled edge accepting any character in `min..=max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Transition {
    min: char,
    max: char,
    dest: usize,
}

impl Transition {
    /// Lowest accepted character.
    #[must_use]
    pub fn min(&self) -> char {
        self.min
    }

    /// Highest accepted character.
    #[must_use]
    pub fn max(&self) -> char {
        self.max
    }

    /// Destination state id.
    #[must_use]
    pub fn dest(&self) -> usize {
        self.dest
    }

    fn accepts(&self, c: char) -> bool {
        self.min <= c && c <= self.max
    }
}

/// An automaton state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    accept: bool,
    transitions: Vec<Transition>,
}

impl State {
    /// Whether a walk may stop here.
    #[must_use]
    pub fn is_accept(&self) -> bool {
        self.accept
    }

    /// Outgoing transitions sorted by `(min, max, dest)`.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }
}

/// A pruned DFA whose language is that of the source expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    states: Vec<State>,
}

impl Automaton {
    /// Compiles `regex` as written, without shorthand translation.
    ///
    /// # Errors
    ///
    /// Returns [`RegexError`] when the expression cannot be parsed or expands
    /// beyond [`STATE_LIMIT`] NFA or [`DFA_STATE_LIMIT`] DFA states.
    pub fn from_regex(regex: &str) -> RegexResult<Self> {
        let node = parser::parse(regex)?;
        Self::from_node(&node)
    }

    /// Compiles a syntax tree.
    ///
    /// # Errors
    ///
    /// Returns [`RegexError::TooComplex`] when expansion exceeds [`STATE_LIMIT`]
    /// or determinisation exceeds [`DFA_STATE_LIMIT`].
    pub fn from_node(node: &Node) -> RegexResult<Self> {
        let mut nfa = Nfa::default();
        let (start, end) = nfa.build(node)?;
        Ok(determinize(&nfa, start, end)?.pruned())
    }

    /// Id of the initial state; always `0`.
    #[must_use]
    pub fn initial_state(&self) -> usize {
        0
    }

    /// Looks up a state by id.
    #[must_use]
    pub fn state(&self, id: usize) -> Option<&State> {
        self.states.get(id)
    }

    pub(crate) fn states(&self) -> &[State] {
        &self.states
    }

    /// Number of states.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// Whether the automaton matches nothing at all.
    #[must_use]
    pub fn is_empty_language(&self) -> bool {
        !self
            .states
            .first()
            .is_some_and(|s| s.accept || !s.transitions.is_empty())
    }

    /// Whether `input` is in the language.
    #[must_use]
    pub fn accepts(&self, input: &str) -> bool {
        let mut current = self.initial_state();
        for c in input.chars() {
            let Some(state) = self.states.get(current) else {
                return false;
            };
            match state.transitions.iter().find(|t| t.accepts(c)) {
                Some(t) => current = t.dest,
                None => return false,
            }
        }
        self.states.get(current).is_some_and(State::is_accept)
    }

    fn pruned(self) -> Self {
        let live = self.live_states();
        if !live.contains(&0) {
            return Self {
                states: vec![State::default()],
            };
        }

        let mut renumber = vec![None; self.states.len()];
        for (new_id, &old_id) in live.iter().enumerate() {
            renumber[old_id] = Some(new_id);
        }

        let states = live
            .iter()
            .map(|&old_id| {
                let old = &self.states[old_id];
                let mut transitions: Vec<Transition> = old
                    .transitions
                    .iter()
                    .filter_map(|t| {
                        renumber[t.dest].map(|dest| Transition {
                            min: t.min,
                            max: t.max,
                            dest,
                        })
                    })
                    .collect();
                transitions.sort_unstable();
                State {
                    accept: old.accept,
                    transitions,
                }
            })
            .collect();
        Self { states }
    }

    /// States that can reach an accepting state, in ascending id order.
    fn live_states(&self) -> BTreeSet<usize> {
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); self.states.len()];
        for (id, state) in self.states.iter().enumerate() {
            for t in &state.transitions {
                incoming[t.dest].push(id);
            }
        }
        let mut live: BTreeSet<usize> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, s)| s.accept)
            .map(|(id, _)| id)
            .collect();
        let mut queue: VecDeque<usize> = live.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            for &pred in &incoming[id] {
                if live.insert(pred) {
                    queue.push_back(pred);
                }
            }
        }
        live
    }
}

#[derive(Debug, Default)]
struct NfaState {
    epsilon: Vec<usize>,
    edges: Vec<(u32, u32, usize)>,
}

#[derive(Debug, Default)]
struct Nfa {
    states: Vec<NfaState>,
}

impl Nfa {
    fn add_state(&mut self) -> RegexResult<usize> {
        if self.states.len() >= STATE_LIMIT {
            return Err(RegexError::TooComplex { limit: STATE_LIMIT });
        }
        self.states.push(NfaState::default());
        Ok(self.states.len() - 1)
    }

    fn epsilon(&mut self, from: usize, to: usize) {
        self.states[from].epsilon.push(to);
    }

    /// Builds a fragment for `node`, returning its entry and exit states.
    fn build(&mut self, node: &Node) -> RegexResult<(usize, usize)> {
        match node {
            Node::Empty => {
                let s = self.add_state()?;
                let e = self.add_state()?;
                self.epsilon(s, e);
                Ok((s, e))
            }
            Node::Class(set) => self.class(set),
            Node::Concat(items) => self.concat(items),
            Node::Alternate(branches) => {
                let s = self.add_state()?;
                let e = self.add_state()?;
                for branch in branches {
                    let (bs, be) = self.build(branch)?;
                    self.epsilon(s, bs);
                    self.epsilon(be, e);
                }
                Ok((s, e))
            }
            Node::Repeat { node, min, max } => self.repeat(node, *min, *max),
        }
    }

    fn class(&mut self, set: &CharSet) -> RegexResult<(usize, usize)> {
        let s = self.add_state()?;
        let e = self.add_state()?;
        self.states[s]
            .edges
            .extend(set.ranges().iter().map(|&(lo, hi)| (lo, hi, e)));
        Ok((s, e))
    }

    fn concat(&mut self, items: &[Node]) -> RegexResult<(usize, usize)> {
        let mut bounds: Option<(usize, usize)> = None;
        for item in items {
            let (is, ie) = self.build(item)?;
            bounds = Some(match bounds {
                None => (is, ie),
                Some((s, e)) => {
                    self.epsilon(e, is);
                    (s, ie)
                }
            });
        }
        match bounds {
            Some(b) => Ok(b),
            None => self.build(&Node::Empty),
        }
    }

    fn repeat(&mut self, node: &Node, min: u32, max: Option<u32>) -> RegexResult<(usize, usize)> {
        let s = self.add_state()?;
        let mut tail = s;
        for _ in 0..min {
            let (fs, fe) = self.build(node)?;
            self.epsilon(tail, fs);
            tail = fe;
        }
        match max {
            None => {
                let (fs, fe) = self.build(node)?;
                let e = self.add_state()?;
                self.epsilon(tail, fs);
                self.epsilon(tail, e);
                self.epsilon(fe, fs);
                self.epsilon(fe, e);
                Ok((s, e))
            }
            Some(max) => {
                let e = self.add_state()?;
                for _ in min..max {
                    let (fs, fe) = self.build(node)?;
                    self.epsilon(tail, fs);
                    self.epsilon(tail, e);
                    tail = fe;
                }
                self.epsilon(tail, e);
                Ok((s, e))
            }
        }
    }

    fn closure(&self, seeds: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut set = BTreeSet::new();
        let mut stack: Vec<usize> = seeds.into_iter().collect();
        while let Some(id) = stack.pop() {
            if set.insert(id) {
                stack.extend(self.states[id].epsilon.iter().copied());
            }
        }
        set
    }
}

fn determinize(nfa: &Nfa, start: usize, accept: usize) -> RegexResult<Automaton> {
    let mut sets: IndexSet<BTreeSet<usize>> = IndexSet::new();
    let mut states: Vec<State> = Vec::new();
    sets.insert(nfa.closure([start]));

    let mut next = 0;
    while next < sets.len() {
        let Some(current) = sets.get_index(next).cloned() else {
            break;
        };
        let edges: Vec<(u32, u32, usize)> = current
            .iter()
            .flat_map(|&id| nfa.states[id].edges.iter().copied())
            .collect();

        let mut cuts: Vec<u32> = edges
            .iter()
            .flat_map(|&(lo, hi, _)| [lo, hi + 1])
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut transitions: Vec<Transition> = Vec::new();
        for window in cuts.windows(2) {
            let (lo, hi) = (window[0], window[1] - 1);
            let targets: Vec<usize> = edges
                .iter()
                .filter(|&&(elo, ehi, _)| elo <= lo && hi <= ehi)
                .map(|&(_, _, dest)| dest)
                .collect();
            if targets.is_empty() {
                continue;
            }
            let (dest, _) = sets.insert_full(nfa.closure(targets));
            if sets.len() > DFA_STATE_LIMIT {
                return Err(RegexError::TooComplex {
                    limit: DFA_STATE_LIMIT,
                });
            }
            let (Some(min), Some(max)) = (char::from_u32(lo), char::from_u32(hi)) else {
                continue;
            };
            match transitions.last_mut() {
                Some(last) if last.dest == dest && u32::from(last.max) + 1 == lo => {
                    last.max = max;
                }
                _ => transitions.push(Transition { min, max, dest }),
            }
        }

        states.push(State {
            accept: current.contains(&accept),
            transitions,
        });
        next += 1;
    }

    Ok(Automaton { states })
}

//! Subset construction: builds a DFA from a unioned NFA, and the
//! longest-match executor with declaration-order, terminal-over-skip
//! tie-breaking.
use super::nfa::NfaMachine;
use crate::symbol::SymbolId;
use std::collections::{BTreeSet, HashMap, VecDeque};

#[derive(Debug, Clone, Default)]
pub struct DfaState {
  pub id:       u32,
  pub accepted: Vec<(SymbolId, bool)>,
  pub trans:    HashMap<u8, u32>,
}

impl DfaState {
  pub fn is_accepting(&self) -> bool {
    !self.accepted.is_empty()
  }
}

#[derive(Debug, Clone)]
pub struct DfaMachine {
  pub states: Vec<DfaState>,
  pub start:  u32,
}

fn eps_closure(nfa: &NfaMachine, seed: &BTreeSet<u32>) -> BTreeSet<u32> {
  let mut closure = seed.clone();
  let mut worklist: VecDeque<u32> = seed.iter().copied().collect();
  while let Some(s) = worklist.pop_front() {
    for &next in &nfa.states[s as usize].eps {
      if closure.insert(next) {
        worklist.push_back(next);
      }
    }
  }
  closure
}

fn accepted_for(nfa: &NfaMachine, set: &BTreeSet<u32>) -> Vec<(SymbolId, bool)> {
  let mut out: Vec<(SymbolId, bool)> = set.iter().filter_map(|&s| nfa.states[s as usize].accepted).collect();
  out.sort_by_key(|&(id, is_skip)| (is_skip, id.index()));
  out.dedup();
  out
}

impl DfaMachine {
  /// Builds the DFA whose states are ε-closed subsets of `nfa`'s states,
  /// exploring byte-by-byte as seen on the live state set.
  pub fn build(nfa: &NfaMachine) -> DfaMachine {
    let start_seed: BTreeSet<u32> = [nfa.start].into_iter().collect();
    let start_set = eps_closure(nfa, &start_seed);

    let mut states: Vec<DfaState> = Vec::new();
    let mut index: HashMap<BTreeSet<u32>, u32> = HashMap::new();
    let mut queue: VecDeque<BTreeSet<u32>> = VecDeque::new();

    let start_id = 0u32;
    index.insert(start_set.clone(), start_id);
    states.push(DfaState { id: start_id, accepted: accepted_for(nfa, &start_set), trans: HashMap::new() });
    queue.push_back(start_set);

    while let Some(set) = queue.pop_front() {
      let from_id = index[&set];
      let mut bytes: BTreeSet<u8> = BTreeSet::new();
      for &s in &set {
        bytes.extend(nfa.states[s as usize].byte_trans.keys().copied());
      }
      for b in bytes {
        let mut next: BTreeSet<u32> = BTreeSet::new();
        for &s in &set {
          if let Some(targets) = nfa.states[s as usize].byte_trans.get(&b) {
            next.extend(targets.iter().copied());
          }
        }
        let next_closed = eps_closure(nfa, &next);
        if next_closed.is_empty() {
          continue;
        }
        let to_id = match index.get(&next_closed) {
          Some(&id) => id,
          None => {
            let id = states.len() as u32;
            index.insert(next_closed.clone(), id);
            states.push(DfaState { id, accepted: accepted_for(nfa, &next_closed), trans: HashMap::new() });
            queue.push_back(next_closed);
            id
          }
        };
        states[from_id as usize].trans.insert(b, to_id);
      }
    }

    DfaMachine { states, start: start_id }
  }

  /// Runs the DFA over `input`, tracking the last accepting position seen.
  /// On mismatch or end-of-input, returns the symbol of lowest id among
  /// those accepted at that position, preferring terminals over skips, and
  /// the match length. `None` if no prefix of `input` was accepted.
  pub fn match_longest(&self, input: &[u8]) -> Option<(SymbolId, usize, bool)> {
    let mut state = self.start;
    let mut best = self.best_at(state, 0);
    for (i, &b) in input.iter().enumerate() {
      match self.states[state as usize].trans.get(&b) {
        Some(&next) => {
          state = next;
          if let Some(w) = self.best_at(state, i + 1) {
            best = Some(w);
          }
        }
        None => break,
      }
    }
    best
  }

  fn best_at(&self, state_id: u32, pos: usize) -> Option<(SymbolId, usize, bool)> {
    let st = &self.states[state_id as usize];
    st.accepted.first().map(|&(id, is_skip)| (id, pos, is_skip))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::regex::{nfa::build_pattern_machine, rpn::compile_string};
  use crate::symbol::CaseMode;

  #[test]
  fn matches_literal_prefix() {
    let instrs = compile_string("foo");
    let nfa = build_pattern_machine(&instrs, SymbolId::from(0u32), false, CaseMode::Match);
    let dfa = DfaMachine::build(&nfa);
    let (id, len, is_skip) = dfa.match_longest(b"foobar").unwrap();
    assert_eq!(id, SymbolId::from(0u32));
    assert_eq!(len, 3);
    assert!(!is_skip);
  }

  #[test]
  fn no_match_returns_none() {
    let instrs = compile_string("foo");
    let nfa = build_pattern_machine(&instrs, SymbolId::from(0u32), false, CaseMode::Match);
    let dfa = DfaMachine::build(&nfa);
    assert!(dfa.match_longest(b"bar").is_none());
  }
}

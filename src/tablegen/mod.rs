//! SLR(1) table construction: a direct, mostly unoptimized rendering of
//! the "Dragon Book" §4.7 algorithm (closure, goto, canonical collection
//! via BFS, FIRST/FOLLOW fixed point, then action-table construction with
//! precedence-driven conflict resolution).
//! Only SLR is implemented; [crate::options::ParserAlgorithm] still carries
//! the field so a future LALR/LR(1) backend can share this module's types.
use crate::{
  analyzer::{production::ProductionId, AnalyzedGrammar},
  error::{ErrorSink, YalrError},
  symbol::{Assoc, SymbolId},
};
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// A negative sentinel no real precedence (always `>= 0`) can collide with,
/// matching `low_prec` in `slr_tablegen.cpp`: an un-prec'd symbol loses
/// every precedence comparison against one that has a value.
const LOW_PREC: i64 = -99;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
  pub fn index(&self) -> usize {
    self.0 as usize
  }
}

impl From<usize> for StateId {
  fn from(v: usize) -> Self {
    Self(v as u32)
  }
}

/// An LR item: a production with a dot marking progress. Ordered by
/// production id then position so an [ItemSet] (a `BTreeSet`) gives a
/// canonical, hashable-by-value representation for state deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LrItem {
  pub production: ProductionId,
  pub position:   usize,
}

pub type ItemSet = BTreeSet<LrItem>;

/// Computes the closure of `items`: for every item whose dot sits just
/// before a rule symbol, add that rule's productions at position 0, and
/// repeat until no more items are introduced. A dot before a skip can never
/// occur (skips are rejected from rule alternatives in Pass II) and is an
/// internal-error condition here, not a user-facing one.
pub fn closure(grammar: &AnalyzedGrammar, items: &ItemSet) -> ItemSet {
  let mut retval = ItemSet::new();
  let mut queue: VecDeque<LrItem> = items.iter().copied().collect();
  let mut seen: HashSet<SymbolId> = HashSet::new();

  while let Some(item) = queue.pop_front() {
    if !retval.insert(item) {
      continue;
    }
    let prod = grammar.productions.get(item.production);
    if item.position >= prod.rhs.len() {
      continue;
    }
    let next_sym = prod.rhs[item.position].symbol;
    let entry = grammar.symbols.get(next_sym);
    if entry.is_rule() {
      if seen.insert(next_sym) {
        for p in grammar.productions.iter() {
          if p.lhs == next_sym {
            queue.push_back(LrItem { production: p.id, position: 0 });
          }
        }
      }
    }
    // Terminals contribute nothing further; skips cannot appear here.
  }
  retval
}

/// For every item in `items` whose dot sits immediately before `x`, advances
/// the dot one position and closes the result: the standard `goto(I, X)`.
pub fn goto_set(grammar: &AnalyzedGrammar, items: &ItemSet, x: SymbolId) -> ItemSet {
  let mut advanced = ItemSet::new();
  for item in items {
    let prod = grammar.productions.get(item.production);
    if item.position < prod.rhs.len() && prod.rhs[item.position].symbol == x {
      advanced.insert(LrItem { production: item.production, position: item.position + 1 });
    }
  }
  closure(grammar, &advanced)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
  Shift,
  Reduce,
  Accept,
}

#[derive(Debug, Clone, Copy)]
pub struct Action {
  pub kind:       ActionKind,
  pub state:      Option<StateId>,
  pub production: Option<ProductionId>,
}

/// The action a conflict lost to (or, for a resolved conflict, the one that
/// was displaced), carried alongside the winning [Action] for diagnosis.
#[derive(Debug, Clone, Copy)]
pub struct ConflictAction {
  pub action:   Action,
  pub resolved: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ActionEntry {
  pub action:   Action,
  pub conflict: Option<ConflictAction>,
}

#[derive(Debug, Clone)]
pub struct LrState {
  pub id:          StateId,
  pub items:       ItemSet,
  pub initial:     bool,
  pub transitions: BTreeMap<SymbolId, StateId>,
  pub actions:     BTreeMap<SymbolId, ActionEntry>,
  pub gotos:       BTreeMap<SymbolId, StateId>,
}

/// The complete constructed table: the LR state set plus the
/// FIRST/FOLLOW/epsilon sets table generation derives along the way.
#[derive(Debug, Clone)]
pub struct ParseTable {
  pub states:      Vec<LrState>,
  pub first_set:   BTreeMap<SymbolId, BTreeSet<SymbolId>>,
  pub follow_set:  BTreeMap<SymbolId, BTreeSet<SymbolId>>,
  pub epsilon:     BTreeSet<SymbolId>,
  pub target_prod: ProductionId,
  /// `false` if any shift/reduce conflict could not be resolved by
  /// precedence/associativity. A resolved conflict (shift/reduce broken by
  /// precedence, or any reduce/reduce tie) does not clear this flag to
  /// `false` on its own; only an unresolved shift/reduce conflict does.
  pub success:     bool,
}

fn addset(target: &mut BTreeSet<SymbolId>, source: &BTreeSet<SymbolId>) -> bool {
  let before = target.len();
  target.extend(source.iter().copied());
  target.len() != before
}

/// Textbook fixed-point FIRST/FOLLOW computation (Dragon Book §4.4),
/// grounded on `compute_first_and_follow` in `slr_tablegen.cpp`: FIRST of a
/// terminal is itself; FIRST/FOLLOW of a rule starts empty and grows until
/// nothing changes. The `$` terminal seeds FOLLOW of the target production's
/// LHS (the goal-prime rule).
fn compute_first_and_follow(grammar: &AnalyzedGrammar) -> (BTreeMap<SymbolId, BTreeSet<SymbolId>>, BTreeMap<SymbolId, BTreeSet<SymbolId>>, BTreeSet<SymbolId>) {
  let mut first_set: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
  let mut follow_set: BTreeMap<SymbolId, BTreeSet<SymbolId>> = BTreeMap::new();
  let mut epsilon: BTreeSet<SymbolId> = BTreeSet::new();

  let eoi = grammar.symbols.find("$").expect("finalize always adds $");
  let target_lhs = grammar.productions.get(grammar.target_prod).lhs;

  for entry in grammar.symbols.iter() {
    if entry.is_terminal() {
      first_set.insert(entry.id, BTreeSet::from([entry.id]));
    } else if entry.is_rule() {
      first_set.insert(entry.id, BTreeSet::new());
      let mut follow = BTreeSet::new();
      if entry.id == target_lhs {
        follow.insert(eoi);
      }
      follow_set.insert(entry.id, follow);
    }
  }

  let mut updated = true;
  while updated {
    updated = false;
    for prod in grammar.productions.iter() {
      let mut is_epsilon = true;
      for item in &prod.rhs {
        if let Some(symfirst) = first_set.get(&item.symbol).cloned() {
          if !symfirst.is_empty() {
            updated |= addset(first_set.get_mut(&prod.lhs).unwrap(), &symfirst);
          }
        }
        if !epsilon.contains(&item.symbol) {
          is_epsilon = false;
          break;
        }
      }
      if is_epsilon {
        updated |= epsilon.insert(prod.lhs);
      }

      // Follow-set propagation: walk the RHS right to left, tracking the
      // set that still needs to propagate backwards (`aux`).
      let mut aux: BTreeSet<SymbolId> = follow_set.get(&prod.lhs).cloned().unwrap_or_default();
      for item in prod.rhs.iter().rev() {
        let entry = grammar.symbols.get(item.symbol);
        if entry.is_rule() {
          updated |= addset(follow_set.entry(item.symbol).or_default(), &aux);
        }
        if epsilon.contains(&item.symbol) {
          if let Some(f) = first_set.get(&item.symbol) {
            aux.extend(f.iter().copied());
          }
        } else {
          aux = first_set.get(&item.symbol).cloned().unwrap_or_default();
        }
      }
    }
  }

  (first_set, follow_set, epsilon)
}

fn symbol_precedence(grammar: &AnalyzedGrammar, id: SymbolId) -> i64 {
  grammar.symbols.precedence_of(id).map(|p| p as i64).unwrap_or(LOW_PREC)
}

fn production_precedence(grammar: &AnalyzedGrammar, prod_id: ProductionId) -> i64 {
  grammar.productions.get(prod_id).precedence.map(|p| p as i64).unwrap_or(LOW_PREC)
}

/// Builds the canonical collection of LR(0) states, then overlays shift,
/// reduce, and accept actions with precedence-driven conflict resolution.
pub fn generate(grammar: &AnalyzedGrammar, errors: &mut ErrorSink) -> ParseTable {
  let (first_set, follow_set, epsilon) = compute_first_and_follow(grammar);

  let mut state_index: BTreeMap<ItemSet, usize> = BTreeMap::new();
  let mut states: Vec<LrState> = Vec::new();

  let initial_items = closure(grammar, &ItemSet::from([LrItem { production: grammar.target_prod, position: 0 }]));
  state_index.insert(initial_items.clone(), 0);
  states.push(LrState { id: StateId::from(0usize), items: initial_items, initial: true, transitions: BTreeMap::new(), actions: BTreeMap::new(), gotos: BTreeMap::new() });

  let mut queue: VecDeque<usize> = VecDeque::from([0usize]);
  let symbol_ids: Vec<SymbolId> = grammar.symbols.iter().filter(|e| !e.is_skip()).map(|e| e.id).collect();

  while let Some(state_idx) = queue.pop_front() {
    let items = states[state_idx].items.clone();
    for &x in &symbol_ids {
      let is = goto_set(grammar, &items, x);
      if is.is_empty() {
        continue;
      }
      let target_idx = match state_index.get(&is) {
        Some(&idx) => idx,
        None => {
          let idx = states.len();
          state_index.insert(is.clone(), idx);
          states.push(LrState { id: StateId::from(idx), items: is, initial: false, transitions: BTreeMap::new(), actions: BTreeMap::new(), gotos: BTreeMap::new() });
          queue.push_back(idx);
          idx
        }
      };
      states[state_idx].transitions.insert(x, StateId::from(target_idx));
    }
  }

  let eoi = grammar.symbols.find("$").expect("finalize always adds $");
  let mut unresolved = false;

  for state_idx in 0..states.len() {
    // Shifts first, "to ease precedence reporting" per the original: every
    // shift/reduce conflict below is discovered while the shift is already
    // in place.
    let transitions: Vec<(SymbolId, StateId)> = states[state_idx].transitions.iter().map(|(&s, &t)| (s, t)).collect();
    for (sym, target) in transitions {
      if grammar.symbols.get(sym).is_rule() {
        states[state_idx].gotos.insert(sym, target);
      } else {
        states[state_idx].actions.insert(sym, ActionEntry { action: Action { kind: ActionKind::Shift, state: Some(target), production: None }, conflict: None });
      }
    }

    let items: Vec<LrItem> = states[state_idx].items.iter().copied().collect();
    for item in items {
      let prod = grammar.productions.get(item.production);
      if item.position < prod.rhs.len() {
        continue;
      }
      if item.production == grammar.target_prod {
        states[state_idx].actions.insert(eoi, ActionEntry { action: Action { kind: ActionKind::Accept, state: None, production: None }, conflict: None });
        continue;
      }
      let follow = follow_set.get(&prod.lhs).cloned().unwrap_or_default();
      for sym in follow {
        if !grammar.symbols.get(sym).is_terminal() {
          continue;
        }
        match states[state_idx].actions.get(&sym).copied() {
          None => {
            states[state_idx].actions.insert(sym, ActionEntry { action: Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) }, conflict: None });
          }
          Some(existing) => {
            let sym_name = grammar.symbols.get(sym).name.clone();
            if existing.action.kind == ActionKind::Shift {
              let term_prec = symbol_precedence(grammar, sym);
              let prod_prec = production_precedence(grammar, item.production);
              let assoc = grammar.symbols.associativity_of(sym);
              let will_shift = term_prec > prod_prec || (term_prec == prod_prec && assoc == Assoc::Right);
              let will_reduce = prod_prec > term_prec || (term_prec == prod_prec && assoc == Assoc::Left);

              if !will_shift && !will_reduce {
                unresolved = true;
                errors.push(YalrError::UnresolvedConflict {
                  state:   state_idx as u32,
                  on:      sym_name,
                  message: format!("shift on {:?} conflicts with reduce by production {}", sym, item.production.index()),
                });
                let mut entry = existing;
                entry.conflict = Some(ConflictAction { action: Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) }, resolved: false });
                states[state_idx].actions.insert(sym, entry);
              } else if will_shift {
                errors.push(YalrError::ResolvedConflict {
                  state:   state_idx as u32,
                  on:      sym_name,
                  message: format!("shift wins over reduce by production {} (precedence)", item.production.index()),
                });
                let mut entry = existing;
                entry.conflict = Some(ConflictAction { action: Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) }, resolved: true });
                states[state_idx].actions.insert(sym, entry);
              } else {
                errors.push(YalrError::ResolvedConflict {
                  state:   state_idx as u32,
                  on:      sym_name,
                  message: format!("reduce by production {} wins over shift (precedence)", item.production.index()),
                });
                let new_action = Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) };
                states[state_idx].actions.insert(sym, ActionEntry { action: new_action, conflict: Some(ConflictAction { action: existing.action, resolved: true }) });
              }
            } else {
              // Reduce/reduce: strictly-greater precedence wins; a tie (or
              // neither side having precedence) keeps the earlier
              // (lower-id) production already in the table.
              let orig_prec = match existing.action.production {
                Some(p) => production_precedence(grammar, p),
                None => LOW_PREC,
              };
              let new_prec = production_precedence(grammar, item.production);
              errors.push(YalrError::ResolvedConflict {
                state:   state_idx as u32,
                on:      sym_name,
                message: format!("reduce/reduce conflict between productions {} and {}", existing.action.production.map(|p| p.index()).unwrap_or_default(), item.production.index()),
              });
              if new_prec > orig_prec {
                let new_action = Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) };
                states[state_idx].actions.insert(sym, ActionEntry { action: new_action, conflict: Some(ConflictAction { action: existing.action, resolved: true }) });
              } else {
                let mut entry = existing;
                entry.conflict = Some(ConflictAction { action: Action { kind: ActionKind::Reduce, state: None, production: Some(item.production) }, resolved: true });
                states[state_idx].actions.insert(sym, entry);
              }
            }
          }
        }
      }
    }
  }

  ParseTable { states, first_set, follow_set, epsilon, target_prod: grammar.target_prod, success: !unresolved }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analyzer::analyze;
  use crate::ast::*;
  use crate::error::ErrorSink;
  use crate::source::{SourceHandle, Token};

  fn tok(text: &str) -> Token {
    let h = SourceHandle::new("t", text.to_string());
    Token::new(h, 0, text.len())
  }

  #[test]
  fn sanity_grammar_has_no_conflicts_and_accepts() {
    let stmts = vec![
      Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     None,
        name:         tok("X"),
        alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok("foo")) }], prec: None, action: None }],
      }),
    ];
    let grammar = analyze(&stmts);
    assert!(grammar.success, "{:?}", grammar.errors);

    let mut errors = ErrorSink::new();
    let table = generate(&grammar, &mut errors);
    assert!(table.success);
    assert!(errors.is_empty());
    assert!(table.states.len() >= 2);

    let eoi = grammar.symbols.find("$").unwrap();
    let has_accept = table.states.iter().any(|s| matches!(s.actions.get(&eoi), Some(e) if e.action.kind == ActionKind::Accept));
    assert!(has_accept);
  }

  #[test]
  fn unresolved_shift_reduce_conflict_fails_generation() {
    let stmts = vec![Stmt::Rule(RuleStmt {
      is_goal:      true,
      type_str:     None,
      name:         tok("E"),
      alternatives: vec![
        AltStmt {
          items:  vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok("E")) }, ItemStmt { alias: None, symbol: SymbolRef::Named(tok("E")) }],
          prec:   None,
          action: None,
        },
        AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Literal(tok("'x'")) }], prec: None, action: None },
      ],
    })];
    let grammar = analyze(&stmts);
    assert!(grammar.success, "{:?}", grammar.errors);

    let mut errors = ErrorSink::new();
    let table = generate(&grammar, &mut errors);
    assert!(!table.success);
    assert!(errors.as_slice().iter().any(|e| matches!(e, YalrError::UnresolvedConflict { .. })));
  }
}

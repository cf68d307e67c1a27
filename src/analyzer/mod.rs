//! The two-pass semantic walk: Pass I populates the symbol table and
//! validates declarations; Pass II resolves alternative items,
//! precedence/associativity statements, and termset expansion. Finalization
//! then adds `$` and the synthetic goal-prime production.
pub mod pass1;
pub mod pass2;
pub mod production;

use crate::{
  ast::{PrecValue, Stmt},
  error::{ErrorSink, YalrError},
  options::OptionTable,
  source::Token,
  symbol::{Assoc, CaseMode, PatternKind, RuleData, SymbolId, SymbolKind, SymbolTable, TerminalData},
};
use production::{ProductionId, ProductionTable};
use std::collections::BTreeMap;

/// Owning pool for names this crate synthesizes itself: inline-terminal
/// token names, the goal-prime rule name.
#[derive(Debug, Default)]
pub struct AtomPool {
  atoms: Vec<String>,
}

impl AtomPool {
  pub fn push(&mut self, name: String) -> &str {
    self.atoms.push(name);
    self.atoms.last().unwrap()
  }

  pub fn len(&self) -> usize {
    self.atoms.len()
  }

  pub fn is_empty(&self) -> bool {
    self.atoms.is_empty()
  }
}

/// In-progress analysis state threaded through both passes. Consumed into
/// an [AnalyzedGrammar] once both passes (and finalization) complete.
pub struct Analysis {
  pub options:     OptionTable,
  pub symbols:     SymbolTable,
  pub productions: ProductionTable,
  pub errors:      ErrorSink,
  pub goal_rule:   Option<SymbolId>,
  pub verbatim:    BTreeMap<String, Vec<Token>>,
  pub atoms:       AtomPool,
}

impl Default for Analysis {
  fn default() -> Self {
    Self {
      options:     OptionTable::new(),
      symbols:     SymbolTable::new(),
      productions: ProductionTable::new(),
      errors:      ErrorSink::new(),
      goal_rule:   None,
      verbatim:    BTreeMap::new(),
      atoms:       AtomPool::default(),
    }
  }
}

/// The frozen result of analysis: read-only input to the table generator
/// from here on.
pub struct AnalyzedGrammar {
  pub options:     OptionTable,
  pub symbols:     SymbolTable,
  pub productions: ProductionTable,
  pub target_prod: ProductionId,
  pub verbatim:    BTreeMap<String, Vec<Token>>,
  pub errors:      Vec<YalrError>,
  pub success:     bool,
}

/// Registers an inline terminal for a single-quoted literal appearing
/// somewhere other than a rule alternative (a `@prec`/`associativity`/
/// `precedence`/`termset` reference): builds a synthetic
/// [crate::ast::TerminalStmt] for the literal and runs it back through
/// Pass I's terminal handler.
pub(crate) fn register_pattern_terminal(lit: &Token, out: &mut Analysis) -> SymbolId {
  pass1::add_inline_terminal(lit, out)
}

/// Resolves a [PrecValue] to a concrete precedence integer: a bare number is
/// used as-is; a named identifier or literal must already resolve to a
/// terminal carrying its own precedence.
pub(crate) fn resolve_precedence(value: &PrecValue, loc: &Token, symbols: &SymbolTable, errors: &mut ErrorSink) -> Option<u32> {
  match value {
    PrecValue::Number(n) => Some(*n),
    PrecValue::Named(tok) | PrecValue::Literal(tok) => match symbols.find(tok.text()) {
      Some(id) => match symbols.get(id).kind.as_terminal() {
        Some(t) => match t.precedence {
          Some(p) => Some(p),
          None => {
            errors.push(YalrError::UnknownSymbol { loc: loc.clone(), name: format!("{} (no precedence set)", tok.text()) });
            None
          }
        },
        None => {
          errors.push(YalrError::UnknownSymbol { loc: loc.clone(), name: tok.text().to_string() });
          None
        }
      },
      None => {
        errors.push(YalrError::UnknownSymbol { loc: loc.clone(), name: tok.text().to_string() });
        None
      }
    },
  }
}

fn resolve_assoc_kind(kind: crate::ast::AssocKind) -> Assoc {
  match kind {
    crate::ast::AssocKind::Left => Assoc::Left,
    crate::ast::AssocKind::Right => Assoc::Right,
  }
}

/// Applies a standalone `associativity (left|right) ITEM+;` or
/// `precedence (N|IDENT|'lit') ITEM+;` statement, run in Pass II once every
/// declaration-level symbol exists. An item may be a bare identifier (must
/// already be a terminal) or a single-quoted literal (auto-registered as an
/// inline terminal if not already declared).
pub(crate) fn apply_assoc_and_prec_stmts(stmts: &[Stmt], out: &mut Analysis) {
  for stmt in stmts {
    match stmt {
      Stmt::Associativity(a) => {
        let assoc = resolve_assoc_kind(a.kind);
        for item in &a.items {
          let id = resolve_or_register_terminal_ref(item, out);
          let Some(id) = id else { continue };
          if let Some(t) = out.symbols.get(id).kind.as_terminal() {
            if t.associativity != Assoc::Undef {
              out.errors.push(YalrError::AttributeAlreadySet {
                loc:       item.loc().clone(),
                name:      out.symbols.get(id).name.clone(),
                attribute: "associativity",
                first:     out.symbols.get(id).loc.clone(),
              });
              continue;
            }
          }
          out.symbols.set_associativity(id, assoc);
        }
      }
      Stmt::Precedence(p) => {
        let prec = resolve_precedence(&p.level, &p.loc, &out.symbols, &mut out.errors);
        let Some(prec) = prec else { continue };
        for item in &p.items {
          let id = resolve_or_register_terminal_ref(item, out);
          let Some(id) = id else { continue };
          if let Some(t) = out.symbols.get(id).kind.as_terminal() {
            if let Some(_existing) = t.precedence {
              out.errors.push(YalrError::DuplicatePrecedence {
                loc:   item.loc().clone(),
                name:  out.symbols.get(id).name.clone(),
                first: out.symbols.get(id).loc.clone(),
              });
              continue;
            }
          }
          out.symbols.set_precedence(id, prec);
        }
      }
      _ => {}
    }
  }
}

/// Resolves a [crate::ast::SymbolRef] that must name a terminal, registering
/// it as an inline terminal if it is a literal with no existing binding.
/// Reports [YalrError::UnknownSymbol] for a named reference that does not
/// exist, or a rule name used where a terminal is required.
pub(crate) fn resolve_or_register_terminal_ref(item: &crate::ast::SymbolRef, out: &mut Analysis) -> Option<SymbolId> {
  use crate::ast::SymbolRef;
  match item {
    SymbolRef::Named(tok) => match out.symbols.find(tok.text()) {
      Some(id) if out.symbols.get(id).is_terminal() => Some(id),
      Some(_) => {
        out.errors.push(YalrError::UnknownSymbol { loc: tok.clone(), name: format!("{} (not a terminal)", tok.text()) });
        None
      }
      None => {
        out.errors.push(YalrError::UnknownSymbol { loc: tok.clone(), name: tok.text().to_string() });
        None
      }
    },
    SymbolRef::Literal(tok) => {
      // `pattern_body` strips the surrounding quotes so the lookup key
      // matches both a non-inline terminal's registered alias and an
      // already-registered inline terminal's primary name.
      let (_, _, body) = pass1::pattern_body(tok);
      match out.symbols.find(body.text()) {
        Some(id) => Some(id),
        None => Some(register_pattern_terminal(tok, out)),
      }
    }
  }
}

/// Runs both passes plus finalization over `stmts`, producing a frozen
/// [AnalyzedGrammar]. Success requires an empty error list; hints/warnings
/// don't block success, only [crate::error::YalrErrorSeverity::Critical]
/// entries do.
pub fn analyze(stmts: &[Stmt]) -> AnalyzedGrammar {
  let mut out = Analysis::default();

  pass1::run(stmts, &mut out);
  apply_assoc_and_prec_stmts(stmts, &mut out);
  pass2::run(stmts, &mut out);
  pass2::check_unused(stmts, &mut out);

  let target_prod = finalize(&mut out);

  let success = out.errors.is_empty();
  AnalyzedGrammar {
    options: out.options,
    symbols: out.symbols,
    productions: out.productions,
    target_prod,
    verbatim: out.verbatim,
    errors: out.errors.into_vec(),
    success,
  }
}

/// Adds `$` and the synthetic goal-prime rule/production as the analyzer's
/// final action. Returns the target production id (always present: even on
/// a failed analysis, a placeholder production id `0` is unused since the
/// table generator never runs on a failed analysis, but a concrete value
/// keeps [AnalyzedGrammar] total).
fn finalize(out: &mut Analysis) -> ProductionId {
  let eoi = TerminalData {
    value_type:       None,
    pattern_text:     Token::synthetic(),
    pattern_kind:     PatternKind::String,
    case_mode:        CaseMode::Match,
    action:           None,
    associativity:    Assoc::Undef,
    precedence:       None,
    token_name:       "$".to_string(),
    is_inline:        false,
    compiled_pattern: None,
  };
  let (_, eoi_id) = out.symbols.add("$", Token::synthetic(), SymbolKind::Terminal(eoi));

  let Some(goal_id) = out.goal_rule else {
    // No goal rule: already recorded as YalrError::NoGoalRule in Pass I.
    // Still return a well-formed (unused) production id. Analysis has
    // already failed, so the table generator never runs on it.
    return out.productions.add(eoi_id, vec![], None, None, Token::synthetic());
  };

  let goal_name = out.symbols.get(goal_id).name.clone();
  let prime_name = out.atoms.push(format!("{}_prime", goal_name)).to_string();
  let prime_data = RuleData { value_type: Some("void".to_string()), is_goal: false, productions: vec![] };
  let (added, prime_id) = out.symbols.add(&prime_name, Token::synthetic(), SymbolKind::Rule(prime_data));
  debug_assert!(added, "synthetic goal-prime rule name must be fresh");

  let target_prod = out.productions.add(
    prime_id,
    vec![production::RhsItem { symbol: goal_id, alias: None, loc: Token::synthetic() }],
    None,
    None,
    Token::synthetic(),
  );
  out.symbols.attach_production(prime_id, target_prod.index() as u32);
  target_prod
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::*;

  fn tok(text: &str) -> Token {
    let h = crate::source::SourceHandle::new("t", text.to_string());
    Token::new(h, 0, text.len())
  }

  fn simple_goal(body: &str) -> Vec<Stmt> {
    vec![
      Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     None,
        name:         tok("X"),
        alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok(body)) }], prec: None, action: None }],
      }),
    ]
  }

  #[test]
  fn s1_sanity_three_productions_no_conflicts() {
    let stmts = simple_goal("foo");
    let grammar = analyze(&stmts);
    assert!(grammar.success, "{:?}", grammar.errors);
    // user production (X => foo) + synthetic goal-prime production.
    assert_eq!(grammar.productions.len(), 2);
    assert!(grammar.symbols.find("$").is_some());
  }

  #[test]
  fn missing_goal_rule_fails_analysis() {
    let stmts = vec![Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None })];
    let grammar = analyze(&stmts);
    assert!(!grammar.success);
  }
}

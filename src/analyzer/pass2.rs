//! Pass II: alternative/item resolution, termset expansion, and the
//! trailing unused-symbol sweep. Standalone `associativity`/
//! `precedence` statements are handled by
//! [super::apply_assoc_and_prec_stmts], run between Pass I and this pass so
//! every terminal carries its final precedence/associativity before an
//! alternative's implied precedence is computed.
use crate::{
  analyzer::{pass1, Analysis},
  ast::*,
  error::YalrError,
  source::Token,
  symbol::{Assoc, SymbolId, SymbolTable},
};
use std::collections::HashSet;

pub(super) fn run(stmts: &[Stmt], out: &mut Analysis) {
  for stmt in stmts {
    match stmt {
      Stmt::Rule(r) => add_rule_alternatives(r, out),
      Stmt::Termset(t) => add_termset_expansion(t, out),
      _ => {}
    }
  }
}

fn is_void_typed(symbols: &SymbolTable, id: SymbolId) -> bool {
  let entry = symbols.get(id);
  let value_type = match &entry.kind {
    crate::symbol::SymbolKind::Terminal(t) => &t.value_type,
    crate::symbol::SymbolKind::Rule(r) => &r.value_type,
    crate::symbol::SymbolKind::Skip(_) => return true,
  };
  match value_type {
    None => true,
    Some(ty) => ty == "void",
  }
}

/// Resolves one rule-alternative item: a named reference must exist and
/// must not name a skip; a literal auto-registers an inline terminal (or
/// resolves to one already registered under the same unquoted text).
fn resolve_rule_item_symbol(sym_ref: &SymbolRef, out: &mut Analysis) -> Option<SymbolId> {
  match sym_ref {
    SymbolRef::Named(tok) => match out.symbols.find_by_name(tok.text()) {
      Some(id) if out.symbols.get(id).is_skip() => {
        out.errors.push(YalrError::SkipInRule { loc: tok.clone(), name: tok.text().to_string() });
        None
      }
      Some(id) => Some(id),
      None => {
        out.errors.push(YalrError::UnknownSymbol { loc: tok.clone(), name: tok.text().to_string() });
        None
      }
    },
    SymbolRef::Literal(tok) => {
      let (_, _, body) = pass1::pattern_body(tok);
      match out.symbols.find(body.text()) {
        Some(id) => Some(id),
        None => Some(super::register_pattern_terminal(tok, out)),
      }
    }
  }
}

fn add_rule_alternatives(r: &RuleStmt, out: &mut Analysis) {
  let Some(lhs_id) = out.symbols.find_by_name(r.name.text()) else {
    // Pass I already recorded a DuplicateDefinition for this name; its
    // alternatives have no well-formed LHS to attach to.
    return;
  };

  for alt in &r.alternatives {
    let mut seen_aliases: HashSet<String> = HashSet::new();
    let mut rhs = Vec::with_capacity(alt.items.len());

    for item in &alt.items {
      let Some(sym_id) = resolve_rule_item_symbol(&item.symbol, out) else { continue };

      if let Some(alias_tok) = &item.alias {
        let alias = alias_tok.text().to_string();
        if !seen_aliases.insert(alias.clone()) {
          out.errors.push(YalrError::DuplicateAlias { loc: alias_tok.clone(), alias });
        } else if is_void_typed(&out.symbols, sym_id) {
          out.errors.push(YalrError::AliasOnVoid { loc: alias_tok.clone(), alias });
        }
      }

      rhs.push(crate::analyzer::production::RhsItem {
        symbol: sym_id,
        alias:  item.alias.as_ref().map(|t| t.text().to_string()),
        loc:    item.symbol.loc().clone(),
      });
    }

    // Implied precedence is the precedence of the right-most RHS terminal,
    // present or not, unless the alternative names its own `@prec`.
    let implied = rhs.iter().rev().find(|i| out.symbols.get(i.symbol).is_terminal()).and_then(|i| out.symbols.precedence_of(i.symbol));
    let precedence = match &alt.prec {
      Some(spec) => super::resolve_precedence(&spec.value, &spec.loc, &out.symbols, &mut out.errors),
      None => implied,
    };

    let prod = out.productions.add(lhs_id, rhs, alt.action.clone(), precedence, r.name.clone());
    out.symbols.attach_production(lhs_id, prod.index() as u32);
  }
}

/// Expands a `termset` into one synthetic rule whose alternatives each wrap
/// a single referenced terminal: the termset's own `@assoc`/`@prec` are
/// propagated onto each referenced terminal (a second writer is reported
/// exactly like the standalone statements), and its type determines
/// whether the synthetic alternatives carry a dispatch action.
fn add_termset_expansion(t: &TermsetStmt, out: &mut Analysis) {
  let Some(lhs_id) = out.symbols.find_by_name(t.name.text()) else { return };

  let do_action = match &t.type_str {
    Some(tok) => tok.text() != "void",
    None => false,
  };
  if do_action && t.action.is_none() {
    out.errors.push(YalrError::MissingAction { loc: t.name.clone(), name: t.name.text().to_string() });
  }
  if !do_action && t.action.is_some() {
    out.errors.push(YalrError::VoidWithAction { loc: t.name.clone(), name: t.name.text().to_string() });
  }

  let assoc = t.assoc.as_ref().map(|(_, kind)| match kind {
    AssocKind::Left => Assoc::Left,
    AssocKind::Right => Assoc::Right,
  });
  let prec = t.prec.as_ref().and_then(|spec| super::resolve_precedence(&spec.value, &spec.loc, &out.symbols, &mut out.errors));

  for item_ref in &t.items {
    let Some(term_id) = super::resolve_or_register_terminal_ref(item_ref, out) else { continue };

    if let Some(a) = assoc {
      let existing = out.symbols.associativity_of(term_id);
      if existing != Assoc::Undef {
        out.errors.push(YalrError::AttributeAlreadySet {
          loc:       item_ref.loc().clone(),
          name:      out.symbols.get(term_id).name.clone(),
          attribute: "associativity",
          first:     out.symbols.get(term_id).loc.clone(),
        });
      } else {
        out.symbols.set_associativity(term_id, a);
      }
    }
    if let Some(p) = prec {
      if out.symbols.precedence_of(term_id).is_some() {
        out.errors.push(YalrError::DuplicatePrecedence {
          loc:   item_ref.loc().clone(),
          name:  out.symbols.get(term_id).name.clone(),
          first: out.symbols.get(term_id).loc.clone(),
        });
      } else {
        out.symbols.set_precedence(term_id, p);
      }
    }

    let action = if do_action { Some(Token::synthetic_with_text("return _v1;")) } else { None };
    let rhs = vec![crate::analyzer::production::RhsItem { symbol: term_id, alias: None, loc: item_ref.loc().clone() }];
    let precedence = prec.or_else(|| out.symbols.precedence_of(term_id));
    let prod = out.productions.add(lhs_id, rhs, action, precedence, t.name.clone());
    out.symbols.attach_production(lhs_id, prod.index() as u32);
  }
}

fn lookup_ref(item: &SymbolRef, symbols: &SymbolTable) -> Option<SymbolId> {
  match item {
    SymbolRef::Named(tok) => symbols.find_by_name(tok.text()),
    SymbolRef::Literal(tok) => {
      let (_, _, body) = pass1::pattern_body(tok);
      symbols.find(body.text())
    }
  }
}

/// A terminal or rule that never appears in a production's RHS, is not the
/// goal rule, and is never named by an `associativity`/`precedence`
/// statement earns a [YalrError::UnusedSymbol] hint. Additive and
/// non-failing: it never changes `success`.
pub(super) fn check_unused(stmts: &[Stmt], out: &mut Analysis) {
  let mut used: HashSet<SymbolId> = HashSet::new();
  for prod in out.productions.iter() {
    for item in &prod.rhs {
      used.insert(item.symbol);
    }
  }
  for stmt in stmts {
    match stmt {
      Stmt::Associativity(a) => {
        for item in &a.items {
          if let Some(id) = lookup_ref(item, &out.symbols) {
            used.insert(id);
          }
        }
      }
      Stmt::Precedence(p) => {
        for item in &p.items {
          if let Some(id) = lookup_ref(item, &out.symbols) {
            used.insert(id);
          }
        }
      }
      _ => {}
    }
  }
  if let Some(goal) = out.goal_rule {
    used.insert(goal);
  }

  let unused: Vec<(Token, String, &'static str)> = out
    .symbols
    .iter()
    .filter(|e| e.is_terminal() || e.is_rule())
    .filter(|e| !used.contains(&e.id))
    .map(|e| (e.loc.clone(), e.name.clone(), e.kind.kind_name()))
    .collect();
  for (loc, name, kind) in unused {
    out.errors.push(YalrError::UnusedSymbol { loc, name, kind });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::analyzer::analyze;

  fn tok(text: &str) -> Token {
    let h = crate::source::SourceHandle::new("t", text.to_string());
    Token::new(h, 0, text.len())
  }

  #[test]
  fn skip_referenced_from_rule_fails() {
    let stmts = vec![
      Stmt::Terminal(TerminalStmt { type_str: None, name: tok("A"), pattern: tok("'a'"), assoc: None, prec: None, case: None, action: None }),
      Stmt::Skip(SkipStmt { name: tok("WS"), pattern: tok(r"r:\s+"), case: None, assoc: None, prec: None, action: None }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     None,
        name:         tok("R"),
        alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok("WS")) }], prec: None, action: None }],
      }),
    ];
    let grammar = analyze(&stmts);
    assert!(!grammar.success);
    assert!(grammar.errors.iter().any(|e| matches!(e, YalrError::SkipInRule { .. })));
  }

  #[test]
  fn inline_literal_registers_fresh_terminal() {
    let stmts = vec![Stmt::Rule(RuleStmt {
      is_goal:      true,
      type_str:     None,
      name:         tok("A"),
      alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Literal(tok("'bar'")) }], prec: None, action: None }],
    })];
    let grammar = analyze(&stmts);
    assert!(grammar.success, "{:?}", grammar.errors);
    let id = grammar.symbols.find("bar").expect("inline terminal registered under its literal text");
    assert_eq!(grammar.symbols.get(id).token_name(), "0TERM1");
  }
}

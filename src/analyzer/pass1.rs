//! Pass I: symbol-table population and declaration-level checks.
//! Terminals, skips, rules, and termsets are all inserted here
//! (with their patterns already classified and compiled) so that Pass II
//! can resolve references to any of them regardless of declaration order.
use crate::{
  analyzer::Analysis,
  ast::*,
  error::{ErrorSink, YalrError},
  options::is_known_verbatim_location,
  regex::rpn,
  source::Token,
  symbol::*,
};
use std::rc::Rc;

/// Splits a pattern token's text into its kind, any case forced by the
/// mode prefix (`rm:`/`rf:`), and a sub-token over just the pattern body
/// (prefix and, for string patterns, surrounding quotes trimmed) so
/// syntax errors still resolve to the right source column. `pub(crate)`
/// rather than `pub(super)`: the emitter needs the same prefix/quote
/// stripping to render a terminal's clean pattern text.
pub(crate) fn pattern_body(tok: &Token) -> (PatternKind, Option<CaseMode>, Token) {
  let text = tok.text();
  let (kind, forced_case, prefix_len, trim_trailing) = if text.starts_with('\'') {
    (PatternKind::String, None, 1usize, 1usize)
  } else if text.starts_with("rm:") {
    (PatternKind::Regex, Some(CaseMode::Match), 3, 0)
  } else if text.starts_with("rf:") {
    (PatternKind::Regex, Some(CaseMode::Fold), 3, 0)
  } else if text.starts_with("r:") {
    (PatternKind::Regex, None, 2, 0)
  } else if text.starts_with("e:") {
    (PatternKind::Ecma, None, 2, 0)
  } else {
    (PatternKind::String, None, 0, 0)
  };
  let body_len = tok.len().saturating_sub(prefix_len + trim_trailing);
  let body = Token::new(tok.source_arc(), tok.offset() + prefix_len, body_len);
  (kind, forced_case, body)
}

/// Compiles a classified pattern body to its RPN form. `ecma` patterns
/// are a supplement pulled from the original implementation: they are
/// validated by the host language's own regex engine rather than this
/// engine's NFA/DFA (out of scope here) and so compile to `None`.
pub(super) fn compile_pattern(kind: PatternKind, body: &Token, errors: &mut ErrorSink) -> Option<CompiledPattern> {
  match kind {
    PatternKind::String => Some(Rc::new(rpn::compile_string(body.text()))),
    PatternKind::Regex => rpn::compile_regex(body, errors).map(Rc::new),
    PatternKind::Ecma => None,
  }
}

fn resolve_case(attribute: Option<CaseOverride>, forced_by_prefix: Option<CaseMode>, default_case: CaseMode) -> CaseMode {
  match attribute {
    Some(CaseOverride::Match) => CaseMode::Match,
    Some(CaseOverride::Fold) => CaseMode::Fold,
    None => forced_by_prefix.unwrap_or(default_case),
  }
}

fn resolve_type(type_str: &Option<Token>) -> (Option<String>, bool) {
  match type_str {
    Some(t) if t.text() == "@lexeme" => (Some("std::string".to_string()), true),
    Some(t) => (Some(t.text().to_string()), false),
    None => (None, false),
  }
}

pub(super) fn run(stmts: &[Stmt], out: &mut Analysis) {
  for stmt in stmts {
    match stmt {
      Stmt::Class(c) => {
        let name = match c.kind {
          ClassKind::Parser => "parser.class",
          ClassKind::Lexer => "lexer.class",
        };
        out.options.apply(c.name.clone(), name, c.name.text(), &mut out.errors);
      }
      Stmt::Namespace(n) => {
        out.options.apply(n.name.clone(), "code.namespace", n.name.text(), &mut out.errors);
      }
      Stmt::Option(o) => {
        out.options.apply(o.name.clone(), o.name.text(), o.value.text(), &mut out.errors);
      }
      Stmt::Verbatim(v) => {
        if is_known_verbatim_location(v.location.text()) {
          out.verbatim.entry(v.location.text().to_string()).or_default().push(v.action.clone());
        } else {
          out.errors.push(YalrError::UnknownVerbatimLocation { loc: v.location.clone(), name: v.location.text().to_string() });
        }
      }
      Stmt::Terminal(t) => add_terminal(t, out),
      Stmt::Skip(s) => add_skip(s, out),
      Stmt::Rule(r) => add_rule(r, out),
      Stmt::Termset(t) => add_termset(t, out),
      // Resolved in Pass II, once every declaration-level symbol exists.
      Stmt::Associativity(_) | Stmt::Precedence(_) => {}
    }
  }

  if out.goal_rule.is_none() {
    out.errors.push(YalrError::NoGoalRule);
  }
}

fn add_terminal(t: &TerminalStmt, out: &mut Analysis) {
  let (type_str, is_lexeme) = resolve_type(&t.type_str);
  if is_lexeme && t.action.is_some() {
    out.errors.push(YalrError::LexemeWithAction { loc: t.name.clone(), name: t.name.text().to_string() });
  } else if !is_lexeme {
    if let Some(ty) = &type_str {
      if ty != "void" && t.action.is_none() {
        out.errors.push(YalrError::MissingAction { loc: t.name.clone(), name: t.name.text().to_string() });
      }
    }
  }
  let action = if is_lexeme { Some(Token::synthetic_with_text("return std::move(lexeme);")) } else { t.action.clone() };

  let (kind, forced_case, body) = pattern_body(&t.pattern);
  let case_mode = resolve_case(t.case, forced_case, out.options.lexer_case());
  let compiled = compile_pattern(kind, &body, &mut out.errors);

  let assoc = match &t.assoc {
    Some((_, AssocKind::Left)) => Assoc::Left,
    Some((_, AssocKind::Right)) => Assoc::Right,
    None => Assoc::Undef,
  };
  // A `@prec` value may name another terminal by identifier or literal,
  // which might not exist yet at this point in the statement list; all
  // precedence resolution (inline `@prec`, alternative `@prec`, `termset`,
  // and the standalone `precedence` statement) happens uniformly in Pass
  // II, once every declaration-level symbol is in the table.
  let precedence = None;

  let data = TerminalData {
    value_type: type_str,
    pattern_text: t.pattern.clone(),
    pattern_kind: kind,
    case_mode,
    action,
    associativity: assoc,
    precedence,
    token_name: t.name.text().to_string(),
    is_inline: false,
    compiled_pattern: compiled.clone(),
  };
  let (inserted, id) = out.symbols.add(t.name.text(), t.name.clone(), SymbolKind::Terminal(data));
  if !inserted {
    out.errors.push(YalrError::DuplicateDefinition { loc: t.name.clone(), name: t.name.text().to_string(), existing_kind: out.symbols.get(id).kind.kind_name() });
    return;
  }
  if kind == PatternKind::String {
    let (registered, _) = out.symbols.register_key(body.text(), id);
    if !registered {
      out.errors.push(YalrError::DuplicatePattern { loc: t.pattern.clone(), pattern: body.text().to_string() });
    }
  }
  out.symbols.mark_patterns_classified();
  out.options.freeze_lexer_case();
  if let Some(c) = compiled {
    out.symbols.set_compiled_pattern(id, c);
  }
}

fn add_skip(s: &SkipStmt, out: &mut Analysis) {
  if s.assoc.is_some() {
    out.errors.push(YalrError::SkipWithDisallowedAttribute { loc: s.name.clone(), name: s.name.text().to_string(), attribute: "associativity" });
  }
  if s.prec.is_some() {
    out.errors.push(YalrError::SkipWithDisallowedAttribute { loc: s.name.clone(), name: s.name.text().to_string(), attribute: "precedence" });
  }
  if s.action.is_some() {
    out.errors.push(YalrError::SkipWithDisallowedAttribute { loc: s.name.clone(), name: s.name.text().to_string(), attribute: "action" });
  }

  let (kind, forced_case, body) = pattern_body(&s.pattern);
  let case_mode = resolve_case(s.case, forced_case, out.options.lexer_case());
  let compiled = compile_pattern(kind, &body, &mut out.errors);

  let data = SkipData {
    pattern_text: s.pattern.clone(),
    pattern_kind: kind,
    case_mode,
    token_name: s.name.text().to_string(),
    compiled_pattern: compiled.clone(),
  };
  let (inserted, id) = out.symbols.add(s.name.text(), s.name.clone(), SymbolKind::Skip(data));
  if !inserted {
    out.errors.push(YalrError::DuplicateDefinition { loc: s.name.clone(), name: s.name.text().to_string(), existing_kind: out.symbols.get(id).kind.kind_name() });
    return;
  }
  if kind == PatternKind::String {
    let (registered, _) = out.symbols.register_key(body.text(), id);
    if !registered {
      out.errors.push(YalrError::DuplicatePattern { loc: s.pattern.clone(), pattern: body.text().to_string() });
    }
  }
  out.symbols.mark_patterns_classified();
  out.options.freeze_lexer_case();
  if let Some(c) = compiled {
    out.symbols.set_compiled_pattern(id, c);
  }
}

fn add_rule(r: &RuleStmt, out: &mut Analysis) {
  let (type_str, _) = resolve_type(&r.type_str);
  let data = RuleData { value_type: type_str, is_goal: r.is_goal, productions: vec![] };
  let (inserted, id) = out.symbols.add(r.name.text(), r.name.clone(), SymbolKind::Rule(data));
  if !inserted {
    out.errors.push(YalrError::DuplicateDefinition { loc: r.name.clone(), name: r.name.text().to_string(), existing_kind: out.symbols.get(id).kind.kind_name() });
    return;
  }
  if r.is_goal {
    match out.goal_rule {
      Some(first) => out.errors.push(YalrError::DuplicateGoal { loc: r.name.clone(), name: r.name.text().to_string(), first: out.symbols.get(first).loc.clone() }),
      None => out.goal_rule = Some(id),
    }
  }
}

/// Registers a single-quoted literal appearing outside a normal `term`
/// declaration (in a rule alternative, a `termset`, or a standalone
/// `associativity`/`precedence` statement) as a fresh inline terminal. The
/// symbol's *name* is the literal's unquoted text (so later literal
/// references resolve it by name, the same namespace a non-inline
/// terminal's pattern alias shares), while its emitted token name is a
/// fresh `0TERMn` drawn from the atom pool.
pub(super) fn add_inline_terminal(lit: &Token, out: &mut Analysis) -> SymbolId {
  let (kind, forced_case, body) = pattern_body(lit);
  debug_assert_eq!(kind, PatternKind::String, "inline terminals are always single-quoted literals");
  let case_mode = resolve_case(None, forced_case, out.options.lexer_case());
  let compiled = compile_pattern(kind, &body, &mut out.errors);

  let token_name = format!("0TERM{}", out.atoms.len() + 1);
  out.atoms.push(token_name.clone());

  let data = TerminalData {
    value_type: None,
    pattern_text: lit.clone(),
    pattern_kind: kind,
    case_mode,
    action: None,
    associativity: Assoc::Undef,
    precedence: None,
    token_name,
    is_inline: true,
    compiled_pattern: compiled.clone(),
  };
  let (inserted, id) = out.symbols.add(body.text(), lit.clone(), SymbolKind::Terminal(data));
  if !inserted {
    return id;
  }
  out.symbols.mark_patterns_classified();
  out.options.freeze_lexer_case();
  if let Some(c) = compiled {
    out.symbols.set_compiled_pattern(id, c);
  }
  id
}

fn add_termset(t: &TermsetStmt, out: &mut Analysis) {
  let (type_str, _) = resolve_type(&t.type_str);
  let data = RuleData { value_type: type_str, is_goal: false, productions: vec![] };
  let (inserted, id) = out.symbols.add(t.name.text(), t.name.clone(), SymbolKind::Rule(data));
  if !inserted {
    out.errors.push(YalrError::DuplicateDefinition { loc: t.name.clone(), name: t.name.text().to_string(), existing_kind: out.symbols.get(id).kind.kind_name() });
  }
}

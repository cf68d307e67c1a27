//! End-to-end scenarios exercising the public `analyze -> generate_table ->
//! build_template_data` pipeline over hand-built statement lists (no DSL
//! scanner/parser lives in this crate; see [yalr_core::ast]).
use yalr_core::{
  analyze,
  ast::*,
  error::{ErrorSink, YalrError},
  generate_table,
  regex::{dfa::DfaMachine, nfa::build_pattern_machine, rpn::compile_regex},
  source::{SourceHandle, Token},
  symbol::CaseMode,
  tablegen::ActionKind,
};

fn tok(text: &str) -> Token {
  let h = SourceHandle::new("t", text.to_string());
  Token::new(h, 0, text.len())
}

fn named(name: &str) -> SymbolRef {
  SymbolRef::Named(tok(name))
}

fn item(name: &str) -> ItemStmt {
  ItemStmt { alias: None, symbol: named(name) }
}

/// S1: a minimal grammar (one terminal, one goal rule with one
/// alternative) analyzes cleanly and produces an accepting table with no
/// conflicts.
#[test]
fn s1_sanity_grammar_accepts() {
  let stmts = vec![
    Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None }),
    Stmt::Rule(RuleStmt { is_goal: true, type_str: None, name: tok("X"), alternatives: vec![AltStmt { items: vec![item("foo")], prec: None, action: None }] }),
  ];
  let grammar = analyze(&stmts);
  assert!(grammar.success, "{:?}", grammar.errors);

  let mut errors = ErrorSink::new();
  let table = generate_table(&grammar, &mut errors);
  assert!(table.success);
  assert!(errors.is_empty());

  let eoi = grammar.symbols.find("$").unwrap();
  assert!(table.states.iter().any(|s| matches!(s.actions.get(&eoi), Some(e) if e.action.kind == ActionKind::Accept)));
}

/// S2: a classic `E -> E + E | E * E | NUM` grammar with `*` binding
/// tighter than `+` and both left-associative resolves every shift/reduce
/// conflict by precedence, with no unresolved conflicts surviving.
#[test]
fn s2_precedence_resolves_expression_grammar() {
  let stmts = vec![
    Stmt::Terminal(TerminalStmt {
      type_str: None,
      name:     tok("PLUS"),
      pattern:  tok("'+'"),
      assoc:    Some((tok("left"), AssocKind::Left)),
      prec:     Some(PrecSpec { loc: tok("1"), value: PrecValue::Number(1) }),
      case:     None,
      action:   None,
    }),
    Stmt::Terminal(TerminalStmt {
      type_str: None,
      name:     tok("STAR"),
      pattern:  tok("'*'"),
      assoc:    Some((tok("left"), AssocKind::Left)),
      prec:     Some(PrecSpec { loc: tok("2"), value: PrecValue::Number(2) }),
      case:     None,
      action:   None,
    }),
    Stmt::Terminal(TerminalStmt { type_str: None, name: tok("NUM"), pattern: tok(r"r:[0-9]+"), assoc: None, prec: None, case: None, action: None }),
    Stmt::Rule(RuleStmt {
      is_goal:      true,
      type_str:     None,
      name:         tok("E"),
      alternatives: vec![
        AltStmt { items: vec![item("E"), item("PLUS"), item("E")], prec: None, action: None },
        AltStmt { items: vec![item("E"), item("STAR"), item("E")], prec: None, action: None },
        AltStmt { items: vec![item("NUM")], prec: None, action: None },
      ],
    }),
  ];
  let grammar = analyze(&stmts);
  assert!(grammar.success, "{:?}", grammar.errors);

  let mut errors = ErrorSink::new();
  let table = generate_table(&grammar, &mut errors);
  assert!(table.success, "every shift/reduce conflict should resolve by precedence/associativity");
  assert!(errors.as_slice().iter().any(|e| matches!(e, YalrError::ResolvedConflict { .. })), "a classic ambiguous expression grammar has resolved conflicts to report");
  assert!(!errors.as_slice().iter().any(|e| matches!(e, YalrError::UnresolvedConflict { .. })));
}

/// S3: a single-quoted literal used directly in a rule alternative,
/// without a matching `term` declaration, auto-registers as a fresh
/// inline terminal carrying a synthesized `0TERMn` token name.
#[test]
fn s3_inline_literal_auto_registers_a_terminal() {
  let stmts = vec![Stmt::Rule(RuleStmt {
    is_goal:      true,
    type_str:     None,
    name:         tok("A"),
    alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Literal(tok("'bar'")) }], prec: None, action: None }],
  })];
  let grammar = analyze(&stmts);
  assert!(grammar.success, "{:?}", grammar.errors);

  let id = grammar.symbols.find("bar").expect("inline terminal registers under its unquoted literal text");
  assert!(grammar.symbols.get(id).is_terminal());
  assert_eq!(grammar.symbols.get(id).token_name(), "0TERM1");
}

/// S4: a rule alternative referencing a `skip`-kind symbol is rejected.
/// Skips are consumed by the lexer and can never appear in a parse.
#[test]
fn s4_skip_referenced_from_rule_fails_analysis() {
  let stmts = vec![
    Stmt::Terminal(TerminalStmt { type_str: None, name: tok("A"), pattern: tok("'a'"), assoc: None, prec: None, case: None, action: None }),
    Stmt::Skip(SkipStmt { name: tok("WS"), pattern: tok(r"r:\s+"), case: None, assoc: None, prec: None, action: None }),
    Stmt::Rule(RuleStmt { is_goal: true, type_str: None, name: tok("R"), alternatives: vec![AltStmt { items: vec![item("WS")], prec: None, action: None }] }),
  ];
  let grammar = analyze(&stmts);
  assert!(!grammar.success);
  assert!(grammar.errors.iter().any(|e| matches!(e, YalrError::SkipInRule { .. })));
}

/// S5: the negated character-class pattern `[^a-dF-I]+` matches any
/// non-empty run of bytes outside `a`-`d` and `F`-`I`, and rejects input
/// that starts inside either excluded range.
#[test]
fn s5_negated_character_class_matches_and_rejects() {
  use yalr_core::symbol::SymbolId;

  let pattern = tok("[^a-dF-I]+");
  let mut errors = ErrorSink::new();
  let instrs = compile_regex(&pattern, &mut errors).expect("pattern compiles");
  assert!(errors.is_empty());

  let nfa = build_pattern_machine(&instrs, SymbolId::from(0u32), false, CaseMode::Match);
  let dfa = DfaMachine::build(&nfa);

  let (id, len, is_skip) = dfa.match_longest(b"xyz123").expect("letters/digits outside the excluded ranges match");
  assert_eq!(id, SymbolId::from(0u32));
  assert_eq!(len, 6);
  assert!(!is_skip);

  assert!(dfa.match_longest(b"a").is_none(), "'a' falls inside the excluded a-d range");
  assert!(dfa.match_longest(b"F").is_none(), "'F' falls inside the excluded F-I range");

  let (_, stop_len, _) = dfa.match_longest(b"xyzF").expect("the leading run before the excluded byte still matches");
  assert_eq!(stop_len, 3, "match stops once an excluded byte ('F') is reached");
}

/// S6: the classic ambiguous `E -> E E | 'x'` grammar carries an
/// unresolvable shift/reduce conflict (neither alternative has
/// precedence), so table generation reports failure while still
/// returning a fully-formed, dumpable state set.
#[test]
fn s6_unresolved_conflict_fails_generation_but_still_dumps_states() {
  let stmts = vec![Stmt::Rule(RuleStmt {
    is_goal:      true,
    type_str:     None,
    name:         tok("E"),
    alternatives: vec![
      AltStmt { items: vec![item("E"), item("E")], prec: None, action: None },
      AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Literal(tok("'x'")) }], prec: None, action: None },
    ],
  })];
  let grammar = analyze(&stmts);
  assert!(grammar.success, "{:?}", grammar.errors);

  let mut errors = ErrorSink::new();
  let table = generate_table(&grammar, &mut errors);
  assert!(!table.success);
  assert!(errors.as_slice().iter().any(|e| matches!(e, YalrError::UnresolvedConflict { .. })));
  assert!(!table.states.is_empty(), "a failed table generation still yields a dumpable state set");
}

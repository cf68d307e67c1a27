//! Target-agnostic code-generation data: a JSON-shaped tree of primitives
//! built from an [AnalyzedGrammar] and a [ParseTable], handed to an
//! external, out-of-scope renderer. Assembled into typed builder structs
//! rather than a direct JSON-library tree, so this crate carries no JSON
//! dependency; [Value] is the hand-rolled equivalent of such a library's
//! `json` type.
use crate::{
  analyzer::{production::ProductionId, AnalyzedGrammar},
  config::GeneratorConfig,
  options::VERBATIM_LOCATIONS,
  symbol::{CaseMode, PatternKind, SymbolId},
  tablegen::{ActionKind, ParseTable},
};
use std::collections::BTreeMap;

/// A primitive-tree value with the shape a JSON document would have,
/// without depending on a JSON crate. The renderer on the far side of
/// this boundary is out of scope for this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Null,
  Bool(bool),
  Int(i64),
  Str(String),
  Array(Vec<Value>),
  Object(Vec<(String, Value)>),
}

impl Value {
  pub fn str(s: impl Into<String>) -> Self {
    Value::Str(s.into())
  }

  pub fn object(pairs: Vec<(&str, Value)>) -> Self {
    Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
  }
}

/// The generator stamps its own version and a generation timestamp into
/// every emitted file's header comment. `generated_at` is supplied by the
/// caller rather than read from the wall clock, keeping this module free
/// of I/O.
#[derive(Debug, Clone)]
pub struct Header {
  pub version:      String,
  pub generated_at: String,
}

impl Header {
  fn to_value(&self) -> Value {
    Value::object(vec![("version", Value::str(self.version.clone())), ("generated_at", Value::str(self.generated_at.clone()))])
  }
}

#[derive(Debug, Clone)]
pub struct EnumEntry {
  pub name:  String,
  pub value: i64,
}

impl EnumEntry {
  fn to_value(&self) -> Value {
    Value::object(vec![("name", Value::str(self.name.clone())), ("value", Value::Int(self.value))])
  }
}

#[derive(Debug, Clone)]
pub struct SemanticAction {
  pub token:     String,
  pub block:     String,
  pub type_str:  String,
}

impl SemanticAction {
  fn to_value(&self) -> Value {
    Value::object(vec![("token", Value::str(self.token.clone())), ("block", Value::str(self.block.clone())), ("type", Value::str(self.type_str.clone()))])
  }
}

/// One lexer pattern entry. This crate builds a single global DFA/lexer
/// rather than contextual per-state lexing tables, so `is_global` is set
/// `true` uniformly.
#[derive(Debug, Clone)]
pub struct PatternEntry {
  pub token:     String,
  pub pattern:   String,
  pub matcher:   &'static str,
  pub flags:     &'static str,
  pub is_global: bool,
}

impl PatternEntry {
  fn to_value(&self) -> Value {
    Value::object(vec![
      ("token", Value::str(self.token.clone())),
      ("pattern", Value::str(self.pattern.clone())),
      ("matcher", Value::str(self.matcher)),
      ("flags", Value::str(self.flags)),
      ("is_global", Value::Bool(self.is_global)),
    ])
  }
}

#[derive(Debug, Clone)]
pub enum ActionData {
  Shift { token: String, newstateid: usize },
  Accept { token: String },
  Reduce {
    token:        String,
    prodid:       usize,
    production:   String,
    count:        usize,
    returnlevels: usize,
    symbol:       String,
    valuetype:    String,
    hasvaluetype: bool,
    hassemaction: bool,
  },
}

impl ActionData {
  fn to_value(&self) -> Value {
    match self {
      ActionData::Shift { token, newstateid } => Value::object(vec![("token", Value::str(token.clone())), ("type", Value::str("shift")), ("newstateid", Value::Int(*newstateid as i64))]),
      ActionData::Accept { token } => Value::object(vec![("token", Value::str(token.clone())), ("type", Value::str("accept"))]),
      ActionData::Reduce { token, prodid, production, count, returnlevels, symbol, valuetype, hasvaluetype, hassemaction } => Value::object(vec![
        ("token", Value::str(token.clone())),
        ("type", Value::str("reduce")),
        ("prodid", Value::Int(*prodid as i64)),
        ("production", Value::str(production.clone())),
        ("count", Value::Int(*count as i64)),
        ("returnlevels", Value::Int(*returnlevels as i64)),
        ("symbol", Value::str(symbol.clone())),
        ("valuetype", Value::str(valuetype.clone())),
        ("hasvaluetype", Value::Bool(*hasvaluetype)),
        ("hassemaction", Value::Bool(*hassemaction)),
      ]),
    }
  }
}

#[derive(Debug, Clone)]
pub struct GotoData {
  pub symbol:  String,
  pub stateid: usize,
}

impl GotoData {
  fn to_value(&self) -> Value {
    Value::object(vec![("symbol", Value::str(self.symbol.clone())), ("stateid", Value::Int(self.stateid as i64))])
  }
}

#[derive(Debug, Clone)]
pub struct StateData {
  pub id:      usize,
  pub actions: Vec<ActionData>,
  pub gotos:   Vec<GotoData>,
}

impl StateData {
  fn to_value(&self) -> Value {
    Value::object(vec![
      ("id", Value::Int(self.id as i64)),
      ("actions", Value::Array(self.actions.iter().map(ActionData::to_value).collect())),
      ("gotos", Value::Array(self.gotos.iter().map(GotoData::to_value).collect())),
    ])
  }
}

#[derive(Debug, Clone)]
pub struct ItemTypeData {
  pub type_str: String,
  pub index:    usize,
  pub alias:    String,
}

impl ItemTypeData {
  fn to_value(&self) -> Value {
    Value::object(vec![("type", Value::str(self.type_str.clone())), ("index", Value::Int(self.index as i64)), ("alias", Value::str(self.alias.clone()))])
  }
}

#[derive(Debug, Clone)]
pub struct ReduceFuncData {
  pub prodid:     usize,
  pub itemtypes:  Vec<ItemTypeData>,
  pub block:      String,
  pub production: String,
  pub rule_type:  String,
}

impl ReduceFuncData {
  fn to_value(&self) -> Value {
    Value::object(vec![
      ("prodid", Value::Int(self.prodid as i64)),
      ("itemtypes", Value::Array(self.itemtypes.iter().map(ItemTypeData::to_value).collect())),
      ("block", Value::str(self.block.clone())),
      ("production", Value::str(self.production.clone())),
      ("rule_type", Value::str(self.rule_type.clone())),
    ])
  }
}

/// The complete tree handed to the out-of-scope renderer.
#[derive(Debug, Clone)]
pub struct TemplateData {
  pub namespace:        String,
  pub parserclass:      String,
  pub lexerclass:       String,
  pub header:           Header,
  pub enums:            Vec<EnumEntry>,
  pub types:            Vec<String>,
  pub semantic_actions: Vec<SemanticAction>,
  pub patterns:         Vec<PatternEntry>,
  pub states:           Vec<StateData>,
  pub reducefuncs:      Vec<ReduceFuncData>,
  pub verbatim:         BTreeMap<String, Vec<String>>,
}

impl TemplateData {
  pub fn to_value(&self) -> Value {
    let verbatim = Value::Object(self.verbatim.iter().map(|(k, v)| (k.clone(), Value::Array(v.iter().map(|s| Value::str(s.clone())).collect()))).collect());
    Value::object(vec![
      ("namespace", Value::str(self.namespace.clone())),
      ("parserclass", Value::str(self.parserclass.clone())),
      ("lexerclass", Value::str(self.lexerclass.clone())),
      ("header", self.header.to_value()),
      ("enums", Value::Array(self.enums.iter().map(EnumEntry::to_value).collect())),
      ("types", Value::Array(self.types.iter().cloned().map(Value::Str).collect())),
      ("semantic_actions", Value::Array(self.semantic_actions.iter().map(SemanticAction::to_value).collect())),
      ("patterns", Value::Array(self.patterns.iter().map(PatternEntry::to_value).collect())),
      ("states", Value::Array(self.states.iter().map(StateData::to_value).collect())),
      ("reducefuncs", Value::Array(self.reducefuncs.iter().map(ReduceFuncData::to_value).collect())),
      ("verbatim", verbatim),
    ])
  }
}

fn type_or_void(ty: &Option<String>) -> String {
  ty.clone().unwrap_or_else(|| "void".to_string())
}

fn token_ref(grammar: &AnalyzedGrammar, sym: SymbolId) -> String {
  let entry = grammar.symbols.get(sym);
  if entry.name == "$" {
    "eoi".to_string()
  } else {
    format!("TOK_{}", entry.token_name())
  }
}

/// A human-readable rendering of one production, e.g. `[2] E(3) => E(3) E(3)`
/// (`name(symbol id)` for the LHS and every RHS item), embedded in the
/// generated reduce actions as a debugging aid. Never parsed back.
fn production_string(grammar: &AnalyzedGrammar, prod_id: ProductionId) -> String {
  let prod = grammar.productions.get(prod_id);
  let lhs = grammar.symbols.get(prod.lhs);
  let rhs: Vec<String> = prod
    .rhs
    .iter()
    .map(|item| {
      let e = grammar.symbols.get(item.symbol);
      format!("{}({})", e.name, item.symbol.index())
    })
    .collect();
  format!("[{}] {}({}) => {}", prod_id.index(), lhs.name, prod.lhs.index(), rhs.join(" "))
}

fn build_enums(grammar: &AnalyzedGrammar) -> Vec<EnumEntry> {
  let mut enums = Vec::new();
  // eoi is always listed first, ahead of every user-declared terminal or
  // rule name, regardless of its own (late-assigned, see finalize()) symbol id.
  let eoi = grammar.symbols.find("$").expect("finalize always adds $");
  enums.push(EnumEntry { name: "eoi".to_string(), value: eoi.index() as i64 });

  for entry in grammar.symbols.iter() {
    if entry.name == "$" || entry.is_skip() {
      continue;
    }
    let name = if entry.is_terminal() { format!("TOK_{}", entry.token_name()) } else { entry.name.clone() };
    enums.push(EnumEntry { name, value: entry.id.index() as i64 });
  }

  enums.push(EnumEntry { name: "undef".to_string(), value: -1 });
  enums.push(EnumEntry { name: "skip".to_string(), value: -10 });
  enums
}

fn build_types(grammar: &AnalyzedGrammar) -> Vec<String> {
  let mut types = std::collections::BTreeSet::new();
  for entry in grammar.symbols.iter() {
    if let Some(t) = entry.kind.as_terminal() {
      if let Some(ty) = &t.value_type {
        if ty != "void" {
          types.insert(ty.clone());
        }
      }
    }
  }
  types.into_iter().collect()
}

fn build_semantic_actions(grammar: &AnalyzedGrammar) -> Vec<SemanticAction> {
  let mut actions = Vec::new();
  for entry in grammar.symbols.iter() {
    if let Some(t) = entry.kind.as_terminal() {
      if let Some(action) = &t.action {
        actions.push(SemanticAction { token: format!("TOK_{}", t.token_name), block: action.text().to_string(), type_str: type_or_void(&t.value_type) });
      }
    }
  }
  actions
}

fn matcher_for(kind: PatternKind, case: CaseMode) -> (&'static str, &'static str) {
  match (kind, case) {
    (PatternKind::String, CaseMode::Match) => ("string_matcher", ""),
    (PatternKind::String, CaseMode::Fold) => ("fold_string_matcher", ""),
    (_, CaseMode::Match) => ("regex_matcher", ""),
    (_, CaseMode::Fold) => ("regex_matcher", ", icase"),
  }
}

fn build_patterns(grammar: &AnalyzedGrammar) -> Vec<PatternEntry> {
  let mut patterns = Vec::new();
  for entry in grammar.symbols.iter() {
    match &entry.kind {
      crate::symbol::SymbolKind::Terminal(t) => {
        if entry.name == "$" {
          continue;
        }
        let (_, _, body) = crate::analyzer::pass1::pattern_body(&t.pattern_text);
        let (matcher, flags) = matcher_for(t.pattern_kind, t.case_mode);
        patterns.push(PatternEntry { token: format!("TOK_{}", t.token_name), pattern: body.text().to_string(), matcher, flags, is_global: true });
      }
      crate::symbol::SymbolKind::Skip(s) => {
        let (_, _, body) = crate::analyzer::pass1::pattern_body(&s.pattern_text);
        let (matcher, flags) = matcher_for(s.pattern_kind, s.case_mode);
        patterns.push(PatternEntry { token: "skip".to_string(), pattern: body.text().to_string(), matcher, flags, is_global: true });
      }
      crate::symbol::SymbolKind::Rule(_) => {}
    }
  }
  patterns
}

fn build_states(grammar: &AnalyzedGrammar, table: &ParseTable) -> Vec<StateData> {
  let mut states = Vec::with_capacity(table.states.len());
  for state in &table.states {
    let mut actions = Vec::with_capacity(state.actions.len());
    for (&sym, entry) in &state.actions {
      let token = token_ref(grammar, sym);
      let action = match entry.action.kind {
        ActionKind::Shift => ActionData::Shift { token, newstateid: entry.action.state.expect("shift action always carries a target state").index() },
        ActionKind::Accept => ActionData::Accept { token },
        ActionKind::Reduce => {
          let prod_id = entry.action.production.expect("reduce action always carries a production");
          let prod = grammar.productions.get(prod_id);
          let lhs = grammar.symbols.get(prod.lhs);
          let rule = lhs.kind.as_rule().expect("reduce action's production LHS is always a rule");
          ActionData::Reduce {
            token,
            prodid: prod_id.index(),
            production: production_string(grammar, prod_id),
            count: prod.rhs.len(),
            returnlevels: prod.rhs.len().saturating_sub(1),
            symbol: format!("TOK_{}", lhs.token_name()),
            valuetype: type_or_void(&rule.value_type),
            hasvaluetype: rule.value_type.as_deref().map(|t| t != "void").unwrap_or(false),
            hassemaction: prod.action.is_some(),
          }
        }
      };
      actions.push(action);
    }
    let gotos = state.gotos.iter().map(|(&sym, &target)| GotoData { symbol: format!("TOK_{}", grammar.symbols.get(sym).token_name()), stateid: target.index() }).collect();
    states.push(StateData { id: state.id.index(), actions, gotos });
  }
  states
}

/// Only productions with an explicit semantic action get a reduce function.
/// Item indices run `|RHS|-1` down to `0` in declaration order (the reverse
/// iteration order matches the original's, but without its off-by-one: the
/// original seeds its counter at `items.size()+1` and pre-decrements, so its
/// first emitted index is `size` rather than `size-1`).
fn build_reducefuncs(grammar: &AnalyzedGrammar) -> Vec<ReduceFuncData> {
  let mut funcs = Vec::new();
  for prod in grammar.productions.iter() {
    let Some(action) = &prod.action else { continue };
    let lhs = grammar.symbols.get(prod.lhs);
    let rule = lhs.kind.as_rule().expect("a production's LHS is always a rule");
    let itemtypes: Vec<ItemTypeData> = prod
      .rhs
      .iter()
      .enumerate()
      .rev()
      .map(|(index, item)| {
        let sym = grammar.symbols.get(item.symbol);
        let type_str = match &sym.kind {
          crate::symbol::SymbolKind::Terminal(t) => type_or_void(&t.value_type),
          crate::symbol::SymbolKind::Rule(r) => type_or_void(&r.value_type),
          crate::symbol::SymbolKind::Skip(_) => "void".to_string(),
        };
        ItemTypeData { type_str, index, alias: item.alias.clone().unwrap_or_default() }
      })
      .collect();
    funcs.push(ReduceFuncData {
      prodid: prod.id.index(),
      itemtypes,
      block: action.text().to_string(),
      production: production_string(grammar, prod.id),
      rule_type: type_or_void(&rule.value_type),
    });
  }
  funcs
}

fn build_verbatim(grammar: &AnalyzedGrammar) -> BTreeMap<String, Vec<String>> {
  let mut verbatim = BTreeMap::new();
  for &location in VERBATIM_LOCATIONS.iter() {
    let key = location.replacen('.', "_", 1);
    let entries = grammar.verbatim.get(location).map(|toks| toks.iter().map(|t| t.text().to_string()).collect()).unwrap_or_default();
    verbatim.insert(key, entries);
  }
  verbatim
}

/// Assembles the complete code-generation data tree for one analyzed,
/// table-generated grammar. Runs regardless of `table.success`: a failed
/// table (an unresolved conflict) still produces a dumpable state set for
/// `GeneratorConfig::emit_state_file`-style diagnosis.
pub fn build_template_data(grammar: &AnalyzedGrammar, table: &ParseTable, _config: &GeneratorConfig, generated_at: &str) -> TemplateData {
  TemplateData {
    namespace: grammar.options.code_namespace(),
    parserclass: grammar.options.parser_class(),
    lexerclass: grammar.options.lexer_class(),
    header: Header { version: env!("CARGO_PKG_VERSION").to_string(), generated_at: generated_at.to_string() },
    enums: build_enums(grammar),
    types: build_types(grammar),
    semantic_actions: build_semantic_actions(grammar),
    patterns: build_patterns(grammar),
    states: build_states(grammar, table),
    reducefuncs: build_reducefuncs(grammar),
    verbatim: build_verbatim(grammar),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{analyzer::analyze, ast::*, config::GeneratorConfig, error::ErrorSink, source::Token, tablegen};

  fn tok(text: &str) -> Token {
    let h = crate::source::SourceHandle::new("t", text.to_string());
    Token::new(h, 0, text.len())
  }

  fn sanity_grammar() -> Vec<Stmt> {
    vec![
      Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     None,
        name:         tok("X"),
        alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok("foo")) }], prec: None, action: None }],
      }),
    ]
  }

  #[test]
  fn eoi_enum_entry_is_always_first() {
    let grammar = analyze(&sanity_grammar());
    assert!(grammar.success, "{:?}", grammar.errors);
    let mut errors = ErrorSink::new();
    let table = tablegen::generate(&grammar, &mut errors);
    let data = build_template_data(&grammar, &table, &GeneratorConfig::default(), "test");
    assert_eq!(data.enums.first().unwrap().name, "eoi");
    let names: Vec<&str> = data.enums.iter().map(|e| e.name.as_str()).collect();
    assert!(names.contains(&"undef"));
    assert!(names.contains(&"skip"));
    assert_eq!(names.last().unwrap(), &"skip");
  }

  #[test]
  fn terminal_pattern_is_unquoted_in_output() {
    let grammar = analyze(&sanity_grammar());
    let mut errors = ErrorSink::new();
    let table = tablegen::generate(&grammar, &mut errors);
    let data = build_template_data(&grammar, &table, &GeneratorConfig::default(), "test");
    let foo = data.patterns.iter().find(|p| p.token == "TOK_foo").expect("foo pattern present");
    assert_eq!(foo.pattern, "x");
    assert_eq!(foo.matcher, "string_matcher");
    assert!(foo.is_global);
  }

  #[test]
  fn reducefunc_indices_count_down_from_len_minus_one() {
    let stmts = vec![
      Stmt::Terminal(TerminalStmt { type_str: Some(tok("i32")), name: tok("NUM"), pattern: tok("'1'"), assoc: None, prec: None, case: None, action: Some(tok("return 1;")) }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     Some(tok("i32")),
        name:         tok("X"),
        alternatives: vec![AltStmt {
          items:  vec![
            ItemStmt { alias: Some(tok("a")), symbol: SymbolRef::Named(tok("NUM")) },
            ItemStmt { alias: Some(tok("b")), symbol: SymbolRef::Named(tok("NUM")) },
          ],
          prec:   None,
          action: Some(tok("return a + b;")),
        }],
      }),
    ];
    let grammar = analyze(&stmts);
    assert!(grammar.success, "{:?}", grammar.errors);
    let mut errors = ErrorSink::new();
    let table = tablegen::generate(&grammar, &mut errors);
    let data = build_template_data(&grammar, &table, &GeneratorConfig::default(), "test");
    let func = data.reducefuncs.iter().find(|f| f.block.contains("a + b")).expect("user reduce function present");
    let indices: Vec<usize> = func.itemtypes.iter().map(|it| it.index).collect();
    assert_eq!(indices, vec![1, 0]);
  }

  #[test]
  fn verbatim_carries_all_eight_locations_even_when_empty() {
    let grammar = analyze(&sanity_grammar());
    let mut errors = ErrorSink::new();
    let table = tablegen::generate(&grammar, &mut errors);
    let data = build_template_data(&grammar, &table, &GeneratorConfig::default(), "test");
    assert_eq!(data.verbatim.len(), 8);
    assert!(data.verbatim.contains_key("file_top"));
    assert!(data.verbatim.contains_key("namespace_bottom"));
  }
}

//! The symbol table: the single arena of interned grammar symbols that the
//! rest of the pipeline refers to purely by [SymbolId]. Payload mutation is
//! restricted to a handful of typed setters invoked by the analyzer during
//! its two passes; after table generation begins the table is read-only.
use crate::source::Token;
use std::collections::BTreeMap;

macro_rules! indexed_id {
  ($name:ident) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct $name(u32);

    impl $name {
      pub fn index(&self) -> usize {
        self.0 as usize
      }
    }

    impl From<u32> for $name {
      fn from(v: u32) -> Self {
        Self(v)
      }
    }

    impl From<usize> for $name {
      fn from(v: usize) -> Self {
        Self(v as u32)
      }
    }
  };
}

indexed_id!(SymbolId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc {
  Undef,
  Left,
  Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
  Match,
  Fold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
  String,
  Regex,
  Ecma,
}

/// A compiled pattern's postfix instruction list, attached to a terminal or
/// skip once the regex RPN parser has run over its pattern text.
pub type CompiledPattern = std::rc::Rc<Vec<crate::regex::rpn::Instr>>;

#[derive(Debug, Clone)]
pub struct TerminalData {
  pub value_type:       Option<String>,
  pub pattern_text:     Token,
  pub pattern_kind:     PatternKind,
  pub case_mode:        CaseMode,
  pub action:           Option<Token>,
  pub associativity:    Assoc,
  pub precedence:       Option<u32>,
  pub token_name:       String,
  pub is_inline:        bool,
  pub compiled_pattern: Option<CompiledPattern>,
}

#[derive(Debug, Clone)]
pub struct SkipData {
  pub pattern_text:     Token,
  pub pattern_kind:     PatternKind,
  pub case_mode:        CaseMode,
  pub token_name:       String,
  pub compiled_pattern: Option<CompiledPattern>,
}

#[derive(Debug, Clone, Default)]
pub struct RuleData {
  pub value_type: Option<String>,
  pub is_goal:    bool,
  /// Productions (by id, see [crate::analyzer::production::ProductionId])
  /// whose LHS is this rule, in declaration order. Populated by Pass II.
  pub productions: Vec<u32>,
}

#[derive(Debug, Clone)]
pub enum SymbolKind {
  Terminal(TerminalData),
  Skip(SkipData),
  Rule(RuleData),
}

impl SymbolKind {
  pub fn kind_name(&self) -> &'static str {
    match self {
      SymbolKind::Terminal(_) => "terminal",
      SymbolKind::Skip(_) => "skip",
      SymbolKind::Rule(_) => "rule",
    }
  }

  pub fn as_terminal(&self) -> Option<&TerminalData> {
    match self {
      SymbolKind::Terminal(t) => Some(t),
      _ => None,
    }
  }

  pub fn as_skip(&self) -> Option<&SkipData> {
    match self {
      SymbolKind::Skip(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_rule(&self) -> Option<&RuleData> {
    match self {
      SymbolKind::Rule(r) => Some(r),
      _ => None,
    }
  }
}

#[derive(Debug, Clone)]
pub struct SymbolEntry {
  pub id:   SymbolId,
  pub name: String,
  pub loc:  Token,
  pub kind: SymbolKind,
}

impl SymbolEntry {
  pub fn is_terminal(&self) -> bool {
    matches!(self.kind, SymbolKind::Terminal(_))
  }

  pub fn is_skip(&self) -> bool {
    matches!(self.kind, SymbolKind::Skip(_))
  }

  pub fn is_rule(&self) -> bool {
    matches!(self.kind, SymbolKind::Rule(_))
  }

  /// The name emitted for this symbol's token/enum entry. For terminals and
  /// skips this is the declared token name; for rules it is the rule name.
  pub fn token_name(&self) -> &str {
    match &self.kind {
      SymbolKind::Terminal(t) => &t.token_name,
      SymbolKind::Skip(s) => &s.token_name,
      SymbolKind::Rule(_) => &self.name,
    }
  }
}

/// Owns the arena of [SymbolEntry]; id and name are dense/stable within one
/// table. Lookups are available by name, by pattern-literal alias, and by
/// id. Insertion by name is idempotent-failing: a collision returns the
/// existing symbol rather than replacing it.
#[derive(Debug, Default)]
pub struct SymbolTable {
  arena:               Vec<SymbolEntry>,
  by_name:             BTreeMap<String, SymbolId>,
  by_alias:            BTreeMap<String, SymbolId>,
  /// Set once any terminal/skip pattern has been classified (case-mode and
  /// pattern-kind resolved). Used to freeze the `lexer.case` option.
  pattern_classified:  bool,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `kind` under `name`, assigning a fresh id on first insert. On a
  /// name collision the table is left unchanged and the existing id is
  /// returned.
  pub fn add(&mut self, name: &str, loc: Token, kind: SymbolKind) -> (bool, SymbolId) {
    if let Some(&id) = self.by_name.get(name) {
      return (false, id);
    }
    let id = SymbolId::from(self.arena.len());
    self.arena.push(SymbolEntry { id, name: name.to_string(), loc, kind });
    self.by_name.insert(name.to_string(), id);
    (true, id)
  }

  /// Attaches `key` as an additional lookup key for `existing`, used for
  /// pattern-literal aliasing. Fails (returning the symbol already bound to
  /// `key`) if the alias is already taken; the alias namespace is distinct
  /// from the name namespace.
  pub fn register_key(&mut self, key: &str, existing: SymbolId) -> (bool, SymbolId) {
    if let Some(&id) = self.by_alias.get(key) {
      return (false, id);
    }
    self.by_alias.insert(key.to_string(), existing);
    (true, existing)
  }

  pub fn find_by_name(&self, key: &str) -> Option<SymbolId> {
    self.by_name.get(key).copied()
  }

  pub fn find_by_alias(&self, key: &str) -> Option<SymbolId> {
    self.by_alias.get(key).copied()
  }

  /// Looks up by name first, then by pattern alias.
  pub fn find(&self, key: &str) -> Option<SymbolId> {
    self.find_by_name(key).or_else(|| self.find_by_alias(key))
  }

  pub fn get(&self, id: SymbolId) -> &SymbolEntry {
    &self.arena[id.index()]
  }

  pub fn get_mut(&mut self, id: SymbolId) -> &mut SymbolEntry {
    &mut self.arena[id.index()]
  }

  /// Iteration in id order, i.e. declaration order among user-declared
  /// symbols (plus any symbols synthesized by the analyzer's finalization).
  pub fn iter(&self) -> impl Iterator<Item = &SymbolEntry> {
    self.arena.iter()
  }

  pub fn len(&self) -> usize {
    self.arena.len()
  }

  pub fn is_empty(&self) -> bool {
    self.arena.is_empty()
  }

  pub fn patterns_classified(&self) -> bool {
    self.pattern_classified
  }

  // --- Controlled mutators, invoked only by the analyzer during its passes.

  pub fn mark_patterns_classified(&mut self) {
    self.pattern_classified = true;
  }

  pub fn set_precedence(&mut self, id: SymbolId, prec: u32) {
    if let SymbolKind::Terminal(t) = &mut self.get_mut(id).kind {
      t.precedence = Some(prec);
    }
  }

  pub fn set_associativity(&mut self, id: SymbolId, assoc: Assoc) {
    if let SymbolKind::Terminal(t) = &mut self.get_mut(id).kind {
      t.associativity = assoc;
    }
  }

  pub fn set_case_mode(&mut self, id: SymbolId, mode: CaseMode) {
    match &mut self.get_mut(id).kind {
      SymbolKind::Terminal(t) => t.case_mode = mode,
      SymbolKind::Skip(s) => s.case_mode = mode,
      SymbolKind::Rule(_) => {}
    }
  }

  pub fn set_compiled_pattern(&mut self, id: SymbolId, compiled: CompiledPattern) {
    match &mut self.get_mut(id).kind {
      SymbolKind::Terminal(t) => t.compiled_pattern = Some(compiled),
      SymbolKind::Skip(s) => s.compiled_pattern = Some(compiled),
      SymbolKind::Rule(_) => {}
    }
  }

  pub fn attach_production(&mut self, rule_id: SymbolId, prod_id: u32) {
    if let SymbolKind::Rule(r) = &mut self.get_mut(rule_id).kind {
      r.productions.push(prod_id);
    }
  }

  /// Precedence for a terminal, `None` if the symbol is not a terminal or
  /// has no declared precedence.
  pub fn precedence_of(&self, id: SymbolId) -> Option<u32> {
    self.get(id).kind.as_terminal().and_then(|t| t.precedence)
  }

  pub fn associativity_of(&self, id: SymbolId) -> Assoc {
    self.get(id).kind.as_terminal().map(|t| t.associativity).unwrap_or(Assoc::Undef)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::Token;

  fn rule(_name: &str) -> SymbolKind {
    SymbolKind::Rule(RuleData { value_type: None, is_goal: false, productions: vec![] })
  }

  #[test]
  fn insert_is_idempotent_failing() {
    let mut table = SymbolTable::new();
    let (inserted, id) = table.add("X", Token::synthetic(), rule("X"));
    assert!(inserted);
    assert_eq!(table.find_by_name("X"), Some(id));
    assert_eq!(table.get(id).name, "X");

    let (inserted_again, id_again) = table.add("X", Token::synthetic(), rule("X"));
    assert!(!inserted_again);
    assert_eq!(id_again, id);
    assert_eq!(table.len(), 1);
  }

  #[test]
  fn alias_namespace_is_distinct_and_exclusive() {
    let mut table = SymbolTable::new();
    let (_, id) = table.add("FOO", Token::synthetic(), rule("FOO"));
    let (registered, sym) = table.register_key("foo-literal", id);
    assert!(registered);
    assert_eq!(sym, id);

    let (_, other) = table.add("BAR", Token::synthetic(), rule("BAR"));
    let (registered_again, existing) = table.register_key("foo-literal", other);
    assert!(!registered_again);
    assert_eq!(existing, id);
  }

  #[test]
  fn find_by_id_is_stable_after_insert() {
    let mut table = SymbolTable::new();
    let (_, id) = table.add("X", Token::synthetic(), rule("X"));
    assert_eq!(table.get(id).name, "X");
  }
}

//! The statement-list model: the seam between an external grammar-DSL
//! scanner/parser, which builds `Vec<Stmt>`, and everything from here on
//! (analyzer, table generator, emitter), which is indifferent to how that
//! list was produced.
use crate::source::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
  Parser,
  Lexer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssocKind {
  Left,
  Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOverride {
  Match,
  Fold,
}

/// A reference to a symbol as written in the DSL: either a bare identifier
/// or a single-quoted literal (which auto-registers an inline terminal).
#[derive(Debug, Clone)]
pub enum SymbolRef {
  Named(Token),
  Literal(Token),
}

impl SymbolRef {
  pub fn loc(&self) -> &Token {
    match self {
      SymbolRef::Named(t) | SymbolRef::Literal(t) => t,
    }
  }
}

#[derive(Debug, Clone)]
pub enum PrecValue {
  Number(u32),
  Named(Token),
  Literal(Token),
}

#[derive(Debug, Clone)]
pub struct PrecSpec {
  pub loc:   Token,
  pub value: PrecValue,
}

#[derive(Debug, Clone)]
pub struct ClassStmt {
  pub kind: ClassKind,
  pub name: Token,
}

#[derive(Debug, Clone)]
pub struct NamespaceStmt {
  pub name: Token,
}

#[derive(Debug, Clone)]
pub struct OptionStmt {
  pub name:  Token,
  pub value: Token,
}

#[derive(Debug, Clone)]
pub struct TerminalStmt {
  pub type_str: Option<Token>,
  pub name:     Token,
  pub pattern:  Token,
  pub assoc:    Option<(Token, AssocKind)>,
  pub prec:     Option<PrecSpec>,
  pub case:     Option<CaseOverride>,
  pub action:   Option<Token>,
}

/// A skip statement shares [TerminalStmt]'s shape in the source grammar
/// (so a nonconforming scanner could still hand one an assoc/prec/action);
/// the analyzer rejects any of the three as
/// [crate::error::YalrError::SkipWithDisallowedAttribute].
#[derive(Debug, Clone)]
pub struct SkipStmt {
  pub name:    Token,
  pub pattern: Token,
  pub case:    Option<CaseOverride>,
  pub assoc:   Option<(Token, AssocKind)>,
  pub prec:    Option<PrecSpec>,
  pub action:  Option<Token>,
}

#[derive(Debug, Clone)]
pub struct ItemStmt {
  pub alias:  Option<Token>,
  pub symbol: SymbolRef,
}

#[derive(Debug, Clone)]
pub struct AltStmt {
  pub items:  Vec<ItemStmt>,
  pub prec:   Option<PrecSpec>,
  pub action: Option<Token>,
}

#[derive(Debug, Clone)]
pub struct RuleStmt {
  pub is_goal:      bool,
  pub type_str:     Option<Token>,
  pub name:         Token,
  pub alternatives: Vec<AltStmt>,
}

#[derive(Debug, Clone)]
pub struct TermsetStmt {
  pub type_str: Option<Token>,
  pub name:     Token,
  pub assoc:    Option<(Token, AssocKind)>,
  pub prec:     Option<PrecSpec>,
  pub items:    Vec<SymbolRef>,
  pub action:   Option<Token>,
}

#[derive(Debug, Clone)]
pub struct AssociativityStmt {
  pub kind:  AssocKind,
  pub items: Vec<SymbolRef>,
}

#[derive(Debug, Clone)]
pub struct PrecedenceStmt {
  pub level: PrecValue,
  pub loc:   Token,
  pub items: Vec<SymbolRef>,
}

#[derive(Debug, Clone)]
pub struct VerbatimStmt {
  pub location: Token,
  pub action:   Token,
}

#[derive(Debug, Clone)]
pub enum Stmt {
  Class(ClassStmt),
  Namespace(NamespaceStmt),
  Option(OptionStmt),
  Terminal(TerminalStmt),
  Skip(SkipStmt),
  Rule(RuleStmt),
  Termset(TermsetStmt),
  Associativity(AssociativityStmt),
  Precedence(PrecedenceStmt),
  Verbatim(VerbatimStmt),
}

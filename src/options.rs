//! The grammar-level `option NAME VALUE ;` surface. Each recognized option
//! has a type and a multiplicity (set-once vs. always-accepting);
//! unrecognized names and malformed values are errors.
use crate::{
  error::{ErrorSink, YalrError},
  source::Token,
  symbol::CaseMode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserAlgorithm {
  Slr,
}

#[derive(Debug, Clone)]
struct SetOnce<T> {
  value: Option<T>,
  first: Option<Token>,
  default: T,
}

impl<T: Clone> SetOnce<T> {
  fn new(default: T) -> Self {
    Self { value: None, first: None, default }
  }

  fn get(&self) -> T {
    self.value.clone().unwrap_or_else(|| self.default.clone())
  }

  fn is_default(&self) -> bool {
    self.value.is_none()
  }

  fn set(&mut self, loc: Token, value: T, name: &str, errors: &mut ErrorSink) {
    match &self.first {
      Some(first) => errors.push(YalrError::OptionAlreadySet { loc, name: name.to_string(), first: first.clone() }),
      None => {
        self.value = Some(value);
        self.first = Some(loc);
      }
    }
  }
}

/// The recognized, typed grammar-level options. `lexer_case` is
/// additionally frozen (see [OptionTable::freeze_lexer_case]) the first
/// time any pattern is classified, so a later `option lexer.case ...`
/// cannot silently re-interpret patterns already compiled.
#[derive(Debug)]
pub struct OptionTable {
  parser_class:    SetOnce<String>,
  lexer_class:     SetOnce<String>,
  code_namespace:  SetOnce<String>,
  lexer_case:      SetOnce<CaseMode>,
  code_main:       bool,
  lexer_case_frozen: bool,
}

impl Default for OptionTable {
  fn default() -> Self {
    Self {
      parser_class:      SetOnce::new("Parser".to_string()),
      lexer_class:       SetOnce::new("Lexer".to_string()),
      code_namespace:    SetOnce::new("YalrParser".to_string()),
      lexer_case:        SetOnce::new(CaseMode::Match),
      code_main:         false,
      lexer_case_frozen: false,
    }
  }
}

fn parse_bool(val: &str) -> Option<bool> {
  match val {
    "yes" | "YES" | "true" | "TRUE" | "1" => Some(true),
    "no" | "NO" | "false" | "FALSE" | "0" => Some(false),
    _ => None,
  }
}

impl OptionTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn parser_class(&self) -> String {
    self.parser_class.get()
  }

  pub fn lexer_class(&self) -> String {
    self.lexer_class.get()
  }

  pub fn code_namespace(&self) -> String {
    self.code_namespace.get()
  }

  pub fn lexer_case(&self) -> CaseMode {
    self.lexer_case.get()
  }

  pub fn code_main(&self) -> bool {
    self.code_main
  }

  /// Called once any terminal/skip pattern has been classified; further
  /// `option lexer.case ...` statements become errors rather than silent
  /// overrides.
  pub fn freeze_lexer_case(&mut self) {
    self.lexer_case_frozen = true;
  }

  pub fn lexer_case_is_default(&self) -> bool {
    self.lexer_case.is_default()
  }

  /// Applies `option name value ;` at `loc`, recording any error.
  pub fn apply(&mut self, loc: Token, name: &str, value: &str, errors: &mut ErrorSink) {
    match name {
      "parser.class" => self.parser_class.set(loc, value.to_string(), name, errors),
      "lexer.class" => self.lexer_class.set(loc, value.to_string(), name, errors),
      "code.namespace" => self.code_namespace.set(loc, value.to_string(), name, errors),
      "lexer.case" => {
        if self.lexer_case_frozen {
          errors.push(YalrError::OptionFrozen { loc, name: name.to_string() });
          return;
        }
        match value {
          "cmatch" => self.lexer_case.set(loc, CaseMode::Match, name, errors),
          "cfold" => self.lexer_case.set(loc, CaseMode::Fold, name, errors),
          _ => errors.push(YalrError::InvalidOptionValue { loc, name: name.to_string(), value: value.to_string() }),
        }
      }
      "code.main" => match parse_bool(value) {
        Some(b) => self.code_main = b,
        None => errors.push(YalrError::InvalidOptionValue { loc, name: name.to_string(), value: value.to_string() }),
      },
      _ => errors.push(YalrError::UnknownOption { loc, name: name.to_string() }),
    }
  }
}

pub const VERBATIM_LOCATIONS: [&str; 8] = [
  "file.top",
  "file.bottom",
  "namespace.top",
  "namespace.bottom",
  "lexer.top",
  "lexer.bottom",
  "parser.top",
  "parser.bottom",
];

pub fn is_known_verbatim_location(name: &str) -> bool {
  VERBATIM_LOCATIONS.contains(&name)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_spec() {
    let opts = OptionTable::new();
    assert_eq!(opts.parser_class(), "Parser");
    assert_eq!(opts.lexer_class(), "Lexer");
    assert_eq!(opts.code_namespace(), "YalrParser");
    assert_eq!(opts.lexer_case(), CaseMode::Match);
    assert!(!opts.code_main());
  }

  #[test]
  fn set_once_option_rejects_second_set() {
    let mut opts = OptionTable::new();
    let mut errors = ErrorSink::new();
    opts.apply(Token::synthetic(), "parser.class", "Foo", &mut errors);
    assert!(errors.is_empty());
    opts.apply(Token::synthetic(), "parser.class", "Bar", &mut errors);
    assert!(!errors.is_empty());
    assert_eq!(opts.parser_class(), "Foo");
  }

  #[test]
  fn bool_option_accepts_multiple_sets() {
    let mut opts = OptionTable::new();
    let mut errors = ErrorSink::new();
    opts.apply(Token::synthetic(), "code.main", "yes", &mut errors);
    opts.apply(Token::synthetic(), "code.main", "no", &mut errors);
    assert!(errors.is_empty());
    assert!(!opts.code_main());
  }

  #[test]
  fn lexer_case_freezes_after_classification() {
    let mut opts = OptionTable::new();
    let mut errors = ErrorSink::new();
    opts.freeze_lexer_case();
    opts.apply(Token::synthetic(), "lexer.case", "cfold", &mut errors);
    assert!(!errors.is_empty());
  }

  #[test]
  fn unknown_option_is_an_error() {
    let mut opts = OptionTable::new();
    let mut errors = ErrorSink::new();
    opts.apply(Token::synthetic(), "bogus.option", "1", &mut errors);
    assert!(!errors.is_empty());
  }
}

//! `yalr_core`: the analysis, table-generation, and code-emission-modeling
//! core of the `yalr` LALR/SLR parser generator. This crate does not parse
//! the grammar DSL itself (see [ast] for the seam an external scanner/
//! parser feeds) and does not render generated source files (see [emit]
//! for the seam an external template renderer consumes); everything
//! between those two boundaries lives here.
//!
//! Pipeline: [ast::Stmt] list -> [analyzer::analyze] -> [tablegen::generate]
//! -> [emit::build_template_data].
pub mod analyzer;
pub mod ast;
pub mod config;
pub mod diag;
pub mod emit;
pub mod error;
pub mod journal;
pub mod options;
pub mod regex;
pub mod source;
pub mod symbol;
pub mod tablegen;

pub use analyzer::{analyze, AnalyzedGrammar};
pub use config::GeneratorConfig;
pub use diag::{ErrorGroups, YalrErrorContainer};
pub use emit::{build_template_data, TemplateData, Value};
pub use error::{YalrError, YalrErrorSeverity};
pub use journal::{Journal, Phase};
pub use tablegen::{generate as generate_table, ParseTable};

/// Runs the full pipeline over one statement list: analysis, table
/// generation, and code-emission-data assembly, with phase timing recorded
/// on `journal`. Returns the analyzed grammar, the parse table, and the
/// template data regardless of success; callers inspect
/// `grammar.success`/`table.success` and the accumulated errors to decide
/// whether to write anything out. A failed table is still fully dumpable,
/// so a user sees every conflict at once rather than one at a time.
pub fn run_pipeline(stmts: &[ast::Stmt], config: &GeneratorConfig, generated_at: &str, journal: &mut Journal) -> (AnalyzedGrammar, ParseTable, TemplateData, Vec<YalrError>) {
  journal.begin_phase(Phase::Analyze);
  let grammar = analyze(stmts);
  journal.end_phase();

  journal.begin_phase(Phase::TableGen);
  let mut table_errors = error::ErrorSink::new();
  let table = generate_table(&grammar, &mut table_errors);
  journal.end_phase();

  journal.begin_phase(Phase::Emit);
  let data = build_template_data(&grammar, &table, config, generated_at);
  journal.end_phase();

  let mut errors = grammar.errors.clone();
  errors.extend(table_errors.into_vec());
  (grammar, table, data, errors)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::*;
  use crate::source::Token;

  fn tok(text: &str) -> Token {
    let h = crate::source::SourceHandle::new("t", text.to_string());
    Token::new(h, 0, text.len())
  }

  #[test]
  fn pipeline_runs_end_to_end_on_a_sane_grammar() {
    let stmts = vec![
      Stmt::Terminal(TerminalStmt { type_str: None, name: tok("foo"), pattern: tok("'x'"), assoc: None, prec: None, case: None, action: None }),
      Stmt::Rule(RuleStmt {
        is_goal:      true,
        type_str:     None,
        name:         tok("X"),
        alternatives: vec![AltStmt { items: vec![ItemStmt { alias: None, symbol: SymbolRef::Named(tok("foo")) }], prec: None, action: None }],
      }),
    ];
    let mut journal = Journal::new();
    let (grammar, table, data, errors) = run_pipeline(&stmts, &GeneratorConfig::default(), "2026-07-28", &mut journal);
    assert!(grammar.success);
    assert!(table.success);
    assert!(errors.is_empty());
    assert_eq!(data.enums.first().unwrap().name, "eoi");
    assert_eq!(journal.report().entries().len(), 6);
  }
}

//! Caller-supplied knobs for one generator run, distinct from the DSL's own
//! `option` statements in [crate::options]: which table-construction
//! algorithm to run and which optional emission artifacts to produce.
use crate::options::ParserAlgorithm;

/// Configuration for one run of the generator pipeline. `Default` matches
/// the original tool's command-line defaults: build an SLR table, skip the
/// diagnostic state-file dump, and do not emit a runnable `main`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
  /// Table-construction algorithm. SLR is the only one implemented; the
  /// field still exists (rather than being elided) so a future LALR/LR(1)
  /// backend slots in without changing the public signature.
  pub algorithm:       ParserAlgorithm,
  /// Emit the human-readable state dump alongside the code-generation
  /// template data, for `--dump-states`-style diagnosis: a conflict that
  /// fails generation still produces a dumpable table.
  pub emit_state_file: bool,
  /// Emit a runnable `main` wired to the generated parser, mirroring the
  /// DSL's own `option code.main` but as a generator-level override.
  pub emit_main:       bool,
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    Self { algorithm: ParserAlgorithm::Slr, emit_state_file: false, emit_main: false }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults_match_original_cli_behavior() {
    let cfg = GeneratorConfig::default();
    assert_eq!(cfg.algorithm, ParserAlgorithm::Slr);
    assert!(!cfg.emit_state_file);
    assert!(!cfg.emit_main);
  }
}

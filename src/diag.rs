//! Diagnostics rendering for a completed run: a non-zero exit and a
//! sequence of diagnostics each formatted as `source:line:col: error:
//! message`, followed by the offending source line and a caret. This crate
//! never exits a process or writes to a stream itself; [YalrErrorContainer]
//! just turns a `[YalrError]` slice into grouped data or formatted text an
//! external CLI hands to stdout/stderr.
use crate::error::{YalrError, YalrErrorSeverity};

/// Errors partitioned by severity, preserving each group's original
/// relative order.
#[derive(Debug, Default, Clone)]
pub struct ErrorGroups {
  pub critical: Vec<YalrError>,
  pub warnings: Vec<YalrError>,
  pub hints:    Vec<YalrError>,
}

/// Severity-partitioning and presence queries over a `[YalrError]` slice.
/// Implemented as a trait over `[YalrError]` (and so usable on
/// `Vec<YalrError>` via deref) rather than as inherent methods on the
/// slice type.
pub trait YalrErrorContainer {
  fn error_groups(&self) -> ErrorGroups;

  fn critical(&self) -> Vec<YalrError> {
    self.error_groups().critical
  }

  fn warnings(&self) -> Vec<YalrError> {
    self.error_groups().warnings
  }

  fn hints(&self) -> Vec<YalrError> {
    self.error_groups().hints
  }

  fn has_errors(&self) -> bool;
  fn has_critical(&self) -> bool;
  fn has_warnings(&self) -> bool;
  fn has_hints(&self) -> bool;
}

impl YalrErrorContainer for [YalrError] {
  fn error_groups(&self) -> ErrorGroups {
    let mut groups = ErrorGroups::default();
    for err in self {
      let sev = err.severity();
      if sev == YalrErrorSeverity::Critical {
        groups.critical.push(err.clone());
      } else if sev == YalrErrorSeverity::Warning {
        groups.warnings.push(err.clone());
      } else {
        groups.hints.push(err.clone());
      }
    }
    groups
  }

  fn has_errors(&self) -> bool {
    !self.is_empty()
  }

  fn has_critical(&self) -> bool {
    self.iter().any(YalrError::is_critical)
  }

  fn has_warnings(&self) -> bool {
    self.iter().any(|e| e.severity() == YalrErrorSeverity::Warning)
  }

  fn has_hints(&self) -> bool {
    self.iter().any(|e| e.severity() == YalrErrorSeverity::Hint)
  }
}

/// Renders every entry of `errors` via [std::fmt::Display], one blank line
/// apart, in original accumulation order, the shape `yalr`'s CLI front-end
/// writes to stderr before exiting non-zero. The exit-code decision itself
/// stays with that external CLI; this only produces the text.
pub fn render_report(errors: &[YalrError]) -> String {
  errors.iter().map(YalrError::to_string).collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::Token;

  #[test]
  fn groups_partition_by_severity_and_preserve_order() {
    let errors = vec![
      YalrError::NoGoalRule,
      YalrError::UnusedSymbol { loc: Token::synthetic(), name: "WS".into(), kind: "skip" },
      YalrError::DuplicatePrecedence { loc: Token::synthetic(), name: "PLUS".into(), first: Token::synthetic() },
    ];
    assert!(errors.has_errors());
    assert!(errors.has_critical());
    assert!(errors.has_warnings());
    assert!(errors.has_hints());

    let groups = errors.error_groups();
    assert_eq!(groups.critical.len(), 1);
    assert_eq!(groups.warnings.len(), 1);
    assert_eq!(groups.hints.len(), 1);
  }

  #[test]
  fn empty_slice_has_no_errors() {
    let errors: Vec<YalrError> = vec![];
    assert!(!errors.has_errors());
    assert!(!errors.has_critical());
  }

  #[test]
  fn render_report_joins_every_entry() {
    let errors = vec![YalrError::NoGoalRule, YalrError::NoGoalRule];
    let report = render_report(&errors);
    assert_eq!(report.matches("no rule was marked").count(), 2);
  }
}

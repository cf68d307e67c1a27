//! Ambient diagnostic tracking for one generator run. A single `yalr` run
//! is single-threaded end to end, with no concurrent grammars in flight, so
//! this is one [Journal] per run, no locking, and one [Report] per phase.
use std::time::{Duration, Instant};

/// A phase of the generator pipeline, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
  Analyze,
  TableGen,
  Emit,
}

impl Phase {
  fn name(&self) -> &'static str {
    match self {
      Phase::Analyze => "analyze",
      Phase::TableGen => "tablegen",
      Phase::Emit => "emit",
    }
  }
}

/// A single line of the report: either a timed phase boundary or a free
/// text note emitted while that phase was active.
#[derive(Debug, Clone)]
pub enum ReportEntry {
  PhaseStarted { phase: Phase },
  PhaseFinished { phase: Phase, elapsed: Duration },
  Note { phase: Phase, message: String },
}

/// The accumulated record of one run: every phase boundary and note, in the
/// order they occurred. Cheap to walk for a `--report` style CLI dump; the
/// core crate itself never prints it.
#[derive(Debug, Default)]
pub struct Report {
  entries: Vec<ReportEntry>,
}

impl Report {
  pub fn entries(&self) -> &[ReportEntry] {
    &self.entries
  }
}

/// Tracks phase timing and notes for a single generator run. Not `Clone` or
/// `Send`-required: one journal is created per invocation of the public
/// pipeline entry points and discarded at the end.
#[derive(Debug)]
pub struct Journal {
  report: Report,
  active: Option<(Phase, Instant)>,
}

impl Journal {
  pub fn new() -> Self {
    Self { report: Report::default(), active: None }
  }

  /// Starts timing `phase`, closing out any phase still open (a phase that
  /// never calls [Journal::end_phase] before the next one starts, e.g. on
  /// an early return).
  pub fn begin_phase(&mut self, phase: Phase) {
    if self.active.is_some() {
      self.end_phase();
    }
    self.report.entries.push(ReportEntry::PhaseStarted { phase });
    self.active = Some((phase, Instant::now()));
  }

  pub fn end_phase(&mut self) {
    if let Some((phase, start)) = self.active.take() {
      self.report.entries.push(ReportEntry::PhaseFinished { phase, elapsed: start.elapsed() });
    }
  }

  /// Attaches a free-text note to whichever phase is currently active, or
  /// to the most recently active one if none is open.
  pub fn note(&mut self, message: impl Into<String>) {
    let phase = self.active.map(|(p, _)| p).or_else(|| {
      self.report.entries.iter().rev().find_map(|e| match e {
        ReportEntry::PhaseStarted { phase } => Some(*phase),
        _ => None,
      })
    });
    if let Some(phase) = phase {
      self.report.entries.push(ReportEntry::Note { phase, message: message.into() });
    }
  }

  pub fn report(&self) -> &Report {
    &self.report
  }

  pub fn into_report(mut self) -> Report {
    self.end_phase();
    self.report
  }
}

impl Default for Journal {
  fn default() -> Self {
    Self::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn phases_open_and_close_in_order() {
    let mut j = Journal::new();
    j.begin_phase(Phase::Analyze);
    j.note("symbol table populated");
    j.end_phase();
    j.begin_phase(Phase::TableGen);
    let report = j.into_report();
    let names: Vec<&'static str> = report
      .entries()
      .iter()
      .map(|e| match e {
        ReportEntry::PhaseStarted { phase } => phase.name(),
        ReportEntry::PhaseFinished { phase, .. } => phase.name(),
        ReportEntry::Note { phase, .. } => phase.name(),
      })
      .collect();
    assert_eq!(names, vec!["analyze", "analyze", "analyze", "tablegen", "tablegen"]);
  }

  #[test]
  fn unstarted_journal_has_no_active_phase() {
    let mut j = Journal::new();
    j.note("dropped silently, nothing is active");
    assert!(j.report().entries().is_empty());
  }
}

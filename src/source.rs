//! Source-text model: named text buffers, lazily-indexed line starts, and
//! `Token` fragments (byte offset, length, source handle) that carry
//! provenance through the rest of the pipeline for diagnostic reporting.
use std::{
  cell::OnceCell,
  fmt::{Debug, Display},
  sync::Arc,
};

/// A named, owned text buffer. Line-start offsets are computed once, on
/// first use, and cached.
pub struct SourceHandle {
  name:        String,
  content:     String,
  line_starts: OnceCell<Vec<usize>>,
}

impl SourceHandle {
  pub fn new(name: impl Into<String>, content: impl Into<String>) -> Arc<Self> {
    Arc::new(Self { name: name.into(), content: content.into(), line_starts: OnceCell::new() })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  fn line_starts(&self) -> &[usize] {
    self.line_starts.get_or_init(|| {
      let mut starts = vec![0usize];
      for (i, b) in self.content.as_bytes().iter().enumerate() {
        if *b == b'\n' {
          starts.push(i + 1);
        }
      }
      starts
    })
  }

  /// 1-indexed (line, column) for a byte offset.
  pub fn line_col(&self, offset: usize) -> (usize, usize) {
    let starts = self.line_starts();
    let line = match starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i.saturating_sub(1),
    };
    let col = offset - starts[line];
    (line + 1, col + 1)
  }

  /// The full text of the line containing `offset`.
  pub fn line_text(&self, offset: usize) -> &str {
    let starts = self.line_starts();
    let line = match starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i.saturating_sub(1),
    };
    let start = starts[line];
    let end = starts.get(line + 1).map(|e| e.saturating_sub(1)).unwrap_or(self.content.len());
    let end = end.min(self.content.len());
    &self.content[start..end.max(start)]
  }
}

impl Debug for SourceHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "SourceHandle({})", self.name)
  }
}

/// A fragment of source text: an offset and a length into a [SourceHandle].
/// Cheap to copy; the handle is reference-counted so fragments outlive the
/// parse that produced them.
#[derive(Clone)]
pub struct Token {
  offset: usize,
  len:    usize,
  source: Arc<SourceHandle>,
}

impl Token {
  pub fn new(source: Arc<SourceHandle>, offset: usize, len: usize) -> Self {
    Self { offset, len, source }
  }

  /// A fragment with no backing source, for synthesized symbols that have
  /// no corresponding DSL text (e.g. the goal-prime rule).
  pub fn synthetic() -> Self {
    Self { offset: 0, len: 0, source: SourceHandle::new("<synthetic>", "") }
  }

  /// A synthetic fragment that carries `text`, for canned action bodies
  /// the analyzer generates itself (e.g. the `@lexeme` action).
  pub fn synthetic_with_text(text: impl Into<String>) -> Self {
    let content = text.into();
    let len = content.len();
    Self { offset: 0, len, source: SourceHandle::new("<synthetic>", content) }
  }

  pub fn offset(&self) -> usize {
    self.offset
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn text(&self) -> &str {
    &self.source.content()[self.offset..self.offset + self.len]
  }

  pub fn source(&self) -> &SourceHandle {
    &self.source
  }

  /// A cheap clone of the backing handle, for building a sub-fragment of
  /// this token's text (e.g. a pattern string with its mode prefix and
  /// delimiters trimmed) that still resolves to the right line/column.
  pub fn source_arc(&self) -> Arc<SourceHandle> {
    self.source.clone()
  }

  /// `name:line:col` with no trailing punctuation, matching the emitted
  /// diagnostic format `source:line:col: error: message`.
  pub fn loc_stub(&self) -> String {
    let (line, col) = self.source.line_col(self.offset);
    format!("{}:{}:{}", self.source.name(), line, col)
  }

  /// The offending source line followed by a caret under the fragment's
  /// start column.
  pub fn blame(&self) -> String {
    let (_, col) = self.source.line_col(self.offset);
    let line = self.source.line_text(self.offset);
    let caret = " ".repeat(col.saturating_sub(1)) + "^";
    format!("{}\n{}", line, caret)
  }
}

impl Debug for Token {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "Token({}, {:?})", self.loc_stub(), self.text())
  }
}

impl Display for Token {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.text())
  }
}

impl PartialEq for Token {
  fn eq(&self, other: &Self) -> bool {
    Arc::ptr_eq(&self.source, &other.source) && self.offset == other.offset && self.len == other.len
  }
}
impl Eq for Token {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn line_col_resolves_across_lines() {
    let h = SourceHandle::new("f", "abc\ndef\nghi");
    assert_eq!(h.line_col(0), (1, 1));
    assert_eq!(h.line_col(4), (2, 1));
    assert_eq!(h.line_col(9), (3, 2));
  }

  #[test]
  fn token_text_and_blame() {
    let h = SourceHandle::new("f", "term foo 'x';\n");
    let t = Token::new(h, 5, 3);
    assert_eq!(t.text(), "foo");
    let blame = t.blame();
    assert!(blame.contains('^'));
  }
}

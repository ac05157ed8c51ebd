//! Intermediate representation threaded between the Wikitext phases.

use super::table::TableBlock;

/// A piece of a Wikitext document between phases.
///
/// Early phases cut finished HTML out of the text so that later phases, which
/// only ever look at [`Segment::Text`], cannot re-interpret it as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Source still to be parsed.
  Text(String),
  /// Finished block-level HTML, emitted as is.
  PreRendered(String),
  /// A parsed table, rendered during the block scan.
  Table(TableBlock),
}

/// Rebuild a segment list by passing every text segment through `f`.
///
/// Other segments are kept in place. Empty text segments are dropped.
pub fn flat_map_text<F>(segments: Vec<Segment>, mut f: F) -> Vec<Segment>
where
  F: FnMut(String) -> Vec<Segment>,
{
  let mut out = Vec::with_capacity(segments.len());
  for segment in segments {
    match segment {
      Segment::Text(text) => {
        out.extend(f(text).into_iter().filter(|s| !s.is_empty_text()));
      },
      other => out.push(other),
    }
  }
  out
}

impl Segment {
  fn is_empty_text(&self) -> bool {
    matches!(self, Self::Text(text) if text.is_empty())
  }
}

/// Accumulates source lines and flushes them as a text segment.
#[derive(Debug, Default)]
pub struct TextBuffer {
  pending: String,
}

impl TextBuffer {
  pub fn push(&mut self, text: &str) {
    self.pending.push_str(text);
  }

  /// Move any pending text into `out`.
  pub fn flush(&mut self, out: &mut Vec<Segment>) {
    if !self.pending.is_empty() {
      out.push(Segment::Text(std::mem::take(&mut self.pending)));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_flat_map_text_keeps_order() {
    let segments = vec![
      Segment::Text("a".to_string()),
      Segment::PreRendered("<pre>x</pre>".to_string()),
      Segment::Text("b".to_string()),
    ];
    let out = flat_map_text(segments, |text| {
      vec![
        Segment::Text(String::new()),
        Segment::Text(text.to_uppercase()),
      ]
    });
    assert_eq!(out, vec![
      Segment::Text("A".to_string()),
      Segment::PreRendered("<pre>x</pre>".to_string()),
      Segment::Text("B".to_string()),
    ]);
  }

  #[test]
  fn test_text_buffer_flush() {
    let mut out = Vec::new();
    let mut buffer = TextBuffer::default();
    buffer.flush(&mut out);
    assert!(out.is_empty());

    buffer.push("line\n");
    buffer.push("more");
    buffer.flush(&mut out);
    assert_eq!(out, vec![Segment::Text("line\nmore".to_string())]);
  }
}

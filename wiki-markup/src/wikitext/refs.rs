//! Footnotes: `<ref>` collection, numbering and the `<references />` list.

use std::{collections::HashMap, fmt::Write as _, sync::LazyLock};

use regex::{Captures, Regex};

use crate::utils::build_regex;

/// `<ref>note</ref>`, `<ref name=x>note</ref>` and `<ref name=x/>`.
///
/// Groups 1-3 hold the name (double-quoted, single-quoted, bare), group 4 the
/// note. A self-closing ref has no group 4.
static REF_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(
    r#"(?is)<ref(?:\s+name\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'/>]+)))?\s*(?:/>|>(.*?)</ref\s*>)"#,
  )
});

/// A collected footnote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footnote {
  pub name: Option<String>,
  /// Raw Wikitext of the note, rendered when the list is emitted.
  pub note: String,
}

/// Footnotes of one document, numbered from 1 in order of first use.
#[derive(Debug, Default)]
pub struct Footnotes {
  notes:   Vec<Footnote>,
  by_name: HashMap<String, usize>,
}

impl Footnotes {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.notes.is_empty()
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.notes.len()
  }

  /// Collected notes; the note at position `i` has number `i + 1`.
  #[must_use]
  pub fn notes(&self) -> &[Footnote] {
    &self.notes
  }

  /// Replace every ref in `text` with its numbered superscript.
  ///
  /// Call this on the document's text pieces in document order; numbering
  /// carries over between calls. A named ref seen before reuses its number
  /// and keeps the first note. A self-closing ref to a name never defined
  /// is left as written.
  pub fn substitute(&mut self, text: &str) -> String {
    REF_RE
      .replace_all(text, |caps: &Captures| {
        let name = caps
          .get(1)
          .or_else(|| caps.get(2))
          .or_else(|| caps.get(3))
          .map(|m| m.as_str().trim())
          .filter(|name| !name.is_empty());

        if let Some(&index) = name.and_then(|name| self.by_name.get(name)) {
          return citation(index);
        }

        match caps.get(4) {
          Some(note) => citation(self.push(name, note.as_str().trim())),
          None => {
            log::debug!("Reference to undefined footnote: {}", &caps[0]);
            caps[0].to_string()
          },
        }
      })
      .into_owned()
  }

  fn push(&mut self, name: Option<&str>, note: &str) -> usize {
    self.notes.push(Footnote {
      name: name.map(str::to_string),
      note: note.to_string(),
    });
    let index = self.notes.len();
    if let Some(name) = name {
      self.by_name.insert(name.to_string(), index);
    }
    index
  }

  /// The `<references />` list, with each note passed through `render_note`.
  ///
  /// Empty when no ref was collected.
  pub fn render_list<F>(&self, render_note: F) -> String
  where
    F: Fn(&str) -> String,
  {
    if self.notes.is_empty() {
      return String::new();
    }

    let mut html = String::from("<div class=\"references\"><ol>");
    for (i, footnote) in self.notes.iter().enumerate() {
      let index = i + 1;
      let _ = write!(
        html,
        "<li id=\"cite-note-{index}\"><a href=\"#cite-ref-{index}\">↑</a> \
         {}</li>",
        render_note(&footnote.note)
      );
    }
    html.push_str("</ol></div>");
    html
  }
}

fn citation(index: usize) -> String {
  format!(
    "<sup class=\"reference\"><a href=\"#cite-note-{index}\" \
     id=\"cite-ref-{index}\">[{index}]</a></sup>"
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_numbering_and_back_references() {
    let mut footnotes = Footnotes::new();
    let out = footnotes
      .substitute("A<ref>n1</ref> B<ref name=x>n2</ref> C<ref name=x/>");

    assert_eq!(out.matches("<sup class=\"reference\">").count(), 3);
    assert!(out.starts_with(&format!("A{}", citation(1))));
    assert_eq!(out.matches("[2]</a></sup>").count(), 2);
    assert_eq!(footnotes.len(), 2);
    assert_eq!(footnotes.notes()[1].name.as_deref(), Some("x"));
  }

  #[test]
  fn test_named_ref_keeps_first_note() {
    let mut footnotes = Footnotes::new();
    let out = footnotes.substitute(
      "<ref name=\"src\">first</ref><ref name='src'>second</ref>",
    );
    assert_eq!(out, format!("{}{}", citation(1), citation(1)));
    assert_eq!(footnotes.notes(), &[Footnote {
      name: Some("src".to_string()),
      note: "first".to_string(),
    }]);
  }

  #[test]
  fn test_numbering_spans_calls() {
    let mut footnotes = Footnotes::new();
    footnotes.substitute("<ref name=a>one</ref>");
    let out = footnotes.substitute("<ref>two</ref><ref name=a />");
    assert_eq!(out, format!("{}{}", citation(2), citation(1)));
  }

  #[test]
  fn test_unknown_back_reference_is_literal() {
    let mut footnotes = Footnotes::new();
    let out = footnotes.substitute("see <ref name=nowhere/> here");
    assert_eq!(out, "see <ref name=nowhere/> here");
    assert!(footnotes.is_empty());
  }

  #[test]
  fn test_unterminated_ref_is_literal() {
    let mut footnotes = Footnotes::new();
    let out = footnotes.substitute("dangling <ref>never closed");
    assert_eq!(out, "dangling <ref>never closed");
  }

  #[test]
  fn test_multiline_note() {
    let mut footnotes = Footnotes::new();
    footnotes.substitute("x<REF>line one\nline two</REF>");
    assert_eq!(footnotes.notes()[0].note, "line one\nline two");
  }

  #[test]
  fn test_render_list() {
    let mut footnotes = Footnotes::new();
    assert_eq!(footnotes.render_list(str::to_string), "");

    footnotes.substitute("<ref>''a''</ref><ref>b</ref>");
    let html = footnotes.render_list(|note| note.replace("''", "*"));
    assert_eq!(
      html,
      "<div class=\"references\"><ol><li id=\"cite-note-1\"><a \
       href=\"#cite-ref-1\">↑</a> *a*</li><li id=\"cite-note-2\"><a \
       href=\"#cite-ref-2\">↑</a> b</li></ol></div>"
    );
  }
}

//! Phase 3: `{| … |}` tables.
//!
//! This is a deliberately small subset of the MediaWiki table grammar: one
//! level deep (the first `|}` ends the table), with rows, header and data
//! cells, a caption and raw attribute strings.

use std::{fmt::Write as _, sync::LazyLock};

use regex::Regex;

use super::segment::{Segment, TextBuffer};
use crate::utils::build_regex;

static CLASS_ATTR_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)(?:^|\s)class\s*="));

/// Header or data cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
  Header,
  Data,
}

impl CellKind {
  const fn tag(self) -> &'static str {
    match self {
      Self::Header => "th",
      Self::Data => "td",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
  pub kind:    CellKind,
  /// Raw HTML attributes, empty when none were given.
  pub attrs:   String,
  /// Raw Wikitext content.
  pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
  pub attrs: String,
  pub cells: Vec<TableCell>,
}

/// A parsed table, before inline rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
  /// Attributes from the `{|` line.
  pub attrs:   String,
  pub caption: Option<String>,
  /// Rows in order; rows without cells are never stored.
  pub rows:    Vec<TableRow>,
}

impl TableBlock {
  /// Parse the lines between `{|` and `|}`.
  #[must_use]
  pub fn parse(attrs: &str, lines: &[&str]) -> Self {
    let mut table = Self {
      attrs: attrs.trim().to_string(),
      ..Self::default()
    };
    let mut row = TableRow::default();

    for raw in lines {
      let line = raw.trim();

      if let Some(rest) = line.strip_prefix("|+") {
        let (_, content) = split_cell_attrs(rest);
        table.caption = Some(content.trim().to_string());
      } else if let Some(rest) = line.strip_prefix("|-") {
        table.finish_row(std::mem::take(&mut row));
        row.attrs = rest.trim().to_string();
      } else if let Some(rest) = line.strip_prefix('!') {
        // Header lines accept both `!!` and `||` between cells.
        let rest = rest.strip_prefix('!').unwrap_or(rest);
        for part in split_top_level(rest, "!!")
          .into_iter()
          .flat_map(|part| split_top_level(part, "||"))
        {
          row.cells.push(parse_cell(CellKind::Header, part));
        }
      } else if let Some(rest) = line.strip_prefix('|') {
        let rest = rest.strip_prefix('|').unwrap_or(rest);
        for part in split_top_level(rest, "||") {
          row.cells.push(parse_cell(CellKind::Data, part));
        }
      } else if line.is_empty() {
        continue;
      } else if let Some(cell) = row.cells.last_mut() {
        // Continuation of the previous cell; ignored before the row's
        // first cell.
        cell.content.push('\n');
        cell.content.push_str(line);
      }
    }

    table.finish_row(row);
    table
  }

  fn finish_row(&mut self, row: TableRow) {
    if !row.cells.is_empty() {
      self.rows.push(row);
    }
  }

  /// Every piece of Wikitext the table holds: caption first, then cells.
  pub fn contents(&self) -> impl Iterator<Item = &str> {
    self.caption.as_deref().into_iter().chain(
      self
        .rows
        .iter()
        .flat_map(|row| row.cells.iter().map(|cell| cell.content.as_str())),
    )
  }

  /// Render to HTML, passing caption and cell contents through `inline`.
  ///
  /// The table gets the `wikitable` class unless its attributes set a class
  /// of their own.
  pub fn render<F>(&self, inline: F) -> String
  where
    F: Fn(&str) -> String,
  {
    let mut html = String::from("<table");
    if !CLASS_ATTR_RE.is_match(&self.attrs) {
      html.push_str(" class=\"wikitable\"");
    }
    push_attrs(&mut html, &self.attrs);
    html.push('>');

    if let Some(caption) = &self.caption {
      let _ = write!(html, "\n<caption>{}</caption>", inline(caption));
    }

    for row in &self.rows {
      html.push_str("\n<tr");
      push_attrs(&mut html, &row.attrs);
      html.push('>');
      for cell in &row.cells {
        let tag = cell.kind.tag();
        html.push('<');
        html.push_str(tag);
        push_attrs(&mut html, &cell.attrs);
        let _ = write!(html, ">{}</{tag}>", inline(&cell.content));
      }
      html.push_str("</tr>");
    }

    html.push_str("\n</table>");
    html
  }
}

fn push_attrs(html: &mut String, attrs: &str) {
  if !attrs.is_empty() {
    html.push(' ');
    html.push_str(attrs);
  }
}

fn parse_cell(kind: CellKind, raw: &str) -> TableCell {
  let (attrs, content) = split_cell_attrs(raw);
  TableCell {
    kind,
    attrs: attrs.trim().to_string(),
    content: content.trim().to_string(),
  }
}

/// Split `attrs | content` at the first top-level single pipe.
///
/// Text before the pipe only counts as attributes when it is non-empty and
/// holds no link brackets; otherwise the whole cell is content.
fn split_cell_attrs(raw: &str) -> (&str, &str) {
  match find_attr_separator(raw) {
    Some(pos) => {
      let (left, right) = raw.split_at(pos);
      if left.trim().is_empty() || left.contains(['[', ']']) {
        ("", raw)
      } else {
        (left, &right[1..])
      }
    },
    None => ("", raw),
  }
}

/// Position of the first `|` outside quotes, `{{…}}` and `[[…]]`.
fn find_attr_separator(s: &str) -> Option<usize> {
  let mut depth = Depth::default();
  let mut in_quote: Option<char> = None;

  let mut i = 0;
  while i < s.len() {
    let rest = &s[i..];
    if let Some(skip) = depth.step(rest) {
      i += skip;
      continue;
    }

    let ch = rest.chars().next()?;
    match ch {
      '"' | '\'' if in_quote == Some(ch) => in_quote = None,
      '"' | '\'' if in_quote.is_none() => in_quote = Some(ch),
      '|' if in_quote.is_none() && depth.is_top() => return Some(i),
      _ => {},
    }
    i += ch.len_utf8();
  }

  None
}

/// Split on `sep` outside `{{…}}` and `[[…]]`.
pub(super) fn split_top_level<'a>(s: &'a str, sep: &str) -> Vec<&'a str> {
  let mut parts = Vec::new();
  let mut depth = Depth::default();
  let mut last = 0;

  let mut i = 0;
  while i < s.len() {
    let rest = &s[i..];
    if let Some(skip) = depth.step(rest) {
      i += skip;
      continue;
    }
    if depth.is_top() && rest.starts_with(sep) {
      parts.push(&s[last..i]);
      i += sep.len();
      last = i;
      continue;
    }
    i += rest.chars().next().map_or(1, char::len_utf8);
  }

  parts.push(&s[last..]);
  parts
}

/// Nesting of templates and wiki links while scanning a cell.
#[derive(Debug, Default)]
struct Depth {
  template: usize,
  link:     usize,
}

impl Depth {
  /// Consume a bracket pair at the start of `rest`, returning its length.
  fn step(&mut self, rest: &str) -> Option<usize> {
    if rest.starts_with("{{") {
      self.template += 1;
    } else if rest.starts_with("}}") {
      self.template = self.template.saturating_sub(1);
    } else if rest.starts_with("[[") {
      self.link += 1;
    } else if rest.starts_with("]]") {
      self.link = self.link.saturating_sub(1);
    } else {
      return None;
    }
    Some(2)
  }

  const fn is_top(&self) -> bool {
    self.template == 0 && self.link == 0
  }
}

/// Cut every `{| … |}` block out of `text`.
///
/// A table runs from a line starting with `{|` to the first line starting
/// with `|}`. Without such a line the opener stays literal text.
#[must_use]
pub fn extract_tables(text: &str) -> Vec<Segment> {
  let lines: Vec<&str> = text.split_inclusive('\n').collect();
  let mut out = Vec::new();
  let mut buffer = TextBuffer::default();
  let mut i = 0;

  while i < lines.len() {
    let line = lines[i];
    let opener = line.trim_start().strip_prefix("{|");

    let close = opener.and_then(|_| {
      lines[i + 1..]
        .iter()
        .position(|l| l.trim_start().starts_with("|}"))
        .map(|offset| i + 1 + offset)
    });

    match (opener, close) {
      (Some(attrs), Some(close)) => {
        buffer.flush(&mut out);
        out.push(Segment::Table(TableBlock::parse(
          attrs,
          &lines[i + 1..close],
        )));
        // Anything after `|}` on the closing line is dropped with it.
        i = close + 1;
      },
      _ => {
        buffer.push(line);
        i += 1;
      },
    }
  }

  buffer.flush(&mut out);
  out
}

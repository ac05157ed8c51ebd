//! Phase 5: the block-level scan.
//!
//! Each line is tested against the block rules below, top to bottom, and the
//! first rule that matches decides what the line becomes. The order is part
//! of the contract: a `#` line is an ordered list item even when it reads
//! like a redirect, a `{{…}}` line is a template even when it looks like a
//! paragraph, and so on.
//!
//! 1. TOC placeholder on its own line: passed through
//! 2. blank line: ends the paragraph and all lists
//! 3. `= … =` to `====== … ======`: heading
//! 4. `----`: horizontal rule
//! 5. `<references />`: footnote list
//! 6. `{{…}}`: template box
//! 7. `*`: unordered list item, depth = number of `*`
//! 8. `#`: ordered list item, depth = number of `#`
//! 9. `; term : definition`: definition list entry
//! 10. anything else: paragraph text

use std::{fmt::Write as _, sync::LazyLock};

use regex::Regex;

use super::{
  inline::InlineRenderer,
  refs::Footnotes,
  segment::Segment,
  table::split_top_level,
};
use crate::{links::strip_categories, macros::TOC_SENTINEL, utils::build_regex};

static HEADING_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"^(=+)\s*(.+?)\s*=+\s*$"));

static RULE_RE: LazyLock<Regex> = LazyLock::new(|| build_regex(r"^-{4,}\s*$"));

static REFERENCES_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?i)^<references\s*/?>(?:\s*</references>)?\s*$")
});

static TEMPLATE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"^\{\{(.+)\}\}\s*$"));

static UL_ITEM_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"^(\*+)\s*(.*)$"));

static OL_ITEM_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"^(#+)\s*(.*)$"));

static DEFINITION_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"^;\s*(.+?)\s*:\s*(.*)$"));

/// Tags that make a one-line paragraph a block of its own.
const BLOCK_TAGS: &[&str] = &[
  "<figure",
  "<div",
  "<table",
  "<ul",
  "<ol",
  "<dl",
  "<pre",
  "<blockquote",
  "<hr",
];

/// Heading levels beyond this are clamped.
const MAX_HEADING_LEVEL: usize = 6;

/// State of the block scan.
struct BlockState<'a> {
  inline:    InlineRenderer<'a>,
  footnotes: &'a Footnotes,
  ul_depth:  usize,
  ol_depth:  usize,
  dl_open:   bool,
  paragraph: Vec<String>,
  out:       Vec<String>,
}

/// Render the segment list produced by the earlier phases.
pub fn render_blocks(
  segments: &[Segment],
  inline: InlineRenderer<'_>,
  footnotes: &Footnotes,
) -> String {
  let mut state = BlockState {
    inline,
    footnotes,
    ul_depth: 0,
    ol_depth: 0,
    dl_open: false,
    paragraph: Vec::new(),
    out: Vec::new(),
  };

  for segment in segments {
    match segment {
      Segment::Text(text) => {
        for line in text.lines() {
          state.line(line);
        }
      },
      Segment::PreRendered(html) => state.block(html.clone()),
      Segment::Table(table) => {
        let html = table.render(|content| state.inline.render(content));
        state.block(html);
      },
    }
  }

  state.flush_paragraph();
  state.close_lists();
  state.out.join("\n")
}

impl BlockState<'_> {
  fn line(&mut self, raw: &str) {
    let line = strip_categories(raw);
    let line = line.trim_end();

    if line.trim() == TOC_SENTINEL {
      self.block(TOC_SENTINEL.to_string());
      return;
    }

    if line.trim().is_empty() {
      self.flush_paragraph();
      self.close_lists();
      return;
    }

    if let Some(caps) = HEADING_RE.captures(line) {
      let level = caps[1].len().min(MAX_HEADING_LEVEL);
      let text = self.inline.render(&caps[2]);
      self.block(format!("<h{level}>{text}</h{level}>"));
      return;
    }

    if RULE_RE.is_match(line) {
      self.block("<hr>".to_string());
      return;
    }

    if REFERENCES_RE.is_match(line) {
      self.flush_paragraph();
      self.close_lists();
      let list = self.footnotes.render_list(|note| self.inline.render(note));
      if !list.is_empty() {
        self.out.push(list);
      }
      return;
    }

    if let Some(caps) = TEMPLATE_RE.captures(line) {
      let html = self.template(&caps[1]);
      self.block(html);
      return;
    }

    if let Some(caps) = UL_ITEM_RE.captures(line) {
      self.flush_paragraph();
      self.close_ordered();
      self.close_definitions();
      self.ul_depth =
        set_depth(&mut self.out, self.ul_depth, caps[1].len(), "ul");
      let item = self.inline.render(&caps[2]);
      self.out.push(format!("<li>{item}</li>"));
      return;
    }

    if let Some(caps) = OL_ITEM_RE.captures(line) {
      self.flush_paragraph();
      self.close_unordered();
      self.close_definitions();
      self.ol_depth =
        set_depth(&mut self.out, self.ol_depth, caps[1].len(), "ol");
      let item = self.inline.render(&caps[2]);
      self.out.push(format!("<li>{item}</li>"));
      return;
    }

    if let Some(caps) = DEFINITION_RE.captures(line) {
      self.flush_paragraph();
      self.close_unordered();
      self.close_ordered();
      if !self.dl_open {
        self.out.push("<dl>".to_string());
        self.dl_open = true;
      }
      let term = self.inline.render(&caps[1]);
      let definition = self.inline.render(&caps[2]);
      self.out.push(format!("<dt>{term}</dt><dd>{definition}</dd>"));
      return;
    }

    self.close_lists();
    self.paragraph.push(line.to_string());
  }

  /// Emit a finished block, ending any open paragraph and list first.
  fn block(&mut self, html: String) {
    self.flush_paragraph();
    self.close_lists();
    self.out.push(html);
  }

  fn flush_paragraph(&mut self) {
    if self.paragraph.is_empty() {
      return;
    }

    let inline = self.inline;
    let lines: Vec<String> = self
      .paragraph
      .drain(..)
      .map(|line| inline.render(&line))
      .collect();

    if let [only] = lines.as_slice() {
      let trimmed = only.trim_start();
      if BLOCK_TAGS.iter().any(|tag| starts_with_tag(trimmed, tag)) {
        self.out.push(only.clone());
        return;
      }
    }

    self.out.push(format!("<p>{}</p>", lines.join("<br>")));
  }

  /// A `{{name|param|key=value}}` line, shown as a box instead of being
  /// expanded.
  fn template(&self, inner: &str) -> String {
    let parts = split_top_level(inner, "|");
    let name = parts.first().map_or("", |n| n.trim());

    let mut html = format!(
      "<div class=\"wiki-template\"><strong \
       class=\"wiki-template-name\">{}</strong>",
      self.inline.render(name)
    );

    let params = &parts[1.min(parts.len())..];
    if !params.is_empty() {
      html.push_str("<dl class=\"wiki-template-params\">");
      let mut position = 0;
      for param in params {
        let (key, value) = match param.split_once('=') {
          Some((key, value)) if !key.contains(['[', '<']) => {
            (key.trim().to_string(), value.trim())
          },
          _ => {
            position += 1;
            (position.to_string(), param.trim())
          },
        };
        let _ = write!(
          html,
          "<dt>{}</dt><dd>{}</dd>",
          self.inline.render(&key),
          self.inline.render(value)
        );
      }
      html.push_str("</dl>");
    }

    html.push_str("</div>");
    html
  }

  fn close_unordered(&mut self) {
    self.ul_depth = set_depth(&mut self.out, self.ul_depth, 0, "ul");
  }

  fn close_ordered(&mut self) {
    self.ol_depth = set_depth(&mut self.out, self.ol_depth, 0, "ol");
  }

  fn close_definitions(&mut self) {
    if self.dl_open {
      self.out.push("</dl>".to_string());
      self.dl_open = false;
    }
  }

  fn close_lists(&mut self) {
    self.close_unordered();
    self.close_ordered();
    self.close_definitions();
  }
}

/// Open or close `<tag>` lists until `target` are open; returns the new depth.
fn set_depth(
  out: &mut Vec<String>,
  mut depth: usize,
  target: usize,
  tag: &str,
) -> usize {
  while depth < target {
    out.push(format!("<{tag}>"));
    depth += 1;
  }
  while depth > target {
    out.push(format!("</{tag}>"));
    depth -= 1;
  }
  depth
}

/// Whether `html` opens with `tag` (e.g. `<div`) as a whole tag name.
fn starts_with_tag(html: &str, tag: &str) -> bool {
  html.strip_prefix(tag).is_some_and(|rest| {
    rest
      .chars()
      .next()
      .is_none_or(|c| c == '>' || c == '/' || c.is_whitespace())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::types::RenderContext;

  fn render(source: &str) -> String {
    let ctx = RenderContext::new("Main", "");
    let footnotes = Footnotes::new();
    render_blocks(
      &[Segment::Text(source.to_string())],
      InlineRenderer::new(&ctx),
      &footnotes,
    )
  }

  #[test]
  fn test_headings() {
    assert_eq!(render("= One ="), "<h1>One</h1>");
    assert_eq!(render("== Two =="), "<h2>Two</h2>");
    assert_eq!(render("====== Six ======"), "<h6>Six</h6>");
    assert_eq!(render("======= Seven ======="), "<h6>Seven</h6>");
    assert_eq!(render("==Tight=="), "<h2>Tight</h2>");
  }

  #[test]
  fn test_paragraphs() {
    assert_eq!(render("Intro text."), "<p>Intro text.</p>");
    assert_eq!(render("one\ntwo\n\nthree"), "<p>one<br>two</p>\n<p>three</p>");
  }

  #[test]
  fn test_heading_flushes_paragraph() {
    assert_eq!(
      render("text\n== H ==\nmore"),
      "<p>text</p>\n<h2>H</h2>\n<p>more</p>"
    );
  }

  #[test]
  fn test_rule() {
    assert_eq!(render("a\n----\nb"), "<p>a</p>\n<hr>\n<p>b</p>");
    assert_eq!(render("---"), "<p>---</p>");
  }

  #[test]
  fn test_nested_lists() {
    assert_eq!(
      render("* a\n** b\n* c"),
      "<ul>\n<li>a</li>\n<ul>\n<li>b</li>\n</ul>\n<li>c</li>\n</ul>"
    );
  }

  #[test]
  fn test_list_kind_switch() {
    assert_eq!(
      render("* a\n# b"),
      "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>"
    );
  }

  #[test]
  fn test_list_ends_at_paragraph_text() {
    assert_eq!(render("# a\ntext"), "<ol>\n<li>a</li>\n</ol>\n<p>text</p>");
  }

  #[test]
  fn test_definition_list() {
    assert_eq!(
      render("; Term : Meaning\n; Other : Thing"),
      "<dl>\n<dt>Term</dt><dd>Meaning</dd>\n<dt>Other</dt><dd>Thing</dd>\n</dl>"
    );
  }

  #[test]
  fn test_template_box() {
    let html = render("{{Infobox|Rust|year=2015|link=[[Rust Lang|site]]}}");
    assert!(html.starts_with(
      "<div class=\"wiki-template\"><strong \
       class=\"wiki-template-name\">Infobox</strong>"
    ));
    assert!(html.contains("<dt>1</dt><dd>Rust</dd>"));
    assert!(html.contains("<dt>year</dt><dd>2015</dd>"));
    assert!(html.contains("<dt>link</dt><dd><a href=\"/wiki/Main/rust-lang\""));
  }

  #[test]
  fn test_toc_sentinel_passthrough() {
    assert_eq!(
      render(&format!("text\n{TOC_SENTINEL}\n= A =")),
      format!("<p>text</p>\n{TOC_SENTINEL}\n<h1>A</h1>")
    );
  }

  #[test]
  fn test_block_html_is_not_wrapped() {
    assert_eq!(render("<div>x</div>"), "<div>x</div>");
    assert_eq!(render("<divx>y</divx>"), "<p><divx>y</divx></p>");
  }

  #[test]
  fn test_category_only_line_is_blank() {
    assert_eq!(render("a\n[[Category:X]]\nb"), "<p>a</p>\n<p>b</p>");
  }

  #[test]
  fn test_references_with_notes() {
    let ctx = RenderContext::new("Main", "");
    let mut footnotes = Footnotes::new();
    let text = footnotes.substitute("Fact<ref>''Source''</ref>\n<references />");
    let html = render_blocks(
      &[Segment::Text(text)],
      InlineRenderer::new(&ctx),
      &footnotes,
    );
    assert!(html.contains("<div class=\"references\"><ol><li id=\"cite-note-1\">"));
    assert!(html.contains("<i>Source</i>"));
  }

  #[test]
  fn test_references_without_notes() {
    assert_eq!(render("text\n<references />"), "<p>text</p>");
  }
}

//! Macro expansion run on raw source before any format engine sees it.
//!
//! The only macro is the table-of-contents request. Every spelling of it is
//! replaced by [`TOC_SENTINEL`], which the post-processor later swaps for the
//! generated contents list.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
  types::Format,
  utils::{build_regex, codeblock::FenceTracker},
  wikitext::code::is_indented_code,
};

/// Placeholder left where a table of contents was requested.
///
/// An HTML comment passes through comrak and the Wikitext engine untouched;
/// engines that escape raw HTML turn it into [`TOC_SENTINEL_ESCAPED`].
pub const TOC_SENTINEL: &str = "<!--wiki:toc-->";

/// [`TOC_SENTINEL`] after HTML escaping.
pub const TOC_SENTINEL_ESCAPED: &str = "&lt;!--wiki:toc--&gt;";

static TOC_MACRO_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i:\{\{\s*toc\s*\}\})|__TOC__"));

static VERBATIM_OPEN_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)<(?:pre|syntaxhighlight|source)\b"));

static VERBATIM_CLOSE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)</(?:pre|syntaxhighlight|source)\s*>"));

/// Replace `{{toc}}` (any case, optional inner whitespace) and `__TOC__` with
/// [`TOC_SENTINEL`].
///
/// Code is displayed literally, so macros inside it are left alone:
///
/// - fenced code blocks and `<pre>`, `<syntaxhighlight>` or `<source>`
///   elements, in every format;
/// - Wikitext lines starting with a space;
/// - Markdown indented code blocks and RST literal blocks;
/// - backtick code spans in Markdown and RST.
#[must_use]
pub fn expand_macros(source: &str, format: Format) -> String {
  if !TOC_MACRO_RE.is_match(source) {
    return source.to_string();
  }

  let mut out = String::with_capacity(source.len());
  let mut fences = FenceTracker::new();
  let mut indented = IndentedCode::new(format);
  let mut in_verbatim = false;

  for line in source.split_inclusive('\n') {
    let was_in_fence = fences.in_code_block();
    fences = fences.process_line(line);

    if was_in_fence || fences.in_code_block() {
      indented.reset();
      out.push_str(line);
      continue;
    }

    if in_verbatim {
      in_verbatim = !VERBATIM_CLOSE_RE.is_match(line);
      indented.reset();
      out.push_str(line);
      continue;
    }

    if let Some(open) = VERBATIM_OPEN_RE.find(line) {
      in_verbatim = !VERBATIM_CLOSE_RE.is_match(&line[open.end()..]);
      indented.reset();
      out.push_str(line);
      continue;
    }

    if indented.is_code(line) {
      out.push_str(line);
      continue;
    }

    match format {
      Format::Wikitext => out.push_str(&expand_line(line)),
      Format::Markdown | Format::Rst => {
        out.push_str(&expand_outside_code_spans(line));
      },
    }
  }

  out
}

fn expand_line(text: &str) -> String {
  TOC_MACRO_RE.replace_all(text, TOC_SENTINEL).into_owned()
}

/// Expand macros in `line`, skipping backtick code spans.
///
/// A span opens with a run of backticks and closes at the next run of the
/// same length. A run without a partner is plain text.
fn expand_outside_code_spans(line: &str) -> String {
  let mut out = String::with_capacity(line.len());
  let mut rest = line;

  while let Some(start) = rest.find('`') {
    let run = backtick_run(&rest[start..]);
    let after = &rest[start + run..];

    match find_closing_run(after, run) {
      Some(close) => {
        let end = start + run + close + run;
        out.push_str(&expand_line(&rest[..start]));
        out.push_str(&rest[start..end]);
        rest = &rest[end..];
      },
      None => {
        out.push_str(&expand_line(&rest[..start + run]));
        rest = after;
      },
    }
  }

  out.push_str(&expand_line(rest));
  out
}

fn backtick_run(text: &str) -> usize {
  text.bytes().take_while(|&b| b == b'`').count()
}

/// Offset of the next backtick run in `text` that is exactly `len` long.
fn find_closing_run(text: &str, len: usize) -> Option<usize> {
  let mut offset = 0;
  while let Some(pos) = text[offset..].find('`') {
    let start = offset + pos;
    let run = backtick_run(&text[start..]);
    if run == len {
      return Some(start);
    }
    offset = start + run;
  }
  None
}

/// Line-by-line tracking of indentation-based code blocks.
#[derive(Debug, Clone, Copy)]
struct IndentedCode {
  format:   Format,
  /// An indented line here would start a code block: no Markdown paragraph
  /// is open, or the last RST paragraph ended with `::`.
  can_open: bool,
  inside:   bool,
}

impl IndentedCode {
  const fn new(format: Format) -> Self {
    Self {
      format,
      can_open: matches!(format, Format::Markdown),
      inside: false,
    }
  }

  /// Forget the current block after a line that belongs to another
  /// construct.
  const fn reset(&mut self) {
    *self = Self::new(self.format);
  }

  fn is_code(&mut self, line: &str) -> bool {
    let blank = line.trim().is_empty();

    match self.format {
      Format::Wikitext => is_indented_code(line),
      Format::Markdown => {
        if blank {
          self.can_open = true;
          return false;
        }
        let code =
          markdown_indent(line) >= 4 && (self.inside || self.can_open);
        self.inside = code;
        self.can_open = !code && line.trim_start().starts_with('#');
        code
      },
      Format::Rst => {
        if blank {
          return false;
        }
        if line.starts_with([' ', '\t']) && (self.inside || self.can_open) {
          self.inside = true;
          self.can_open = false;
          return true;
        }
        self.inside = false;
        self.can_open = line.trim_end().ends_with("::");
        false
      },
    }
  }
}

/// Width of the leading whitespace, with tab stops every four columns.
fn markdown_indent(line: &str) -> usize {
  let mut width = 0;
  for c in line.chars() {
    match c {
      ' ' => width += 1,
      '\t' => width += 4 - width % 4,
      _ => break,
    }
  }
  width
}

/// Whether rendered HTML still carries a TOC placeholder in either form.
#[must_use]
pub fn has_toc_sentinel(html: &str) -> bool {
  html.contains(TOC_SENTINEL) || html.contains(TOC_SENTINEL_ESCAPED)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_toc_spellings() {
    for source in ["{{toc}}", "{{TOC}}", "{{ Toc }}", "__TOC__"] {
      assert_eq!(
        expand_macros(source, Format::Wikitext),
        TOC_SENTINEL,
        "for {source}"
      );
    }
  }

  #[test]
  fn test_non_macros_untouched() {
    for source in ["{{tocs}}", "__toc__", "{{table of contents}}", "toc"] {
      assert_eq!(expand_macros(source, Format::Wikitext), source);
    }
  }

  #[test]
  fn test_mid_line_and_line_endings() {
    let out =
      expand_macros("intro {{toc}} outro\r\n= A =\n", Format::Wikitext);
    assert_eq!(out, format!("intro {TOC_SENTINEL} outro\r\n= A =\n"));
  }

  #[test]
  fn test_fenced_code_is_literal() {
    let source = "```\n{{toc}}\n```\n__TOC__\n";
    let out = expand_macros(source, Format::Wikitext);
    assert!(out.starts_with("```\n{{toc}}\n```\n"));
    assert!(out.ends_with(&format!("{TOC_SENTINEL}\n")));
  }

  #[test]
  fn test_verbatim_tags_are_literal() {
    let source =
      "<pre>\n{{toc}}\n</pre>\n<syntaxhighlight lang=\"text\">__TOC__\n\
       </syntaxhighlight>\n{{toc}}";
    let out = expand_macros(source, Format::Wikitext);
    assert_eq!(out.matches(TOC_SENTINEL).count(), 1);
    assert!(out.contains("<pre>\n{{toc}}\n</pre>"));
    assert!(out.ends_with(TOC_SENTINEL));
  }

  #[test]
  fn test_wikitext_indented_lines_are_literal() {
    let out =
      expand_macros(" <!-- indented __TOC__ -->\n__TOC__\n", Format::Wikitext);
    assert_eq!(out, format!(" <!-- indented __TOC__ -->\n{TOC_SENTINEL}\n"));
  }

  #[test]
  fn test_code_spans_are_literal() {
    let out = expand_macros(
      "Write `{{toc}}` or ``__TOC__`` for {{toc}}",
      Format::Markdown,
    );
    assert_eq!(
      out,
      format!("Write `{{{{toc}}}}` or ``__TOC__`` for {TOC_SENTINEL}")
    );

    let out = expand_macros("a `` b {{toc}}", Format::Markdown);
    assert_eq!(out, format!("a `` b {TOC_SENTINEL}"));

    let out = expand_macros("Use ``{{toc}}`` here.", Format::Rst);
    assert_eq!(out, "Use ``{{toc}}`` here.");
  }

  #[test]
  fn test_markdown_indented_code_is_literal() {
    let source =
      "Intro\n\n    __TOC__\n\n\tmore {{toc}}\n\nText\n    {{toc}}\n";
    let out = expand_macros(source, Format::Markdown);
    assert!(out.starts_with("Intro\n\n    __TOC__\n\n\tmore {{toc}}\n"));
    // A lazy continuation line of a paragraph is not code.
    assert!(out.ends_with(&format!("Text\n    {TOC_SENTINEL}\n")));
  }

  #[test]
  fn test_markdown_code_after_heading() {
    let out = expand_macros("# Title\n    {{toc}}\n", Format::Markdown);
    assert_eq!(out, "# Title\n    {{toc}}\n");
  }

  #[test]
  fn test_rst_literal_blocks_are_literal() {
    let source = "Example::\n\n    {{toc}}\n\n  __TOC__\n\nBack \
                  {{toc}}\n\n  quoted {{toc}}\n";
    let out = expand_macros(source, Format::Rst);
    assert!(out.starts_with("Example::\n\n    {{toc}}\n\n  __TOC__\n\n"));
    assert_eq!(out.matches(TOC_SENTINEL).count(), 2);
  }

  #[test]
  fn test_has_toc_sentinel() {
    assert!(has_toc_sentinel("<p><!--wiki:toc--></p>"));
    assert!(has_toc_sentinel("<p>&lt;!--wiki:toc--&gt;</p>"));
    assert!(!has_toc_sentinel("<p>{{toc}}</p>"));
  }
}

//! Phase 1: pull code out of the document before anything else parses it.

use std::sync::LazyLock;

use regex::Regex;

use super::segment::{Segment, TextBuffer};
use crate::{
  syntax::{SyntaxManager, render_code_block},
  utils::{build_regex, codeblock::Fence, escape_text},
};

static CODE_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?i)<(syntaxhighlight|source|pre)\b([^>]*)>")
});

static HIGHLIGHT_CLOSE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)</(?:syntaxhighlight|source)\s*>"));

static PRE_CLOSE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)</pre\s*>"));

static LANG_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r#"(?i)\blang\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
});

/// Split `source` into text and pre-rendered code.
///
/// Handles, in this order: `<syntaxhighlight lang=..>` (and its older
/// spelling `<source>`), `<pre>`, fenced blocks and lines indented by a
/// space. Unterminated constructs stay in the text.
pub fn extract_code(
  source: &str,
  syntax: Option<&SyntaxManager>,
) -> Vec<Segment> {
  let mut out = Vec::new();

  for (index, segment) in
    extract_code_tags(source, syntax).into_iter().enumerate()
  {
    match segment {
      // Only the first text segment starts at the beginning of a line; the
      // others start right after a closing tag.
      Segment::Text(text) => {
        out.extend(extract_code_lines(&text, index > 0, syntax));
      },
      other => out.push(other),
    }
  }

  out
}

fn extract_code_tags(
  source: &str,
  syntax: Option<&SyntaxManager>,
) -> Vec<Segment> {
  let mut out = Vec::new();
  let mut text = TextBuffer::default();
  let mut rest = source;

  while let Some(open) = CODE_OPEN_RE.captures(rest) {
    let (Some(whole), Some(tag)) = (open.get(0), open.get(1)) else {
      break;
    };
    let is_pre = tag.as_str().eq_ignore_ascii_case("pre");
    let close_re = if is_pre { &PRE_CLOSE_RE } else { &HIGHLIGHT_CLOSE_RE };

    let after_open = &rest[whole.end()..];
    let Some(close) = close_re.find(after_open) else {
      // Unterminated: keep the opening tag as text and look further on.
      text.push(&rest[..whole.end()]);
      rest = after_open;
      continue;
    };

    text.push(&rest[..whole.start()]);
    text.flush(&mut out);

    let code = trim_code(&after_open[..close.start()]);
    let html = if is_pre {
      format!("<pre>{}</pre>", escape_text(code))
    } else {
      let attrs = open.get(2).map_or("", |m| m.as_str());
      render_code_block(syntax, code, lang_attr(attrs))
    };
    out.push(Segment::PreRendered(html));

    rest = &after_open[close.end()..];
  }

  text.push(rest);
  text.flush(&mut out);
  out
}

fn lang_attr(attrs: &str) -> Option<&str> {
  let caps = LANG_ATTR_RE.captures(attrs)?;
  caps
    .get(1)
    .or_else(|| caps.get(2))
    .or_else(|| caps.get(3))
    .map(|m| m.as_str())
}

/// Drop the line break after the opening tag and trailing whitespace.
fn trim_code(code: &str) -> &str {
  code
    .strip_prefix("\r\n")
    .or_else(|| code.strip_prefix('\n'))
    .unwrap_or(code)
    .trim_end()
}

fn strip_line_ending(line: &str) -> &str {
  line.trim_end_matches(['\n', '\r'])
}

pub(crate) fn is_indented_code(line: &str) -> bool {
  line.starts_with(' ') && !line.trim().is_empty()
}

fn extract_code_lines(
  text: &str,
  starts_mid_line: bool,
  syntax: Option<&SyntaxManager>,
) -> Vec<Segment> {
  let lines: Vec<&str> = text.split_inclusive('\n').collect();
  let mut out = Vec::new();
  let mut buffer = TextBuffer::default();
  let mut i = 0;

  if starts_mid_line && let Some(first) = lines.first() {
    buffer.push(first);
    i = 1;
  }

  while i < lines.len() {
    let line = lines[i];

    if let Some(open) = Fence::parse(strip_line_ending(line)) {
      let close = lines[i + 1..]
        .iter()
        .position(|l| {
          Fence::parse(strip_line_ending(l)).is_some_and(|f| open.is_closed_by(&f))
        })
        .map(|offset| i + 1 + offset);

      if let Some(close) = close {
        buffer.flush(&mut out);
        let code: String = lines[i + 1..close].concat();
        out.push(Segment::PreRendered(render_code_block(
          syntax,
          code.trim_end(),
          open.language(),
        )));
        i = close + 1;
        continue;
      }
    }

    if is_indented_code(line) {
      buffer.flush(&mut out);
      let mut code = String::new();
      while i < lines.len() && is_indented_code(lines[i]) {
        if !code.is_empty() {
          code.push('\n');
        }
        code.push_str(strip_line_ending(&lines[i][1..]));
        i += 1;
      }
      out.push(Segment::PreRendered(format!(
        "<pre>{}</pre>",
        escape_text(&code)
      )));
      continue;
    }

    buffer.push(line);
    i += 1;
  }

  buffer.flush(&mut out);
  out
}

//! Format-independent passes over rendered HTML.
//!
//! In order: heading anchors, table of contents, external link marking and
//! the cache stamp.

use std::{
  collections::{HashMap, HashSet},
  fmt::Write as _,
  sync::LazyLock,
};

use kuchikikiki::parse_html;
use regex::{Captures, Regex};
use tendril::TendrilSink;

use crate::{
  extract::cache_stamp,
  macros::{TOC_SENTINEL, TOC_SENTINEL_ESCAPED, has_toc_sentinel},
  types::HeadingEntry,
  utils::{anchor_slug, build_regex, escape_text},
};

static HEADING_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?is)<h([1-6])((?:\s[^>]*)?)>(.*?)</h[1-6]\s*>")
});

static ID_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r#"(?i)\s+id\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
});

static SENTINEL_RE: LazyLock<Regex> = LazyLock::new(|| {
  let sentinel = format!(
    "(?:{}|{})",
    regex::escape(TOC_SENTINEL),
    regex::escape(TOC_SENTINEL_ESCAPED)
  );
  build_regex(&format!(r"<p>\s*{sentinel}\s*</p>|{sentinel}"))
});

static PARAGRAPH_OPEN_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)<p(?:\s[^>]*)?>"));

static EMPTY_PARAGRAPH_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"<p>\s*</p>"));

static ANCHOR_TAG_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)<a\b([^>]*)>"));

static HREF_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)
});

static TARGET_ATTR_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)\btarget\s*="));

static REL_ATTR_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)\brel\s*="));

static ABSOLUTE_URL_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)^(?:[a-z][a-z0-9+.-]*:)?//"));

/// Post-processed page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostProcessed {
  pub html:     String,
  pub headings: Vec<HeadingEntry>,
}

/// The post-processing passes, configured once per renderer.
#[derive(Debug, Clone)]
pub struct PostProcessor {
  toc_title:           String,
  mark_external_links: bool,
}

impl Default for PostProcessor {
  fn default() -> Self {
    Self::new("Contents", true)
  }
}

impl PostProcessor {
  #[must_use]
  pub fn new(toc_title: impl Into<String>, mark_external_links: bool) -> Self {
    Self {
      toc_title: toc_title.into(),
      mark_external_links,
    }
  }

  /// Run every pass over `html` and prepend the cache stamp.
  #[must_use]
  pub fn process(&self, html: &str) -> PostProcessed {
    let (html, headings) = assign_heading_anchors(html);
    log::trace!("Post-processing: {} headings", headings.len());

    let html = if has_toc_sentinel(&html) {
      self.insert_toc(&html, &headings)
    } else {
      html
    };

    let html = if self.mark_external_links {
      mark_external_links(&html)
    } else {
      html
    };

    PostProcessed {
      html: format!("{}\n{html}", cache_stamp()),
      headings,
    }
  }

  /// Replace the first TOC placeholder with the contents list and drop the
  /// others. Without headings every placeholder is just dropped.
  ///
  /// A placeholder in the middle of a paragraph splits it, so that the list
  /// is not nested inside `<p>`.
  fn insert_toc(&self, html: &str, headings: &[HeadingEntry]) -> String {
    let mut toc = (!headings.is_empty())
      .then(|| build_toc(&self.toc_title, headings));

    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    let mut split = false;

    for found in SENTINEL_RE.find_iter(html) {
      let chunk = &html[last..found.start()];
      out.push_str(if split { chunk.trim_start() } else { chunk });
      last = found.end();

      let Some(toc) = toc.take() else {
        continue;
      };
      if inside_paragraph(&html[..found.start()]) {
        out.truncate(out.trim_end().len());
        out.push_str("</p>");
        out.push_str(&toc);
        out.push_str("<p>");
        split = true;
      } else {
        out.push_str(&toc);
      }
    }

    let rest = &html[last..];
    if !split {
      out.push_str(rest);
      return out;
    }
    out.push_str(rest.trim_start());
    EMPTY_PARAGRAPH_RE.replace_all(&out, "").into_owned()
  }
}

/// Whether the end of `before` lies inside an open `<p>` element.
fn inside_paragraph(before: &str) -> bool {
  let open = PARAGRAPH_OPEN_RE.find_iter(before).last().map(|m| m.start());
  let close = before.rfind("</p>");
  open.is_some_and(|open| close.is_none_or(|close| open > close))
}

/// Give every heading a unique `id`, replacing any it already had.
///
/// The anchor is the slug of the heading's text. The k-th repeat of a slug
/// `s` gets `s-k`, skipping ids already taken.
pub fn assign_heading_anchors(html: &str) -> (String, Vec<HeadingEntry>) {
  let mut headings = Vec::new();
  let mut used: HashSet<String> = HashSet::new();
  let mut repeats: HashMap<String, usize> = HashMap::new();

  let html = HEADING_TAG_RE.replace_all(html, |caps: &Captures| {
    let level = caps[1].parse::<u8>().unwrap_or(1);
    let attrs = ID_ATTR_RE.replace_all(&caps[2], "");
    let inner = &caps[3];

    let text = plain_text(inner);
    let base = anchor_slug(&text);
    let mut anchor = base.clone();
    while used.contains(&anchor) {
      let count = repeats.entry(base.clone()).or_insert(0);
      *count += 1;
      anchor = format!("{base}-{count}");
    }
    used.insert(anchor.clone());

    let out = format!("<h{level} id=\"{anchor}\"{attrs}>{inner}</h{level}>");
    headings.push(HeadingEntry {
      level,
      anchor,
      text,
    });
    out
  });

  (html.into_owned(), headings)
}

/// Text of an HTML fragment with tags removed and whitespace collapsed.
///
/// Footnote markers (`<sup class="reference">`) are not part of the text.
fn plain_text(fragment: &str) -> String {
  let document = parse_html().one(fragment);
  if let Ok(markers) = document.select("sup.reference") {
    for marker in markers.collect::<Vec<_>>() {
      marker.as_node().detach();
    }
  }
  let text = document.text_contents();
  text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Nested, numbered contents list.
///
/// Nesting is relative to the shallowest heading. A heading more than one
/// level below its predecessor gets empty wrapper items for the levels in
/// between.
fn build_toc(title: &str, headings: &[HeadingEntry]) -> String {
  let min_level = headings.iter().map(|h| h.level).min().unwrap_or(1);

  let mut html = format!(
    "<div class=\"toc\"><div class=\"toc-title\">{}</div>",
    escape_text(title)
  );
  let mut numbers: Vec<usize> = Vec::new();

  for heading in headings {
    let depth = usize::from(heading.level - min_level) + 1;

    if numbers.len() >= depth {
      while numbers.len() > depth {
        html.push_str("</li></ol>");
        numbers.pop();
      }
      html.push_str("</li>");
      if let Some(last) = numbers.last_mut() {
        *last += 1;
      }
    } else {
      while numbers.len() < depth {
        html.push_str("<ol>");
        numbers.push(1);
        if numbers.len() < depth {
          html.push_str("<li>");
        }
      }
    }

    let number = numbers
      .iter()
      .map(ToString::to_string)
      .collect::<Vec<_>>()
      .join(".");
    let _ = write!(
      html,
      "<li><a href=\"#{}\"><span class=\"tocnumber\">{number}</span> <span \
       class=\"toctext\">{}</span></a>",
      heading.anchor,
      escape_text(&heading.text)
    );
  }

  while numbers.pop().is_some() {
    html.push_str("</li></ol>");
  }
  html.push_str("</div>");
  html
}

/// Open absolute and protocol-relative links in a new tab.
///
/// Links that already choose a target are left alone; an existing `rel` is
/// kept.
#[must_use]
pub fn mark_external_links(html: &str) -> String {
  ANCHOR_TAG_RE
    .replace_all(html, |caps: &Captures| {
      let attrs = &caps[1];
      let href = HREF_ATTR_RE.captures(attrs).and_then(|href| {
        href.get(1).or_else(|| href.get(2)).or_else(|| href.get(3))
      });
      let is_external =
        href.is_some_and(|href| ABSOLUTE_URL_RE.is_match(href.as_str().trim()));

      if !is_external || TARGET_ATTR_RE.is_match(attrs) {
        return caps[0].to_string();
      }

      let rel = if REL_ATTR_RE.is_match(attrs) {
        ""
      } else {
        " rel=\"noopener noreferrer\""
      };
      format!("<a{attrs} target=\"_blank\"{rel}>")
    })
    .into_owned()
}

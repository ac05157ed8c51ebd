//! Inline Wikitext: links, file embeds and quote formatting.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{
  links::{FILE_EMBED_RE, WIKILINK_RE, render_file_embed, render_wikilink, strip_categories},
  types::RenderContext,
  utils::{build_regex, escape_attr},
};

static EXTERNAL_LABELED_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"\[(\w+://[^\s\]]+)\s+([^\]]+)\]"));

static EXTERNAL_BARE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"\[(\w+://[^\s\]]+)\]"));

static FREE_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r#"(^|[\s(])(https?://[^\s<>\[\]"']+)"#)
});

static BOLD_ITALIC_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"'{5}(.+?)'{5}"));

static BOLD_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"'{3}(.+?)'{3}"));

static ITALIC_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"'{2}(.+?)'{2}"));

/// A whole `<a>` element, or any other single tag.
static ANCHOR_OR_TAG_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?is)<a\b[^>]*>.*?</a\s*>|<[^>]*>"));

/// Characters trimmed from the end of a free-standing URL.
const URL_TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', ')'];

/// Renders inline Wikitext for one page.
#[derive(Debug, Clone, Copy)]
pub struct InlineRenderer<'a> {
  ctx: &'a RenderContext,
}

impl<'a> InlineRenderer<'a> {
  #[must_use]
  pub const fn new(ctx: &'a RenderContext) -> Self {
    Self { ctx }
  }

  /// Render one fragment of inline text to HTML.
  ///
  /// Raw HTML in the text is kept as is. Free-standing URLs are linked last,
  /// and only outside tags and existing links.
  #[must_use]
  pub fn render(&self, text: &str) -> String {
    let text = strip_categories(text);
    let text = bracketed_external_links(&text);
    let text = FILE_EMBED_RE.replace_all(&text, |caps: &Captures| {
      render_file_embed(self.ctx, &caps[1], &caps[2])
    });
    let text = WIKILINK_RE
      .replace_all(&text, |caps: &Captures| render_wikilink(self.ctx, caps));
    let text = free_urls(&text);
    format_quotes(&text)
  }
}

fn bracketed_external_links(text: &str) -> String {
  let text = EXTERNAL_LABELED_RE.replace_all(text, |caps: &Captures| {
    external_anchor(&caps[1], &caps[2])
  });
  EXTERNAL_BARE_RE
    .replace_all(&text, |caps: &Captures| external_anchor(&caps[1], &caps[1]))
    .into_owned()
}

/// Link bare URLs in the text between tags, leaving `<a>` elements alone.
fn free_urls(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut last = 0;
  for markup in ANCHOR_OR_TAG_RE.find_iter(text) {
    out.push_str(&free_urls_in_text(&text[last..markup.start()]));
    out.push_str(markup.as_str());
    last = markup.end();
  }
  out.push_str(&free_urls_in_text(&text[last..]));
  out
}

fn free_urls_in_text(text: &str) -> String {
  FREE_URL_RE
    .replace_all(text, |caps: &Captures| {
      let url = &caps[2];
      let trimmed = url.trim_end_matches(URL_TRAILING_PUNCTUATION);
      format!(
        "{}{}{}",
        &caps[1],
        external_anchor(trimmed, trimmed),
        &url[trimmed.len()..]
      )
    })
    .into_owned()
}

fn external_anchor(href: &str, label: &str) -> String {
  format!(
    "<a href=\"{}\" class=\"external\">{label}</a>",
    escape_attr(href)
  )
}

/// `'''''x'''''`, `'''x'''` and `''x''`, longest marker first.
fn format_quotes(text: &str) -> String {
  let text = BOLD_ITALIC_RE.replace_all(text, "<b><i>$1</i></b>");
  let text = BOLD_RE.replace_all(&text, "<b>$1</b>");
  ITALIC_RE.replace_all(&text, "<i>$1</i>").into_owned()
}

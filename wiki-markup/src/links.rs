//! Wiki link, category and attachment rewriting.
//!
//! Markdown and reStructuredText sources are rewritten *before* they reach
//! their engine, into the engine's own link and image syntax. The Wikitext
//! engine instead calls [`render_wikilink`] and [`render_file_embed`] while it
//! renders inline text, since it emits HTML directly.

use std::{borrow::Cow, fmt::Write as _, sync::LazyLock};

use regex::{Captures, Regex};

use crate::{
  types::{Format, RenderContext},
  utils::{build_regex, codeblock::FenceTracker, escape_attr, slugify},
};

/// `[[Category:Name]]`, any case, with the name in group 1.
pub static CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?i)\[\[\s*Category\s*:\s*([^\]|]+?)\s*(?:\|[^\]]*)?\]\]")
});

/// `[[Target]]` or `[[Target|Label]]`.
pub static WIKILINK_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"\[\[([^\[\]|]+)(?:\|([^\[\]]+))?\]\]")
});

/// `[[File:name|opts]]` / `[[Image:name|opts]]`, any case.
pub static FILE_EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?i)\[\[\s*(?:File|Image)\s*:([^\]|]+)((?:\|[^\]]*)?)\]\]")
});

/// `[label](attachment:name|size)`, optionally as an image. The destination
/// may also be written `<attachment:name|size>`, and names may hold spaces.
static MD_ATTACHMENT_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(concat!(
    r"(!?)\[([^\]]*)\]\(\s*(?:",
    r"<attachment:([^>|]+)(?:\|([^>\s]*))?>",
    r"|attachment:([^)|<>]+?)(?:\|([^)\s]*))?",
    r")\s*\)",
  ))
});

static RST_IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(
    r"^(\s*)(\.\.\s+(?:image|figure)::\s+)attachment:([^\s|]+)(?:\|(\S+))?\s*$",
  )
});

static RST_CATEGORY_LINE_RE: LazyLock<Regex> =
  LazyLock::new(|| build_regex(r"(?i)^\s*\.\.\s+category::"));

/// Width and height parsed from an image size modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageSize {
  pub width:  Option<u32>,
  pub height: Option<u32>,
}

impl ImageSize {
  /// Parse `200`, `x150` or `300x200`, each optionally suffixed with `px`.
  ///
  /// With `require_px` the suffix is mandatory, as in Wikitext file options
  /// where a bare number could just as well be a caption.
  #[must_use]
  pub fn parse(token: &str, require_px: bool) -> Option<Self> {
    let token = token.trim();
    let body = match token.strip_suffix("px") {
      Some(body) => body,
      None if require_px => return None,
      None => token,
    };

    let (width, height) = match body.split_once('x') {
      Some((w, h)) => (w, Some(h)),
      None => (body, None),
    };

    let parse_dim = |s: &str| -> Result<Option<u32>, ()> {
      if s.is_empty() {
        Ok(None)
      } else if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().map(Some).map_err(|_| ())
      } else {
        Err(())
      }
    };

    let size = Self {
      width:  parse_dim(width).ok()?,
      height: height.map_or(Ok(None), parse_dim).ok()?,
    };

    (size.width.is_some() || size.height.is_some()).then_some(size)
  }

  /// ` width="…" height="…"` for whichever dimensions are set.
  #[must_use]
  pub fn html_attrs(&self) -> String {
    let mut attrs = String::new();
    if let Some(w) = self.width {
      let _ = write!(attrs, " width=\"{w}\"");
    }
    if let Some(h) = self.height {
      let _ = write!(attrs, " height=\"{h}\"");
    }
    attrs
  }
}

/// Resolved link destination and label of a `[[Target|Label]]` match.
fn wikilink_parts<'c>(
  ctx: &RenderContext,
  caps: &Captures<'c>,
) -> (String, &'c str) {
  let target = caps.get(1).map_or("", |m| m.as_str()).trim();
  let label = caps.get(2).map_or(target, |m| m.as_str().trim());
  (ctx.page_url(&slugify(target)), label)
}

/// Whether a wiki link target names a file or category rather than a page.
fn is_special_target(target: &str) -> bool {
  let lowered = target.trim_start().to_lowercase();
  ["file:", "image:", "category:"]
    .iter()
    .any(|prefix| lowered.starts_with(prefix))
}

/// Remove every `[[Category:..]]` tag from `text`.
#[must_use]
pub fn strip_categories(text: &str) -> Cow<'_, str> {
  CATEGORY_RE.replace_all(text, "")
}

/// Rewrite wiki syntax into the native syntax of `format`.
///
/// Wikitext is returned unchanged; its engine resolves links itself.
#[must_use]
pub fn preprocess(source: &str, format: Format, ctx: &RenderContext) -> String {
  match format {
    Format::Markdown => preprocess_markdown(source, ctx),
    Format::Rst => preprocess_rst(source, ctx),
    Format::Wikitext => source.to_string(),
  }
}

/// Markdown: wiki links become `[label](href)`, `attachment:` images and
/// links are resolved. Fenced code blocks are left alone.
#[must_use]
pub fn preprocess_markdown(source: &str, ctx: &RenderContext) -> String {
  let mut out = String::with_capacity(source.len());
  let mut fences = FenceTracker::new();

  for line in source.split_inclusive('\n') {
    let was_in_fence = fences.in_code_block();
    fences = fences.process_line(line);
    if was_in_fence || fences.in_code_block() {
      out.push_str(line);
      continue;
    }

    let line = strip_categories(line);
    let line = MD_ATTACHMENT_RE
      .replace_all(&line, |caps: &Captures| markdown_attachment(ctx, caps));
    let line = WIKILINK_RE.replace_all(&line, |caps: &Captures| {
      let whole = &caps[0];
      if is_special_target(&caps[1]) {
        return whole.to_string();
      }
      let (href, label) = wikilink_parts(ctx, caps);
      format!("[{label}]({href})")
    });
    out.push_str(&line);
  }

  out
}

fn markdown_attachment(ctx: &RenderContext, caps: &Captures) -> String {
  let whole = &caps[0];
  let is_image = !caps[1].is_empty();
  let label = &caps[2];
  let Some(filename) = caps.get(3).or_else(|| caps.get(5)) else {
    return whole.to_string();
  };
  let filename = filename.as_str().trim();

  let Some(url) = ctx.attachment_url(filename) else {
    log::debug!("Unresolved attachment reference: {filename}");
    return whole.to_string();
  };

  let dest = if url.contains(char::is_whitespace) {
    format!("<{url}>")
  } else {
    url.to_string()
  };

  if !is_image {
    return format!("[{label}]({dest})");
  }

  let size = caps
    .get(4)
    .or_else(|| caps.get(6))
    .and_then(|m| ImageSize::parse(m.as_str(), false));
  match size {
    Some(size) => format!(
      "<img src=\"{}\" alt=\"{}\"{}>",
      escape_attr(url),
      escape_attr(label),
      size.html_attrs()
    ),
    None => format!("![{label}]({dest})"),
  }
}

/// reStructuredText: wiki links become `` `label <href>`_ ``, image and
/// figure directives pointing at `attachment:` files are resolved, and
/// `.. category::` directives are dropped from the visible document.
#[must_use]
pub fn preprocess_rst(source: &str, ctx: &RenderContext) -> String {
  let mut out = String::with_capacity(source.len());

  for line in source.split_inclusive('\n') {
    if RST_CATEGORY_LINE_RE.is_match(line) {
      continue;
    }

    let (body, ending) = split_line_ending(line);

    if let Some(caps) = RST_IMAGE_RE.captures(body) {
      let indent = &caps[1];
      let directive = &caps[2];
      let filename = &caps[3];

      if let Some(url) = ctx.attachment_url(filename) {
        out.push_str(indent);
        out.push_str(directive);
        out.push_str(url);
        let size = caps
          .get(4)
          .and_then(|m| ImageSize::parse(m.as_str(), false));
        if let Some(size) = size {
          if let Some(w) = size.width {
            let _ = write!(out, "\n{indent}   :width: {w}px");
          }
          if let Some(h) = size.height {
            let _ = write!(out, "\n{indent}   :height: {h}px");
          }
        }
        out.push_str(ending);
        continue;
      }
      log::debug!("Unresolved attachment reference: {filename}");
    }

    let body = strip_categories(body);
    let body = WIKILINK_RE.replace_all(&body, |caps: &Captures| {
      if is_special_target(&caps[1]) {
        return caps[0].to_string();
      }
      let (href, label) = wikilink_parts(ctx, caps);
      format!("`{label} <{href}>`_")
    });
    out.push_str(&body);
    out.push_str(ending);
  }

  out
}

fn split_line_ending(line: &str) -> (&str, &str) {
  let body = line.trim_end_matches(['\n', '\r']);
  (body, &line[body.len()..])
}

/// HTML for a Wikitext `[[Target|Label]]` link.
///
/// File and category targets are returned as written; they are handled by
/// their own passes.
#[must_use]
pub fn render_wikilink(ctx: &RenderContext, caps: &Captures) -> String {
  if is_special_target(&caps[1]) {
    return caps[0].to_string();
  }
  let (href, label) = wikilink_parts(ctx, caps);
  format!(
    "<a href=\"{}\" class=\"wikilink\">{label}</a>",
    escape_attr(&href)
  )
}

/// Parsed options of a `[[File:..]]` embed.
#[derive(Debug, Default, PartialEq, Eq)]
struct FileOptions<'a> {
  thumb:   bool,
  align:   Option<&'a str>,
  size:    Option<ImageSize>,
  alt:     Option<&'a str>,
  caption: Option<&'a str>,
}

impl<'a> FileOptions<'a> {
  fn parse(options: &'a str) -> Self {
    let mut parsed = Self::default();

    for option in options.split('|').map(str::trim).filter(|o| !o.is_empty()) {
      let lowered = option.to_ascii_lowercase();
      match lowered.as_str() {
        "thumb" | "thumbnail" | "frame" | "framed" => parsed.thumb = true,
        "left" => parsed.align = Some("left"),
        "right" => parsed.align = Some("right"),
        "center" | "centre" => parsed.align = Some("center"),
        "none" => parsed.align = Some("none"),
        "frameless" | "border" | "upright" => {},
        _ if lowered.starts_with("alt=") => parsed.alt = Some(&option[4..]),
        _ => {
          if let Some(size) = ImageSize::parse(&lowered, true) {
            parsed.size = Some(size);
          } else {
            parsed.caption = Some(option);
          }
        },
      }
    }

    parsed
  }
}

/// HTML for a Wikitext `[[File:name|options]]` embed.
///
/// `options` is everything after the file name, including its leading `|`.
/// Thumbnails become a `<figure>` with an optional caption; other embeds an
/// inline `<img>`. A file missing from the attachment map renders as an
/// upload link so the author can see and fix it.
#[must_use]
pub fn render_file_embed(
  ctx: &RenderContext,
  filename: &str,
  options: &str,
) -> String {
  let filename = filename.trim();

  let Some(url) = ctx.attachment_url(filename) else {
    log::debug!("Missing file for embed: {filename}");
    let href = format!(
      "{}/upload?namespace={}&filename={}",
      ctx.base_url, ctx.namespace, filename
    );
    return format!(
      "<a class=\"missing-file\" href=\"{}\">File:{filename}</a>",
      escape_attr(&href)
    );
  };

  let opts = FileOptions::parse(options);
  let alt = opts.alt.or(opts.caption).unwrap_or(filename);
  let size = opts.size.map(|s| s.html_attrs()).unwrap_or_default();
  let img = format!(
    "<img src=\"{}\" alt=\"{}\"{size}",
    escape_attr(url),
    escape_attr(alt)
  );

  if opts.thumb {
    let align = opts.align.unwrap_or("right");
    let caption = opts
      .caption
      .map(|c| format!("<figcaption>{c}</figcaption>"))
      .unwrap_or_default();
    return format!(
      "<figure class=\"wiki-figure img-{align}\">{img}>{caption}</figure>"
    );
  }

  let class = opts
    .align
    .map_or_else(|| "wiki-img".to_string(), |a| format!("wiki-img img-{a}"));
  let title = opts
    .caption
    .map(|c| format!(" title=\"{}\"", escape_attr(c)))
    .unwrap_or_default();
  format!("{img} class=\"{class}\"{title}>")
}

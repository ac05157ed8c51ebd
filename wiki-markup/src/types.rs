//! Types for the wiki-markup public API and internal use.
use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::RenderError;

/// Mapping from attachment filename to the URL it is served from.
pub type AttachmentMap = HashMap<String, String>;

/// Source format of a page.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
  /// CommonMark with GitHub extensions, rendered by comrak.
  Markdown,
  /// reStructuredText, rendered by rust-rst.
  Rst,
  /// MediaWiki-style markup, rendered by the built-in Wikitext engine.
  Wikitext,
}

impl Format {
  /// The canonical lowercase name of the format.
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Markdown => "markdown",
      Self::Rst => "rst",
      Self::Wikitext => "wikitext",
    }
  }
}

impl fmt::Display for Format {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Format {
  type Err = RenderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "markdown" | "md" => Ok(Self::Markdown),
      "rst" | "restructuredtext" => Ok(Self::Rst),
      "wikitext" | "mediawiki" | "wiki" => Ok(Self::Wikitext),
      _ => Err(RenderError::UnsupportedFormat(s.to_string())),
    }
  }
}

/// A page source to be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
  /// Raw markup.
  pub source: String,
  /// Markup flavor of `source`.
  pub format: Format,
}

impl Document {
  /// Create a new document.
  pub fn new(source: impl Into<String>, format: Format) -> Self {
    Self {
      source: source.into(),
      format,
    }
  }
}

/// Per-call information about where the page lives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
  /// Namespace the page belongs to; wiki links resolve inside it.
  pub namespace:   String,
  /// Site prefix prepended to every generated wiki URL. May be empty.
  pub base_url:    String,
  /// Attachments of the page, if the caller looked them up.
  pub attachments: Option<AttachmentMap>,
}

impl RenderContext {
  /// Create a context without attachments.
  pub fn new(namespace: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      namespace:   namespace.into(),
      base_url:    base_url.into(),
      attachments: None,
    }
  }

  /// Attach the page's attachment map.
  #[must_use]
  pub fn with_attachments(mut self, attachments: AttachmentMap) -> Self {
    self.attachments = Some(attachments);
    self
  }

  /// Resolve an attachment filename to its URL.
  #[must_use]
  pub fn attachment_url(&self, filename: &str) -> Option<&str> {
    self
      .attachments
      .as_ref()
      .and_then(|map| map.get(filename.trim()))
      .map(String::as_str)
  }

  /// URL of a page in the current namespace.
  #[must_use]
  pub fn page_url(&self, slug: &str) -> String {
    format!("{}/wiki/{}/{slug}", self.base_url, self.namespace)
  }
}

/// A heading found while post-processing rendered HTML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeadingEntry {
  /// Heading level (1-6).
  pub level:  u8,
  /// Unique anchor ID assigned to the heading.
  pub anchor: String,
  /// Heading text with all inline markup removed.
  pub text:   String,
}

/// Result of rendering one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenderResult {
  /// Rendered HTML, always starting with the cache stamp.
  pub html: String,

  /// Headings in document order (for navigation, TOC, etc).
  pub headings: Vec<HeadingEntry>,

  /// Categories declared by the source, sorted case-insensitively.
  pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_from_str() {
    assert_eq!("markdown".parse::<Format>().ok(), Some(Format::Markdown));
    assert_eq!("MD".parse::<Format>().ok(), Some(Format::Markdown));
    assert_eq!(" RST ".parse::<Format>().ok(), Some(Format::Rst));
    assert_eq!("WikiText".parse::<Format>().ok(), Some(Format::Wikitext));
    assert!(matches!(
      "asciidoc".parse::<Format>(),
      Err(RenderError::UnsupportedFormat(f)) if f == "asciidoc"
    ));
  }

  #[test]
  fn test_format_display_round_trip() {
    for format in [Format::Markdown, Format::Rst, Format::Wikitext] {
      assert_eq!(format.to_string().parse::<Format>().ok(), Some(format));
    }
  }

  #[test]
  fn test_context_urls() {
    let mut attachments = AttachmentMap::new();
    attachments.insert("a.png".to_string(), "/files/a.png".to_string());
    let ctx = RenderContext::new("Main", "https://wiki.example")
      .with_attachments(attachments);

    assert_eq!(
      ctx.page_url("front-page"),
      "https://wiki.example/wiki/Main/front-page"
    );
    assert_eq!(ctx.attachment_url("a.png"), Some("/files/a.png"));
    assert_eq!(ctx.attachment_url(" a.png "), Some("/files/a.png"));
    assert_eq!(ctx.attachment_url("b.png"), None);
    assert_eq!(RenderContext::default().attachment_url("a.png"), None);
  }
}

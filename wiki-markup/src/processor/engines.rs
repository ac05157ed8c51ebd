//! External formatting engines for Markdown and reStructuredText.
//!
//! The Wikitext engine is built in; the other two formats are handed to
//! third-party parsers behind the [`MarkupEngine`] trait so that hosts can
//! swap them out.

use std::sync::Arc;

use comrak::{Arena, options::Options, parse_document};

use super::types::{AstTransformer, CodeHighlightTransformer};
use crate::{error::RenderError, syntax::SyntaxManager};

/// A formatter turning preprocessed source into HTML.
pub trait MarkupEngine: Send + Sync {
  /// Engine name used in logs and errors.
  fn name(&self) -> &'static str;

  /// Render `source` to an HTML fragment.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::Engine`] if the engine rejects the input and
  /// [`RenderError::Disabled`] if it was compiled out.
  fn render(&self, source: &str) -> Result<String, RenderError>;
}

/// Markdown through comrak, with raw HTML allowed.
pub struct ComrakEngine {
  gfm:    bool,
  syntax: Option<Arc<SyntaxManager>>,
}

impl ComrakEngine {
  #[must_use]
  pub const fn new(gfm: bool, syntax: Option<Arc<SyntaxManager>>) -> Self {
    Self { gfm, syntax }
  }

  /// Build comrak options from the GFM flag.
  fn comrak_options(&self) -> Options<'_> {
    let mut options = Options::default();
    if self.gfm {
      options.extension.table = true;
      options.extension.strikethrough = true;
      options.extension.tasklist = true;
      options.extension.autolink = true;
    }
    // Link preprocessing emits raw <img> tags and the TOC placeholder is an
    // HTML comment; both must survive.
    options.render.r#unsafe = true;
    // Heading ids are assigned by the post-processor.
    options.extension.header_ids = None;
    options
  }
}

impl MarkupEngine for ComrakEngine {
  fn name(&self) -> &'static str {
    "markdown"
  }

  fn render(&self, source: &str) -> Result<String, RenderError> {
    let arena = Arena::new();
    let options = self.comrak_options();
    let root = parse_document(&arena, source, &options);

    if let Some(manager) = self.syntax.as_deref() {
      CodeHighlightTransformer::new(manager).transform(root);
    }

    let mut html = String::new();
    comrak::format_html(root, &options, &mut html).map_err(|e| {
      RenderError::Engine {
        engine:  self.name(),
        message: e.to_string(),
      }
    })?;
    Ok(html)
  }
}

/// reStructuredText through `rst_parser` and `rst_renderer`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RstEngine;

impl MarkupEngine for RstEngine {
  fn name(&self) -> &'static str {
    "rst"
  }

  #[cfg(feature = "rst")]
  fn render(&self, source: &str) -> Result<String, RenderError> {
    let engine_error = |message: String| {
      RenderError::Engine {
        engine: "rst",
        message,
      }
    };

    let document =
      rst_parser::parse(source).map_err(|e| engine_error(e.to_string()))?;

    let mut out = Vec::new();
    rst_renderer::render_html(&document, &mut out, false)
      .map_err(|e| engine_error(e.to_string()))?;

    String::from_utf8(out).map_err(|e| engine_error(e.to_string()))
  }

  #[cfg(not(feature = "rst"))]
  fn render(&self, _source: &str) -> Result<String, RenderError> {
    Err(RenderError::Disabled("rst"))
  }
}

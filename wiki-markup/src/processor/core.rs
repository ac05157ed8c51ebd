//! Core implementation of the renderer.
//!
//! This module contains the main implementation of `Renderer` and its
//! methods, focused on the render pipeline and configuration management.

use std::sync::Arc;

use log::{trace, warn};
use rayon::prelude::*;

use super::{
  engines::{ComrakEngine, MarkupEngine, RstEngine},
  process::{fallback_html, process_safe},
  types::{Renderer, RendererOptions},
};
use crate::{
  error::RenderError,
  extract::extract_categories,
  links,
  macros::expand_macros,
  syntax::{SyntaxManager, create_default_manager},
  types::{Document, Format, RenderContext, RenderResult},
  wikitext::{WikitextEngine, render_category_footer},
};

impl Renderer {
  /// Create a new `Renderer` with the given options.
  ///
  /// Builds the highlighter and both external engines. If highlighting is
  /// requested but unavailable, code blocks are rendered as plain text.
  #[must_use]
  pub fn new(options: RendererOptions) -> Self {
    let syntax = if options.highlight_code {
      match create_default_manager(options.highlight_theme.clone()) {
        Ok(manager) => Some(Arc::new(manager)),
        Err(e) => {
          warn!("Syntax highlighting disabled: {e}");
          None
        },
      }
    } else {
      None
    };

    Self {
      markdown: Box::new(ComrakEngine::new(options.gfm, syntax.clone())),
      rst: Box::new(RstEngine),
      post: options.post_processor(),
      syntax,
      options,
    }
  }

  /// Replace the engine used for Markdown or RST pages.
  ///
  /// Wikitext is always rendered by the built-in engine; passing
  /// [`Format::Wikitext`] leaves the renderer unchanged.
  #[must_use]
  pub fn with_engine(
    mut self,
    format: Format,
    engine: Box<dyn MarkupEngine>,
  ) -> Self {
    match format {
      Format::Markdown => self.markdown = engine,
      Format::Rst => self.rst = engine,
      Format::Wikitext => {
        warn!("Ignoring custom engine {:?} for wikitext", engine.name());
      },
    }
    self
  }

  /// Access renderer options.
  #[must_use]
  pub const fn options(&self) -> &RendererOptions {
    &self.options
  }

  /// The syntax highlighter, if highlighting is enabled and available.
  #[must_use]
  pub fn syntax_manager(&self) -> Option<&SyntaxManager> {
    self.syntax.as_deref()
  }

  /// CSS for the classes emitted by the highlighter, using the configured
  /// theme.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::Disabled`] if highlighting is off or unavailable
  /// and [`RenderError::Engine`] if the theme is unknown.
  pub fn stylesheet(&self) -> Result<String, RenderError> {
    let manager = self
      .syntax
      .as_deref()
      .ok_or(RenderError::Disabled("highlight"))?;
    manager
      .stylesheet(self.options.highlight_theme.as_deref())
      .map_err(|e| {
        RenderError::Engine {
          engine:  "highlight",
          message: e.to_string(),
        }
      })
  }

  /// Render one document.
  ///
  /// Never fails: every problem degrades to visible but harmless HTML. The
  /// result always starts with the cache stamp.
  #[must_use]
  pub fn render(
    &self,
    document: &Document,
    ctx: &RenderContext,
  ) -> RenderResult {
    let source = document.source.as_str();
    trace!(
      "Rendering {} document ({} bytes) in namespace {:?}",
      document.format,
      source.len(),
      ctx.namespace
    );

    let expanded =
      process_safe(source, |s| expand_macros(s, document.format), source);
    let preprocessed = process_safe(
      &expanded,
      |s| links::preprocess(s, document.format, ctx),
      &expanded,
    );

    let escaped = fallback_html(source);
    let html = process_safe(
      &preprocessed,
      |s| self.render_format(s, document.format, ctx),
      &escaped,
    );

    let post = self.post.process(&html);

    RenderResult {
      html:       post.html,
      headings:   post.headings,
      categories: extract_categories(source, document.format),
    }
  }

  /// Render many independent documents in parallel.
  ///
  /// Results are returned in input order.
  #[must_use]
  pub fn render_batch(
    &self,
    documents: &[(Document, RenderContext)],
  ) -> Vec<RenderResult> {
    documents
      .par_iter()
      .map(|(document, ctx)| self.render(document, ctx))
      .collect()
  }

  /// Run the engine for `format` on preprocessed source.
  fn render_format(
    &self,
    source: &str,
    format: Format,
    ctx: &RenderContext,
  ) -> String {
    let engine = match format {
      Format::Wikitext => return self.render_wikitext(source, ctx),
      Format::Markdown => &self.markdown,
      Format::Rst => &self.rst,
    };

    match engine.render(source) {
      Ok(html) => html,
      Err(RenderError::Disabled(feature)) => {
        warn!("{feature} support is not compiled in, showing source as text");
        fallback_html(source)
      },
      Err(e) => {
        log::error!("{e}");
        fallback_html(source)
      },
    }
  }

  fn render_wikitext(&self, source: &str, ctx: &RenderContext) -> String {
    let output = WikitextEngine::new(ctx, self.syntax.as_deref()).render(source);
    if !self.options.category_footer || output.categories.is_empty() {
      return output.html;
    }
    format!(
      "{}\n{}",
      output.html,
      render_category_footer(&output.categories, ctx)
    )
  }
}

impl Default for Renderer {
  fn default() -> Self {
    Self::new(RendererOptions::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::extract::is_cache_valid;

  struct FailingEngine;

  impl MarkupEngine for FailingEngine {
    fn name(&self) -> &'static str {
      "failing"
    }

    fn render(&self, _source: &str) -> Result<String, RenderError> {
      Err(RenderError::Engine {
        engine:  "failing",
        message: "boom".to_string(),
      })
    }
  }

  struct PanickingEngine;

  impl MarkupEngine for PanickingEngine {
    fn name(&self) -> &'static str {
      "panicking"
    }

    #[allow(clippy::panic, reason = "Exercises panic recovery")]
    fn render(&self, _source: &str) -> Result<String, RenderError> {
      panic!("engine bug")
    }
  }

  fn plain_renderer() -> Renderer {
    Renderer::new(RendererOptions {
      highlight_code: false,
      ..Default::default()
    })
  }

  #[test]
  fn test_engine_error_falls_back_to_escaped_source() {
    let renderer = plain_renderer()
      .with_engine(Format::Markdown, Box::new(FailingEngine));
    let result = renderer.render(
      &Document::new("<b>x</b>", Format::Markdown),
      &RenderContext::new("Main", ""),
    );
    assert!(result.html.ends_with("<pre>&lt;b&gt;x&lt;/b&gt;</pre>"));
    assert!(is_cache_valid(Some(&result.html)));
  }

  #[test]
  fn test_engine_panic_is_contained() {
    let renderer = plain_renderer()
      .with_engine(Format::Rst, Box::new(PanickingEngine));
    let result = renderer.render(
      &Document::new("a & b", Format::Rst),
      &RenderContext::new("Main", ""),
    );
    assert!(result.html.ends_with("<pre>a &amp; b</pre>"));
  }

  #[test]
  fn test_wikitext_engine_cannot_be_replaced() {
    let renderer = plain_renderer()
      .with_engine(Format::Wikitext, Box::new(FailingEngine));
    let result = renderer.render(
      &Document::new("== Hi ==", Format::Wikitext),
      &RenderContext::new("Main", ""),
    );
    assert!(result.html.contains("<h2 id=\"hi\">Hi</h2>"));
  }

  #[test]
  fn test_category_footer_toggle() {
    let document = Document::new("Text\n[[Category:Foo]]", Format::Wikitext);
    let ctx = RenderContext::new("Main", "");

    let with_footer = plain_renderer().render(&document, &ctx);
    assert!(with_footer.html.contains("<div class=\"wiki-categories\">"));
    assert_eq!(with_footer.categories, vec!["Foo"]);

    let without_footer = Renderer::new(RendererOptions {
      highlight_code: false,
      category_footer: false,
      ..Default::default()
    })
    .render(&document, &ctx);
    assert!(!without_footer.html.contains("wiki-categories"));
    assert_eq!(without_footer.categories, vec!["Foo"]);
  }

  #[test]
  fn test_empty_source() {
    let result = plain_renderer().render(
      &Document::new("", Format::Wikitext),
      &RenderContext::default(),
    );
    assert!(is_cache_valid(Some(&result.html)));
    assert!(result.headings.is_empty());
  }

  #[test]
  fn test_render_batch_keeps_order() {
    let renderer = plain_renderer();
    let documents: Vec<_> = (0..8)
      .map(|i| {
        (
          Document::new(format!("== Page {i} =="), Format::Wikitext),
          RenderContext::new("Main", ""),
        )
      })
      .collect();

    let results = renderer.render_batch(&documents);
    assert_eq!(results.len(), 8);
    for (i, result) in results.iter().enumerate() {
      assert_eq!(result.headings[0].anchor, format!("page-{i}"));
    }
  }

  #[test]
  fn test_stylesheet_without_highlighter() {
    assert!(matches!(
      plain_renderer().stylesheet(),
      Err(RenderError::Disabled("highlight"))
    ));
  }
}

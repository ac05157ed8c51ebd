//! Type definitions for the renderer.
//!
//! Contains all the core types used by the processor, including:
//! - Configuration options (`RendererOptions`) and their builder
//! - The renderer context object (`Renderer`)
//! - AST transformation traits and implementations
//!
//! # Examples
//!
//! ```
//! use wiki_markup::{Renderer, RendererOptions};
//!
//! let options = RendererOptions {
//!   gfm: true,
//!   toc_title: "On this page".to_string(),
//!   ..Default::default()
//! };
//!
//! let renderer = Renderer::new(options);
//! ```

use std::{fs, path::Path, sync::Arc};

use comrak::nodes::{AstNode, NodeHtmlBlock, NodeValue};
use serde::{Deserialize, Serialize};

use super::engines::MarkupEngine;
use crate::{
  error::RenderError,
  postprocess::PostProcessor,
  syntax::SyntaxManager,
};

/// Options for configuring the renderer.
///
/// Every field has a default, so a configuration file only needs to list the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[allow(
  clippy::struct_excessive_bools,
  reason = "Config struct with related boolean flags"
)]
pub struct RendererOptions {
  /// Enable GitHub Flavored Markdown (GFM) extensions for Markdown pages.
  pub gfm: bool,

  /// Enable syntax highlighting for code blocks.
  pub highlight_code: bool,

  /// Optional: theme used when generating the highlight stylesheet.
  pub highlight_theme: Option<String>,

  /// Append the category footer to Wikitext pages.
  pub category_footer: bool,

  /// Open absolute links in a new tab.
  pub mark_external_links: bool,

  /// Heading shown above the generated table of contents.
  pub toc_title: String,
}

impl Default for RendererOptions {
  fn default() -> Self {
    Self {
      gfm:                 true,
      highlight_code:      cfg!(feature = "highlight"),
      highlight_theme:     None,
      category_footer:     true,
      mark_external_links: true,
      toc_title:           "Contents".to_string(),
    }
  }
}

impl RendererOptions {
  /// Parse options from a TOML document.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::Toml`] if the document is not valid TOML or does
  /// not match the option schema.
  pub fn from_toml_str(source: &str) -> Result<Self, RenderError> {
    Ok(toml::from_str(source)?)
  }

  /// Load options from a TOML file.
  ///
  /// # Errors
  ///
  /// Returns [`RenderError::Io`] if the file cannot be read and
  /// [`RenderError::Toml`] if it cannot be parsed.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
    let path = path.as_ref();
    log::debug!("Loading renderer options from {}", path.display());
    let source = fs::read_to_string(path)?;
    Self::from_toml_str(&source)
  }

  /// The post-processing passes these options ask for.
  #[must_use]
  pub fn post_processor(&self) -> PostProcessor {
    PostProcessor::new(self.toc_title.clone(), self.mark_external_links)
  }
}

/// The renderer context object.
///
/// Built once by the host and shared by reference between render calls. It
/// holds no per-document state, so one instance can render any number of
/// documents concurrently.
pub struct Renderer {
  pub(crate) options:  RendererOptions,
  pub(crate) syntax:   Option<Arc<SyntaxManager>>,
  pub(crate) markdown: Box<dyn MarkupEngine>,
  pub(crate) rst:      Box<dyn MarkupEngine>,
  pub(crate) post:     PostProcessor,
}

/// Trait for AST transformations (e.g., code block highlighting).
pub trait AstTransformer {
  fn transform<'a>(&self, node: &'a AstNode<'a>);
}

/// AST transformer that swaps fenced code blocks for highlighted HTML.
///
/// Blocks without a language, or with one the highlighter does not know, are
/// left for comrak to render as plain `<pre><code>`.
pub struct CodeHighlightTransformer<'m> {
  manager: &'m SyntaxManager,
}

impl<'m> CodeHighlightTransformer<'m> {
  #[must_use]
  pub const fn new(manager: &'m SyntaxManager) -> Self {
    Self { manager }
  }
}

impl AstTransformer for CodeHighlightTransformer<'_> {
  fn transform<'a>(&self, node: &'a AstNode<'a>) {
    for child in node.children() {
      {
        let mut data = child.data.borrow_mut();
        if let NodeValue::CodeBlock(ref block) = data.value {
          let language = block.info.split_whitespace().next().unwrap_or("");
          if !language.is_empty() {
            let code = block.literal.trim_end_matches('\n');
            match self.manager.highlight_code(code, language) {
              Ok(spans) => {
                let html = format!(
                  "<div class=\"highlight\"><pre>{spans}</pre></div>\n"
                );
                data.value = NodeValue::HtmlBlock(NodeHtmlBlock {
                  block_type: 0,
                  literal:    html,
                });
              },
              Err(e) => {
                log::debug!("Leaving {language} code block unhighlighted: {e}");
              },
            }
          }
        }
      }
      self.transform(child);
    }
  }
}

/// Builder for constructing `RendererOptions` with method chaining.
#[derive(Debug, Clone, Default)]
pub struct RendererOptionsBuilder {
  options: RendererOptions,
}

impl RendererOptionsBuilder {
  /// Create a new builder with default options.
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Enable or disable GitHub Flavored Markdown.
  #[must_use]
  pub const fn gfm(mut self, enabled: bool) -> Self {
    self.options.gfm = enabled;
    self
  }

  /// Enable or disable syntax highlighting.
  #[must_use]
  pub const fn highlight_code(mut self, enabled: bool) -> Self {
    self.options.highlight_code = enabled;
    self
  }

  /// Set the syntax highlighting theme.
  #[must_use]
  pub fn highlight_theme<S: Into<String>>(mut self, theme: Option<S>) -> Self {
    self.options.highlight_theme = theme.map(Into::into);
    self
  }

  /// Enable or disable the Wikitext category footer.
  #[must_use]
  pub const fn category_footer(mut self, enabled: bool) -> Self {
    self.options.category_footer = enabled;
    self
  }

  /// Enable or disable `target="_blank"` on absolute links.
  #[must_use]
  pub const fn mark_external_links(mut self, enabled: bool) -> Self {
    self.options.mark_external_links = enabled;
    self
  }

  /// Set the table of contents heading.
  #[must_use]
  pub fn toc_title<S: Into<String>>(mut self, title: S) -> Self {
    self.options.toc_title = title.into();
    self
  }

  /// Build the final `RendererOptions`.
  #[must_use]
  pub fn build(self) -> RendererOptions {
    self.options
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let options = RendererOptions::default();
    assert!(options.gfm);
    assert!(options.category_footer);
    assert!(options.mark_external_links);
    assert_eq!(options.toc_title, "Contents");
    assert_eq!(options.highlight_code, cfg!(feature = "highlight"));
  }

  #[test]
  fn test_partial_toml_keeps_defaults() {
    let options = RendererOptions::from_toml_str(
      "gfm = false\nhighlight_theme = \"Nord\"\n",
    )
    .expect("valid options");
    assert!(!options.gfm);
    assert_eq!(options.highlight_theme.as_deref(), Some("Nord"));
    assert_eq!(options.toc_title, "Contents");
  }

  #[test]
  fn test_invalid_toml() {
    assert!(matches!(
      RendererOptions::from_toml_str("gfm = \"yes\""),
      Err(RenderError::Toml(_))
    ));
  }

  #[test]
  fn test_builder() {
    let options = RendererOptionsBuilder::new()
      .gfm(false)
      .highlight_code(false)
      .highlight_theme(Some("Dracula"))
      .category_footer(false)
      .mark_external_links(false)
      .toc_title("Index")
      .build();

    assert_eq!(options, RendererOptions {
      gfm:                 false,
      highlight_code:      false,
      highlight_theme:     Some("Dracula".to_string()),
      category_footer:     false,
      mark_external_links: false,
      toc_title:           "Index".to_string(),
    });
  }
}

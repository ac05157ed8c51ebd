//! High-level processing functions with error recovery.

use log::error;

use super::types::{Renderer, RendererOptions};
use crate::{
  extract::cache_stamp,
  types::{AttachmentMap, Document, Format, RenderContext, RenderResult},
  utils::escape_text,
};

/// Safely run one pipeline stage with panic recovery.
///
/// Ensures that a bug in a single stage yields fallback content for that
/// stage rather than taking the whole page down.
///
/// # Arguments
///
/// * `content` - The content to process
/// * `processor_fn` - The processing function to apply
/// * `fallback` - Fallback content to use if processing fails
///
/// # Returns
///
/// The processed content, or `fallback` (`content` if that is empty) when the
/// stage panicked
pub fn process_safe<F>(content: &str, processor_fn: F, fallback: &str) -> String
where
  F: FnOnce(&str) -> String,
{
  // Avoid processing empty strings
  if content.is_empty() {
    return String::new();
  }

  let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
    processor_fn(content)
  }));

  match result {
    Ok(processed_text) => processed_text,
    Err(e) => {
      if let Some(error_msg) = e.downcast_ref::<String>() {
        error!("Error processing markup: {error_msg}");
      } else if let Some(error_msg) = e.downcast_ref::<&str>() {
        error!("Error processing markup: {error_msg}");
      } else {
        error!("Unknown error occurred while processing markup");
      }

      if fallback.is_empty() {
        content.to_string()
      } else {
        fallback.to_string()
      }
    },
  }
}

/// Source shown as escaped preformatted text.
#[must_use]
pub fn fallback_html(source: &str) -> String {
  format!("<pre>{}</pre>", escape_text(source))
}

/// Render `source` given a format name such as `"markdown"`.
///
/// An unknown format name renders the source as escaped preformatted text,
/// still carrying the cache stamp.
#[must_use]
pub fn render_source(
  renderer: &Renderer,
  source: &str,
  format: &str,
  ctx: &RenderContext,
) -> String {
  match format.parse::<Format>() {
    Ok(format) => renderer.render(&Document::new(source, format), ctx).html,
    Err(e) => {
      log::warn!("{e}, showing source as text");
      format!("{}\n{}", cache_stamp(), fallback_html(source))
    },
  }
}

/// Render one document with a renderer built from default options.
///
/// Convenience for callers that do not keep a [`Renderer`] around.
#[must_use]
pub fn render_document(
  source: &str,
  format: Format,
  namespace: &str,
  base_url: &str,
  attachments: Option<AttachmentMap>,
) -> RenderResult {
  let mut ctx = RenderContext::new(namespace, base_url);
  ctx.attachments = attachments;
  Renderer::new(RendererOptions::default())
    .render(&Document::new(source, format), &ctx)
}

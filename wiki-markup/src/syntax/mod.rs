//! Provides a trait-based architecture for syntax highlighting that allows
//! multiple backends to be plugged in.
//!
//! The bundled backend is **Syntect**, using Sublime Text syntax definitions
//! with two-face added for extended syntax definitions and themes. It is
//! compiled in with the `highlight` feature.

pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{SyntaxError, SyntaxResult};
pub use types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager};

// Syntect backend implementation
#[cfg(feature = "highlight")] mod syntect;
#[cfg(feature = "highlight")] pub use syntect::*;

/// Create the default syntax manager based on available features.
///
/// # Errors
///
/// Returns [`SyntaxError::NoBackendAvailable`] when the crate was built
/// without the `highlight` feature.
pub fn create_default_manager(
  theme: Option<String>,
) -> SyntaxResult<SyntaxManager> {
  #[cfg(feature = "highlight")]
  {
    create_syntect_manager(theme)
  }

  #[cfg(not(feature = "highlight"))]
  {
    let _ = theme;
    Err(SyntaxError::NoBackendAvailable)
  }
}

/// Render a code block to HTML.
///
/// With a manager and a language it knows, the result is highlighted spans in
/// `<div class="highlight"><pre>`. Everything else, including highlighting
/// failures, becomes escaped text in `<pre><code>`.
#[must_use]
pub fn render_code_block(
  manager: Option<&SyntaxManager>,
  code: &str,
  language: Option<&str>,
) -> String {
  let language = language.map(str::trim).filter(|l| !l.is_empty());
  if let (Some(manager), Some(language)) = (manager, language) {
    match manager.highlight_code(code, language) {
      Ok(spans) => {
        return format!("<div class=\"highlight\"><pre>{spans}</pre></div>");
      },
      Err(e) => log::debug!("Code block left unhighlighted: {e}"),
    }
  }

  format!(
    "<pre><code>{}</code></pre>",
    crate::utils::escape_text(code)
  )
}

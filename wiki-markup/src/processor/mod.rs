//! The render pipeline.
//!
//! The processor module is organized into focused submodules:
//!
//! - [`core`]: `Renderer` implementation and the per-document pipeline
//! - [`engines`]: the external Markdown and reStructuredText engines
//! - [`process`]: panic recovery and convenience entry points
//! - [`types`]: configuration, the renderer struct and AST transformers
pub mod core;
pub mod engines;
pub mod process;
pub mod types;

pub use engines::{ComrakEngine, MarkupEngine, RstEngine};
pub use process::{fallback_html, process_safe, render_document, render_source};
pub use types::{
  AstTransformer,
  CodeHighlightTransformer,
  Renderer,
  RendererOptions,
  RendererOptionsBuilder,
};

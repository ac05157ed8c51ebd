//! # wiki-markup - the rendering core of a wiki
//!
//! Turns page source in one of three formats (Wikitext, Markdown and
//! reStructuredText) into navigable HTML, and answers questions about raw
//! source without rendering it: which categories a page declares, whether it
//! is a redirect, and whether a stored render is still current.
//!
//! ## Quick Start
//!
//! ```rust
//! use wiki_markup::{Document, Format, RenderContext, Renderer, RendererOptions};
//!
//! let renderer = Renderer::new(RendererOptions::default());
//! let ctx = RenderContext::new("Main", "https://wiki.example");
//! let result = renderer.render(
//!   &Document::new("== Hello ==\nSee [[Other Page]].", Format::Wikitext),
//!   &ctx,
//! );
//!
//! assert!(wiki_markup::is_cache_valid(Some(&result.html)));
//! assert_eq!(result.headings[0].anchor, "hello");
//! ```
//!
//! ## Features
//!
//! - **Wikitext engine** with headings, lists, definition lists, tables,
//!   templates, footnotes, code blocks and file embeds
//! - **Markdown** through `comrak` and **reStructuredText** through
//!   `rst_parser`/`rst_renderer`, both behind the [`MarkupEngine`] trait
//! - **Wiki links, categories and attachments** in every format
//! - **Post-processing** with unique heading anchors, an opt-in table of
//!   contents (`{{toc}}` or `__TOC__`) and external link marking
//! - **Cache stamping** so stored HTML from an older renderer is detected
//! - **Error recovery**: rendering never fails, it degrades
//!
//! ## Configuration
//!
//! ```rust
//! use wiki_markup::{Renderer, RendererOptionsBuilder};
//!
//! let options = RendererOptionsBuilder::new()
//!   .gfm(true)
//!   .toc_title("On this page")
//!   .mark_external_links(false)
//!   .build();
//!
//! let renderer = Renderer::new(options);
//! ```
//!
//! Options can also be read from TOML with
//! [`RendererOptions::from_toml_str`] or [`RendererOptions::from_file`].

pub mod error;
pub mod extract;
pub mod links;
pub mod macros;
pub mod postprocess;
pub mod processor;
pub mod syntax;
pub mod types;
pub mod utils;
pub mod wikitext;

pub use crate::{
  error::RenderError,
  extract::{
    cache_stamp,
    extract_categories,
    is_cache_valid,
    parse_redirect,
    stamp_version,
  },
  processor::{
    AstTransformer,
    MarkupEngine,
    Renderer,
    RendererOptions,
    RendererOptionsBuilder,
    render_document,
  },
  types::{
    AttachmentMap,
    Document,
    Format,
    HeadingEntry,
    RenderContext,
    RenderResult,
  },
  utils::slugify,
};

/// Version of the render pipeline, embedded in every cache stamp.
///
/// Bump it whenever rendered output changes so that stored HTML is
/// regenerated.
pub const RENDERER_VERSION: u32 = 10;

/// Heading count at which hosts may suggest adding a table of contents.
///
/// The renderer itself only emits a TOC when the page asks for one.
pub const TOC_MIN_HEADINGS: usize = 3;

/// Render page source to cache-stamped HTML.
///
/// `format` is a format name (`"markdown"`, `"rst"` or `"wikitext"`). An
/// unknown name renders the source as escaped preformatted text.
#[must_use]
pub fn render(
  source: &str,
  format: &str,
  namespace: &str,
  base_url: &str,
  attachments: Option<AttachmentMap>,
) -> String {
  let mut ctx = RenderContext::new(namespace, base_url);
  ctx.attachments = attachments;
  let renderer = Renderer::new(RendererOptions::default());
  processor::render_source(&renderer, source, format, &ctx)
}

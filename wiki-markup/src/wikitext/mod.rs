//! The built-in Wikitext engine.
//!
//! Rendering runs in fixed phases, each consuming the [`Segment`] list the
//! previous one produced:
//!
//! 1. code extraction ([`code`])
//! 2. `<ref>` substitution ([`refs`])
//! 3. table extraction ([`table`])
//! 4. category collection, over the text and the `<ref>` bodies
//! 5. the block scan ([`block`]), which calls the inline renderer
//!    ([`inline`]) on every text fragment
//!
//! Code must be cut out first: the later phases would otherwise read markup
//! inside code blocks.

mod block;
pub mod code;
pub mod inline;
pub mod refs;
pub mod segment;
pub mod table;

use std::fmt::Write as _;

pub use inline::InlineRenderer;
pub use refs::{Footnote, Footnotes};
pub use segment::Segment;
pub use table::{CellKind, TableBlock, TableCell, TableRow};

use crate::{
  extract::dedup_categories,
  links::CATEGORY_RE,
  syntax::SyntaxManager,
  types::RenderContext,
  utils::{escape_attr, escape_text},
};

/// Output of the Wikitext engine, before post-processing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WikitextOutput {
  pub html:       String,
  /// Categories in order of first appearance, deduplicated ignoring case.
  pub categories: Vec<String>,
}

/// Renders Wikitext for one page.
#[derive(Clone, Copy)]
pub struct WikitextEngine<'a> {
  ctx:    &'a RenderContext,
  syntax: Option<&'a SyntaxManager>,
}

impl<'a> WikitextEngine<'a> {
  #[must_use]
  pub const fn new(
    ctx: &'a RenderContext,
    syntax: Option<&'a SyntaxManager>,
  ) -> Self {
    Self { ctx, syntax }
  }

  /// Render a preprocessed Wikitext document.
  #[must_use]
  pub fn render(&self, source: &str) -> WikitextOutput {
    let segments = code::extract_code(source, self.syntax);
    log::trace!("Wikitext: {} segments after code extraction", segments.len());

    let mut footnotes = Footnotes::new();
    let segments = segment::flat_map_text(segments, |text| {
      vec![Segment::Text(footnotes.substitute(&text))]
    });

    let segments = segment::flat_map_text(segments, |text| {
      table::extract_tables(&text)
    });

    let categories = collect_categories(&segments, footnotes.notes());
    log::trace!(
      "Wikitext: {} footnotes, {} categories",
      footnotes.len(),
      categories.len()
    );

    let html = block::render_blocks(
      &segments,
      InlineRenderer::new(self.ctx),
      &footnotes,
    );

    WikitextOutput { html, categories }
  }
}

/// Category names from the page text, table cells and footnote bodies.
///
/// `<ref>` substitution has already cut the note bodies out of the text, so
/// they are scanned separately, after the page itself.
fn collect_categories(
  segments: &[Segment],
  notes: &[Footnote],
) -> Vec<String> {
  let mut names = Vec::new();
  let mut collect = |text: &str| {
    names.extend(
      CATEGORY_RE
        .captures_iter(text)
        .map(|caps| caps[1].trim().to_string()),
    );
  };

  for segment in segments {
    match segment {
      Segment::Text(text) => collect(text),
      Segment::Table(table) => table.contents().for_each(&mut collect),
      Segment::PreRendered(_) => {},
    }
  }
  for note in notes {
    collect(&note.note);
  }

  dedup_categories(names)
}

/// The category footer appended below a Wikitext page.
///
/// Empty when there are no categories.
#[must_use]
pub fn render_category_footer(
  categories: &[String],
  ctx: &RenderContext,
) -> String {
  if categories.is_empty() {
    return String::new();
  }

  let mut html =
    String::from("<div class=\"wiki-categories\"><strong>Categories:</strong> ");
  for (i, category) in categories.iter().enumerate() {
    if i > 0 {
      html.push_str(" · ");
    }
    let href = format!(
      "{}/search?q=Category:{category}&namespace={}",
      ctx.base_url, ctx.namespace
    );
    let _ = write!(
      html,
      "<a href=\"{}\" class=\"category-link\">{}</a>",
      escape_attr(&href),
      escape_text(category)
    );
  }
  html.push_str("</div>");
  html
}

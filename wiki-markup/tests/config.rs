#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Tests for loading renderer options.

use std::fs;

use tempfile::TempDir;
use wiki_markup::{
  Document,
  Format,
  RenderContext,
  RenderError,
  Renderer,
  RendererOptions,
};

#[test]
fn test_partial_toml_keeps_defaults() {
  let options = RendererOptions::from_toml_str(
    "toc_title = \"On this page\"\ncategory_footer = false\n",
  )
  .expect("valid options");

  assert_eq!(options.toc_title, "On this page");
  assert!(!options.category_footer);
  assert!(options.gfm);
  assert!(options.mark_external_links);
}

#[test]
fn test_invalid_toml() {
  assert!(matches!(
    RendererOptions::from_toml_str("gfm = \"yes\""),
    Err(RenderError::Toml(_))
  ));
}

#[test]
fn test_from_file() {
  let dir = TempDir::new().expect("Failed to create temp dir");
  let path = dir.path().join("wiki.toml");
  fs::write(
    &path,
    "highlight_code = false\nmark_external_links = false\ntoc_title = \"Index\"\n",
  )
  .expect("Failed to write config");

  let options = RendererOptions::from_file(&path).expect("valid file");
  assert!(!options.highlight_code);

  let renderer = Renderer::new(options);
  let html = renderer
    .render(
      &Document::new(
        "__TOC__\n== A ==\n[https://example.com x]",
        Format::Wikitext,
      ),
      &RenderContext::new("Main", ""),
    )
    .html;
  assert!(html.contains("<div class=\"toc-title\">Index</div>"));
  assert!(html.contains("<a href=\"https://example.com\" class=\"external\""));
}

#[test]
fn test_missing_file() {
  let dir = TempDir::new().expect("Failed to create temp dir");
  assert!(matches!(
    RendererOptions::from_file(dir.path().join("absent.toml")),
    Err(RenderError::Io(_))
  ));
}

#[test]
fn test_category_footer_toggle() {
  let renderer = Renderer::new(
    RendererOptions::from_toml_str(
      "highlight_code = false\ncategory_footer = false",
    )
    .expect("valid options"),
  );
  let result = renderer.render(
    &Document::new("Body\n[[Category:Kept]]", Format::Wikitext),
    &RenderContext::new("Main", ""),
  );
  assert!(!result.html.contains("wiki-categories"));
  assert_eq!(result.categories, vec!["Kept"]);
}

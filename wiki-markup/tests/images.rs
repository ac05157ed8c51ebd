#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Tests for attachment resolution in every format.

use wiki_markup::{
  AttachmentMap,
  Document,
  Format,
  RenderContext,
  Renderer,
  RendererOptions,
  links,
};

fn ctx() -> RenderContext {
  let mut attachments = AttachmentMap::new();
  attachments.insert("photo.png".to_string(), "/files/photo.png".to_string());
  attachments.insert("doc.pdf".to_string(), "/files/doc.pdf".to_string());
  attachments
    .insert("site map.png".to_string(), "/files/site%20map.png".to_string());
  RenderContext::new("Main", "").with_attachments(attachments)
}

fn render(source: &str, format: Format) -> String {
  let renderer = Renderer::new(RendererOptions {
    highlight_code: false,
    ..Default::default()
  });
  renderer.render(&Document::new(source, format), &ctx()).html
}

#[test]
fn test_wikitext_thumbnail_figure() {
  let html = render(
    "[[File:photo.png|thumb|left|200px|A caption]]",
    Format::Wikitext,
  );
  assert!(html.contains(
    "<figure class=\"wiki-figure img-left\"><img src=\"/files/photo.png\" \
     alt=\"A caption\" width=\"200\"><figcaption>A \
     caption</figcaption></figure>"
  ));
}

#[test]
fn test_wikitext_inline_image() {
  let html = render(
    "Logo: [[File:photo.png|x50px|center|Company logo]]",
    Format::Wikitext,
  );
  assert!(html.contains(
    "<img src=\"/files/photo.png\" alt=\"Company logo\" height=\"50\" \
     class=\"wiki-img img-center\""
  ));
  assert!(!html.contains("<figure"));
}

#[test]
fn test_wikitext_missing_file_links_to_upload() {
  let html = render("[[File:nope.png|thumb]]", Format::Wikitext);
  assert!(html.contains(
    "<a class=\"missing-file\" \
     href=\"/upload?namespace=Main&amp;filename=nope.png\">File:nope.png</a>"
  ));
  assert!(!html.contains("<img"));
}

#[test]
fn test_markdown_attachment_image() {
  let html = render("![Diagram](attachment:photo.png)", Format::Markdown);
  assert!(html.contains("<img src=\"/files/photo.png\" alt=\"Diagram\""));
  assert!(!html.contains("attachment:"));
}

#[test]
fn test_markdown_sized_attachment_image() {
  let html =
    render("![Diagram](attachment:photo.png|300x200)", Format::Markdown);
  assert!(html.contains(
    "<img src=\"/files/photo.png\" alt=\"Diagram\" width=\"300\" \
     height=\"200\">"
  ));
}

#[test]
fn test_markdown_attachment_link() {
  let html = render("[the data sheet](attachment:doc.pdf)", Format::Markdown);
  assert!(html.contains("<a href=\"/files/doc.pdf\">the data sheet</a>"));
}

#[test]
fn test_markdown_attachment_with_space_in_name() {
  let html = render("![Map](attachment:site map.png)", Format::Markdown);
  assert!(html.contains("<img src=\"/files/site%20map.png\" alt=\"Map\""));

  let html = render("![Map](<attachment:site map.png>)", Format::Markdown);
  assert!(html.contains("<img src=\"/files/site%20map.png\" alt=\"Map\""));
  assert!(!html.contains("attachment:"));
}

#[test]
fn test_markdown_unresolved_attachment_is_kept() {
  let out = links::preprocess_markdown("![x](attachment:missing.png)", &ctx());
  assert_eq!(out, "![x](attachment:missing.png)");
}

#[test]
fn test_rst_image_directive() {
  let out = links::preprocess_rst(
    ".. image:: attachment:photo.png|300x200\n",
    &ctx(),
  );
  assert_eq!(
    out,
    ".. image:: /files/photo.png\n   :width: 300px\n   :height: 200px\n"
  );
}

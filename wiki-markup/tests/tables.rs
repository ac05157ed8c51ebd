#![allow(
  clippy::expect_used,
  clippy::unwrap_used,
  clippy::panic,
  reason = "Fine in tests"
)]
//! Tests for `{| … |}` tables.

use wiki_markup::{Document, Format, RenderContext, Renderer, RendererOptions};

fn wikitext_html(source: &str) -> String {
  let renderer = Renderer::new(RendererOptions {
    highlight_code: false,
    ..Default::default()
  });
  renderer
    .render(
      &Document::new(source, Format::Wikitext),
      &RenderContext::new("Main", ""),
    )
    .html
}

#[test]
fn test_header_and_data_rows() {
  let html = wikitext_html("{|\n|-\n! H\n|-\n| A || B\n|}");
  assert_eq!(html.matches("<table").count(), 1);
  assert!(html.contains(
    "<table class=\"wikitable\">\n<tr><th>H</th></tr>\n<tr><td>A</td><td>B</td></tr>\n</table>"
  ));
}

#[test]
fn test_attributes_and_caption() {
  let html = wikitext_html(
    "{| class=\"sortable\" style=\"width:50%\"\n|+ ''Planets''\n! \
     scope=\"col\" | Name !! Moons\n|-\n| Earth || style=\"color:red\" | \
     1\n|}",
  );
  assert!(html.contains(
    "<table class=\"sortable\" style=\"width:50%\">\n<caption><i>Planets</i></caption>\n<tr><th \
     scope=\"col\">Name</th><th>Moons</th></tr>\n<tr><td>Earth</td><td \
     style=\"color:red\">1</td></tr>\n</table>"
  ));
  assert!(!html.contains("wikitable"));
}

#[test]
fn test_link_pipes_are_not_cell_separators() {
  let html = wikitext_html("{|\n| [[Page|label]] || x\n|}");
  assert!(html.contains(
    "<tr><td><a href=\"/wiki/Main/page\" \
     class=\"wikilink\">label</a></td><td>x</td></tr>"
  ));
}

#[test]
fn test_continuation_lines() {
  let html = wikitext_html("{|\n| first\nmore text\n|}");
  assert!(html.contains("<td>first\nmore text</td>"));
}

#[test]
fn test_continuation_without_cell_is_dropped() {
  let html = wikitext_html("{|\n|-\nstray\n| a\n|}");
  assert!(html.contains("<tr><td>a</td></tr>"));
  assert!(!html.contains("stray"));
}

#[test]
fn test_table_between_paragraphs() {
  let html = wikitext_html("Before\n{|\n| x\n|}\nAfter");
  assert!(html.contains(
    "<p>Before</p>\n<table class=\"wikitable\">\n<tr><td>x</td></tr>\n</table>\n<p>After</p>"
  ));
}

#[test]
fn test_unterminated_table_is_text() {
  let html = wikitext_html("{|\n| x");
  assert!(!html.contains("<table"));
  assert!(html.contains("{|"));
}

//! Services that read raw page source or stored HTML without rendering it.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

use crate::{
  RENDERER_VERSION,
  links::CATEGORY_RE,
  types::Format,
  utils::build_regex,
};

static RST_CATEGORY_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?im)^[ \t]*\.\.[ \t]+category::[ \t]*(.+?)[ \t]*$")
});

static REDIRECT_RE: LazyLock<Regex> = LazyLock::new(|| {
  build_regex(r"(?i)^#REDIRECT\s*\[\[([^\]|]+)(?:\|[^\]]*)?\]\]")
});

const STAMP_PREFIX: &str = "<!-- wiki-markup:v";
const STAMP_SUFFIX: &str = " -->";

/// The token every rendered page starts with.
#[must_use]
pub fn cache_stamp() -> String {
  format!("{STAMP_PREFIX}{RENDERER_VERSION}{STAMP_SUFFIX}")
}

/// Renderer version recorded in the stamp at the very start of `html`.
#[must_use]
pub fn stamp_version(html: &str) -> Option<u32> {
  let rest = html.strip_prefix(STAMP_PREFIX)?;
  let end = rest.find(STAMP_SUFFIX)?;
  let digits = &rest[..end];
  if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
    return None;
  }
  digits.parse().ok()
}

/// Whether stored HTML was produced by the current renderer.
///
/// Missing HTML, a missing stamp and a stamp from any other version all mean
/// the page has to be rendered again.
#[must_use]
pub fn is_cache_valid(stored_html: Option<&str>) -> bool {
  stored_html
    .and_then(stamp_version)
    .is_some_and(|version| version == RENDERER_VERSION)
}

/// Categories declared in `source`, deduplicated ignoring case and sorted
/// ignoring case.
///
/// Markdown and Wikitext declare categories with `[[Category:Name]]`, RST
/// with a `.. category:: Name` line. The first spelling of a name wins.
#[must_use]
pub fn extract_categories(source: &str, format: Format) -> Vec<String> {
  let re: &Regex = match format {
    Format::Rst => &RST_CATEGORY_RE,
    Format::Markdown | Format::Wikitext => &CATEGORY_RE,
  };

  let names = re
    .captures_iter(source)
    .map(|caps| caps[1].trim().to_string())
    .collect();

  let mut categories = dedup_categories(names);
  categories.sort_by_cached_key(|name| name.to_lowercase());
  categories
}

/// Drop empty names and repeats that differ only in case, keeping the first
/// spelling and the original order.
#[must_use]
pub fn dedup_categories(names: Vec<String>) -> Vec<String> {
  let mut seen = HashSet::new();
  names
    .into_iter()
    .filter(|name| !name.is_empty() && seen.insert(name.to_lowercase()))
    .collect()
}

/// Target of a `#REDIRECT [[Target]]` page.
///
/// Only the first non-blank line counts.
#[must_use]
pub fn parse_redirect(source: &str) -> Option<String> {
  let first = source.lines().map(str::trim).find(|line| !line.is_empty())?;
  REDIRECT_RE
    .captures(first)
    .map(|caps| caps[1].trim().to_string())
    .filter(|target| !target.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_stamp_round_trip() {
    let stamp = cache_stamp();
    assert_eq!(stamp, format!("<!-- wiki-markup:v{RENDERER_VERSION} -->"));
    assert_eq!(stamp_version(&stamp), Some(RENDERER_VERSION));
    assert!(is_cache_valid(Some(&format!("{stamp}\n<p>x</p>"))));
  }

  #[test]
  fn test_invalid_stamps() {
    assert!(!is_cache_valid(None));
    assert!(!is_cache_valid(Some("")));
    assert!(!is_cache_valid(Some("<p>no stamp</p>")));
    assert!(!is_cache_valid(Some(&format!(
      "<!-- wiki-markup:v{} -->",
      RENDERER_VERSION + 1
    ))));
    assert!(!is_cache_valid(Some(&format!(" {}", cache_stamp()))));
    assert_eq!(stamp_version("<!-- wiki-markup:v -->"), None);
    assert_eq!(stamp_version("<!-- wiki-markup:v1a -->"), None);
    assert_eq!(stamp_version("<!-- wiki-markup:v+1 -->"), None);
  }

  #[test]
  fn test_categories_wikitext() {
    assert_eq!(
      extract_categories(
        "[[Category:Foo]] [[Category:foo]] [[Category:Bar]]",
        Format::Wikitext
      ),
      vec!["Bar", "Foo"]
    );
  }

  #[test]
  fn test_categories_sort_key_ignores_case() {
    assert_eq!(
      extract_categories(
        "[[Category:beta]]\n[[Category:Alpha|sort key]]\n[[category: gamma ]]",
        Format::Markdown
      ),
      vec!["Alpha", "beta", "gamma"]
    );
  }

  #[test]
  fn test_categories_rst() {
    let source = "Title\n=====\n\n.. category:: Rust\n.. category::  rust \n  \
                  .. Category:: Async\n[[Category:Ignored]]\n";
    assert_eq!(extract_categories(source, Format::Rst), vec![
      "Async", "Rust"
    ]);
  }

  #[test]
  fn test_dedup_keeps_order() {
    let names = ["b", "A", "B", "", "a"].map(str::to_string).to_vec();
    assert_eq!(dedup_categories(names), vec!["b", "A"]);
  }

  #[test]
  fn test_redirect() {
    assert_eq!(
      parse_redirect("#REDIRECT [[Target]]\n\nbody"),
      Some("Target".to_string())
    );
    assert_eq!(
      parse_redirect("\n  #redirect[[Other Page|label]]"),
      Some("Other Page".to_string())
    );
    assert_eq!(parse_redirect("Intro\n#REDIRECT [[Target]]"), None);
    assert_eq!(parse_redirect("#REDIRECT Target"), None);
    assert_eq!(parse_redirect(""), None);
  }
}

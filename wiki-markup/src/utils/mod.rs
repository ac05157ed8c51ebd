pub mod codeblock;

use std::sync::LazyLock;

use regex::Regex;

/// Anchor used when a heading slugifies to nothing (e.g. `== ??? ==`).
pub const FALLBACK_ANCHOR: &str = "section";

/// Slugify a string for use in page URLs and heading anchors.
///
/// Lowercases, drops everything that is not a word character, whitespace or a
/// hyphen, turns runs of whitespace and underscores into single hyphens,
/// collapses repeated hyphens and trims hyphens from both ends. The result may
/// be empty; use [`anchor_slug`] where an empty token is not acceptable.
///
/// Slugifying an already slugified string returns it unchanged.
#[must_use]
pub fn slugify(text: &str) -> String {
  let lowered = text.trim().to_lowercase();

  let mut slug = String::with_capacity(lowered.len());
  let mut pending_hyphen = false;

  for c in lowered.chars() {
    if c.is_whitespace() || c == '_' || c == '-' {
      pending_hyphen = true;
    } else if c.is_alphanumeric() {
      if pending_hyphen && !slug.is_empty() {
        slug.push('-');
      }
      pending_hyphen = false;
      slug.push(c);
    }
    // Anything else is dropped without breaking the current word, so
    // "C++ & Python" becomes "c-python" rather than "c---python".
  }

  slug
}

/// Slugify heading text, never returning an empty anchor.
#[must_use]
pub fn anchor_slug(text: &str) -> String {
  let slug = slugify(text);
  if slug.is_empty() {
    FALLBACK_ANCHOR.to_string()
  } else {
    slug
  }
}

/// Escape text for use inside an HTML element.
#[must_use]
pub fn escape_text(text: &str) -> String {
  html_escape::encode_text(text).into_owned()
}

/// Escape text for use inside a double-quoted HTML attribute.
#[must_use]
pub fn escape_attr(text: &str) -> String {
  html_escape::encode_double_quoted_attribute(text).into_owned()
}

/// Compile a built-in pattern, logging and degrading to a regex that never
/// matches if it somehow fails to compile. Built-in patterns are constants,
/// so a failure here is a programming error that must not take a page down.
#[must_use]
pub fn build_regex(pattern: &str) -> Regex {
  Regex::new(pattern).unwrap_or_else(|e| {
    log::error!(
      "Failed to compile regex {pattern:?}: {e}\n Falling back to never \
       matching regex."
    );
    never_matching_regex()
  })
}

/// Create a regex that never matches anything.
///
/// This is used as a fallback pattern when a regex fails to compile.
/// It will never match any input, which is safer than using a trivial regex
/// like `^$` which would match empty strings.
#[must_use]
pub fn never_matching_regex() -> Regex {
  static NEVER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(
      clippy::expect_used,
      reason = "This pattern is guaranteed to be valid"
    )]
    Regex::new(r"[^\s\S]")
      .expect("regex pattern [^\\s\\S] should always compile")
  });
  NEVER.clone()
}

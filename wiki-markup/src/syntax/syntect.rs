//! Syntect-based syntax highlighting backend enhanced with two-face.
//!
//! This module provides a syntax highlighter using the Syntect library,
//! which uses Sublime Text's syntax definitions (TextMate grammars),
//! significantly enhanced with the two-face crate for extended
//! syntax definitions and themes.

use std::sync::OnceLock;

use syntect::{
  highlighting::Theme,
  html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style},
  parsing::SyntaxSet,
  util::LinesWithEndings,
};
use two_face::{
  re_exports::syntect::highlighting::ThemeSet,
  theme::{EmbeddedLazyThemeSet, EmbeddedThemeName},
};

use super::{
  error::{SyntaxError, SyntaxResult},
  types::{SyntaxConfig, SyntaxHighlighter, SyntaxManager},
};

const DEFAULT_THEME: &str = "InspiredGitHub";

/// Syntect-based syntax highlighter
pub struct SyntectHighlighter {
  theme_name: String,
}

impl SyntectHighlighter {
  /// Create a new Syntect highlighter with the specified theme.
  #[must_use]
  pub fn new(theme_name: Option<String>) -> Self {
    Self {
      theme_name: theme_name.unwrap_or_else(|| DEFAULT_THEME.to_string()),
    }
  }

  /// Get the syntect SyntaxSet.
  fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(two_face::syntax::extra_newlines)
  }

  /// Get the syntect ThemeSet with extended themes.
  fn theme_set() -> &'static EmbeddedLazyThemeSet {
    static THEME_SET: OnceLock<EmbeddedLazyThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(two_face::theme::extra)
  }

  /// Get the default syntect ThemeSet for fallback themes.
  fn default_theme_set() -> &'static ThemeSet {
    static DEFAULT_THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    DEFAULT_THEME_SET.get_or_init(ThemeSet::load_defaults)
  }

  /// Look up a theme by name in the default set, then in two-face's set.
  fn find_theme(name: &str) -> Option<&'static Theme> {
    if let Some(theme) = Self::default_theme_set().themes.get(name) {
      return Some(theme);
    }

    let embedded = match name {
      "Base16OceanDark" => EmbeddedThemeName::Base16OceanDark,
      "Base16OceanLight" => EmbeddedThemeName::Base16OceanLight,
      "ColdarkCold" => EmbeddedThemeName::ColdarkCold,
      "ColdarkDark" => EmbeddedThemeName::ColdarkDark,
      "Dracula" => EmbeddedThemeName::Dracula,
      "Github" => EmbeddedThemeName::Github,
      "GruvboxDark" => EmbeddedThemeName::GruvboxDark,
      "GruvboxLight" => EmbeddedThemeName::GruvboxLight,
      "MonokaiExtended" => EmbeddedThemeName::MonokaiExtended,
      "Nord" => EmbeddedThemeName::Nord,
      "OneHalfDark" => EmbeddedThemeName::OneHalfDark,
      "OneHalfLight" => EmbeddedThemeName::OneHalfLight,
      "SolarizedDark" => EmbeddedThemeName::SolarizedDark,
      "SolarizedLight" => EmbeddedThemeName::SolarizedLight,
      "TwoDark" => EmbeddedThemeName::TwoDark,
      "VisualStudioDarkPlus" => EmbeddedThemeName::VisualStudioDarkPlus,
      "Zenburn" => EmbeddedThemeName::Zenburn,
      _ => return None,
    };

    Some(Self::theme_set().get(embedded))
  }
}

impl Default for SyntectHighlighter {
  fn default() -> Self {
    Self::new(None)
  }
}

impl SyntaxHighlighter for SyntectHighlighter {
  fn name(&self) -> &'static str {
    "Syntect"
  }

  fn supported_languages(&self) -> Vec<String> {
    Self::syntax_set()
      .syntaxes()
      .iter()
      .flat_map(|syntax| {
        std::iter::once(syntax.name.to_lowercase())
          .chain(syntax.file_extensions.iter().map(|ext| ext.to_lowercase()))
      })
      .collect()
  }

  fn available_themes(&self) -> Vec<String> {
    let mut themes: Vec<String> =
      Self::default_theme_set().themes.keys().cloned().collect();

    themes.extend(
      [
        "Base16OceanDark",
        "Base16OceanLight",
        "ColdarkCold",
        "ColdarkDark",
        "Dracula",
        "Github",
        "GruvboxDark",
        "GruvboxLight",
        "MonokaiExtended",
        "Nord",
        "OneHalfDark",
        "OneHalfLight",
        "SolarizedDark",
        "SolarizedLight",
        "TwoDark",
        "VisualStudioDarkPlus",
        "Zenburn",
      ]
      .map(String::from),
    );
    themes.sort();
    themes.dedup();
    themes
  }

  fn supports_language(&self, language: &str) -> bool {
    Self::syntax_set().find_syntax_by_token(language).is_some()
  }

  fn highlight(&self, code: &str, language: &str) -> SyntaxResult<String> {
    let syntax_set = Self::syntax_set();
    let syntax = syntax_set
      .find_syntax_by_token(language)
      .ok_or_else(|| SyntaxError::UnsupportedLanguage(language.to_string()))?;

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
      syntax,
      syntax_set,
      ClassStyle::Spaced,
    );
    for line in LinesWithEndings::from(code) {
      generator
        .parse_html_for_line_which_includes_newline(line)
        .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))?;
    }

    Ok(generator.finalize())
  }

  fn stylesheet(&self, theme: Option<&str>) -> SyntaxResult<String> {
    let name = theme.unwrap_or(&self.theme_name);
    let theme = Self::find_theme(name)
      .ok_or_else(|| SyntaxError::ThemeNotFound(name.to_string()))?;

    css_for_theme_with_class_style(theme, ClassStyle::Spaced)
      .map_err(|e| SyntaxError::HighlightingFailed(e.to_string()))
  }
}

/// Create a Syntect-based syntax manager with configuration
///
/// # Errors
///
/// Currently infallible; the `Result` keeps the signature uniform with other
/// backend factories.
pub fn create_syntect_manager(
  theme: Option<String>,
) -> SyntaxResult<SyntaxManager> {
  let highlighter = Box::new(SyntectHighlighter::new(theme.clone()));
  let config = SyntaxConfig {
    default_theme: theme.or_else(|| Some(DEFAULT_THEME.to_string())),
    ..SyntaxConfig::default()
  };
  Ok(SyntaxManager::new(highlighter, config))
}

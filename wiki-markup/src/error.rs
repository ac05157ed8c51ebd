use std::io;

use thiserror::Error;

/// Error type for wiki-markup operations.
///
/// Rendering itself never fails: these errors surface only from option
/// loading, format parsing and external engines, and the render pipeline
/// turns the latter into a degraded but complete HTML string.
#[derive(Debug, Error)]
pub enum RenderError {
  #[error("Unsupported markup format: {0}")]
  UnsupportedFormat(String),

  #[error("{engine} engine failed: {message}")]
  Engine {
    engine:  &'static str,
    message: String,
  },

  #[error("{0} support is not compiled in")]
  Disabled(&'static str),

  #[error("I/O error: {0}")]
  Io(#[from] io::Error),

  #[error("TOML error: {0}")]
  Toml(#[from] toml::de::Error),
}

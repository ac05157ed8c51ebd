/// An opening or closing code fence line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fence<'a> {
  /// Fence character, either '`' or '~'.
  pub ch:    char,
  /// Number of fence characters (at least 3).
  pub count: usize,
  /// Info string after the fence, trimmed. Empty when absent.
  pub info:  &'a str,
}

impl<'a> Fence<'a> {
  /// Parse a line as a code fence.
  ///
  /// Only fences starting at column 0 count; an indented fence is something
  /// else in Wikitext (a preformatted line).
  #[must_use]
  pub fn parse(line: &'a str) -> Option<Self> {
    let ch = line.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let count = line.chars().take_while(|&c| c == ch).count();
    if count < 3 {
      return None;
    }

    let info = line[count * ch.len_utf8()..].trim();
    // Backtick fences may not carry backticks in their info string.
    if ch == '`' && info.contains('`') {
      return None;
    }

    Some(Self { ch, count, info })
  }

  /// Language token of the info string (first word), if any.
  #[must_use]
  pub fn language(&self) -> Option<&'a str> {
    self.info.split_whitespace().next()
  }

  /// Whether `other` closes a block opened by this fence.
  #[must_use]
  pub fn is_closed_by(&self, other: &Fence<'_>) -> bool {
    other.ch == self.ch && other.count >= self.count && other.info.is_empty()
  }
}

/// State tracking for code fence detection.
///
/// This tracks whether we're currently inside a fenced code block and
/// maintains the fence character and count for proper closing detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FenceTracker {
  in_code_block:    bool,
  code_fence_char:  Option<char>,
  code_fence_count: usize,
}

impl FenceTracker {
  /// Create a new fence tracker.
  #[must_use]
  pub const fn new() -> Self {
    Self {
      in_code_block:    false,
      code_fence_char:  None,
      code_fence_count: 0,
    }
  }

  /// Check if currently inside a code block.
  #[must_use]
  pub const fn in_code_block(&self) -> bool {
    self.in_code_block
  }

  /// Process a line and update fence state.
  ///
  /// Returns the updated state after processing the line.
  /// Call this for each line to maintain accurate fence tracking.
  #[must_use]
  pub fn process_line(&self, line: &str) -> Self {
    let Some(fence) = Fence::parse(line.trim_start()) else {
      return *self;
    };

    if !self.in_code_block {
      return Self {
        in_code_block:    true,
        code_fence_char:  Some(fence.ch),
        code_fence_count: fence.count,
      };
    }

    if self.code_fence_char == Some(fence.ch)
      && fence.count >= self.code_fence_count
    {
      return Self::new();
    }

    *self
  }
}

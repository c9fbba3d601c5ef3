//! Splitting helpers for CSS value lists.
//!
//! All helpers treat quoted strings, escaped characters and parenthesized
//! groups as opaque, so `rgb(0, 0, 0)` is never split on its commas.

/// Splits on top-level commas, keeping a trailing empty item.
pub fn comma(string: &str) -> Vec<String> {
  split(string, &[','], true)
}

/// Splits on top-level whitespace.
pub fn space(string: &str) -> Vec<String> {
  split(string, &[' ', '\n', '\t', '\r'], false)
}

/// Splits a declaration list such as `color: red; background: blue` on
/// top-level semicolons. Empty items are dropped.
pub fn semicolon(string: &str) -> Vec<String> {
  split(string, &[';'], false)
    .into_iter()
    .filter(|item| !item.is_empty())
    .collect()
}

/// Core splitting routine.
///
/// When `last` is set the final item is kept even if it is empty, so
/// `"a,"` yields `["a", ""]`.
pub fn split(string: &str, separators: &[char], last: bool) -> Vec<String> {
  let mut items: Vec<String> = Vec::new();
  let mut current = String::new();
  let mut scanner = Scanner::default();

  for ch in string.chars() {
    let top_level = scanner.feed(ch);
    if top_level && separators.contains(&ch) {
      if !current.is_empty() {
        items.push(current.trim().to_string());
      }
      current.clear();
    } else {
      current.push(ch);
    }
  }

  if last || !current.is_empty() {
    items.push(current.trim().to_string());
  }

  items
}

/// Byte offset of the first top-level occurrence of `needle`.
pub fn find_top_level(string: &str, needle: char) -> Option<usize> {
  let mut scanner = Scanner::default();
  string
    .char_indices()
    .find(|(_, ch)| scanner.feed(*ch) && *ch == needle)
    .map(|(index, _)| index)
}

/// Tracks quote, escape and parenthesis state one character at a time.
#[derive(Default)]
struct Scanner {
  depth: u32,
  quote: Option<char>,
  escape: bool,
}

impl Scanner {
  /// Returns true when `ch` sits outside any string, escape or group.
  fn feed(&mut self, ch: char) -> bool {
    if self.escape {
      self.escape = false;
      return false;
    }
    if ch == '\\' {
      self.escape = true;
      return false;
    }
    if let Some(quote) = self.quote {
      if ch == quote {
        self.quote = None;
      }
      return false;
    }
    match ch {
      '"' | '\'' => {
        self.quote = Some(ch);
        false
      }
      '(' => {
        self.depth += 1;
        false
      }
      ')' => {
        let was_nested = self.depth > 0;
        self.depth = self.depth.saturating_sub(1);
        !was_nested
      }
      _ => self.depth == 0,
    }
  }
}

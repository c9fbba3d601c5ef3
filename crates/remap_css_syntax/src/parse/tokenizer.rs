const SINGLE_QUOTE: u8 = b'\'';
const DOUBLE_QUOTE: u8 = b'"';
const BACKSLASH: u8 = b'\\';
const SLASH: u8 = b'/';
const ASTERISK: u8 = b'*';
const NEWLINE: u8 = b'\n';
const OPEN_PARENTHESES: u8 = b'(';
const CLOSE_PARENTHESES: u8 = b')';
const OPEN_SQUARE: u8 = b'[';
const CLOSE_SQUARE: u8 = b']';
const OPEN_CURLY: u8 = b'{';
const CLOSE_CURLY: u8 = b'}';
const SEMICOLON: u8 = b';';

pub(crate) fn is_space(code: u8) -> bool {
  matches!(code, b' ' | b'\n' | b'\t' | b'\r' | 0x0c)
}

/// What terminated a prelude read by [`Tokenizer::prelude`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stop {
  OpenCurly,
  CloseCurly,
  Semicolon,
  Eof,
}

/// Byte cursor over the stylesheet. Only ASCII delimiters are ever used as
/// slice boundaries so multi-byte characters pass through untouched.
pub struct Tokenizer<'a> {
  css: &'a str,
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> Tokenizer<'a> {
  pub fn new(css: &'a str) -> Self {
    Self {
      css,
      bytes: css.as_bytes(),
      pos: 0,
    }
  }

  pub fn position(&self) -> usize {
    self.pos
  }

  pub fn end_of_file(&self) -> bool {
    self.pos >= self.bytes.len()
  }

  pub fn peek(&self) -> Option<u8> {
    self.bytes.get(self.pos).copied()
  }

  pub fn bump(&mut self) {
    if self.pos < self.bytes.len() {
      self.pos += 1;
    }
  }

  pub fn skip_space(&mut self) {
    while let Some(code) = self.peek() {
      if !is_space(code) {
        break;
      }
      self.pos += 1;
    }
  }

  pub fn at_comment(&self) -> bool {
    self.peek() == Some(SLASH) && self.bytes.get(self.pos + 1) == Some(&ASTERISK)
  }

  /// Consumes a `/* ... */` comment and returns its inner text. Unclosed
  /// comments run to the end of input.
  pub fn comment(&mut self) -> String {
    let start = self.pos + 2;
    match self.css.get(start..).and_then(|rest| rest.find("*/")) {
      Some(offset) => {
        self.pos = start + offset + 2;
        self.css[start..start + offset].to_string()
      }
      None => {
        tracing::trace!("unclosed comment at offset {}", self.pos);
        self.pos = self.bytes.len();
        self.css.get(start..).unwrap_or_default().to_string()
      }
    }
  }

  /// Reads an identifier-like name such as the one following `@`.
  pub fn name(&mut self) -> String {
    let start = self.pos;
    while let Some(code) = self.peek() {
      if code.is_ascii_alphanumeric() || code == b'-' || code == b'_' || code >= 0x80 {
        self.pos += 1;
      } else {
        break;
      }
    }
    self.css[start..self.pos].to_string()
  }

  /// Reads raw text up to the next top-level `{` or `;`, or any `}`.
  ///
  /// `{` and `;` are consumed, `}` is left for the caller so it can close the
  /// enclosing block. Strings, comments, escapes and bracketed groups are
  /// skipped over as opaque units.
  pub fn prelude(&mut self) -> (String, Stop) {
    let start = self.pos;
    let mut depth = 0usize;

    while let Some(code) = self.peek() {
      match code {
        SINGLE_QUOTE | DOUBLE_QUOTE => self.skip_string(code),
        BACKSLASH => {
          self.pos = (self.pos + 2).min(self.bytes.len());
        }
        SLASH if self.at_comment() => {
          self.comment();
        }
        OPEN_PARENTHESES | OPEN_SQUARE => {
          depth += 1;
          self.pos += 1;
        }
        CLOSE_PARENTHESES | CLOSE_SQUARE => {
          depth = depth.saturating_sub(1);
          self.pos += 1;
        }
        OPEN_CURLY if depth == 0 => {
          let text = self.css[start..self.pos].to_string();
          self.pos += 1;
          return (text, Stop::OpenCurly);
        }
        SEMICOLON if depth == 0 => {
          let text = self.css[start..self.pos].to_string();
          self.pos += 1;
          return (text, Stop::Semicolon);
        }
        CLOSE_CURLY => {
          return (self.css[start..self.pos].to_string(), Stop::CloseCurly);
        }
        _ => self.pos += 1,
      }
    }

    (self.css[start..].to_string(), Stop::Eof)
  }

  fn skip_string(&mut self, quote: u8) {
    self.pos += 1;
    while let Some(code) = self.peek() {
      match code {
        BACKSLASH => {
          self.pos = (self.pos + 2).min(self.bytes.len());
        }
        // An unclosed string ends at the line break.
        NEWLINE => return,
        _ if code == quote => {
          self.pos += 1;
          return;
        }
        _ => self.pos += 1,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn prelude_stops_at_open_curly() {
    let mut tokenizer = Tokenizer::new("a:hover > b { color: red }");
    let (text, stop) = tokenizer.prelude();
    assert_eq!(text, "a:hover > b ");
    assert_eq!(stop, Stop::OpenCurly);
  }

  #[test]
  fn prelude_ignores_semicolons_inside_parentheses() {
    let mut tokenizer = Tokenizer::new("background: url(data:image/png;base64,AA==); color: red");
    let (text, stop) = tokenizer.prelude();
    assert_eq!(text, "background: url(data:image/png;base64,AA==)");
    assert_eq!(stop, Stop::Semicolon);
  }

  #[test]
  fn prelude_ignores_delimiters_inside_strings() {
    let mut tokenizer = Tokenizer::new("content: \"a;b{c}\"}");
    let (text, stop) = tokenizer.prelude();
    assert_eq!(text, "content: \"a;b{c}\"");
    assert_eq!(stop, Stop::CloseCurly);
  }

  #[test]
  fn unclosed_comment_runs_to_end() {
    let mut tokenizer = Tokenizer::new("/* never closed");
    assert!(tokenizer.at_comment());
    assert_eq!(tokenizer.comment(), " never closed");
    assert!(tokenizer.end_of_file());
  }
}

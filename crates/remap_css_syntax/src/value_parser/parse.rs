use super::{Node, ParsedValue};

pub fn parse(input: &str) -> ParsedValue {
  let mut parser = ValueParser {
    input,
    bytes: input.as_bytes(),
    pos: 0,
  };
  ParsedValue {
    nodes: parser.nodes(false),
  }
}

struct ValueParser<'a> {
  input: &'a str,
  bytes: &'a [u8],
  pos: usize,
}

impl ValueParser<'_> {
  fn peek(&self) -> Option<u8> {
    self.bytes.get(self.pos).copied()
  }

  fn peek_at(&self, offset: usize) -> Option<u8> {
    self.bytes.get(self.pos + offset).copied()
  }

  fn nodes(&mut self, in_function: bool) -> Vec<Node> {
    let mut nodes = Vec::new();

    while let Some(code) = self.peek() {
      match code {
        code if code <= 32 => {
          let value = self.spaces();
          nodes.push(Node::Space { value });
        }
        b')' if in_function => break,
        b')' => {
          // Unbalanced parentheses are kept as words so the value round-trips.
          self.pos += 1;
          nodes.push(Node::word(")"));
        }
        b'(' => {
          self.pos += 1;
          nodes.push(self.function(String::new()));
        }
        b'/' if self.peek_at(1) == Some(b'*') => nodes.push(self.comment()),
        b'\'' | b'"' => nodes.push(self.string(code as char)),
        b',' | b'/' | b':' => {
          let before = match nodes.last() {
            Some(Node::Space { .. }) => match nodes.pop() {
              Some(Node::Space { value }) => value,
              _ => String::new(),
            },
            _ => String::new(),
          };
          self.pos += 1;
          let after = self.spaces();
          nodes.push(Node::Div {
            value: (code as char).to_string(),
            before,
            after,
          });
        }
        _ => {
          let word = self.word();
          if self.peek() == Some(b'(') {
            self.pos += 1;
            nodes.push(self.function(word));
          } else {
            nodes.push(Node::Word { value: word });
          }
        }
      }
    }

    nodes
  }

  fn spaces(&mut self) -> String {
    let start = self.pos;
    while matches!(self.peek(), Some(code) if code <= 32) {
      self.pos += 1;
    }
    self.input[start..self.pos].to_string()
  }

  fn word(&mut self) -> String {
    let start = self.pos;
    while let Some(code) = self.peek() {
      match code {
        b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
        b'/' | b',' | b':' | b'(' | b')' | b'\'' | b'"' => break,
        code if code <= 32 => break,
        _ => self.pos += 1,
      }
    }
    self.input[start..self.pos].to_string()
  }

  fn comment(&mut self) -> Node {
    let start = self.pos + 2;
    match self.input[start..].find("*/") {
      Some(offset) => {
        self.pos = start + offset + 2;
        Node::Comment {
          value: self.input[start..start + offset].to_string(),
          unclosed: false,
        }
      }
      None => {
        self.pos = self.bytes.len();
        Node::Comment {
          value: self.input[start..].to_string(),
          unclosed: true,
        }
      }
    }
  }

  fn string(&mut self, quote: char) -> Node {
    let start = self.pos + 1;
    let mut index = start;
    while index < self.bytes.len() {
      match self.bytes[index] {
        b'\\' => index += 2,
        code if code as char == quote => {
          self.pos = index + 1;
          return Node::String {
            value: self.input[start..index].to_string(),
            quote,
            unclosed: false,
          };
        }
        _ => index += 1,
      }
    }
    self.pos = self.bytes.len();
    Node::String {
      value: self.input[start.min(self.bytes.len())..].to_string(),
      quote,
      unclosed: true,
    }
  }

  /// Parses the body of a function whose opening parenthesis was consumed.
  fn function(&mut self, name: String) -> Node {
    let before = self.spaces();

    if name.eq_ignore_ascii_case("url") && !matches!(self.peek(), Some(b'\'' | b'"')) {
      return self.raw_url(name, before);
    }

    let mut nodes = self.nodes(true);
    let after = match nodes.last() {
      Some(Node::Space { .. }) => match nodes.pop() {
        Some(Node::Space { value }) => value,
        _ => String::new(),
      },
      _ => String::new(),
    };
    let unclosed = self.peek() != Some(b')');
    if !unclosed {
      self.pos += 1;
    }

    Node::Function {
      value: name,
      nodes,
      before,
      after,
      unclosed,
    }
  }

  /// Unquoted `url(...)` bodies are kept as a single word.
  fn raw_url(&mut self, name: String, before: String) -> Node {
    let start = self.pos;
    while let Some(code) = self.peek() {
      match code {
        b'\\' => self.pos = (self.pos + 2).min(self.bytes.len()),
        b')' => break,
        _ => self.pos += 1,
      }
    }
    let body = &self.input[start..self.pos];
    let trimmed = body.trim_end();
    let after = body[trimmed.len()..].to_string();
    let unclosed = self.peek() != Some(b')');
    if !unclosed {
      self.pos += 1;
    }

    let nodes = if trimmed.is_empty() {
      Vec::new()
    } else {
      vec![Node::word(trimmed)]
    };
    Node::Function {
      value: name,
      nodes,
      before,
      after,
      unclosed,
    }
  }
}

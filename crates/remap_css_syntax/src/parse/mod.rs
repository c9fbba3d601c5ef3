mod tokenizer;

pub use tokenizer::{Stop, Tokenizer};

use crate::ast::{AtRule, Comment, Declaration, Node, Root, Rule};
use crate::list;

/// Parses a stylesheet into a [`Root`].
///
/// Parsing never fails. Unbalanced braces, declarations without a colon and
/// rules without a selector are skipped, and unclosed blocks are closed at the
/// end of input.
pub fn parse(css: &str) -> Root {
  let mut parser = Parser {
    tokenizer: Tokenizer::new(css),
  };
  Root {
    nodes: parser.nodes(false),
  }
}

struct Parser<'a> {
  tokenizer: Tokenizer<'a>,
}

impl Parser<'_> {
  fn nodes(&mut self, nested: bool) -> Vec<Node> {
    let mut nodes = Vec::new();

    loop {
      self.tokenizer.skip_space();
      match self.tokenizer.peek() {
        None => {
          if nested {
            tracing::trace!("unclosed block closed at end of input");
          }
          break;
        }
        Some(b'}') => {
          self.tokenizer.bump();
          if nested {
            break;
          }
          tracing::trace!(
            "unexpected }} at offset {}",
            self.tokenizer.position().saturating_sub(1)
          );
        }
        Some(b';') => self.tokenizer.bump(),
        Some(b'/') if self.tokenizer.at_comment() => {
          let text = self.tokenizer.comment();
          nodes.push(Node::Comment(Comment::new(text.trim())));
        }
        Some(b'@') => {
          self.tokenizer.bump();
          nodes.push(Node::AtRule(self.at_rule()));
        }
        Some(_) => {
          if let Some(node) = self.statement() {
            nodes.push(node);
          }
        }
      }
    }

    nodes
  }

  fn at_rule(&mut self) -> AtRule {
    let name = self.tokenizer.name();
    let (params, stop) = self.tokenizer.prelude();
    let params = clean_prelude(&params);

    let nodes = match stop {
      Stop::OpenCurly => Some(self.nodes(true)),
      Stop::Semicolon | Stop::CloseCurly | Stop::Eof => None,
    };

    AtRule {
      name,
      params,
      nodes,
    }
  }

  fn statement(&mut self) -> Option<Node> {
    let start = self.tokenizer.position();
    let (prelude, stop) = self.tokenizer.prelude();

    if stop == Stop::OpenCurly {
      let selector = clean_prelude(&prelude);
      let nodes = self.nodes(true);
      if selector.is_empty() {
        tracing::trace!("skipping rule without selector at offset {}", start);
        return None;
      }
      return Some(Node::Rule(Rule { selector, nodes }));
    }

    let declaration = declaration(&prelude);
    if declaration.is_none() && !prelude.trim().is_empty() {
      tracing::trace!("skipping malformed declaration at offset {}", start);
    }
    declaration.map(Node::Declaration)
  }
}

/// Parses a single `prop: value [!important]` fragment.
pub fn declaration(text: &str) -> Option<Declaration> {
  let colon = list::find_top_level(text, ':')?;
  let prop = text[..colon].trim();
  if prop.is_empty() || prop.contains(char::is_whitespace) {
    return None;
  }

  let (value, important) = split_important(&text[colon + 1..]);
  Some(Declaration {
    prop: prop.to_string(),
    value,
    important,
  })
}

/// Splits a trailing `!important` (in any case, with optional space after the
/// bang) off a declaration value.
pub fn split_important(value: &str) -> (String, bool) {
  let trimmed = value.trim();
  let lower = trimmed.to_ascii_lowercase();
  if let Some(head) = lower.strip_suffix("important") {
    let head = head.trim_end();
    if let Some(head) = head.strip_suffix('!') {
      let value = trimmed[..head.len()].trim_end();
      return (value.to_string(), true);
    }
  }
  (trimmed.to_string(), false)
}

/// Drops comments and collapses whitespace in selectors and at-rule params.
fn clean_prelude(prelude: &str) -> String {
  let mut out = String::with_capacity(prelude.len());
  let mut tokenizer = Tokenizer::new(prelude);
  let mut pending_space = false;
  let mut segment_start = 0;

  while let Some(code) = tokenizer.peek() {
    if tokenizer.at_comment() {
      push_collapsed(&mut out, &prelude[segment_start..tokenizer.position()], &mut pending_space);
      tokenizer.comment();
      segment_start = tokenizer.position();
      continue;
    }
    if code == b'"' || code == b'\'' {
      push_collapsed(&mut out, &prelude[segment_start..tokenizer.position()], &mut pending_space);
      let start = tokenizer.position();
      let end = string_end(prelude, start);
      if pending_space && !out.is_empty() {
        out.push(' ');
      }
      pending_space = false;
      out.push_str(&prelude[start..end]);
      while tokenizer.position() < end {
        tokenizer.bump();
      }
      segment_start = end;
      continue;
    }
    tokenizer.bump();
  }
  push_collapsed(&mut out, &prelude[segment_start..], &mut pending_space);

  out
}

fn push_collapsed(out: &mut String, segment: &str, pending_space: &mut bool) {
  for ch in segment.chars() {
    if ch.is_whitespace() {
      *pending_space = true;
    } else {
      if *pending_space && !out.is_empty() {
        out.push(' ');
      }
      *pending_space = false;
      out.push(ch);
    }
  }
}

fn string_end(text: &str, start: usize) -> usize {
  let bytes = text.as_bytes();
  let quote = bytes[start];
  let mut index = start + 1;
  while index < bytes.len() {
    match bytes[index] {
      b'\\' => index += 2,
      code if code == quote => return index + 1,
      _ => index += 1,
    }
  }
  bytes.len()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn decl(prop: &str, value: &str, important: bool) -> Node {
    Node::Declaration(Declaration::new(prop, value).important(important))
  }

  #[test]
  fn parses_rules_and_declarations() {
    let root = parse("a, b { color: red; background: #fff !important }");
    assert_eq!(
      root.nodes,
      vec![Node::Rule(Rule {
        selector: "a, b".into(),
        nodes: vec![
          decl("color", "red", false),
          decl("background", "#fff", true),
        ],
      })]
    );
  }

  #[test]
  fn parses_nested_at_rules() {
    let root = parse("@media (min-width: 10px) { .a { color: red } } @import 'x.css';");
    let media = root.nodes[0].as_at_rule().unwrap();
    assert_eq!(media.name, "media");
    assert_eq!(media.params, "(min-width: 10px)");
    assert_eq!(media.nodes.as_ref().unwrap().len(), 1);

    let import = root.nodes[1].as_at_rule().unwrap();
    assert_eq!(import.name, "import");
    assert_eq!(import.params, "'x.css'");
    assert!(import.nodes.is_none());
  }

  #[test]
  fn keeps_hack_markers_on_property() {
    let root = parse("a { *zoom: 1; _height: 1px }");
    let rule = root.nodes[0].as_rule().unwrap();
    let props: Vec<_> = rule.declarations().map(|d| d.prop.as_str()).collect();
    assert_eq!(props, vec!["*zoom", "_height"]);
  }

  #[test]
  fn tolerates_malformed_input() {
    let root = parse("} a { color red; color: blue; } b { color: green");
    assert_eq!(root.nodes.len(), 2);
    let a = root.nodes[0].as_rule().unwrap();
    assert_eq!(a.nodes, vec![decl("color", "blue", false)]);
    let b = root.nodes[1].as_rule().unwrap();
    assert_eq!(b.nodes, vec![decl("color", "green", false)]);
  }

  #[test]
  fn strips_comments_from_selectors() {
    let root = parse("a /* x */ >\n  b { color: red }");
    assert_eq!(root.nodes[0].as_rule().unwrap().selector, "a > b");
  }

  #[test]
  fn keeps_quoted_selector_text() {
    let root = parse("a[title=\"x  y\"] { color: red }");
    assert_eq!(root.nodes[0].as_rule().unwrap().selector, "a[title=\"x  y\"]");
  }

  #[test]
  fn split_important_variants() {
    assert_eq!(split_important(" red ! IMPORTANT "), ("red".into(), true));
    assert_eq!(split_important("red"), ("red".into(), false));
    assert_eq!(split_important("unimportant"), ("unimportant".into(), false));
  }

  #[test]
  fn declaration_requires_colon_and_property() {
    assert!(declaration("color red").is_none());
    assert!(declaration(": red").is_none());
    assert_eq!(
      declaration("content: \"a:b\""),
      Some(Declaration::new("content", "\"a:b\""))
    );
  }
}

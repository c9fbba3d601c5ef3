//! Reduces a declaration to a canonical, comparable form.

use remap_css_syntax::list;
use remap_css_syntax::value_parser::{self, Node};

use crate::color;

/// Shorthands whose space separated components may appear in any order.
const ORDER_INSENSITIVE_SHORTHANDS: &[&str] = &[
  "border",
  "border-top",
  "border-right",
  "border-bottom",
  "border-left",
  "border-block",
  "border-block-start",
  "border-block-end",
  "border-inline",
  "border-inline-start",
  "border-inline-end",
  "outline",
  "column-rule",
  "text-decoration",
  "list-style",
];

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NormalizedDeclaration {
  pub property: String,
  pub value: String,
  pub important: bool,
}

pub fn normalize(property: &str, value: &str, important: bool) -> NormalizedDeclaration {
  let property = normalize_property(property);
  let value = normalize_value(&property, value);
  NormalizedDeclaration {
    property,
    value,
    important,
  }
}

/// `prop: value`, with ` !important` appended when set.
pub fn stringify_key(declaration: &NormalizedDeclaration) -> String {
  let mut key = format!("{}: {}", declaration.property, declaration.value);
  if declaration.important {
    key.push_str(" !important");
  }
  key
}

/// Lowercases the property name. Hack markers such as `*zoom` or `_height`
/// stay part of the name.
pub fn normalize_property(property: &str) -> String {
  property.trim().to_ascii_lowercase()
}

fn normalize_value(property: &str, value: &str) -> String {
  let case_sensitive = property == "content"
    || value
      .trim_start()
      .get(..4)
      .is_some_and(|head| head.eq_ignore_ascii_case("url("));

  let mut parsed = value_parser::parse(value.trim());
  minify_nodes(&mut parsed.nodes, false, !case_sensitive);
  let value = parsed.to_css();

  if color::is_color(&value) {
    if let Some(canonical) = color::parse_color(&value) {
      return canonical.to_string();
    }
  }

  if ORDER_INSENSITIVE_SHORTHANDS.contains(&property) && list::find_top_level(&value, ',').is_none() {
    let mut tokens = list::space(&value);
    tokens.sort();
    return tokens.join(" ");
  }

  value
}

/// Collapses insignificant whitespace, strips redundant leading zeros and
/// optionally case folds words. Strings and `url()` bodies are left alone.
fn minify_nodes(nodes: &mut Vec<Node>, in_function: bool, fold_case: bool) {
  for node in nodes.iter_mut() {
    match node {
      Node::Space { value } => *value = " ".to_string(),
      Node::Word { value } => {
        *value = strip_leading_zero(value);
        if fold_case {
          *value = value.to_ascii_lowercase();
        }
      }
      Node::Div {
        value,
        before,
        after,
      } => {
        before.clear();
        after.clear();
        if !in_function {
          match value.as_str() {
            "," => after.push(' '),
            "/" => {
              before.push(' ');
              after.push(' ');
            }
            _ => {}
          }
        }
      }
      Node::Function {
        value,
        nodes: inner,
        before,
        after,
        ..
      } => {
        before.clear();
        after.clear();
        if fold_case {
          *value = value.to_ascii_lowercase();
        }
        if !value.eq_ignore_ascii_case("url") {
          minify_nodes(inner, true, fold_case);
        }
      }
      Node::String { .. } | Node::Comment { .. } => {}
    }
  }

  // Whitespace at the edges of a list is never significant.
  while matches!(nodes.first(), Some(Node::Space { .. })) {
    nodes.remove(0);
  }
  while matches!(nodes.last(), Some(Node::Space { .. })) {
    nodes.pop();
  }
}

/// `0.5` becomes `.5`, `-0.25em` becomes `-.25em`.
fn strip_leading_zero(word: &str) -> String {
  let (sign, rest) = match word.as_bytes().first() {
    Some(b'-' | b'+') => word.split_at(1),
    _ => ("", word),
  };
  let mut digits = rest;
  while digits.len() > 2 && digits.starts_with("00") {
    digits = &digits[1..];
  }
  match digits.strip_prefix('0') {
    Some(tail) if tail.starts_with('.') && tail[1..].starts_with(|c: char| c.is_ascii_digit()) => {
      format!("{sign}{tail}")
    }
    _ => word.to_string(),
  }
}

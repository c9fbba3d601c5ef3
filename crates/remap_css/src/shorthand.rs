//! One-level shorthand expansion for the properties that mix colors with
//! other components.
//!
//! Only the components present in the value are returned. Defaults for
//! omitted components are never synthesized.

use remap_css_syntax::value_parser::{self, stringify_node, Node};

use crate::color;
use crate::error::ShorthandError;

const GLOBAL_VALUES: &[&str] = &["inherit", "initial", "unset", "revert", "revert-layer"];

const LINE_STYLE_VALUES: &[&str] = &[
  "auto", "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset",
  "outset",
];
const LINE_WIDTH_VALUES: &[&str] = &["thin", "medium", "thick"];

const REPEAT_VALUES: &[&str] = &["repeat", "repeat-x", "repeat-y", "no-repeat", "space", "round"];
const ATTACHMENT_VALUES: &[&str] = &["scroll", "fixed", "local"];
const BOX_VALUES: &[&str] = &["border-box", "padding-box", "content-box", "text"];
const POSITION_VALUES: &[&str] = &["left", "right", "top", "bottom", "center"];
const SIZE_VALUES: &[&str] = &["auto", "cover", "contain"];
const MATH_FUNCTIONS: &[&str] = &["calc", "min", "max", "clamp"];

/// Shorthands whose value mixes colors with non-color components.
pub fn is_shorthand_property(property: &str) -> bool {
  let property = property.trim().to_ascii_lowercase();
  property == "background" || is_line_shorthand(&property)
}

/// `border`, its physical and logical sides, `outline` and `column-rule`.
fn is_line_shorthand(property: &str) -> bool {
  matches!(
    property,
    "border"
      | "border-top"
      | "border-right"
      | "border-bottom"
      | "border-left"
      | "border-block"
      | "border-block-start"
      | "border-block-end"
      | "border-inline"
      | "border-inline-start"
      | "border-inline-end"
      | "outline"
      | "column-rule"
  )
}

/// Splits a shorthand into `(longhand, value)` pairs.
///
/// Comma separated (multi-layer) values and components that fit no longhand
/// are reported as errors so the caller can fall back to editing the
/// shorthand in place.
pub fn expand_shorthand(
  property: &str,
  value: &str,
) -> Result<Vec<(String, String)>, ShorthandError> {
  let property = property.trim().to_ascii_lowercase();
  let parsed = value_parser::parse(value.trim());

  let multiple = parsed
    .nodes
    .iter()
    .any(|node| matches!(node, Node::Div { value, .. } if value == ","));
  if multiple {
    return Err(ShorthandError::MultipleValues {
      property,
      value: value.to_string(),
    });
  }

  let expander = Expander {
    property: &property,
    value,
  };
  if property == "background" {
    expander.background(&parsed.nodes)
  } else if is_line_shorthand(&property) {
    expander.line(&parsed.nodes)
  } else {
    Err(ShorthandError::NotShorthand {
      property: property.clone(),
    })
  }
}

struct Expander<'a> {
  property: &'a str,
  value: &'a str,
}

impl Expander<'_> {
  fn ambiguous(&self, component: impl Into<String>) -> ShorthandError {
    ShorthandError::Ambiguous {
      property: self.property.to_string(),
      value: self.value.to_string(),
      component: component.into(),
    }
  }

  fn fill(&self, slot: &mut Option<String>, text: String) -> Result<(), ShorthandError> {
    if slot.is_some() {
      return Err(self.ambiguous(text));
    }
    *slot = Some(text);
    Ok(())
  }

  /// `<width> || <style> || <color>`
  fn line(&self, nodes: &[Node]) -> Result<Vec<(String, String)>, ShorthandError> {
    let mut width = None;
    let mut style = None;
    let mut color = None;

    for node in components(nodes) {
      let text = stringify_node(node);
      let lower = text.to_ascii_lowercase();
      if !matches!(node, Node::Word { .. } | Node::Function { .. }) {
        return Err(self.ambiguous(text));
      }

      if LINE_STYLE_VALUES.contains(&lower.as_str()) {
        self.fill(&mut style, text)?;
      } else if LINE_WIDTH_VALUES.contains(&lower.as_str()) || is_length(node) {
        self.fill(&mut width, text)?;
      } else if is_concrete_color(&text) {
        self.fill(&mut color, text)?;
      } else {
        return Err(self.ambiguous(text));
      }
    }

    let longhands: Vec<(String, String)> = [("width", width), ("style", style), ("color", color)]
      .into_iter()
      .filter_map(|(suffix, value)| value.map(|value| (format!("{}-{suffix}", self.property), value)))
      .collect();

    if longhands.is_empty() {
      return Err(self.ambiguous(self.value));
    }
    Ok(longhands)
  }

  /// A single background layer.
  fn background(&self, nodes: &[Node]) -> Result<Vec<(String, String)>, ShorthandError> {
    let mut color = None;
    let mut image = None;
    let mut attachment = None;
    let mut position: Vec<String> = Vec::new();
    let mut size: Vec<String> = Vec::new();
    let mut repeat: Vec<String> = Vec::new();
    let mut boxes: Vec<String> = Vec::new();
    let mut after_slash = false;

    for node in components(nodes) {
      let text = stringify_node(node);
      let lower = text.to_ascii_lowercase();

      match node {
        Node::Div { value, .. } if value == "/" && !position.is_empty() && size.is_empty() => {
          after_slash = true;
          continue;
        }
        Node::Word { .. } | Node::Function { .. } => {}
        _ => return Err(self.ambiguous(text)),
      }

      if after_slash {
        if size.len() < 2 && (SIZE_VALUES.contains(&lower.as_str()) || is_length(node)) {
          size.push(text);
          continue;
        }
        if size.is_empty() {
          return Err(self.ambiguous(text));
        }
        after_slash = false;
      }

      if is_image(node) {
        self.fill(&mut image, text)?;
      } else if REPEAT_VALUES.contains(&lower.as_str()) && repeat.len() < 2 {
        repeat.push(text);
      } else if ATTACHMENT_VALUES.contains(&lower.as_str()) {
        self.fill(&mut attachment, text)?;
      } else if BOX_VALUES.contains(&lower.as_str()) && boxes.len() < 2 {
        boxes.push(text);
      } else if (POSITION_VALUES.contains(&lower.as_str()) || is_length(node)) && size.is_empty() {
        position.push(text);
      } else if is_concrete_color(&text) {
        self.fill(&mut color, text)?;
      } else {
        return Err(self.ambiguous(text));
      }
    }

    if after_slash && size.is_empty() {
      return Err(self.ambiguous("/"));
    }

    let joined = |parts: Vec<String>| (!parts.is_empty()).then(|| parts.join(" "));
    let (origin, clip) = match boxes.as_slice() {
      [] => (None, None),
      [both] => (Some(both.clone()), Some(both.clone())),
      [origin, clip, ..] => (Some(origin.clone()), Some(clip.clone())),
    };

    let longhands: Vec<(String, String)> = [
      ("background-color", color),
      ("background-image", image),
      ("background-position", joined(position)),
      ("background-size", joined(size)),
      ("background-repeat", joined(repeat)),
      ("background-attachment", attachment),
      ("background-origin", origin),
      ("background-clip", clip),
    ]
    .into_iter()
    .filter_map(|(property, value)| value.map(|value| (property.to_string(), value)))
    .collect();

    if longhands.is_empty() {
      return Err(self.ambiguous(self.value));
    }
    Ok(longhands)
  }
}

/// Top level nodes without whitespace and comments.
fn components(nodes: &[Node]) -> impl Iterator<Item = &Node> {
  nodes
    .iter()
    .filter(|node| !matches!(node, Node::Space { .. } | Node::Comment { .. }))
}

fn is_concrete_color(text: &str) -> bool {
  let lower = text.to_ascii_lowercase();
  !GLOBAL_VALUES.contains(&lower.as_str()) && lower != "none" && color::is_color(text)
}

fn is_length(node: &Node) -> bool {
  match node {
    Node::Word { value } => {
      let unsigned = value.strip_prefix(['-', '+']).unwrap_or(value);
      unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
    }
    Node::Function { value, .. } => MATH_FUNCTIONS.contains(&value.to_ascii_lowercase().as_str()),
    _ => false,
  }
}

fn is_image(node: &Node) -> bool {
  match node {
    Node::Word { value } => value.eq_ignore_ascii_case("none"),
    Node::Function { value, .. } => {
      let name = value.to_ascii_lowercase();
      matches!(
        name.as_str(),
        "url" | "image" | "image-set" | "-webkit-image-set" | "cross-fade" | "element"
      ) || name.ends_with("gradient")
    }
    _ => false,
  }
}

//! A small media query evaluator used to drop `@media` blocks that cannot
//! apply to a configured device.
//!
//! Anything the evaluator does not understand is treated as matching, so an
//! unfamiliar query never causes rules to disappear.

use remap_css_syntax::list;
use serde::Deserialize;

const ROOT_FONT_SIZE: f64 = 16.0;
const KNOWN_MEDIA_TYPES: &[&str] = &[
  "screen",
  "print",
  "speech",
  "tv",
  "handheld",
  "projection",
  "aural",
  "braille",
  "embossed",
  "tty",
];

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
  #[default]
  Light,
  Dark,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
  Portrait,
  Landscape,
}

/// The device media queries are evaluated against.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceProfile {
  #[serde(rename = "type")]
  pub media_type: String,
  /// Viewport width in CSS pixels.
  pub width: f64,
  /// Viewport height in CSS pixels.
  pub height: f64,
  pub prefers_color_scheme: ColorScheme,
  /// Device pixels per CSS pixel.
  pub resolution: f64,
}

impl Default for DeviceProfile {
  fn default() -> Self {
    Self {
      media_type: "screen".to_string(),
      width: 1024.0,
      height: 768.0,
      prefers_color_scheme: ColorScheme::Light,
      resolution: 1.0,
    }
  }
}

impl DeviceProfile {
  pub fn orientation(&self) -> Orientation {
    if self.height >= self.width {
      Orientation::Portrait
    } else {
      Orientation::Landscape
    }
  }
}

/// Evaluates a media query list. Empty and unparseable queries match.
pub fn matches(query: &str, device: &DeviceProfile) -> bool {
  let query = query.trim();
  if query.is_empty() {
    return true;
  }
  list::comma(query).iter().any(|query| {
    evaluate_query(query, device).unwrap_or_else(|| {
      tracing::trace!(query = query.as_str(), "media query not understood, keeping block");
      true
    })
  })
}

fn evaluate_query(query: &str, device: &DeviceProfile) -> Option<bool> {
  let lower = query.trim().to_ascii_lowercase();
  let mut rest = lower.as_str();
  let mut negate = false;

  if let Some(after) = strip_keyword(rest, "not") {
    negate = true;
    rest = after;
  } else if let Some(after) = strip_keyword(rest, "only") {
    rest = after;
  }

  let mut result = true;
  if !rest.starts_with('(') {
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    result = media_type_matches(&rest[..end], device)?;
    rest = rest[end..].trim_start();
    if !rest.is_empty() {
      rest = strip_keyword(rest, "and")?;
    }
  }

  while !rest.is_empty() {
    let feature = rest.strip_prefix('(')?;
    let close = list::find_top_level(feature, ')')?;
    result &= evaluate_feature(&feature[..close], device)?;
    rest = feature[close + 1..].trim_start();
    if !rest.is_empty() {
      rest = strip_keyword(rest, "and")?;
    }
  }

  Some(result != negate)
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
  let rest = text.strip_prefix(keyword)?;
  if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
    Some(rest.trim_start())
  } else {
    None
  }
}

fn media_type_matches(media_type: &str, device: &DeviceProfile) -> Option<bool> {
  if media_type == "all" {
    return Some(true);
  }
  if KNOWN_MEDIA_TYPES.contains(&media_type) {
    return Some(device.media_type.eq_ignore_ascii_case(media_type));
  }
  None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Comparison {
  Less,
  LessOrEqual,
  Equal,
  GreaterOrEqual,
  Greater,
}

impl Comparison {
  fn parse(op: &str) -> Option<Self> {
    match op {
      "<" => Some(Comparison::Less),
      "<=" => Some(Comparison::LessOrEqual),
      "=" => Some(Comparison::Equal),
      ">=" => Some(Comparison::GreaterOrEqual),
      ">" => Some(Comparison::Greater),
      _ => None,
    }
  }

  /// The same comparison with its operands swapped.
  fn flip(self) -> Self {
    match self {
      Comparison::Less => Comparison::Greater,
      Comparison::LessOrEqual => Comparison::GreaterOrEqual,
      Comparison::Equal => Comparison::Equal,
      Comparison::GreaterOrEqual => Comparison::LessOrEqual,
      Comparison::Greater => Comparison::Less,
    }
  }

  fn holds(self, actual: f64, expected: f64) -> bool {
    const EPSILON: f64 = 1e-6;
    match self {
      Comparison::Less => actual < expected,
      Comparison::LessOrEqual => actual <= expected + EPSILON,
      Comparison::Equal => (actual - expected).abs() < EPSILON,
      Comparison::GreaterOrEqual => actual + EPSILON >= expected,
      Comparison::Greater => actual > expected,
    }
  }
}

fn evaluate_feature(feature: &str, device: &DeviceProfile) -> Option<bool> {
  let feature = feature.trim();

  if let Some((name, value)) = feature.split_once(':') {
    let name = name.trim();
    let value = value.trim();
    return match (name.strip_prefix("min-"), name.strip_prefix("max-")) {
      (Some(name), _) => compare(name, Comparison::GreaterOrEqual, value, device),
      (_, Some(name)) => compare(name, Comparison::LessOrEqual, value, device),
      _ => match name {
        "orientation" => Some(match value {
          "portrait" => device.orientation() == Orientation::Portrait,
          "landscape" => device.orientation() == Orientation::Landscape,
          _ => return None,
        }),
        "prefers-color-scheme" => Some(match value {
          "light" => device.prefers_color_scheme == ColorScheme::Light,
          "dark" => device.prefers_color_scheme == ColorScheme::Dark,
          _ => return None,
        }),
        _ => compare(name, Comparison::Equal, value, device),
      },
    };
  }

  if let Some((left, op, right)) = split_range(feature) {
    // 400px <= width <= 700px
    if let Some((name, second, upper)) = split_range(right) {
      let lower = compare(name, op.flip(), left, device)?;
      let upper = compare(name, second, upper, device)?;
      return Some(lower && upper);
    }
    if is_feature_name(left) {
      return compare(left, op, right, device);
    }
    return compare(right, op.flip(), left, device);
  }

  None
}

/// Splits `width >= 600px` style range features at the first operator.
fn split_range(feature: &str) -> Option<(&str, Comparison, &str)> {
  let start = feature.find(['<', '>', '='])?;
  let len = if feature[start + 1..].starts_with('=') { 2 } else { 1 };
  let op = Comparison::parse(&feature[start..start + len])?;
  Some((
    feature[..start].trim(),
    op,
    feature[start + len..].trim(),
  ))
}

fn is_feature_name(text: &str) -> bool {
  text.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn compare(name: &str, op: Comparison, value: &str, device: &DeviceProfile) -> Option<bool> {
  let (actual, expected) = match name {
    "width" => (device.width, length(value)?),
    "height" => (device.height, length(value)?),
    "resolution" => (device.resolution, resolution(value)?),
    "aspect-ratio" => (device.width / device.height, ratio(value)?),
    _ => return None,
  };
  Some(op.holds(actual, expected))
}

fn split_unit(value: &str) -> Option<(f64, &str)> {
  let end = value
    .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
    .unwrap_or(value.len());
  let number = value[..end].parse().ok()?;
  Some((number, value[end..].trim()))
}

fn length(value: &str) -> Option<f64> {
  let (number, unit) = split_unit(value)?;
  match unit {
    "px" => Some(number),
    "em" | "rem" => Some(number * ROOT_FONT_SIZE),
    "" if number == 0.0 => Some(0.0),
    _ => None,
  }
}

fn resolution(value: &str) -> Option<f64> {
  let (number, unit) = split_unit(value)?;
  match unit {
    "dppx" | "x" => Some(number),
    "dpi" => Some(number / 96.0),
    "dpcm" => Some(number * 2.54 / 96.0),
    _ => None,
  }
}

fn ratio(value: &str) -> Option<f64> {
  let (width, height) = match value.split_once('/') {
    Some((width, height)) => (width.trim().parse::<f64>().ok()?, height.trim().parse::<f64>().ok()?),
    None => (value.trim().parse::<f64>().ok()?, 1.0),
  };
  (height != 0.0).then(|| width / height)
}

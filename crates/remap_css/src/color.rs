//! Color parsing and canonicalization.
//!
//! Every recognized color form (names, 3/4/6/8 digit hex, `rgb()`, `rgba()`,
//! `hsl()`, `hsla()`) collapses to one [`CanonicalColor`], printed as eight
//! lowercase hex digits. Parsing itself is done by `csscolorparser`; this
//! module only narrows what it accepts to the forms above.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) static COLOR_FUNCTION_REGEX: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^(?i)(rgb|hsl)a?$").unwrap());

/// Keywords that are accepted wherever a color is, but never name a concrete one.
const CSS_WIDE_KEYWORDS: &[&str] = &[
  "currentcolor",
  "inherit",
  "initial",
  "none",
  "revert",
  "unset",
];

/// A color as red, green, blue and alpha bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalColor(pub [u8; 4]);

impl CanonicalColor {
  pub const TRANSPARENT: CanonicalColor = CanonicalColor([0, 0, 0, 0]);

  pub fn new(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
    Self([red, green, blue, alpha])
  }

  pub fn red(&self) -> u8 {
    self.0[0]
  }

  pub fn green(&self) -> u8 {
    self.0[1]
  }

  pub fn blue(&self) -> u8 {
    self.0[2]
  }

  pub fn alpha(&self) -> u8 {
    self.0[3]
  }

  /// True for grays, where every color channel is equal.
  pub fn is_monochrome(&self) -> bool {
    self.red() == self.green() && self.green() == self.blue()
  }

  pub fn invert(self) -> Self {
    invert(self)
  }
}

impl fmt::Display for CanonicalColor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let [r, g, b, a] = self.0;
    write!(f, "#{r:02x}{g:02x}{b:02x}{a:02x}")
  }
}

/// Per-channel complement. Alpha is preserved.
pub fn invert(color: CanonicalColor) -> CanonicalColor {
  let [r, g, b, a] = color.0;
  CanonicalColor([255 - r, 255 - g, 255 - b, a])
}

pub fn is_css_wide_keyword(text: &str) -> bool {
  CSS_WIDE_KEYWORDS
    .iter()
    .any(|keyword| keyword.eq_ignore_ascii_case(text.trim()))
}

/// Whether `text` has the shape of a color: a named color, a hex literal, a
/// color function call, or a keyword usable in color position.
pub fn is_color(text: &str) -> bool {
  let text = text.trim();
  if is_css_wide_keyword(text) {
    return true;
  }
  if let Some(digits) = text.strip_prefix('#') {
    return matches!(digits.len(), 3 | 4 | 6 | 8) && digits.bytes().all(|b| b.is_ascii_hexdigit());
  }
  if let Some((name, _)) = split_function(text) {
    return COLOR_FUNCTION_REGEX.is_match(name);
  }
  // Anything else must be a color name.
  text.bytes().all(|b| b.is_ascii_alphabetic()) && parse_color(text).is_some()
}

/// Canonical `#rrggbbaa` text for a color, or the input unchanged when it is
/// not a recognized color.
pub fn normalize_color(text: &str) -> String {
  match parse_color(text) {
    Some(color) => color.to_string(),
    None => text.to_string(),
  }
}

/// Parses a color. Any fully transparent color becomes
/// [`CanonicalColor::TRANSPARENT`].
pub fn parse_color(text: &str) -> Option<CanonicalColor> {
  let text = text.trim();
  if text.is_empty() || is_css_wide_keyword(text) {
    return None;
  }

  if !text.starts_with('#') {
    // csscolorparser reads bare hex digits (`fab`, `c0ffee`) as hex colors
    if matches!(text.len(), 3 | 4 | 6 | 8) && text.bytes().all(|b| b.is_ascii_hexdigit()) {
      return None;
    }
    // and knows more functions than the ones remapped here.
    if let Some((name, _)) = split_function(text) {
      if !COLOR_FUNCTION_REGEX.is_match(name) {
        return None;
      }
    }
  }

  let color = csscolorparser::parse(text).ok()?;
  let [r, g, b, a] = [color.r, color.g, color.b, color.a]
    .map(|channel| (channel * 255.0).round().clamp(0.0, 255.0) as u8);

  if a == 0 {
    return Some(CanonicalColor::TRANSPARENT);
  }
  Some(CanonicalColor([r, g, b, a]))
}

fn split_function(text: &str) -> Option<(&str, &str)> {
  let open = text.find('(')?;
  let body = text.strip_suffix(')')?;
  Some((text[..open].trim(), &body[open + 1..]))
}

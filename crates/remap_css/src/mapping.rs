//! Compiles a raw mapping specification into lookup tables.
//!
//! A specification is an ordered JSON object. Keys are either exact
//! declarations (`"color: red"`) or color patterns scoped to a property
//! category (`"$border: red"`, `"$background: $monochrome"`, ...):
//!
//! ```json
//! {
//!   "color: red": "color: blue; text-shadow: none",
//!   "$border: #ccc": "#333",
//!   "$value: $monochrome": "$invert"
//! }
//! ```

use std::collections::HashSet;

use indexmap::IndexMap;
use remap_css_syntax::list;

use crate::color::{is_css_wide_keyword, CanonicalColor};
use crate::declaration::Declaration;
use crate::error::MappingError;
use crate::memo::Caches;

/// Raw mapping specification. Later duplicate keys overwrite earlier ones.
pub type MappingSpec = IndexMap<String, String>;

const MONOCHROME: &str = "$monochrome";
const INVERT: &str = "$invert";

/// Property family a color pattern applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
  Border,
  Background,
  BoxShadow,
  Generic,
}

impl Category {
  /// Classifies a property name. Vendor prefixes are ignored.
  pub fn of_property(property: &str) -> Self {
    let property = property.trim().to_ascii_lowercase();
    let property = strip_vendor_prefix(&property);

    match property {
      "background" | "background-color" | "background-image" => Category::Background,
      "box-shadow" => Category::BoxShadow,
      "border" | "border-color" | "border-image" | "border-image-source" => Category::Border,
      _ => match property.strip_prefix("border-") {
        Some(rest) if is_border_side(rest.strip_suffix("-color").unwrap_or(rest)) => {
          Category::Border
        }
        _ => Category::Generic,
      },
    }
  }

  fn from_prefix(prefix: &str) -> Option<Self> {
    match prefix {
      "border" => Some(Category::Border),
      "background" => Some(Category::Background),
      "box-shadow" => Some(Category::BoxShadow),
      "value" | "color" => Some(Category::Generic),
      _ => None,
    }
  }
}

fn strip_vendor_prefix(property: &str) -> &str {
  if let Some(rest) = property.strip_prefix('-') {
    if let Some(index) = rest.find('-') {
      return &rest[index + 1..];
    }
  }
  property
}

fn is_border_side(side: &str) -> bool {
  matches!(
    side,
    "top"
      | "right"
      | "bottom"
      | "left"
      | "block"
      | "block-start"
      | "block-end"
      | "inline"
      | "inline-start"
      | "inline-end"
  )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorKey {
  Color(CanonicalColor),
  /// Any color whose red, green and blue channels are equal.
  Monochrome,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Replacement {
  Literal(String),
  Invert,
}

impl Replacement {
  /// Replacement text for a matched color.
  pub fn apply(&self, original: CanonicalColor) -> String {
    match self {
      Replacement::Literal(text) => text.clone(),
      Replacement::Invert => original.invert().to_string(),
    }
  }
}

/// Color patterns of one category.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColorTable {
  entries: IndexMap<ColorKey, Replacement>,
}

impl ColorTable {
  pub fn insert(&mut self, key: ColorKey, replacement: Replacement) {
    self.entries.insert(key, replacement);
  }

  pub fn get(&self, key: &ColorKey) -> Option<&Replacement> {
    self.entries.get(key)
  }

  /// An exact color entry wins over the `$monochrome` wildcard.
  pub fn resolve(&self, color: CanonicalColor) -> Option<String> {
    if let Some(replacement) = self.entries.get(&ColorKey::Color(color)) {
      return Some(replacement.apply(color));
    }
    if color.is_monochrome() {
      if let Some(replacement) = self.entries.get(&ColorKey::Monochrome) {
        return Some(replacement.apply(color));
      }
    }
    None
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledMappingTable {
  /// Normalized declaration key to its replacement declarations.
  pub exact: IndexMap<String, Vec<Declaration>>,
  pub color: ColorTable,
  pub border: ColorTable,
  pub background: ColorTable,
  pub box_shadow: ColorTable,
}

impl CompiledMappingTable {
  pub fn table(&self, category: Category) -> &ColorTable {
    match category {
      Category::Border => &self.border,
      Category::Background => &self.background,
      Category::BoxShadow => &self.box_shadow,
      Category::Generic => &self.color,
    }
  }

  fn table_mut(&mut self, category: Category) -> &mut ColorTable {
    match category {
      Category::Border => &mut self.border,
      Category::Background => &mut self.background,
      Category::BoxShadow => &mut self.box_shadow,
      Category::Generic => &mut self.color,
    }
  }

  pub fn exact(&self, key: &str) -> Option<&[Declaration]> {
    self.exact.get(key).map(Vec::as_slice)
  }

  /// Looks a color up in the category table, then in the generic table.
  pub fn resolve_color(&self, category: Category, color: CanonicalColor) -> Option<String> {
    if category != Category::Generic {
      if let Some(replacement) = self.table(category).resolve(color) {
        return Some(replacement);
      }
    }
    self.color.resolve(color)
  }

  pub fn has_color_patterns(&self) -> bool {
    [&self.color, &self.border, &self.background, &self.box_shadow]
      .iter()
      .any(|table| !table.is_empty())
  }

  pub fn is_empty(&self) -> bool {
    self.exact.is_empty() && !self.has_color_patterns()
  }
}

pub fn compile(spec: &MappingSpec) -> Result<CompiledMappingTable, MappingError> {
  compile_with(spec, &Caches::default())
}

pub fn compile_with(
  spec: &MappingSpec,
  caches: &Caches,
) -> Result<CompiledMappingTable, MappingError> {
  let mut table = CompiledMappingTable::default();
  let mut exact_entries = Vec::new();

  for (key, value) in spec {
    let key = key.trim();
    match category_prefix(key) {
      Some((prefix, color)) => {
        let category = Category::from_prefix(prefix).ok_or_else(|| MappingError::UnknownCategory {
          key: key.to_string(),
          category: prefix.to_string(),
        })?;
        let color_key = color_key(key, color, caches)?;
        if let Some(replacement) = replacement(key, value)? {
          table.table_mut(category).insert(color_key, replacement);
        }
      }
      None => {
        let decl = Declaration::parse(key).ok_or_else(|| MappingError::InvalidDeclaration {
          key: key.to_string(),
        })?;
        exact_entries.push((decl, value.trim()));
      }
    }
  }

  let explicit: HashSet<String> = exact_entries
    .iter()
    .map(|(decl, _)| decl.key(caches))
    .collect();

  for (decl, value) in exact_entries {
    if value.is_empty() {
      continue;
    }
    let outputs = list::semicolon(value)
      .iter()
      .map(|part| Declaration::parse(part))
      .collect::<Option<Vec<_>>>()
      .filter(|outputs| !outputs.is_empty())
      .ok_or_else(|| MappingError::InvalidReplacement {
        key: decl.to_string(),
        value: value.to_string(),
      })?;

    if !decl.important {
      let twin = caches.key(&decl.property, &decl.value, true);
      if !explicit.contains(&twin) {
        table.exact.insert(twin, outputs.clone());
      }
    }
    table.exact.insert(decl.key(caches), outputs);
  }

  tracing::debug!(
    exact = table.exact.len(),
    color = table.color.len(),
    border = table.border.len(),
    background = table.background.len(),
    box_shadow = table.box_shadow.len(),
    "compiled mapping table"
  );

  Ok(table)
}

/// Splits `$prefix: color` keys. Returns `None` for exact declaration keys.
fn category_prefix(key: &str) -> Option<(&str, &str)> {
  let rest = key.strip_prefix('$')?;
  match rest.split_once(':') {
    Some((prefix, color)) => Some((prefix.trim(), color.trim())),
    None => Some((rest.trim(), "")),
  }
}

fn color_key(key: &str, color: &str, caches: &Caches) -> Result<ColorKey, MappingError> {
  if color.eq_ignore_ascii_case(MONOCHROME) {
    return Ok(ColorKey::Monochrome);
  }
  if is_css_wide_keyword(color) {
    return Err(MappingError::NotAColor {
      key: key.to_string(),
    });
  }
  caches
    .parse_color(color)
    .map(ColorKey::Color)
    .ok_or_else(|| MappingError::NotAColor {
      key: key.to_string(),
    })
}

fn replacement(key: &str, value: &str) -> Result<Option<Replacement>, MappingError> {
  let value = value.trim();
  if value.is_empty() {
    return Ok(None);
  }
  if value.starts_with('$') {
    if value.eq_ignore_ascii_case(INVERT) {
      return Ok(Some(Replacement::Invert));
    }
    return Err(MappingError::UnsupportedToken {
      key: key.to_string(),
      token: value.to_string(),
    });
  }
  Ok(Some(Replacement::Literal(value.to_string())))
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::color::parse_color;

  fn spec(entries: &[(&str, &str)]) -> MappingSpec {
    entries
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect()
  }

  fn color(text: &str) -> CanonicalColor {
    parse_color(text).unwrap()
  }

  #[test]
  fn classifies_properties() {
    for property in [
      "border",
      "border-top",
      "border-left-color",
      "border-color",
      "border-image",
      "border-inline-start",
      "border-block-end-color",
      "Border-Bottom",
    ] {
      assert_eq!(Category::of_property(property), Category::Border, "{property}");
    }
    assert_eq!(Category::of_property("border-radius"), Category::Generic);
    assert_eq!(Category::of_property("border-top-width"), Category::Generic);
    assert_eq!(Category::of_property("background"), Category::Background);
    assert_eq!(Category::of_property("background-image"), Category::Background);
    assert_eq!(Category::of_property("background-position"), Category::Generic);
    assert_eq!(Category::of_property("-webkit-box-shadow"), Category::BoxShadow);
    assert_eq!(Category::of_property("color"), Category::Generic);
  }

  #[test]
  fn compiles_category_patterns() {
    let table = compile(&spec(&[
      ("$border: red", "yellow"),
      ("$background: #fff", "#000"),
      ("$box-shadow: rgba(0,0,0,.5)", "transparent"),
      ("$value: $monochrome", "$invert"),
      ("$color: blue", "navy"),
    ]))
    .unwrap();

    assert_eq!(
      table.border.get(&ColorKey::Color(color("red"))),
      Some(&Replacement::Literal("yellow".into()))
    );
    assert_eq!(table.background.len(), 1);
    assert_eq!(table.box_shadow.len(), 1);
    assert_eq!(table.color.get(&ColorKey::Monochrome), Some(&Replacement::Invert));
    assert_eq!(table.color.len(), 2);
    assert!(table.exact.is_empty());
  }

  #[test]
  fn category_lookup_falls_back_to_generic() {
    let table = compile(&spec(&[("$border: red", "yellow"), ("$value: red", "green")])).unwrap();
    assert_eq!(
      table.resolve_color(Category::Border, color("red")),
      Some("yellow".to_string())
    );
    assert_eq!(
      table.resolve_color(Category::Background, color("#f00")),
      Some("green".to_string())
    );
    assert_eq!(table.resolve_color(Category::Generic, color("blue")), None);
  }

  #[test]
  fn monochrome_invert() {
    let table = compile(&spec(&[("$value: $monochrome", "$invert")])).unwrap();
    assert_eq!(
      table.resolve_color(Category::Generic, color("#282828ff")),
      Some("#d7d7d7ff".to_string())
    );
    assert_eq!(
      table.resolve_color(Category::Generic, color("rgba(40, 40, 40, .5)")),
      Some("#d7d7d780".to_string())
    );
    assert_eq!(table.resolve_color(Category::Generic, color("red")), None);
  }

  #[test]
  fn exact_color_beats_monochrome() {
    let table = compile(&spec(&[
      ("$value: $monochrome", "$invert"),
      ("$value: #000", "#111"),
    ]))
    .unwrap();
    assert_eq!(
      table.resolve_color(Category::Generic, color("black")),
      Some("#111".to_string())
    );
  }

  #[test]
  fn exact_entries_get_important_twins() {
    let caches = Caches::default();
    let table = compile_with(
      &spec(&[("color: red", "color: blue; background: none")]),
      &caches,
    )
    .unwrap();

    let expected = vec![
      Declaration::new("color", "blue", false),
      Declaration::new("background", "none", false),
    ];
    assert_eq!(table.exact("color: #ff0000ff"), Some(expected.as_slice()));
    assert_eq!(
      table.exact("color: #ff0000ff !important"),
      Some(expected.as_slice())
    );
  }

  #[test]
  fn explicit_important_entry_wins_over_twin() {
    let table = compile(&spec(&[
      ("color: red !important", "color: green"),
      ("color: red", "color: blue"),
    ]))
    .unwrap();
    assert_eq!(
      table.exact("color: #ff0000ff !important"),
      Some([Declaration::new("color", "green", false)].as_slice())
    );
    assert_eq!(
      table.exact("color: #ff0000ff"),
      Some([Declaration::new("color", "blue", false)].as_slice())
    );
  }

  #[test]
  fn empty_values_are_not_registered() {
    let table = compile(&spec(&[("color: red", ""), ("$border: red", "  ")])).unwrap();
    assert!(table.is_empty());
  }

  #[test]
  fn duplicate_color_keys_last_write_wins() {
    let table = compile(&spec(&[("$value: red", "blue"), ("$value: #f00", "green")])).unwrap();
    assert_eq!(
      table.resolve_color(Category::Generic, color("red")),
      Some("green".to_string())
    );
  }

  #[test]
  fn rejects_contract_violations() {
    assert_eq!(
      compile(&spec(&[("$shadow: red", "blue")])),
      Err(MappingError::UnknownCategory {
        key: "$shadow: red".into(),
        category: "shadow".into(),
      })
    );
    assert_eq!(
      compile(&spec(&[("$border: solid", "blue")])),
      Err(MappingError::NotAColor {
        key: "$border: solid".into(),
      })
    );
    assert_eq!(
      compile(&spec(&[("$border: inherit", "blue")])),
      Err(MappingError::NotAColor {
        key: "$border: inherit".into(),
      })
    );
    assert_eq!(
      compile(&spec(&[("$value: red", "$lighten")])),
      Err(MappingError::UnsupportedToken {
        key: "$value: red".into(),
        token: "$lighten".into(),
      })
    );
    assert!(matches!(
      compile(&spec(&[("not a declaration", "color: red")])),
      Err(MappingError::InvalidDeclaration { .. })
    ));
    assert!(matches!(
      compile(&spec(&[("color: red", "blue")])),
      Err(MappingError::InvalidReplacement { .. })
    ));
  }
}

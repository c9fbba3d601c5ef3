use std::fmt;

use remap_css_syntax as syntax;

use crate::memo::Caches;

/// One declaration occurrence, either read from a stylesheet or produced by a
/// mapping.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Declaration {
  pub property: String,
  pub value: String,
  pub important: bool,
  /// Authored value kept verbatim when it carries template placeholders
  /// (`$name`, `var(...)`, `/*[[...]]*/`) that must survive untouched.
  pub original_value: Option<String>,
}

impl Declaration {
  pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
    let value = value.into().trim().to_string();
    let original_value = has_placeholder(&value).then(|| value.clone());
    Self {
      property: property.into().trim().to_string(),
      value,
      important,
      original_value,
    }
  }

  /// Parses `prop: value[ !important]`.
  pub fn parse(text: &str) -> Option<Self> {
    syntax::declaration(text).map(|decl| Self::from(&decl))
  }

  /// The text written to the output stylesheet.
  pub fn output_value(&self) -> &str {
    self.original_value.as_deref().unwrap_or(&self.value)
  }

  /// Comparable key for exact mapping lookups.
  pub fn key(&self, caches: &Caches) -> String {
    caches.key(&self.property, &self.value, self.important)
  }

  pub fn with_value(&self, value: impl Into<String>) -> Self {
    Self::new(self.property.clone(), value, self.important)
  }

  pub fn with_important(mut self, important: bool) -> Self {
    self.important = important;
    self
  }

  pub fn to_syntax(&self) -> syntax::Declaration {
    syntax::Declaration::new(self.property.clone(), self.output_value()).important(self.important)
  }
}

impl From<&syntax::Declaration> for Declaration {
  fn from(value: &syntax::Declaration) -> Self {
    Declaration::new(value.prop.clone(), value.value.clone(), value.important)
  }
}

impl fmt::Display for Declaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.property, self.output_value())?;
    if self.important {
      write!(f, " !important")?;
    }
    Ok(())
  }
}

/// Whether a value contains a template placeholder.
pub fn has_placeholder(value: &str) -> bool {
  if value.contains("/*[[") || value.to_ascii_lowercase().contains("var(") {
    return true;
  }
  value
    .split('$')
    .skip(1)
    .any(|rest| rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '-'))
}

//! Property grammar checks backed by lightningcss.

use lightningcss::properties::custom::CustomPropertyName;
use lightningcss::properties::{Property, PropertyId};
use lightningcss::stylesheet::ParserOptions;

/// Whether `value` is accepted by the grammar of `property`.
///
/// Unknown properties are rejected. Values that lightningcss can only keep
/// as unparsed tokens are rejected too, unless they contain `var()`, whose
/// substitution cannot be checked ahead of time.
pub fn is_valid_declaration(property: &str, value: &str) -> bool {
  let property = property.trim().to_ascii_lowercase();
  let value = value.trim();
  if value.is_empty() {
    return false;
  }

  let id = PropertyId::from(property.as_str());
  let valid = match Property::parse_string(id, value, ParserOptions::default()) {
    Ok(Property::Unparsed(_)) => value.to_ascii_lowercase().contains("var("),
    Ok(Property::Custom(custom)) => !matches!(custom.name, CustomPropertyName::Unknown(_)),
    Ok(_) => true,
    Err(error) => {
      tracing::trace!(%property, value, ?error, "declaration rejected by grammar");
      false
    }
  };
  valid
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_valid_declarations() {
    assert!(is_valid_declaration("color", "red"));
    assert!(is_valid_declaration("Color", "#abcdef80"));
    assert!(is_valid_declaration("border-color", "yellow"));
    assert!(is_valid_declaration("background", "url(a.png) no-repeat #fff"));
    assert!(is_valid_declaration("box-shadow", "0 0 0 1px rgba(0, 0, 0, .5)"));
    assert!(is_valid_declaration("--accent", "anything goes"));
  }

  #[test]
  fn rejects_invalid_declarations() {
    assert!(!is_valid_declaration("color", "1px"));
    assert!(!is_valid_declaration("border-color", "solid"));
    assert!(!is_valid_declaration("colour", "red"));
    assert!(!is_valid_declaration("color", ""));
  }

  #[test]
  fn var_references_are_accepted() {
    assert!(is_valid_declaration("color", "var(--accent)"));
  }
}

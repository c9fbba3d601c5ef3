use std::fmt;

/// Ordered, de-duplicated list of the texts that triggered replacements in
/// one output rule.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProvenanceLabel {
  labels: Vec<String>,
}

impl ProvenanceLabel {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, label: impl Into<String>) {
    let label = label.into();
    if !self.labels.contains(&label) {
      self.labels.push(label);
    }
  }

  pub fn merge(&mut self, other: &ProvenanceLabel) {
    for label in &other.labels {
      self.push(label.clone());
    }
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.labels.iter().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.labels.len()
  }

  pub fn is_empty(&self) -> bool {
    self.labels.is_empty()
  }

  /// Body of the comment emitted before a rule when comments are enabled.
  pub fn comment_text(&self) -> String {
    format!("remap-css rule for {self}")
  }
}

impl<S: Into<String>> FromIterator<S> for ProvenanceLabel {
  fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
    let mut label = ProvenanceLabel::new();
    for item in iter {
      label.push(item);
    }
    label
  }
}

impl fmt::Display for ProvenanceLabel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (index, label) in self.labels.iter().enumerate() {
      if index > 0 {
        write!(f, ", ")?;
      }
      // The text ends up inside a comment, so it must not close it early.
      let escaped = label.replace('"', "\\\"").replace("*/", "* /");
      write!(f, "\"{escaped}\"")?;
    }
    Ok(())
  }
}

//! Decides, for each declaration, whether and how it is replaced.
//!
//! Exact declaration mappings are consulted first. Otherwise every color in
//! the value is looked up in the table for the property's category and then
//! in the generic table. Shorthands are split so only the longhands that
//! actually changed are emitted.

use remap_css_syntax::value_parser::{self, stringify_node, Node};

use crate::color::COLOR_FUNCTION_REGEX;
use crate::declaration::Declaration;
use crate::mapping::{Category, CompiledMappingTable};
use crate::memo::Caches;
use crate::provenance::ProvenanceLabel;
use crate::shorthand::{expand_shorthand, is_shorthand_property};
use crate::validate::is_valid_declaration;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionState {
  #[default]
  Unseen,
  ExactReplaced,
  ColorReplaced,
  UnmatchedKept,
  UnmatchedDropped,
}

impl ResolutionState {
  pub fn is_replaced(self) -> bool {
    matches!(
      self,
      ResolutionState::ExactReplaced | ResolutionState::ColorReplaced
    )
  }
}

/// Outcome for one declaration occurrence.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Resolution {
  pub state: ResolutionState,
  pub declarations: Vec<Declaration>,
  pub labels: ProvenanceLabel,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveOptions {
  /// Keep declarations no mapping applies to.
  pub keep: bool,
  /// Drop outputs rejected by the property grammar.
  pub validate: bool,
}

pub struct Resolver<'a> {
  table: &'a CompiledMappingTable,
  caches: &'a Caches,
  options: ResolveOptions,
}

impl<'a> Resolver<'a> {
  pub fn new(table: &'a CompiledMappingTable, caches: &'a Caches, options: ResolveOptions) -> Self {
    Self {
      table,
      caches,
      options,
    }
  }

  pub fn resolve(&self, decl: &Declaration) -> Resolution {
    if let Some(resolution) = self.resolve_exact(decl) {
      return resolution;
    }
    if let Some(resolution) = self.resolve_colors(decl) {
      return resolution;
    }

    if self.options.keep {
      Resolution {
        state: ResolutionState::UnmatchedKept,
        declarations: vec![decl.clone()],
        labels: ProvenanceLabel::new(),
      }
    } else {
      Resolution {
        state: ResolutionState::UnmatchedDropped,
        declarations: Vec::new(),
        labels: ProvenanceLabel::new(),
      }
    }
  }

  fn resolve_exact(&self, decl: &Declaration) -> Option<Resolution> {
    let outputs = self.table.exact(&decl.key(self.caches))?;
    let declarations = outputs
      .iter()
      .map(|output| output.clone().with_important(decl.important || output.important))
      .filter(|output| self.accepts(output))
      .collect();

    Some(Resolution {
      state: ResolutionState::ExactReplaced,
      declarations,
      labels: [decl.to_string()].into_iter().collect(),
    })
  }

  fn resolve_colors(&self, decl: &Declaration) -> Option<Resolution> {
    if !self.table.has_color_patterns() {
      return None;
    }

    let category = Category::of_property(&decl.property);
    let substituted = self.substitute(category, &decl.value)?;
    let mut labels = ProvenanceLabel::new();
    for fragment in &substituted.fragments {
      labels.push(fragment.clone());
    }

    let declarations = match self.expand(decl, category) {
      Some(longhands) => longhands,
      None => vec![decl.with_value(substituted.value)],
    };
    let declarations = declarations
      .into_iter()
      .filter(|output| self.accepts(output))
      .collect();

    Some(Resolution {
      state: ResolutionState::ColorReplaced,
      declarations,
      labels,
    })
  }

  /// Longhands of a shorthand whose value changed after substitution.
  fn expand(&self, decl: &Declaration, category: Category) -> Option<Vec<Declaration>> {
    if !is_shorthand_property(&decl.property) {
      return None;
    }

    let longhands = match expand_shorthand(&decl.property, &decl.value) {
      Ok(longhands) => longhands,
      Err(error) => {
        tracing::debug!(declaration = %decl, %error, "replacing colors in place");
        return None;
      }
    };

    let changed: Vec<Declaration> = longhands
      .into_iter()
      .filter_map(|(property, value)| {
        let substituted = self.substitute(category, &value)?;
        Some(Declaration::new(property, substituted.value, decl.important))
      })
      .collect();

    (!changed.is_empty()).then_some(changed)
  }

  /// Replaces every mapped color in `value`. Returns `None` when nothing
  /// matched.
  pub fn substitute(&self, category: Category, value: &str) -> Option<Substitution> {
    let mut parsed = value_parser::parse(value);
    let mut fragments = Vec::new();

    parsed.walk(&mut |node| {
      let (candidate, descend) = match &*node {
        Node::Word { value } => (self.caches.is_color(value).then(|| value.clone()), true),
        Node::Function { value, .. } if COLOR_FUNCTION_REGEX.is_match(value) => {
          (Some(stringify_node(node)), false)
        }
        _ => (None, true),
      };

      if let Some(text) = candidate {
        let replacement = self
          .caches
          .parse_color(&text)
          .and_then(|color| self.table.resolve_color(category, color));
        if let Some(replacement) = replacement {
          *node = Node::word(replacement);
          fragments.push(text);
        }
      }
      descend
    });

    if fragments.is_empty() {
      return None;
    }
    Some(Substitution {
      value: parsed.to_css(),
      fragments,
    })
  }

  fn accepts(&self, decl: &Declaration) -> bool {
    if !self.options.validate || is_valid_declaration(&decl.property, decl.output_value()) {
      return true;
    }
    tracing::debug!(declaration = %decl, "dropping declaration rejected by validation");
    false
  }
}

/// A value with its colors replaced, plus the original color texts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Substitution {
  pub value: String,
  pub fragments: Vec<String>,
}

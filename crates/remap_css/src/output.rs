//! The tree produced for each source before it is formatted.

use remap_css_syntax as syntax;

use crate::declaration::Declaration;
use crate::provenance::ProvenanceLabel;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedDeclaration {
  pub declaration: Declaration,
  /// Produced by a mapping rather than kept from the input.
  pub replaced: bool,
}

impl ResolvedDeclaration {
  pub fn replaced(declaration: Declaration) -> Self {
    Self {
      declaration,
      replaced: true,
    }
  }

  pub fn kept(declaration: Declaration) -> Self {
    Self {
      declaration,
      replaced: false,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputRule {
  pub selector: String,
  pub declarations: Vec<ResolvedDeclaration>,
  pub labels: ProvenanceLabel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputAtRule {
  pub name: String,
  pub params: String,
  pub nodes: Vec<OutputNode>,
  /// Provenance of the declarations placed directly in this at-rule.
  pub labels: ProvenanceLabel,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputNode {
  Rule(OutputRule),
  AtRule(OutputAtRule),
  /// A declaration placed directly inside an at-rule, as in `@font-face`.
  Declaration(ResolvedDeclaration),
}

impl OutputNode {
  /// Every provenance label of this node and its descendants, in order.
  pub fn labels(&self) -> Vec<&ProvenanceLabel> {
    let mut labels = Vec::new();
    collect_labels(self, &mut labels);
    labels
  }

  /// Puts the labels of `earlier`, an identical node, in front of this
  /// node's labels.
  pub fn prepend_labels_from(&mut self, earlier: &OutputNode) {
    match (self, earlier) {
      (OutputNode::Rule(rule), OutputNode::Rule(earlier)) => {
        let mut labels = earlier.labels.clone();
        labels.merge(&rule.labels);
        rule.labels = labels;
      }
      (OutputNode::AtRule(at_rule), OutputNode::AtRule(earlier)) => {
        let mut labels = earlier.labels.clone();
        labels.merge(&at_rule.labels);
        at_rule.labels = labels;
        for (child, earlier) in at_rule.nodes.iter_mut().zip(&earlier.nodes) {
          child.prepend_labels_from(earlier);
        }
      }
      _ => {}
    }
  }

  /// The node as syntax, without provenance comments.
  pub fn to_syntax(&self) -> syntax::Node {
    to_syntax_node(self, false)
  }
}

fn collect_labels<'a>(node: &'a OutputNode, labels: &mut Vec<&'a ProvenanceLabel>) {
  match node {
    OutputNode::Rule(rule) => labels.push(&rule.labels),
    OutputNode::AtRule(at_rule) => {
      if !at_rule.labels.is_empty() {
        labels.push(&at_rule.labels);
      }
      for child in &at_rule.nodes {
        collect_labels(child, labels);
      }
    }
    OutputNode::Declaration(_) => {}
  }
}

/// Builds the syntax tree to format. With `comments`, every labelled rule is
/// preceded by a provenance comment, and an at-rule with labelled
/// declarations opens with one.
pub fn to_syntax_root(nodes: &[OutputNode], comments: bool) -> syntax::Root {
  let mut root = syntax::Root::new();
  append_nodes(nodes, comments, &mut root.nodes);
  root
}

fn append_nodes(nodes: &[OutputNode], comments: bool, out: &mut Vec<syntax::Node>) {
  for node in nodes {
    if let OutputNode::Rule(rule) = node {
      if comments && !rule.labels.is_empty() {
        out.push(syntax::Comment::new(rule.labels.comment_text()).into());
      }
    }
    out.push(to_syntax_node(node, comments));
  }
}

fn to_syntax_node(node: &OutputNode, comments: bool) -> syntax::Node {
  match node {
    OutputNode::Rule(rule) => {
      let mut out = syntax::Rule::new(rule.selector.clone());
      for decl in &rule.declarations {
        out.append(decl.declaration.to_syntax());
      }
      out.into()
    }
    OutputNode::AtRule(at_rule) => {
      let mut children = Vec::new();
      if comments && !at_rule.labels.is_empty() {
        children.push(syntax::Comment::new(at_rule.labels.comment_text()).into());
      }
      append_nodes(&at_rule.nodes, comments, &mut children);
      syntax::AtRule {
        name: at_rule.name.clone(),
        params: at_rule.params.clone(),
        nodes: Some(children),
      }
      .into()
    }
    OutputNode::Declaration(decl) => decl.declaration.to_syntax().into(),
  }
}

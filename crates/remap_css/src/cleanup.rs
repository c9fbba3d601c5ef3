//! Per-source tree cleanup, run depth-first after resolution.

use std::collections::HashSet;

use crate::output::{OutputNode, OutputRule, ResolvedDeclaration};

/// Prunes a source's output tree.
///
/// - unreplaced declarations directly inside at-rules are dropped unless
///   `keep` is set
/// - among unreplaced declarations of one property only the last survives
/// - rules without a replaced declaration and at-rules left empty are removed
/// - consecutive rules with the same selector list are merged
pub fn cleanup(nodes: Vec<OutputNode>, keep: bool) -> Vec<OutputNode> {
  let nodes: Vec<OutputNode> = nodes
    .into_iter()
    .filter_map(|node| prune(node, keep))
    .collect();
  merge_adjacent_rules(nodes)
}

fn prune(node: OutputNode, keep: bool) -> Option<OutputNode> {
  match node {
    OutputNode::Rule(mut rule) => {
      discard_duplicate_kept(&mut rule.declarations);
      let replaced = rule.declarations.iter().any(|decl| decl.replaced);
      replaced.then_some(OutputNode::Rule(rule))
    }
    OutputNode::AtRule(mut at_rule) => {
      let nodes: Vec<OutputNode> = at_rule
        .nodes
        .into_iter()
        .filter(|node| match node {
          OutputNode::Declaration(decl) => keep || decl.replaced,
          _ => true,
        })
        .collect();
      let mut nodes = cleanup(nodes, keep);
      discard_duplicate_kept_nodes(&mut nodes);

      // Kept declarations alone do not hold an at-rule open.
      let alive = nodes.iter().any(|node| match node {
        OutputNode::Declaration(decl) => decl.replaced,
        _ => true,
      });
      if !alive {
        return None;
      }
      at_rule.nodes = nodes;
      Some(OutputNode::AtRule(at_rule))
    }
    OutputNode::Declaration(decl) => Some(OutputNode::Declaration(decl)),
  }
}

/// Keeps only the last unreplaced declaration per property. Replaced
/// declarations are never touched.
fn discard_duplicate_kept(declarations: &mut Vec<ResolvedDeclaration>) {
  let mut retain_mask = vec![true; declarations.len()];
  let mut seen = HashSet::new();

  for (index, decl) in declarations.iter().enumerate().rev() {
    if !decl.replaced && !seen.insert(decl.declaration.property.to_ascii_lowercase()) {
      retain_mask[index] = false;
    }
  }

  let mut cursor = 0usize;
  declarations.retain(|_| {
    let keep = retain_mask[cursor];
    cursor += 1;
    keep
  });
}

fn discard_duplicate_kept_nodes(nodes: &mut Vec<OutputNode>) {
  let mut retain_mask = vec![true; nodes.len()];
  let mut seen = HashSet::new();

  for (index, node) in nodes.iter().enumerate().rev() {
    if let OutputNode::Declaration(decl) = node {
      if !decl.replaced && !seen.insert(decl.declaration.property.to_ascii_lowercase()) {
        retain_mask[index] = false;
      }
    }
  }

  let mut cursor = 0usize;
  nodes.retain(|_| {
    let keep = retain_mask[cursor];
    cursor += 1;
    keep
  });
}

fn merge_adjacent_rules(nodes: Vec<OutputNode>) -> Vec<OutputNode> {
  let mut merged: Vec<OutputNode> = Vec::with_capacity(nodes.len());

  for node in nodes {
    if let (Some(OutputNode::Rule(previous)), OutputNode::Rule(rule)) = (merged.last_mut(), &node) {
      if previous.selector == rule.selector {
        absorb(previous, rule);
        continue;
      }
    }
    merged.push(node);
  }

  merged
}

fn absorb(target: &mut OutputRule, rule: &OutputRule) {
  target.declarations.extend(rule.declarations.iter().cloned());
  target.labels.merge(&rule.labels);
  discard_duplicate_kept(&mut target.declarations);
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::declaration::Declaration;
  use crate::output::OutputAtRule;
  use crate::provenance::ProvenanceLabel;

  fn replaced(property: &str, value: &str) -> ResolvedDeclaration {
    ResolvedDeclaration::replaced(Declaration::new(property, value, false))
  }

  fn kept(property: &str, value: &str) -> ResolvedDeclaration {
    ResolvedDeclaration::kept(Declaration::new(property, value, false))
  }

  fn rule(selector: &str, declarations: Vec<ResolvedDeclaration>, label: &str) -> OutputNode {
    OutputNode::Rule(OutputRule {
      selector: selector.into(),
      declarations,
      labels: [label].into_iter().collect(),
    })
  }

  fn at_rule(name: &str, nodes: Vec<OutputNode>) -> OutputNode {
    OutputNode::AtRule(OutputAtRule {
      name: name.into(),
      params: String::new(),
      nodes,
      labels: ProvenanceLabel::new(),
    })
  }

  #[test]
  fn drops_rules_without_replacements() {
    let nodes = cleanup(
      vec![
        rule("a", vec![kept("margin", "0")], "x"),
        rule("b", vec![kept("margin", "0"), replaced("color", "blue")], "y"),
      ],
      true,
    );
    assert_eq!(
      nodes,
      vec![rule("b", vec![kept("margin", "0"), replaced("color", "blue")], "y")]
    );
  }

  #[test]
  fn keeps_last_kept_declaration_per_property() {
    let nodes = cleanup(
      vec![rule(
        "a",
        vec![
          kept("margin", "0"),
          replaced("color", "blue"),
          replaced("color", "navy"),
          kept("Margin", "1px"),
        ],
        "x",
      )],
      true,
    );
    assert_eq!(
      nodes,
      vec![rule(
        "a",
        vec![
          replaced("color", "blue"),
          replaced("color", "navy"),
          kept("Margin", "1px"),
        ],
        "x",
      )]
    );
  }

  #[test]
  fn removes_empty_at_rules_depth_first() {
    let nodes = cleanup(
      vec![
        at_rule("media", vec![at_rule("supports", vec![rule("a", vec![kept("margin", "0")], "x")])]),
        at_rule("font-face", vec![OutputNode::Declaration(kept("font-family", "x"))]),
      ],
      true,
    );
    assert!(nodes.is_empty());
  }

  #[test]
  fn at_rule_declarations_need_keep() {
    let input = vec![at_rule(
      "font-face",
      vec![
        OutputNode::Declaration(kept("font-family", "x")),
        OutputNode::Declaration(replaced("color", "blue")),
      ],
    )];

    let dropped = cleanup(input.clone(), false);
    assert_eq!(
      dropped,
      vec![at_rule("font-face", vec![OutputNode::Declaration(replaced("color", "blue"))])]
    );

    let kept_nodes = cleanup(input.clone(), true);
    assert_eq!(kept_nodes, input);
  }

  #[test]
  fn merges_adjacent_rules_with_same_selector() {
    let nodes = cleanup(
      vec![
        rule("a", vec![replaced("color", "blue")], "color: red"),
        rule("a", vec![replaced("background", "white")], "background: black"),
        rule("b", vec![replaced("color", "blue")], "color: red"),
        rule("a", vec![replaced("color", "blue")], "color: red"),
      ],
      false,
    );

    let mut labels = ProvenanceLabel::new();
    labels.push("color: red");
    labels.push("background: black");
    assert_eq!(
      nodes,
      vec![
        OutputNode::Rule(OutputRule {
          selector: "a".into(),
          declarations: vec![replaced("color", "blue"), replaced("background", "white")],
          labels,
        }),
        rule("b", vec![replaced("color", "blue")], "color: red"),
        rule("a", vec![replaced("color", "blue")], "color: red"),
      ]
    );
  }
}

//! The `remap` entry point.
//!
//! Each source is parsed, resolved against the compiled table, scoped and
//! cleaned up on its own rayon task. The per-source trees are then joined in
//! source order, de-duplicated across sources and formatted.

use std::collections::HashMap;

use rayon::prelude::*;
use regex::Regex;
use remap_css_syntax::{self as syntax, FormatOptions};
use serde::Deserialize;

use crate::cleanup::cleanup;
use crate::declaration::Declaration;
use crate::error::{RemapError, RemapResult};
use crate::mapping::{compile_with, MappingSpec};
use crate::media::{self, DeviceProfile};
use crate::memo::Caches;
use crate::output::{to_syntax_root, OutputAtRule, OutputNode, OutputRule, ResolvedDeclaration};
use crate::provenance::ProvenanceLabel;
use crate::resolve::{ResolutionState, ResolveOptions, Resolver};
use crate::selector::SelectorRewriter;

/// One input stylesheet.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Source {
  pub css: String,
  /// Selector prepended to every selector of this source.
  pub prefix: Option<String>,
  /// Selectors that are left unprefixed.
  #[serde(rename = "match")]
  pub match_selectors: Vec<String>,
  /// Shown in logs.
  pub name: Option<String>,
}

impl Source {
  pub fn new(css: impl Into<String>) -> Self {
    Self {
      css: css.into(),
      ..Default::default()
    }
  }

  pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
    self.prefix = Some(prefix.into());
    self
  }

  pub fn with_match(mut self, selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
    self.match_selectors = selectors.into_iter().map(Into::into).collect();
    self
  }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RemapOptions {
  /// Regular expressions matched against prefixed selectors. Matching
  /// selectors are dropped.
  pub ignore_selectors: Vec<String>,
  pub stylistic: bool,
  /// Drop outputs the property grammar rejects.
  pub validate: bool,
  /// Keep declarations no mapping applies to.
  pub keep: bool,
  /// Emit a provenance comment before every rule.
  pub comments: bool,
  pub indent: usize,
  pub line_length: usize,
  /// When set, `@media` blocks that do not apply to this device are removed.
  pub device: Option<DeviceProfile>,
}

impl Default for RemapOptions {
  fn default() -> Self {
    let format = FormatOptions::default();
    Self {
      ignore_selectors: Vec::new(),
      stylistic: false,
      validate: false,
      keep: false,
      comments: false,
      indent: format.indent,
      line_length: format.line_length,
      device: None,
    }
  }
}

impl RemapOptions {
  fn format_options(&self) -> FormatOptions {
    FormatOptions {
      stylistic: self.stylistic,
      indent: self.indent,
      line_length: self.line_length,
    }
  }

  fn resolve_options(&self) -> ResolveOptions {
    ResolveOptions {
      keep: self.keep,
      validate: self.validate,
    }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemapOutput {
  pub css: String,
  /// Provenance of every emitted rule, and of every at-rule with replaced
  /// declarations of its own, in output order.
  pub labels: Vec<ProvenanceLabel>,
}

pub fn remap(sources: &[Source], spec: &MappingSpec, options: &RemapOptions) -> RemapResult<RemapOutput> {
  remap_with_caches(sources, spec, options, &Caches::new())
}

/// Like [`remap`], reusing memoized colors and keys across calls.
pub fn remap_with_caches(
  sources: &[Source],
  spec: &MappingSpec,
  options: &RemapOptions,
  caches: &Caches,
) -> RemapResult<RemapOutput> {
  let ignore = options
    .ignore_selectors
    .iter()
    .map(|pattern| {
      Regex::new(pattern).map_err(|source| RemapError::IgnorePattern {
        pattern: pattern.clone(),
        source,
      })
    })
    .collect::<Result<Vec<_>, _>>()?;

  let table = compile_with(spec, caches)?;

  let per_source: Vec<Vec<OutputNode>> = sources
    .par_iter()
    .enumerate()
    .map(|(index, source)| {
      let name = source.name.as_deref().unwrap_or("");
      let _span = tracing::debug_span!("remap_source", index, name).entered();
      let context = SourceContext {
        resolver: Resolver::new(&table, caches, options.resolve_options()),
        selectors: SelectorRewriter::new(source.prefix.as_deref(), &source.match_selectors, &ignore),
        device: options.device.as_ref(),
        keep: options.keep,
      };
      let nodes = context.process(&source.css);
      tracing::debug!(nodes = nodes.len(), "source remapped");
      nodes
    })
    .collect();

  let nodes = discard_duplicate_nodes(per_source.into_iter().flatten().collect());

  let labels = nodes
    .iter()
    .flat_map(|node| node.labels().into_iter().cloned())
    .collect();
  let root = to_syntax_root(&nodes, options.comments);
  let css = syntax::stringify(&root, &options.format_options());

  Ok(RemapOutput { css, labels })
}

struct SourceContext<'a> {
  resolver: Resolver<'a>,
  selectors: SelectorRewriter<'a>,
  device: Option<&'a DeviceProfile>,
  keep: bool,
}

impl SourceContext<'_> {
  fn process(&self, css: &str) -> Vec<OutputNode> {
    let root = syntax::parse(css);
    // Root level declarations have no selector to attach to.
    let (nodes, _) = self.build(&root.nodes, false);
    let nodes = nodes
      .into_iter()
      .filter(|node| !matches!(node, OutputNode::Declaration(_)))
      .collect();
    cleanup(nodes, self.keep)
  }

  /// Builds the output for a block's children. The labels are those of the
  /// declarations placed directly in the block.
  fn build(&self, nodes: &[syntax::Node], in_keyframes: bool) -> (Vec<OutputNode>, ProvenanceLabel) {
    let mut out = Vec::new();
    let mut labels = ProvenanceLabel::new();
    for node in nodes {
      match node {
        syntax::Node::Rule(rule) => {
          if let Some(rule) = self.build_rule(rule, in_keyframes) {
            out.push(OutputNode::Rule(rule));
          }
        }
        syntax::Node::AtRule(at_rule) => {
          if let Some(at_rule) = self.build_at_rule(at_rule, in_keyframes) {
            out.push(OutputNode::AtRule(at_rule));
          }
        }
        // Declarations directly inside at-rules, as in `@font-face`.
        syntax::Node::Declaration(decl) => {
          let (declarations, decl_labels) = self.resolve(decl);
          out.extend(declarations.into_iter().map(OutputNode::Declaration));
          labels.merge(&decl_labels);
        }
        syntax::Node::Comment(_) => {}
      }
    }
    (out, labels)
  }

  fn build_rule(&self, rule: &syntax::Rule, in_keyframes: bool) -> Option<OutputRule> {
    let mut declarations = Vec::new();
    let mut labels = ProvenanceLabel::new();
    for decl in rule.declarations() {
      let (resolved, decl_labels) = self.resolve(decl);
      declarations.extend(resolved);
      labels.merge(&decl_labels);
    }

    if !declarations.iter().any(|decl| decl.replaced) {
      return None;
    }

    let selector = self.selectors.rewrite(&rule.selector, in_keyframes)?;
    Some(OutputRule {
      selector,
      declarations,
      labels,
    })
  }

  fn build_at_rule(&self, at_rule: &syntax::AtRule, in_keyframes: bool) -> Option<OutputAtRule> {
    // Statement at-rules such as `@import` carry nothing to remap.
    let children = at_rule.nodes.as_ref()?;
    let name = at_rule.unprefixed_name();

    if name == "media" {
      if let Some(device) = self.device {
        if !media::matches(&at_rule.params, device) {
          tracing::trace!(query = %at_rule.params, "skipping @media block for device");
          return None;
        }
      }
    }

    let (nodes, labels) = self.build(children, in_keyframes || name == "keyframes");
    Some(OutputAtRule {
      name: at_rule.name.clone(),
      params: at_rule.params.clone(),
      nodes,
      labels,
    })
  }

  fn resolve(&self, decl: &syntax::Declaration) -> (Vec<ResolvedDeclaration>, ProvenanceLabel) {
    let resolution = self.resolver.resolve(&Declaration::from(decl));
    let wrap: fn(Declaration) -> ResolvedDeclaration = match resolution.state {
      ResolutionState::ExactReplaced | ResolutionState::ColorReplaced => ResolvedDeclaration::replaced,
      _ => ResolvedDeclaration::kept,
    };
    let declarations = resolution.declarations.into_iter().map(wrap).collect();
    (declarations, resolution.labels)
  }
}

/// Keeps the last of identical top-level nodes. Labels of the dropped copies
/// move to the survivor.
fn discard_duplicate_nodes(nodes: Vec<OutputNode>) -> Vec<OutputNode> {
  let format = FormatOptions::default();
  let keys: Vec<String> = nodes
    .iter()
    .map(|node| {
      let root = syntax::Root {
        nodes: vec![node.to_syntax()],
      };
      syntax::stringify(&root, &format)
    })
    .collect();

  let mut survivors: HashMap<&str, usize> = HashMap::new();
  let mut retain_mask = vec![true; nodes.len()];
  let mut moved_labels: Vec<(usize, usize)> = Vec::new();

  for (index, key) in keys.iter().enumerate().rev() {
    match survivors.get(key.as_str()) {
      Some(&survivor) => {
        retain_mask[index] = false;
        moved_labels.push((index, survivor));
      }
      None => {
        survivors.insert(key.as_str(), index);
      }
    }
  }

  if moved_labels.is_empty() {
    return nodes;
  }

  // Copies are visited last to first, each prepending its labels, so the
  // survivor ends up with labels in input order.
  let mut nodes = nodes;
  for (from, to) in moved_labels {
    let earlier = nodes[from].clone();
    nodes[to].prepend_labels_from(&earlier);
  }

  nodes
    .into_iter()
    .zip(retain_mask)
    .filter_map(|(node, keep)| keep.then_some(node))
    .collect()
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn spec(entries: &[(&str, &str)]) -> MappingSpec {
    entries
      .iter()
      .map(|(key, value)| (key.to_string(), value.to_string()))
      .collect()
  }

  fn run(sources: &[Source], entries: &[(&str, &str)], options: &RemapOptions) -> String {
    remap(sources, &spec(entries), options).unwrap().css
  }

  #[test]
  fn exact_mapping_rewrites_rule() {
    let css = run(
      &[Source::new("a{color:red}")],
      &[("color: red", "color: blue")],
      &RemapOptions::default(),
    );
    assert_eq!(css, "a {color: blue}\n");
  }

  #[test]
  fn border_category_applies_to_longhands() {
    let css = run(
      &[Source::new("a{border-left-color:red}")],
      &[("$border: red", "blue")],
      &RemapOptions::default(),
    );
    assert_eq!(css, "a {border-left-color: blue}\n");
  }

  #[test]
  fn unmatched_rules_disappear_unless_kept() {
    let sources = [Source::new("a{margin:0;color:red} b{margin:0}")];
    let entries = [("$value: red", "blue")];

    let css = run(&sources, &entries, &RemapOptions::default());
    assert_eq!(css, "a {color: blue}\n");

    let options = RemapOptions {
      keep: true,
      ..Default::default()
    };
    let css = run(&sources, &entries, &options);
    assert_eq!(css, "a {margin: 0; color: blue}\n");
  }

  #[test]
  fn prefixes_per_source() {
    let css = run(
      &[
        Source::new("a{color:red}").with_prefix(".dark"),
        Source::new("html b{color:red}").with_prefix("html.dark"),
      ],
      &[("$value: red", "blue")],
      &RemapOptions::default(),
    );
    assert_eq!(css, ".dark a {color: blue}\nhtml.dark b {color: blue}\n");
  }

  #[test]
  fn keyframes_are_not_prefixed() {
    let css = run(
      &[Source::new("@keyframes pulse{from{color:red}to{color:white}}").with_prefix(".dark")],
      &[("$value: red", "blue")],
      &RemapOptions::default(),
    );
    assert_eq!(css, "@keyframes pulse {\nfrom {color: blue}\n}\n");
  }

  #[test]
  fn removes_empty_at_rules() {
    let css = run(
      &[Source::new("@media print{a{margin:0}} @media screen{a{color:red}} @import 'x.css';")],
      &[("$value: red", "blue")],
      &RemapOptions::default(),
    );
    assert_eq!(css, "@media screen {\na {color: blue}\n}\n");
  }

  #[test]
  fn device_filters_media_blocks() {
    let options = RemapOptions {
      device: Some(DeviceProfile::default()),
      ..Default::default()
    };
    let css = run(
      &[Source::new(
        "@media (max-width: 600px){a{color:red}} @media (min-width: 600px){b{color:red}}",
      )],
      &[("$value: red", "blue")],
      &options,
    );
    assert_eq!(css, "@media (min-width: 600px) {\nb {color: blue}\n}\n");
  }

  #[test]
  fn ignore_patterns_drop_selectors() {
    let options = RemapOptions {
      ignore_selectors: vec![r"\.ads?\b".into()],
      ..Default::default()
    };
    let css = run(
      &[Source::new(".ad, a{color:red} .ads{color:red}")],
      &[("$value: red", "blue")],
      &options,
    );
    assert_eq!(css, "a {color: blue}\n");
  }

  #[test]
  fn invalid_ignore_pattern_is_an_error() {
    let options = RemapOptions {
      ignore_selectors: vec!["(".into()],
      ..Default::default()
    };
    let error = remap(&[Source::new("a{color:red}")], &spec(&[]), &options).unwrap_err();
    assert!(matches!(error, RemapError::IgnorePattern { ref pattern, .. } if pattern == "("));
  }

  #[test]
  fn mapping_errors_surface() {
    let error = remap(
      &[Source::new("a{color:red}")],
      &spec(&[("$font: red", "blue")]),
      &RemapOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(error, RemapError::Mapping(_)));
  }

  #[test]
  fn identical_nodes_across_sources_keep_last() {
    let output = remap(
      &[
        Source::new("a{color:red}"),
        Source::new("b{color:white}"),
        Source::new("a{color:#f00}"),
      ],
      &spec(&[("$value: red", "blue"), ("$value: white", "black")]),
      &RemapOptions::default(),
    )
    .unwrap();
    assert_eq!(output.css, "b {color: black}\na {color: blue}\n");

    let labels: Vec<Vec<&str>> = output.labels.iter().map(|label| label.iter().collect()).collect();
    assert_eq!(labels, vec![vec!["white"], vec!["red", "#f00"]]);
  }

  #[test]
  fn consecutive_rules_with_same_selector_merge() {
    let css = run(
      &[Source::new("a{color:red} a{background:white}")],
      &[("$value: red", "blue"), ("$background: white", "black")],
      &RemapOptions::default(),
    );
    assert_eq!(css, "a {color: blue; background-color: black}\n");
  }

  #[test]
  fn comments_and_stylistic_output() {
    let options = RemapOptions {
      comments: true,
      stylistic: true,
      ..Default::default()
    };
    let css = run(
      &[Source::new("a{color:red}")],
      &[("color: red", "color: blue")],
      &options,
    );
    assert_eq!(
      css,
      "/* remap-css rule for \"color: red\" */\na {\n  color: blue;\n}\n"
    );
  }

  #[test]
  fn at_rule_declarations_are_labelled() {
    let options = RemapOptions {
      comments: true,
      ..Default::default()
    };
    let output = remap(
      &[Source::new("@font-face{font-family:x;color:red}")],
      &spec(&[("$value: red", "blue")]),
      &options,
    )
    .unwrap();

    assert_eq!(
      output.css,
      "@font-face {\n/* remap-css rule for \"red\" */\ncolor: blue;\n}\n"
    );
    let labels: Vec<Vec<&str>> = output.labels.iter().map(|label| label.iter().collect()).collect();
    assert_eq!(labels, vec![vec!["red"]]);
  }

  #[test]
  fn options_deserialize_from_json() {
    let options: RemapOptions = serde_json::from_str(
      r#"{"ignoreSelectors": ["^x"], "lineLength": 40, "device": {"type": "print"}}"#,
    )
    .unwrap();
    assert_eq!(options.ignore_selectors, vec!["^x".to_string()]);
    assert_eq!(options.line_length, 40);
    assert_eq!(options.indent, 2);
    assert_eq!(options.device.unwrap().media_type, "print");

    let source: Source =
      serde_json::from_str(r#"{"css": "a{}", "prefix": ".d", "match": ["body"]}"#).unwrap();
    assert_eq!(source.match_selectors, vec!["body".to_string()]);
  }
}

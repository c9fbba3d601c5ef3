use std::fmt;

/// Top level container produced by [`crate::parse`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Root {
  pub nodes: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
  Rule(Rule),
  AtRule(AtRule),
  Declaration(Declaration),
  Comment(Comment),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rule {
  pub selector: String,
  pub nodes: Vec<Node>,
}

/// An at-rule. `nodes` is `None` for statement at-rules such as `@import`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AtRule {
  pub name: String,
  pub params: String,
  pub nodes: Option<Vec<Node>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Declaration {
  pub prop: String,
  pub value: String,
  pub important: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Comment {
  pub text: String,
}

impl Root {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn append(&mut self, node: impl Into<Node>) {
    self.nodes.push(node.into());
  }

  /// Visits every declaration depth-first together with the chain of at-rule
  /// names enclosing it.
  pub fn walk_decls<F>(&self, mut callback: F)
  where
    F: FnMut(&Declaration, &[&str]),
  {
    let mut at_rules = Vec::new();
    walk_decls_in(&self.nodes, &mut at_rules, &mut callback);
  }
}

fn walk_decls_in<'a, F>(nodes: &'a [Node], at_rules: &mut Vec<&'a str>, callback: &mut F)
where
  F: FnMut(&Declaration, &[&str]),
{
  for node in nodes {
    match node {
      Node::Declaration(decl) => callback(decl, at_rules),
      Node::Rule(rule) => walk_decls_in(&rule.nodes, at_rules, callback),
      Node::AtRule(at_rule) => {
        if let Some(children) = &at_rule.nodes {
          at_rules.push(at_rule.name.as_str());
          walk_decls_in(children, at_rules, callback);
          at_rules.pop();
        }
      }
      Node::Comment(_) => {}
    }
  }
}

impl Rule {
  pub fn new(selector: impl Into<String>) -> Self {
    Self {
      selector: selector.into(),
      nodes: Vec::new(),
    }
  }

  pub fn append(&mut self, node: impl Into<Node>) {
    self.nodes.push(node.into());
  }

  pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
    self.nodes.iter().filter_map(Node::as_declaration)
  }
}

impl AtRule {
  pub fn new(name: impl Into<String>, params: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      params: params.into(),
      nodes: None,
    }
  }

  pub fn with_block(name: impl Into<String>, params: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      params: params.into(),
      nodes: Some(Vec::new()),
    }
  }

  pub fn append(&mut self, node: impl Into<Node>) {
    self.nodes.get_or_insert_with(Vec::new).push(node.into());
  }

  /// Lowercased name without any vendor prefix, e.g. `keyframes` for
  /// `@-webkit-keyframes`.
  pub fn unprefixed_name(&self) -> String {
    let name = self.name.to_ascii_lowercase();
    if let Some(rest) = name.strip_prefix('-') {
      if let Some(index) = rest.find('-') {
        return rest[index + 1..].to_string();
      }
    }
    name
  }
}

impl Declaration {
  pub fn new(prop: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      prop: prop.into(),
      value: value.into(),
      important: false,
    }
  }

  pub fn important(mut self, important: bool) -> Self {
    self.important = important;
    self
  }
}

impl fmt::Display for Declaration {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}: {}", self.prop, self.value)?;
    if self.important {
      write!(f, " !important")?;
    }
    Ok(())
  }
}

impl Comment {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into() }
  }
}

impl Node {
  pub fn as_declaration(&self) -> Option<&Declaration> {
    match self {
      Node::Declaration(decl) => Some(decl),
      _ => None,
    }
  }

  pub fn as_rule(&self) -> Option<&Rule> {
    match self {
      Node::Rule(rule) => Some(rule),
      _ => None,
    }
  }

  pub fn as_at_rule(&self) -> Option<&AtRule> {
    match self {
      Node::AtRule(at_rule) => Some(at_rule),
      _ => None,
    }
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Node::Rule(_) => "rule",
      Node::AtRule(_) => "atrule",
      Node::Declaration(_) => "decl",
      Node::Comment(_) => "comment",
    }
  }
}

impl From<Rule> for Node {
  fn from(value: Rule) -> Self {
    Node::Rule(value)
  }
}

impl From<AtRule> for Node {
  fn from(value: AtRule) -> Self {
    Node::AtRule(value)
  }
}

impl From<Declaration> for Node {
  fn from(value: Declaration) -> Self {
    Node::Declaration(value)
  }
}

impl From<Comment> for Node {
  fn from(value: Comment) -> Self {
    Node::Comment(value)
  }
}

//! Expression parser for declaration values, in the spirit of
//! `postcss-value-parser`.

mod parse;
mod stringify;
mod walk;

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
  Space {
    value: String,
  },
  String {
    value: String,
    quote: char,
    unclosed: bool,
  },
  Comment {
    value: String,
    unclosed: bool,
  },
  Word {
    value: String,
  },
  Function {
    value: String,
    nodes: Vec<Node>,
    before: String,
    after: String,
    unclosed: bool,
  },
  Div {
    value: String,
    before: String,
    after: String,
  },
}

impl Node {
  pub fn word(value: impl Into<String>) -> Self {
    Node::Word {
      value: value.into(),
    }
  }

  pub fn as_word(&self) -> Option<&str> {
    match self {
      Node::Word { value } => Some(value),
      _ => None,
    }
  }

  pub fn function_name(&self) -> Option<&str> {
    match self {
      Node::Function { value, .. } => Some(value),
      _ => None,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct ParsedValue {
  pub nodes: Vec<Node>,
}

impl ParsedValue {
  pub fn walk<F>(&mut self, callback: &mut F)
  where
    F: FnMut(&mut Node) -> bool,
  {
    walk::walk(&mut self.nodes, callback)
  }

  pub fn to_css(&self) -> String {
    stringify::stringify(&self.nodes)
  }
}

pub fn parse(input: &str) -> ParsedValue {
  parse::parse(input)
}

/// Visits nodes depth-first. Returning `false` from the callback skips the
/// children of a function node.
pub fn walk<F>(nodes: &mut [Node], callback: &mut F)
where
  F: FnMut(&mut Node) -> bool,
{
  walk::walk(nodes, callback)
}

pub fn stringify(nodes: &[Node]) -> String {
  stringify::stringify(nodes)
}

pub fn stringify_node(node: &Node) -> String {
  stringify::stringify(std::slice::from_ref(node))
}

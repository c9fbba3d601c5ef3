use crate::ast::{AtRule, Comment, Declaration, Node, Root, Rule};
use crate::list;

/// Output layout for [`stringify`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatOptions {
  /// Multi-line, indented output. When unset every rule is written on one line.
  pub stylistic: bool,
  /// Spaces per nesting level in stylistic mode.
  pub indent: usize,
  /// Selector lists longer than this wrap after each comma in stylistic mode.
  pub line_length: usize,
}

impl Default for FormatOptions {
  fn default() -> Self {
    Self {
      stylistic: false,
      indent: 2,
      line_length: 80,
    }
  }
}

pub fn stringify(root: &Root, options: &FormatOptions) -> String {
  let mut stringifier = Stringifier {
    options,
    out: String::new(),
  };
  stringifier.body(&root.nodes, 0);
  stringifier.out
}

struct Stringifier<'a> {
  options: &'a FormatOptions,
  out: String,
}

impl Stringifier<'_> {
  fn indent(&self, depth: usize) -> String {
    if self.options.stylistic {
      " ".repeat(self.options.indent * depth)
    } else {
      String::new()
    }
  }

  fn body(&mut self, nodes: &[Node], depth: usize) {
    for (index, node) in nodes.iter().enumerate() {
      // Blank line between top level blocks, except after a comment that
      // annotates the following node.
      if self.options.stylistic
        && depth == 0
        && index > 0
        && !matches!(nodes[index - 1], Node::Comment(_))
      {
        self.out.push('\n');
      }
      match node {
        Node::Rule(rule) => self.rule(rule, depth),
        Node::AtRule(at_rule) => self.at_rule(at_rule, depth),
        Node::Declaration(decl) => {
          let indent = self.indent(depth);
          self.out.push_str(&indent);
          self.decl(decl);
          self.out.push_str(";\n");
        }
        Node::Comment(comment) => self.comment(comment, depth),
      }
    }
  }

  fn rule(&mut self, rule: &Rule, depth: usize) {
    let indent = self.indent(depth);
    self.out.push_str(&indent);
    self.selector(&rule.selector, &indent);

    if !self.options.stylistic {
      self.out.push_str(" {");
      let mut first = true;
      for node in &rule.nodes {
        if let Node::Declaration(decl) = node {
          if !first {
            self.out.push_str("; ");
          }
          first = false;
          self.decl(decl);
        }
      }
      self.out.push_str("}\n");
      return;
    }

    self.out.push_str(" {\n");
    self.body(&rule.nodes, depth + 1);
    self.out.push_str(&indent);
    self.out.push_str("}\n");
  }

  fn selector(&mut self, selector: &str, indent: &str) {
    let selectors = list::comma(selector);
    let single_line = selectors.join(", ");
    if !self.options.stylistic
      || selectors.len() < 2
      || indent.len() + single_line.len() + 2 <= self.options.line_length
    {
      self.out.push_str(&single_line);
      return;
    }
    let separator = format!(",\n{indent}");
    self.out.push_str(&selectors.join(&separator));
  }

  fn at_rule(&mut self, at_rule: &AtRule, depth: usize) {
    let indent = self.indent(depth);
    self.out.push_str(&indent);
    self.out.push('@');
    self.out.push_str(&at_rule.name);
    if !at_rule.params.is_empty() {
      self.out.push(' ');
      self.out.push_str(&at_rule.params);
    }

    match &at_rule.nodes {
      None => self.out.push_str(";\n"),
      Some(nodes) => {
        self.out.push_str(" {\n");
        self.body(nodes, depth + 1);
        self.out.push_str(&indent);
        self.out.push_str("}\n");
      }
    }
  }

  fn decl(&mut self, decl: &Declaration) {
    self.out.push_str(&decl.prop);
    self.out.push_str(": ");
    self.out.push_str(&decl.value);
    if decl.important {
      self.out.push_str(" !important");
    }
  }

  fn comment(&mut self, comment: &Comment, depth: usize) {
    let indent = self.indent(depth);
    self.out.push_str(&indent);
    self.out.push_str("/* ");
    self.out.push_str(&comment.text);
    self.out.push_str(" */\n");
  }
}

use super::Node;

pub fn stringify(nodes: &[Node]) -> String {
  let mut out = String::new();
  for node in nodes {
    write_node(&mut out, node);
  }
  out
}

fn write_node(out: &mut String, node: &Node) {
  match node {
    Node::Space { value } | Node::Word { value } => out.push_str(value),
    Node::String {
      value,
      quote,
      unclosed,
    } => {
      out.push(*quote);
      out.push_str(value);
      if !unclosed {
        out.push(*quote);
      }
    }
    Node::Comment { value, unclosed } => {
      out.push_str("/*");
      out.push_str(value);
      if !unclosed {
        out.push_str("*/");
      }
    }
    Node::Div {
      value,
      before,
      after,
    } => {
      out.push_str(before);
      out.push_str(value);
      out.push_str(after);
    }
    Node::Function {
      value,
      nodes,
      before,
      after,
      unclosed,
    } => {
      out.push_str(value);
      out.push('(');
      out.push_str(before);
      for child in nodes {
        write_node(out, child);
      }
      out.push_str(after);
      if !unclosed {
        out.push(')');
      }
    }
  }
}

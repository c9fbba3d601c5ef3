use super::Node;

pub fn walk<F>(nodes: &mut [Node], callback: &mut F)
where
  F: FnMut(&mut Node) -> bool,
{
  for node in nodes.iter_mut() {
    let descend = callback(node);
    if !descend {
      continue;
    }
    if let Node::Function { nodes: inner, .. } = node {
      walk(inner, callback);
    }
  }
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use crate::value_parser::parse;

  #[test]
  fn visits_function_children_unless_skipped() {
    let mut parsed = parse("a f(b g(c)) h(d)");
    let mut seen = Vec::new();
    parsed.walk(&mut |node| {
      if let Some(word) = node.as_word() {
        seen.push(word.to_string());
      }
      node.function_name() != Some("h")
    });
    assert_eq!(seen, vec!["a", "b", "c"]);
  }
}

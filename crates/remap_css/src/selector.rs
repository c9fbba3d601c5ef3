//! Per-source selector scoping.
//!
//! Selectors are plain strings here. The rewriter only needs to find the
//! leading compound selector of each entry in a selector list, which is
//! everything up to the first top-level combinator.

use regex::Regex;
use remap_css_syntax::list;

pub struct SelectorRewriter<'a> {
  prefix: Option<&'a str>,
  match_list: &'a [String],
  ignore: &'a [Regex],
}

impl<'a> SelectorRewriter<'a> {
  pub fn new(prefix: Option<&'a str>, match_list: &'a [String], ignore: &'a [Regex]) -> Self {
    Self {
      prefix: prefix.map(str::trim).filter(|prefix| !prefix.is_empty()),
      match_list,
      ignore,
    }
  }

  /// Rewrites a selector list. Returns `None` when every selector was
  /// dropped by an ignore pattern.
  pub fn rewrite(&self, selector: &str, in_keyframes: bool) -> Option<String> {
    if in_keyframes {
      return Some(selector.trim().to_string());
    }

    let survivors: Vec<String> = list::comma(selector)
      .into_iter()
      .filter(|selector| !selector.is_empty())
      .map(|selector| {
        if is_keyframe_selector(&selector) {
          selector
        } else {
          self.prefix_selector(&selector)
        }
      })
      .filter(|selector| !self.ignore.iter().any(|pattern| pattern.is_match(selector)))
      .collect();

    if survivors.is_empty() {
      return None;
    }
    Some(survivors.join(", "))
  }

  fn prefix_selector(&self, selector: &str) -> String {
    let Some(prefix) = self.prefix else {
      return selector.to_string();
    };

    let (compound, rest) = split_leading_compound(selector);
    let excepted = self
      .match_list
      .iter()
      .map(|entry| entry.trim())
      .filter(|entry| !entry.is_empty())
      .any(|entry| compound == entry || compound.starts_with(entry));
    if excepted {
      return selector.to_string();
    }

    let (prefix_compound, prefix_rest) = split_leading_compound(prefix);
    match (root_qualifiers(compound), root_qualifiers(prefix_compound)) {
      // html.a .b + html.dark -> html.dark.a .b
      (Some(qualifiers), Some(_)) => format!("{prefix_compound}{qualifiers}{prefix_rest}{rest}"),
      // html .b + .theme -> html .theme .b
      (Some(_), None) => {
        let rest = rest.trim_start();
        if rest.is_empty() {
          format!("{compound} {prefix}")
        } else {
          format!("{compound} {prefix} {rest}")
        }
      }
      _ => format!("{prefix} {selector}"),
    }
  }
}

/// `from`, `to` and percentages inside `@keyframes`.
pub fn is_keyframe_selector(selector: &str) -> bool {
  let selector = selector.trim();
  if selector.eq_ignore_ascii_case("from") || selector.eq_ignore_ascii_case("to") {
    return true;
  }
  selector
    .strip_suffix('%')
    .is_some_and(|number| !number.is_empty() && number.parse::<f64>().is_ok())
}

/// For a root compound (`html`, `html.x`, `:root[y]`) returns the qualifiers
/// following the root part.
fn root_qualifiers(compound: &str) -> Option<&str> {
  let lower = compound.to_ascii_lowercase();
  for root in ["html", ":root"] {
    if lower.starts_with(root) {
      let qualifiers = &compound[root.len()..];
      if qualifiers.is_empty() || qualifiers.starts_with(['.', '#', ':', '[']) {
        return Some(qualifiers);
      }
    }
  }
  None
}

/// Splits a selector into its leading compound and the remainder, which
/// starts with the combinator (or whitespace) that ended the compound.
fn split_leading_compound(selector: &str) -> (&str, &str) {
  let mut depth = 0usize;
  let mut quote: Option<char> = None;
  let mut escaped = false;

  for (index, ch) in selector.char_indices() {
    if escaped {
      escaped = false;
      continue;
    }
    match ch {
      '\\' => escaped = true,
      _ if quote.is_some() => {
        if quote == Some(ch) {
          quote = None;
        }
      }
      '"' | '\'' => quote = Some(ch),
      '(' | '[' => depth += 1,
      ')' | ']' => depth = depth.saturating_sub(1),
      ' ' | '\t' | '\n' | '>' | '+' | '~' if depth == 0 => {
        return (&selector[..index], &selector[index..]);
      }
      _ => {}
    }
  }

  (selector, "")
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  fn rewrite(prefix: Option<&str>, match_list: &[&str], ignore: &[&str], selector: &str) -> Option<String> {
    let match_list: Vec<String> = match_list.iter().map(|s| s.to_string()).collect();
    let ignore: Vec<Regex> = ignore.iter().map(|p| Regex::new(p).unwrap()).collect();
    SelectorRewriter::new(prefix, &match_list, &ignore).rewrite(selector, false)
  }

  #[test]
  fn prefixes_each_selector() {
    assert_eq!(
      rewrite(Some(".dark"), &[], &[], "a, .b > c"),
      Some(".dark a, .dark .b > c".into())
    );
    assert_eq!(rewrite(None, &[], &[], "a,b"), Some("a, b".into()));
  }

  #[test]
  fn match_list_suppresses_prefixing() {
    assert_eq!(
      rewrite(Some(".dark"), &[".theme"], &[], ".theme-x a, .theme, .other"),
      Some(".theme-x a, .theme, .dark .other".into())
    );
    assert_eq!(
      rewrite(Some(".dark"), &["body"], &[], "body.x p"),
      Some("body.x p".into())
    );
  }

  #[test]
  fn match_list_only_checks_leading_compound() {
    assert_eq!(
      rewrite(Some(".dark"), &["body .x"], &[], "body .x a"),
      Some(".dark body .x a".into())
    );
    assert_eq!(
      rewrite(Some(".dark"), &["body .x"], &[], ".x a"),
      Some(".dark .x a".into())
    );
  }

  #[test]
  fn merges_root_selectors() {
    assert_eq!(
      rewrite(Some("html.dark"), &[], &[], "html .foo"),
      Some("html.dark .foo".into())
    );
    assert_eq!(
      rewrite(Some("html.dark"), &[], &[], ":root"),
      Some("html.dark".into())
    );
    assert_eq!(
      rewrite(Some(":root.dark"), &[], &[], "html.rtl > body"),
      Some(":root.dark.rtl > body".into())
    );
    assert_eq!(
      rewrite(Some("html.dark"), &[], &[], ".foo"),
      Some("html.dark .foo".into())
    );
  }

  #[test]
  fn root_selectors_with_plain_prefix() {
    assert_eq!(
      rewrite(Some(".theme"), &[], &[], "html .foo"),
      Some("html .theme .foo".into())
    );
    assert_eq!(
      rewrite(Some(".theme"), &[], &[], "html > body"),
      Some("html .theme > body".into())
    );
    assert_eq!(rewrite(Some(".theme"), &[], &[], ":root"), Some(":root .theme".into()));
  }

  #[test]
  fn keyframe_selectors_are_untouched() {
    assert_eq!(
      rewrite(Some(".dark"), &[], &[], "from, 50%, to"),
      Some("from, 50%, to".into())
    );
    let rewriter = SelectorRewriter::new(Some(".dark"), &[], &[]);
    assert_eq!(rewriter.rewrite("0%, 100%", true), Some("0%, 100%".into()));
    assert!(is_keyframe_selector("12.5%"));
    assert!(!is_keyframe_selector("%"));
    assert!(!is_keyframe_selector("html"));
  }

  #[test]
  fn ignore_patterns_drop_selectors() {
    assert_eq!(
      rewrite(Some(".dark"), &[], &[r"\.ad\b"], "a, .ad img, b"),
      Some(".dark a, .dark b".into())
    );
    assert_eq!(rewrite(Some(".dark"), &[], &["^.dark a$"], "a"), None);
  }

  #[test]
  fn leading_compound_respects_brackets() {
    assert_eq!(
      split_leading_compound("a[title=\"x y\"]:not(.a .b) c"),
      ("a[title=\"x y\"]:not(.a .b)", " c")
    );
    assert_eq!(split_leading_compound("a>b"), ("a", ">b"));
  }
}

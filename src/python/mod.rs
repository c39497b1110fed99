//! Python source analysis and edits via tree-sitter

use crate::core::error::{ActionError, ActionResult};
use std::ops::Range;
use tree_sitter::{Node, Parser, Tree};

/// Statement added to modules that would otherwise be empty
pub const FUTURE_ANNOTATIONS: &str = "from __future__ import annotations";

fn parse(text: &str) -> ActionResult<Tree> {
  let mut parser = Parser::new();
  parser.set_language(&tree_sitter_python::LANGUAGE.into())?;
  parser
    .parse(text, None)
    .ok_or_else(|| ActionError::message("Failed to parse Python source"))
}

/// Fail if the source does not parse cleanly
pub fn check_syntax(text: &str) -> ActionResult<()> {
  let tree = parse(text)?;
  let root = tree.root_node();
  if root.has_error() {
    let mut cursor = root.walk();
    let line = first_error(root, &mut cursor).map_or(0, |n| n.start_position().row + 1);
    return Err(ActionError::message(format!("Invalid Python syntax near line {}", line)));
  }
  Ok(())
}

fn first_error<'t>(node: Node<'t>, cursor: &mut tree_sitter::TreeCursor<'t>) -> Option<Node<'t>> {
  if node.is_error() || node.is_missing() {
    return Some(node);
  }
  let children: Vec<Node<'t>> = node.children(cursor).collect();
  children.into_iter().find_map(|child| {
    let mut cursor = child.walk();
    first_error(child, &mut cursor)
  })
}

/// Whether the module has no statements (comments do not count)
pub fn is_empty_module(text: &str) -> ActionResult<bool> {
  let tree = parse(text)?;
  let root = tree.root_node();
  let mut cursor = root.walk();
  let empty = root.named_children(&mut cursor).all(|n| n.kind() == "comment");
  Ok(empty)
}

/// Add `from __future__ import annotations` to a module without statements
pub fn touch_empty(text: &str) -> ActionResult<String> {
  if !is_empty_module(text)? {
    return Ok(text.to_string());
  }
  let head = text.trim_end();
  if head.is_empty() {
    Ok(format!("{}\n", FUTURE_ANNOTATIONS))
  } else {
    Ok(format!("{}\n{}\n", head, FUTURE_ANNOTATIONS))
  }
}

/// Rewrite `Sequence[str]` as `list[str]`
///
/// Only the bare name `Sequence` subscripted by exactly the bare name `str`
/// is rewritten, both in annotations and in expressions.
pub fn replace_sequence_strs(text: &str) -> ActionResult<String> {
  let tree = parse(text)?;
  let mut ranges = Vec::new();
  collect_sequence_strs(tree.root_node(), text.as_bytes(), &mut ranges);

  ranges.sort_by_key(|r| std::cmp::Reverse(r.start));
  let mut out = text.to_string();
  for range in ranges {
    out.replace_range(range, "list");
  }
  Ok(out)
}

fn collect_sequence_strs(node: Node<'_>, src: &[u8], out: &mut Vec<Range<usize>>) {
  if let Some(range) = sequence_name_range(node, src) {
    out.push(range);
  }
  let mut cursor = node.walk();
  for child in node.named_children(&mut cursor) {
    collect_sequence_strs(child, src, out);
  }
}

/// Byte range of `Sequence` if `node` is `Sequence[str]`
fn sequence_name_range(node: Node<'_>, src: &[u8]) -> Option<Range<usize>> {
  match node.kind() {
    // expression position: `cast(Sequence[str], x)`
    "subscript" => {
      let value = node.child_by_field_name("value")?;
      let mut cursor = node.walk();
      let subscripts: Vec<Node<'_>> = node.children_by_field_name("subscript", &mut cursor).collect();
      let [index] = subscripts.as_slice() else {
        return None;
      };
      (is_name(value, src, "Sequence") && is_name(*index, src, "str")).then(|| value.byte_range())
    }
    // annotation position: `x: Sequence[str]`
    "generic_type" => {
      let mut cursor = node.walk();
      let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
      let [name, params] = children.as_slice() else {
        return None;
      };
      if !is_name(*name, src, "Sequence") || params.kind() != "type_parameter" {
        return None;
      }
      let mut cursor = params.walk();
      let args: Vec<Node<'_>> = params.named_children(&mut cursor).collect();
      let [arg] = args.as_slice() else {
        return None;
      };
      is_name(unwrap_type(*arg), src, "str").then(|| name.byte_range())
    }
    _ => None,
  }
}

/// The single child of a `type` wrapper node, or the node itself
fn unwrap_type(node: Node<'_>) -> Node<'_> {
  if node.kind() != "type" {
    return node;
  }
  let mut cursor = node.walk();
  let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
  match children.as_slice() {
    [inner] => *inner,
    _ => node,
  }
}

fn is_name(node: Node<'_>, src: &[u8], name: &str) -> bool {
  node.kind() == "identifier" && node.utf8_text(src).is_ok_and(|text| text == name)
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_check_syntax() {
    assert!(check_syntax("x = 1\n").is_ok());
    assert!(check_syntax("").is_ok());
    let err = check_syntax("x = 1\ndef (:\n").unwrap_err();
    assert!(err.to_string().starts_with("Invalid Python syntax"));
  }

  #[test]
  fn test_is_empty_module() {
    assert!(is_empty_module("").unwrap());
    assert!(is_empty_module("# just a comment\n\n").unwrap());
    assert!(!is_empty_module("x = 1\n").unwrap());
    assert!(!is_empty_module("\"\"\"Docstring.\"\"\"\n").unwrap());
  }

  #[test]
  fn test_touch_empty() {
    assert_eq!(touch_empty("").unwrap(), "from __future__ import annotations\n");
    assert_eq!(
      touch_empty("# header\n\n").unwrap(),
      "# header\nfrom __future__ import annotations\n"
    );
    assert_eq!(touch_empty("x = 1\n").unwrap(), "x = 1\n");
    let once = touch_empty("").unwrap();
    assert_eq!(touch_empty(&once).unwrap(), once);
  }

  #[test]
  fn test_replace_sequence_strs_annotations() {
    let src = "from collections.abc import Sequence\n\ndef f(x: Sequence[str]) -> Sequence[str]:\n    return x\n";
    let expected = "from collections.abc import Sequence\n\ndef f(x: list[str]) -> list[str]:\n    return x\n";
    assert_eq!(replace_sequence_strs(src).unwrap(), expected);
  }

  #[test]
  fn test_replace_sequence_strs_expressions() {
    let src = "y = cast(Sequence[str], x)\n";
    assert_eq!(replace_sequence_strs(src).unwrap(), "y = cast(list[str], x)\n");
  }

  #[test]
  fn test_replace_sequence_strs_leaves_others() {
    let src = "a: Sequence[int] = []\nb: typing.Sequence[str] = []\nc: Sequence[str, int]\nd: MySequence[str]\n";
    assert_eq!(replace_sequence_strs(src).unwrap(), src);
  }

  #[test]
  fn test_replace_sequence_strs_nested() {
    let src = "x: dict[str, Sequence[str]] = {}\n";
    assert_eq!(replace_sequence_strs(src).unwrap(), "x: dict[str, list[str]] = {}\n");
  }
}

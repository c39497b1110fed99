//! Helpers for editing `toml_edit` documents without disturbing formatting

use crate::core::error::{ActionError, ActionResult};
use toml_edit::{Array, Item, Table, Value};

/// Get a sub-table, inserting an empty one if absent
pub fn get_table<'a>(table: &'a mut Table, key: &str) -> ActionResult<&'a mut Table> {
  let item = table.entry(key).or_insert(Item::Table(Table::new()));
  item
    .as_table_mut()
    .ok_or_else(|| ActionError::message(format!("'{}' must be a table", key)))
}

/// Get an array value, inserting an empty one if absent
pub fn get_array<'a>(table: &'a mut Table, key: &str) -> ActionResult<&'a mut Array> {
  let item = table.entry(key).or_insert(Item::Value(Value::Array(Array::new())));
  item
    .as_array_mut()
    .ok_or_else(|| ActionError::message(format!("'{}' must be an array", key)))
}

/// Set `key` unless it already holds an equal value
///
/// Leaves the existing item (and its comments) alone when nothing changes.
pub fn set_value(table: &mut Table, key: &str, value: impl Into<Value>) {
  let value = value.into();
  if let Some(existing) = table.get(key).and_then(Item::as_value)
    && values_equal(existing, &value)
  {
    return;
  }
  table.insert(key, Item::Value(value));
}

/// Append each string that is not already present
pub fn ensure_contains(array: &mut Array, values: &[&str]) {
  for value in values {
    if !array.iter().any(|v| v.as_str() == Some(*value)) {
      array.push(*value);
    }
  }
}

/// Compare two values ignoring decor and representation
pub fn values_equal(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::String(a), Value::String(b)) => a.value() == b.value(),
    (Value::Integer(a), Value::Integer(b)) => a.value() == b.value(),
    (Value::Float(a), Value::Float(b)) => a.value() == b.value(),
    (Value::Boolean(a), Value::Boolean(b)) => a.value() == b.value(),
    (Value::Datetime(a), Value::Datetime(b)) => a.value() == b.value(),
    (Value::Array(a), Value::Array(b)) => {
      a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(x, y))
    }
    (Value::InlineTable(a), Value::InlineTable(b)) => {
      a.len() == b.len()
        && a
          .iter()
          .all(|(k, x)| b.get(k).is_some_and(|y| values_equal(x, y)))
    }
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;
  use toml_edit::DocumentMut;

  #[test]
  fn test_get_table_inserts() {
    let mut doc = DocumentMut::new();
    let report = get_table(doc.as_table_mut(), "report").unwrap();
    set_value(report, "fail_under", 100.0);
    assert_eq!(doc.to_string(), "[report]\nfail_under = 100.0\n");
  }

  #[test]
  fn test_get_table_rejects_values() {
    let mut doc: DocumentMut = "report = 1\n".parse().unwrap();
    assert!(get_table(doc.as_table_mut(), "report").is_err());
  }

  #[test]
  fn test_set_value_keeps_comment_when_equal() {
    let mut doc: DocumentMut = "[run]\nbranch = true # always\n".parse().unwrap();
    let run = get_table(doc.as_table_mut(), "run").unwrap();
    set_value(run, "branch", true);
    assert_eq!(doc.to_string(), "[run]\nbranch = true # always\n");
    let run = get_table(doc.as_table_mut(), "run").unwrap();
    set_value(run, "branch", false);
    assert_eq!(doc.to_string(), "[run]\nbranch = false\n");
  }

  #[test]
  fn test_ensure_contains() {
    let mut doc: DocumentMut = "x = [\"a\", \"b\"]\n".parse().unwrap();
    let array = get_array(doc.as_table_mut(), "x").unwrap();
    ensure_contains(array, &["b", "c"]);
    let items: Vec<_> = array.iter().filter_map(Value::as_str).collect();
    assert_eq!(items, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_values_equal_ignores_representation() {
    let a: DocumentMut = "x = ['a', 1]\n".parse().unwrap();
    let b: DocumentMut = "x = [ \"a\" , 1 ]\n".parse().unwrap();
    let (Some(x), Some(y)) = (a["x"].as_value(), b["x"].as_value()) else {
      panic!("missing values");
    };
    assert!(values_equal(x, y));
    assert!(!values_equal(x, &Value::from(1)));
  }
}

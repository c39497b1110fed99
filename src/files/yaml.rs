//! Helpers for editing `serde_yaml` mappings and sequences

use crate::core::error::{ActionError, ActionResult};
use serde_yaml::{Mapping, Sequence, Value};

/// Get a nested mapping, inserting an empty one if absent or null
pub fn get_mapping<'a>(map: &'a mut Mapping, key: &str) -> ActionResult<&'a mut Mapping> {
  let entry = map.entry(Value::from(key)).or_insert(Value::Null);
  if entry.is_null() {
    *entry = Value::Mapping(Mapping::new());
  }
  entry
    .as_mapping_mut()
    .ok_or_else(|| ActionError::message(format!("'{}' must be a mapping", key)))
}

/// Get a nested sequence, inserting an empty one if absent or null
pub fn get_sequence<'a>(map: &'a mut Mapping, key: &str) -> ActionResult<&'a mut Sequence> {
  let entry = map.entry(Value::from(key)).or_insert(Value::Null);
  if entry.is_null() {
    *entry = Value::Sequence(Sequence::new());
  }
  entry
    .as_sequence_mut()
    .ok_or_else(|| ActionError::message(format!("'{}' must be a sequence", key)))
}

/// The document root as a mapping
pub fn root_mapping(doc: &mut Value) -> ActionResult<&mut Mapping> {
  if doc.is_null() {
    *doc = Value::Mapping(Mapping::new());
  }
  doc
    .as_mapping_mut()
    .ok_or_else(|| ActionError::message("Document root must be a mapping"))
}

pub fn set(map: &mut Mapping, key: &str, value: impl Into<Value>) {
  map.insert(Value::from(key), value.into());
}

/// Append each value that is not already present
pub fn ensure_contains<I, V>(seq: &mut Sequence, values: I)
where
  I: IntoIterator<Item = V>,
  V: Into<Value>,
{
  for value in values {
    let value = value.into();
    if !seq.contains(&value) {
      seq.push(value);
    }
  }
}

/// Whether every key of `partial` is in `value` with an equal value,
/// comparing nested mappings the same way
pub fn is_partial(value: &Value, partial: &Mapping) -> bool {
  let Some(map) = value.as_mapping() else {
    return false;
  };
  partial.iter().all(|(key, expected)| match (map.get(key), expected) {
    (Some(actual @ Value::Mapping(_)), Value::Mapping(nested)) => is_partial(actual, nested),
    (Some(actual), expected) => actual == expected,
    (None, _) => false,
  })
}

/// Build a mapping from string keys
pub fn mapping<I, V>(entries: I) -> Mapping
where
  I: IntoIterator<Item = (&'static str, V)>,
  V: Into<Value>,
{
  entries.into_iter().map(|(k, v)| (Value::from(k), v.into())).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn parse(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap()
  }

  #[test]
  fn test_get_mapping_replaces_null() {
    let mut doc = parse("on:\n  pull_request:\n");
    let root = root_mapping(&mut doc).unwrap();
    let on = get_mapping(root, "on").unwrap();
    let pull_request = get_mapping(on, "pull_request").unwrap();
    let branches = get_sequence(pull_request, "branches").unwrap();
    ensure_contains(branches, ["master", "master"]);
    assert_eq!(doc, parse("on:\n  pull_request:\n    branches: [master]\n"));
  }

  #[test]
  fn test_get_mapping_rejects_scalars() {
    let mut doc = parse("jobs: 1\n");
    let root = root_mapping(&mut doc).unwrap();
    assert!(get_mapping(root, "jobs").is_err());
    assert!(get_sequence(root, "jobs").is_err());
  }

  #[test]
  fn test_is_partial_nested() {
    let value = parse("uses: a\nwith:\n  token: t\n  sleep: 1\n");
    assert!(is_partial(&value, &mapping([("uses", "a")])));
    assert!(is_partial(&value, &parse("with:\n  token: t\n").as_mapping().unwrap().clone()));
    assert!(!is_partial(&value, &parse("with:\n  token: u\n").as_mapping().unwrap().clone()));
    assert!(!is_partial(&value, &mapping([("run", "x")])));
    assert!(!is_partial(&Value::from("uses"), &mapping([("uses", "a")])));
  }
}

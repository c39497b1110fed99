//! Dependency arrays of a `pyproject.toml`
//!
//! Visits `[project].dependencies`, every array under
//! `[project.optional-dependencies]` and every array under `[dependency-groups]`.
//! Non-string entries such as `{include-group = "..."}` are left alone.

use crate::core::error::ActionResult;
use std::collections::HashSet;
use toml_edit::{Array, DocumentMut, Item, Value};

/// Rewrite every dependency string in place
///
/// Each element keeps its surrounding whitespace and comments. Entries that
/// become identical to an earlier one in the same array are removed.
pub fn for_each_dependency<F>(doc: &mut DocumentMut, mut f: F) -> ActionResult<()>
where
  F: FnMut(&str) -> ActionResult<String>,
{
  for array in dependency_arrays_mut(doc) {
    rewrite_array(array, &mut f)?;
  }
  Ok(())
}

/// All dependency strings, in document order
pub fn dependency_strings(doc: &DocumentMut) -> Vec<String> {
  let mut arrays: Vec<&Array> = Vec::new();
  if let Some(project) = doc.get("project").and_then(Item::as_table_like) {
    arrays.extend(project.get("dependencies").and_then(Item::as_array));
    if let Some(optional) = project.get("optional-dependencies").and_then(Item::as_table_like) {
      arrays.extend(optional.iter().filter_map(|(_, item)| item.as_array()));
    }
  }
  if let Some(groups) = doc.get("dependency-groups").and_then(Item::as_table_like) {
    arrays.extend(groups.iter().filter_map(|(_, item)| item.as_array()));
  }
  arrays
    .into_iter()
    .flat_map(|array| array.iter())
    .filter_map(Value::as_str)
    .map(str::to_string)
    .collect()
}

fn dependency_arrays_mut(doc: &mut DocumentMut) -> Vec<&mut Array> {
  let mut arrays = Vec::new();
  let root = doc.as_table_mut();
  for (key, item) in root.iter_mut() {
    match key.get() {
      "project" => {
        let Some(project) = item.as_table_like_mut() else {
          continue;
        };
        for (key, item) in project.iter_mut() {
          match key.get() {
            "dependencies" => {
              if let Some(array) = item.as_array_mut() {
                arrays.push(array);
              }
            }
            "optional-dependencies" => {
              if let Some(optional) = item.as_table_like_mut() {
                arrays.extend(optional.iter_mut().filter_map(|(_, item)| item.as_array_mut()));
              }
            }
            _ => {}
          }
        }
      }
      "dependency-groups" => {
        if let Some(groups) = item.as_table_like_mut() {
          arrays.extend(groups.iter_mut().filter_map(|(_, item)| item.as_array_mut()));
        }
      }
      _ => {}
    }
  }
  arrays
}

fn rewrite_array<F>(array: &mut Array, f: &mut F) -> ActionResult<()>
where
  F: FnMut(&str) -> ActionResult<String>,
{
  let mut seen = HashSet::new();
  let mut index = 0;
  while index < array.len() {
    let Some(slot) = array.get_mut(index) else {
      break;
    };
    let Some(text) = slot.as_str() else {
      index += 1;
      continue;
    };

    let new = f(text)?;
    if !seen.insert(new.clone()) {
      array.remove(index);
      continue;
    }
    if new != text {
      let decor = slot.decor().clone();
      *slot = Value::from(new);
      *slot.decor_mut() = decor;
    }
    index += 1;
  }
  Ok(())
}

//! Idempotent rewrites of structured files
//!
//! A file is read (or a default document is used when it is missing), edited in
//! memory, serialized, and written back only if the result differs from what is
//! on disk. Differences in leading or trailing blank lines never count. Every
//! write is atomic and recorded in a [`Modifications`] set.

use crate::core::error::{ActionError, ActionResult, ResultExt};
use crate::python;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A structured file format that can be edited in place
pub trait Format {
  type Doc;

  fn parse(text: &str) -> ActionResult<Self::Doc>;

  /// Document used when the file does not exist yet
  fn default_doc() -> Self::Doc;

  fn dump(doc: &Self::Doc) -> ActionResult<String>;

  /// Semantic equality with the original text, for formats whose
  /// serializer does not reproduce the input byte for byte
  fn unchanged(_original: &str, _doc: &Self::Doc) -> bool {
    false
  }
}

/// Lossless TOML (comments, ordering and spacing preserved)
pub struct TomlFormat;

impl Format for TomlFormat {
  type Doc = toml_edit::DocumentMut;

  fn parse(text: &str) -> ActionResult<Self::Doc> {
    Ok(text.parse::<toml_edit::DocumentMut>()?)
  }

  fn default_doc() -> Self::Doc {
    toml_edit::DocumentMut::new()
  }

  fn dump(doc: &Self::Doc) -> ActionResult<String> {
    Ok(doc.to_string())
  }
}

/// YAML through an ordered value model
pub struct YamlFormat;

impl Format for YamlFormat {
  type Doc = serde_yaml::Value;

  fn parse(text: &str) -> ActionResult<Self::Doc> {
    if text.trim().is_empty() {
      return Ok(Self::default_doc());
    }
    Ok(serde_yaml::from_str(text)?)
  }

  fn default_doc() -> Self::Doc {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
  }

  fn dump(doc: &Self::Doc) -> ActionResult<String> {
    Ok(serde_yaml::to_string(doc)?)
  }

  fn unchanged(original: &str, doc: &Self::Doc) -> bool {
    Self::parse(original).is_ok_and(|parsed| parsed == *doc)
  }
}

/// Python source text, checked to be syntactically valid
pub struct PythonFormat;

impl Format for PythonFormat {
  type Doc = String;

  fn parse(text: &str) -> ActionResult<Self::Doc> {
    python::check_syntax(text)?;
    Ok(text.to_string())
  }

  fn default_doc() -> Self::Doc {
    String::new()
  }

  fn dump(doc: &Self::Doc) -> ActionResult<String> {
    Ok(doc.clone())
  }
}

/// Ordered set of paths rewritten during a run
#[derive(Debug, Default)]
pub struct Modifications {
  paths: Vec<PathBuf>,
}

impl Modifications {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record(&mut self, path: &Path) {
    if !self.paths.iter().any(|p| p == path) {
      self.paths.push(path.to_path_buf());
    }
  }

  pub fn is_empty(&self) -> bool {
    self.paths.is_empty()
  }

  /// End a maintenance run: `Ok` if nothing changed, otherwise a
  /// `Modified` error carrying the sorted paths
  pub fn finish(self) -> ActionResult<()> {
    if self.is_empty() {
      return Ok(());
    }
    let mut paths = self.paths;
    paths.sort();
    let joined = paths
      .iter()
      .map(|p| format!("'{}'", p.display()))
      .collect::<Vec<_>>()
      .join(", ");
    warn!("Exiting due to {} modification(s): {}", paths.len(), joined);
    Err(ActionError::Modified { paths })
  }
}

#[cfg(test)]
impl Modifications {
  pub fn len(&self) -> usize {
    self.paths.len()
  }

  pub fn paths(&self) -> &[PathBuf] {
    &self.paths
  }
}

/// Edit a structured file, writing it only if the content changed
pub fn edit_document<F, E>(path: &Path, modifications: &mut Modifications, edit: E) -> ActionResult<()>
where
  F: Format,
  E: FnOnce(&mut F::Doc) -> ActionResult<()>,
{
  let original = read_optional(path)?;
  let mut doc = match &original {
    Some(text) => F::parse(text).with_context(|| format!("Failed to parse '{}'", path.display()))?,
    None => F::default_doc(),
  };

  edit(&mut doc)?;

  let text = F::dump(&doc)?;
  if let Some(original) = &original
    && (normalize(original) == normalize(&text) || F::unchanged(original, &doc))
  {
    return Ok(());
  }

  write_text(path, &text)?;
  info!("Wrote '{}'", path.display());
  modifications.record(path);
  Ok(())
}

/// Edit a plain-text file, writing it only if the content changed
pub fn edit_text<E>(path: &Path, modifications: &mut Modifications, edit: E) -> ActionResult<()>
where
  E: FnOnce(&str) -> ActionResult<String>,
{
  let original = read_optional(path)?;
  let text = edit(original.as_deref().unwrap_or(""))?;
  if let Some(original) = &original
    && normalize(original) == normalize(&text)
  {
    return Ok(());
  }

  write_text(path, &text)?;
  info!("Wrote '{}'", path.display());
  modifications.record(path);
  Ok(())
}

/// Read a file, treating a missing file as `None`
pub fn read_optional(path: &Path) -> ActionResult<Option<String>> {
  match fs::read_to_string(path) {
    Ok(text) => Ok(Some(text)),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e).with_context(|| format!("Failed to read '{}'", path.display())),
  }
}

/// Atomically replace `path` with `text`, normalized to one trailing newline
///
/// The content goes to a temporary file in the same directory, which is then
/// renamed over the target. Existing permissions are kept.
pub fn write_text(path: &Path, text: &str) -> ActionResult<()> {
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  };
  fs::create_dir_all(&parent).with_context(|| format!("Failed to create '{}'", parent.display()))?;

  let mut tmp = tempfile::NamedTempFile::new_in(&parent)
    .with_context(|| format!("Failed to create a temporary file in '{}'", parent.display()))?;
  tmp
    .write_all(normalize(text).as_bytes())
    .with_context(|| format!("Failed to write '{}'", path.display()))?;

  let permissions = match fs::metadata(path) {
    Ok(metadata) => Some(metadata.permissions()),
    Err(_) => default_permissions(),
  };
  if let Some(permissions) = permissions {
    fs::set_permissions(tmp.path(), permissions)?;
  }

  tmp.persist(path)?;
  Ok(())
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
  use std::os::unix::fs::PermissionsExt;
  Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
  None
}

/// Drop blank lines at both ends and end with exactly one newline
pub fn normalize(text: &str) -> String {
  let lines: Vec<&str> = text.lines().collect();
  let start = lines.iter().position(|l| !l.trim().is_empty());
  let end = lines.iter().rposition(|l| !l.trim().is_empty());
  match (start, end) {
    (Some(start), Some(end)) => {
      let mut out = lines[start..=end].join("\n");
      out.push('\n');
      out
    }
    _ => String::new(),
  }
}

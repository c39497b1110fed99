use super::{FilesArgs, ensure_files};
use crate::core::config::{log_finish, log_start};
use crate::core::error::ActionResult;
use crate::files::{Modifications, PythonFormat, edit_document};
use crate::python;
use std::path::Path;
use tracing::debug;

pub fn run_touch_empty_py(args: FilesArgs) -> ActionResult<()> {
  log_start("touch-empty-py", &args);
  ensure_files(&args.paths)?;
  let mut modifications = Modifications::new();
  for path in &args.paths {
    if path.extension().and_then(|e| e.to_str()) != Some("py") {
      debug!("Skipping non-Python file '{}'", path.display());
      continue;
    }
    touch_path(path, &mut modifications)?;
  }
  modifications.finish()?;
  log_finish("touch-empty-py");
  Ok(())
}

fn touch_path(path: &Path, modifications: &mut Modifications) -> ActionResult<()> {
  edit_document::<PythonFormat, _>(path, modifications, |source| {
    *source = python::touch_empty(source)?;
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  #[test]
  fn test_touch_path() {
    let dir = TempDir::new().unwrap();
    let empty = dir.path().join("__init__.py");
    let full = dir.path().join("mod.py");
    fs::write(&empty, "").unwrap();
    fs::write(&full, "x = 1\n").unwrap();

    let mut modifications = Modifications::new();
    touch_path(&empty, &mut modifications).unwrap();
    touch_path(&full, &mut modifications).unwrap();
    assert_eq!(modifications.paths(), &[empty.clone()]);
    assert_eq!(fs::read_to_string(&empty).unwrap(), "from __future__ import annotations\n");

    let mut modifications = Modifications::new();
    touch_path(&empty, &mut modifications).unwrap();
    assert!(modifications.is_empty());
  }
}

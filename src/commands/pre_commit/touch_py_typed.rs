//! `touch-py-typed`: mark `src/` packages as typed
//!
//! Runs at most once per 12 hours per repository unless `--no-throttle`.

use super::ensure_files;
use crate::core::config::{log_finish, log_start};
use crate::core::error::{ActionError, ActionResult, ResultExt};
use crate::core::throttle::Throttle;
use crate::core::vcs::SystemGit;
use crate::files::Modifications;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const THROTTLE_HOURS: i64 = 12;

#[derive(Debug, Clone, Args)]
pub struct TouchPyTypedArgs {
  /// `pyproject.toml` files
  pub paths: Vec<PathBuf>,

  /// Run even if the hook ran recently
  #[arg(long)]
  pub no_throttle: bool,
}

pub fn run_touch_py_typed(args: TouchPyTypedArgs) -> ActionResult<()> {
  log_start("touch-py-typed", &args);
  let throttle = if args.no_throttle { None } else { Some(repo_throttle()?) };
  if let Some(throttle) = &throttle
    && throttle.is_throttled()
  {
    info!("Skipping 'touch-py-typed'; it ran within the last {} hours", THROTTLE_HOURS);
    return Ok(());
  }

  ensure_files(&args.paths)?;
  let mut modifications = Modifications::new();
  for path in &args.paths {
    touch_path(path, &mut modifications)?;
  }
  if let Some(throttle) = &throttle {
    throttle.mark()?;
  }
  modifications.finish()?;
  log_finish("touch-py-typed");
  Ok(())
}

/// Throttle keyed by the repository root, or the current directory outside git
fn repo_throttle() -> ActionResult<Throttle> {
  let cwd = std::env::current_dir().context("Failed to get current directory")?;
  let root = match SystemGit::open(&cwd) {
    Ok(git) => git.work_tree().to_path_buf(),
    Err(_) => cwd,
  };
  Throttle::new(
    "touch-py-typed",
    &root.display().to_string(),
    chrono::Duration::hours(THROTTLE_HOURS),
  )
}

fn touch_path(path: &Path, modifications: &mut Modifications) -> ActionResult<()> {
  if path.file_name().and_then(|n| n.to_str()) != Some("pyproject.toml") {
    return Err(ActionError::message(format!(
      "Expected 'pyproject.toml'; got '{}'",
      path.display()
    )));
  }
  let src = path.parent().unwrap_or(Path::new(".")).join("src");
  if !src.exists() {
    return Ok(());
  }
  if !src.is_dir() {
    return Err(ActionError::message(format!("Expected a directory; '{}' is not", src.display())));
  }

  let package = single_package(&src)?;
  let py_typed = package.join("py.typed");
  if !py_typed.exists() {
    fs::write(&py_typed, b"").with_context(|| format!("Failed to create '{}'", py_typed.display()))?;
    info!("Created '{}'", py_typed.display());
    modifications.record(&py_typed);
  }
  Ok(())
}

/// The one directory under `src/` other than `tests`
fn single_package(src: &Path) -> ActionResult<PathBuf> {
  let mut packages = Vec::new();
  for entry in fs::read_dir(src).with_context(|| format!("Failed to read '{}'", src.display()))? {
    let entry = entry?;
    if entry.file_type()?.is_dir() && entry.file_name() != "tests" {
      packages.push(entry.path());
    }
  }
  packages.sort();
  match packages.as_slice() {
    [package] => Ok(package.clone()),
    [] => Err(ActionError::message(format!("No package found in '{}'", src.display()))),
    many => Err(ActionError::with_help(
      format!(
        "Expected one package in '{}'; got {}",
        src.display(),
        many.iter().map(|p| format!("'{}'", p.display())).collect::<Vec<_>>().join(", ")
      ),
      "Only the package and an optional 'tests' directory may live under 'src/'.",
    )),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn project(dir: &Path, packages: &[&str]) -> PathBuf {
    let pyproject = dir.join("pyproject.toml");
    fs::write(&pyproject, "[project]\nname = \"demo\"\n").unwrap();
    for package in packages {
      fs::create_dir_all(dir.join("src").join(package)).unwrap();
    }
    pyproject
  }

  #[test]
  fn test_touch_path() {
    let dir = TempDir::new().unwrap();
    let pyproject = project(dir.path(), &["demo", "tests"]);

    let mut modifications = Modifications::new();
    touch_path(&pyproject, &mut modifications).unwrap();
    assert_eq!(modifications.paths(), &[dir.path().join("src/demo/py.typed")]);
    assert!(!dir.path().join("src/tests/py.typed").exists());

    let mut modifications = Modifications::new();
    touch_path(&pyproject, &mut modifications).unwrap();
    assert!(modifications.is_empty());
  }

  #[test]
  fn test_no_src() {
    let dir = TempDir::new().unwrap();
    let pyproject = project(dir.path(), &[]);
    let mut modifications = Modifications::new();
    touch_path(&pyproject, &mut modifications).unwrap();
    assert!(modifications.is_empty());
  }

  #[test]
  fn test_ambiguous_packages() {
    let dir = TempDir::new().unwrap();
    let pyproject = project(dir.path(), &["a", "b"]);
    let err = touch_path(&pyproject, &mut Modifications::new()).unwrap_err();
    assert!(err.to_string().starts_with("Expected one package"));
  }

  #[test]
  fn test_rejects_other_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("setup.cfg");
    fs::write(&path, "").unwrap();
    assert!(touch_path(&path, &mut Modifications::new()).is_err());
  }
}

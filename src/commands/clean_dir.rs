//! `clean-dir`: remove Python bytecode and empty directories

use crate::core::config::{log_finish, log_start};
use crate::core::error::{ActionError, ActionResult, ConfigError, ResultExt};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Args)]
pub struct CleanDirArgs {
  /// Directory to clean (defaults to the current directory)
  #[arg(long, env = "DIR")]
  pub path: Option<PathBuf>,
}

/// What a clean removed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanSummary {
  pub files: usize,
  pub dirs: usize,
}

pub fn run_clean_dir(args: CleanDirArgs) -> ActionResult<()> {
  log_start("clean-dir", &args);
  let path = match args.path.filter(|p| !p.as_os_str().is_empty()) {
    Some(path) => path,
    None => std::env::current_dir().context("Failed to get current directory")?,
  };

  let summary = clean_dir(&path)?;
  info!(
    "Removed {} bytecode file(s) and {} empty director(ies) under '{}'",
    summary.files,
    summary.dirs,
    path.display()
  );
  log_finish("clean-dir");
  Ok(())
}

/// Delete `*.pyc`/`*.pyo` files and empty subdirectories until none remain
///
/// The root itself is never removed, even if it ends up empty.
pub fn clean_dir(root: &Path) -> ActionResult<CleanSummary> {
  if !root.is_dir() {
    return Err(ActionError::Config(ConfigError::Invalid {
      setting: "path".to_string(),
      reason: format!("'{}' is not a directory", root.display()),
    }));
  }

  let mut summary = CleanSummary::default();
  loop {
    let files = remove_bytecode(root)?;
    let dirs = remove_empty_dirs(root)?;
    summary.files += files;
    summary.dirs += dirs;
    if files == 0 && dirs == 0 {
      return Ok(summary);
    }
  }
}

fn is_bytecode(path: &Path) -> bool {
  matches!(path.extension().and_then(|e| e.to_str()), Some("pyc" | "pyo"))
}

fn remove_bytecode(root: &Path) -> ActionResult<usize> {
  let mut count = 0;
  for entry in WalkDir::new(root) {
    let entry = entry?;
    if entry.file_type().is_file() && is_bytecode(entry.path()) {
      debug!("Removing '{}'", entry.path().display());
      fs::remove_file(entry.path()).with_context(|| format!("Failed to remove '{}'", entry.path().display()))?;
      count += 1;
    }
  }
  Ok(count)
}

fn remove_empty_dirs(root: &Path) -> ActionResult<usize> {
  let mut count = 0;
  // children before parents, so nested empty directories go in one pass
  for entry in WalkDir::new(root).min_depth(1).contents_first(true) {
    let entry = entry?;
    if !entry.file_type().is_dir() {
      continue;
    }
    let path = entry.path();
    let is_empty = fs::read_dir(path)
      .with_context(|| format!("Failed to read '{}'", path.display()))?
      .next()
      .is_none();
    if is_empty {
      debug!("Removing empty directory '{}'", path.display());
      fs::remove_dir(path).with_context(|| format!("Failed to remove '{}'", path.display()))?;
      count += 1;
    }
  }
  Ok(count)
}

//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Settings read from the environment that must not leak into tests
const ENV_SETTINGS: &[&str] = &["DIR", "HOOKS", "REPOS", "SLEEP", "TOKEN", "PYTHON_VERSION", "REPO_NAME"];

/// A scratch directory standing in for a repository checkout
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();
    Ok(Self { _root: root, path })
  }

  /// Write a file, creating parent directories
  pub fn write_file(&self, path: &str, content: &str) -> Result<PathBuf> {
    let full = self.path.join(path);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&full, content)?;
    Ok(full)
  }

  pub fn create_dir(&self, path: &str) -> Result<PathBuf> {
    let full = self.path.join(path);
    std::fs::create_dir_all(&full)?;
    Ok(full)
  }

  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  pub fn run(&self, args: &[&str]) -> Result<Output> {
    run_actions(&self.path, args)
  }
}

/// Run the actions CLI, returning its output whatever the exit status
pub fn run_actions(cwd: &Path, args: &[&str]) -> Result<Output> {
  let mut command = Command::new(env!("CARGO_BIN_EXE_actions"));
  command.current_dir(cwd).args(args).env("RUST_LOG", "info");
  for key in ENV_SETTINGS {
    command.env_remove(key);
  }
  command
    .output()
    .with_context(|| format!("Failed to run actions {}", args.join(" ")))
}

/// Exit code of a finished run, with its output on mismatch
pub fn assert_exit(output: &Output, expected: i32) {
  assert_eq!(
    output.status.code(),
    Some(expected),
    "stdout: {}\nstderr: {}",
    String::from_utf8_lossy(&output.stdout),
    String::from_utf8_lossy(&output.stderr)
  );
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}

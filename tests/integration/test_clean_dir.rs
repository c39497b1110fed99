//! Tests for the `clean-dir` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_clean_dir_removes_bytecode_and_empty_dirs() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("pkg/__init__.py", "")?;
  workspace.write_file("pkg/__pycache__/__init__.cpython-313.pyc", "")?;
  workspace.write_file("pkg/sub/__pycache__/mod.cpython-313.pyc", "")?;
  workspace.create_dir("empty/nested")?;

  let output = workspace.run(&["clean-dir", "--path", "."])?;
  assert_exit(&output, 0);

  assert!(workspace.file_exists("pkg/__init__.py"));
  assert!(!workspace.file_exists("pkg/__pycache__"));
  assert!(!workspace.file_exists("pkg/sub"));
  assert!(!workspace.file_exists("empty"));
  Ok(())
}

#[test]
fn test_clean_dir_defaults_to_current_directory() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("a.pyc", "")?;

  let output = workspace.run(&["clean-dir"])?;
  assert_exit(&output, 0);
  assert!(!workspace.file_exists("a.pyc"));
  Ok(())
}

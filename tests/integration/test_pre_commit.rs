//! Tests for the file-rewriting pre-commit hooks

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_format_requirements_exits_one_then_zero() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file(
    "pyproject.toml",
    "[project]\nname = \"demo\"\ndependencies = [\"click>=8.0,<9\"]\n",
  )?;

  let output = workspace.run(&["pre-commit", "format-requirements", "pyproject.toml"])?;
  assert_exit(&output, 1);
  assert!(stderr(&output).contains("Exiting due to 1 modification(s)"));
  assert_eq!(
    workspace.read_file("pyproject.toml")?,
    "[project]\nname = \"demo\"\ndependencies = [\"click >=8.0, <9\"]\n"
  );

  let output = workspace.run(&["pre-commit", "format-requirements", "pyproject.toml"])?;
  assert_exit(&output, 0);
  Ok(())
}

#[test]
fn test_format_requirements_missing_file() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["pre-commit", "format-requirements", "missing.toml"])?;
  assert_exit(&output, 2);
  Ok(())
}

#[test]
fn test_touch_empty_py() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("src/demo/__init__.py", "")?;
  workspace.write_file("src/demo/lib.py", "x = 1\n")?;
  workspace.write_file("notes.txt", "")?;

  let output = workspace.run(&[
    "pre-commit",
    "touch-empty-py",
    "src/demo/__init__.py",
    "src/demo/lib.py",
    "notes.txt",
  ])?;
  assert_exit(&output, 1);
  assert_eq!(
    workspace.read_file("src/demo/__init__.py")?,
    "from __future__ import annotations\n"
  );
  assert_eq!(workspace.read_file("notes.txt")?, "");
  Ok(())
}

#[test]
fn test_touch_py_typed() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file("pyproject.toml", "[project]\nname = \"demo\"\n")?;
  workspace.create_dir("src/demo")?;

  let output = workspace.run(&["pre-commit", "touch-py-typed", "--no-throttle", "pyproject.toml"])?;
  assert_exit(&output, 1);
  assert!(workspace.file_exists("src/demo/py.typed"));

  let output = workspace.run(&["pre-commit", "touch-py-typed", "--no-throttle", "pyproject.toml"])?;
  assert_exit(&output, 0);
  Ok(())
}

//! Tests for the `conformalize-repo` hook

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_conformalize_repo_is_idempotent() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let args = [
    "pre-commit",
    "conformalize-repo",
    "--ci-pull-request-ruff",
    "--ci-push-tag",
    "--pytest",
    "--readme",
    "--repo-name",
    "demo",
  ];

  let output = workspace.run(&args)?;
  assert_exit(&output, 1);
  assert!(workspace.file_exists(".github/workflows/pull-request.yaml"));
  assert!(workspace.file_exists(".github/workflows/push.yaml"));
  assert!(workspace.file_exists("pytest.toml"));
  assert!(!workspace.file_exists(".coveragerc.toml"));
  assert_eq!(workspace.read_file("README.md")?, "# `demo`\n");

  let output = workspace.run(&args)?;
  assert_exit(&output, 0);
  Ok(())
}

#[test]
fn test_conformalize_repo_rejects_bad_python_version() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&[
    "pre-commit",
    "conformalize-repo",
    "--ci-pull-request-pytest-ubuntu",
    "--ci-pull-request-pytest-all-versions",
    "--python-version",
    "3.99",
  ])?;
  assert_exit(&output, 2);
  assert!(!workspace.file_exists(".github/workflows/pull-request.yaml"));
  Ok(())
}

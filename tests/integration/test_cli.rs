//! Argument handling and exit codes

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_help_lists_commands() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["--help"])?;
  assert_exit(&output, 0);
  let stdout = String::from_utf8_lossy(&output.stdout);
  for command in ["clean-dir", "publish-package", "run-hooks", "setup-cronjob", "pre-commit"] {
    assert!(stdout.contains(command), "'{}' missing from help", command);
  }
  Ok(())
}

#[test]
fn test_version() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["--version"])?;
  assert_exit(&output, 0);
  assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
  Ok(())
}

#[test]
fn test_run_hooks_invalid_pattern() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["run-hooks", "--hook", "("])?;
  assert_exit(&output, 2);
  assert!(stderr(&output).contains("Invalid pattern"));
  Ok(())
}

#[test]
fn test_run_hooks_without_filters_runs_nothing() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  workspace.write_file(
    ".pre-commit-config.yaml",
    "repos:\n  - repo: https://github.com/pre-commit/pre-commit-hooks\n    hooks:\n      - id: check-yaml\n",
  )?;
  let output = workspace.run(&["run-hooks", "--sleep", "0"])?;
  assert_exit(&output, 0);
  assert!(stderr(&output).contains("No hooks selected"));
  Ok(())
}

#[test]
fn test_setup_sops_requires_token() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["setup-sops"])?;
  assert_exit(&output, 2);
  assert!(stderr(&output).contains("'token' must be given"));
  Ok(())
}

#[test]
fn test_random_sleep_empty_range() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["random-sleep", "--min", "10", "--max", "5"])?;
  assert_exit(&output, 2);
  Ok(())
}

#[test]
fn test_setup_cronjob_dry_run() -> Result<()> {
  let workspace = TestWorkspace::new()?;
  let output = workspace.run(&["setup-cronjob", "--dry-run", "backup", "/usr/local/bin/backup"])?;
  assert_exit(&output, 0);
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("# /etc/cron.d/backup"));
  assert!(stdout.contains("flock --nonblock --verbose /tmp/cron-backup.lock"));
  assert!(stdout.contains("# /etc/logrotate.d/backup"));
  Ok(())
}

//! System git backend
//!
//! Runs the `git` binary with an isolated environment. Used for tagging
//! releases and setting the committer identity.

use crate::core::error::{ActionError, ActionResult, GitError, ResultExt};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::{debug, info};

/// Environment variables passed through to git
const PASSTHROUGH_ENV: [&str; 4] = ["PATH", "HOME", "SSH_AUTH_SOCK", "GIT_SSH_COMMAND"];

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  /// Working tree root
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> ActionResult<Self> {
    let output = isolated_git()
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ActionError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ActionError::message(format!("Failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(Self {
      repo_path: path.to_path_buf(),
      work_tree: PathBuf::from(stdout.trim()),
    })
  }

  /// Working tree root
  pub fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  /// Set a global config value (`git config --global key value`)
  pub fn set_global_config(&self, key: &str, value: &str) -> ActionResult<()> {
    self.run(&["config", "--global", key, value])?;
    Ok(())
  }

  /// Delete a local tag; returns whether it existed
  pub fn delete_tag(&self, tag: &str) -> ActionResult<bool> {
    self.run_allow_failure(&["tag", "--delete", tag])
  }

  /// Delete a tag on a remote; returns whether the push succeeded
  pub fn delete_remote_tag(&self, remote: &str, tag: &str) -> ActionResult<bool> {
    self.run_allow_failure(&["push", "--delete", remote, tag])
  }

  /// Create an annotated tag at HEAD with the tag name as its message
  pub fn create_annotated_tag(&self, tag: &str) -> ActionResult<()> {
    self.run(&["tag", "-a", tag, "HEAD", "-m", tag])?;
    Ok(())
  }

  /// Force-push all tags, setting the upstream
  pub fn push_tags(&self, remote: &str) -> ActionResult<()> {
    let args = ["push", "--tags", "--force", "--set-upstream", remote];
    let output = self.output(&args)?;
    if !output.status.success() {
      return Err(ActionError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }
    info!("Pushed tags to '{}'", remote);
    Ok(())
  }

  fn run(&self, args: &[&str]) -> ActionResult<String> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(ActionError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
      }));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run a command whose failure is an expected outcome
  fn run_allow_failure(&self, args: &[&str]) -> ActionResult<bool> {
    let output = self.output(args)?;
    if !output.status.success() {
      debug!(
        "'git {}' failed (ignored): {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr).trim()
      );
    }
    Ok(output.status.success())
  }

  fn output(&self, args: &[&str]) -> ActionResult<Output> {
    info!("Running 'git {}'...", args.join(" "));
    self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.first().copied().unwrap_or_default()))
  }

  /// Create a git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Whitelists PATH, HOME and the SSH agent variables
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = isolated_git();
    cmd.arg("-C").arg(&self.repo_path);
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");
    cmd
  }
}

fn isolated_git() -> Command {
  let mut cmd = Command::new("git");
  cmd.env_clear();
  for key in PASSTHROUGH_ENV {
    if let Ok(value) = std::env::var(key) {
      cmd.env(key, value);
    }
  }
  cmd
}

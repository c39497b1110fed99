//! `git-clone-with`: clone a GitHub repository using a deploy key
//!
//! The key gets its own SSH host alias (the key file's stem), so several
//! deploy keys can coexist: `git@<stem>:<owner>/<repo>` resolves to
//! github.com with only that key offered.

use super::setup_ssh_config::setup_ssh_config;
use crate::core::config::{home_dir, log_finish, log_start, non_empty};
use crate::core::error::{ActionError, ActionResult, ConfigError, ResultExt};
use crate::core::process::Process;
use crate::files::write_text;
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct GitCloneWithArgs {
  /// Deploy key (private key file)
  pub path_key: PathBuf,

  /// Repository owner
  pub owner: String,

  /// Repository name
  pub repo: String,

  /// Clone destination
  pub path_clone: PathBuf,

  /// Branch to check out
  #[arg(long, env = "BRANCH")]
  pub branch: Option<String>,

  /// Clone through `sudo`
  #[arg(long, env = "SUDO")]
  pub sudo: bool,
}

pub fn run_git_clone_with(args: GitCloneWithArgs) -> ActionResult<()> {
  log_start("git-clone-with", &args);
  if !args.path_key.is_file() {
    return Err(ActionError::Config(ConfigError::Invalid {
      setting: "path_key".to_string(),
      reason: format!("'{}' is not a file", args.path_key.display()),
    }));
  }
  let alias = key_alias(&args.path_key)?;
  let ssh_dir = home_dir()?.join(".ssh");

  setup_ssh_config(&ssh_dir)?;
  write_host_config(&ssh_dir, &args.path_key)?;
  install_key(&ssh_dir, &args.path_key)?;

  let url = format!("git@{}:{}/{}", alias, args.owner, args.repo);
  Process::maybe_sudo(args.sudo, "git")
    .arg("clone")
    .arg(url)
    .path_arg(&args.path_clone)
    .opt_arg("--branch", non_empty(args.branch.clone()).as_deref())
    .run()?;

  log_finish("git-clone-with");
  Ok(())
}

fn key_alias(path_key: &Path) -> ActionResult<String> {
  path_key
    .file_stem()
    .and_then(|s| s.to_str())
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .ok_or_else(|| ActionError::message(format!("Invalid key path '{}'", path_key.display())))
}

fn key_name(path_key: &Path) -> ActionResult<String> {
  path_key
    .file_name()
    .and_then(|s| s.to_str())
    .map(str::to_string)
    .ok_or_else(|| ActionError::message(format!("Invalid key path '{}'", path_key.display())))
}

fn host_config(alias: &str, key_name: &str) -> String {
  format!(
    "Host {}\n    HostName github.com\n    User git\n    IdentityFile ~/.ssh/{}\n    IdentitiesOnly yes\n",
    alias, key_name
  )
}

/// `<ssh_dir>/config.d/<stem>.conf`
fn write_host_config(ssh_dir: &Path, path_key: &Path) -> ActionResult<PathBuf> {
  let alias = key_alias(path_key)?;
  let dest = ssh_dir.join("config.d").join(format!("{}.conf", alias));
  write_text(&dest, &host_config(&alias, &key_name(path_key)?))?;
  info!("Wrote '{}'", dest.display());
  Ok(dest)
}

/// Copy the key into `ssh_dir`, readable only by the owner
fn install_key(ssh_dir: &Path, path_key: &Path) -> ActionResult<PathBuf> {
  fs::create_dir_all(ssh_dir).with_context(|| format!("Failed to create '{}'", ssh_dir.display()))?;
  let dest = ssh_dir.join(key_name(path_key)?);
  if dest != path_key {
    fs::copy(path_key, &dest).with_context(|| format!("Failed to copy key to '{}'", dest.display()))?;
  }
  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(&dest, fs::Permissions::from_mode(0o600))?;
  }
  Ok(dest)
}

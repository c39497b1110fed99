//! `publish-package`: build a wheel with `uv` and upload it

use crate::core::config::{Secret, log_finish, log_start, non_empty, non_empty_secret};
use crate::core::error::{ActionError, ActionResult, ResultExt};
use crate::core::process::Process;
use clap::Args;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug, Clone, Args)]
pub struct PublishPackageArgs {
  /// Index username
  #[arg(long, env = "USERNAME")]
  pub username: Option<String>,

  /// Index password
  #[arg(long, env = "PASSWORD")]
  pub password: Option<Secret>,

  /// Upload URL of the index
  #[arg(long, env = "PUBLISH_URL")]
  pub publish_url: Option<String>,

  /// Always use trusted publishing
  #[arg(long, env = "TRUSTED_PUBLISHING")]
  pub trusted_publishing: bool,

  /// Use the platform's native certificate store
  #[arg(long, env = "NATIVE_TLS")]
  pub native_tls: bool,
}

pub fn run_publish_package(args: PublishPackageArgs) -> ActionResult<()> {
  log_start("publish-package", &args);
  let tmp = TempDir::new().context("Failed to create a build directory")?;

  build_command(tmp.path()).run()?;
  let files = built_files(tmp.path())?;
  publish_command(&args, &files).run()?;

  log_finish("publish-package");
  Ok(())
}

fn build_command(out_dir: &Path) -> Process {
  Process::new("uv")
    .args(["build", "--out-dir"])
    .path_arg(out_dir)
    .args(["--wheel", "--clear"])
}

fn built_files(out_dir: &Path) -> ActionResult<Vec<PathBuf>> {
  let pattern = out_dir.join("*");
  let files = glob::glob(&pattern.to_string_lossy())?.collect::<Result<Vec<_>, _>>()?;
  if files.is_empty() {
    return Err(ActionError::message(format!(
      "'uv build' produced no files in '{}'",
      out_dir.display()
    )));
  }
  Ok(files)
}

fn publish_command(args: &PublishPackageArgs, files: &[PathBuf]) -> Process {
  let username = non_empty(args.username.clone());
  let password = non_empty_secret(args.password.clone());
  let publish_url = non_empty(args.publish_url.clone());

  let mut process = Process::new("uv")
    .arg("publish")
    .opt_arg("--username", username.as_deref())
    .opt_secret_arg("--password", password.as_ref())
    .opt_arg("--publish-url", publish_url.as_deref());
  if args.trusted_publishing {
    process = process.args(["--trusted-publishing", "always"]);
  }
  process = process.flag("--native-tls", args.native_tls);
  files.iter().fold(process, |p, file| p.path_arg(file))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;

  fn args() -> PublishPackageArgs {
    PublishPackageArgs {
      username: None,
      password: None,
      publish_url: None,
      trusted_publishing: false,
      native_tls: false,
    }
  }

  #[test]
  fn test_publish_command_minimal() {
    let cmd = publish_command(&args(), &[PathBuf::from("/tmp/x/pkg-0.1.0-py3-none-any.whl")]);
    assert_eq!(cmd.display(), "uv publish /tmp/x/pkg-0.1.0-py3-none-any.whl");
  }

  #[test]
  fn test_publish_command_full() {
    let args = PublishPackageArgs {
      username: Some("user".to_string()),
      password: Some(Secret::new("pass")),
      publish_url: Some("https://index.example.com".to_string()),
      trusted_publishing: true,
      native_tls: true,
    };
    let cmd = publish_command(&args, &[PathBuf::from("a.whl")]);
    assert_eq!(
      cmd.display(),
      "uv publish --username user --password *** --publish-url https://index.example.com \
       --trusted-publishing always --native-tls a.whl"
    );
  }

  #[test]
  fn test_empty_settings_ignored() {
    let args = PublishPackageArgs {
      username: Some(String::new()),
      password: Some(Secret::new("")),
      ..args()
    };
    assert_eq!(publish_command(&args, &[]).display(), "uv publish");
  }

  #[test]
  fn test_built_files() {
    let dir = TempDir::new().unwrap();
    assert!(built_files(dir.path()).is_err());
    fs::write(dir.path().join("pkg-0.1.0-py3-none-any.whl"), b"").unwrap();
    let files = built_files(dir.path()).unwrap();
    assert_eq!(files, vec![dir.path().join("pkg-0.1.0-py3-none-any.whl")]);
  }
}

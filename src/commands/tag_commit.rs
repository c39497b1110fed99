//! `tag-commit`: tag HEAD with the current project version and push

use crate::core::config::{log_finish, log_start, non_empty};
use crate::core::error::{ActionError, ActionResult, ResultExt};
use crate::core::process::Process;
use crate::core::vcs::SystemGit;
use clap::Args;
use semver::Version;
use tracing::info;

const REMOTE: &str = "origin";

#[derive(Debug, Clone, Args)]
pub struct TagCommitArgs {
  /// Committer name for the tags
  #[arg(long, env = "USER_NAME", default_value = "github-actions-bot")]
  pub user_name: String,

  /// Committer email for the tags
  #[arg(long, env = "USER_EMAIL", default_value = "noreply@github.com")]
  pub user_email: String,

  /// Also tag `X.Y`
  #[arg(long, env = "MAJOR_MINOR")]
  pub major_minor: bool,

  /// Also tag `X`
  #[arg(long, env = "MAJOR")]
  pub major: bool,

  /// Also tag `latest`
  #[arg(long, env = "LATEST")]
  pub latest: bool,
}

pub fn run_tag_commit(args: TagCommitArgs) -> ActionResult<()> {
  log_start("tag-commit", &args);
  let cwd = std::env::current_dir().context("Failed to get current directory")?;
  let git = SystemGit::open(&cwd)?;

  if let Some(name) = non_empty(Some(args.user_name.clone())) {
    git.set_global_config("user.name", &name)?;
  }
  if let Some(email) = non_empty(Some(args.user_email.clone())) {
    git.set_global_config("user.email", &email)?;
  }

  let output = Process::new("bump-my-version")
    .args(["show", "current_version"])
    .current_dir(&git.work_tree)
    .output_string()?;
  let version = parse_current_version(&output)?;

  for tag in tags_for(&version, &args) {
    git.delete_tag(&tag)?;
    git.delete_remote_tag(REMOTE, &tag)?;
    git.create_annotated_tag(&tag)?;
    git.push_tags(REMOTE)?;
    info!("Tagged '{}'", tag);
  }

  log_finish("tag-commit");
  Ok(())
}

/// The version printed by `bump-my-version show current_version`
fn parse_current_version(output: &str) -> ActionResult<Version> {
  let text = output.lines().rev().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
  Version::parse(text).map_err(|e| ActionError::message(format!("Invalid current version '{}': {}", text, e)))
}

/// Tags to create, most specific first
fn tags_for(version: &Version, args: &TagCommitArgs) -> Vec<String> {
  let mut tags = vec![format!("{}.{}.{}", version.major, version.minor, version.patch)];
  if args.major_minor {
    tags.push(format!("{}.{}", version.major, version.minor));
  }
  if args.major {
    tags.push(version.major.to_string());
  }
  if args.latest {
    tags.push("latest".to_string());
  }
  tags
}

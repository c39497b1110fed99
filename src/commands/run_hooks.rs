//! `run-hooks`: run selected pre-commit hooks one at a time
//!
//! Hooks come from `.pre-commit-config.yaml`. A repo pattern that matches a
//! repo URL selects every hook of that repo; otherwise hook patterns select
//! individual hook ids. With no patterns at all, every hook runs. Failures are
//! collected so that one failing hook does not hide the others.

use crate::core::config::{log_finish, log_start};
use crate::core::error::{ActionError, ActionResult, ConfigError, ResultExt, ValidationError};
use crate::core::process::Process;
use clap::Args;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{error, info, warn};

const CONFIG_FILE: &str = ".pre-commit-config.yaml";

#[derive(Debug, Clone, Args)]
pub struct RunHooksArgs {
  /// Regex matched against repo URLs; a match selects all of the repo's hooks
  #[arg(long = "repo", env = "REPOS", value_delimiter = ',')]
  pub repos: Vec<String>,

  /// Regex matched against hook ids
  #[arg(long = "hook", env = "HOOKS", value_delimiter = ',')]
  pub hooks: Vec<String>,

  /// Seconds to sleep between hooks
  #[arg(long, env = "SLEEP", default_value_t = 1)]
  pub sleep: u64,

  /// Pre-commit configuration file
  #[arg(long, default_value = CONFIG_FILE)]
  pub config: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PreCommitConfig {
  #[serde(default)]
  repos: Vec<RepoConfig>,
}

#[derive(Debug, Deserialize)]
struct RepoConfig {
  repo: String,
  #[serde(default)]
  hooks: Vec<HookConfig>,
}

#[derive(Debug, Deserialize)]
struct HookConfig {
  id: String,
}

pub fn run_run_hooks(args: RunHooksArgs) -> ActionResult<()> {
  log_start("run-hooks", &args);
  let repos = compile(&args.repos)?;
  let hooks = compile(&args.hooks)?;
  let config = read_config(&args.config)?;

  let selected = select_hooks(&config, &repos, &hooks);
  if selected.is_empty() {
    warn!("No hooks selected from '{}'", args.config.display());
  }

  let mut failed = Vec::new();
  for (i, hook) in selected.iter().enumerate() {
    if i > 0 && args.sleep > 0 {
      thread::sleep(Duration::from_secs(args.sleep));
    }
    match run_hook(hook) {
      Ok(()) => info!("Hook '{}' passed", hook),
      Err(err) if err.is_command_failure() => {
        error!("Hook '{}' failed", hook);
        failed.push(hook.clone());
      }
      Err(err) => return Err(err),
    }
  }

  if !failed.is_empty() {
    return Err(ActionError::Validation(ValidationError::HooksFailed { hooks: failed }));
  }
  log_finish("run-hooks");
  Ok(())
}

fn run_hook(hook: &str) -> ActionResult<()> {
  Process::new("pre-commit")
    .args(["run", "--verbose", "--all-files", hook])
    .run()
}

fn compile(patterns: &[String]) -> ActionResult<Vec<Regex>> {
  patterns
    .iter()
    .filter(|p| !p.trim().is_empty())
    .map(|p| {
      Regex::new(p).map_err(|e| {
        ActionError::Config(ConfigError::InvalidPattern {
          pattern: p.clone(),
          reason: e.to_string(),
        })
      })
    })
    .collect()
}

fn read_config(path: &Path) -> ActionResult<PreCommitConfig> {
  let text = fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
  serde_yaml::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Hook ids to run, in configuration order and without duplicates
///
/// Nothing is selected without a repo or hook pattern.
fn select_hooks(config: &PreCommitConfig, repos: &[Regex], hooks: &[Regex]) -> Vec<String> {
  let mut out: Vec<String> = Vec::new();
  for repo in &config.repos {
    let whole_repo = repos.iter().any(|r| r.is_match(&repo.repo));
    for hook in &repo.hooks {
      let selected = whole_repo || hooks.iter().any(|h| h.is_match(&hook.id));
      if selected && !out.contains(&hook.id) {
        out.push(hook.id.clone());
      }
    }
  }
  out
}

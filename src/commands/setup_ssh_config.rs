//! `setup-ssh-config`: make `~/.ssh/config` include `~/.ssh/config.d/*.conf`

use crate::core::config::{home_dir, log_finish, log_start};
use crate::core::error::{ActionResult, ResultExt};
use crate::files::context::normalize;
use crate::files::{read_optional, write_text};
use clap::Args;
use std::fs;
use std::path::Path;
use tracing::info;

pub const INCLUDE_LINE: &str = "Include ~/.ssh/config.d/*.conf";

#[derive(Debug, Clone, Args)]
pub struct SetupSshConfigArgs {}

pub fn run_setup_ssh_config(args: SetupSshConfigArgs) -> ActionResult<()> {
  log_start("setup-ssh-config", &args);
  setup_ssh_config(&home_dir()?.join(".ssh"))?;
  log_finish("setup-ssh-config");
  Ok(())
}

/// Put the `Include` line at the top of `<ssh_dir>/config` and create `config.d`
///
/// `Include` only applies to the hosts after it, so the line must come first.
/// Existing entries are kept below it.
pub fn setup_ssh_config(ssh_dir: &Path) -> ActionResult<()> {
  let config_d = ssh_dir.join("config.d");
  fs::create_dir_all(&config_d).with_context(|| format!("Failed to create '{}'", config_d.display()))?;

  let path = ssh_dir.join("config");
  let existing = read_optional(&path)?.unwrap_or_default();
  let rest: Vec<&str> = existing.lines().filter(|line| line.trim() != INCLUDE_LINE).collect();
  let mut text = INCLUDE_LINE.to_string();
  if rest.iter().any(|line| !line.trim().is_empty()) {
    text.push_str("\n\n");
    text.push_str(rest.join("\n").trim_start_matches('\n'));
  }

  if normalize(&existing) != normalize(&text) {
    write_text(&path, &text)?;
    info!("Wrote '{}'", path.display());
  }
  Ok(())
}

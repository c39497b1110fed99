//! `re-encrypt`: rotate the age identity of a sops-encrypted JSON file

use crate::core::config::{Secret, log_finish, log_start, non_empty_secret};
use crate::core::error::{ActionError, ActionResult, ConfigError};
use crate::core::process::Process;
use crate::files::write_text;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct ReEncryptArgs {
  /// Encrypted JSON file
  pub path: PathBuf,

  /// The age key file
  #[arg(long, env = "KEY_FILE")]
  pub key_file: Option<PathBuf>,

  /// The age identity
  #[arg(long, env = "KEY")]
  pub key: Option<Secret>,

  /// The new key file for encryption, if different
  #[arg(long, env = "NEW_KEY_FILE")]
  pub new_key_file: Option<PathBuf>,

  /// The new age identity for encryption, if different
  #[arg(long, env = "NEW_KEY")]
  pub new_key: Option<Secret>,
}

/// Where an age identity comes from
#[derive(Debug, Clone)]
enum Identity {
  Key(Secret),
  File(PathBuf),
}

impl Identity {
  fn from_settings(key: Option<Secret>, key_file: Option<PathBuf>) -> Option<Self> {
    match (non_empty_secret(key), key_file.filter(|p| !p.as_os_str().is_empty())) {
      (Some(key), _) => Some(Identity::Key(key)),
      (None, Some(file)) => Some(Identity::File(file)),
      (None, None) => None,
    }
  }

  /// Make the identity available to `sops`
  fn apply(&self, process: Process) -> Process {
    match self {
      Identity::Key(key) => process.env("SOPS_AGE_KEY", key),
      Identity::File(file) => process.env("SOPS_AGE_KEY_FILE", &Secret::new(file.display().to_string())),
    }
  }

  /// `age-keygen -y`: the public recipient of this identity
  fn recipient_command(&self) -> Process {
    let process = Process::new("age-keygen").arg("-y");
    match self {
      Identity::Key(key) => process.stdin(format!("{}\n", key.expose())),
      Identity::File(file) => process.path_arg(file),
    }
  }
}

pub fn run_re_encrypt(args: ReEncryptArgs) -> ActionResult<()> {
  log_start("re-encrypt", &args);
  if !args.path.is_file() {
    return Err(ActionError::Config(ConfigError::Invalid {
      setting: "path".to_string(),
      reason: format!("'{}' is not a file", args.path.display()),
    }));
  }

  let old = Identity::from_settings(args.key.clone(), args.key_file.clone()).ok_or_else(|| {
    ActionError::Config(ConfigError::Missing {
      setting: "key".to_string(),
    })
  })?;
  let new = Identity::from_settings(args.new_key.clone(), args.new_key_file.clone()).unwrap_or_else(|| old.clone());

  let plaintext = old
    .apply(Process::new("sops"))
    .args(["--decrypt", "--input-type", "json", "--output-type", "json"])
    .path_arg(&args.path)
    .output_string()?;

  let recipient = new.recipient_command().output_string()?;
  let recipient = recipient.trim();
  if recipient.is_empty() {
    return Err(ActionError::message("'age-keygen -y' returned no recipient"));
  }

  let encrypted = Process::new("sops")
    .args(["--encrypt", "--age", recipient, "--input-type", "json", "--output-type", "json", "/dev/stdin"])
    .stdin(plaintext)
    .output_string()?;

  write_text(&args.path, &encrypted)?;
  info!("Re-encrypted '{}' for '{}'", args.path.display(), recipient);
  log_finish("re-encrypt");
  Ok(())
}

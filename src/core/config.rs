//! Settings shared by every action
//!
//! Actions take their settings from flags and environment variables (declared
//! on the clap argument structs). This module holds the pieces common to all
//! of them: secrets that never print, empty-string normalization, and the
//! start-of-run settings log.

use crate::core::error::{ActionError, ActionResult, ConfigError};
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

/// A value that must not appear in logs
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
  pub fn new(value: impl Into<String>) -> Self {
    Self(value.into())
  }

  /// The underlying value, for handing to a subprocess or a file
  pub fn expose(&self) -> &str {
    &self.0
  }
}

impl fmt::Debug for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "***")
  }
}

impl fmt::Display for Secret {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "***")
  }
}

impl FromStr for Secret {
  type Err = Infallible;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Ok(Self::new(s))
  }
}

/// Treat an empty (or whitespace-only) string as unset
///
/// CI systems export unset inputs as empty environment variables.
pub fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}

/// Same as [`non_empty`] for secrets
pub fn non_empty_secret(value: Option<Secret>) -> Option<Secret> {
  value.filter(|v| !v.expose().trim().is_empty())
}

/// Require a setting, naming it in the error
pub fn require<T>(value: Option<T>, setting: &str) -> ActionResult<T> {
  value.ok_or_else(|| {
    ActionError::Config(ConfigError::Missing {
      setting: setting.to_string(),
    })
  })
}

/// Parse `KEY=VALUE` (used for `--env`)
pub fn parse_key_value(text: &str) -> Result<(String, String), String> {
  match text.split_once('=') {
    Some((key, value)) if !key.trim().is_empty() => Ok((key.trim().to_string(), value.to_string())),
    _ => Err(format!("expected KEY=VALUE, got '{}'", text)),
  }
}

/// The user's home directory
pub fn home_dir() -> ActionResult<PathBuf> {
  dirs::home_dir().ok_or_else(|| ActionError::message("Could not determine the home directory"))
}

/// Log the start of an action with its (redacted) settings
pub fn log_start(name: &str, settings: &impl fmt::Debug) {
  info!(
    "Running '{}' (version {}) with settings: {:?}",
    name,
    env!("CARGO_PKG_VERSION"),
    settings
  );
}

/// Log the successful end of an action
pub fn log_finish(name: &str) {
  info!("Finished running '{}'", name);
}

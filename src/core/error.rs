//! Error types for actions with contextual messages and exit codes
//!
//! Every subcommand returns `ActionResult<()>`. Errors are categorized so that
//! `main` can pick an exit code and print a short hint where one helps.
//! A run that rewrote files is reported through `ActionError::Modified`, which
//! maps to exit code 1 as pre-commit hooks expect.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Files were modified, re-run (pre-commit convention)
  Modified = 1,
  /// User error (invalid args, missing files, bad settings)
  User = 2,
  /// System error (subprocess, git, network, I/O)
  System = 3,
  /// Validation failure (hooks failed)
  Validation = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for actions
#[derive(Debug)]
pub enum ActionError {
  /// Settings errors
  Config(ConfigError),

  /// External command errors
  Process(ProcessError),

  /// Git operation errors
  Git(GitError),

  /// Validation errors (failed hooks)
  Validation(ValidationError),

  /// I/O errors
  Io(io::Error),

  /// The run rewrote these files
  Modified { paths: Vec<PathBuf> },

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ActionError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ActionError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ActionError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ActionError::Message { message, context, help } => ActionError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ActionError::Io(e) => ActionError::Message {
        message: format!("I/O error: {}", e),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ActionError::Config(_) => ExitCode::User,
      ActionError::Process(_) => ExitCode::System,
      ActionError::Git(_) => ExitCode::System,
      ActionError::Validation(_) => ExitCode::Validation,
      ActionError::Io(_) => ExitCode::System,
      ActionError::Modified { .. } => ExitCode::Modified,
      ActionError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ActionError::Config(e) => e.help_message(),
      ActionError::Process(e) => e.help_message(),
      ActionError::Git(e) => e.help_message(),
      ActionError::Validation(e) => e.help_message(),
      ActionError::Modified { .. } => Some("Review the changes and re-run.".to_string()),
      ActionError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }

  /// Whether this is a subprocess that ran and exited unsuccessfully
  pub fn is_command_failure(&self) -> bool {
    matches!(self, ActionError::Process(ProcessError::Failed { .. }))
  }
}

impl fmt::Display for ActionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ActionError::Config(e) => write!(f, "{}", e),
      ActionError::Process(e) => write!(f, "{}", e),
      ActionError::Git(e) => write!(f, "{}", e),
      ActionError::Validation(e) => write!(f, "{}", e),
      ActionError::Io(e) => write!(f, "I/O error: {}", e),
      ActionError::Modified { paths } => {
        let joined = paths
          .iter()
          .map(|p| format!("'{}'", p.display()))
          .collect::<Vec<_>>()
          .join(", ");
        write!(f, "Modified {} file(s): {}", paths.len(), joined)
      }
      ActionError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ActionError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ActionError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ActionError {
  fn from(err: io::Error) -> Self {
    ActionError::Io(err)
  }
}

impl From<String> for ActionError {
  fn from(msg: String) -> Self {
    ActionError::message(msg)
  }
}

impl From<&str> for ActionError {
  fn from(msg: &str) -> Self {
    ActionError::message(msg)
  }
}

impl From<toml_edit::TomlError> for ActionError {
  fn from(err: toml_edit::TomlError) -> Self {
    ActionError::message(format!("TOML parse error: {}", err))
  }
}

impl From<serde_json::Error> for ActionError {
  fn from(err: serde_json::Error) -> Self {
    ActionError::message(format!("JSON error: {}", err))
  }
}

impl From<serde_yaml::Error> for ActionError {
  fn from(err: serde_yaml::Error) -> Self {
    ActionError::message(format!("YAML error: {}", err))
  }
}

impl From<semver::Error> for ActionError {
  fn from(err: semver::Error) -> Self {
    ActionError::message(format!("Invalid version: {}", err))
  }
}

impl From<regex::Error> for ActionError {
  fn from(err: regex::Error) -> Self {
    ActionError::Config(ConfigError::InvalidPattern {
      pattern: String::new(),
      reason: err.to_string(),
    })
  }
}

impl From<glob::PatternError> for ActionError {
  fn from(err: glob::PatternError) -> Self {
    ActionError::message(format!("Glob pattern error: {}", err))
  }
}

impl From<glob::GlobError> for ActionError {
  fn from(err: glob::GlobError) -> Self {
    ActionError::message(format!("Glob error: {}", err))
  }
}

impl From<walkdir::Error> for ActionError {
  fn from(err: walkdir::Error) -> Self {
    ActionError::message(format!("Directory walk error: {}", err))
  }
}

impl From<ignore::Error> for ActionError {
  fn from(err: ignore::Error) -> Self {
    ActionError::message(format!("Directory walk error: {}", err))
  }
}

impl From<tempfile::PersistError> for ActionError {
  fn from(err: tempfile::PersistError) -> Self {
    ActionError::Io(err.error)
  }
}

impl From<ureq::Error> for ActionError {
  fn from(err: ureq::Error) -> Self {
    ActionError::message(format!("HTTP error: {}", err))
  }
}

impl From<tree_sitter::LanguageError> for ActionError {
  fn from(err: tree_sitter::LanguageError) -> Self {
    ActionError::message(format!("Python grammar error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ActionError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ActionError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<std::str::Utf8Error> for ActionError {
  fn from(err: std::str::Utf8Error) -> Self {
    ActionError::message(format!("UTF-8 error: {}", err))
  }
}

impl From<std::path::StripPrefixError> for ActionError {
  fn from(err: std::path::StripPrefixError) -> Self {
    ActionError::message(format!("Path strip prefix error: {}", err))
  }
}

/// Settings errors
#[derive(Debug)]
pub enum ConfigError {
  /// A setting that must be given was not
  Missing { setting: String },

  /// A setting has an invalid value
  Invalid { setting: String, reason: String },

  /// A user-supplied regular expression failed to compile
  InvalidPattern { pattern: String, reason: String },

  /// The action does not support this platform
  UnsupportedPlatform { expected: String, actual: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Missing { setting } => Some(format!(
        "Pass --{} or set the {} environment variable.",
        setting.replace('_', "-"),
        setting.to_uppercase()
      )),
      ConfigError::InvalidPattern { .. } => Some("Patterns use Rust `regex` syntax.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Missing { setting } => write!(f, "'{}' must be given", setting),
      ConfigError::Invalid { setting, reason } => write!(f, "Invalid '{}': {}", setting, reason),
      ConfigError::InvalidPattern { pattern, reason } => {
        write!(f, "Invalid pattern '{}': {}", pattern, reason)
      }
      ConfigError::UnsupportedPlatform { expected, actual } => {
        write!(f, "System must be '{}'; got '{}'", expected, actual)
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum ProcessError {
  /// Command could not be started
  Spawn { command: String, reason: String },

  /// Command ran and exited unsuccessfully
  Failed {
    command: String,
    code: Option<i32>,
    stderr: String,
  },
}

impl ProcessError {
  fn help_message(&self) -> Option<String> {
    match self {
      ProcessError::Spawn { command, .. } => {
        let program = command.split_whitespace().next().unwrap_or(command);
        Some(format!("Check that '{}' is installed and on PATH.", program))
      }
      ProcessError::Failed { stderr, .. } => {
        if stderr.contains("permission denied") || stderr.contains("403") {
          Some("Check your credentials and access rights.".to_string())
        } else {
          None
        }
      }
    }
  }
}

impl fmt::Display for ProcessError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProcessError::Spawn { command, reason } => {
        write!(f, "Failed to run '{}': {}", command, reason)
      }
      ProcessError::Failed { command, code, stderr } => {
        match code {
          Some(code) => write!(f, "Command '{}' failed with exit code {}", command, code)?,
          None => write!(f, "Command '{}' was terminated by a signal", command)?,
        }
        if !stderr.trim().is_empty() {
          write!(f, "\n{}", stderr.trim_end())?;
        }
        Ok(())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Path is not inside a git repository
  RepoNotFound { path: PathBuf },

  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Push was rejected
  PushFailed { remote: String, reason: String },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { .. } => Some("Run this action from inside a git repository.".to_string()),
      GitError::PushFailed { remote, .. } => Some(format!(
        "Check that '{}' exists and that the token has write access.",
        remote
      )),
      _ => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::RepoNotFound { path } => write!(f, "Not a git repository: '{}'", path.display()),
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr.trim_end())
      }
      GitError::PushFailed { remote, reason } => {
        write!(f, "Failed to push to '{}': {}", remote, reason.trim_end())
      }
    }
  }
}

/// Validation errors
#[derive(Debug)]
pub enum ValidationError {
  /// Some pre-commit hooks failed
  HooksFailed { hooks: Vec<String> },
}

impl ValidationError {
  fn help_message(&self) -> Option<String> {
    match self {
      ValidationError::HooksFailed { hooks } => Some(format!(
        "Re-run a single hook with: pre-commit run --verbose --all-files {}",
        hooks.first().map(String::as_str).unwrap_or("<hook>")
      )),
    }
  }
}

impl fmt::Display for ValidationError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ValidationError::HooksFailed { hooks } => write!(f, "Failed hook(s): {}", hooks.join(", ")),
    }
  }
}

/// Result type alias for actions
pub type ActionResult<T> = Result<T, ActionError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ActionResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ActionResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ActionError>,
{
  fn context(self, ctx: impl Into<String>) -> ActionResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ActionResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ActionError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

//! Logged subprocess execution
//!
//! Every external tool (`uv`, `pre-commit`, `sops`, `chown`, ...) goes through
//! [`Process`], which logs the command line before running it with secret
//! arguments shown as `***`.

use crate::core::config::Secret;
use crate::core::error::{ActionError, ActionResult, ProcessError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tracing::info;

#[derive(Debug, Clone)]
enum Arg {
  Plain(String),
  Secret(Secret),
}

impl Arg {
  fn redacted(&self) -> &str {
    match self {
      Arg::Plain(arg) => arg,
      Arg::Secret(_) => "***",
    }
  }

  fn exposed(&self) -> &str {
    match self {
      Arg::Plain(arg) => arg,
      Arg::Secret(secret) => secret.expose(),
    }
  }
}

/// Builder for a single subprocess invocation
#[derive(Debug, Clone)]
pub struct Process {
  program: String,
  args: Vec<Arg>,
  cwd: Option<PathBuf>,
  envs: Vec<(String, Secret)>,
  stdin: Option<Vec<u8>>,
}

impl Process {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      cwd: None,
      envs: Vec::new(),
      stdin: None,
    }
  }

  /// Prefix with `sudo` when requested
  pub fn maybe_sudo(sudo: bool, program: impl Into<String>) -> Self {
    if sudo {
      Self::new("sudo").arg(program.into())
    } else {
      Self::new(program)
    }
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(Arg::Plain(arg.into()));
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.args.extend(args.into_iter().map(|a| Arg::Plain(a.into())));
    self
  }

  pub fn path_arg(self, path: &Path) -> Self {
    self.arg(path.display().to_string())
  }

  /// An argument whose value is redacted in logs
  pub fn secret_arg(mut self, secret: &Secret) -> Self {
    self.args.push(Arg::Secret(secret.clone()));
    self
  }

  /// `--flag value` when the value is present
  pub fn opt_arg(self, flag: &str, value: Option<&str>) -> Self {
    match value {
      Some(value) => self.arg(flag).arg(value),
      None => self,
    }
  }

  /// `--flag ***` when the secret is present
  pub fn opt_secret_arg(self, flag: &str, value: Option<&Secret>) -> Self {
    match value {
      Some(secret) => self.arg(flag).secret_arg(secret),
      None => self,
    }
  }

  /// `--flag` when `enabled`
  pub fn flag(self, flag: &str, enabled: bool) -> Self {
    if enabled { self.arg(flag) } else { self }
  }

  pub fn current_dir(mut self, dir: &Path) -> Self {
    self.cwd = Some(dir.to_path_buf());
    self
  }

  /// An environment variable, never logged
  pub fn env(mut self, key: &str, value: &Secret) -> Self {
    self.envs.push((key.to_string(), value.clone()));
    self
  }

  pub fn stdin(mut self, input: impl Into<Vec<u8>>) -> Self {
    self.stdin = Some(input.into());
    self
  }

  /// Command line with secrets redacted
  pub fn display(&self) -> String {
    std::iter::once(self.program.as_str())
      .chain(self.args.iter().map(Arg::redacted))
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// Run with inherited stdout/stderr
  pub fn run(&self) -> ActionResult<()> {
    let output = self.execute(false)?;
    self.check(&output)
  }

  /// Run capturing stdout, returned trimmed of trailing whitespace
  pub fn output_string(&self) -> ActionResult<String> {
    let output = self.execute(true)?;
    self.check(&output)?;
    let stdout = String::from_utf8(output.stdout)?;
    Ok(stdout.trim_end().to_string())
  }

  fn execute(&self, capture: bool) -> ActionResult<Output> {
    info!("Running '{}'...", self.display());

    let mut cmd = Command::new(&self.program);
    cmd.args(self.args.iter().map(Arg::exposed));
    if let Some(cwd) = &self.cwd {
      cmd.current_dir(cwd);
    }
    for (key, value) in &self.envs {
      cmd.env(key, value.expose());
    }
    cmd.stdin(if self.stdin.is_some() { Stdio::piped() } else { Stdio::inherit() });
    if capture {
      cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
      cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    }

    let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
    if let Some(input) = &self.stdin
      && let Some(mut pipe) = child.stdin.take()
    {
      pipe.write_all(input)?;
    }
    child.wait_with_output().map_err(|e| self.spawn_error(e))
  }

  fn check(&self, output: &Output) -> ActionResult<()> {
    if output.status.success() {
      return Ok(());
    }
    Err(ActionError::Process(ProcessError::Failed {
      command: self.display(),
      code: output.status.code(),
      stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }))
  }

  fn spawn_error(&self, err: io::Error) -> ActionError {
    ActionError::Process(ProcessError::Spawn {
      command: self.display(),
      reason: err.to_string(),
    })
  }
}

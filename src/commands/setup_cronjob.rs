//! `setup-cronjob`: install a cron job with log rotation (Linux)

use crate::core::config::{log_finish, log_start, parse_key_value};
use crate::core::error::{ActionError, ActionResult, ConfigError};
use crate::core::process::Process;
use crate::files::write_text;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";
const TIMESTAMP: &str = r"$(date '+\%Y-\%m-\%d \%H:\%M:\%S') | $$";

#[derive(Debug, Clone, Args)]
pub struct SetupCronjobArgs {
  /// Job name, used for the config, lock and log file names
  #[arg(env = "NAME")]
  pub name: String,

  /// Command to run
  #[arg(env = "COMMAND")]
  pub command: String,

  /// Arguments passed to the command
  #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
  pub args: Vec<String>,

  /// Cron schedule
  #[arg(long, env = "SCHEDULE", default_value = "* * * * *")]
  pub schedule: String,

  /// User the job runs as (defaults to the current user)
  #[arg(long, env = "USER")]
  pub user: Option<String>,

  /// Timeout in seconds
  #[arg(long, env = "TIMEOUT", default_value_t = 60)]
  pub timeout: u64,

  /// Seconds between the timeout signal and SIGKILL
  #[arg(long, env = "KILL_AFTER", default_value_t = 10)]
  pub kill_after: u64,

  /// Directories prepended to PATH
  #[arg(long, env = "PREPEND_PATH", value_delimiter = ':')]
  pub prepend_path: Vec<PathBuf>,

  /// Extra environment variables (KEY=VALUE)
  #[arg(long = "env", value_parser = parse_key_value)]
  pub env_vars: Vec<(String, String)>,

  /// Write through `sudo`
  #[arg(long, env = "SUDO")]
  pub sudo: bool,

  /// Rotated logs to keep
  #[arg(long, env = "LOGS_KEEP", default_value_t = 7)]
  pub logs_keep: u32,

  /// Print the files instead of installing them
  #[arg(long)]
  pub dry_run: bool,
}

pub fn run_setup_cronjob(args: SetupCronjobArgs) -> ActionResult<()> {
  log_start("setup-cronjob", &args);
  let crontab = render_crontab(&args)?;
  let logrotate = render_logrotate(&args.name, args.logs_keep);
  let cron_path = PathBuf::from("/etc/cron.d").join(&args.name);
  let logrotate_path = PathBuf::from("/etc/logrotate.d").join(&args.name);

  if args.dry_run {
    println!("# {}\n{}", cron_path.display(), crontab);
    println!("# {}\n{}", logrotate_path.display(), logrotate);
    return Ok(());
  }

  if std::env::consts::OS != "linux" {
    return Err(ActionError::Config(ConfigError::UnsupportedPlatform {
      expected: "linux".to_string(),
      actual: std::env::consts::OS.to_string(),
    }));
  }

  info!("Setting up cronjob...");
  install(&cron_path, &crontab, args.sudo)?;
  install(&logrotate_path, &logrotate, args.sudo)?;
  info!("Finished setting up cronjob");

  log_finish("setup-cronjob");
  Ok(())
}

fn install(path: &Path, text: &str, sudo: bool) -> ActionResult<()> {
  if sudo {
    Process::new("sudo").arg("tee").path_arg(path).stdin(text).output_string()?;
  } else {
    write_text(path, text)?;
  }
  Process::maybe_sudo(sudo, "chown").arg("root:root").path_arg(path).run()?;
  Process::maybe_sudo(sudo, "chmod").arg("u=rw,g=r,o=r").path_arg(path).run()
}

fn render_crontab(args: &SetupCronjobArgs) -> ActionResult<String> {
  if args.name.trim().is_empty() || args.name.contains('/') {
    return Err(ActionError::Config(ConfigError::Invalid {
      setting: "name".to_string(),
      reason: format!("'{}' is not a valid file name", args.name),
    }));
  }
  let user = match &args.user {
    Some(user) if !user.trim().is_empty() => user.clone(),
    _ => current_user(),
  };

  let prepend: String = args.prepend_path.iter().map(|p| format!("{}:", p.display())).collect();
  let mut header = format!("PATH={}{}", prepend, DEFAULT_PATH);
  for (key, value) in &args.env_vars {
    header.push_str(&format!("\n{}={}", key, value));
  }

  let mut command = args.command.clone();
  if !args.args.is_empty() {
    command.push(' ');
    command.push_str(&args.args.join(" "));
  }
  let name = &args.name;
  let job = format!(
    "(echo \"[{ts}] Starting '{name}'...\"; flock --nonblock --verbose /tmp/cron-{name}.lock \
     timeout --kill-after={kill}s --verbose {timeout}s {command}; \
     echo \"[{ts}] Finished '{name}' with exit code $?\") 2>&1 | {tee}tee -a /var/log/{name}.log",
    ts = TIMESTAMP,
    name = name,
    kill = args.kill_after,
    timeout = args.timeout,
    command = command,
    tee = if args.sudo { "sudo " } else { "" },
  );
  Ok(format!("{}\n\n{} {} {}\n", header, args.schedule, user, job))
}

fn render_logrotate(name: &str, keep: u32) -> String {
  format!(
    "/var/log/{name}.log {{\n  daily\n  rotate {keep}\n  missingok\n  notifempty\n  compress\n  delaycompress\n  copytruncate\n}}\n"
  )
}

fn current_user() -> String {
  std::env::var("USER")
    .or_else(|_| std::env::var("LOGNAME"))
    .unwrap_or_else(|_| "root".to_string())
}

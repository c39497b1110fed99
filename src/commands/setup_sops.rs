//! `setup-sops`: install the latest `sops` release binary

use crate::core::config::{Secret, log_finish, log_start, non_empty_secret, require};
use crate::core::error::{ActionError, ActionResult, ConfigError, ResultExt};
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

const LATEST_RELEASE_URL: &str = "https://api.github.com/repos/getsops/sops/releases/latest";
const USER_AGENT: &str = concat!("actions/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Args)]
pub struct SetupSopsArgs {
  /// GitHub token
  #[arg(long, env = "TOKEN")]
  pub token: Option<Secret>,

  /// System name (Linux or Darwin); defaults to this machine's
  #[arg(long, env = "SYSTEM")]
  pub system: Option<String>,

  /// Machine type (x86_64, aarch64, ...); defaults to this machine's
  #[arg(long, env = "MACHINE")]
  pub machine: Option<String>,

  /// Install path
  #[arg(long, env = "PATH_BINARY", default_value = "/usr/local/bin/sops")]
  pub path_binary: PathBuf,

  /// Request timeout in seconds
  #[arg(long, env = "TIMEOUT", default_value_t = 60)]
  pub timeout: u64,
}

#[derive(Debug, Deserialize)]
struct Release {
  tag_name: String,
  assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct Asset {
  name: String,
  browser_download_url: String,
}

pub fn run_setup_sops(args: SetupSopsArgs) -> ActionResult<()> {
  log_start("setup-sops", &args);
  let token = require(non_empty_secret(args.token.clone()), "token")?;
  let system = system_name(args.system.as_deref())?;
  let arch = arch_name(args.machine.as_deref().unwrap_or(std::env::consts::ARCH));

  let agent = ureq::AgentBuilder::new().timeout(Duration::from_secs(args.timeout)).build();
  let auth = format!("Bearer {}", token.expose());

  let release: Release = agent
    .get(LATEST_RELEASE_URL)
    .set("User-Agent", USER_AGENT)
    .set("Authorization", &auth)
    .call()?
    .into_json()
    .context("Failed to parse release info")?;
  info!("Latest sops release is '{}'", release.tag_name);

  let asset = select_asset(&release.assets, &system, &arch)?;
  info!("Downloading '{}'...", asset.name);
  let response = agent
    .get(&asset.browser_download_url)
    .set("User-Agent", USER_AGENT)
    .set("Authorization", &auth)
    .call()?;

  install(response.into_reader(), &args.path_binary)?;
  info!("Installed sops to '{}'", args.path_binary.display());
  log_finish("setup-sops");
  Ok(())
}

/// Lowercase system name as used in asset names
fn system_name(system: Option<&str>) -> ActionResult<String> {
  let system = match system.map(str::trim).filter(|s| !s.is_empty()) {
    Some(system) => system.to_lowercase(),
    None => match std::env::consts::OS {
      "macos" => "darwin".to_string(),
      other => other.to_string(),
    },
  };
  match system.as_str() {
    "linux" | "darwin" => Ok(system),
    _ => Err(ActionError::Config(ConfigError::UnsupportedPlatform {
      expected: "Darwin' or 'Linux".to_string(),
      actual: system,
    })),
  }
}

/// Architecture name as used in asset names
fn arch_name(machine: &str) -> String {
  match machine.trim().to_lowercase().as_str() {
    "x86_64" | "amd64" => "amd64".to_string(),
    "aarch64" | "arm64" => "arm64".to_string(),
    other => other.to_string(),
  }
}

/// The one binary asset named `*.<system>.<arch>`
fn select_asset<'a>(assets: &'a [Asset], system: &str, arch: &str) -> ActionResult<&'a Asset> {
  let suffix = format!(".{}.{}", system, arch);
  let matches: Vec<&Asset> = assets.iter().filter(|a| a.name.to_lowercase().ends_with(&suffix)).collect();
  match matches.as_slice() {
    [asset] => Ok(asset),
    [] => Err(ActionError::message(format!("No sops release asset ends with '{}'", suffix))),
    many => Err(ActionError::message(format!(
      "Expected one sops release asset ending with '{}'; got {}",
      suffix,
      many.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
    ))),
  }
}

/// Write the downloaded binary next to `path`, mark it executable, then move it in place
fn install(mut reader: impl io::Read, path: &Path) -> ActionResult<()> {
  let parent = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
    _ => PathBuf::from("."),
  };
  fs::create_dir_all(&parent).with_context(|| format!("Failed to create '{}'", parent.display()))?;

  let mut tmp = tempfile::NamedTempFile::new_in(&parent)
    .with_context(|| format!("Failed to create a temporary file in '{}'", parent.display()))?;
  io::copy(&mut reader, &mut tmp).context("Failed to download sops")?;
  tmp.flush()?;

  #[cfg(unix)]
  {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o755))?;
  }

  tmp.persist(path)?;
  Ok(())
}

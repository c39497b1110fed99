//! `conformalize-repo`: bring a repository's configuration into shape
//!
//! - **workflows**: `pull-request.yaml` and `push.yaml` for GitHub or Gitea
//! - **configs**: `.coveragerc.toml` and `pytest.toml`
//!
//! The README heading and the `# requires-python` header of scripts are
//! handled here. Every edit is idempotent; a second run with the same flags
//! changes nothing.

pub mod configs;
pub mod workflows;

use crate::core::config::{Secret, log_finish, log_start, non_empty};
use crate::core::error::{ActionError, ActionResult, ConfigError, ResultExt};
use crate::files::{Modifications, edit_text};
use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};
use clap::Args;
use ignore::WalkBuilder;
use regex::{NoExpand, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Newest Python minor version targeted by CI
pub const MAX_PYTHON_VERSION: &str = "3.14";

static REQUIRES_PYTHON: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r#"# requires-python = ">=\d+\.\d+""#).unwrap());

#[derive(Debug, Clone, Args)]
pub struct ConformalizeRepoArgs {
  // ==========================================================================
  // CI
  // ==========================================================================
  /// Write workflows under `.gitea/` instead of `.github/`
  #[arg(long, env = "CI__GITEA")]
  pub ci_gitea: bool,

  /// Update CA certificates before running each action
  #[arg(long, env = "CI__CERTIFICATES")]
  pub ci_certificates: bool,

  /// Token used to check out the repository
  #[arg(long, env = "CI__TOKEN_CHECKOUT")]
  pub ci_token_checkout: Option<Secret>,

  /// Token used for GitHub API calls
  #[arg(long, env = "CI__TOKEN_GITHUB")]
  pub ci_token_github: Option<Secret>,

  /// Run pre-commit hooks on pull requests
  #[arg(long, env = "CI__PULL_REQUEST__PRE_COMMIT")]
  pub ci_pull_request_pre_commit: bool,

  /// Submodule checkout mode for the pre-commit job
  #[arg(long, env = "CI__PULL_REQUEST__PRE_COMMIT__SUBMODULES")]
  pub ci_pull_request_pre_commit_submodules: Option<String>,

  /// Run pyright on pull requests
  #[arg(long, env = "CI__PULL_REQUEST__PYRIGHT")]
  pub ci_pull_request_pyright: bool,

  /// Run pytest on macOS
  #[arg(long, env = "CI__PULL_REQUEST__PYTEST__MACOS")]
  pub ci_pull_request_pytest_macos: bool,

  /// Run pytest on Ubuntu
  #[arg(long, env = "CI__PULL_REQUEST__PYTEST__UBUNTU")]
  pub ci_pull_request_pytest_ubuntu: bool,

  /// Run pytest on Windows
  #[arg(long, env = "CI__PULL_REQUEST__PYTEST__WINDOWS")]
  pub ci_pull_request_pytest_windows: bool,

  /// Run pytest on every Python version up to the newest
  #[arg(long, env = "CI__PULL_REQUEST__PYTEST__ALL_VERSIONS")]
  pub ci_pull_request_pytest_all_versions: bool,

  /// age key for decrypting test secrets
  #[arg(long, env = "CI__PULL_REQUEST__PYTEST__SOPS_AGE_KEY")]
  pub ci_pull_request_pytest_sops_age_key: Option<Secret>,

  /// Run ruff on pull requests
  #[arg(long, env = "CI__PULL_REQUEST__RUFF")]
  pub ci_pull_request_ruff: bool,

  /// Publish to PyPI with trusted publishing on push
  #[arg(long, env = "CI__PUSH__PUBLISH__GITHUB")]
  pub ci_push_publish_github: bool,

  /// Publish to the primary index on push
  #[arg(long, env = "CI__PUSH__PUBLISH__PRIMARY")]
  pub ci_push_publish_primary: bool,

  #[arg(long, env = "CI__PUSH__PUBLISH__PRIMARY__JOB_NAME", default_value = "primary")]
  pub ci_push_publish_primary_job_name: String,

  #[arg(long, env = "CI__PUSH__PUBLISH__PRIMARY__USERNAME")]
  pub ci_push_publish_primary_username: Option<String>,

  #[arg(long, env = "CI__PUSH__PUBLISH__PRIMARY__PASSWORD")]
  pub ci_push_publish_primary_password: Option<Secret>,

  #[arg(long, env = "CI__PUSH__PUBLISH__PRIMARY__PUBLISH_URL")]
  pub ci_push_publish_primary_publish_url: Option<String>,

  /// Publish to the secondary index on push
  #[arg(long, env = "CI__PUSH__PUBLISH__SECONDARY")]
  pub ci_push_publish_secondary: bool,

  #[arg(long, env = "CI__PUSH__PUBLISH__SECONDARY__JOB_NAME", default_value = "secondary")]
  pub ci_push_publish_secondary_job_name: String,

  #[arg(long, env = "CI__PUSH__PUBLISH__SECONDARY__USERNAME")]
  pub ci_push_publish_secondary_username: Option<String>,

  #[arg(long, env = "CI__PUSH__PUBLISH__SECONDARY__PASSWORD")]
  pub ci_push_publish_secondary_password: Option<Secret>,

  #[arg(long, env = "CI__PUSH__PUBLISH__SECONDARY__PUBLISH_URL")]
  pub ci_push_publish_secondary_publish_url: Option<String>,

  /// Tag each pushed commit with its version
  #[arg(long, env = "CI__PUSH__TAG")]
  pub ci_push_tag: bool,

  /// Also move the major, major.minor and latest tags
  #[arg(long, env = "CI__PUSH__TAG__ALL")]
  pub ci_push_tag_all: bool,

  // ==========================================================================
  // Testing
  // ==========================================================================
  /// Write `.coveragerc.toml` and measure coverage in pytest
  #[arg(long, env = "COVERAGE")]
  pub coverage: bool,

  /// Write `pytest.toml`
  #[arg(long, env = "PYTEST")]
  pub pytest: bool,

  #[arg(long, env = "PYTEST__ASYNCIO")]
  pub pytest_asyncio: bool,

  #[arg(long, env = "PYTEST__IGNORE_WARNINGS")]
  pub pytest_ignore_warnings: bool,

  /// Per-test timeout in seconds (also bounds the CI job)
  #[arg(long, env = "PYTEST__TIMEOUT")]
  pub pytest_timeout: Option<u64>,

  // ==========================================================================
  // Project
  // ==========================================================================
  /// Distribution name
  #[arg(long, env = "PACKAGE_NAME")]
  pub package_name: Option<String>,

  /// Import name, if not the distribution name with `_` for `-`
  #[arg(long, env = "PYTHON_PACKAGE_NAME")]
  pub python_package_name: Option<String>,

  /// Oldest supported Python version
  #[arg(long, env = "PYTHON_VERSION", default_value = MAX_PYTHON_VERSION)]
  pub python_version: String,

  /// Add the name and description to `README.md`
  #[arg(long, env = "README")]
  pub readme: bool,

  #[arg(long, env = "REPO_NAME")]
  pub repo_name: Option<String>,

  #[arg(long, env = "DESCRIPTION")]
  pub description: Option<String>,

  /// Script to test instead of a package
  #[arg(long, env = "SCRIPT")]
  pub script: Option<String>,

  /// Use the platform TLS roots in uv
  #[arg(long, env = "UV__NATIVE_TLS")]
  pub uv_native_tls: bool,
}

pub fn run_conformalize_repo(args: ConformalizeRepoArgs) -> ActionResult<()> {
  log_start("conformalize-repo", &args);
  let root = std::env::current_dir().context("Failed to get current directory")?;
  let mut modifications = Modifications::new();
  conformalize(&root, &args, &mut modifications)?;
  modifications.finish()?;
  log_finish("conformalize-repo");
  Ok(())
}

/// Apply every enabled edit under `root`
pub fn conformalize(root: &Path, args: &ConformalizeRepoArgs, modifications: &mut Modifications) -> ActionResult<()> {
  replace_requires_python(root, &args.python_version, modifications)?;
  if workflows::wants_pull_request(args) {
    workflows::add_pull_request_yaml(root, args, modifications)?;
  }
  if workflows::wants_push(args) {
    workflows::add_push_yaml(root, args, modifications)?;
  }
  if args.coverage {
    configs::add_coveragerc(root, modifications)?;
  }
  if configs::wants_pytest(args) {
    configs::add_pytest(root, args, modifications)?;
  }
  if args.readme {
    add_readme(root, args, modifications)?;
  }
  Ok(())
}

/// Daily schedule at a time derived from the repository name
///
/// Spreads scheduled runs of many repositories across the day.
pub fn cron_schedule(repo_name: Option<&str>) -> String {
  let Some(name) = repo_name.filter(|n| !n.trim().is_empty()) else {
    return "0 0 * * *".to_string();
  };
  let digest = Blake2b::<U8>::digest(name.as_bytes());
  let mut bytes = [0u8; 8];
  bytes.copy_from_slice(&digest);
  let value = u64::from_be_bytes(bytes);
  format!("{} {} * * *", value % 60, (value / 60) % 24)
}

fn major_minor(version: &str) -> ActionResult<(u32, u32)> {
  let invalid = || {
    ActionError::Config(ConfigError::Invalid {
      setting: "python-version".to_string(),
      reason: format!("Expected 'MAJOR.MINOR'; got '{}'", version),
    })
  };
  let (major, minor) = version.trim().split_once('.').ok_or_else(invalid)?;
  Ok((
    major.parse().map_err(|_| invalid())?,
    minor.parse().map_err(|_| invalid())?,
  ))
}

/// Every minor version from `version` up to [`MAX_PYTHON_VERSION`]
pub fn python_versions(version: &str) -> ActionResult<Vec<String>> {
  let (major, minor) = major_minor(version)?;
  let (max_major, max_minor) = major_minor(MAX_PYTHON_VERSION)?;
  let invalid = |reason: String| {
    ActionError::Config(ConfigError::Invalid {
      setting: "python-version".to_string(),
      reason,
    })
  };
  if major != max_major {
    return Err(invalid(format!(
      "Major versions must be equal; got {} and {}",
      major, max_major
    )));
  }
  if minor > max_minor {
    return Err(invalid(format!("Minor version must be at most {}; got {}", max_minor, minor)));
  }
  Ok((minor..=max_minor).map(|i| format!("{}.{}", major, i)).collect())
}

/// Point every `# requires-python = ">=X.Y"` script header at `version`
///
/// Python files are found as `rg --type=py` finds them: hidden and ignored
/// paths are skipped. Files that are not UTF-8 are left alone.
pub fn replace_requires_python(root: &Path, version: &str, modifications: &mut Modifications) -> ActionResult<()> {
  let header = format!(r#"# requires-python = ">={}""#, version);
  for entry in WalkBuilder::new(root).require_git(false).build() {
    let entry = entry?;
    let path = entry.path();
    if !entry.file_type().is_some_and(|t| t.is_file()) || path.extension().and_then(|e| e.to_str()) != Some("py") {
      continue;
    }
    let bytes = fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let Ok(text) = String::from_utf8(bytes) else {
      debug!("Skipping '{}': not UTF-8", path.display());
      continue;
    };
    let updated = REQUIRES_PYTHON.replace_all(&text, NoExpand(&header));
    if updated == text {
      continue;
    }
    let updated = updated.into_owned();
    edit_text(path, modifications, |_| Ok(updated))?;
  }
  Ok(())
}

/// `# \`name\`` heading and description, appended unless already present
fn readme_text(args: &ConformalizeRepoArgs) -> String {
  let mut parts = Vec::new();
  if let Some(name) = non_empty(args.repo_name.clone()) {
    parts.push(format!("# `{}`", name));
  }
  if let Some(description) = non_empty(args.description.clone()) {
    parts.push(description);
  }
  parts.join("\n\n")
}

fn add_readme(root: &Path, args: &ConformalizeRepoArgs, modifications: &mut Modifications) -> ActionResult<()> {
  let text = readme_text(args);
  edit_text(&root.join("README.md"), modifications, |existing| {
    if existing.contains(&text) {
      Ok(existing.to_string())
    } else {
      Ok(format!("{}\n\n{}", existing.trim_end(), text))
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;
  use pretty_assertions::assert_eq;
  use std::fs;
  use tempfile::TempDir;

  #[derive(Parser)]
  struct Cli {
    #[command(flatten)]
    args: ConformalizeRepoArgs,
  }

  pub(crate) fn parse_args(flags: &[&str]) -> ConformalizeRepoArgs {
    let argv = std::iter::once("conformalize-repo").chain(flags.iter().copied());
    Cli::try_parse_from(argv).unwrap().args
  }

  #[test]
  fn test_cron_schedule() {
    assert_eq!(cron_schedule(None), "0 0 * * *");
    assert_eq!(cron_schedule(Some("")), "0 0 * * *");
    assert_eq!(cron_schedule(Some("actions")), "9 18 * * *");
    assert_eq!(cron_schedule(Some("my-repo")), "24 0 * * *");
  }

  #[test]
  fn test_python_versions() {
    assert_eq!(python_versions("3.12").unwrap(), vec!["3.12", "3.13", "3.14"]);
    assert_eq!(python_versions("3.14").unwrap(), vec!["3.14"]);
    assert!(python_versions("2.7").is_err());
    assert!(python_versions("3.15").is_err());
    assert!(python_versions("3").is_err());
  }

  #[test]
  fn test_replace_requires_python() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("run.py");
    let header = "# /// script\n# requires-python = \">=3.10\"\n# ///\n";
    fs::write(&script, header).unwrap();
    fs::create_dir_all(dir.path().join(".venv")).unwrap();
    let hidden = dir.path().join(".venv/lib.py");
    fs::write(&hidden, header).unwrap();

    let mut mods = Modifications::new();
    replace_requires_python(dir.path(), "3.13", &mut mods).unwrap();
    assert_eq!(mods.paths(), &[script.clone()]);
    assert_eq!(
      fs::read_to_string(&script).unwrap(),
      "# /// script\n# requires-python = \">=3.13\"\n# ///\n"
    );
    assert_eq!(fs::read_to_string(&hidden).unwrap(), header);

    let mut mods = Modifications::new();
    replace_requires_python(dir.path(), "3.13", &mut mods).unwrap();
    assert!(mods.is_empty());
  }

  #[test]
  fn test_replace_requires_python_skips_gitignored() {
    let dir = TempDir::new().unwrap();
    let header = "# /// script\n# requires-python = \">=3.10\"\n# ///\n";
    fs::write(dir.path().join(".gitignore"), "venv/\n").unwrap();
    fs::create_dir_all(dir.path().join("venv/lib")).unwrap();
    let ignored = dir.path().join("venv/lib/tool.py");
    fs::write(&ignored, header).unwrap();
    let script = dir.path().join("run.py");
    fs::write(&script, header).unwrap();

    let mut mods = Modifications::new();
    replace_requires_python(dir.path(), "3.13", &mut mods).unwrap();
    assert_eq!(mods.paths(), &[script]);
    assert_eq!(fs::read_to_string(&ignored).unwrap(), header);
  }

  #[test]
  fn test_replace_requires_python_skips_non_utf8() {
    let dir = TempDir::new().unwrap();
    let latin1 = dir.path().join("latin1.py");
    let bytes = b"# requires-python = \">=3.10\"\nname = '\xe9t\xe9'\n".to_vec();
    fs::write(&latin1, &bytes).unwrap();
    let script = dir.path().join("run.py");
    fs::write(&script, "# requires-python = \">=3.10\"\n").unwrap();

    let mut mods = Modifications::new();
    replace_requires_python(dir.path(), "3.13", &mut mods).unwrap();
    assert_eq!(mods.paths(), &[script.clone()]);
    assert_eq!(fs::read(&latin1).unwrap(), bytes);
    assert_eq!(fs::read_to_string(&script).unwrap(), "# requires-python = \">=3.13\"\n");
  }

  #[test]
  fn test_add_readme() {
    let dir = TempDir::new().unwrap();
    let args = parse_args(&["--readme", "--repo-name", "demo", "--description", "A demo."]);

    let mut mods = Modifications::new();
    add_readme(dir.path(), &args, &mut mods).unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(
      fs::read_to_string(dir.path().join("README.md")).unwrap(),
      "# `demo`\n\nA demo.\n"
    );

    let mut mods = Modifications::new();
    add_readme(dir.path(), &args, &mut mods).unwrap();
    assert!(mods.is_empty());
  }

  #[test]
  fn test_add_readme_appends() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.md");
    fs::write(&path, "Some notes.\n").unwrap();
    let args = parse_args(&["--readme", "--repo-name", "demo"]);
    add_readme(dir.path(), &args, &mut Modifications::new()).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "Some notes.\n\n# `demo`\n");
  }

  #[test]
  fn test_conformalize_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let args = parse_args(&[
      "--ci-pull-request-pre-commit",
      "--ci-pull-request-pytest-ubuntu",
      "--ci-pull-request-pytest-all-versions",
      "--ci-push-tag-all",
      "--ci-push-publish-primary-username",
      "user",
      "--coverage",
      "--pytest",
      "--python-version",
      "3.13",
      "--repo-name",
      "demo",
    ]);

    let mut mods = Modifications::new();
    conformalize(dir.path(), &args, &mut mods).unwrap();
    assert_eq!(mods.len(), 4);

    let mut mods = Modifications::new();
    conformalize(dir.path(), &args, &mut mods).unwrap();
    assert!(mods.is_empty());
  }

  #[test]
  fn test_pull_request_yaml() {
    let dir = TempDir::new().unwrap();
    let args = parse_args(&[
      "--ci-pull-request-pre-commit",
      "--ci-pull-request-pytest-macos",
      "--ci-pull-request-pytest-windows",
      "--ci-pull-request-pytest-all-versions",
      "--ci-certificates",
      "--ci-token-github",
      "ghp_x",
      "--pytest-timeout",
      "300",
      "--python-version",
      "3.13",
      "--repo-name",
      "actions",
    ]);
    conformalize(dir.path(), &args, &mut Modifications::new()).unwrap();

    let text = fs::read_to_string(dir.path().join(".github/workflows/pull-request.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    assert_eq!(doc["name"], "pull-request");
    assert_eq!(doc["on"]["schedule"][0]["cron"], "9 18 * * *");

    let pre_commit = &doc["jobs"]["pre-commit"]["steps"];
    assert_eq!(pre_commit[0]["run"], "sudo update-ca-certificates");
    assert_eq!(pre_commit[1]["if"], "github.event_name == 'pull_request'");
    assert_eq!(pre_commit[1]["with"]["token-github"], "ghp_x");
    assert_eq!(pre_commit[1]["with"]["sleep"], 1);

    let pytest = &doc["jobs"]["pytest"];
    assert_eq!(pytest["timeout-minutes"], 5);
    let matrix = &pytest["strategy"]["matrix"];
    assert_eq!(
      matrix["os"],
      serde_yaml::from_str::<serde_yaml::Value>("[macos-latest, windows-latest]").unwrap()
    );
    assert_eq!(
      matrix["python-version"],
      serde_yaml::from_str::<serde_yaml::Value>("['3.13', '3.14']").unwrap()
    );
    assert!(doc["jobs"].get("ruff").is_none());
  }

  #[test]
  fn test_push_yaml_gitea() {
    let dir = TempDir::new().unwrap();
    let args = parse_args(&[
      "--ci-gitea",
      "--ci-push-publish-primary",
      "--ci-push-publish-primary-job-name",
      "nexus",
      "--ci-push-publish-primary-password",
      "pw",
      "--ci-push-tag",
    ]);
    conformalize(dir.path(), &args, &mut Modifications::new()).unwrap();

    let text = fs::read_to_string(dir.path().join(".gitea/workflows/push.yaml")).unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&text).unwrap();
    let publish = &doc["jobs"]["publish-nexus"]["steps"][0];
    assert_eq!(publish["uses"], "dycw/action-publish-package@latest");
    assert_eq!(publish["with"]["password"], "pw");
    assert!(publish["with"].get("username").is_none());

    let tag = &doc["jobs"]["tag"]["steps"][0];
    assert_eq!(tag["name"], "Tag a commit");
    assert!(tag.get("with").is_none());
    assert!(!dir.path().join(".github").exists());
  }
}

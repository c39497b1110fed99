//! CI workflow files (`pull-request.yaml`, `push.yaml`)
//!
//! Steps are matched by their `uses` (or `run`) value, so changing a setting
//! updates the existing step rather than appending another one.

use super::{ConformalizeRepoArgs, cron_schedule, python_versions};
use crate::core::config::{Secret, non_empty, non_empty_secret};
use crate::core::error::{ActionError, ActionResult};
use crate::files::yaml::{ensure_contains, get_mapping, get_sequence, is_partial, mapping, root_mapping, set};
use crate::files::{Modifications, YamlFormat, edit_document};
use serde_yaml::{Mapping, Sequence, Value};
use std::path::{Path, PathBuf};

const UBUNTU: &str = "ubuntu-latest";
const CERTIFICATES_NAME: &str = "Update CA certificates";
const CERTIFICATES_RUN: &str = "sudo update-ca-certificates";

/// `.github/workflows/<file>` or `.gitea/workflows/<file>`
pub fn workflow_path(root: &Path, gitea: bool, file: &str) -> PathBuf {
  let host = if gitea { ".gitea" } else { ".github" };
  root.join(host).join("workflows").join(file)
}

/// A workflow step calling one of the published actions
struct ActionStep {
  condition: Option<String>,
  name: &'static str,
  uses: &'static str,
  with: Mapping,
}

impl ActionStep {
  fn new(name: &'static str, uses: &'static str) -> Self {
    Self {
      condition: None,
      name,
      uses,
      with: Mapping::new(),
    }
  }

  /// Tokens for checkout and for GitHub API calls
  fn tokens(self, args: &ConformalizeRepoArgs) -> Self {
    self
      .secret("token-checkout", args.ci_token_checkout.as_ref())
      .secret("token-github", args.ci_token_github.as_ref())
  }

  fn item(mut self, key: &str, value: Option<impl Into<Value>>) -> Self {
    if let Some(value) = value {
      self.with.insert(Value::from(key), value.into());
    }
    self
  }

  fn text(self, key: &str, value: Option<&String>) -> Self {
    self.item(key, non_empty(value.cloned()))
  }

  fn secret(self, key: &str, value: Option<&Secret>) -> Self {
    self.item(key, non_empty_secret(value.cloned()).map(|s| s.expose().to_string()))
  }

  fn flag(self, key: &str, enabled: bool) -> Self {
    self.item(key, enabled.then_some(true))
  }

  fn to_mapping(&self) -> Mapping {
    let mut map = Mapping::new();
    if let Some(condition) = &self.condition {
      set(&mut map, "if", condition.as_str());
    }
    set(&mut map, "name", self.name);
    set(&mut map, "uses", self.uses);
    if !self.with.is_empty() {
      set(&mut map, "with", self.with.clone());
    }
    map
  }
}

/// Update the step with the same `uses`, or append a new one
fn upsert_action(steps: &mut Sequence, step: &ActionStep) -> ActionResult<()> {
  let partial = mapping([("uses", step.uses)]);
  let Some(existing) = steps.iter_mut().find(|s| is_partial(s, &partial)) else {
    steps.push(Value::Mapping(step.to_mapping()));
    return Ok(());
  };
  let existing = existing
    .as_mapping_mut()
    .ok_or_else(|| ActionError::message("Expected a mapping"))?;
  if let Some(condition) = &step.condition {
    set(existing, "if", condition.as_str());
  }
  set(existing, "name", step.name);
  if step.with.is_empty() {
    existing.remove("with");
  } else {
    set(existing, "with", step.with.clone());
  }
  Ok(())
}

/// Put the certificates step first unless it is already present
fn ensure_certificates(steps: &mut Sequence) {
  let partial = mapping([("run", CERTIFICATES_RUN)]);
  if !steps.iter().any(|s| is_partial(s, &partial)) {
    steps.insert(0, Value::Mapping(mapping([("name", CERTIFICATES_NAME), ("run", CERTIFICATES_RUN)])));
  }
}

/// A job running on Ubuntu with the given action (and optional certificates step)
fn action_job(jobs: &mut Mapping, job: &str, step: &ActionStep, certificates: bool) -> ActionResult<()> {
  let job = get_mapping(jobs, job)?;
  set(job, "runs-on", UBUNTU);
  let steps = get_sequence(job, "steps")?;
  if certificates {
    ensure_certificates(steps);
  }
  upsert_action(steps, step)
}

pub fn wants_pull_request(args: &ConformalizeRepoArgs) -> bool {
  args.ci_pull_request_pre_commit
    || args.ci_pull_request_pyright
    || args.ci_pull_request_pytest_macos
    || args.ci_pull_request_pytest_ubuntu
    || args.ci_pull_request_pytest_windows
    || args.ci_pull_request_ruff
}

/// A package index published to from `push.yaml`
struct Publisher<'a> {
  job_name: &'a str,
  enabled: bool,
  username: Option<String>,
  password: Option<Secret>,
  publish_url: Option<String>,
}

impl Publisher<'_> {
  /// Enabled explicitly or implied by any of its settings
  fn wanted(&self) -> bool {
    self.enabled || self.username.is_some() || self.password.is_some() || self.publish_url.is_some()
  }
}

fn publishers(args: &ConformalizeRepoArgs) -> [Publisher<'_>; 2] {
  [
    Publisher {
      job_name: &args.ci_push_publish_primary_job_name,
      enabled: args.ci_push_publish_primary,
      username: non_empty(args.ci_push_publish_primary_username.clone()),
      password: non_empty_secret(args.ci_push_publish_primary_password.clone()),
      publish_url: non_empty(args.ci_push_publish_primary_publish_url.clone()),
    },
    Publisher {
      job_name: &args.ci_push_publish_secondary_job_name,
      enabled: args.ci_push_publish_secondary,
      username: non_empty(args.ci_push_publish_secondary_username.clone()),
      password: non_empty_secret(args.ci_push_publish_secondary_password.clone()),
      publish_url: non_empty(args.ci_push_publish_secondary_publish_url.clone()),
    },
  ]
}

pub fn wants_push(args: &ConformalizeRepoArgs) -> bool {
  args.ci_push_publish_github
    || publishers(args).iter().any(Publisher::wanted)
    || args.ci_push_tag
    || args.ci_push_tag_all
}

pub fn add_pull_request_yaml(root: &Path, args: &ConformalizeRepoArgs, mods: &mut Modifications) -> ActionResult<()> {
  let path = workflow_path(root, args.ci_gitea, "pull-request.yaml");
  edit_document::<YamlFormat, _>(&path, mods, |doc| {
    let map = root_mapping(doc)?;
    set(map, "name", "pull-request");
    let on = get_mapping(map, "on")?;
    let pull_request = get_mapping(on, "pull_request")?;
    ensure_contains(get_sequence(pull_request, "branches")?, ["master"]);
    let schedule = get_sequence(on, "schedule")?;
    ensure_contains(
      schedule,
      [Value::Mapping(mapping([("cron", cron_schedule(args.repo_name.as_deref()))]))],
    );

    let jobs = get_mapping(map, "jobs")?;
    let certificates = args.ci_certificates;
    if args.ci_pull_request_pre_commit {
      let runner = if args.ci_gitea { "gitea" } else { "github" };
      let mut step = ActionStep::new("Run 'pre-commit' hooks", "dycw/action-run-hooks@latest")
        .tokens(args)
        .text("submodules", args.ci_pull_request_pre_commit_submodules.as_ref())
        .item(
          "repos",
          Some(Value::Sequence(vec![
            Value::from("dycw/actions"),
            Value::from("pre-commit/pre-commit-hooks"),
          ])),
        )
        .item("sleep", Some(1));
      step.condition = Some(format!("{}.event_name == 'pull_request'", runner));
      action_job(jobs, "pre-commit", &step, certificates)?;
    }
    if args.ci_pull_request_pyright {
      let step = ActionStep::new("Run 'pyright'", "dycw/action-pyright@latest")
        .tokens(args)
        .item("python-version", Some(args.python_version.as_str()))
        .flag("native-tls", args.uv_native_tls)
        .text("with-requirements", args.script.as_ref());
      action_job(jobs, "pyright", &step, certificates)?;
    }
    if args.ci_pull_request_pytest_macos || args.ci_pull_request_pytest_ubuntu || args.ci_pull_request_pytest_windows {
      add_pytest_job(jobs, args)?;
    }
    if args.ci_pull_request_ruff {
      let step = ActionStep::new("Run 'ruff'", "dycw/action-ruff@latest").tokens(args);
      action_job(jobs, "ruff", &step, certificates)?;
    }
    Ok(())
  })
}

fn add_pytest_job(jobs: &mut Mapping, args: &ConformalizeRepoArgs) -> ActionResult<()> {
  let job = get_mapping(jobs, "pytest")?;
  set(get_mapping(job, "env")?, "CI", "1");
  set(
    job,
    "name",
    "pytest (${{matrix.os}}, ${{matrix.python-version}}, ${{matrix.resolution}})",
  );
  set(job, "runs-on", "${{matrix.os}}");

  let step = ActionStep::new("Run 'pytest'", "dycw/action-pytest@latest")
    .tokens(args)
    .item("python-version", Some("${{matrix.python-version}}"))
    .secret("sops-age-key", args.ci_pull_request_pytest_sops_age_key.as_ref())
    .item("resolution", Some("${{matrix.resolution}}"))
    .flag("native-tls", args.uv_native_tls)
    .text("with-requirements", args.script.as_ref());
  let steps = get_sequence(job, "steps")?;
  if args.ci_certificates {
    ensure_certificates(steps);
  }
  upsert_action(steps, &step)?;

  let strategy = get_mapping(job, "strategy")?;
  set(strategy, "fail-fast", false);
  let matrix = get_mapping(strategy, "matrix")?;
  let os = get_sequence(matrix, "os")?;
  for (enabled, runner) in [
    (args.ci_pull_request_pytest_macos, "macos-latest"),
    (args.ci_pull_request_pytest_ubuntu, "ubuntu-latest"),
    (args.ci_pull_request_pytest_windows, "windows-latest"),
  ] {
    if enabled {
      ensure_contains(os, [runner]);
    }
  }
  let versions = if args.ci_pull_request_pytest_all_versions {
    python_versions(&args.python_version)?
  } else {
    vec![args.python_version.clone()]
  };
  ensure_contains(get_sequence(matrix, "python-version")?, versions);
  ensure_contains(get_sequence(matrix, "resolution")?, ["highest", "lowest-direct"]);

  if let Some(timeout) = args.pytest_timeout {
    set(job, "timeout-minutes", timeout_minutes(timeout));
  }
  Ok(())
}

/// Whole minutes for a timeout in seconds, at least one
pub fn timeout_minutes(seconds: u64) -> u64 {
  ((seconds as f64 / 60.0).round() as u64).max(1)
}

pub fn add_push_yaml(root: &Path, args: &ConformalizeRepoArgs, mods: &mut Modifications) -> ActionResult<()> {
  let path = workflow_path(root, args.ci_gitea, "push.yaml");
  edit_document::<YamlFormat, _>(&path, mods, |doc| {
    let map = root_mapping(doc)?;
    set(map, "name", "push");
    let on = get_mapping(map, "on")?;
    let push = get_mapping(on, "push")?;
    ensure_contains(get_sequence(push, "branches")?, ["master"]);

    let jobs = get_mapping(map, "jobs")?;
    if args.ci_push_publish_github {
      let job = get_mapping(jobs, "publish-github")?;
      set(get_mapping(job, "environment")?, "name", "pypi");
      set(get_mapping(job, "permissions")?, "id-token", "write");
      let step = ActionStep::new("Publish a package", "dycw/action-publish-package@latest").tokens(args);
      action_job(jobs, "publish-github", &step, false)?;
    }
    for publisher in publishers(args).iter().filter(|p| p.wanted()) {
      let step = ActionStep::new("Publish a package", "dycw/action-publish-package@latest")
        .tokens(args)
        .text("username", publisher.username.as_ref())
        .secret("password", publisher.password.as_ref())
        .text("publish-url", publisher.publish_url.as_ref())
        .flag("native-tls", args.uv_native_tls);
      let job = format!("publish-{}", publisher.job_name);
      action_job(jobs, &job, &step, args.ci_certificates)?;
    }
    if args.ci_push_tag || args.ci_push_tag_all {
      let all = args.ci_push_tag_all;
      let step = ActionStep::new("Tag a commit", "dycw/action-tag-commit@latest")
        .tokens(args)
        .flag("major-minor", all)
        .flag("major", all)
        .flag("latest", all);
      action_job(jobs, "tag", &step, args.ci_certificates)?;
    }
    Ok(())
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn steps(yaml: &str) -> Sequence {
    serde_yaml::from_str(yaml).unwrap()
  }

  #[test]
  fn test_upsert_action_appends_then_updates() {
    let mut seq = Sequence::new();
    let step = ActionStep::new("Run 'ruff'", "dycw/action-ruff@latest").flag("native-tls", true);
    upsert_action(&mut seq, &step).unwrap();
    assert_eq!(
      seq,
      steps("- name: Run 'ruff'\n  uses: dycw/action-ruff@latest\n  with:\n    native-tls: true\n")
    );

    let step = ActionStep::new("Run 'ruff'", "dycw/action-ruff@latest");
    upsert_action(&mut seq, &step).unwrap();
    assert_eq!(seq, steps("- name: Run 'ruff'\n  uses: dycw/action-ruff@latest\n"));
  }

  #[test]
  fn test_upsert_action_keeps_unrelated_keys() {
    let mut seq = steps("- uses: actions/checkout@v4\n- uses: dycw/action-ruff@latest\n  timeout-minutes: 5\n");
    let step = ActionStep::new("Run 'ruff'", "dycw/action-ruff@latest");
    upsert_action(&mut seq, &step).unwrap();
    assert_eq!(
      seq,
      steps("- uses: actions/checkout@v4\n- uses: dycw/action-ruff@latest\n  timeout-minutes: 5\n  name: Run 'ruff'\n")
    );
  }

  #[test]
  fn test_ensure_certificates_first_once() {
    let mut seq = steps("- uses: dycw/action-ruff@latest\n");
    ensure_certificates(&mut seq);
    ensure_certificates(&mut seq);
    assert_eq!(seq.len(), 2);
    assert_eq!(seq[0]["run"], Value::from(CERTIFICATES_RUN));
  }

  #[test]
  fn test_timeout_minutes() {
    assert_eq!(timeout_minutes(10), 1);
    assert_eq!(timeout_minutes(600), 10);
    assert_eq!(timeout_minutes(629), 10);
    assert_eq!(timeout_minutes(631), 11);
  }

  #[test]
  fn test_workflow_path() {
    let root = Path::new("/repo");
    assert_eq!(
      workflow_path(root, false, "push.yaml"),
      PathBuf::from("/repo/.github/workflows/push.yaml")
    );
    assert_eq!(
      workflow_path(root, true, "push.yaml"),
      PathBuf::from("/repo/.gitea/workflows/push.yaml")
    );
  }
}

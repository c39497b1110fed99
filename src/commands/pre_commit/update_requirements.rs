//! `update-requirements`: move dependency bounds up to what is installed
//!
//! Bounds are collected per manifest (highest `>=`, lowest `<` for each
//! package), the installed and latest versions come from `uv pip list`, and
//! every requirement is then rebounded.

use super::ensure_files;
use crate::core::config::{log_finish, log_start};
use crate::core::error::{ActionResult, ResultExt};
use crate::core::process::Process;
use crate::files::{Modifications, TomlFormat, edit_document, read_optional};
use crate::requirements::{
  Requirement, Version, VersionSet, bounds_of, dependency_strings, for_each_dependency, normalize_name, rebound,
};
use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;
use tracing::debug;

#[derive(Debug, Clone, Args)]
pub struct UpdateRequirementsArgs {
  /// Files to process
  pub paths: Vec<PathBuf>,

  /// Additional index URLs to search for newer versions
  #[arg(long, env = "INDEX", value_delimiter = ' ')]
  pub index: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PipListEntry {
  name: String,
  version: String,
}

#[derive(Debug, Deserialize)]
struct PipListOutdatedEntry {
  name: String,
  latest_version: String,
}

/// Installed and newest versions, keyed by normalized name
#[derive(Debug, Default)]
struct Installed {
  current: BTreeMap<String, Version>,
  latest: BTreeMap<String, Version>,
}

pub fn run_update_requirements(args: UpdateRequirementsArgs) -> ActionResult<()> {
  log_start("update-requirements", &args);
  ensure_files(&args.paths)?;
  let installed = pip_list(&args.index)?;

  let mut modifications = Modifications::new();
  for path in &args.paths {
    update_path(path, &installed, &mut modifications)?;
  }
  modifications.finish()?;
  log_finish("update-requirements");
  Ok(())
}

fn pip_list(index: &[String]) -> ActionResult<Installed> {
  let current = Process::new("uv")
    .args(["pip", "list", "--format", "json", "--strict"])
    .output_string()?;
  let index_args = index
    .iter()
    .filter(|url| !url.trim().is_empty())
    .flat_map(|url| ["--index".to_string(), url.clone()]);
  let outdated = Process::new("uv")
    .args(["pip", "list", "--format", "json", "--outdated", "--strict"])
    .args(index_args)
    .output_string()?;
  parse_pip_list(&current, &outdated)
}

fn parse_pip_list(current: &str, outdated: &str) -> ActionResult<Installed> {
  let current: Vec<PipListEntry> = serde_json::from_str(current).context("Failed to parse 'uv pip list' output")?;
  let outdated: Vec<PipListOutdatedEntry> =
    serde_json::from_str(outdated).context("Failed to parse 'uv pip list --outdated' output")?;

  let mut installed = Installed::default();
  for entry in current {
    if let Some(version) = parse_installed(&entry.name, &entry.version) {
      installed.current.insert(normalize_name(&entry.name), version);
    }
  }
  for entry in outdated {
    if let Some(version) = parse_installed(&entry.name, &entry.latest_version) {
      installed.latest.insert(normalize_name(&entry.name), version);
    }
  }
  Ok(installed)
}

/// Versions outside the 1-to-3 part shape (`2024.1.0.1`, `1.0.post1`) are skipped
fn parse_installed(name: &str, version: &str) -> Option<Version> {
  match Version::parse(version) {
    Ok(version) => Some(version),
    Err(e) => {
      debug!("Skipping '{}' {}: {}", name, version, e);
      None
    }
  }
}

fn update_path(path: &Path, installed: &Installed, modifications: &mut Modifications) -> ActionResult<()> {
  let text = read_optional(path)?.unwrap_or_default();
  let doc = text.parse::<DocumentMut>().with_context(|| format!("Failed to parse '{}'", path.display()))?;
  let versions = version_set(&doc, installed)?;
  edit_document::<TomlFormat, _>(path, modifications, |doc| apply_versions(doc, &versions))
}

/// Bounds from the manifest joined with the installed versions
fn version_set(doc: &DocumentMut, installed: &Installed) -> ActionResult<VersionSet> {
  let mut set = VersionSet::new();
  for text in dependency_strings(doc) {
    let requirement = Requirement::parse(&text)?;
    let (lower, upper) = bounds_of(&requirement)?;
    set.entry(requirement.key()).or_default().merge_bounds(lower, upper);
  }
  for (key, versions) in set.iter_mut() {
    versions.current = installed.current.get(key).cloned();
    versions.latest = installed.latest.get(key).cloned();
  }
  Ok(set)
}

fn apply_versions(doc: &mut DocumentMut, versions: &VersionSet) -> ActionResult<()> {
  for_each_dependency(doc, |text| {
    let requirement = Requirement::parse(text)?;
    let updated = match versions.get(&requirement.key()) {
      Some(versions) => rebound(&requirement, versions)?,
      None => requirement,
    };
    Ok(updated.to_string())
  })
}

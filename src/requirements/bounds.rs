//! Lower/upper bound maintenance for dependency requirements

use super::requirement::{Operator, Requirement};
use super::version::Version;
use crate::core::error::{ActionResult, ResultExt};
use std::collections::BTreeMap;

/// Everything known about one package's versions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Versions {
  /// Highest `>=` bound across the scanned manifests
  pub lower: Option<Version>,
  /// Lowest `<` bound across the scanned manifests
  pub upper: Option<Version>,
  /// Installed version
  pub current: Option<Version>,
  /// Newest available version, when the package is outdated
  pub latest: Option<Version>,
}

impl Versions {
  /// Merge another pair of bounds: max of lowers, min of uppers
  pub fn merge_bounds(&mut self, lower: Option<Version>, upper: Option<Version>) {
    self.lower = match (self.lower.take(), lower) {
      (Some(a), Some(b)) => Some(a.max(b)),
      (a, b) => a.or(b),
    };
    self.upper = match (self.upper.take(), upper) {
      (Some(a), Some(b)) => Some(a.min(b)),
      (a, b) => a.or(b),
    };
  }

  /// The version bounds should track: latest if outdated, else installed
  pub fn target(&self) -> Option<&Version> {
    self.latest.as_ref().or(self.current.as_ref())
  }
}

/// Versions keyed by normalized package name
pub type VersionSet = BTreeMap<String, Versions>;

/// Read the `>=` and `<` bounds of a requirement
pub fn bounds_of(requirement: &Requirement) -> ActionResult<(Option<Version>, Option<Version>)> {
  let parse = |op: Operator| -> ActionResult<Option<Version>> {
    requirement
      .get(op)
      .map(|text| Version::parse(text).with_context(|| format!("Failed to read bound of '{}'", requirement)))
      .transpose()
  };
  Ok((parse(Operator::GreaterEqual)?, parse(Operator::Less)?))
}

/// Recompute the bounds of `requirement`
///
/// Only bounds the requirement already has are maintained. A lower bound
/// rises to the target version; an upper bound alone is pushed just past the
/// target in its own shape; both together become `>=L, <next major of L`.
pub fn rebound(requirement: &Requirement, versions: &Versions) -> ActionResult<Requirement> {
  let (own_lower, own_upper) = bounds_of(requirement)?;
  let lower = own_lower.map(|own| versions.lower.clone().map_or(own.clone(), |merged| merged.max(own)));
  let upper = own_upper.map(|own| versions.upper.clone().map_or(own.clone(), |merged| merged.min(own)));
  let target = versions.target();

  let mut out = requirement.clone();
  match (lower, upper, target) {
    (None, None, _) => {}
    (Some(lower), None, target) => {
      out.set(Operator::GreaterEqual, raise(lower, target));
    }
    (None, Some(upper), None) => {
      out.set(Operator::Less, upper);
    }
    (None, Some(upper), Some(target)) => {
      let bumped = match upper.part_count() {
        1 => target.bump_major()?.with_len(1),
        2 => target.bump_minor()?.with_len(2),
        _ => target.bump_patch()?,
      };
      out.set(Operator::Less, upper.max(bumped));
    }
    (Some(lower), Some(upper), target) => {
      let new_lower = raise(lower, target);
      let new_upper = new_lower.bump_major()?.with_len(upper.part_count());
      out.set(Operator::GreaterEqual, new_lower);
      out.set(Operator::Less, new_upper);
    }
  }
  Ok(out)
}

fn raise(lower: Version, target: Option<&Version>) -> Version {
  match target {
    Some(target) if *target > lower => target.clone(),
    _ => lower,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn v(text: &str) -> Version {
    Version::parse(text).unwrap()
  }

  fn versions(lower: Option<&str>, upper: Option<&str>, latest: Option<&str>) -> Versions {
    Versions {
      lower: lower.map(v),
      upper: upper.map(v),
      current: None,
      latest: latest.map(v),
    }
  }

  fn apply(text: &str, versions: &Versions) -> String {
    rebound(&Requirement::parse(text).unwrap(), versions).unwrap().to_string()
  }

  #[test]
  fn test_unbounded_unchanged() {
    assert_eq!(apply("package", &versions(None, None, None)), "package");
    assert_eq!(apply("package", &versions(None, None, Some("1.2.4"))), "package");
  }

  #[test]
  fn test_lower_follows_latest() {
    let text = "package>=1.2.3";
    assert_eq!(apply(text, &versions(Some("1.2.3"), None, None)), "package >=1.2.3");
    assert_eq!(apply(text, &versions(Some("1.2.3"), None, Some("1.2.3"))), "package >=1.2.3");
    assert_eq!(apply(text, &versions(Some("1.2.3"), None, Some("1.2.4"))), "package >=1.2.4");
  }

  #[test]
  fn test_upper_moves_past_latest() {
    let text = "package<1.3";
    assert_eq!(apply(text, &versions(None, Some("1.3"), None)), "package <1.3");
    assert_eq!(apply(text, &versions(None, Some("1.3"), Some("1.2.999"))), "package <1.3");
    assert_eq!(apply(text, &versions(None, Some("1.3"), Some("1.3.0"))), "package <1.4");
    assert_eq!(apply("package<2", &versions(None, Some("2"), Some("2.1.0"))), "package <3");
  }

  #[test]
  fn test_both_bounds_span_one_major() {
    let text = "package>=1.2.3, <1.3";
    assert_eq!(apply(text, &versions(Some("1.2.3"), Some("1.3"), None)), "package >=1.2.3, <2.0");
    assert_eq!(
      apply(text, &versions(Some("1.2.3"), Some("1.3"), Some("1.2.4"))),
      "package >=1.2.4, <2.0"
    );
    assert_eq!(
      apply("package>=1.2.3, <9.9", &versions(Some("1.2.3"), Some("9.9"), Some("1.2.3"))),
      "package >=1.2.3, <2.0"
    );
    assert_eq!(
      apply("package>=1.2, <2", &versions(Some("1.2"), Some("2"), Some("2.0.1"))),
      "package >=2.0.1, <3"
    );
  }

  #[test]
  fn test_bump_past_largest_version_fails() {
    let huge = format!("{}", u64::MAX);
    let text = format!("package<{}", huge);
    let requirement = Requirement::parse(&text).unwrap();
    assert!(rebound(&requirement, &versions(None, Some(huge.as_str()), Some(huge.as_str()))).is_err());
  }

  #[test]
  fn test_merged_lower_wins() {
    let merged = versions(Some("1.5.0"), None, None);
    assert_eq!(apply("package>=1.2.3", &merged), "package >=1.5.0");
  }

  #[test]
  fn test_other_specifiers_kept() {
    assert_eq!(
      apply("package[extra]>=1.2.3, !=1.2.5; python_version>='3.12'", &versions(None, None, Some("1.2.6"))),
      "package[extra] >=1.2.6, !=1.2.5; python_version>='3.12'"
    );
  }

  #[test]
  fn test_merge_bounds() {
    let mut merged = Versions::default();
    merged.merge_bounds(Some(v("1.2.3")), Some(v("2")));
    merged.merge_bounds(Some(v("1.4")), Some(v("1.9")));
    merged.merge_bounds(None, None);
    assert_eq!(merged.lower, Some(v("1.4")));
    assert_eq!(merged.upper, Some(v("1.9")));
  }

  #[test]
  fn test_target_prefers_latest() {
    let mut known = Versions {
      current: Some(v("1.0.0")),
      ..Versions::default()
    };
    assert_eq!(known.target(), Some(&v("1.0.0")));
    known.latest = Some(v("1.1.0"));
    assert_eq!(known.target(), Some(&v("1.1.0")));
  }
}

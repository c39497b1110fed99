//! Short version identifiers used in dependency bounds
//!
//! Manifests write bounds as `1`, `1.2` or `1.2.3`, sometimes with a `-suffix`.
//! The shape is kept so that a bound is rewritten in the form it was written in.

use crate::core::error::{ActionError, ActionResult};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:-(\w+))?$").unwrap());

/// A version with one, two or three numeric parts
#[derive(Debug, Clone)]
pub struct Version {
  parts: Vec<u64>,
  suffix: Option<String>,
}

impl Version {
  /// Parse `N`, `N.N` or `N.N.N`, each optionally followed by `-suffix`
  pub fn parse(text: &str) -> ActionResult<Self> {
    let text = text.trim();
    let captures = VERSION_PATTERN
      .captures(text)
      .ok_or_else(|| ActionError::message(format!("Invalid version '{}'", text)))?;

    let mut parts = Vec::with_capacity(3);
    for group in 1..=3 {
      if let Some(m) = captures.get(group) {
        let part = m
          .as_str()
          .parse::<u64>()
          .map_err(|e| ActionError::message(format!("Invalid version '{}': {}", text, e)))?;
        parts.push(part);
      }
    }
    if parts.iter().all(|p| *p == 0) {
      return Err(ActionError::message(format!("Version '{}' must not be zero", text)));
    }

    Ok(Self {
      parts,
      suffix: captures.get(4).map(|m| m.as_str().to_string()),
    })
  }

  pub fn from_parts(parts: &[u64]) -> Self {
    Self {
      parts: parts.to_vec(),
      suffix: None,
    }
  }

  /// Number of numeric parts as written (1, 2 or 3)
  pub fn part_count(&self) -> usize {
    self.parts.len()
  }

  pub fn major(&self) -> u64 {
    self.part(0)
  }

  pub fn minor(&self) -> u64 {
    self.part(1)
  }

  pub fn patch(&self) -> u64 {
    self.part(2)
  }

  fn part(&self, index: usize) -> u64 {
    self.parts.get(index).copied().unwrap_or(0)
  }

  /// Next major version, in the same shape (`2`, `2.0` or `2.0.0`)
  pub fn bump_major(&self) -> ActionResult<Self> {
    let mut parts = vec![0; self.part_count()];
    parts[0] = self.increment(self.major())?;
    Ok(Self::from_parts(&parts))
  }

  /// Next minor version, in the same shape; one-part versions grow a minor
  pub fn bump_minor(&self) -> ActionResult<Self> {
    let mut parts = vec![0; self.part_count().max(2)];
    parts[0] = self.major();
    parts[1] = self.increment(self.minor())?;
    Ok(Self::from_parts(&parts))
  }

  /// Next patch version (always three parts)
  pub fn bump_patch(&self) -> ActionResult<Self> {
    Ok(Self::from_parts(&[self.major(), self.minor(), self.increment(self.patch())?]))
  }

  fn increment(&self, part: u64) -> ActionResult<u64> {
    part
      .checked_add(1)
      .ok_or_else(|| ActionError::message(format!("Version '{}' is too large to bump", self)))
  }

  /// Truncate or zero-pad to `len` parts, dropping any suffix
  pub fn with_len(&self, len: usize) -> Self {
    let parts: Vec<u64> = (0..len.clamp(1, 3)).map(|i| self.part(i)).collect();
    Self::from_parts(&parts)
  }

  fn key(&self) -> (u64, u64, u64) {
    (self.major(), self.minor(), self.patch())
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Version {}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Version {
  /// Missing parts count as zero; a suffixed version sorts before the bare one
  fn cmp(&self, other: &Self) -> Ordering {
    self.key().cmp(&other.key()).then_with(|| match (&self.suffix, &other.suffix) {
      (None, None) => Ordering::Equal,
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (Some(a), Some(b)) => a.cmp(b),
    })
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let joined = self.parts.iter().map(u64::to_string).collect::<Vec<_>>().join(".");
    write!(f, "{}", joined)?;
    if let Some(suffix) = &self.suffix {
      write!(f, "-{}", suffix)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(text: &str) -> Version {
    Version::parse(text).unwrap()
  }

  #[test]
  fn test_parse_shapes() {
    assert_eq!(v("1").part_count(), 1);
    assert_eq!(v("1.2").part_count(), 2);
    assert_eq!(v("1.2.3").part_count(), 3);
    assert_eq!(v("1.2-rc1").to_string(), "1.2-rc1");
    assert!(Version::parse("").is_err());
    assert!(Version::parse("1.2.3.4").is_err());
    assert!(Version::parse("0.0").is_err());
    assert!(Version::parse("abc").is_err());
  }

  #[test]
  fn test_ordering_pads_with_zero() {
    assert_eq!(v("1.2"), v("1.2.0"));
    assert!(v("1.2.4") > v("1.2.3"));
    assert!(v("1.3") > v("1.2.999"));
    assert!(v("2") > v("1.99"));
    assert!(v("1.2-rc1") < v("1.2"));
  }

  #[test]
  fn test_bumps_keep_shape() {
    assert_eq!(v("1.2.3").bump_major().unwrap().to_string(), "2.0.0");
    assert_eq!(v("1.2").bump_major().unwrap().to_string(), "2.0");
    assert_eq!(v("1").bump_major().unwrap().to_string(), "2");
    assert_eq!(v("1.2").bump_minor().unwrap().to_string(), "1.3");
    assert_eq!(v("1.2.3").bump_minor().unwrap().to_string(), "1.3.0");
    assert_eq!(v("1").bump_minor().unwrap().to_string(), "1.1");
    assert_eq!(v("1.2.3").bump_patch().unwrap().to_string(), "1.2.4");
  }

  #[test]
  fn test_bump_overflow() {
    let max = u64::MAX;
    let err = v(&max.to_string()).bump_major().unwrap_err();
    assert!(err.to_string().contains("too large to bump"), "{}", err);
    assert!(v(&format!("1.{}", max)).bump_minor().is_err());
    assert!(v(&format!("1.2.{}", max)).bump_patch().is_err());
    assert_eq!(v(&format!("{}.1", max)).bump_minor().unwrap().to_string(), format!("{}.2", max));
  }

  #[test]
  fn test_with_len() {
    assert_eq!(v("1.3.0").with_len(2).to_string(), "1.3");
    assert_eq!(v("2").with_len(2).to_string(), "2.0");
    assert_eq!(v("1.2-rc1").with_len(3).to_string(), "1.2.0");
  }
}

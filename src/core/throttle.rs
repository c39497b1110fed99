//! Time-based throttling of repeated actions
//!
//! A marker file under the user cache directory records when an action last
//! ran for a given key. While the marker is younger than the window, the action
//! is skipped.

use crate::core::error::{ActionError, ActionResult, ResultExt};
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct Throttle {
  marker: PathBuf,
  window: Duration,
}

impl Throttle {
  /// Throttle for `action` keyed by `key`, stored under the user cache dir
  pub fn new(action: &str, key: &str, window: Duration) -> ActionResult<Self> {
    let cache = dirs::cache_dir().ok_or_else(|| ActionError::message("Could not determine the cache directory"))?;
    Ok(Self::in_dir(&cache.join("actions").join("throttle"), action, key, window))
  }

  pub fn in_dir(dir: &Path, action: &str, key: &str, window: Duration) -> Self {
    Self {
      marker: dir.join(action).join(sanitize(key)),
      window,
    }
  }

  /// Whether the action ran within the window as of `now`
  pub fn is_throttled_at(&self, now: DateTime<Utc>) -> bool {
    let Ok(text) = fs::read_to_string(&self.marker) else {
      return false;
    };
    match DateTime::parse_from_rfc3339(text.trim()) {
      Ok(last) => now.signed_duration_since(last.with_timezone(&Utc)) < self.window,
      Err(e) => {
        debug!("Ignoring unreadable throttle marker '{}': {}", self.marker.display(), e);
        false
      }
    }
  }

  pub fn is_throttled(&self) -> bool {
    self.is_throttled_at(Utc::now())
  }

  /// Record that the action ran at `now`
  pub fn mark_at(&self, now: DateTime<Utc>) -> ActionResult<()> {
    if let Some(parent) = self.marker.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create '{}'", parent.display()))?;
    }
    fs::write(&self.marker, now.to_rfc3339())
      .with_context(|| format!("Failed to write '{}'", self.marker.display()))
  }

  pub fn mark(&self) -> ActionResult<()> {
    self.mark_at(Utc::now())
  }
}

/// A single path component derived from an arbitrary key
fn sanitize(key: &str) -> String {
  let cleaned: String = key
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '-' })
    .collect();
  let trimmed = cleaned.trim_matches('-');
  if trimmed.is_empty() { "default".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_window() {
    let dir = TempDir::new().unwrap();
    let throttle = Throttle::in_dir(dir.path(), "touch-py-typed", "/home/me/repo", Duration::hours(12));
    let start = Utc::now();
    assert!(!throttle.is_throttled_at(start));

    throttle.mark_at(start).unwrap();
    assert!(throttle.is_throttled_at(start + Duration::hours(11)));
    assert!(!throttle.is_throttled_at(start + Duration::hours(12)));
  }

  #[test]
  fn test_garbage_marker_ignored() {
    let dir = TempDir::new().unwrap();
    let throttle = Throttle::in_dir(dir.path(), "a", "k", Duration::hours(1));
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/k"), "yesterday").unwrap();
    assert!(!throttle.is_throttled());
  }

  #[test]
  fn test_sanitize() {
    assert_eq!(sanitize("/home/me/repo"), "home-me-repo");
    assert_eq!(sanitize("my_repo.v2"), "my_repo.v2");
    assert_eq!(sanitize("///"), "default");
  }
}

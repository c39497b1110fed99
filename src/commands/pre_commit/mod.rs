//! Pre-commit hooks
//!
//! Each hook edits files idempotently and exits with code 1 when it rewrote
//! anything, so pre-commit reports the hook as failed and shows the diff.
//!
//! - **conformalize-repo**: CI workflows, coverage/pytest config, README, script headers
//! - **format-requirements**: canonical dependency strings in `pyproject.toml`
//! - **update-requirements**: move dependency bounds to the installed versions
//! - **replace-sequence-strs**: `Sequence[str]` to `list[str]`
//! - **touch-empty-py**: give empty modules a statement
//! - **touch-py-typed**: add `py.typed` to `src/` packages

pub mod conformalize_repo;
pub mod format_requirements;
pub mod replace_sequence_strs;
pub mod touch_empty_py;
pub mod touch_py_typed;
pub mod update_requirements;

pub use conformalize_repo::run_conformalize_repo;
pub use format_requirements::run_format_requirements;
pub use replace_sequence_strs::run_replace_sequence_strs;
pub use touch_empty_py::run_touch_empty_py;
pub use touch_py_typed::run_touch_py_typed;
pub use update_requirements::run_update_requirements;

use crate::core::error::{ActionError, ActionResult, ConfigError};
use clap::Args;
use std::path::PathBuf;

/// Files handed over by pre-commit
#[derive(Debug, Clone, Args)]
pub struct FilesArgs {
  /// Files to process
  pub paths: Vec<PathBuf>,
}

/// Fail on the first path that is not an existing file
pub(crate) fn ensure_files(paths: &[PathBuf]) -> ActionResult<()> {
  match paths.iter().find(|p| !p.is_file()) {
    Some(path) => Err(ActionError::Config(ConfigError::Invalid {
      setting: "paths".to_string(),
      reason: format!("Expected a file; '{}' is not", path.display()),
    })),
    None => Ok(()),
  }
}

//! Core building blocks shared by all actions
//!
//! - **config**: secrets, empty-value normalization, settings logging
//! - **error**: error types with contextual help messages and exit codes
//! - **logging**: `tracing` subscriber writing to stderr
//! - **process**: logged subprocess execution with secret redaction
//! - **throttle**: time-window markers under the user cache directory
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod error;
pub mod logging;
pub mod process;
pub mod throttle;
pub mod vcs;

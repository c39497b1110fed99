//! Python dependency requirements
//!
//! - **version**: 1-, 2- or 3-part versions with shape-preserving bumps
//! - **requirement**: PEP 508 subset with a canonical rendering
//! - **bounds**: lower/upper bound maintenance against installed versions
//! - **pyproject**: dependency arrays of `pyproject.toml`

pub mod bounds;
pub mod pyproject;
pub mod requirement;
pub mod version;

pub use bounds::{VersionSet, bounds_of, rebound};
pub use pyproject::{dependency_strings, for_each_dependency};
pub use requirement::{Requirement, normalize_name};
pub use version::Version;

//! Structured file editing
//!
//! - **context**: idempotent read-edit-write cycle with atomic writes
//! - **toml**: `toml_edit` table/array helpers
//! - **yaml**: `serde_yaml` mapping/sequence helpers

pub mod context;
pub mod toml;
pub mod yaml;

pub use context::{
  Modifications, PythonFormat, TomlFormat, YamlFormat, edit_document, edit_text, read_optional, write_text,
};

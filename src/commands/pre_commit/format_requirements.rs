use super::{FilesArgs, ensure_files};
use crate::core::config::{log_finish, log_start};
use crate::core::error::ActionResult;
use crate::files::{Modifications, TomlFormat, edit_document};
use crate::requirements::{Requirement, for_each_dependency};
use std::path::Path;

pub fn run_format_requirements(args: FilesArgs) -> ActionResult<()> {
  log_start("format-requirements", &args);
  ensure_files(&args.paths)?;
  let mut modifications = Modifications::new();
  for path in &args.paths {
    format_path(path, &mut modifications)?;
  }
  modifications.finish()?;
  log_finish("format-requirements");
  Ok(())
}

fn format_path(path: &Path, modifications: &mut Modifications) -> ActionResult<()> {
  edit_document::<TomlFormat, _>(path, modifications, |doc| {
    for_each_dependency(doc, |dependency| Ok(Requirement::parse(dependency)?.to_string()))
  })
}

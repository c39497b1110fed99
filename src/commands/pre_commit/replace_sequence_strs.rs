use super::{FilesArgs, ensure_files};
use crate::core::config::{log_finish, log_start};
use crate::core::error::ActionResult;
use crate::files::{Modifications, PythonFormat, edit_document};
use crate::python;
use std::path::Path;

pub fn run_replace_sequence_strs(args: FilesArgs) -> ActionResult<()> {
  log_start("replace-sequence-strs", &args);
  ensure_files(&args.paths)?;
  let mut modifications = Modifications::new();
  for path in &args.paths {
    replace_path(path, &mut modifications)?;
  }
  modifications.finish()?;
  log_finish("replace-sequence-strs");
  Ok(())
}

fn replace_path(path: &Path, modifications: &mut Modifications) -> ActionResult<()> {
  edit_document::<PythonFormat, _>(path, modifications, |source| {
    *source = python::replace_sequence_strs(source)?;
    Ok(())
  })
}

//! `.coveragerc.toml` and `pytest.toml`

use super::ConformalizeRepoArgs;
use crate::core::config::non_empty;
use crate::core::error::ActionResult;
use crate::files::toml::{ensure_contains, get_array, get_table, set_value};
use crate::files::{Modifications, TomlFormat, edit_document};
use std::path::Path;

pub const COVERAGERC: &str = ".coveragerc.toml";
pub const PYTEST: &str = "pytest.toml";

pub fn add_coveragerc(root: &Path, mods: &mut Modifications) -> ActionResult<()> {
  edit_document::<TomlFormat, _>(&root.join(COVERAGERC), mods, |doc| {
    let table = doc.as_table_mut();
    set_value(get_table(table, "html")?, "directory", ".coverage/html");

    let report = get_table(table, "report")?;
    ensure_contains(get_array(report, "exclude_also")?, &["@overload", "if TYPE_CHECKING:"]);
    set_value(report, "fail_under", 100.0);
    set_value(report, "skip_covered", true);
    set_value(report, "skip_empty", true);

    let run = get_table(table, "run")?;
    set_value(run, "branch", true);
    set_value(run, "data_file", ".coverage/data");
    set_value(run, "parallel", true);
    Ok(())
  })
}

pub fn wants_pytest(args: &ConformalizeRepoArgs) -> bool {
  args.pytest || args.pytest_asyncio || args.pytest_ignore_warnings || args.pytest_timeout.is_some()
}

/// Import name of the package under test
fn python_package_name(args: &ConformalizeRepoArgs) -> Option<String> {
  non_empty(args.python_package_name.clone())
    .or_else(|| non_empty(args.package_name.clone()).map(|name| name.replace('-', "_")))
}

pub fn add_pytest(root: &Path, args: &ConformalizeRepoArgs, mods: &mut Modifications) -> ActionResult<()> {
  edit_document::<TomlFormat, _>(&root.join(PYTEST), mods, |doc| {
    let pytest = get_table(doc.as_table_mut(), "pytest")?;

    let addopts = get_array(pytest, "addopts")?;
    ensure_contains(addopts, &["-ra", "-vv", "--color=auto", "--durations=10", "--durations-min=10"]);
    if args.coverage
      && let Some(package) = python_package_name(args)
    {
      let cov = format!("--cov={}", package);
      ensure_contains(addopts, &[cov.as_str(), "--cov-config=.coveragerc.toml", "--cov-report=html"]);
    }

    set_value(pytest, "collect_imported_tests", false);
    set_value(pytest, "empty_parameter_set_mark", "fail_at_collect");
    ensure_contains(get_array(pytest, "filterwarnings")?, &["error"]);
    set_value(pytest, "minversion", "9.0");
    set_value(pytest, "strict", true);
    let tests = if non_empty(args.script.clone()).is_some() { "tests" } else { "src/tests" };
    ensure_contains(get_array(pytest, "testpaths")?, &[tests]);
    set_value(pytest, "xfail_strict", true);

    if args.pytest_asyncio {
      set_value(pytest, "asyncio_default_fixture_loop_scope", "function");
      set_value(pytest, "asyncio_mode", "auto");
    }
    if args.pytest_ignore_warnings {
      ensure_contains(
        get_array(pytest, "filterwarnings")?,
        &["ignore::DeprecationWarning", "ignore::ResourceWarning", "ignore::RuntimeWarning"],
      );
    }
    if let Some(timeout) = args.pytest_timeout {
      set_value(pytest, "timeout", timeout.to_string());
    }
    Ok(())
  })
}

mod commands;
mod core;
mod files;
mod python;
mod requirements;

use clap::{Parser, Subcommand};
use commands::clean_dir::CleanDirArgs;
use commands::git_clone_with::GitCloneWithArgs;
use commands::pre_commit::conformalize_repo::ConformalizeRepoArgs;
use commands::pre_commit::touch_py_typed::TouchPyTypedArgs;
use commands::pre_commit::update_requirements::UpdateRequirementsArgs;
use commands::pre_commit::{self, FilesArgs};
use commands::publish_package::PublishPackageArgs;
use commands::random_sleep::RandomSleepArgs;
use commands::re_encrypt::ReEncryptArgs;
use commands::run_hooks::RunHooksArgs;
use commands::setup_cronjob::SetupCronjobArgs;
use commands::setup_sops::SetupSopsArgs;
use commands::setup_ssh_config::SetupSshConfigArgs;
use commands::tag_commit::TagCommitArgs;
use core::error::{ActionError, print_error};

/// Repository and machine maintenance for CI and pre-commit
#[derive(Parser)]
#[command(name = "actions")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  // ============================================================================
  // Housekeeping
  // ============================================================================
  /// Remove bytecode files and empty directories
  CleanDir(CleanDirArgs),

  /// Sleep for a random duration
  RandomSleep(RandomSleepArgs),

  // ============================================================================
  // Publishing
  // ============================================================================
  /// Build a wheel and publish it
  PublishPackage(PublishPackageArgs),

  /// Tag the current commit with the project version
  TagCommit(TagCommitArgs),

  // ============================================================================
  // Hooks
  // ============================================================================
  /// Run selected pre-commit hooks
  RunHooks(RunHooksArgs),

  /// Pre-commit hooks that rewrite files
  #[command(subcommand)]
  PreCommit(PreCommitCommands),

  // ============================================================================
  // Machine setup
  // ============================================================================
  /// Install a cron job and its log rotation
  SetupCronjob(SetupCronjobArgs),

  /// Download and install sops
  SetupSops(SetupSopsArgs),

  /// Make ~/.ssh/config include ~/.ssh/config.d/*.conf
  SetupSshConfig(SetupSshConfigArgs),

  /// Clone a GitHub repository with a deploy key
  GitCloneWith(GitCloneWithArgs),

  /// Re-encrypt a sops file for a new age key
  ReEncrypt(ReEncryptArgs),
}

#[derive(Subcommand)]
enum PreCommitCommands {
  /// Conform CI workflows and config files
  ConformalizeRepo(ConformalizeRepoArgs),

  /// Rewrite dependency strings in canonical form
  FormatRequirements(FilesArgs),

  /// Raise dependency bounds to the installed versions
  UpdateRequirements(UpdateRequirementsArgs),

  /// Replace `Sequence[str]` with `list[str]`
  ReplaceSequenceStrs(FilesArgs),

  /// Give empty Python modules a statement
  TouchEmptyPy(FilesArgs),

  /// Add `py.typed` to the package under `src/`
  TouchPyTyped(TouchPyTypedArgs),
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  core::logging::init();

  let result = match cli.command {
    // Housekeeping
    Commands::CleanDir(args) => commands::run_clean_dir(args),
    Commands::RandomSleep(args) => commands::run_random_sleep(args),

    // Publishing
    Commands::PublishPackage(args) => commands::run_publish_package(args),
    Commands::TagCommit(args) => commands::run_tag_commit(args),

    // Hooks
    Commands::RunHooks(args) => commands::run_run_hooks(args),
    Commands::PreCommit(hook) => match hook {
      PreCommitCommands::ConformalizeRepo(args) => pre_commit::run_conformalize_repo(args),
      PreCommitCommands::FormatRequirements(args) => pre_commit::run_format_requirements(args),
      PreCommitCommands::UpdateRequirements(args) => pre_commit::run_update_requirements(args),
      PreCommitCommands::ReplaceSequenceStrs(args) => pre_commit::run_replace_sequence_strs(args),
      PreCommitCommands::TouchEmptyPy(args) => pre_commit::run_touch_empty_py(args),
      PreCommitCommands::TouchPyTyped(args) => pre_commit::run_touch_py_typed(args),
    },

    // Machine setup
    Commands::SetupCronjob(args) => commands::run_setup_cronjob(args),
    Commands::SetupSops(args) => commands::run_setup_sops(args),
    Commands::SetupSshConfig(args) => commands::run_setup_ssh_config(args),
    Commands::GitCloneWith(args) => commands::run_git_clone_with(args),
    Commands::ReEncrypt(args) => commands::run_re_encrypt(args),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: ActionError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}

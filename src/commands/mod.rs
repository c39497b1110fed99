//! CLI commands for actions
//!
//! ## Housekeeping
//! - **clean-dir**: remove bytecode and empty directories
//! - **random-sleep**: sleep a random time, logging progress
//!
//! ## Publishing
//! - **publish-package**: build a wheel with uv and upload it
//! - **tag-commit**: tag HEAD with the project version
//!
//! ## Hooks
//! - **run-hooks**: run selected pre-commit hooks one at a time
//! - **pre-commit**: hooks that rewrite files (see [`pre_commit`])
//!
//! ## Machine setup
//! - **setup-cronjob**: install a cron job with log rotation
//! - **setup-sops**: download the `sops` release binary
//! - **setup-ssh-config**: include `~/.ssh/config.d/*.conf`
//! - **git-clone-with**: clone with a dedicated deploy key
//! - **re-encrypt**: rotate the age key of a `sops` file
//!
//! Every `run_*` takes its clap argument struct and logs its settings first.

pub mod clean_dir;
pub mod git_clone_with;
pub mod pre_commit;
pub mod publish_package;
pub mod random_sleep;
pub mod re_encrypt;
pub mod run_hooks;
pub mod setup_cronjob;
pub mod setup_sops;
pub mod setup_ssh_config;
pub mod tag_commit;

pub use clean_dir::run_clean_dir;
pub use git_clone_with::run_git_clone_with;
pub use publish_package::run_publish_package;
pub use random_sleep::run_random_sleep;
pub use re_encrypt::run_re_encrypt;
pub use run_hooks::run_run_hooks;
pub use setup_cronjob::run_setup_cronjob;
pub use setup_sops::run_setup_sops;
pub use setup_ssh_config::run_setup_ssh_config;
pub use tag_commit::run_tag_commit;

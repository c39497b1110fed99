//! Logging setup
//!
//! Reads `RUST_LOG`, defaulting to `info`. Output goes to stderr so that
//! command output on stdout (`setup-cronjob --dry-run`) stays clean.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(std::io::stderr).with_target(false).compact())
    .init();
}

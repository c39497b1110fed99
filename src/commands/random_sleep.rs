//! `random-sleep`: sleep for a random duration, logging progress

use crate::core::config::{log_finish, log_start};
use crate::core::error::{ActionError, ActionResult, ConfigError};
use clap::Args;
use rand::Rng;
use std::thread;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Args)]
pub struct RandomSleepArgs {
  /// Minimum duration in seconds (inclusive)
  #[arg(long, env = "MIN", default_value_t = 0)]
  pub min: u64,

  /// Maximum duration in seconds (exclusive)
  #[arg(long, env = "MAX", default_value_t = 3600)]
  pub max: u64,

  /// Granularity of the chosen duration in seconds
  #[arg(long, env = "STEP", default_value_t = 1)]
  pub step: u64,

  /// Seconds between progress messages
  #[arg(long, env = "LOG_FREQ", default_value_t = 60)]
  pub log_freq: u64,
}

pub fn run_random_sleep(args: RandomSleepArgs) -> ActionResult<()> {
  log_start("random-sleep", &args);
  let count = choice_count(args.min, args.max, args.step)?;
  let duration = args.min + args.step * rand::rng().random_range(0..count);

  info!("Sleeping for {}...", format_secs(duration));
  for slice in slices(duration, args.log_freq) {
    info!(
      "Sleeping for {}... (elapsed = {}, remaining = {})",
      format_secs(slice.sleep),
      format_secs(slice.elapsed),
      format_secs(slice.remaining)
    );
    thread::sleep(Duration::from_secs(slice.sleep));
  }
  info!("Finished sleeping");

  log_finish("random-sleep");
  Ok(())
}

/// Number of durations `min, min + step, ...` strictly below `max`
fn choice_count(min: u64, max: u64, step: u64) -> ActionResult<u64> {
  let invalid = |reason: String| {
    ActionError::Config(ConfigError::Invalid {
      setting: "min/max/step".to_string(),
      reason,
    })
  };
  if step == 0 {
    return Err(invalid("'step' must be positive".to_string()));
  }
  if min >= max {
    return Err(invalid(format!("no durations in [{}, {}) with step {}", min, max, step)));
  }
  Ok((max - min).div_ceil(step))
}

#[derive(Debug, PartialEq, Eq)]
struct Slice {
  sleep: u64,
  elapsed: u64,
  remaining: u64,
}

/// Split `total` into sleeps of at most `log_freq` seconds, each with the
/// progress made before it starts
fn slices(total: u64, log_freq: u64) -> Vec<Slice> {
  let log_freq = log_freq.max(1);
  let mut out = Vec::new();
  let mut elapsed = 0;
  while elapsed < total {
    let sleep = log_freq.min(total - elapsed);
    out.push(Slice {
      sleep,
      elapsed,
      remaining: total - elapsed,
    });
    elapsed += sleep;
  }
  out
}

/// `1h 2m 3s` style rendering
fn format_secs(total: u64) -> String {
  let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
  match (h, m) {
    (0, 0) => format!("{}s", s),
    (0, _) => format!("{}m {}s", m, s),
    _ => format!("{}h {}m {}s", h, m, s),
  }
}

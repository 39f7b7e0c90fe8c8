//! ## Features
//!
//! - Leveled console output (info, warn, error, success) on stderr
//! - Multi-line message support with consistent prefixes
//! - Banner displays for headline messages
//! - One-call `tracing` subscriber setup for binaries
//!
//! ## Usage
//!
//! Console functions: `info()`, `warn()`, `error()`, `success()`, `announce()`
//!
//! The matching macros accept format arguments: `bentley::info!("found {} records", n)`.
//!
//! Library crates log through `tracing` directly; binaries call [`init_tracing`] once so those
//! events reach stderr alongside the console output.

use colored::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` (e.g. `"chronicle=info"`) is used.
/// Returns `false` if a subscriber was already installed, which happens in tests.
pub fn init_tracing(default_filter: &str) -> bool {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init().is_ok()
}

/// Core output function, one stderr line per message line
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

fn format_prefix(color: Color, prefix: &str) -> String {
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = 7 - prefix.len() - 2)
}

fn log_prefixed(color: Color, prefix: &str, message: &str) {
  let prefix = format_prefix(color, prefix);
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

/// Create a banner line of the specified length and character
pub fn banner_line(length: usize, char: char) -> String {
  char.to_string().repeat(length)
}

/// Display a message with a banner around it
pub fn as_banner<F>(log_fn: F, message: &str, width: Option<usize>, border_char: Option<char>)
where
  F: Fn(&str),
{
  let banner = banner_line(width.unwrap_or(50), border_char.unwrap_or('='));

  log_fn(&banner);
  log_fn(message);
  log_fn(&banner);
}

/// General information
pub fn info(message: &str) {
  log_prefixed(Color::Blue, "info", message);
}

/// Something needs attention
pub fn warn(message: &str) {
  log_prefixed(Color::Yellow, "warn", message);
}

/// Something went wrong
pub fn error(message: &str) {
  log_prefixed(Color::Red, "error", message);
}

/// Something completed successfully
pub fn success(message: &str) {
  log_prefixed(Color::Green, "sccs", message);
}

/// Headline for the start of a longer piece of output
pub fn announce(message: &str) {
  as_banner(|msg| log(&msg.blue().bold().to_string()), message, Some(50), Some('-'));
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

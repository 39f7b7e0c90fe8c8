use bentley::*;

#[test]
fn test_basic_logging_functions() {
  info("Test info message");
  warn("Test warning message");
  error("Test error message");
  success("Test success message");
  announce("Test announcement");
}

#[test]
fn test_multiline_messages() {
  let multiline_msg = "First line\nSecond line\nThird line";
  info(multiline_msg);
  warn(multiline_msg);
  error(multiline_msg);
}

#[test]
fn test_macros_accept_format_arguments() {
  let count = 3;
  bentley::info!("found {count} records");
  bentley::success!("{} of {} analyzers succeeded", 2, count);
  bentley::warn!("fallback used for '{}'", "Cassidy");
}

#[test]
fn test_init_tracing_only_installs_once() {
  init_tracing("chronicle=debug");
  assert!(!init_tracing("chronicle=debug"));
  tracing::info!("tracing initialised for tests");
}

use thiserror::Error;
use tracing::level_filters::LevelFilter;

/// Reads the level from `RUST_LOG`, falling back to `default_level`
/// when it is unset. Unknown values mean WARN.
pub fn level_from_env(default_level: LevelFilter) -> LevelFilter {
  match std::env::var("RUST_LOG") {
    Ok(level) => parse_level(&level),
    Err(_) => default_level,
  }
}

fn parse_level(level: &str) -> LevelFilter {
  match level.to_lowercase().as_str() {
    "trace" => LevelFilter::TRACE,
    "debug" => LevelFilter::DEBUG,
    "info" => LevelFilter::INFO,
    "warn" => LevelFilter::WARN,
    "error" => LevelFilter::ERROR,
    _ => LevelFilter::WARN,
  }
}

/// Configure a highly detailed logging system. Both binaries call this
/// once at startup.
pub fn set_console_logging(default_level: LevelFilter) -> Result<(), LoggingError> {
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(level_from_env(default_level))
    // Use a more compact, abbreviated log format
    .compact()
    // Display source code file paths
    .with_file(true)
    // Display source code line numbers
    .with_line_number(true)
    .with_thread_ids(false)
    // Don't display the event's target (module path)
    .with_target(false)
    .finish();

  tracing::subscriber::set_global_default(subscriber)
    .map_err(|_| LoggingError::AlreadyInstalled)
}

/// Logging setup failures
#[derive(Error, Debug)]
pub enum LoggingError {
  /// A global subscriber was installed before us
  #[error("A global tracing subscriber is already installed")]
  AlreadyInstalled,
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn level_names_are_case_insensitive() {
    assert_eq!(parse_level("DEBUG"), LevelFilter::DEBUG);
    assert_eq!(parse_level("Info"), LevelFilter::INFO);
    assert_eq!(parse_level("error"), LevelFilter::ERROR);
  }

  #[test]
  fn unknown_level_is_warn() {
    assert_eq!(parse_level("chatty"), LevelFilter::WARN);
  }
}

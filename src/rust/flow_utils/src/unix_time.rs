use nix::{
  sys::time::TimeSpec,
  time::{clock_gettime, ClockId},
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{error, warn};

/// Retrieves the current time, in seconds since the UNIX epoch.
/// Otherwise known as "unix time".
///
/// It can fail if the clock isn't ready.
pub fn unix_now() -> Result<u64, TimeError> {
  unix_now_with_nanos().map(|(secs, _)| secs)
}

/// Retrieves the current UNIX time split into whole seconds and the
/// nanosecond remainder, the way NetFlow v5 headers carry it.
pub fn unix_now_with_nanos() -> Result<(u64, u32), TimeError> {
  match SystemTime::now().duration_since(UNIX_EPOCH) {
    Ok(t) => Ok((t.as_secs(), t.subsec_nanos())),
    Err(e) => {
      error!("Error determining the time in UNIX land: {:?}", e);
      Err(TimeError::ClockNotReady)
    }
  }
}

/// Return the time since boot, from the Linux kernel.
/// Can fail if the clock isn't ready yet.
pub fn time_since_boot() -> Result<TimeSpec, TimeError> {
  match clock_gettime(ClockId::CLOCK_BOOTTIME) {
    Ok(t) => Ok(t),
    Err(e) => {
      warn!("Clock not ready: {:?}", e);
      Err(TimeError::ClockNotReady)
    }
  }
}

/// Milliseconds since boot. Flow first/last-seen stamps and the
/// exporter uptime are all measured on this clock, so a collector can
/// relate them to each other.
pub fn boot_time_ms() -> Result<u64, TimeError> {
  let since_boot = Duration::from(time_since_boot()?);
  Ok(since_boot.as_millis() as u64)
}

/// Truncates a millisecond timestamp to the 32-bit field width used on
/// the wire. Wraps roughly every 49.7 days.
pub fn truncate_ms(ms: u64) -> u32 {
  (ms & 0xFFFF_FFFF) as u32
}

/// Error type for time functions.
#[derive(Error, Debug)]
pub enum TimeError {
  /// The clock isn't ready yet.
  #[error("Clock not ready")]
  ClockNotReady,
}

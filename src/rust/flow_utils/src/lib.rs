//! Collection of utility functions shared by the flow exporter crates.

#![warn(missing_docs)]

/// Utilities for handling strings in hex format
pub mod hex_string;

/// Console logging setup shared by the binaries
pub mod logging;

/// Utilities dealing with Unix Timestamps and the boot-time clock
pub mod unix_time;

//! Where decoded packet events come from.

use serde::{Deserialize, Serialize};

/// The capture source itself is an external program. It writes one JSON
/// packet event per line to `source`.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// `-` reads standard input. Anything else is opened as a file path,
    /// typically a FIFO the capture helper writes into.
    pub source: String,

    /// Capacity of the channel between the reader thread and the flow
    /// table. Events beyond this are dropped rather than queued.
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            source: "-".to_string(),
            channel_capacity: 65535,
        }
    }
}

impl CaptureConfig {
    /// Does this source read standard input?
    pub fn is_stdin(&self) -> bool {
        self.source.trim() == "-"
    }
}

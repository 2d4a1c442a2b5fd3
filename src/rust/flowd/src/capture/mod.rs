//! Packet event intake. Capture itself happens outside this process;
//! sources here only hand over decoded packet metadata.

mod channel_source;
mod json_lines;

pub use channel_source::ChannelPacketSource;
pub use json_lines::{parse_packet_line, spawn_json_reader, WirePacketEvent};

use crate::flow_data::PacketEvent;
use crossbeam_channel::Receiver;
use std::time::Duration;
use thiserror::Error;

/// Where a source stands after a delivery call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    /// The budget ran out; more packets may follow.
    Open,
    /// The stop channel fired.
    Stopped,
    /// No more packets will ever arrive.
    Exhausted,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Unable to open packet source {path}: {source}")]
    CannotOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed packet event: {0}")]
    Malformed(String),
}

/// Pull-based packet source. The caller asks for packets for a bounded
/// time, so a quiet source never stalls the caller for longer than
/// `budget`.
pub trait PacketSource: Send {
    /// Feeds packets to `sink` until `budget` has elapsed, `stop`
    /// delivers (or disconnects), or the source runs dry.
    fn deliver(
        &mut self,
        budget: Duration,
        stop: &Receiver<()>,
        sink: &mut dyn FnMut(PacketEvent),
    ) -> Result<SourceState, CaptureError>;
}

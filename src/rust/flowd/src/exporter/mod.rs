//! Packs encoded records into protocol messages and hands them to a
//! datagram transport.

mod batch;
mod format;
mod sequence;
mod transport;

pub use batch::{BatchExporter, ExportBatch, ExportError, ExportReport};
pub use format::{ExportTime, WireFormat};
pub use sequence::SequenceCounter;
pub use transport::{CapturingSender, DatagramSender, SendError, UdpSender};

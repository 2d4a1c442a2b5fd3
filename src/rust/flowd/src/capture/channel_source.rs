use super::{CaptureError, PacketSource, SourceState};
use crate::flow_data::PacketEvent;
use crossbeam_channel::{select, Receiver};
use std::time::{Duration, Instant};

/// Packets arriving over a crossbeam channel, typically from a reader
/// thread. All senders dropping means the source is exhausted.
pub struct ChannelPacketSource {
    rx: Receiver<PacketEvent>,
}

impl ChannelPacketSource {
    pub fn new(rx: Receiver<PacketEvent>) -> Self {
        Self { rx }
    }
}

impl PacketSource for ChannelPacketSource {
    fn deliver(
        &mut self,
        budget: Duration,
        stop: &Receiver<()>,
        sink: &mut dyn FnMut(PacketEvent),
    ) -> Result<SourceState, CaptureError> {
        let deadline = Instant::now() + budget;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(SourceState::Open);
            }
            select! {
                recv(self.rx) -> msg => match msg {
                    Ok(event) => sink(event),
                    Err(_) => return Ok(SourceState::Exhausted),
                },
                recv(stop) -> _ => return Ok(SourceState::Stopped),
                default(remaining) => return Ok(SourceState::Open),
            }
        }
    }
}

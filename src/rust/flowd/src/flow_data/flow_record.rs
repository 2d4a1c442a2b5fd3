use super::{HttpFields, PacketEvent};

/// Aggregate counters for one flow. Created from the first packet of a
/// flow, so `packets` is never zero and `last_seen_ms >= first_seen_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRecord {
    /// Packets seen
    pub packets: u64,
    /// Bytes seen, IP header included
    pub bytes: u64,
    /// Time (ms, boot clock) of the first packet
    pub first_seen_ms: u64,
    /// Time (ms, boot clock) of the most recent packet
    pub last_seen_ms: u64,
    /// Union of every TCP flag byte seen
    pub tcp_flags: u8,
    /// Raw IP TOS of the first packet
    pub tos: u8,
    /// HTTP request details, when any packet carried them
    pub http: Option<HttpFields>,
}

impl FlowRecord {
    pub(crate) fn from_event(event: PacketEvent) -> Self {
        Self {
            packets: 1,
            bytes: event.length as u64,
            first_seen_ms: event.timestamp_ms,
            last_seen_ms: event.timestamp_ms,
            tcp_flags: event.tcp_flags.unwrap_or(0),
            tos: event.tos,
            http: event.http.filter(|h| !h.is_empty()),
        }
    }

    pub(crate) fn update(&mut self, event: PacketEvent) {
        self.packets = self.packets.saturating_add(1);
        self.bytes = self.bytes.saturating_add(event.length as u64);
        self.tcp_flags |= event.tcp_flags.unwrap_or(0);
        // Events can arrive slightly out of order; last-seen never moves back.
        self.last_seen_ms = self.last_seen_ms.max(event.timestamp_ms);
        if let Some(new_http) = event.http {
            match &mut self.http {
                Some(http) => http.fill_missing(new_http),
                None if !new_http.is_empty() => self.http = Some(new_http),
                None => {}
            }
        }
    }

    /// Milliseconds since the last packet, as seen at `now_ms`.
    pub fn idle_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_seen_ms)
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for one exporter instance. Shared between the
/// capture, reader and export threads behind an `Arc`.
#[derive(Debug, Default)]
pub struct ExporterStats {
    pub packets_ingested: AtomicU64,
    /// Events rejected before reaching the flow table: undecodable,
    /// unsupported address family, or the reader channel was full.
    pub packets_dropped: AtomicU64,
    pub flows_exported: AtomicU64,
    pub messages_sent: AtomicU64,
    pub send_failures: AtomicU64,
    pub templates_sent: AtomicU64,
}

impl ExporterStats {
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn summary(&self) -> String {
        format!(
            "packets: {} ingested, {} dropped; flows exported: {}; messages: {} sent, {} failed; templates: {}",
            self.packets_ingested.load(Ordering::Relaxed),
            self.packets_dropped.load(Ordering::Relaxed),
            self.flows_exported.load(Ordering::Relaxed),
            self.messages_sent.load(Ordering::Relaxed),
            self.send_failures.load(Ordering::Relaxed),
            self.templates_sent.load(Ordering::Relaxed),
        )
    }
}

use super::{FlowKey, FlowRecord, PacketEvent};
use fxhash::FxHashMap;
use std::time::Duration;

/// In-memory aggregation cache. Owns every live [`FlowRecord`]. Not
/// synchronized itself; the scheduler wraps it in a single lock.
#[derive(Debug, Default)]
pub struct FlowTable {
    flows: FxHashMap<FlowKey, FlowRecord>,
}

impl FlowTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn get(&self, key: &FlowKey) -> Option<&FlowRecord> {
        self.flows.get(key)
    }

    /// Adds a packet to its flow, creating the flow if this is the first
    /// packet seen for the key.
    pub fn ingest(&mut self, event: PacketEvent) {
        let key = event.key();
        if let Some(record) = self.flows.get_mut(&key) {
            record.update(event);
        } else {
            self.flows.insert(key, FlowRecord::from_event(event));
        }
    }

    /// Removes and returns every flow, oldest first.
    pub fn drain_all(&mut self) -> Vec<(FlowKey, FlowRecord)> {
        let mut drained: Vec<(FlowKey, FlowRecord)> = self.flows.drain().collect();
        sort_by_age(&mut drained);
        drained
    }

    /// Removes and returns flows that have been idle for strictly longer
    /// than `inactive_timeout` at `now_ms`, oldest first.
    pub fn evict_idle(&mut self, now_ms: u64, inactive_timeout: Duration) -> Vec<(FlowKey, FlowRecord)> {
        let timeout_ms = inactive_timeout.as_millis() as u64;
        let expired: Vec<FlowKey> = self
            .flows
            .iter()
            .filter(|(_, record)| record.idle_ms(now_ms) > timeout_ms)
            .map(|(key, _)| *key)
            .collect();

        let mut evicted: Vec<(FlowKey, FlowRecord)> = expired
            .into_iter()
            .filter_map(|key| self.flows.remove(&key).map(|record| (key, record)))
            .collect();
        sort_by_age(&mut evicted);
        evicted
    }
}

fn sort_by_age(flows: &mut [(FlowKey, FlowRecord)]) {
    flows.sort_by(|(ka, ra), (kb, rb)| ra.first_seen_ms.cmp(&rb.first_seen_ms).then_with(|| ka.cmp(kb)));
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flow_data::{HttpFields, IPPROTO_TCP, IPPROTO_UDP};

    fn packet(src: &str, dst: &str, sport: u16, dport: u16, proto: u8, len: u32, ts: u64) -> PacketEvent {
        PacketEvent::new(src.parse().unwrap(), dst.parse().unwrap(), sport, dport, proto, len, ts)
    }

    #[test]
    fn two_packets_same_key() {
        let mut table = FlowTable::new();
        table.ingest(packet("10.0.0.1", "10.0.0.2", 80, 443, IPPROTO_TCP, 100, 1_000).with_tcp_flags(0x02));
        table.ingest(packet("10.0.0.1", "10.0.0.2", 80, 443, IPPROTO_TCP, 40, 1_500).with_tcp_flags(0x10));
        assert_eq!(table.len(), 1);
        let (_, record) = &table.drain_all()[0];
        assert_eq!(record.packets, 2);
        assert_eq!(record.bytes, 140);
        assert_eq!(record.first_seen_ms, 1_000);
        assert_eq!(record.last_seen_ms, 1_500);
        assert_eq!(record.tcp_flags, 0x12);
    }

    #[test]
    fn three_packets_two_flows() {
        let mut table = FlowTable::new();
        table.ingest(packet("10.0.0.1", "10.0.0.2", 80, 443, IPPROTO_TCP, 100, 0));
        table.ingest(packet("10.0.0.1", "10.0.0.2", 80, 443, IPPROTO_TCP, 50, 0));
        table.ingest(packet("10.0.0.3", "10.0.0.4", 1000, 53, IPPROTO_UDP, 60, 0));

        let drained = table.drain_all();
        assert!(table.is_empty());
        assert_eq!(drained.len(), 2);
        assert_eq!((drained[0].1.packets, drained[0].1.bytes), (2, 150));
        assert_eq!((drained[1].1.packets, drained[1].1.bytes), (1, 60));
    }

    #[test]
    fn inactive_timeout_boundary() {
        let timeout = Duration::from_secs(30);

        let mut table = FlowTable::new();
        table.ingest(packet("10.0.0.1", "10.0.0.2", 1, 2, IPPROTO_UDP, 10, 0));
        assert!(table.evict_idle(29_000, timeout).is_empty());
        assert_eq!(table.len(), 1);
        // Exactly at the timeout is still retained
        assert!(table.evict_idle(30_000, timeout).is_empty());
        let evicted = table.evict_idle(31_000, timeout);
        assert_eq!(evicted.len(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn evict_only_idle_flows() {
        let mut table = FlowTable::new();
        table.ingest(packet("10.0.0.1", "10.0.0.2", 1, 2, IPPROTO_UDP, 10, 0));
        table.ingest(packet("10.0.0.5", "10.0.0.6", 1, 2, IPPROTO_UDP, 10, 20_000));
        let evicted = table.evict_idle(40_000, Duration::from_secs(30));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].0.src_ip, "10.0.0.1".parse::<std::net::IpAddr>().unwrap());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn http_first_observed_wins() {
        let mut table = FlowTable::new();
        let first = HttpFields {
            url: "/a".to_string(),
            ..Default::default()
        };
        let second = HttpFields {
            url: "/b".to_string(),
            host: "example.com".to_string(),
            ..Default::default()
        };
        table.ingest(packet("10.0.0.1", "10.0.0.2", 5000, 80, IPPROTO_TCP, 10, 0).with_http(first));
        table.ingest(packet("10.0.0.1", "10.0.0.2", 5000, 80, IPPROTO_TCP, 10, 1).with_http(second));
        let (_, record) = table.drain_all().pop().unwrap();
        let http = record.http.unwrap();
        assert_eq!(http.url, "/a");
        assert_eq!(http.host, "example.com");
    }

    #[test]
    fn out_of_order_timestamps_never_rewind() {
        let mut table = FlowTable::new();
        table.ingest(packet("10.0.0.1", "10.0.0.2", 1, 2, IPPROTO_UDP, 10, 5_000));
        table.ingest(packet("10.0.0.1", "10.0.0.2", 1, 2, IPPROTO_UDP, 10, 4_000));
        let (_, record) = table.drain_all().pop().unwrap();
        assert_eq!(record.last_seen_ms, 5_000);
        assert!(record.last_seen_ms >= record.first_seen_ms);
    }
}

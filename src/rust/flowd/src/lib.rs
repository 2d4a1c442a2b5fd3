//! Live-traffic flow exporter. Packet events are aggregated into flows
//! keyed by 5-tuple and periodically exported to a collector as NetFlow v5
//! or IPFIX datagrams.

pub mod capture;
pub mod encoder;
pub mod exporter;
pub mod flow_data;
pub mod ipfix;
pub mod netflow5;
pub mod scheduler;
pub mod stats;
pub mod template;

//! Collector addressing and wire-format limits.

use serde::{Deserialize, Serialize};

/// Largest UDP payload we are willing to build. Well under the 65 535
/// byte datagram limit to leave room for IP/UDP headers.
pub const MAX_SAFE_PAYLOAD: usize = 65_400;

/// NetFlow v5 collectors expect at most 30 records per datagram.
pub const NETFLOW5_MAX_RECORDS: usize = 30;

/// Smallest message any variant can produce: a NetFlow v5 header plus
/// one record.
const MIN_PAYLOAD: usize = 24 + 48;

/// Which wire format to export.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq, Default)]
pub enum ExportProtocol {
    /// Fixed 48-byte NetFlow v5 records.
    #[default]
    #[serde(rename = "netflow5")]
    Netflow5,
    /// IPFIX (version 10) with a configurable template.
    #[serde(rename = "ipfix")]
    Ipfix,
}

impl std::fmt::Display for ExportProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportProtocol::Netflow5 => write!(f, "NetFlow v5"),
            ExportProtocol::Ipfix => write!(f, "IPFIX"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ExporterConfig {
    /// Collector IP address
    pub collector_ip: String,

    /// Collector UDP port
    pub collector_port: u16,

    /// Local port the exporting socket binds to. Zero picks an
    /// ephemeral port; a fixed port keeps collectors that key exporters
    /// by source port happy.
    pub source_port: u16,

    /// Wire format
    pub protocol: ExportProtocol,

    /// Upper bound on data records in one message.
    pub max_records_per_message: usize,

    /// Upper bound on the size of one message, headers included.
    pub max_payload_bytes: usize,

    /// NetFlow v5 engine type
    pub engine_type: u8,

    /// NetFlow v5 engine id
    pub engine_id: u8,

    /// NetFlow v5 sampling interval field, sent verbatim
    pub sampling_interval: u16,

    /// IPFIX observation domain
    pub observation_domain_id: u32,

    /// First sequence number emitted after start-up.
    pub initial_sequence: u32,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            collector_ip: "127.0.0.1".to_string(),
            collector_port: 2055,
            source_port: 0,
            protocol: ExportProtocol::Netflow5,
            max_records_per_message: NETFLOW5_MAX_RECORDS,
            max_payload_bytes: 1472,
            engine_type: 0,
            engine_id: 0,
            sampling_interval: 0,
            observation_domain_id: 1234,
            initial_sequence: 1,
        }
    }
}

impl ExporterConfig {
    /// `ip:port` of the collector, ready for `UdpSocket::connect`.
    pub fn collector_target(&self) -> String {
        let ip = self.collector_ip.trim();
        if ip.contains(':') {
            format!("[{}]:{}", ip, self.collector_port)
        } else {
            format!("{}:{}", ip, self.collector_port)
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.collector_ip.trim().is_empty() {
            return Err("collector_ip must be set".to_string());
        }
        if self.collector_ip.trim().parse::<std::net::IpAddr>().is_err() {
            return Err(format!(
                "collector_ip [{}] is not a valid IP address",
                self.collector_ip
            ));
        }
        if self.collector_port == 0 {
            return Err("collector_port must be set".to_string());
        }
        if self.max_records_per_message == 0 {
            return Err("max_records_per_message must be at least 1".to_string());
        }
        if self.protocol == ExportProtocol::Netflow5
            && self.max_records_per_message > NETFLOW5_MAX_RECORDS
        {
            return Err(format!(
                "NetFlow v5 allows at most {NETFLOW5_MAX_RECORDS} records per message, {} configured",
                self.max_records_per_message
            ));
        }
        if self.max_payload_bytes < MIN_PAYLOAD || self.max_payload_bytes > MAX_SAFE_PAYLOAD {
            return Err(format!(
                "max_payload_bytes must be between {MIN_PAYLOAD} and {MAX_SAFE_PAYLOAD}, {} configured",
                self.max_payload_bytes
            ));
        }
        Ok(())
    }
}

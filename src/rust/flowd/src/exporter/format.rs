use crate::ipfix::{IpfixHeader, SetHeader, HEADER_LEN as IPFIX_HEADER_LEN, SET_HEADER_LEN};
use crate::netflow5::{Netflow5Header, HEADER_LEN as NETFLOW5_HEADER_LEN};
use crate::template::TemplateManager;
use flow_config::{ExportProtocol, ExporterConfig};
use flow_utils::unix_time::{boot_time_ms, truncate_ms, unix_now_with_nanos};
use tracing::warn;

/// Clock readings stamped into message headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExportTime {
    /// Milliseconds since boot, same clock as flow timestamps
    pub uptime_ms: u32,
    pub unix_secs: u32,
    pub unix_nsecs: u32,
}

impl ExportTime {
    /// Reads both clocks. A clock that isn't ready reads as zero; the
    /// message still goes out.
    pub fn now() -> Self {
        let uptime_ms = match boot_time_ms() {
            Ok(ms) => truncate_ms(ms),
            Err(e) => {
                warn!("Unable to read boot clock: {e}");
                0
            }
        };
        let (unix_secs, unix_nsecs) = match unix_now_with_nanos() {
            Ok((secs, nanos)) => (secs as u32, nanos),
            Err(e) => {
                warn!("Unable to read the system clock: {e}");
                (0, 0)
            }
        };
        Self {
            uptime_ms,
            unix_secs,
            unix_nsecs,
        }
    }
}

/// Message framing for the active protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    Netflow5 {
        engine_type: u8,
        engine_id: u8,
        sampling_interval: u16,
    },
    Ipfix {
        template_id: u16,
        domain_id: u32,
    },
}

impl WireFormat {
    pub fn new(config: &ExporterConfig, templates: &TemplateManager) -> Self {
        match config.protocol {
            ExportProtocol::Netflow5 => WireFormat::Netflow5 {
                engine_type: config.engine_type,
                engine_id: config.engine_id,
                sampling_interval: config.sampling_interval,
            },
            ExportProtocol::Ipfix => WireFormat::Ipfix {
                template_id: templates.build().id(),
                domain_id: config.observation_domain_id,
            },
        }
    }

    /// Bytes a data message spends on headers.
    pub fn overhead(&self) -> usize {
        match self {
            WireFormat::Netflow5 { .. } => NETFLOW5_HEADER_LEN,
            WireFormat::Ipfix { .. } => IPFIX_HEADER_LEN + SET_HEADER_LEN,
        }
    }

    /// Frames `count` already-encoded records as one data message.
    pub fn data_message(&self, records: &[u8], count: usize, sequence: u32, time: &ExportTime) -> Vec<u8> {
        let mut message = Vec::with_capacity(self.overhead() + records.len());
        match self {
            WireFormat::Netflow5 {
                engine_type,
                engine_id,
                sampling_interval,
            } => {
                let header = Netflow5Header {
                    version: 5,
                    count: count as u16,
                    sys_uptime: time.uptime_ms,
                    unix_secs: time.unix_secs,
                    unix_nsecs: time.unix_nsecs,
                    flow_sequence: sequence,
                    engine_type: *engine_type,
                    engine_id: *engine_id,
                    sampling_interval: *sampling_interval,
                };
                message.extend_from_slice(&header.to_bytes());
            }
            WireFormat::Ipfix { template_id, domain_id } => {
                let length = self.overhead() + records.len();
                let header = IpfixHeader::new(length as u16, time.unix_secs, sequence, *domain_id);
                let set = SetHeader {
                    set_id: *template_id,
                    length: (SET_HEADER_LEN + records.len()) as u16,
                };
                message.extend_from_slice(&header.to_bytes());
                message.extend_from_slice(&set.to_bytes());
            }
        }
        message.extend_from_slice(records);
        message
    }

    /// Wraps a template set in an IPFIX message. NetFlow v5 has no
    /// templates and yields `None`.
    pub fn template_message(&self, template_set: &[u8], sequence: u32, time: &ExportTime) -> Option<Vec<u8>> {
        match self {
            WireFormat::Netflow5 { .. } => None,
            WireFormat::Ipfix { domain_id, .. } => {
                let length = IPFIX_HEADER_LEN + template_set.len();
                let header = IpfixHeader::new(length as u16, time.unix_secs, sequence, *domain_id);
                let mut message = Vec::with_capacity(length);
                message.extend_from_slice(&header.to_bytes());
                message.extend_from_slice(template_set);
                Some(message)
            }
        }
    }
}

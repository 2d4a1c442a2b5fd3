//! Definitions for the actual netflow 5 protocol

use crate::flow_data::{FlowKey, FlowRecord};
use flow_utils::unix_time::truncate_ms;
use std::net::IpAddr;

/// Bytes in a v5 header
pub const HEADER_LEN: usize = 24;

/// Bytes in a v5 record
pub const RECORD_LEN: usize = 48;

/// Standard Netflow 5 header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Netflow5Header {
    pub version: u16,
    pub count: u16,
    pub sys_uptime: u32,
    pub unix_secs: u32,
    pub unix_nsecs: u32,
    pub flow_sequence: u32,
    pub engine_type: u8,
    pub engine_id: u8,
    pub sampling_interval: u16,
}

impl Netflow5Header {
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..2].copy_from_slice(&self.version.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.count.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.sys_uptime.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.unix_secs.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.unix_nsecs.to_be_bytes());
        bytes[16..20].copy_from_slice(&self.flow_sequence.to_be_bytes());
        bytes[20] = self.engine_type;
        bytes[21] = self.engine_id;
        bytes[22..24].copy_from_slice(&self.sampling_interval.to_be_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }
        Some(Self {
            version: be_u16(&bytes[0..2]),
            count: be_u16(&bytes[2..4]),
            sys_uptime: be_u32(&bytes[4..8]),
            unix_secs: be_u32(&bytes[8..12]),
            unix_nsecs: be_u32(&bytes[12..16]),
            flow_sequence: be_u32(&bytes[16..20]),
            engine_type: bytes[20],
            engine_id: bytes[21],
            sampling_interval: be_u16(&bytes[22..24]),
        })
    }
}

/// Standard Netflow 5 record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Netflow5Record {
    pub src_addr: u32,
    pub dst_addr: u32,
    pub next_hop: u32,
    pub input: u16,
    pub output: u16,
    pub d_pkts: u32,
    pub d_octets: u32,
    pub first: u32,
    pub last: u32,
    pub src_port: u16,
    pub dst_port: u16,
    pub pad1: u8,
    pub tcp_flags: u8,
    pub prot: u8,
    pub tos: u8,
    pub src_as: u16,
    pub dst_as: u16,
    pub src_mask: u8,
    pub dst_mask: u8,
    pub pad2: u16,
}

impl Netflow5Record {
    /// Converts an aggregated flow. Counters saturate at 32 bits and
    /// timestamps wrap, as the format demands. Next hop, interfaces,
    /// AS numbers and masks are not tracked and stay zero.
    pub fn from_flow(key: &FlowKey, record: &FlowRecord) -> Self {
        Self {
            src_addr: ipv4_bits(key.src_ip),
            dst_addr: ipv4_bits(key.dst_ip),
            d_pkts: saturate_u32(record.packets),
            d_octets: saturate_u32(record.bytes),
            first: truncate_ms(record.first_seen_ms),
            last: truncate_ms(record.last_seen_ms),
            src_port: key.src_port,
            dst_port: key.dst_port,
            tcp_flags: record.tcp_flags,
            prot: key.ip_protocol,
            tos: record.tos,
            ..Default::default()
        }
    }

    pub fn write_to(&self, target: &mut Vec<u8>) {
        target.extend_from_slice(&self.src_addr.to_be_bytes());
        target.extend_from_slice(&self.dst_addr.to_be_bytes());
        target.extend_from_slice(&self.next_hop.to_be_bytes());
        target.extend_from_slice(&self.input.to_be_bytes());
        target.extend_from_slice(&self.output.to_be_bytes());
        target.extend_from_slice(&self.d_pkts.to_be_bytes());
        target.extend_from_slice(&self.d_octets.to_be_bytes());
        target.extend_from_slice(&self.first.to_be_bytes());
        target.extend_from_slice(&self.last.to_be_bytes());
        target.extend_from_slice(&self.src_port.to_be_bytes());
        target.extend_from_slice(&self.dst_port.to_be_bytes());
        target.push(self.pad1);
        target.push(self.tcp_flags);
        target.push(self.prot);
        target.push(self.tos);
        target.extend_from_slice(&self.src_as.to_be_bytes());
        target.extend_from_slice(&self.dst_as.to_be_bytes());
        target.push(self.src_mask);
        target.push(self.dst_mask);
        target.extend_from_slice(&self.pad2.to_be_bytes());
    }

    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut buffer = Vec::with_capacity(RECORD_LEN);
        self.write_to(&mut buffer);
        let mut bytes = [0u8; RECORD_LEN];
        bytes.copy_from_slice(&buffer);
        bytes
    }

    /// Reads a record back from its documented layout.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < RECORD_LEN {
            return None;
        }
        Some(Self {
            src_addr: be_u32(&bytes[0..4]),
            dst_addr: be_u32(&bytes[4..8]),
            next_hop: be_u32(&bytes[8..12]),
            input: be_u16(&bytes[12..14]),
            output: be_u16(&bytes[14..16]),
            d_pkts: be_u32(&bytes[16..20]),
            d_octets: be_u32(&bytes[20..24]),
            first: be_u32(&bytes[24..28]),
            last: be_u32(&bytes[28..32]),
            src_port: be_u16(&bytes[32..34]),
            dst_port: be_u16(&bytes[34..36]),
            pad1: bytes[36],
            tcp_flags: bytes[37],
            prot: bytes[38],
            tos: bytes[39],
            src_as: be_u16(&bytes[40..42]),
            dst_as: be_u16(&bytes[42..44]),
            src_mask: bytes[44],
            dst_mask: bytes[45],
            pad2: be_u16(&bytes[46..48]),
        })
    }
}

fn ipv4_bits(ip: IpAddr) -> u32 {
    match ip {
        IpAddr::V4(ip) => u32::from(ip),
        IpAddr::V6(_) => 0,
    }
}

fn saturate_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn be_u16(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[0], bytes[1]])
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

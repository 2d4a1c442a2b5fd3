//! Random NetFlow v5 records with plausible field values.

use crate::ports::{PortSpec, PortSpecError};
use flow_config::GeneratorConfig;
use flowd::flow_data::{IPPROTO_TCP, IPPROTO_UDP};
use flowd::netflow5::Netflow5Record;
use ip_network::Ipv4Network;
use rand::Rng;
use std::net::Ipv4Addr;
use thiserror::Error;

/// Interface indices are drawn from this range; input and output
/// always differ.
const INTERFACES: std::ops::RangeInclusive<u16> = 17000..=17100;

#[derive(Debug, Error)]
pub enum SynthError {
    #[error("Invalid subnet {0}")]
    Subnet(String),
    #[error(transparent)]
    Ports(#[from] PortSpecError),
}

#[derive(Debug, Clone)]
pub struct RecordSynth {
    sources: Ipv4Network,
    destinations: Ipv4Network,
    source_ports: PortSpec,
    destination_ports: PortSpec,
}

impl RecordSynth {
    pub fn new(config: &GeneratorConfig) -> Result<Self, SynthError> {
        Ok(Self {
            sources: parse_subnet(&config.source_subnet)?,
            destinations: parse_subnet(&config.destination_subnet)?,
            source_ports: config.source_ports.parse()?,
            destination_ports: config.destination_ports.parse()?,
        })
    }

    /// One record whose flow started at `now_ms` (boot clock).
    pub fn record<R: Rng + ?Sized>(&self, rng: &mut R, now_ms: u32) -> Netflow5Record {
        let input = rng.random_range(INTERFACES);
        let mut output = rng.random_range(INTERFACES);
        while output == input {
            output = rng.random_range(INTERFACES);
        }
        Netflow5Record {
            src_addr: u32::from(random_host(&self.sources, rng)),
            dst_addr: u32::from(random_host(&self.destinations, rng)),
            next_hop: 0,
            input,
            output,
            d_pkts: rng.random_range(1..=1000),
            d_octets: rng.random_range(1..=100_000),
            first: now_ms,
            last: now_ms.wrapping_add(rng.random_range(1..=1000)),
            src_port: self.source_ports.pick(rng),
            dst_port: self.destination_ports.pick(rng),
            pad1: 0,
            tcp_flags: rng.random(),
            prot: if rng.random_bool(0.5) { IPPROTO_TCP } else { IPPROTO_UDP },
            tos: rng.random(),
            src_as: rng.random(),
            dst_as: rng.random(),
            src_mask: rng.random_range(0..=32),
            dst_mask: rng.random_range(0..=32),
            pad2: 0,
        }
    }
}

/// Accepts host bits in the address part, e.g. `10.0.0.1/16`.
fn parse_subnet(s: &str) -> Result<Ipv4Network, SynthError> {
    let (addr, prefix) = s.trim().split_once('/').unwrap_or((s.trim(), "32"));
    let addr: Ipv4Addr = addr.parse().map_err(|_| SynthError::Subnet(s.to_string()))?;
    let prefix: u8 = prefix.parse().map_err(|_| SynthError::Subnet(s.to_string()))?;
    Ipv4Network::new_truncate(addr, prefix).map_err(|e| SynthError::Subnet(format!("{s}: {e:?}")))
}

/// A usable host address: network and broadcast addresses are skipped
/// when the subnet is big enough to have them.
fn random_host<R: Rng + ?Sized>(network: &Ipv4Network, rng: &mut R) -> Ipv4Addr {
    let base = u32::from(network.network_address());
    let size = 1u64 << (32 - network.netmask() as u32);
    let offset = if size > 2 {
        rng.random_range(1..size - 1)
    } else {
        rng.random_range(0..size)
    };
    Ipv4Addr::from(base.wrapping_add(offset as u32))
}

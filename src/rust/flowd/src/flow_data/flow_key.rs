use std::net::IpAddr;

pub const IPPROTO_ICMP: u8 = 1;
pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_SCTP: u8 = 132;

/// Identifies a unidirectional flow. Ordering is only used to make
/// drained output deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    /// Source address
    pub src_ip: IpAddr,
    /// Destination address
    pub dst_ip: IpAddr,
    /// Source port, zero for protocols without ports
    pub src_port: u16,
    /// Destination port, zero for protocols without ports
    pub dst_port: u16,
    /// IP protocol number
    pub ip_protocol: u8,
}

impl FlowKey {
    /// Builds a key, zeroing the ports for protocols that don't carry them.
    pub fn new(src_ip: IpAddr, dst_ip: IpAddr, src_port: u16, dst_port: u16, ip_protocol: u8) -> Self {
        let (src_port, dst_port) = if Self::has_ports(ip_protocol) {
            (src_port, dst_port)
        } else {
            (0, 0)
        };
        Self {
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            ip_protocol,
        }
    }

    /// Does this IP protocol carry transport ports?
    pub fn has_ports(ip_protocol: u8) -> bool {
        matches!(ip_protocol, IPPROTO_TCP | IPPROTO_UDP | IPPROTO_SCTP)
    }

    /// Both addresses are IPv4
    pub fn is_v4(&self) -> bool {
        self.src_ip.is_ipv4() && self.dst_ip.is_ipv4()
    }

    /// Both addresses are IPv6
    pub fn is_v6(&self) -> bool {
        self.src_ip.is_ipv6() && self.dst_ip.is_ipv6()
    }
}

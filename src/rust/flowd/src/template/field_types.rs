//! Information elements the encoders know how to fill.
//! Numbering follows the IANA IPFIX registry, which NetFlow v9 shares.

use flow_config::StandardField;

/// What kind of value an element carries, which decides the lengths a
/// template may declare for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Ipv4Address,
    Ipv6Address,
    /// Unsigned integer; may be declared narrower than `max` bytes
    /// (reduced-size encoding).
    Unsigned { max: u16 },
    /// Fixed-length text, truncated or zero-padded.
    Text,
    /// Always zero.
    Padding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    OctetDeltaCount,
    PacketDeltaCount,
    ProtocolIdentifier,
    IpClassOfService,
    TcpControlBits,
    SourceTransportPort,
    SourceIpv4Address,
    SourceIpv4PrefixLength,
    IngressInterface,
    DestinationTransportPort,
    DestinationIpv4Address,
    DestinationIpv4PrefixLength,
    EgressInterface,
    IpNextHopIpv4Address,
    BgpSourceAsNumber,
    BgpDestinationAsNumber,
    FlowEndSysUpTime,
    FlowStartSysUpTime,
    SourceIpv6Address,
    DestinationIpv6Address,
    PaddingOctets,
    HttpUrl,
    HttpUserAgent,
    HttpHost,
}

impl Element {
    /// IANA element id. Vendor elements have none; their id comes from
    /// configuration.
    pub fn iana_id(&self) -> Option<u16> {
        let id = match self {
            Element::OctetDeltaCount => 1,
            Element::PacketDeltaCount => 2,
            Element::ProtocolIdentifier => 4,
            Element::IpClassOfService => 5,
            Element::TcpControlBits => 6,
            Element::SourceTransportPort => 7,
            Element::SourceIpv4Address => 8,
            Element::SourceIpv4PrefixLength => 9,
            Element::IngressInterface => 10,
            Element::DestinationTransportPort => 11,
            Element::DestinationIpv4Address => 12,
            Element::DestinationIpv4PrefixLength => 13,
            Element::EgressInterface => 14,
            Element::IpNextHopIpv4Address => 15,
            Element::BgpSourceAsNumber => 16,
            Element::BgpDestinationAsNumber => 17,
            Element::FlowEndSysUpTime => 21,
            Element::FlowStartSysUpTime => 22,
            Element::SourceIpv6Address => 27,
            Element::DestinationIpv6Address => 28,
            Element::PaddingOctets => 210,
            Element::HttpUrl | Element::HttpUserAgent | Element::HttpHost => return None,
        };
        Some(id)
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            Element::SourceIpv4Address | Element::DestinationIpv4Address | Element::IpNextHopIpv4Address => {
                ElementKind::Ipv4Address
            }
            Element::SourceIpv6Address | Element::DestinationIpv6Address => ElementKind::Ipv6Address,
            Element::OctetDeltaCount | Element::PacketDeltaCount => ElementKind::Unsigned { max: 8 },
            Element::FlowStartSysUpTime | Element::FlowEndSysUpTime => ElementKind::Unsigned { max: 4 },
            Element::IngressInterface | Element::EgressInterface => ElementKind::Unsigned { max: 4 },
            Element::BgpSourceAsNumber | Element::BgpDestinationAsNumber => ElementKind::Unsigned { max: 4 },
            Element::SourceTransportPort | Element::DestinationTransportPort => ElementKind::Unsigned { max: 2 },
            Element::TcpControlBits => ElementKind::Unsigned { max: 2 },
            Element::ProtocolIdentifier
            | Element::IpClassOfService
            | Element::SourceIpv4PrefixLength
            | Element::DestinationIpv4PrefixLength => ElementKind::Unsigned { max: 1 },
            Element::PaddingOctets => ElementKind::Padding,
            Element::HttpUrl | Element::HttpUserAgent | Element::HttpHost => ElementKind::Text,
        }
    }

    /// Length used when the element is picked from configuration.
    /// Counters are exported at full width, TCP flags as one byte.
    pub fn default_length(&self) -> u16 {
        match self.kind() {
            ElementKind::Ipv4Address => 4,
            ElementKind::Ipv6Address => 16,
            ElementKind::Unsigned { max } if *self == Element::TcpControlBits => max.min(1),
            ElementKind::Unsigned { max } => max,
            ElementKind::Text => 64,
            ElementKind::Padding => 1,
        }
    }

    /// Does a declared length make sense for this element?
    pub fn accepts_length(&self, length: u16) -> bool {
        match self.kind() {
            ElementKind::Ipv4Address => length == 4,
            ElementKind::Ipv6Address => length == 16,
            ElementKind::Unsigned { max } => (1..=max).contains(&length),
            ElementKind::Text | ElementKind::Padding => length > 0 && length != u16::MAX,
        }
    }

    /// IPv4-only or IPv6-only element?
    pub(crate) fn address_family(&self) -> Option<AddressFamily> {
        match self.kind() {
            ElementKind::Ipv4Address => Some(AddressFamily::V4),
            ElementKind::Ipv6Address => Some(AddressFamily::V6),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressFamily {
    V4,
    V6,
}

impl From<StandardField> for Element {
    fn from(field: StandardField) -> Self {
        match field {
            StandardField::SourceIpv4Address => Element::SourceIpv4Address,
            StandardField::DestinationIpv4Address => Element::DestinationIpv4Address,
            StandardField::SourceIpv6Address => Element::SourceIpv6Address,
            StandardField::DestinationIpv6Address => Element::DestinationIpv6Address,
            StandardField::SourceTransportPort => Element::SourceTransportPort,
            StandardField::DestinationTransportPort => Element::DestinationTransportPort,
            StandardField::ProtocolIdentifier => Element::ProtocolIdentifier,
            StandardField::TcpControlBits => Element::TcpControlBits,
            StandardField::PacketDeltaCount => Element::PacketDeltaCount,
            StandardField::OctetDeltaCount => Element::OctetDeltaCount,
            StandardField::FlowStartSysUpTime => Element::FlowStartSysUpTime,
            StandardField::FlowEndSysUpTime => Element::FlowEndSysUpTime,
        }
    }
}

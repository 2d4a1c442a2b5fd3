use crate::flow_data::{truncate_at_char_boundary, FlowKey, FlowRecord};
use crate::template::{Element, ElementKind, Template};
use flow_utils::unix_time::truncate_ms;
use std::net::IpAddr;

/// Appends one data record to `target`, following the template's field
/// order and lengths. Never fails: addresses of the wrong family and
/// untracked values are written as zeros, text is truncated or padded.
pub fn encode_fields_from_template(template: &Template, key: &FlowKey, record: &FlowRecord, target: &mut Vec<u8>) {
    target.reserve(template.record_length());
    for field in template.fields().iter() {
        let length = field.length as usize;
        match field.element.kind() {
            ElementKind::Ipv4Address => encode_ipv4(address_of(field.element, key), target),
            ElementKind::Ipv6Address => encode_ipv6(address_of(field.element, key), target),
            ElementKind::Unsigned { .. } => encode_uint(unsigned_value(field.element, key, record), length, target),
            ElementKind::Text => encode_text(text_value(field.element, record), length, target),
            ElementKind::Padding => target.resize(target.len() + length, 0),
        }
    }
}

fn address_of(element: Element, key: &FlowKey) -> Option<IpAddr> {
    match element {
        Element::SourceIpv4Address | Element::SourceIpv6Address => Some(key.src_ip),
        Element::DestinationIpv4Address | Element::DestinationIpv6Address => Some(key.dst_ip),
        _ => None,
    }
}

fn unsigned_value(element: Element, key: &FlowKey, record: &FlowRecord) -> u64 {
    match element {
        Element::OctetDeltaCount => record.bytes,
        Element::PacketDeltaCount => record.packets,
        Element::ProtocolIdentifier => key.ip_protocol as u64,
        Element::IpClassOfService => record.tos as u64,
        Element::TcpControlBits => record.tcp_flags as u64,
        Element::SourceTransportPort => key.src_port as u64,
        Element::DestinationTransportPort => key.dst_port as u64,
        Element::FlowStartSysUpTime => truncate_ms(record.first_seen_ms) as u64,
        Element::FlowEndSysUpTime => truncate_ms(record.last_seen_ms) as u64,
        _ => 0,
    }
}

fn text_value(element: Element, record: &FlowRecord) -> &str {
    let Some(http) = &record.http else {
        return "";
    };
    match element {
        Element::HttpUrl => &http.url,
        Element::HttpUserAgent => &http.user_agent,
        Element::HttpHost => &http.host,
        _ => "",
    }
}

/// Big-endian, `length` bytes wide. Values too large for the width
/// saturate at its maximum.
fn encode_uint(value: u64, length: usize, target: &mut Vec<u8>) {
    let width = length.min(8);
    let max = if width == 8 { u64::MAX } else { (1u64 << (width * 8)) - 1 };
    let value = value.min(max);
    target.extend_from_slice(&value.to_be_bytes()[8 - width..]);
    if length > width {
        target.resize(target.len() + length - width, 0);
    }
}

fn encode_ipv4(ip: Option<IpAddr>, target: &mut Vec<u8>) {
    match ip {
        Some(IpAddr::V4(ip)) => target.extend_from_slice(&ip.octets()),
        _ => target.extend_from_slice(&[0; 4]),
    }
}

fn encode_ipv6(ip: Option<IpAddr>, target: &mut Vec<u8>) {
    match ip {
        Some(IpAddr::V6(ip)) => target.extend_from_slice(&ip.octets()),
        _ => target.extend_from_slice(&[0; 16]),
    }
}

/// Fixed-length text: UTF-8 truncated on a character boundary, then
/// zero-padded to `length`.
fn encode_text(text: &str, length: usize, target: &mut Vec<u8>) {
    let text = truncate_at_char_boundary(text, length);
    target.extend_from_slice(text.as_bytes());
    target.resize(target.len() + length - text.len(), 0);
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::flow_data::{FlowTable, HttpFields, PacketEvent, IPPROTO_TCP};
    use crate::template::{TemplateField, TemplateManager};
    use flow_config::IpfixConfig;

    fn flow(http: Option<HttpFields>) -> (FlowKey, FlowRecord) {
        let mut table = FlowTable::new();
        let mut event = PacketEvent::new(
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
            40000,
            80,
            IPPROTO_TCP,
            500,
            0,
        )
        .with_tcp_flags(0x02);
        if let Some(http) = http {
            event = event.with_http(http);
        }
        table.ingest(event);
        table.drain_all().remove(0)
    }

    #[test]
    fn default_layout() {
        let template = TemplateManager::ipfix(&IpfixConfig::default()).unwrap().build();
        let http = HttpFields {
            url: "/index.html".to_string(),
            user_agent: "curl".to_string(),
            host: "example.com".to_string(),
        };
        let (key, record) = flow(Some(http));
        let mut bytes = Vec::new();
        encode_fields_from_template(&template, &key, &record, &mut bytes);
        assert_eq!(bytes.len(), template.record_length());
        assert_eq!(&bytes[0..4], &[10, 0, 0, 1]);
        assert_eq!(&bytes[4..8], &[10, 0, 0, 2]);
        assert_eq!(&bytes[8..10], &40000u16.to_be_bytes());
        assert_eq!(&bytes[10..12], &80u16.to_be_bytes());
        assert_eq!(bytes[12], IPPROTO_TCP);
        assert_eq!(bytes[13], 0x02);
        assert_eq!(&bytes[14..22], &1u64.to_be_bytes());
        assert_eq!(&bytes[22..30], &500u64.to_be_bytes());
        assert_eq!(&bytes[30..41], b"/index.html");
        assert!(bytes[41..158].iter().all(|b| *b == 0));
        assert_eq!(&bytes[158..162], b"curl");
        assert_eq!(&bytes[286..297], b"example.com");
    }

    #[test]
    fn missing_http_is_zeros() {
        let template = TemplateManager::ipfix(&IpfixConfig::default()).unwrap().build();
        let (key, record) = flow(None);
        let mut bytes = Vec::new();
        encode_fields_from_template(&template, &key, &record, &mut bytes);
        assert_eq!(bytes.len(), 350);
        assert!(bytes[30..].iter().all(|b| *b == 0));
    }

    #[test]
    fn long_text_is_truncated() {
        let template = Template::new(256, vec![TemplateField::vendor(Element::HttpHost, 102, 8, 35632)]).unwrap();
        let http = HttpFields {
            host: "a-very-long-hostname.example.com".to_string(),
            ..Default::default()
        };
        let (key, record) = flow(Some(http));
        let mut bytes = Vec::new();
        encode_fields_from_template(&template, &key, &record, &mut bytes);
        assert_eq!(bytes, b"a-very-l".to_vec());
    }

    #[test]
    fn reduced_size_counters_saturate() {
        let mut bytes = Vec::new();
        encode_uint(70_000, 2, &mut bytes);
        assert_eq!(bytes, vec![0xFF, 0xFF]);
        bytes.clear();
        encode_uint(0x1234, 4, &mut bytes);
        assert_eq!(bytes, vec![0, 0, 0x12, 0x34]);
    }

    #[test]
    fn wrong_family_is_zeroed() {
        let template = Template::new(256, vec![TemplateField::standard(Element::SourceIpv6Address, 16)]).unwrap();
        let (key, record) = flow(None);
        let mut bytes = Vec::new();
        encode_fields_from_template(&template, &key, &record, &mut bytes);
        assert_eq!(bytes, vec![0; 16]);
    }
}

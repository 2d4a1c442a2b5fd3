use super::{extract_http_fields, FlowKey, HttpFields, IPPROTO_TCP};
use std::net::IpAddr;

/// Decoded metadata for one captured packet, as handed over by the
/// capture source. Events that could not be decoded never get this far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketEvent {
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    /// Packet length in bytes
    pub length: u32,
    /// TCP flag byte, TCP only
    pub tcp_flags: Option<u8>,
    /// Raw IP TOS byte
    pub tos: u8,
    /// HTTP request details found in the payload
    pub http: Option<HttpFields>,
    /// Arrival time (ms, boot clock)
    pub timestamp_ms: u64,
}

impl PacketEvent {
    pub fn new(
        src_ip: IpAddr,
        dst_ip: IpAddr,
        src_port: u16,
        dst_port: u16,
        protocol: u8,
        length: u32,
        timestamp_ms: u64,
    ) -> Self {
        Self {
            src_ip,
            dst_ip,
            src_port,
            dst_port,
            protocol,
            length,
            tcp_flags: None,
            tos: 0,
            http: None,
            timestamp_ms,
        }
    }

    pub fn with_tcp_flags(mut self, flags: u8) -> Self {
        self.tcp_flags = Some(flags);
        self
    }

    pub fn with_tos(mut self, tos: u8) -> Self {
        self.tos = tos;
        self
    }

    pub fn with_http(mut self, http: HttpFields) -> Self {
        self.http = Some(http.bounded());
        self
    }

    /// Looks for an HTTP request in the payload of TCP packets headed
    /// to port 80. Other packets are returned unchanged.
    pub fn with_payload(mut self, payload: &[u8]) -> Self {
        if self.protocol == IPPROTO_TCP && self.dst_port == 80 && !payload.is_empty() {
            if let Some(http) = extract_http_fields(payload) {
                self.http = Some(http);
            }
        }
        self
    }

    /// The flow this packet belongs to.
    pub fn key(&self) -> FlowKey {
        FlowKey::new(self.src_ip, self.dst_ip, self.src_port, self.dst_port, self.protocol)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tcp_event(dst_port: u16) -> PacketEvent {
        PacketEvent::new(
            "10.0.0.1".parse().unwrap(),
            "10.0.0.2".parse().unwrap(),
            40000,
            dst_port,
            IPPROTO_TCP,
            200,
            0,
        )
    }

    #[test]
    fn payload_on_port_80_is_parsed() {
        let event = tcp_event(80).with_payload(b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n");
        let http = event.http.unwrap();
        assert_eq!(http.url, "/x");
        assert_eq!(http.host, "h");
    }

    #[test]
    fn payload_elsewhere_is_ignored() {
        let event = tcp_event(8080).with_payload(b"GET /x HTTP/1.1\r\n\r\n");
        assert!(event.http.is_none());
    }
}
